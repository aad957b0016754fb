const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";
const CYAN: &str = "\x1b[36m";
const GREEN: &str = "\x1b[32m";
const RESET: &str = "\x1b[0m";

pub fn run() {
    let version = env!("CARGO_PKG_VERSION");

    println!(
        "{BOLD}{CYAN}dropcli{RESET} {DIM}v{version}{RESET}  {DIM}─{RESET}  Dropbox files, search and Paper documents from the shell"
    );
    println!();
    println!("{BOLD}Usage:{RESET}  {GREEN}dropcli{RESET} {DIM}[--json|--summary] [-v] <command> [args...]{RESET}");
    println!();
    println!("{BOLD}Commands:{RESET}");

    let commands: &[(&str, &str)] = &[
        ("account",                       "Show the current account"),
        ("ls [-l] [-r] [path]",           "List a folder (--limit, --cursor, --deleted, --media)"),
        ("search <query>",                "Search files (--path, --max, --ext, --category)"),
        ("paper [path]",                  "List Paper documents under a folder"),
        ("paper-search <query>",          "Search Paper documents"),
        ("read <path>",                   "Export a Paper document (--format markdown|html)"),
        ("paper-create <path>",           "Create a Paper document from --file or stdin"),
        ("paper-update <path>",           "Update a Paper document (--policy, --revision)"),
        ("info <path>",                   "Show metadata (--media)"),
        ("link <path>",                   "Get or create a public shared link"),
        ("download <path> [local|-]",     "Download a file"),
    ];

    for (cmd, desc) in commands {
        let (name, args) = match cmd.find(' ') {
            Some(i) => (&cmd[..i], &cmd[i..]),
            None => (*cmd, ""),
        };
        println!(
            "  {GREEN}{name}{RESET}{DIM}{args}{RESET}  {:>width$}{DIM}{desc}{RESET}",
            "",
            width = 28usize.saturating_sub(cmd.len()),
        );
    }

    println!();
    println!("{BOLD}Options:{RESET}");
    println!("  {GREEN}--json{RESET}                       Machine-readable JSON output");
    println!("  {GREEN}--summary{RESET}                    One line per item, tab separated");
    println!("  {GREEN}-v{RESET}, {GREEN}--verbose{RESET}                Debug logging on stderr");
    println!("  {GREEN}-h{RESET}, {GREEN}--help{RESET}                   Show this help message");
    println!("  {GREEN}-V{RESET}, {GREEN}--version{RESET}                Show version");
    println!();
    println!("{BOLD}Environment:{RESET}  {DIM}DROPBOX_ACCESS_TOKEN, DROPBOX_API_BASE_URL, DROPBOX_CONTENT_BASE_URL, DROPCLI_LOG{RESET}");
}
