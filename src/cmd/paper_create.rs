use anyhow::{Result, anyhow};

use crate::config::OutputMode;
use crate::dropbox::{DocumentResult, ImportFormat};

const USAGE: &str =
    "Usage: dropcli paper-create <path> [--file F] [--format markdown|html|plain_text]\n       (content is read from stdin when --file is omitted)";

#[derive(Debug, PartialEq, Eq)]
struct CreateArgs {
    path: String,
    file: Option<String>,
    format: ImportFormat,
}

fn parse_args(args: &[String]) -> Result<CreateArgs> {
    let mut path: Option<String> = None;
    let mut file = None;
    let mut format = ImportFormat::default();
    let mut iter = args.iter();

    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--file" | "-i" => file = Some(super::flag_value(&mut iter, "--file")?.to_string()),
            "--format" | "-f" => format = super::flag_value(&mut iter, "--format")?.parse()?,
            a if a.starts_with('-') => return Err(anyhow!("unknown flag: {a}\n{USAGE}")),
            a if path.is_none() => path = Some(a.to_string()),
            a => return Err(anyhow!("unexpected argument: {a}\n{USAGE}")),
        }
    }

    Ok(CreateArgs {
        path: path.ok_or_else(|| anyhow!("{USAGE}"))?,
        file,
        format,
    })
}

pub(super) fn print_result(verb: &str, result: &DocumentResult, mode: OutputMode) -> Result<()> {
    match mode {
        OutputMode::Json => super::print_json(result),
        OutputMode::Summary => {
            println!("{}\t{}", result.result_path, result.url.as_deref().unwrap_or("-"));
            Ok(())
        }
        OutputMode::Human => {
            println!("{} '{}'", verb, result.result_path);
            if let Some(url) = &result.url {
                println!("URL:       {}", url);
            }
            if let Some(rev) = result.paper_revision {
                println!("Revision:  {}", rev);
            }
            Ok(())
        }
    }
}

pub fn run(args: &[String], mode: OutputMode) -> Result<()> {
    let parsed = parse_args(args)?;
    let content = super::read_content(parsed.file.as_deref())?;
    let client = super::cli_client()?;
    let result = client.create_document(&parsed.path, &content, parsed.format)?;
    print_result("Created", &result, mode)
}
