mod cmd;
mod config;
mod dropbox;
mod error;
mod logger;
mod theme;
mod transport;

use anyhow::{Result, anyhow};
use log::LevelFilter;
use std::env;
use std::process::exit;

use crate::config::{AppConfig, OutputMode};
use crate::error::DropboxError;

#[derive(Debug, Default, PartialEq, Eq)]
struct GlobalArgs {
    output: Option<OutputMode>,
    verbose: bool,
    help: bool,
    version: bool,
    rest: Vec<String>,
}

/// Pulls global flags out of the argument list; they may appear anywhere.
fn split_global_args(args: Vec<String>) -> GlobalArgs {
    let mut globals = GlobalArgs::default();
    for arg in args {
        match arg.as_str() {
            "--json" => globals.output = Some(OutputMode::Json),
            "--summary" => globals.output = Some(OutputMode::Summary),
            "-v" | "--verbose" => globals.verbose = true,
            "-h" | "--help" => globals.help = true,
            "-V" | "--version" => globals.version = true,
            _ => globals.rest.push(arg),
        }
    }
    globals
}

fn main() {
    let globals = split_global_args(env::args().skip(1).collect());
    let cfg = AppConfig::load();
    let mode = globals
        .output
        .or_else(|| cfg.as_ref().ok().and_then(AppConfig::output_mode))
        .unwrap_or_default();

    if let Err(e) = entry(globals, cfg, mode) {
        report(&e, mode);
        exit(1);
    }
}

/// What to do once global flags are stripped. Help and version never need config.
#[derive(Debug, PartialEq, Eq)]
enum Action<'a> {
    Version,
    Help,
    Run(&'a str, &'a [String]),
}

fn action(globals: &GlobalArgs) -> Action<'_> {
    if globals.version {
        return Action::Version;
    }
    match globals.rest.split_first() {
        Some((command, args)) if !globals.help && command != "help" => {
            Action::Run(command.as_str(), args)
        }
        _ => Action::Help,
    }
}

fn entry(globals: GlobalArgs, cfg: Result<AppConfig>, mode: OutputMode) -> Result<()> {
    let (command, args) = match action(&globals) {
        Action::Version => {
            println!("dropcli {}", env!("CARGO_PKG_VERSION"));
            return Ok(());
        }
        Action::Help => {
            cmd::help::run();
            return Ok(());
        }
        Action::Run(command, args) => (command, args),
    };

    let cfg = cfg?;
    let level = if globals.verbose {
        LevelFilter::Debug
    } else {
        cfg.log_level()
    };
    logger::initialize(level)?;

    match command {
        "account" => cmd::account::run(args, mode),
        "ls" => cmd::ls::run(args, mode),
        "search" => cmd::search::run(args, mode),
        "paper" => cmd::paper::run(args, mode),
        "paper-search" => cmd::paper_search::run(args, mode),
        "read" => cmd::read::run(args, mode),
        "paper-create" => cmd::paper_create::run(args, mode),
        "paper-update" => cmd::paper_update::run(args, mode),
        "info" => cmd::info::run(args, mode),
        "link" => cmd::link::run(args, mode),
        "download" => cmd::download::run(args, mode),
        other => Err(anyhow!(
            "unknown command: {other}\nRun `dropcli --help` for usage."
        )),
    }
}

fn error_json(err: &anyhow::Error) -> serde_json::Value {
    match err.downcast_ref::<DropboxError>() {
        Some(e) => e.to_json(),
        None => serde_json::json!({
            "error": format!("{err:#}"),
            "status": null,
            "data": null,
        }),
    }
}

fn report(err: &anyhow::Error, mode: OutputMode) {
    match mode {
        OutputMode::Json => {
            let out = serde_json::to_string_pretty(&error_json(err))
                .unwrap_or_else(|_| r#"{"error":"unknown error"}"#.into());
            println!("{}", out);
        }
        _ => eprintln!("Error: {err:#}"),
    }
}
