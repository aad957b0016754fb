use anyhow::{Result, anyhow};

use crate::config::OutputMode;
use crate::dropbox::{ImportFormat, UpdatePolicy};

const USAGE: &str = "Usage: dropcli paper-update <path> [--file F] [--format markdown|html|plain_text]\n       [--policy overwrite|update|append|prepend] [--revision N]";

#[derive(Debug, PartialEq, Eq)]
struct UpdateArgs {
    path: String,
    file: Option<String>,
    format: ImportFormat,
    policy: UpdatePolicy,
    revision: Option<i64>,
}

fn parse_args(args: &[String]) -> Result<UpdateArgs> {
    let mut path: Option<String> = None;
    let mut file = None;
    let mut format = ImportFormat::default();
    let mut policy = UpdatePolicy::default();
    let mut revision = None;
    let mut iter = args.iter();

    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--file" | "-i" => file = Some(super::flag_value(&mut iter, "--file")?.to_string()),
            "--format" | "-f" => format = super::flag_value(&mut iter, "--format")?.parse()?,
            "--policy" => policy = super::flag_value(&mut iter, "--policy")?.parse()?,
            "--revision" => {
                let v = super::flag_value(&mut iter, "--revision")?;
                revision = Some(super::parse_number(v, "--revision")?);
            }
            a if a.starts_with('-') => return Err(anyhow!("unknown flag: {a}\n{USAGE}")),
            a if path.is_none() => path = Some(a.to_string()),
            a => return Err(anyhow!("unexpected argument: {a}\n{USAGE}")),
        }
    }

    Ok(UpdateArgs {
        path: path.ok_or_else(|| anyhow!("{USAGE}"))?,
        file,
        format,
        policy,
        revision,
    })
}

pub fn run(args: &[String], mode: OutputMode) -> Result<()> {
    let parsed = parse_args(args)?;
    let content = super::read_content(parsed.file.as_deref())?;
    let client = super::cli_client()?;
    let result = client.update_document(
        &parsed.path,
        &content,
        parsed.format,
        parsed.policy,
        parsed.revision,
    )?;
    super::paper_create::print_result("Updated", &result, mode)
}
