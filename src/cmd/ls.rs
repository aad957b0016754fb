use anyhow::{Result, anyhow};

use crate::config::OutputMode;
use crate::dropbox::ListFolderOptions;

const USAGE: &str = "Usage: dropcli ls [-l|--long] [-r|--recursive] [--limit N] [--deleted] [--media] [--cursor C] [path]";

#[derive(Debug, Default, PartialEq, Eq)]
struct LsArgs {
    path: String,
    long: bool,
    recursive: bool,
    limit: Option<u32>,
    include_deleted: bool,
    include_media_info: bool,
    cursor: Option<String>,
}

fn parse_args(args: &[String]) -> Result<LsArgs> {
    let mut parsed = LsArgs::default();
    let mut path: Option<String> = None;
    let mut iter = args.iter();

    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "-l" | "--long" => parsed.long = true,
            "-r" | "--recursive" => parsed.recursive = true,
            "--deleted" => parsed.include_deleted = true,
            "--media" => parsed.include_media_info = true,
            "--limit" => {
                let v = super::flag_value(&mut iter, "--limit")?;
                parsed.limit = Some(super::parse_number(v, "--limit")?);
            }
            "--cursor" => {
                parsed.cursor = Some(super::flag_value(&mut iter, "--cursor")?.to_string());
            }
            a if a.starts_with('-') && a != "-" => {
                return Err(anyhow!("unknown option for ls: {a}\n{USAGE}"));
            }
            a => {
                if path.is_some() {
                    return Err(anyhow!("ls accepts at most one path\n{USAGE}"));
                }
                path = Some(a.to_string());
            }
        }
    }

    parsed.path = path.unwrap_or_else(|| "/".to_string());
    Ok(parsed)
}

pub fn run(args: &[String], mode: OutputMode) -> Result<()> {
    let parsed = parse_args(args)?;
    let client = super::cli_client()?;

    let result = match &parsed.cursor {
        Some(cursor) => client.list_folder_continue(cursor)?,
        None => client.list_folder(
            &parsed.path,
            &ListFolderOptions {
                recursive: parsed.recursive,
                limit: parsed.limit,
                include_media_info: parsed.include_media_info,
                include_deleted: parsed.include_deleted,
            },
        )?,
    };

    if mode == OutputMode::Json {
        return super::print_json(&result);
    }
    super::print_entries(&result.entries, mode, parsed.long || parsed.recursive)?;
    super::print_more_hint(result.has_more, Some(result.cursor.as_str()));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn defaults_to_root() {
        let parsed = parse_args(&[]).unwrap();
        assert_eq!(parsed.path, "/");
        assert!(!parsed.recursive);
    }

    #[test]
    fn parses_flags() {
        let parsed = parse_args(&args(&["-r", "--limit", "50", "--deleted", "/Docs"])).unwrap();
        assert_eq!(
            parsed,
            LsArgs {
                path: "/Docs".into(),
                recursive: true,
                limit: Some(50),
                include_deleted: true,
                ..Default::default()
            }
        );
    }

    #[test]
    fn cursor_flag() {
        let parsed = parse_args(&args(&["--cursor", "AAE123"])).unwrap();
        assert_eq!(parsed.cursor.as_deref(), Some("AAE123"));
    }

    #[test]
    fn rejects_two_paths_and_unknown_flags() {
        assert!(parse_args(&args(&["/a", "/b"])).is_err());
        assert!(parse_args(&args(&["--sort"])).is_err());
        assert!(parse_args(&args(&["--limit", "many"])).is_err());
    }
}
