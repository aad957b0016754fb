use anyhow::{Result, anyhow};

use crate::config::OutputMode;
use crate::dropbox::{ListFolderOptions, Metadata};

const USAGE: &str = "Usage: dropcli paper [--limit N] [path]";

fn parse_args(args: &[String]) -> Result<(String, Option<u32>)> {
    let mut path: Option<String> = None;
    let mut limit = None;
    let mut iter = args.iter();

    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--limit" => {
                let v = super::flag_value(&mut iter, "--limit")?;
                limit = Some(super::parse_number(v, "--limit")?);
            }
            a if a.starts_with('-') => return Err(anyhow!("unknown flag: {a}\n{USAGE}")),
            a if path.is_none() => path = Some(a.to_string()),
            a => return Err(anyhow!("unexpected argument: {a}\n{USAGE}")),
        }
    }
    Ok((path.unwrap_or_else(|| "/".into()), limit))
}

/// Keeps only Paper documents from a listing page.
fn paper_docs(entries: Vec<Metadata>) -> Vec<Metadata> {
    entries.into_iter().filter(Metadata::is_paper).collect()
}

pub fn run(args: &[String], mode: OutputMode) -> Result<()> {
    let (path, limit) = parse_args(args)?;
    let client = super::cli_client()?;
    let result = client.list_folder(
        &path,
        &ListFolderOptions {
            recursive: true,
            limit,
            ..Default::default()
        },
    )?;

    let has_more = result.has_more;
    let cursor = result.cursor;
    let docs = paper_docs(result.entries);

    if mode == OutputMode::Json {
        return super::print_json(&serde_json::json!({
            "entries": docs,
            "cursor": cursor,
            "has_more": has_more,
        }));
    }
    if docs.is_empty() && mode == OutputMode::Human {
        println!("No Paper documents under {}", path);
    } else {
        super::print_entries(&docs, mode, true)?;
    }
    // continuation is a plain listing page; `ls --cursor` picks it up
    super::print_more_hint(has_more, Some(cursor.as_str()));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filters_paper_files() {
        let entries: Vec<Metadata> = serde_json::from_value(serde_json::json!([
            {".tag": "file", "name": "Plan.paper"},
            {".tag": "folder", "name": "Old.paper"},
            {".tag": "file", "name": "notes.md"},
        ]))
        .unwrap();
        let docs = paper_docs(entries);
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].name, "Plan.paper");
    }

    #[test]
    fn parse_path_and_limit() {
        let args: Vec<String> = vec!["--limit".into(), "100".into(), "/Team".into()];
        assert_eq!(parse_args(&args).unwrap(), ("/Team".to_string(), Some(100)));
        assert_eq!(parse_args(&[]).unwrap(), ("/".to_string(), None));
    }
}
