use anyhow::{Result, anyhow};

use crate::config::OutputMode;
use crate::dropbox::{Dropbox, Metadata, SearchOptions};

const USAGE: &str = "Usage: dropcli search <query> [--path P] [--max N] [--ext md,txt] [--category document]";

#[derive(Debug, Default, PartialEq, Eq)]
pub(super) struct SearchArgs {
    pub query: String,
    pub path: Option<String>,
    pub max_results: Option<u64>,
    pub extensions: Vec<String>,
    pub categories: Vec<String>,
}

/// Parses search arguments. `--ext`/`--category` are only accepted when
/// `filters` is set.
pub(super) fn parse_args(args: &[String], filters: bool, usage: &str) -> Result<SearchArgs> {
    let mut parsed = SearchArgs::default();
    let mut words: Vec<&str> = Vec::new();
    let mut iter = args.iter();

    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--path" | "-p" => {
                parsed.path = Some(super::flag_value(&mut iter, "--path")?.to_string());
            }
            "--max" | "-n" => {
                let v = super::flag_value(&mut iter, "--max")?;
                parsed.max_results = Some(super::parse_number(v, "--max")?);
            }
            "--ext" if filters => {
                parsed.extensions = super::split_list(super::flag_value(&mut iter, "--ext")?);
            }
            "--category" if filters => {
                parsed.categories = super::split_list(super::flag_value(&mut iter, "--category")?);
            }
            a if a.starts_with('-') => return Err(anyhow!("unknown flag: {a}\n{usage}")),
            a => words.push(a),
        }
    }

    parsed.query = words.join(" ");
    if parsed.query.trim().is_empty() {
        return Err(anyhow!("search query cannot be empty\n{usage}"));
    }
    Ok(parsed)
}

pub(super) fn search_and_print(
    client: &Dropbox,
    parsed: &SearchArgs,
    mode: OutputMode,
) -> Result<()> {
    let result = client.search(
        &parsed.query,
        &SearchOptions {
            path: parsed.path.clone(),
            max_results: parsed.max_results,
            file_extensions: parsed.extensions.clone(),
            file_categories: parsed.categories.clone(),
        },
    )?;

    if mode == OutputMode::Json {
        return super::print_json(&result);
    }

    let entries: Vec<Metadata> = result.entries().cloned().collect();
    if entries.is_empty() && mode == OutputMode::Human {
        println!("No results for \"{}\"", parsed.query);
        return Ok(());
    }
    super::print_entries(&entries, mode, true)?;
    super::print_more_hint(result.has_more, result.cursor.as_deref());
    Ok(())
}

pub fn run(args: &[String], mode: OutputMode) -> Result<()> {
    let parsed = parse_args(args, true, USAGE)?;
    let client = super::cli_client()?;
    search_and_print(&client, &parsed, mode)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn empty_query_detected_before_api() {
        assert!(parse_args(&args(&["  "]), true, USAGE).is_err());
        assert!(parse_args(&args(&["--max", "5"]), true, USAGE).is_err());
    }

    #[test]
    fn multi_word_query_and_filters() {
        let parsed = parse_args(
            &args(&["quarterly", "plan", "--ext", ".md,paper", "--path", "/Team", "-n", "20"]),
            true,
            USAGE,
        )
        .unwrap();
        assert_eq!(parsed.query, "quarterly plan");
        assert_eq!(parsed.extensions, vec!["md", "paper"]);
        assert_eq!(parsed.path.as_deref(), Some("/Team"));
        assert_eq!(parsed.max_results, Some(20));
    }

    #[test]
    fn filters_can_be_disabled() {
        assert!(parse_args(&args(&["q", "--ext", "md"]), false, USAGE).is_err());
    }
}
