pub mod account;
pub mod download;
pub mod help;
pub mod info;
pub mod link;
pub mod ls;
pub mod paper;
pub mod paper_create;
pub mod paper_search;
pub mod paper_update;
pub mod read;
pub mod search;

use anyhow::{Context, Result, anyhow};
use serde::Serialize;
use std::io::{IsTerminal, Read as _};
use std::path::Path;

use crate::config::{AppConfig, OutputMode};
use crate::dropbox::{Dropbox, EntryKind, Metadata};
use crate::theme;
use crate::transport::HttpTransport;

pub fn cli_client() -> Result<Dropbox> {
    let cfg = AppConfig::load()?;
    let transport = HttpTransport::new(cfg.access_token()?)?;
    Ok(Dropbox::new(transport)
        .with_base_urls(cfg.api_base_url(), cfg.content_base_url())
        .with_timeout(cfg.timeout()))
}

/// Pulls the value following `flag` out of an argument iterator.
pub fn flag_value<'a>(
    iter: &mut impl Iterator<Item = &'a String>,
    flag: &str,
) -> Result<&'a str> {
    iter.next()
        .map(String::as_str)
        .ok_or_else(|| anyhow!("{flag} requires a value"))
}

pub fn parse_number<T: std::str::FromStr>(value: &str, flag: &str) -> Result<T> {
    value
        .parse()
        .map_err(|_| anyhow!("{flag} expects a number, got '{value}'"))
}

/// Splits a comma separated flag value, dropping blanks and leading dots.
pub fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().trim_start_matches('.').to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Document content from `--file`, or stdin when the file is absent or `-`.
pub fn read_content(file: Option<&str>) -> Result<Vec<u8>> {
    let content = match file {
        Some(path) if path != "-" => std::fs::read(Path::new(path))
            .with_context(|| format!("cannot read '{}'", path))?,
        _ => {
            let mut stdin = std::io::stdin();
            if stdin.is_terminal() {
                return Err(anyhow!("no content: pass --file <path> or pipe content on stdin"));
            }
            let mut buf = Vec::new();
            stdin.read_to_end(&mut buf).context("failed to read stdin")?;
            buf
        }
    };
    if content.is_empty() {
        return Err(anyhow!("document content is empty"));
    }
    Ok(content)
}

pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("failed to encode json")?;
    println!("{}", json);
    Ok(())
}

/// Prints a listing in the requested mode. `long` only affects human output.
pub fn print_entries(entries: &[Metadata], mode: OutputMode, long: bool) -> Result<()> {
    match mode {
        OutputMode::Json => print_json(&entries),
        OutputMode::Summary => {
            for e in entries {
                println!("{}", summary_line(e));
            }
            Ok(())
        }
        OutputMode::Human => {
            if entries.is_empty() {
                println!("(empty)");
            } else if long {
                print_entries_long(entries);
            } else {
                print_entries_short(entries);
            }
            Ok(())
        }
    }
}

pub fn summary_line(e: &Metadata) -> String {
    let kind = match e.kind {
        EntryKind::File => "file",
        EntryKind::Folder => "folder",
        EntryKind::Deleted => "deleted",
    };
    let size = e.size.map(|s| s.to_string()).unwrap_or_else(|| "-".into());
    format!("{}\t{}\t{}", kind, e.display_path(), size)
}

/// eza-style grid output (column-major) for a list of entries.
pub fn print_entries_short(entries: &[Metadata]) {
    use unicode_width::UnicodeWidthStr;

    let term_width = crossterm::terminal::size()
        .map(|(w, _)| w as usize)
        .unwrap_or(80);

    let display_widths: Vec<usize> = entries
        .iter()
        .map(|e| UnicodeWidthStr::width(e.name.as_str()))
        .collect();

    let max_width = display_widths.iter().copied().max().unwrap_or(1);
    let col_width = max_width + 2;
    let num_cols = (term_width / col_width).max(1);
    let num_rows = entries.len().div_ceil(num_cols);

    for row in 0..num_rows {
        for col in 0..num_cols {
            let idx = col * num_rows + row;
            if idx >= entries.len() {
                break;
            }
            let e = &entries[idx];
            let colored = theme::cli_colored(&e.name, theme::categorize(e));
            let is_last_col = col + 1 == num_cols || (col + 1) * num_rows + row >= entries.len();
            if is_last_col {
                print!("{}", colored);
            } else {
                let padding = col_width.saturating_sub(display_widths[idx]);
                print!("{}{}", colored, " ".repeat(padding));
            }
        }
        println!();
    }
}

/// Returns the colored `size  date  ` prefix used in long-format output.
pub fn long_entry_prefix(e: &Metadata) -> String {
    let size_str = match (e.kind, e.size) {
        (EntryKind::File, Some(size)) => format!("{:>9}", format_size(size)),
        _ => format!("{:>9}", "-"),
    };
    let date = format_date(e.server_modified.as_deref().unwrap_or(""));
    let colored_size = format!("\x1b[1;32m{}\x1b[0m", size_str);
    let colored_date = format!("\x1b[34m{:16}\x1b[0m", date);
    format!("{}  {}  ", colored_size, colored_date)
}

pub fn print_entries_long(entries: &[Metadata]) {
    for e in entries {
        let colored_path = theme::cli_colored(e.display_path(), theme::categorize(e));
        println!("{}{}", long_entry_prefix(e), colored_path);
    }
}

/// Prints the continuation hint for a partial listing.
pub fn print_more_hint(has_more: bool, cursor: Option<&str>) {
    if let (true, Some(cursor)) = (has_more, cursor) {
        eprintln!("More results available: --cursor {}", cursor);
    }
}

pub fn format_date(iso: &str) -> String {
    if iso.len() >= 16 {
        let s = iso.replace('T', " ");
        s[..16].to_string()
    } else if iso.is_empty() {
        "-".to_string()
    } else {
        iso.to_string()
    }
}

pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = 1024 * KB;
    const GB: u64 = 1024 * MB;
    const TB: u64 = 1024 * GB;

    if bytes >= TB {
        format!("{:.1} TB", bytes as f64 / TB as f64)
    } else if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(v: serde_json::Value) -> Metadata {
        serde_json::from_value(v).unwrap()
    }

    #[test]
    fn sizes() {
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(1536), "1.5 KB");
        assert_eq!(format_size(5 * 1024 * 1024 * 1024), "5.0 GB");
    }

    #[test]
    fn dates() {
        assert_eq!(format_date("2025-03-01T09:15:42Z"), "2025-03-01 09:15");
        assert_eq!(format_date(""), "-");
    }

    #[test]
    fn summary_lines() {
        let file = entry(serde_json::json!({
            ".tag": "file", "name": "a.txt", "path_display": "/Docs/a.txt", "size": 42
        }));
        let folder = entry(serde_json::json!({ ".tag": "folder", "name": "Docs", "path_lower": "/docs" }));
        assert_eq!(summary_line(&file), "file\t/Docs/a.txt\t42");
        assert_eq!(summary_line(&folder), "folder\t/docs\t-");
    }

    #[test]
    fn list_splitting() {
        assert_eq!(split_list(".md, paper,,txt "), vec!["md", "paper", "txt"]);
    }

    #[test]
    fn flag_values() {
        let args: Vec<String> = vec!["10".into()];
        let mut iter = args.iter();
        assert_eq!(flag_value(&mut iter, "--limit").unwrap(), "10");
        assert!(flag_value(&mut iter, "--limit").is_err());
        assert!(parse_number::<u32>("ten", "--limit").is_err());
    }

    #[test]
    fn content_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.md");
        std::fs::write(&path, "# hi").unwrap();
        assert_eq!(read_content(path.to_str()).unwrap(), b"# hi");

        let empty = dir.path().join("empty.md");
        std::fs::write(&empty, "").unwrap();
        assert!(read_content(empty.to_str()).is_err());
        assert!(read_content(Some("/definitely/not/here.md")).is_err());
    }
}
