use anyhow::{Result, anyhow};

use crate::config::OutputMode;
use crate::dropbox::EntryKind;

const USAGE: &str = "Usage: dropcli info [-m|--media] <path>";

fn parse_args(args: &[String]) -> Result<(String, bool)> {
    let mut media = false;
    let mut path: Option<String> = None;

    for arg in args {
        match arg.as_str() {
            "--media" | "-m" => media = true,
            a if a.starts_with('-') => return Err(anyhow!("unknown flag: {a}\n{USAGE}")),
            a if path.is_none() => path = Some(a.to_string()),
            a => return Err(anyhow!("unexpected argument: {a}\n{USAGE}")),
        }
    }
    let path = path.ok_or_else(|| anyhow!("{USAGE}"))?;
    Ok((path, media))
}

pub fn run(args: &[String], mode: OutputMode) -> Result<()> {
    let (path, media) = parse_args(args)?;

    let client = super::cli_client()?;
    let meta = client.get_metadata(&path, media)?;

    match mode {
        OutputMode::Json => return super::print_json(&meta),
        OutputMode::Summary => {
            println!("{}", super::summary_line(&meta));
            return Ok(());
        }
        OutputMode::Human => {}
    }

    println!("Name:      {}", meta.name);
    println!("Path:      {}", meta.display_path());
    let kind = match meta.kind {
        EntryKind::File => "file",
        EntryKind::Folder => "folder",
        EntryKind::Deleted => "deleted",
    };
    println!("Type:      {}", kind);
    if let Some(size) = meta.size {
        println!("Size:      {} ({})", super::format_size(size), size);
    }
    if let Some(id) = &meta.id {
        println!("ID:        {}", id);
    }
    if let Some(rev) = &meta.rev {
        println!("Revision:  {}", rev);
    }
    if let Some(modified) = &meta.server_modified {
        println!("Modified:  {}", modified);
    }
    if let Some(hash) = &meta.content_hash {
        println!("Hash:      {}", hash);
    }
    if let Some(media_info) = &meta.media_info {
        let pretty = serde_json::to_string_pretty(media_info).unwrap_or_default();
        println!("Media:");
        for line in pretty.lines() {
            println!("  {}", line);
        }
    }
    Ok(())
}
