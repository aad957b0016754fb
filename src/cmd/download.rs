use anyhow::{Context, Result, anyhow};
use std::io::Write as _;
use std::path::PathBuf;

use crate::config::OutputMode;

const USAGE: &str = "Usage: dropcli download <remote_path> [local_path|-]";

#[derive(Debug, PartialEq, Eq)]
enum Target {
    Stdout,
    File(PathBuf),
}

#[derive(Debug, PartialEq, Eq)]
struct DownloadArgs {
    remote: String,
    name: String,
    target: Target,
}

fn parse_args(args: &[String]) -> Result<DownloadArgs> {
    let (remote, local) = match args {
        [remote] => (remote, None),
        [remote, local] => (remote, Some(local.as_str())),
        _ => return Err(anyhow!("{USAGE}")),
    };
    let name = remote
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .filter(|s| !s.is_empty())
        .ok_or_else(|| anyhow!("cannot download the root folder"))?
        .to_string();
    let target = match local {
        Some("-") => Target::Stdout,
        Some(local) => Target::File(PathBuf::from(local)),
        None => Target::File(PathBuf::from(&name)),
    };
    Ok(DownloadArgs {
        remote: remote.clone(),
        name,
        target,
    })
}

pub fn run(args: &[String], mode: OutputMode) -> Result<()> {
    let DownloadArgs {
        remote,
        name,
        target,
    } = parse_args(args)?;

    let client = super::cli_client()?;
    let bytes = client.download_file(&remote)?;

    let dest = match target {
        Target::Stdout => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(&bytes).context("failed to write to stdout")?;
            return stdout.flush().context("failed to write to stdout");
        }
        Target::File(dest) => dest,
    };
    std::fs::write(&dest, &bytes)
        .with_context(|| format!("cannot write '{}'", dest.display()))?;

    match mode {
        OutputMode::Json => super::print_json(&serde_json::json!({
            "path": remote,
            "local_path": dest.display().to_string(),
            "size": bytes.len(),
        }))?,
        OutputMode::Summary => println!("{}\t{}", dest.display(), bytes.len()),
        OutputMode::Human => println!(
            "Downloaded '{}' -> '{}' ({})",
            name,
            dest.display(),
            super::format_size(bytes.len() as u64)
        ),
    }
    Ok(())
}
