use anyhow::{Result, anyhow};

use crate::config::OutputMode;

fn parse_args(args: &[String]) -> Result<&str> {
    match args {
        [path] if !path.starts_with('-') => Ok(path.as_str()),
        _ => Err(anyhow!("usage: dropcli link <path>")),
    }
}

pub fn run(args: &[String], mode: OutputMode) -> Result<()> {
    let path = parse_args(args)?;

    let client = super::cli_client()?;
    let link = client.get_shared_link(path)?;

    match mode {
        OutputMode::Json => super::print_json(&link)?,
        OutputMode::Summary => println!("{}", link.url),
        OutputMode::Human => {
            println!("{}", link.url);
            if let Some(expires) = &link.expires {
                eprintln!("Expires: {}", expires);
            }
        }
    }
    Ok(())
}
