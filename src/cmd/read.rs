use anyhow::{Result, anyhow};

use crate::config::OutputMode;
use crate::dropbox::ExportFormat;

const USAGE: &str = "Usage: dropcli read <path> [--format markdown|html]";

fn parse_args(args: &[String]) -> Result<(String, ExportFormat)> {
    let mut path: Option<String> = None;
    let mut format = ExportFormat::default();
    let mut iter = args.iter();

    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--format" | "-f" => format = super::flag_value(&mut iter, "--format")?.parse()?,
            a if a.starts_with('-') => return Err(anyhow!("unknown flag: {a}\n{USAGE}")),
            a if path.is_none() => path = Some(a.to_string()),
            a => return Err(anyhow!("unexpected argument: {a}\n{USAGE}")),
        }
    }
    let path = path.ok_or_else(|| anyhow!("{USAGE}"))?;
    Ok((path, format))
}

pub fn run(args: &[String], mode: OutputMode) -> Result<()> {
    let (path, format) = parse_args(args)?;
    let client = super::cli_client()?;
    let content = client.export(&path, format)?;

    match mode {
        OutputMode::Json => super::print_json(&serde_json::json!({
            "path": path,
            "format": format.as_api_str(),
            "content": content,
        })),
        _ => {
            print!("{}", content);
            if !content.ends_with('\n') {
                println!();
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_defaults_to_markdown() {
        let args: Vec<String> = vec!["/Plan.paper".into()];
        assert_eq!(
            parse_args(&args).unwrap(),
            ("/Plan.paper".to_string(), ExportFormat::Markdown)
        );
    }

    #[test]
    fn html_format_and_missing_path() {
        let args: Vec<String> = vec!["-f".into(), "html".into(), "/Plan.paper".into()];
        assert_eq!(parse_args(&args).unwrap().1, ExportFormat::Html);
        assert!(parse_args(&["--format".to_string(), "html".to_string()]).is_err());
        assert!(parse_args(&["/a".to_string(), "--format".to_string(), "pdf".to_string()]).is_err());
    }
}
