use anyhow::Result;

use crate::config::OutputMode;

use super::search::SearchArgs;

const USAGE: &str = "Usage: dropcli paper-search <query> [--path P] [--max N]";

fn parse_args(args: &[String]) -> Result<SearchArgs> {
    let mut parsed = super::search::parse_args(args, false, USAGE)?;
    parsed.extensions = vec!["paper".to_string()];
    Ok(parsed)
}

pub fn run(args: &[String], mode: OutputMode) -> Result<()> {
    let parsed = parse_args(args)?;
    let client = super::cli_client()?;
    super::search::search_and_print(&client, &parsed, mode)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn restricted_to_paper_documents() {
        let parsed = parse_args(&args(&["q3", "plan", "--path", "/Team"])).unwrap();
        assert_eq!(parsed.query, "q3 plan");
        assert_eq!(parsed.path.as_deref(), Some("/Team"));
        assert_eq!(parsed.extensions, vec!["paper"]);
    }

    #[test]
    fn extension_filter_is_not_offered() {
        assert!(parse_args(&args(&["plan", "--ext", "md"])).is_err());
    }
}
