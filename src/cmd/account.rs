use anyhow::{Result, anyhow};

use crate::config::OutputMode;

fn check_args(args: &[String]) -> Result<()> {
    match args.first() {
        Some(extra) => Err(anyhow!("unexpected argument: {extra}\nUsage: dropcli account")),
        None => Ok(()),
    }
}

pub fn run(args: &[String], mode: OutputMode) -> Result<()> {
    check_args(args)?;

    let client = super::cli_client()?;
    let account = client.current_account()?;

    match mode {
        OutputMode::Json => super::print_json(&account)?,
        OutputMode::Summary => println!(
            "{}\t{}\t{}",
            account.name.display_name,
            account.email.as_deref().unwrap_or("-"),
            account.account_id
        ),
        OutputMode::Human => {
            println!("Name:     {}", account.name.display_name);
            if let Some(email) = &account.email {
                let verified = match account.email_verified {
                    Some(false) => " (unverified)",
                    _ => "",
                };
                println!("Email:    {}{}", email, verified);
            }
            println!("ID:       {}", account.account_id);
            if let Some(country) = &account.country {
                println!("Country:  {}", country);
            }
            if let Some(kind) = &account.account_type {
                println!("Plan:     {}", kind.tag);
            }
        }
    }
    Ok(())
}
