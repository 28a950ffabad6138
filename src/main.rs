#![deny(clippy::all)]
use anyhow::{Context, Result};
use colored::Colorize;
use dialoguer::{theme::ColorfulTheme, Confirm, Input, Password};
use imageboard_copier::{ApiClient, BoardClient, BoardConfig, MigrationSummary, Migrator};
use once_cell::sync::Lazy;
use regex::Regex;

// Matches a domain, ignoring "http"/"https" and a trailing "/".
static DOMAIN_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(?:https?://)?(.+?\..+?)/?$").unwrap());

// Philomena API keys are 20 characters long.
const API_KEY_LEN: usize = 20;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::builder().format_timestamp(None).init();

    println!(
        "{} v{}",
        "Imageboard Copier".bold().blue(),
        env!("CARGO_PKG_VERSION")
    );
    println!();
    println!("Ensure your filters are set correctly on the source booru. The active filter will be used when copying images.");
    println!("API keys can be found on the Account page of each booru.");
    println!();

    let source = prompt_board("source")?;
    let target = prompt_board("target")?;

    println!("Enter the query to copy from the source booru to the target booru. Any query that can be made on the site will work.");
    let query: String = Input::with_theme(&ColorfulTheme::default())
        .with_prompt("Query")
        .interact_text()?;
    let query = query.trim().to_string();

    let client = ApiClient::new()?;

    // Estimate the workload before committing to the run.
    let first_page = client
        .fetch_page(&source, &query, 1)
        .await
        .context("Failed to fetch the first page of results")?;

    if first_page.total == 0 {
        println!(
            "{}",
            "This query has no images! Double-check the query and try again."
                .bold()
                .red()
        );
        return Ok(());
    }

    println!(
        "There are {} images in this query",
        first_page.total.to_string().bold().green()
    );

    let proceed = Confirm::new()
        .with_prompt("Ensure the query and image count are correct. Continue?")
        .wait_for_newline(true)
        .interact()?;

    if !proceed {
        println!("{}", "Copy cancelled".bold().blue());
        return Ok(());
    }

    let migrator = Migrator::new(client, source, target, &query);
    let summary = migrator.run().await;

    print_results(&summary);

    Ok(())
}

fn prompt_board(role: &str) -> Result<BoardConfig> {
    let host: String = Input::with_theme(&ColorfulTheme::default())
        .with_prompt(format!("Enter {role} booru url"))
        .validate_with(|input: &String| {
            if DOMAIN_PATTERN.is_match(input.trim()) {
                Ok(())
            } else {
                Err("Invalid booru url")
            }
        })
        .interact_text()?;

    let host = DOMAIN_PATTERN
        .captures(host.trim())
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .context("Invalid booru url")?;

    let api_key: String = Password::with_theme(&ColorfulTheme::default())
        .with_prompt(format!("Enter {role} booru API key"))
        .validate_with(|input: &String| {
            if input.trim().len() == API_KEY_LEN {
                Ok(())
            } else {
                Err("API keys are 20 characters long")
            }
        })
        .interact()?;

    Ok(BoardConfig::new(&host, api_key.trim()))
}

fn print_results(summary: &MigrationSummary) {
    println!(
        "{} {} {}",
        summary.uploaded.to_string().bold().blue(),
        "images".bold().blue(),
        "copied".bold()
    );

    if summary.duplicates > 0 {
        println!(
            "{} {}",
            summary.duplicates.to_string().bold().yellow(),
            "images were already present on the target booru."
                .bold()
                .yellow()
        );
    }

    if summary.failed > 0 {
        println!(
            "{} {}",
            summary.failed.to_string().bold().red(),
            "images failed to upload and were skipped.".bold().red()
        );
    }
}
