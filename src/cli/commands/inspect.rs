//! Inspect command implementation
//!
//! Prints the role assigned to every header line of a file, the aligned
//! entry names and the size of the data region. Nothing is reconstructed.

use super::shared::{load_configuration, setup_logging};
use crate::app::services::csv_loader::{Classification, CsvLoader, RowRole};
use crate::cli::args::{InspectArgs, OutputFormat};
use crate::{Error, Result};
use colored::*;
use tracing::{debug, info};

/// Inspect command runner
pub async fn run_inspect(args: InspectArgs) -> Result<Classification> {
    setup_logging(args.get_log_level(), false);
    debug!("Command line arguments: {:?}", args);

    args.validate()?;
    let config = load_configuration(args.config_file.as_deref(), &args.options)?;

    let text = tokio::fs::read_to_string(&args.input).await.map_err(|e| {
        Error::io(format!("Failed to read file {}", args.input.display()), e)
    })?;

    let file = args.input.display().to_string();
    info!("Inspecting {}", file);
    let classification = CsvLoader::new(config.load).classify_str(&text, &file)?;

    match args.output_format {
        OutputFormat::Human => print_human_report(&file, &classification),
        OutputFormat::Json => print_json_report(&classification)?,
    }

    Ok(classification)
}

/// Short label for a row role
pub fn role_label(role: &RowRole) -> String {
    match role {
        RowRole::NotReached => "before name row".to_string(),
        RowRole::SkippedLine => "skipped (line)".to_string(),
        RowRole::Name => "names".to_string(),
        RowRole::UserDataField(key) => format!("user data field '{}'", key),
        RowRole::Comment => "comment".to_string(),
        RowRole::FileUserData => "file user data".to_string(),
        RowRole::Class => "class".to_string(),
        RowRole::CommentRow => "entry comments".to_string(),
        RowRole::Units => "units".to_string(),
        RowRole::SkippedPattern => "skipped (pattern)".to_string(),
        RowRole::Data => "data".to_string(),
    }
}

fn print_human_report(file: &str, classification: &Classification) {
    println!("\n{} {}", "Header of".bold(), file.cyan());
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    for line in &classification.lines {
        let label = role_label(&line.role);
        let label = match line.role {
            RowRole::Name | RowRole::Class | RowRole::CommentRow => label.green(),
            RowRole::UserDataField(_) | RowRole::FileUserData => label.blue(),
            RowRole::Data => label.bold(),
            _ => label.dimmed(),
        };
        println!("   {:>5}  {:<24} {}", line.line, label, line.identifier);
    }

    let names: Vec<&str> = classification
        .header
        .names
        .iter()
        .map(String::as_str)
        .filter(|name| !name.is_empty())
        .collect();
    println!("\n{} {}", "Names:".bold(), names.join(", "));
    println!("{} {}", "Data rows:".bold(), classification.data.len());
    if let Some(user_data) = &classification.header.user_data {
        println!("{} {} = {}", "User data:".bold(), user_data.field, user_data.value);
    }
    println!();
}

fn print_json_report(classification: &Classification) -> Result<()> {
    let report = serde_json::json!({
        "lines": classification.lines,
        "header": classification.header,
        "data_rows": classification.data.len(),
    });
    let text = serde_json::to_string_pretty(&report)
        .map_err(|e| Error::configuration(format!("Failed to encode report: {}", e)))?;
    println!("{}", text);
    Ok(())
}
