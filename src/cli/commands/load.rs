//! Load command implementation
//!
//! Expands the inputs, loads every file in argument order into one database
//! and reports what was created.

use super::shared::{create_spinner, expand_inputs, load_configuration, setup_logging};
use crate::app::models::{Database, Entry};
use crate::app::services::csv_loader::{CsvLoader, LoadResult};
use crate::cli::args::{LoadArgs, OutputFormat};
use crate::Result;
use colored::*;
use indicatif::HumanDuration;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Load command runner
///
/// 1. Set up logging and configuration
/// 2. Expand the input patterns
/// 3. Load and merge the files with a progress spinner
/// 4. Report the resulting database
pub async fn run_load(args: LoadArgs) -> Result<LoadResult> {
    let start_time = Instant::now();

    setup_logging(args.get_log_level(), args.quiet);
    info!("Starting databank load");
    debug!("Command line arguments: {:?}", args);

    args.validate()?;

    let config = load_configuration(args.config_file.as_deref(), &args.options)?;
    debug!("Loaded configuration: {:?}", config);

    let paths = expand_inputs(&args.inputs)?;
    info!("Loading {} files", paths.len());

    let read_concurrency = args.workers.unwrap_or(config.runtime.read_concurrency);
    let loader = CsvLoader::new(config.load).with_read_concurrency(read_concurrency);

    let spinner = args
        .show_progress()
        .then(|| create_spinner(&format!("Loading {} files", paths.len())));

    let result = loader.load_files(&paths).await;
    if let Some(spinner) = spinner {
        spinner.finish_and_clear();
    }
    let result = result?;

    generate_report(&args, &result, start_time.elapsed())?;
    Ok(result)
}

fn generate_report(args: &LoadArgs, result: &LoadResult, elapsed: Duration) -> Result<()> {
    match args.output_format {
        OutputFormat::Human => {
            if !args.quiet {
                print_human_report(result, elapsed, args.show_entries);
            }
            Ok(())
        }
        OutputFormat::Json => print_json_report(result, elapsed, args.show_entries),
    }
}

fn print_human_report(result: &LoadResult, elapsed: Duration, show_entries: bool) {
    let stats = &result.stats;

    println!("\n{}", "Databank Load Complete".green().bold());
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("{}", "Summary:".bold());
    println!("   • Files loaded: {}", stats.files_loaded);
    println!("   • Entries: {}", result.database.len());
    println!("   • Series created: {}", stats.series_created);
    println!("   • Arrays created: {}", stats.arrays_created);
    println!("   • Data rows: {}", stats.data_rows);
    println!("   • Missing cells: {}", stats.missing_cells);
    println!("   • Load time: {}", HumanDuration(elapsed));

    if stats.excluded_dates > 0 {
        println!(
            "   {} {} data rows had no valid date",
            "!".yellow().bold(),
            stats.excluded_dates
        );
    }
    if stats.names_repaired > 0 {
        println!(
            "   {} {} names were repaired",
            "!".yellow().bold(),
            stats.names_repaired
        );
    }
    if stats.entries_dropped > 0 {
        println!("   • Entries dropped by selection: {}", stats.entries_dropped);
    }
    if let Some(user_data) = result.database.user_data() {
        println!("   • User data field: {}", user_data.field.cyan());
    }

    if show_entries && !result.database.is_empty() {
        println!("\n{}", "Entries:".bold());
        for line in entry_lines(&result.database) {
            println!("   {}", line);
        }
    }

    println!();
}

fn entry_lines(database: &Database) -> Vec<String> {
    database
        .iter()
        .map(|(name, entry)| {
            let shape = entry
                .shape()
                .iter()
                .map(usize::to_string)
                .collect::<Vec<_>>()
                .join("x");
            match entry {
                Entry::Series(series) => format!(
                    "{} {} [{}] {}",
                    name.cyan(),
                    entry.kind_label(),
                    shape,
                    series.range_label()
                ),
                Entry::Array(_) => format!("{} {} [{}]", name.cyan(), entry.kind_label(), shape),
            }
        })
        .collect()
}

fn print_json_report(result: &LoadResult, elapsed: Duration, show_entries: bool) -> Result<()> {
    let mut report = serde_json::json!({
        "stats": result.stats,
        "deviation": result.deviation,
        "entries": result.database.names(),
        "load_time_seconds": elapsed.as_secs_f64(),
    });
    if show_entries {
        report["database"] = serde_json::to_value(&result.database)
            .map_err(|e| crate::Error::configuration(format!("Failed to encode database: {}", e)))?;
    }

    let text = serde_json::to_string_pretty(&report)
        .map_err(|e| crate::Error::configuration(format!("Failed to encode report: {}", e)))?;
    println!("{}", text);
    Ok(())
}
