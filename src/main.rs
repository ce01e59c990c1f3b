use anyhow::Context;
use clap::Parser;
use csv_databank::cli::{args::Args, commands};
use std::process;

fn main() {
    let args = Args::parse();

    // If no subcommand was provided, show help and available commands
    if args.command.is_none() {
        show_help_and_commands();
        process::exit(0);
    }

    let runtime = match tokio::runtime::Runtime::new().context("Failed to create async runtime") {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            process::exit(1);
        }
    };

    let result = runtime.block_on(async {
        tokio::select! {
            result = commands::run(args) => result,
            _ = tokio::signal::ctrl_c() => {
                eprintln!("\nReceived CTRL+C, shutting down...");
                Err(csv_databank::Error::processing_interrupted(
                    "Loading interrupted by user",
                ))
            }
        }
    });

    if let Err(error) = result {
        eprintln!("Error: {:#}", error);
        process::exit(1);
    }
}

/// Show help information and available commands when no subcommand is provided
fn show_help_and_commands() {
    println!("CSV Databank - Time Series and Array Loader");
    println!("===========================================");
    println!();
    println!("Load semi-structured CSV databank files (entry names, class annotations,");
    println!("comments and user data above a dated data region) into named time series");
    println!("and typed numeric arrays.");
    println!();
    println!("USAGE:");
    println!("    csv-databank <COMMAND> [OPTIONS]");
    println!();
    println!("COMMANDS:");
    println!("    load        Load one or more databank files and report their entries");
    println!("    inspect     Show how the header rows of a file are classified");
    println!("    help        Show this help message or help for specific commands");
    println!();
    println!("OPTIONS:");
    println!("    -h, --help       Show help information");
    println!("    -V, --version    Show version information");
    println!();
    println!("EXAMPLES:");
    println!("    # Load a quarterly databank and list its entries:");
    println!("    csv-databank load macro.csv --entries");
    println!();
    println!("    # Merge several files, later files overwriting earlier entries:");
    println!("    csv-databank load 'data/*.csv' updates.csv --nan NA,n.a. --case lower");
    println!();
    println!("    # Check which rows are read as names, classes and comments:");
    println!("    csv-databank inspect macro.csv");
    println!();
    println!("For detailed help on any command, use:");
    println!("    csv-databank <COMMAND> --help");
}
