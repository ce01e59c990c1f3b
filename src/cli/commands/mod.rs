//! Command implementations for the databank CLI
//!
//! Each subcommand lives in its own module:
//! - `load`: load and merge databank files, report the entries
//! - `inspect`: show how the header rows of one file are classified

pub mod inspect;
pub mod load;
pub mod shared;

use crate::Result;
use crate::cli::args::{Args, Commands};

/// Main command runner
///
/// Dispatches to the subcommand handler. Reports have already been printed
/// when this returns.
pub async fn run(args: Args) -> Result<()> {
    match args.command {
        Some(Commands::Load(load_args)) => load::run_load(load_args).await.map(|_| ()),
        Some(Commands::Inspect(inspect_args)) => {
            inspect::run_inspect(inspect_args).await.map(|_| ())
        }
        None => Ok(()),
    }
}
