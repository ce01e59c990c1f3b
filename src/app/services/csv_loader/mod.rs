//! Databank CSV loader
//!
//! Reads semi-structured CSV files in which metadata rows (names, class
//! annotations, comments, user data) precede a data region whose first
//! column holds dates, and rebuilds the named series and arrays they encode.
//!
//! ## Architecture
//!
//! - [`tokenizer`] - Line splitting, delimiter and missing-token substitution
//! - [`classifier`] - Header row roles and the metadata bundle
//! - [`date_column`] - Date strings to a dense period axis
//! - [`numeric_table`] - Two-pass numeric parse with missing-value mask
//! - [`class_spec`] - `type[dims]` annotations
//! - [`reconstruct`] - Column groups to series and typed arrays
//! - [`names`] - Name rewrite, case conversion, repair and selection
//! - [`loader`] - Orchestration, single and multi-file
//! - [`stats`] - Load statistics and result structures
//!
//! ## Usage
//!
//! ```rust
//! use csv_databank::{CsvLoader, LoadOptions};
//!
//! # fn example() -> csv_databank::Result<()> {
//! let text = "Variables->,gdp\nClass[Size],tseries\n2000Q1,1.5\n2000Q2,1.7\n";
//! let result = CsvLoader::new(LoadOptions::default()).load_str(text, "inline.csv")?;
//!
//! let gdp = result.database.series("gdp").expect("gdp series");
//! assert_eq!(gdp.n_periods(), 2);
//! # Ok(())
//! # }
//! ```

pub mod class_spec;
pub mod classifier;
pub mod date_column;
pub mod loader;
pub mod names;
pub mod numeric_table;
pub mod reconstruct;
pub mod stats;
pub mod tokenizer;

#[cfg(test)]
pub mod tests;

// Re-export main types for easy access
pub use classifier::{Classification, HeaderBundle, RowRole};
pub use loader::CsvLoader;
pub use stats::{LoadResult, LoadStats};
