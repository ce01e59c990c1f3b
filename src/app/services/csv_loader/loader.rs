//! Load orchestration
//!
//! One file is processed start to finish: pre-processing, header
//! classification, date column, numeric table, name normalization and entry
//! reconstruction. Entries are only inserted once the whole file succeeded.

use super::classifier::{Classification, RowClassifier, RowRole};
use super::date_column::{DateAxis, parse_date_column};
use super::names::{normalize_names, select_names};
use super::numeric_table::NumericTable;
use super::reconstruct::Reconstructor;
use super::stats::{LoadResult, LoadStats};
use super::tokenizer::Tokenizer;
use crate::app::models::Database;
use crate::config::LoadOptions;
use crate::constants::DEFAULT_READ_CONCURRENCY;
use crate::{Error, Result};
use futures::stream::{self, StreamExt};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Loads databank CSV files into a [`Database`]
#[derive(Debug, Clone)]
pub struct CsvLoader {
    options: LoadOptions,
    read_concurrency: usize,
}

impl CsvLoader {
    pub fn new(options: LoadOptions) -> Self {
        Self {
            options,
            read_concurrency: DEFAULT_READ_CONCURRENCY,
        }
    }

    /// Number of files read ahead concurrently by the multi-file loaders
    pub fn with_read_concurrency(mut self, read_concurrency: usize) -> Self {
        self.read_concurrency = read_concurrency.max(1);
        self
    }

    pub fn options(&self) -> &LoadOptions {
        &self.options
    }

    /// Load one file's text into a new database
    pub fn load_str(&self, text: &str, file: &str) -> Result<LoadResult> {
        let mut database = Database::new();
        let stats = self.load_into(text, file, &mut database)?;
        Ok(LoadResult {
            database,
            deviation: true,
            stats,
        })
    }

    /// Load one file's text into an existing database
    ///
    /// Entries with names already in `database` are replaced. On error the
    /// database is left untouched.
    pub fn load_into(&self, text: &str, file: &str, database: &mut Database) -> Result<LoadStats> {
        info!("Loading databank file: {}", file);
        self.options.validate()?;

        let tokenizer = Tokenizer::new(&self.options)?;
        let text = self.pre_process(text);
        let text = tokenizer.normalize_delimiter(&text);
        let classification = RowClassifier::new(&self.options, &tokenizer)?.classify(&text, file)?;

        let mut stats = header_stats(&classification);
        let Classification { header, data, .. } = classification;
        stats.data_rows = data.len();

        let parser = self.options.date_parser()?;
        let dates: Vec<&str> = data.iter().map(|row| row.date()).collect();
        let axis = parse_date_column(&dates, &parser, self.options.first_date_only, file)?;
        stats.excluded_dates = axis.excluded;
        debug!("Date axis {} ({} periods)", axis.label(), axis.n_periods);

        let table = if data.is_empty() {
            None
        } else {
            let cols = data
                .iter()
                .map(|row| row.values().len())
                .max()
                .unwrap_or(0)
                .max(header.names.len());
            let rows: Vec<&[String]> = data.iter().map(|row| row.values()).collect();
            Some(NumericTable::read(&rows, cols, &tokenizer, file)?)
        };
        stats.missing_cells = table.as_ref().map_or(0, NumericTable::missing_count);

        let normalized = normalize_names(&header.names, &self.options, file)?;
        stats.names_repaired = normalized.repaired;
        let names = select_names(&normalized.names, self.options.select.as_deref());

        let reconstruction = Reconstructor {
            header: &header,
            names: &names,
            table: table.as_ref(),
            axis: &axis,
            file,
        }
        .run()?;
        stats.series_created = reconstruction.series_created;
        stats.arrays_created = reconstruction.arrays_created;
        stats.entries_dropped = reconstruction.dropped;

        let mut loaded = Database::new();
        for (name, entry) in reconstruction.entries {
            loaded.insert(name, entry);
        }
        if let Some(user_data) = header.user_data {
            loaded.set_user_data(user_data);
        }
        database.merge(loaded);
        stats.files_loaded = 1;

        info!(
            "Loaded {} entries from {} ({} data rows, dates {})",
            stats.entries_created(),
            file,
            stats.data_rows,
            axis_summary(&axis)
        );
        Ok(stats)
    }

    /// Read and load one file
    pub fn load_file(&self, path: &Path) -> Result<LoadResult> {
        let text = std::fs::read_to_string(path).map_err(|e| read_error(path, e))?;
        self.load_str(&text, &path.display().to_string())
    }

    /// Load several files in order into a new database
    pub async fn load_files(&self, paths: &[PathBuf]) -> Result<LoadResult> {
        let mut database = Database::new();
        let stats = self.load_files_into(paths, &mut database).await?;
        Ok(LoadResult {
            database,
            deviation: true,
            stats,
        })
    }

    /// Load several files into an existing database
    ///
    /// Files are read concurrently but merged strictly in input order, so a
    /// later file overwrites same-named entries of an earlier one. When a
    /// file fails, files merged before it stay in `database`.
    pub async fn load_files_into(&self, paths: &[PathBuf], database: &mut Database) -> Result<LoadStats> {
        let mut stats = LoadStats::new();

        let reads = stream::iter(paths.iter().cloned())
            .map(|path| async move {
                let text = tokio::fs::read_to_string(&path).await;
                (path, text)
            })
            .buffered(self.read_concurrency.max(1));
        let mut reads = std::pin::pin!(reads);

        while let Some((path, text)) = reads.next().await {
            let text = text.map_err(|e| read_error(&path, e))?;
            let file_stats = self.load_into(&text, &path.display().to_string(), database)?;
            stats.absorb(&file_stats);
        }

        info!(
            "Loaded {} files, {} entries in database",
            stats.files_loaded,
            database.len()
        );
        Ok(stats)
    }

    /// Classify the header of a text without building entries
    pub fn classify_str(&self, text: &str, file: &str) -> Result<Classification> {
        self.options.validate()?;
        let tokenizer = Tokenizer::new(&self.options)?;
        let text = self.pre_process(text);
        let text = tokenizer.normalize_delimiter(&text);
        RowClassifier::new(&self.options, &tokenizer)?.classify(&text, file)
    }

    fn pre_process(&self, text: &str) -> String {
        self.options
            .pre_process
            .iter()
            .fold(text.to_string(), |current, func| func.apply(&current))
    }
}

fn header_stats(classification: &Classification) -> LoadStats {
    LoadStats {
        name_rows: classification.count(|r| *r == RowRole::Name),
        class_rows: classification.count(|r| *r == RowRole::Class),
        comment_rows: classification.count(|r| *r == RowRole::CommentRow),
        user_data_field_rows: classification.count(|r| matches!(r, RowRole::UserDataField(_))),
        user_data_rows: classification.count(|r| *r == RowRole::FileUserData),
        skipped_rows: classification.count(|r| {
            matches!(
                r,
                RowRole::NotReached
                    | RowRole::SkippedLine
                    | RowRole::SkippedPattern
                    | RowRole::Comment
                    | RowRole::Units
            )
        }),
        ..LoadStats::default()
    }
}

fn axis_summary(axis: &DateAxis) -> String {
    match axis.frequency {
        Some(freq) => format!("{} {}", freq, axis.label()),
        None => "none".to_string(),
    }
}

fn read_error(path: &Path, error: std::io::Error) -> Error {
    match error.kind() {
        std::io::ErrorKind::NotFound => Error::file_not_found(path.display().to_string()),
        std::io::ErrorKind::InvalidData => {
            Error::invalid_format(path.display().to_string(), "file is not valid UTF-8 text")
        }
        _ => Error::io(format!("Failed to read file {}", path.display()), error),
    }
}
