//! Load statistics and result structures

use crate::app::models::Database;
use serde::{Deserialize, Serialize};

/// Result of loading one or more files
#[derive(Debug, Clone)]
pub struct LoadResult {
    /// Loaded entries
    pub database: Database,

    /// Always true: loaded values are deviations from steady state
    pub deviation: bool,

    /// Load statistics
    pub stats: LoadStats,
}

/// Counters collected while loading
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadStats {
    /// Files loaded successfully
    pub files_loaded: usize,

    /// Header rows by role
    pub name_rows: usize,
    pub class_rows: usize,
    pub comment_rows: usize,
    pub user_data_field_rows: usize,
    pub user_data_rows: usize,
    pub skipped_rows: usize,

    /// Rows in the data region
    pub data_rows: usize,

    /// Data rows without a valid date
    pub excluded_dates: usize,

    /// Cells read as missing values
    pub missing_cells: usize,

    pub series_created: usize,
    pub arrays_created: usize,

    /// Entries dropped by the selection filter
    pub entries_dropped: usize,

    /// Names changed by validity repair
    pub names_repaired: usize,
}

impl LoadStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total entries created
    pub fn entries_created(&self) -> usize {
        self.series_created + self.arrays_created
    }

    /// Add the counters of another load
    pub fn absorb(&mut self, other: &LoadStats) {
        self.files_loaded += other.files_loaded;
        self.name_rows += other.name_rows;
        self.class_rows += other.class_rows;
        self.comment_rows += other.comment_rows;
        self.user_data_field_rows += other.user_data_field_rows;
        self.user_data_rows += other.user_data_rows;
        self.skipped_rows += other.skipped_rows;
        self.data_rows += other.data_rows;
        self.excluded_dates += other.excluded_dates;
        self.missing_cells += other.missing_cells;
        self.series_created += other.series_created;
        self.arrays_created += other.arrays_created;
        self.entries_dropped += other.entries_dropped;
        self.names_repaired += other.names_repaired;
    }
}
