//! CSV Databank Library
//!
//! A Rust library for loading semi-structured CSV "databank" files into a typed,
//! in-memory collection of named entries.
//!
//! This library provides tools for:
//! - Classifying leading metadata rows (names, class/shape, comments, user data)
//! - Parsing the leading date column with automatic or forced frequency detection
//! - Telling genuine negative infinities apart from missing-value markers
//! - Rebuilding multi-column groups into time series or typed numeric arrays
//! - Normalizing, repairing and filtering entry names
//! - Folding several files into one database in a deterministic order

pub mod config;
pub mod constants;

// Core application modules
pub mod app {
    pub mod models;
    pub mod services {
        pub mod csv_loader;
        pub mod dates;
    }
}

// CLI modules
pub mod cli {
    pub mod args;
    pub mod commands;
}

// Re-export commonly used types
pub use app::models::{Database, Entry, NdArray, Series, SeriesData, TypedArray, UserData};
pub use app::services::csv_loader::{CsvLoader, LoadResult, LoadStats};
pub use app::services::dates::{Frequency, Serial};
pub use config::{Config, LoadOptions};

/// Result type alias for databank loading
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for databank loading operations
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// I/O operation failed
    #[error("I/O error: {message}")]
    Io {
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// File not found
    #[error("File not found: {path}")]
    FileNotFound { path: String },

    /// The file cannot be read as tabular numeric data
    #[error("Invalid file format in '{file}': {message}")]
    InvalidFormat { file: String, message: String },

    /// Valid dates in one file disagree on frequency
    #[error("Mixed date frequencies in '{file}': {frequencies}")]
    MixedFrequency { file: String, frequencies: String },

    /// A name rewrite function did not produce a usable name
    #[error("Invalid name rewrite result in '{file}' for entry '{name}'")]
    InvalidNameRewrite { file: String, name: String },

    /// The file-level user data expression could not be evaluated
    #[error("Invalid user data expression in '{file}': {message}")]
    InvalidUserData {
        file: String,
        message: String,
        #[source]
        source: serde_json::Error,
    },

    /// A class annotation names a numeric type that does not exist
    #[error("Unknown numeric type '{type_name}' in '{file}'")]
    UnknownNumericType { file: String, type_name: String },

    /// Array data does not fill the requested shape
    #[error("Shape mismatch: shape {shape:?} needs {expected} elements, got {actual}")]
    ShapeMismatch {
        shape: Vec<usize>,
        expected: usize,
        actual: usize,
    },

    /// Date codec failure (out-of-range period, impossible calendar date)
    #[error("Invalid date: {message}")]
    InvalidDate { message: String },

    /// Configuration error
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// Processing interrupted
    #[error("Processing interrupted: {reason}")]
    ProcessingInterrupted { reason: String },
}

impl Error {
    /// Create an I/O error with context
    pub fn io(message: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            message: message.into(),
            source,
        }
    }

    /// Create a file not found error
    pub fn file_not_found(path: impl Into<String>) -> Self {
        Self::FileNotFound { path: path.into() }
    }

    /// Create an invalid file format error
    pub fn invalid_format(file: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidFormat {
            file: file.into(),
            message: message.into(),
        }
    }

    /// Create a mixed frequency error
    pub fn mixed_frequency(file: impl Into<String>, frequencies: impl Into<String>) -> Self {
        Self::MixedFrequency {
            file: file.into(),
            frequencies: frequencies.into(),
        }
    }

    /// Create an invalid name rewrite error
    pub fn invalid_name_rewrite(file: impl Into<String>, name: impl Into<String>) -> Self {
        Self::InvalidNameRewrite {
            file: file.into(),
            name: name.into(),
        }
    }

    /// Create an invalid user data error wrapping the evaluation failure
    pub fn invalid_user_data(file: impl Into<String>, source: serde_json::Error) -> Self {
        Self::InvalidUserData {
            file: file.into(),
            message: source.to_string(),
            source,
        }
    }

    /// Create an unknown numeric type error
    pub fn unknown_numeric_type(file: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self::UnknownNumericType {
            file: file.into(),
            type_name: type_name.into(),
        }
    }

    /// Create a shape mismatch error
    pub fn shape_mismatch(shape: &[usize], actual: usize) -> Self {
        Self::ShapeMismatch {
            shape: shape.to_vec(),
            expected: shape.iter().product(),
            actual,
        }
    }

    /// Create a date codec error
    pub fn invalid_date(message: impl Into<String>) -> Self {
        Self::InvalidDate {
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create a processing interrupted error
    pub fn processing_interrupted(reason: impl Into<String>) -> Self {
        Self::ProcessingInterrupted {
            reason: reason.into(),
        }
    }

    /// File the error was raised for, when it is tied to one
    pub fn file(&self) -> Option<&str> {
        match self {
            Self::InvalidFormat { file, .. }
            | Self::MixedFrequency { file, .. }
            | Self::InvalidNameRewrite { file, .. }
            | Self::InvalidUserData { file, .. }
            | Self::UnknownNumericType { file, .. } => Some(file),
            Self::FileNotFound { path } => Some(path),
            _ => None,
        }
    }
}

// Automatic conversions from common error types
impl From<std::io::Error> for Error {
    fn from(error: std::io::Error) -> Self {
        Self::Io {
            message: "I/O operation failed".to_string(),
            source: error,
        }
    }
}
