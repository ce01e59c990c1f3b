//! Test utilities shared by the databank loader test modules

use std::io::Write;
use tempfile::NamedTempFile;

use super::{CsvLoader, LoadResult};
use crate::config::LoadOptions;

mod names_tests;
mod numeric_tests;

/// Three quarterly series with comments and a user data field row
pub fn create_quarterly_csv() -> String {
    r#"Variables->,a,b,c
Class[Size],tseries,tseries,tseries
Comment,first,second,third
.source,imf,oecd,wb
2000Q1,1,2,3
2000Q2,4,5,6
2000Q4,7,8,9"#
        .to_string()
}

/// Load text with default options
pub fn load(text: &str) -> LoadResult {
    load_with(LoadOptions::default(), text)
}

/// Load text with the given options
pub fn load_with(options: LoadOptions, text: &str) -> LoadResult {
    CsvLoader::new(options).load_str(text, "test.csv").unwrap()
}

/// Helper to create a temporary file with given content
pub fn create_temp_file(content: &str) -> NamedTempFile {
    let mut temp_file = NamedTempFile::new().unwrap();
    writeln!(temp_file, "{}", content).unwrap();
    temp_file
}

/// Assert two floats are equal, treating NaN as equal to NaN
pub fn assert_same(actual: Option<f64>, expected: f64) {
    let actual = actual.unwrap();
    if expected.is_nan() {
        assert!(actual.is_nan(), "expected NaN, got {}", actual);
    } else {
        assert_eq!(actual, expected);
    }
}
