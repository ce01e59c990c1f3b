//! Integration tests for loading databank files from disk
//!
//! These tests write small databank files to a temporary directory and drive
//! the public loader API end to end, including multi-file merging.

use csv_databank::app::services::dates::{Frequency, serial};
use csv_databank::cli::commands::shared::expand_inputs;
use csv_databank::{CsvLoader, Database, Entry, Error, LoadOptions, TypedArray};
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

/// A databank with every kind of header row and both entry kinds
const MACRO_DATABANK: &str = "\
# exported databank
Variables->,gdp,cpi,rates,,w
Class[Size],tseries,tseries,tseries[1-by-2],,int64
Comment,Real GDP,Consumer prices,Short and long rates,,Weights
Units,bn,index,pct,,
.source,imf,oecd,ecb,,
UserData[Meta],\"{\"\"vintage\"\": 2024}\",,,,
2000Q1,100,-Inf,1.5,4.0,3
2000Q2,101,NA,1.6,4.1,4
2000Q3,***,99,1.7,4.2,5
";

fn write_file(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    path
}

/// Load a realistic file and check every entry it produces
///
/// Purpose: Validate header classification, dates, missing values and both entry kinds together
/// Benefit: Catches regressions in how the pipeline stages hand data to each other
#[test]
fn test_load_realistic_databank() {
    let temp_dir = TempDir::new().unwrap();
    let path = write_file(&temp_dir, "macro.csv", MACRO_DATABANK);
    let loader = CsvLoader::new(LoadOptions::default().with_nan(["NA"]));

    let result = loader.load_file(&path).expect("Failed to load databank file");
    let db = &result.database;
    let q1 = serial(Frequency::Quarterly, 2000, 1).unwrap();

    assert_eq!(db.names(), &["gdp", "cpi", "rates", "w"]);
    assert!(result.deviation);

    let gdp = db.series("gdp").unwrap();
    assert_eq!(gdp.frequency, Some(Frequency::Quarterly));
    assert_eq!(gdp.range_label(), "2000Q1:2000Q3");
    assert_eq!(gdp.comments.as_slice(), &["Real GDP".to_string()]);
    assert_eq!(gdp.user_data["source"].as_slice(), &["imf".to_string()]);
    assert!(gdp.real_value_at(q1 + 2, 0).unwrap().is_nan());

    let cpi = db.series("cpi").unwrap();
    assert_eq!(cpi.real_value_at(q1, 0), Some(f64::NEG_INFINITY));
    assert!(cpi.real_value_at(q1 + 1, 0).unwrap().is_nan());
    assert_eq!(cpi.real_value_at(q1 + 2, 0), Some(99.0));

    let rates = db.series("rates").unwrap();
    assert_eq!(rates.trailing_shape(), &[1, 2]);
    assert_eq!(rates.real_value_at(q1 + 1, 1), Some(4.1));

    match db.array("w").unwrap() {
        TypedArray::Int64(values) => assert_eq!(values.as_slice(), &[3, 4, 5]),
        other => panic!("expected int64 weights, got {:?}", other),
    }

    let user_data = db.user_data().unwrap();
    assert_eq!(user_data.field, "Meta");
    assert_eq!(user_data.value["vintage"], 2024);

    assert_eq!(result.stats.series_created, 3);
    assert_eq!(result.stats.arrays_created, 1);
    assert_eq!(result.stats.missing_cells, 2);
}

/// Files matched by a glob pattern are merged in sorted order
#[tokio::test]
async fn test_glob_inputs_merge_in_order() {
    let temp_dir = TempDir::new().unwrap();
    write_file(&temp_dir, "01_base.csv", "Variables->,x,y\n2000Y,1,2\n2001Y,3,4\n");
    write_file(&temp_dir, "02_update.csv", "Variables->,y,z\n2001Y,40,50\n");
    let pattern = temp_dir.path().join("*.csv").display().to_string();

    let paths = expand_inputs(&[pattern]).unwrap();
    assert_eq!(paths.len(), 2);

    let result = CsvLoader::new(LoadOptions::default())
        .with_read_concurrency(2)
        .load_files(&paths)
        .await
        .unwrap();
    let db = &result.database;
    let y2001 = serial(Frequency::Yearly, 2001, 1).unwrap();

    assert_eq!(db.names(), &["x", "y", "z"]);
    let y = db.series("y").unwrap();
    assert_eq!(y.n_periods(), 1);
    assert_eq!(y.real_value_at(y2001, 0), Some(40.0));
    assert_eq!(result.stats.files_loaded, 2);
}

/// A failing file stops the merge but keeps the files merged before it
#[tokio::test]
async fn test_failed_file_keeps_earlier_files() {
    let temp_dir = TempDir::new().unwrap();
    let good = write_file(&temp_dir, "good.csv", "Variables->,a\n2000Q1,1\n");
    let bad = write_file(&temp_dir, "bad.csv", "Variables->,b\nClass,uint8\n2000Q1,2\n");
    let later = write_file(&temp_dir, "later.csv", "Variables->,c\n2000Q1,3\n");

    let mut db = Database::new();
    let err = CsvLoader::new(LoadOptions::default())
        .load_files_into(&[good, bad, later], &mut db)
        .await
        .unwrap_err();

    assert!(matches!(err, Error::UnknownNumericType { .. }));
    assert_eq!(err.file().map(|f| f.ends_with("bad.csv")), Some(true));
    assert_eq!(db.names(), &["a"]);
}

/// Missing files surface as file-not-found errors
#[tokio::test]
async fn test_missing_file_in_batch() {
    let temp_dir = TempDir::new().unwrap();
    let missing = temp_dir.path().join("absent.csv");

    let err = CsvLoader::new(LoadOptions::default())
        .load_files(&[missing])
        .await
        .unwrap_err();

    assert!(matches!(err, Error::FileNotFound { .. }));
}

/// The loaded database serializes to a JSON object keyed by entry name
#[test]
fn test_database_json_shape() {
    let loader = CsvLoader::new(LoadOptions::default());
    let result = loader
        .load_str("Variables->,a,m\nClass,tseries,double\n2000M01,1,7\n", "json.csv")
        .unwrap();

    let json = serde_json::to_value(&result.database).unwrap();
    let object = json.as_object().unwrap();
    assert_eq!(object.len(), 2);
    assert!(object.contains_key("a"));
    assert!(matches!(result.database.get("m"), Some(Entry::Array(_))));
}
