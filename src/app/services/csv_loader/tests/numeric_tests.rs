//! Tests for the two-pass numeric parse and missing-value handling

use super::{assert_same, load, load_with};
use crate::Error;
use crate::app::services::csv_loader::CsvLoader;
use crate::app::services::csv_loader::numeric_table::NumericTable;
use crate::app::services::csv_loader::tokenizer::Tokenizer;
use crate::app::services::dates::{Frequency, serial};
use crate::config::LoadOptions;
use num_complex::Complex64;

fn cells(rows: &[&[&str]]) -> Vec<Vec<String>> {
    rows.iter()
        .map(|row| row.iter().map(|c| c.to_string()).collect())
        .collect()
}

fn read(options: &LoadOptions, rows: &[Vec<String>], cols: usize) -> NumericTable {
    let tokenizer = Tokenizer::new(options).unwrap();
    let slices: Vec<&[String]> = rows.iter().map(Vec::as_slice).collect();
    NumericTable::read(&slices, cols, &tokenizer, "test.csv").unwrap()
}

#[test]
fn test_missing_mask_separates_sentinels_from_negative_infinity() {
    let rows = cells(&[&["-Inf", "1"], &["NaN", "2"], &["", "3"], &["***", "x"]]);
    let table = read(&LoadOptions::default(), &rows, 2);

    assert!(!table.is_missing(0, 0));
    assert_eq!(table.value(0, 0).re, f64::NEG_INFINITY);
    assert!(table.is_missing(1, 0));
    assert!(table.is_missing(2, 0));
    assert!(table.is_missing(3, 0));
    assert!(table.is_missing(3, 1));
    assert!(table.value(1, 0).re.is_nan());
    assert_eq!(table.value(2, 1).re, 3.0);
    assert_eq!(table.missing_count(), 4);
}

#[test]
fn test_short_rows_and_out_of_range_cells() {
    let rows = cells(&[&["1", "2", "3"], &["4"]]);
    let table = read(&LoadOptions::default(), &rows, 2);

    assert_eq!(table.rows(), 2);
    assert_eq!(table.cols(), 2);
    assert!(table.is_missing(1, 1));
    assert!(table.value(5, 0).re.is_nan());
    assert!(table.value(0, 2).re.is_nan());
}

#[test]
fn test_negative_infinity_and_missing_token_in_one_series() {
    let text = "\
Variables->,x
2000Q1,-Inf
2000Q2,NA
2000Q3,5";
    let result = load_with(LoadOptions::default().with_nan(["NA"]), text);
    let x = result.database.series("x").unwrap();
    let q1 = serial(Frequency::Quarterly, 2000, 1).unwrap();

    assert_same(x.real_value_at(q1, 0), f64::NEG_INFINITY);
    assert_same(x.real_value_at(q1 + 1, 0), f64::NAN);
    assert_same(x.real_value_at(q1 + 2, 0), 5.0);
    assert_eq!(result.stats.missing_cells, 1);
}

#[test]
fn test_missing_tokens_with_periods_are_literal() {
    let text = "Variables->,x\n2000Q1,n.a.\n2000Q2,n1a2\n2000Q3,1";
    let result = load_with(LoadOptions::default().with_nan(["N.A."]), text);
    let x = result.database.series("x").unwrap();
    let q1 = serial(Frequency::Quarterly, 2000, 1).unwrap();

    assert_same(x.real_value_at(q1, 0), f64::NAN);
    assert_same(x.real_value_at(q1 + 1, 0), f64::NAN);
    assert_same(x.real_value_at(q1 + 2, 0), 1.0);
    assert_eq!(result.stats.missing_cells, 2);
}

#[test]
fn test_complex_group_keeps_zero_imaginary_fill() {
    let text = "Variables->,z,r\n2000Q1,1+2i,1\n2000Q2,NaN,2\n2000Q4,3,3";
    let result = load(text);
    let z = result.database.series("z").unwrap();
    let q1 = serial(Frequency::Quarterly, 2000, 1).unwrap();

    assert!(z.is_complex());
    assert_eq!(z.value_at(q1, 0), Some(Complex64::new(1.0, 2.0)));
    let missing = z.value_at(q1 + 1, 0).unwrap();
    assert!(missing.re.is_nan());
    assert_eq!(missing.im, 0.0);
    let gap = z.value_at(q1 + 2, 0).unwrap();
    assert!(gap.re.is_nan());
    assert_eq!(gap.im, 0.0);

    assert!(!result.database.series("r").unwrap().is_complex());
}

#[test]
fn test_non_numeric_data_region_is_invalid_format() {
    let text = "Variables->,a,b\n2000Q1,abc,def\n2000Q2,ghi,";
    let err = CsvLoader::new(LoadOptions::default())
        .load_str(text, "words.csv")
        .unwrap_err();

    assert!(matches!(err, Error::InvalidFormat { ref file, .. } if file == "words.csv"));
}

#[test]
fn test_all_missing_data_is_not_a_format_error() {
    let text = "Variables->,a\n2000Q1,NaN\n2000Q2,";
    let result = load(text);
    let a = result.database.series("a").unwrap();

    assert_eq!(a.n_periods(), 2);
    assert_eq!(result.stats.missing_cells, 2);
}
