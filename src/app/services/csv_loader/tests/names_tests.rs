//! Tests for name normalization, repair and selection

use super::{load, load_with};
use crate::Error;
use crate::app::services::csv_loader::CsvLoader;
use crate::app::services::csv_loader::names::{
    is_valid_name, make_valid, repair_names, select_names,
};
use crate::config::{LoadOptions, NameCase};

fn strings(names: &[&str]) -> Vec<String> {
    names.iter().map(|n| n.to_string()).collect()
}

#[test]
fn test_valid_names() {
    assert!(is_valid_name("gdp"));
    assert!(is_valid_name("GDP_2"));
    assert!(!is_valid_name("2gdp"));
    assert!(!is_valid_name("gdp real"));
    assert!(!is_valid_name("_x"));
    assert!(!is_valid_name(""));
    assert!(!is_valid_name(&"a".repeat(64)));
}

#[test]
fn test_make_valid() {
    assert_eq!(make_valid("1x"), "x1x");
    assert_eq!(make_valid("gdp real"), "gdp_real");
    assert_eq!(make_valid("a.b-c"), "a_b_c");
    assert_eq!(make_valid(&"b".repeat(80)).len(), 63);
}

#[test]
fn test_repair_is_deterministic_and_protects_valid_names() {
    let repaired = repair_names(&strings(&["1x", "ok", "1x"]));

    assert_eq!(repaired.names, vec!["x1x", "ok", "x1x_1"]);
    assert_eq!(repaired.repaired, 2);
}

#[test]
fn test_generated_names_never_take_valid_names() {
    let repaired = repair_names(&strings(&["a b", "a_b", "", "a_b"]));

    assert_eq!(repaired.names, vec!["a_b_1", "a_b", "", "a_b_2"]);
    assert_eq!(repaired.repaired, 2);
}

#[test]
fn test_select_names() {
    let allowed = strings(&["A", "C"]);
    let selected = select_names(&strings(&["A", "B", "", "C"]), Some(&allowed[..]));
    assert_eq!(
        selected,
        vec![Some("A".to_string()), None, None, Some("C".to_string())]
    );

    let all = select_names(&strings(&["A", "B"]), None);
    assert_eq!(all, vec![Some("A".to_string()), Some("B".to_string())]);
}

#[test]
fn test_selection_filter_drops_entries() {
    let text = "Variables->,A,B,C\n2000Q1,1,2,3";
    let result = load_with(LoadOptions::default().with_select(["A", "C"]), text);

    assert_eq!(result.database.names(), &["A", "C"]);
    assert!(!result.database.contains("B"));
    assert_eq!(result.stats.entries_dropped, 1);
    assert_eq!(result.stats.series_created, 2);
}

#[test]
fn test_rewrite_then_case_then_repair() {
    let text = "Variables->,gdp,cpi index\n2000Q1,1,2";
    let options = LoadOptions::default()
        .with_name_func(|name| Some(format!("{}_q", name)))
        .with_case(NameCase::Upper);
    let result = load_with(options, text);

    assert_eq!(result.database.names(), &["GDP_Q", "CPI_INDEX_Q"]);
    assert_eq!(result.stats.names_repaired, 1);
}

#[test]
fn test_selection_applies_to_normalized_names() {
    let text = "Variables->,GDP,CPI\n2000Q1,1,2";
    let options = LoadOptions::default()
        .with_case(NameCase::Lower)
        .with_select(["gdp"]);
    let result = load_with(options, text);

    assert_eq!(result.database.names(), &["gdp"]);
}

#[test]
fn test_failed_rewrite_is_fatal() {
    let text = "Variables->,gdp,skip_me\n2000Q1,1,2";
    let options = LoadOptions::default().with_name_func(|name| {
        if name.starts_with("skip") {
            None
        } else {
            Some(name.to_string())
        }
    });
    let err = CsvLoader::new(options).load_str(text, "names.csv").unwrap_err();

    assert!(matches!(
        err,
        Error::InvalidNameRewrite { ref file, ref name } if file == "names.csv" && name == "skip_me"
    ));
}

#[test]
fn test_duplicate_names_in_file_are_repaired() {
    let result = load("Variables->,x,x\n2000Q1,1,2");

    assert_eq!(result.database.names(), &["x", "x_1"]);
    assert_eq!(result.stats.names_repaired, 1);
}

#[test]
fn test_suffixed_repairs_stay_within_name_length() {
    let long = format!("1{}", "a".repeat(62));
    let repaired = repair_names(&strings(&[&long, &long, &long]));

    assert_eq!(repaired.names[0].len(), 63);
    assert!(repaired.names[1].ends_with("_1"));
    assert!(repaired.names[2].ends_with("_2"));
    for name in &repaired.names {
        assert!(is_valid_name(name), "invalid repaired name {}", name);
    }
    assert_ne!(repaired.names[1], repaired.names[2]);
}
