//! Entry name normalization
//!
//! Names pass through the rewrite functions, then case conversion, then
//! validity repair. Repair replaces every non-empty name that is not a legal
//! identifier (or repeats an earlier name) with a generated unique one.
//! Names that are already valid are never handed out as replacements.

use crate::config::{LoadOptions, NameFunc};
use crate::constants::{MAX_NAME_LENGTH, REPAIRED_NAME_PREFIX};
use crate::{Error, Result};
use std::collections::HashSet;
use tracing::debug;

/// Normalized names and how many had to be repaired
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedNames {
    pub names: Vec<String>,
    pub repaired: usize,
}

/// Whether `name` is a legal entry name
pub fn is_valid_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() => {}
        _ => return false,
    }
    name.len() <= MAX_NAME_LENGTH && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Closest legal identifier to `name`
pub fn make_valid(name: &str) -> String {
    let mut valid: String = name
        .trim()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect();
    if !valid.starts_with(|c: char| c.is_ascii_alphabetic()) {
        valid.insert_str(0, REPAIRED_NAME_PREFIX);
    }
    valid.truncate(MAX_NAME_LENGTH);
    valid
}

/// Apply rewrite functions in order to every non-empty name
pub fn apply_name_funcs(names: &[String], funcs: &[NameFunc], file: &str) -> Result<Vec<String>> {
    names
        .iter()
        .map(|name| {
            if name.is_empty() {
                return Ok(String::new());
            }
            funcs.iter().try_fold(name.clone(), |current, func| {
                func.apply(&current)
                    .filter(|rewritten| !rewritten.is_empty())
                    .ok_or_else(|| Error::invalid_name_rewrite(file, name.as_str()))
            })
        })
        .collect()
}

/// Make every non-empty name a unique legal identifier
pub fn repair_names(names: &[String]) -> NormalizedNames {
    let protected: HashSet<&str> = names
        .iter()
        .map(String::as_str)
        .filter(|n| is_valid_name(n))
        .collect();

    let mut seen: HashSet<String> = HashSet::new();
    let mut repaired = 0;
    let mut result = Vec::with_capacity(names.len());

    for name in names {
        if name.is_empty() {
            result.push(String::new());
            continue;
        }
        if is_valid_name(name) && !seen.contains(name) {
            seen.insert(name.clone());
            result.push(name.clone());
            continue;
        }

        let base = make_valid(name);
        let mut candidate = base.clone();
        let mut suffix = 0;
        while protected.contains(candidate.as_str()) || seen.contains(&candidate) {
            suffix += 1;
            let tag = format!("_{}", suffix);
            // `base` is ASCII, so any byte offset is a char boundary
            let keep = base.len().min(MAX_NAME_LENGTH.saturating_sub(tag.len()));
            candidate = format!("{}{}", &base[..keep], tag);
        }
        debug!("Renamed '{}' to '{}'", name, candidate);
        seen.insert(candidate.clone());
        result.push(candidate);
        repaired += 1;
    }

    NormalizedNames {
        names: result,
        repaired,
    }
}

/// Rewrite functions, case conversion and repair
pub fn normalize_names(names: &[String], options: &LoadOptions, file: &str) -> Result<NormalizedNames> {
    let trimmed: Vec<String> = names.iter().map(|n| n.trim().to_string()).collect();
    let rewritten = apply_name_funcs(&trimmed, &options.name_func, file)?;
    let cased: Vec<String> = rewritten.iter().map(|n| options.case.apply(n)).collect();
    Ok(repair_names(&cased))
}

/// Final entry name per name cell; `None` for empty or unselected names
pub fn select_names(names: &[String], select: Option<&[String]>) -> Vec<Option<String>> {
    names
        .iter()
        .map(|name| {
            if name.is_empty() {
                return None;
            }
            match select {
                Some(allowed) if !allowed.iter().any(|a| a == name) => None,
                _ => Some(name.clone()),
            }
        })
        .collect()
}
