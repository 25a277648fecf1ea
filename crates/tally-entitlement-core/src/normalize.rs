//! Normalization of loosely-shaped stored values
//!
//! Several configured/stored values arrived in more than one shape over the
//! app's history (JSON arrays, comma-separated strings, bare strings). They
//! are parsed once at the read boundary into a single canonical shape here
//! instead of type-sniffing at call sites.

use std::collections::BTreeSet;

use serde::Deserialize;

/// A set-like value that may be stored as a list or a delimited string
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum StoredSet {
    Many(Vec<String>),
    One(String),
}

/// Parse a loosely-shaped email set into its canonical form: a lowercased,
/// trimmed, deduplicated set.
///
/// Accepts a JSON array of strings, a single string (optionally comma or
/// whitespace separated), or anything else (empty set).
pub fn email_set(value: &serde_json::Value) -> BTreeSet<String> {
    match serde_json::from_value::<StoredSet>(value.clone()) {
        Ok(StoredSet::Many(items)) => items.iter().flat_map(|s| split_emails(s)).collect(),
        Ok(StoredSet::One(s)) => split_emails(&s).collect(),
        Err(_) => BTreeSet::new(),
    }
}

/// Parse a delimited email string (comma or whitespace separated)
pub fn email_set_from_str(s: &str) -> BTreeSet<String> {
    split_emails(s).collect()
}

fn split_emails(s: &str) -> impl Iterator<Item = String> + '_ {
    s.split(|c: char| c == ',' || c.is_whitespace())
        .map(|e| e.trim().to_lowercase())
        .filter(|e| !e.is_empty())
}
