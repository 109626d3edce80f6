//! Relation references in view SQL.
//!
//! Lexical approximation: every identifier directly following `FROM` or
//! `JOIN` is collected. CTE names and subqueries are not understood, and
//! keywords inside string literals still match. Callers filter the result
//! against the names actually present in the catalog.

use regex::Regex;
use std::collections::BTreeSet;
use std::sync::OnceLock;

fn reference_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r#"(?i)\b(?:FROM|JOIN)\s+(?:"([^"]+)"|`([^`]+)`|([A-Za-z0-9_]+))"#)
            .expect("reference pattern is a valid regex")
    })
}

/// Names referenced after `FROM`/`JOIN` in a SQL text, quotes stripped.
///
/// # Examples
///
/// ```
/// # use quarry::catalog::references::extract_referenced_names;
/// let names = extract_referenced_names("SELECT * FROM a JOIN b ON a.x=b.x");
/// assert_eq!(names.into_iter().collect::<Vec<_>>(), vec!["a", "b"]);
/// ```
pub fn extract_referenced_names(sql: &str) -> BTreeSet<String> {
    reference_pattern()
        .captures_iter(sql)
        .filter_map(|caps| {
            caps.get(1)
                .or_else(|| caps.get(2))
                .or_else(|| caps.get(3))
                .map(|m| m.as_str().to_string())
        })
        .collect()
}
