//! Pure search and filter application.
//!
//! The default behavior every entity gets: a case-insensitive substring
//! search over string-typed fields, conjoined with exact-match filters. An
//! entity config may replace the whole predicate (see
//! [`crate::EntityConfig::with_search_predicate`]).

use std::collections::HashMap;

use serde_json::Value;

use crate::record::Record;

/// Current value of one filter control.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    /// Exact-match value from select/text/date filters.
    Exact(String),
    /// Inclusive numeric bounds from a range filter, kept as the raw input
    /// strings; a bound that fails to parse is treated as no bound.
    Range {
        min: Option<String>,
        max: Option<String>,
    },
}

impl FilterValue {
    /// Empty filters are skipped entirely.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Exact(v) => v.trim().is_empty(),
            Self::Range { min, max } => {
                let blank = |b: &Option<String>| b.as_deref().map_or(true, |s| s.trim().is_empty());
                blank(min) && blank(max)
            }
        }
    }
}

fn parse_bound(bound: &Option<String>) -> Option<f64> {
    bound.as_deref().and_then(|s| s.trim().parse::<f64>().ok())
}

fn numeric_value(value: Option<&Value>) -> Option<f64> {
    match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn matches_filter(row: &Record, field: &str, filter: &FilterValue) -> bool {
    match filter {
        FilterValue::Exact(expected) => row.display_value(field) == *expected,
        FilterValue::Range { min, max } => {
            let (min, max) = (parse_bound(min), parse_bound(max));
            if min.is_none() && max.is_none() {
                // Both bounds unparseable or blank: the filter constrains nothing.
                return true;
            }
            match numeric_value(row.get(field)) {
                Some(v) => min.map_or(true, |m| v >= m) && max.map_or(true, |m| v <= m),
                None => false,
            }
        }
    }
}

/// Apply search term and filter values to a row set.
///
/// Pure and idempotent; `apply_filters(rows, "", {})` returns all rows
/// unchanged in order. The search term matches if any string-typed field
/// contains it, case-insensitively; every non-empty filter must match
/// exactly (logical AND).
pub fn apply_filters(
    rows: &[Record],
    search: &str,
    filters: &HashMap<String, FilterValue>,
) -> Vec<Record> {
    let needle = search.trim().to_lowercase();

    rows.iter()
        .filter(|row| {
            if !needle.is_empty() && !row.search_text().iter().any(|t| t.contains(&needle)) {
                return false;
            }
            filters
                .iter()
                .filter(|(_, v)| !v.is_empty())
                .all(|(field, value)| matches_filter(row, field, value))
        })
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn rows() -> Vec<Record> {
        vec![
            Record::new()
                .with_field("id", json!(1))
                .with_field("nombre", json!("Uni A"))
                .with_field("tipo", json!("Universidad"))
                .with_field("alumnos", json!(1200)),
            Record::new()
                .with_field("id", json!(2))
                .with_field("nombre", json!("Clínica B"))
                .with_field("tipo", json!("Clínica"))
                .with_field("alumnos", json!(40)),
        ]
    }

    #[test]
    fn test_identity_with_no_criteria() {
        let rows = rows();
        let out = apply_filters(&rows, "", &HashMap::new());
        assert_eq!(out, rows);
    }

    #[test]
    fn test_idempotent() {
        let rows = rows();
        let filters = HashMap::from([("tipo".to_string(), FilterValue::Exact("Clínica".into()))]);
        let once = apply_filters(&rows, "clí", &filters);
        let twice = apply_filters(&once, "clí", &filters);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_search_case_insensitive_substring() {
        let rows = rows();
        assert_eq!(apply_filters(&rows, "uni", &HashMap::new()).len(), 1);
        assert_eq!(apply_filters(&rows, "ZZZ", &HashMap::new()).len(), 0);
        // Matches any string field, not just the first.
        assert_eq!(apply_filters(&rows, "universidad", &HashMap::new()).len(), 1);
    }

    #[test]
    fn test_filters_are_conjoined() {
        let rows = rows();
        let filters = HashMap::from([("tipo".to_string(), FilterValue::Exact("Universidad".into()))]);
        assert_eq!(apply_filters(&rows, "uni", &filters).len(), 1);
        // Search matches row 1 but the filter does not.
        let filters = HashMap::from([("tipo".to_string(), FilterValue::Exact("Clínica".into()))]);
        assert_eq!(apply_filters(&rows, "uni a", &filters).len(), 0);
    }

    #[test]
    fn test_empty_filter_values_are_skipped() {
        let rows = rows();
        let filters = HashMap::from([("tipo".to_string(), FilterValue::Exact("  ".into()))]);
        assert_eq!(apply_filters(&rows, "", &filters).len(), 2);
    }

    #[test]
    fn test_range_filter() {
        let rows = rows();
        let filters = HashMap::from([(
            "alumnos".to_string(),
            FilterValue::Range {
                min: Some("100".into()),
                max: None,
            },
        )]);
        let out = apply_filters(&rows, "", &filters);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].id(), Some("1".to_string()));
    }

    #[test]
    fn test_unparseable_bounds_are_no_bounds() {
        let rows = rows();
        let filters = HashMap::from([(
            "alumnos".to_string(),
            FilterValue::Range {
                min: Some("abc".into()),
                max: Some("".into()),
            },
        )]);
        // Both bounds collapse to "no bound": nothing is excluded.
        assert_eq!(apply_filters(&rows, "", &filters).len(), 2);
    }
}
