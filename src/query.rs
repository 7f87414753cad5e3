// Query/Filter Engine - free-text search + provider + year, ANDed
// Always recomputed from the full record set; no incremental maintenance.

use crate::dates::{year_of, UNKNOWN};
use crate::record::Record;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Sentinel label presentation uses for "no constraint"
pub const ALL: &str = "All";

// ============================================================================
// FILTER SPEC
// ============================================================================

/// One categorical constraint: either unconstrained or an exact value.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Selection {
    #[default]
    All,
    Only(String),
}

impl Selection {
    /// Read a form value: the `"All"` sentinel disables the constraint,
    /// anything else is an exact match.
    pub fn from_label(label: &str) -> Self {
        if label == ALL {
            Selection::All
        } else {
            Selection::Only(label.to_string())
        }
    }

    pub fn matches(&self, value: &str) -> bool {
        match self {
            Selection::All => true,
            Selection::Only(wanted) => wanted == value,
        }
    }

    pub fn is_all(&self) -> bool {
        matches!(self, Selection::All)
    }
}

impl fmt::Display for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selection::All => f.write_str(ALL),
            Selection::Only(value) => f.write_str(value),
        }
    }
}

/// Current search/provider/year constraint
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FilterSpec {
    pub search_term: String,
    pub provider: Selection,
    pub year: Selection,
}

impl FilterSpec {
    /// Spec that matches every record
    pub fn all() -> Self {
        FilterSpec::default()
    }

    /// Build from raw form values (`"All"` = unconstrained)
    pub fn from_labels(search_term: &str, provider: &str, year: &str) -> Self {
        FilterSpec {
            search_term: search_term.to_string(),
            provider: Selection::from_label(provider),
            year: Selection::from_label(year),
        }
    }

    pub fn with_search(mut self, term: impl Into<String>) -> Self {
        self.search_term = term.into();
        self
    }

    pub fn with_provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = Selection::Only(provider.into());
        self
    }

    pub fn with_year(mut self, year: impl Into<String>) -> Self {
        self.year = Selection::Only(year.into());
        self
    }

    pub fn is_unconstrained(&self) -> bool {
        self.search_term.is_empty() && self.provider.is_all() && self.year.is_all()
    }

    /// Does one record satisfy all three predicates?
    pub fn matches(&self, record: &Record) -> bool {
        self.matches_lowered(record, &self.search_term.to_lowercase())
    }

    /// `matches` with the search term already lower-cased once per pass
    fn matches_lowered(&self, record: &Record, term_lower: &str) -> bool {
        matches_search(record, term_lower)
            && self.provider.matches(record.provider())
            && (self.year.is_all() || self.year.matches(&year_of(record.date())))
    }
}

/// Case-insensitive substring over marker, value and provider (any of them)
fn matches_search(record: &Record, term_lower: &str) -> bool {
    if term_lower.is_empty() {
        return true;
    }

    [record.marker(), record.value(), record.provider()]
        .iter()
        .any(|field| field.to_lowercase().contains(term_lower))
}

// ============================================================================
// FILTERING
// ============================================================================

/// Records matching `spec`, in input order. Inputs are not modified.
pub fn filter(records: &[Record], spec: &FilterSpec) -> Vec<Record> {
    if spec.is_unconstrained() {
        return records.to_vec();
    }

    let term_lower = spec.search_term.to_lowercase();
    records
        .iter()
        .filter(|record| spec.matches_lowered(record, &term_lower))
        .cloned()
        .collect()
}

// ============================================================================
// OPTION LISTS (for provider / year pickers)
// ============================================================================

/// `"All"` followed by each distinct non-empty provider, first-seen order
pub fn provider_options(records: &[Record]) -> Vec<String> {
    let mut options = vec![ALL.to_string()];
    for record in records {
        let provider = record.provider();
        if !provider.is_empty() && !options[1..].iter().any(|p| p == provider) {
            options.push(provider.to_string());
        }
    }
    options
}

/// `"All"` followed by each distinct classified year, newest first.
/// Unclassifiable dates are left out.
pub fn year_options(records: &[Record]) -> Vec<String> {
    let mut years: Vec<String> = records
        .iter()
        .map(|record| year_of(record.date()))
        .filter(|year| year != UNKNOWN)
        .collect();
    years.sort_unstable_by(|a, b| b.cmp(a));
    years.dedup();

    let mut options = vec![ALL.to_string()];
    options.extend(years);
    options
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_record(marker: &str, value: &str, provider: &str, date: &str) -> Record {
        Record::from_fields([
            ("marker", marker),
            ("value", value),
            ("provider", provider),
            ("date", date),
        ])
    }

    fn sample() -> Vec<Record> {
        vec![
            create_test_record("Ferritin", "45", "Dr. Smith", "2024-03-01"),
            create_test_record("Vitamin D", "32", "Dr. Jones", "2024-06-15"),
            create_test_record("TSH", "2.1", "Dr. Smith", "2025-01-10"),
            create_test_record("HbA1c", "5.4", "City Clinic", "2025-02-20"),
        ]
    }

    fn markers(records: &[Record]) -> Vec<&str> {
        records.iter().map(Record::marker).collect()
    }

    #[test]
    fn test_unconstrained_spec_returns_everything() {
        let records = sample();
        let spec = FilterSpec::from_labels("", "All", "All");

        assert!(spec.is_unconstrained());
        assert_eq!(filter(&records, &spec), records);
    }

    #[test]
    fn test_search_is_case_insensitive_over_three_fields() {
        let records = sample();

        let by_marker = filter(&records, &FilterSpec::all().with_search("vitamin"));
        assert_eq!(markers(&by_marker), vec!["Vitamin D"]);

        let by_provider = filter(&records, &FilterSpec::all().with_search("SMITH"));
        assert_eq!(markers(&by_provider), vec!["Ferritin", "TSH"]);

        let by_value = filter(&records, &FilterSpec::all().with_search("5.4"));
        assert_eq!(markers(&by_value), vec!["HbA1c"]);
    }

    #[test]
    fn test_search_ignores_other_fields() {
        let records = sample();
        let result = filter(&records, &FilterSpec::all().with_search("2024-03"));
        assert!(result.is_empty(), "date is not a searchable field");
    }

    #[test]
    fn test_provider_is_exact_match() {
        let records = sample();

        let result = filter(&records, &FilterSpec::all().with_provider("Dr. Smith"));
        assert_eq!(markers(&result), vec!["Ferritin", "TSH"]);

        let partial = filter(&records, &FilterSpec::all().with_provider("Smith"));
        assert!(partial.is_empty());
    }

    #[test]
    fn test_year_filter() {
        let records = sample();
        let result = filter(&records, &FilterSpec::from_labels("", "All", "2024"));
        assert_eq!(markers(&result), vec!["Ferritin", "Vitamin D"]);
    }

    #[test]
    fn test_predicates_are_anded() {
        let records = sample();
        let spec = FilterSpec::all()
            .with_search("t")
            .with_provider("Dr. Smith")
            .with_year("2025");

        assert_eq!(markers(&filter(&records, &spec)), vec!["TSH"]);
    }

    #[test]
    fn test_literal_all_provider_is_not_the_sentinel() {
        let mut records = sample();
        records.push(create_test_record("Iron", "80", "All", "2024-04-04"));

        let spec = FilterSpec::all().with_provider("All");
        assert_eq!(markers(&filter(&records, &spec)), vec!["Iron"]);
    }

    #[test]
    fn test_filter_output_is_subsequence() {
        let records = sample();
        let specs = [
            FilterSpec::all().with_search("d"),
            FilterSpec::all().with_year("2025"),
            FilterSpec::all().with_provider("Dr. Jones"),
            FilterSpec::all().with_search("zzz"),
        ];

        for spec in &specs {
            let result = filter(&records, spec);
            let mut cursor = records.iter();
            for kept in &result {
                assert!(
                    cursor.any(|r| r == kept),
                    "filter output must preserve input order for {:?}",
                    spec
                );
            }
        }
    }

    #[test]
    fn test_spec_matches_agrees_with_filter() {
        let records = sample();
        let spec = FilterSpec::all().with_search("dr.").with_year("2024");
        let expected: Vec<Record> = records.iter().filter(|r| spec.matches(r)).cloned().collect();
        assert_eq!(filter(&records, &spec), expected);
    }

    #[test]
    fn test_provider_options_first_seen_order() {
        let mut records = sample();
        records.push(create_test_record("Iron", "80", "", "2024-04-04"));

        assert_eq!(
            provider_options(&records),
            vec!["All", "Dr. Smith", "Dr. Jones", "City Clinic"]
        );
    }

    #[test]
    fn test_year_options_newest_first_without_unknown() {
        let mut records = sample();
        records.push(create_test_record("Iron", "80", "Lab", "sometime"));

        assert_eq!(year_options(&records), vec!["All", "2025", "2024"]);
    }
}
