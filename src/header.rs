// Header Normalizer - map arbitrary column headers onto the canonical vocabulary
// "Test", "Test Name", "test_name" → marker. Unknown headers keep a cleaned-up name.

use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// CANONICAL FIELDS
// ============================================================================

/// The fixed set of column roles the rest of the crate understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CanonicalField {
    Id,
    Marker,
    Provider,
    Date,
    Value,
    ReferenceRange,
    Lab,
    SourceFile,
}

impl CanonicalField {
    /// All canonical fields, in alias-table order
    pub const ALL: [CanonicalField; 8] = [
        CanonicalField::Id,
        CanonicalField::Marker,
        CanonicalField::Provider,
        CanonicalField::Date,
        CanonicalField::Value,
        CanonicalField::ReferenceRange,
        CanonicalField::Lab,
        CanonicalField::SourceFile,
    ];

    /// Record key for this field
    pub fn as_str(&self) -> &'static str {
        match self {
            CanonicalField::Id => "id",
            CanonicalField::Marker => "marker",
            CanonicalField::Provider => "provider",
            CanonicalField::Date => "date",
            CanonicalField::Value => "value",
            CanonicalField::ReferenceRange => "reference_range",
            CanonicalField::Lab => "lab",
            CanonicalField::SourceFile => "source_file",
        }
    }

    /// Accepted header spellings, already in normalized-token form
    pub fn aliases(&self) -> &'static [&'static str] {
        ALIAS_TABLE
            .iter()
            .find(|(field, _)| field == self)
            .map(|(_, aliases)| *aliases)
            .unwrap_or(&[])
    }
}

impl fmt::Display for CanonicalField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Alias table. Order matters: the first field whose alias set contains a
/// token wins.
const ALIAS_TABLE: &[(CanonicalField, &[&str])] = &[
    (CanonicalField::Id, &["id", "uid", "recordid"]),
    (CanonicalField::Marker, &["marker", "test", "name", "testname"]),
    (CanonicalField::Provider, &["provider", "doctor", "physician"]),
    (
        CanonicalField::Date,
        &["date", "sampledate", "specimendate", "testdate"],
    ),
    (CanonicalField::Value, &["value", "result", "testvalue"]),
    (
        CanonicalField::ReferenceRange,
        &["reference", "referencerange", "refrange", "range"],
    ),
    (CanonicalField::Lab, &["lab", "laboratory"]),
    (CanonicalField::SourceFile, &["sourcefile", "source", "file"]),
];

// ============================================================================
// FIELD KEY
// ============================================================================

/// Result of normalizing one header: a canonical role, or a fallback name
/// for columns the alias table does not know.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldKey {
    Canonical(CanonicalField),
    Fallback(String),
}

impl FieldKey {
    pub fn as_str(&self) -> &str {
        match self {
            FieldKey::Canonical(field) => field.as_str(),
            FieldKey::Fallback(name) => name,
        }
    }

    pub fn is_canonical(&self) -> bool {
        matches!(self, FieldKey::Canonical(_))
    }
}

impl fmt::Display for FieldKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// NORMALIZATION
// ============================================================================

/// Lower-case and drop everything that is not `a-z` or `0-9`.
///
/// `"Sample Date"` → `"sampledate"`, `"Ref. Range"` → `"refrange"`
pub fn normalize_token(header: &str) -> String {
    header
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
        .collect()
}

/// Name kept for headers with no alias match: trimmed, lower-cased,
/// whitespace runs collapsed to `_`.
pub fn fallback_name(header: &str) -> String {
    header
        .trim()
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
}

/// Map a raw header onto its canonical key. Pure and total.
///
/// # Examples
/// ```
/// use lab_insights::header::{normalize, CanonicalField, FieldKey};
///
/// assert_eq!(normalize("Test Name"), FieldKey::Canonical(CanonicalField::Marker));
/// assert_eq!(normalize(" Units Of Measure "), FieldKey::Fallback("units_of_measure".into()));
/// ```
pub fn normalize(header: &str) -> FieldKey {
    let token = normalize_token(header);

    ALIAS_TABLE
        .iter()
        .find(|(_, aliases)| aliases.contains(&token.as_str()))
        .map(|(field, _)| FieldKey::Canonical(*field))
        .unwrap_or_else(|| FieldKey::Fallback(fallback_name(header)))
}
