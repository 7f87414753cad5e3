// Record Materializer - normalized rows → identity-bearing records
// A record keeps its source id when it has one; otherwise the id is derived
// from (date, provider, marker, value) so re-loading the same file yields
// the same ids.

use crate::header::CanonicalField;
use crate::parser::RawRow;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ============================================================================
// RECORD
// ============================================================================

/// One lab-test observation.
///
/// Immutable once built: the set is replaced wholesale on the next load,
/// never edited field by field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Stable identity - never empty
    id: String,

    /// Every other column, canonical or fallback key → raw text
    #[serde(flatten)]
    fields: BTreeMap<String, String>,
}

impl Record {
    /// Build a record from one parsed row, assigning a synthetic id when the
    /// row has no non-empty `id` column.
    pub fn from_raw(row: RawRow) -> Self {
        Self::from_fields(row.iter().map(|(k, v)| (k.to_string(), v.to_string())))
    }

    /// Build a record from arbitrary key/value pairs (keys must already be
    /// normalized). Later duplicates overwrite earlier ones.
    pub fn from_fields<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut fields: BTreeMap<String, String> = pairs
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();

        let id = match fields.remove(CanonicalField::Id.as_str()) {
            Some(id) if !id.is_empty() => id,
            _ => synthetic_id(
                field_or_empty(&fields, CanonicalField::Date),
                field_or_empty(&fields, CanonicalField::Provider),
                field_or_empty(&fields, CanonicalField::Marker),
                field_or_empty(&fields, CanonicalField::Value),
            ),
        };

        Record { id, fields }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Look up any field by key, `id` included
    pub fn get(&self, key: &str) -> Option<&str> {
        if key == CanonicalField::Id.as_str() {
            return Some(&self.id);
        }
        self.fields.get(key).map(String::as_str)
    }

    /// Canonical field value, `""` when absent
    pub fn field(&self, field: CanonicalField) -> &str {
        self.get(field.as_str()).unwrap_or("")
    }

    pub fn marker(&self) -> &str {
        self.field(CanonicalField::Marker)
    }

    pub fn provider(&self) -> &str {
        self.field(CanonicalField::Provider)
    }

    pub fn date(&self) -> &str {
        self.field(CanonicalField::Date)
    }

    pub fn value(&self) -> &str {
        self.field(CanonicalField::Value)
    }

    /// All non-id fields in key order
    pub fn fields(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

fn field_or_empty(fields: &BTreeMap<String, String>, field: CanonicalField) -> &str {
    fields.get(field.as_str()).map(String::as_str).unwrap_or("")
}

// ============================================================================
// MATERIALIZATION
// ============================================================================

/// Turn parsed rows into records, in input order.
pub fn materialize(rows: Vec<RawRow>) -> Vec<Record> {
    rows.into_iter().map(Record::from_raw).collect()
}

/// Deterministic id for a record without one.
///
/// Polynomial rolling hash (`h = h * 31 + unit`) over the UTF-16 code units
/// of `date|provider|marker|value`, in wrapping 32-bit signed arithmetic,
/// rendered as the decimal absolute value. The wraparound is part of the
/// id format; ids must match those produced by earlier exports.
///
/// Distinct tuples that hash alike share an id; collisions are not resolved.
pub fn synthetic_id(date: &str, provider: &str, marker: &str, value: &str) -> String {
    let key = format!("{}|{}|{}|{}", date, provider, marker, value);
    rolling_hash(&key).unsigned_abs().to_string()
}

/// 32-bit `h * 31 + c` hash over UTF-16 code units
pub fn rolling_hash(text: &str) -> i32 {
    text.encode_utf16().fold(0i32, |hash, unit| {
        hash.wrapping_mul(31).wrapping_add(i32::from(unit))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{parse, ParserOptions};

    fn row(pairs: &[(&str, &str)]) -> RawRow {
        let mut row = RawRow::new();
        for (k, v) in pairs {
            row.insert(*k, *v);
        }
        row
    }

    #[test]
    fn test_rolling_hash_matches_reference_values() {
        assert_eq!(rolling_hash(""), 0);
        assert_eq!(rolling_hash("abc"), 96354);
        assert_eq!(rolling_hash("|||"), 123132);
    }

    #[test]
    fn test_synthetic_id_wraps_like_32_bit_ints() {
        assert_eq!(
            synthetic_id("2024-03-01", "Dr. Smith", "Ferritin", "45"),
            "1064141367"
        );
        assert_eq!(
            synthetic_id("2025-01-10", "Dr. Jones", "Vitamin B12, quoted \"test\"", "410"),
            "1022044042"
        );
    }

    #[test]
    fn test_synthetic_id_uses_utf16_code_units() {
        // é is one unit, 😀 is a surrogate pair
        assert_eq!(synthetic_id("é", "😀", "x", "1"), "1659919879");
    }

    #[test]
    fn test_min_int_hash_does_not_overflow() {
        assert_eq!(i32::MIN.unsigned_abs().to_string(), "2147483648");
    }

    #[test]
    fn test_supplied_id_is_preserved_verbatim() {
        let record = Record::from_raw(row(&[("id", " LAB-0001 "), ("marker", "TSH")]));
        assert_eq!(record.id(), " LAB-0001 ");
        assert_eq!(record.get("id"), Some(" LAB-0001 "));
    }

    #[test]
    fn test_empty_id_gets_synthetic_id() {
        let record = Record::from_raw(row(&[
            ("id", ""),
            ("date", "2024-03-01"),
            ("provider", "Dr. Smith"),
            ("marker", "Ferritin"),
            ("value", "45"),
        ]));
        assert_eq!(record.id(), "1064141367");
    }

    #[test]
    fn test_missing_components_hash_as_empty() {
        let record = Record::from_raw(row(&[("units", "mg/dL")]));
        assert_eq!(record.id(), "123132", "all four parts empty → hash of '|||'");
        assert_eq!(record.marker(), "");
        assert_eq!(record.get("units"), Some("mg/dL"));
    }

    #[test]
    fn test_reparse_yields_identical_ids() {
        let text = "Date,Doctor,Test,Result\n\
                    2024-03-01,Dr. Smith,Ferritin,45\n\
                    2024-09-12,Dr. Smith,Ferritin,51\n\
                    2025-01-10,Dr. Jones,TSH,2.1\n";

        let first = materialize(parse(text, &ParserOptions::default()).unwrap().rows);
        let second = materialize(parse(text, &ParserOptions::default()).unwrap().rows);

        let first_ids: Vec<&str> = first.iter().map(Record::id).collect();
        let second_ids: Vec<&str> = second.iter().map(Record::id).collect();
        assert_eq!(first_ids, second_ids);

        let unique: std::collections::HashSet<&str> = first_ids.iter().copied().collect();
        assert_eq!(unique.len(), 3, "distinct tuples should get distinct ids");
    }

    #[test]
    fn test_materialize_preserves_order_and_fields() {
        let records = materialize(vec![
            row(&[("marker", "A"), ("lab", "Quest")]),
            row(&[("marker", "B"), ("reference_range", "1-2")]),
        ]);

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].marker(), "A");
        assert_eq!(records[0].field(CanonicalField::Lab), "Quest");
        assert_eq!(records[1].field(CanonicalField::ReferenceRange), "1-2");
    }

    #[test]
    fn test_record_serializes_flat() {
        let record = Record::from_fields([("id", "7"), ("marker", "TSH")]);
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["id"], "7");
        assert_eq!(json["marker"], "TSH");
    }
}
