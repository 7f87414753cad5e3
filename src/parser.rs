// Delimited-Text Parser - raw CSV text → ordered rows keyed by canonical headers
// Quoting follows RFC 4180: commas and line breaks inside quotes are literal,
// "" inside quotes is one ". Malformed rows are kept and reported, never fatal.

use crate::error::{IngestError, RowWarning};
use crate::header::{normalize, FieldKey};
use csv::{ReaderBuilder, StringRecord};
use serde::{Deserialize, Serialize};
use tracing::debug;

// ============================================================================
// CORE TYPES
// ============================================================================

/// Parser knobs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParserOptions {
    /// First non-blank line supplies column names. When false, every line is
    /// data and columns are named by position ("0", "1", ...).
    pub has_headers: bool,
}

impl Default for ParserOptions {
    fn default() -> Self {
        ParserOptions { has_headers: true }
    }
}

/// One source row: key → raw cell text, in column order.
///
/// Keys are already normalized. Inserting an existing key overwrites the
/// value in place (last column wins).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawRow {
    fields: Vec<(String, String)>,
}

impl RawRow {
    pub fn new() -> Self {
        RawRow { fields: Vec::new() }
    }

    /// Insert or overwrite a field
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.fields.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Two or more source columns that normalized to the same key.
/// Within each row the right-most column's value is the one kept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderCollision {
    pub key: String,
    /// Original header text of every colliding column, left to right
    pub columns: Vec<String>,
}

/// Output of a successful parse
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParseOutput {
    /// Normalized key per header column
    pub headers: Vec<FieldKey>,
    pub rows: Vec<RawRow>,
    pub warnings: Vec<RowWarning>,
    pub header_collisions: Vec<HeaderCollision>,
}

// ============================================================================
// PARSING
// ============================================================================

/// Parse delimited text into rows.
///
/// # Returns
/// * `Ok(ParseOutput)` - rows plus any per-row warnings (possibly zero rows)
/// * `Err(IngestError::Fatal)` - empty input, or no usable header line
pub fn parse(text: &str, options: &ParserOptions) -> Result<ParseOutput, IngestError> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);

    if text.trim().is_empty() {
        return Err(IngestError::fatal("input is empty"));
    }

    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());

    let mut output = ParseOutput::default();
    let mut header_seen = false;
    let mut data_row = 0usize;

    for result in reader.records() {
        // Decoded text and a flexible reader: no error here is row-level
        let record = result.map_err(|e| {
            IngestError::fatal(format!("reader failed after data row {}: {}", data_row, e))
        })?;

        if is_blank(&record) {
            continue;
        }

        if !header_seen {
            let names: Vec<String> = if options.has_headers {
                record.iter().map(str::to_string).collect()
            } else {
                (0..record.len()).map(|i| i.to_string()).collect()
            };
            if names.iter().all(|h| h.trim().is_empty()) {
                return Err(IngestError::fatal("header line has no column names"));
            }

            output.headers = header_keys(&names);
            output.header_collisions = find_collisions(&names, &output.headers);
            header_seen = true;

            // Headerless input: this record is data too
            if options.has_headers {
                continue;
            }
        }

        data_row += 1;
        let width = output.headers.len();
        if record.len() != width {
            let message = if record.len() < width {
                format!("Too few fields: expected {}, found {}", width, record.len())
            } else {
                format!("Too many fields: expected {}, found {}", width, record.len())
            };
            debug!(row = data_row, %message, "malformed row");
            output.warnings.push(RowWarning::new(data_row, message));
        }

        output.rows.push(align_row(&record, &output.headers));
    }

    if !header_seen {
        return Err(IngestError::fatal("no header line found"));
    }

    Ok(output)
}

/// A physical line with nothing on it (csv yields it as one empty field)
fn is_blank(record: &StringRecord) -> bool {
    record.len() <= 1 && record.get(0).map_or(true, |f| f.trim().is_empty())
}

/// Normalized key for each header; blank header cells fall back to position
fn header_keys(names: &[String]) -> Vec<FieldKey> {
    names
        .iter()
        .enumerate()
        .map(|(index, name)| {
            if name.trim().is_empty() {
                FieldKey::Fallback(index.to_string())
            } else {
                normalize(name)
            }
        })
        .collect()
}

fn find_collisions(names: &[String], keys: &[FieldKey]) -> Vec<HeaderCollision> {
    let mut collisions: Vec<HeaderCollision> = Vec::new();

    for (index, key) in keys.iter().enumerate() {
        let first = keys.iter().position(|k| k == key).unwrap_or(index);
        if first == index {
            continue;
        }

        match collisions.iter_mut().find(|c| c.key == key.as_str()) {
            Some(collision) => collision.columns.push(names[index].clone()),
            None => collisions.push(HeaderCollision {
                key: key.as_str().to_string(),
                columns: vec![names[first].clone(), names[index].clone()],
            }),
        }
    }

    collisions
}

/// Pad short rows with "", keep extra cells under their position
fn align_row(record: &StringRecord, headers: &[FieldKey]) -> RawRow {
    let mut row = RawRow::new();

    for (index, key) in headers.iter().enumerate() {
        row.insert(key.as_str(), record.get(index).unwrap_or(""));
    }

    for (index, value) in record.iter().enumerate().skip(headers.len()) {
        row.insert(index.to_string(), value);
    }

    row
}
