// Error taxonomy for the ingestion boundary
// Query and aggregation are total functions and never produce these.

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ============================================================================
// INGEST ERRORS
// ============================================================================

/// Everything that can stop a load from producing a record set.
///
/// None of these replace the session's current records: a failed load leaves
/// the previous set in place.
#[derive(Error, Debug)]
pub enum IngestError {
    /// No data could be extracted at all (empty input, no header)
    #[error("Could not read any data: {reason}")]
    Fatal { reason: String },

    /// Structurally valid input with zero data rows
    #[error("No data found")]
    EmptyResult,

    /// The text source itself failed (file read, HTTP fetch)
    #[error("Could not read {source_name}: {reason}")]
    SourceUnavailable { source_name: String, reason: String },

    /// Input is above the soft size threshold and the caller has not confirmed
    #[error("Input is {bytes} bytes, above the {threshold} byte warning threshold; confirm to continue")]
    SizeConfirmationRequired { bytes: u64, threshold: u64 },
}

impl IngestError {
    pub fn fatal(reason: impl Into<String>) -> Self {
        Self::Fatal {
            reason: reason.into(),
        }
    }

    pub fn source_unavailable(source_name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::SourceUnavailable {
            source_name: source_name.into(),
            reason: reason.into(),
        }
    }

    /// True for errors the user can resolve by confirming the load
    pub fn needs_confirmation(&self) -> bool {
        matches!(self, Self::SizeConfirmationRequired { .. })
    }
}

// ============================================================================
// ROW WARNINGS
// ============================================================================

/// A recoverable problem with one row. The row is still loaded, best-effort.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowWarning {
    /// 1-based data row number (header line not counted)
    pub row: usize,
    pub message: String,
}

impl RowWarning {
    pub fn new(row: usize, message: impl Into<String>) -> Self {
        RowWarning {
            row,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for RowWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Row {}: {}", self.row, self.message)
    }
}

// ============================================================================
// CONFIG ERRORS
// ============================================================================

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid config value for {field}: {message}")]
    InvalidValue { field: String, message: String },
}

impl ConfigError {
    pub fn invalid_value(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_unavailable_message_keeps_reason() {
        let err = IngestError::source_unavailable("labs.csv", "permission denied");
        assert_eq!(err.to_string(), "Could not read labs.csv: permission denied");
    }

    #[test]
    fn test_empty_result_is_distinct_from_fatal() {
        let empty = IngestError::EmptyResult;
        let fatal = IngestError::fatal("empty input");

        assert_eq!(empty.to_string(), "No data found");
        assert!(fatal.to_string().contains("empty input"));
        assert!(!matches!(fatal, IngestError::EmptyResult));
    }

    #[test]
    fn test_size_gate_needs_confirmation() {
        let err = IngestError::SizeConfirmationRequired {
            bytes: 30,
            threshold: 20,
        };
        assert!(err.needs_confirmation());
        assert!(!IngestError::EmptyResult.needs_confirmation());
    }

    #[test]
    fn test_row_warning_display() {
        let warning = RowWarning::new(3, "expected 4 fields, found 2");
        assert_eq!(warning.to_string(), "Row 3: expected 4 fields, found 2");
    }
}
