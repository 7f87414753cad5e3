// Ingestion boundary - text source → parsed, materialized record set
// Every parse-time failure is converted to an IngestError here; nothing past
// this point can fail.

use crate::config::IngestConfig;
use crate::error::{IngestError, RowWarning};
use crate::parser::{parse, HeaderCollision, ParserOptions};
use crate::record::{materialize, Record};
use crate::source::TextSource;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

// ============================================================================
// TYPES
// ============================================================================

/// Whether the user has already agreed to load an input above the soft
/// size threshold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SizeGate {
    #[default]
    Unconfirmed,
    Confirmed,
}

/// Result of one successful load. Becomes the session's record set as a whole.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadedDataset {
    /// File name / URL / "sample" the text came from
    pub source_label: String,

    pub records: Vec<Record>,

    /// Row warnings for display, capped at `max_displayed_warnings`
    pub warnings: Vec<RowWarning>,

    /// Row warnings before the display cap
    pub total_warnings: usize,

    /// Columns that normalized to the same key (right-most value kept)
    pub header_collisions: Vec<HeaderCollision>,

    /// SHA-256 of the parser options and raw text; equal fingerprints mean
    /// identical input read the same way
    pub fingerprint: String,

    /// Size of the raw text in bytes
    pub bytes: u64,
}

impl LoadedDataset {
    pub fn has_warnings(&self) -> bool {
        self.total_warnings > 0 || !self.header_collisions.is_empty()
    }

    /// Row warnings not shown because of the display cap
    pub fn hidden_warnings(&self) -> usize {
        self.total_warnings.saturating_sub(self.warnings.len())
    }
}

// ============================================================================
// LOADING
// ============================================================================

/// Read `source` and turn it into a record set.
///
/// The size gate runs before reading when the source knows its size, and on
/// the read text otherwise.
pub fn load(
    source: &dyn TextSource,
    gate: SizeGate,
    config: &IngestConfig,
) -> Result<LoadedDataset, IngestError> {
    let label = source.label();

    if let Some(bytes) = source.size_hint() {
        check_size(bytes, gate, config)?;
    }

    let text = source.read_text().map_err(|e| {
        let reason = format!("{:#}", e);
        warn!(source = %label, error = %reason, "text source unavailable");
        IngestError::source_unavailable(&label, reason)
    })?;

    if source.size_hint().is_none() {
        check_size(text.len() as u64, gate, config)?;
    }

    load_text(&label, &text, config)
}

/// Parse and materialize text that is already in memory. No size gate.
pub fn load_text(
    label: &str,
    text: &str,
    config: &IngestConfig,
) -> Result<LoadedDataset, IngestError> {
    debug!(source = %label, bytes = text.len(), "parsing");

    let output = parse(text, &config.parser_options()).map_err(|e| {
        warn!(source = %label, error = %e, "parse failed");
        e
    })?;

    if output.rows.is_empty() {
        info!(source = %label, "no data rows");
        return Err(IngestError::EmptyResult);
    }

    for collision in &output.header_collisions {
        warn!(
            source = %label,
            key = %collision.key,
            columns = ?collision.columns,
            "columns share a key; keeping the right-most value"
        );
    }

    let total_warnings = output.warnings.len();
    if total_warnings > 0 {
        warn!(source = %label, count = total_warnings, "rows with problems were loaded best-effort");
    }
    let mut warnings = output.warnings;
    warnings.truncate(config.max_displayed_warnings);

    let records = materialize(output.rows);
    info!(source = %label, records = records.len(), warnings = total_warnings, "loaded");

    Ok(LoadedDataset {
        source_label: label.to_string(),
        records,
        warnings,
        total_warnings,
        header_collisions: output.header_collisions,
        fingerprint: fingerprint(text, &config.parser_options()),
        bytes: text.len() as u64,
    })
}

/// Soft size gate: above the threshold, only a confirmed load proceeds
pub fn check_size(bytes: u64, gate: SizeGate, config: &IngestConfig) -> Result<(), IngestError> {
    if bytes > config.size_warning_bytes && gate == SizeGate::Unconfirmed {
        return Err(IngestError::SizeConfirmationRequired {
            bytes,
            threshold: config.size_warning_bytes,
        });
    }
    Ok(())
}

/// Hex SHA-256 of the parser options followed by the raw text
pub fn fingerprint(text: &str, options: &ParserOptions) -> String {
    let mut hasher = Sha256::new();
    hasher.update([u8::from(options.has_headers)]);
    hasher.update(text.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Run [`load`] on tokio's blocking pool so a large parse does not stall
/// the caller. Must be called from inside a tokio runtime.
#[cfg(feature = "background")]
pub fn load_in_background<S>(
    source: S,
    gate: SizeGate,
    config: IngestConfig,
) -> tokio::task::JoinHandle<Result<LoadedDataset, IngestError>>
where
    S: TextSource + 'static,
{
    tokio::task::spawn_blocking(move || load(&source, gate, &config))
}
