// Text sources - where the raw CSV text comes from
// The ingestion pipeline only sees `TextSource`; a local file, the bundled
// sample and an HTTP fetch are interchangeable.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Sample dataset compiled into the crate
pub const BUNDLED_SAMPLE_CSV: &str = include_str!("../data/sample_lab_results.csv");

// ============================================================================
// CORE TRAIT
// ============================================================================

/// Anything that can hand over the full raw text of a dataset.
pub trait TextSource: Send {
    /// Read the whole text.
    ///
    /// # Returns
    /// * `Ok(String)` - the raw text
    /// * `Err(anyhow::Error)` - the source could not be read; the message
    ///   is shown to the user as-is
    fn read_text(&self) -> Result<String>;

    /// Short human-readable name (file name, URL, "sample")
    fn label(&self) -> String;

    /// Size in bytes if it is known without reading everything
    fn size_hint(&self) -> Option<u64> {
        None
    }
}

// ============================================================================
// LOCAL FILE
// ============================================================================

/// A file on disk, e.g. an uploaded export
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FileSource { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TextSource for FileSource {
    fn read_text(&self) -> Result<String> {
        let bytes = std::fs::read(&self.path)
            .with_context(|| format!("Failed to open file: {}", self.path.display()))?;
        // Exports from spreadsheet tools are not always clean UTF-8
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    fn label(&self) -> String {
        self.path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("unknown.csv")
            .to_string()
    }

    fn size_hint(&self) -> Option<u64> {
        std::fs::metadata(&self.path).ok().map(|m| m.len())
    }
}

// ============================================================================
// BUNDLED SAMPLE
// ============================================================================

/// The sample lab results shipped with the crate
#[derive(Debug, Clone, Copy, Default)]
pub struct BundledSample;

impl TextSource for BundledSample {
    fn read_text(&self) -> Result<String> {
        Ok(BUNDLED_SAMPLE_CSV.to_string())
    }

    fn label(&self) -> String {
        "sample_lab_results.csv".to_string()
    }

    fn size_hint(&self) -> Option<u64> {
        Some(BUNDLED_SAMPLE_CSV.len() as u64)
    }
}

// ============================================================================
// IN-MEMORY TEXT
// ============================================================================

/// Text that is already in memory (an upload buffer, a test fixture)
#[derive(Debug, Clone)]
pub struct InlineSource {
    label: String,
    text: String,
}

impl InlineSource {
    pub fn new(label: impl Into<String>, text: impl Into<String>) -> Self {
        InlineSource {
            label: label.into(),
            text: text.into(),
        }
    }
}

impl TextSource for InlineSource {
    fn read_text(&self) -> Result<String> {
        Ok(self.text.clone())
    }

    fn label(&self) -> String {
        self.label.clone()
    }

    fn size_hint(&self) -> Option<u64> {
        Some(self.text.len() as u64)
    }
}

// ============================================================================
// HTTP FETCH
// ============================================================================

/// A dataset fetched over HTTP (e.g. a hosted copy of the sample)
#[cfg(feature = "http")]
#[derive(Debug, Clone)]
pub struct HttpSource {
    url: String,
    timeout: std::time::Duration,
}

#[cfg(feature = "http")]
impl HttpSource {
    pub fn new(url: impl Into<String>) -> Self {
        HttpSource {
            url: url.into(),
            timeout: std::time::Duration::from_secs(30),
        }
    }

    pub fn with_timeout(mut self, timeout: std::time::Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[cfg(feature = "http")]
impl TextSource for HttpSource {
    fn read_text(&self) -> Result<String> {
        let client = reqwest::blocking::Client::builder()
            .timeout(self.timeout)
            .build()
            .context("Failed to build HTTP client")?;

        let response = client
            .get(&self.url)
            .send()
            .with_context(|| format!("Failed to fetch {}", self.url))?
            .error_for_status()
            .with_context(|| format!("Server rejected request for {}", self.url))?;

        response
            .text()
            .with_context(|| format!("Failed to read response body from {}", self.url))
    }

    fn label(&self) -> String {
        self.url.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_file_source_reads_text_and_size() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "marker,value\nTSH,2.1\n").unwrap();

        let source = FileSource::new(file.path());
        assert_eq!(source.read_text().unwrap(), "marker,value\nTSH,2.1\n");
        assert_eq!(source.size_hint(), Some(21));
    }

    #[test]
    fn test_file_source_missing_file_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let source = FileSource::new(dir.path().join("missing.csv"));

        let err = source.read_text().unwrap_err();
        assert!(format!("{:#}", err).contains("missing.csv"));
        assert_eq!(source.label(), "missing.csv");
        assert_eq!(source.size_hint(), None);
    }

    #[test]
    fn test_file_source_tolerates_invalid_utf8() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"marker\nFerritin \xff\n").unwrap();

        let text = FileSource::new(file.path()).read_text().unwrap();
        assert!(text.starts_with("marker\nFerritin "));
    }

    #[test]
    fn test_bundled_sample_has_header_and_rows() {
        let text = BundledSample.read_text().unwrap();
        assert!(text.starts_with("Test Name,Result"));
        assert!(text.lines().count() > 10);
    }

    #[test]
    fn test_inline_source() {
        let source = InlineSource::new("upload.csv", "a,b\n1,2\n");
        assert_eq!(source.label(), "upload.csv");
        assert_eq!(source.size_hint(), Some(8));
    }
}
