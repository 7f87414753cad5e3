// Lab Insights - Core Library
// Lab-test record ingestion, filtering and aggregation

pub mod aggregate;
pub mod config;
pub mod dates;
pub mod error;
pub mod header;
pub mod ingest;
pub mod logging;
pub mod parser;
pub mod query;
pub mod record;
pub mod reference;
pub mod session;
pub mod source;

// Re-export commonly used types
pub use aggregate::{AggregateViews, LabelCount, SummaryStats};
pub use config::{Config, IngestConfig, LoggingConfig, SessionConfig};
pub use error::{ConfigError, IngestError, RowWarning};
pub use header::{CanonicalField, FieldKey};
pub use ingest::{load, load_text, LoadedDataset, SizeGate};
pub use parser::{parse, HeaderCollision, ParseOutput, ParserOptions, RawRow};
pub use query::{filter, FilterSpec, Selection};
pub use record::{materialize, Record};
pub use reference::{NutrientEntry, NutrientReference, ReferenceCategory};
pub use session::{LoadOutcome, RecomputeScheduler, Session, Snapshot};
pub use source::{BundledSample, FileSource, InlineSource, TextSource};

#[cfg(feature = "http")]
pub use source::HttpSource;

#[cfg(feature = "background")]
pub use ingest::load_in_background;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
