// Session - owns the loaded record set and the current filter
// Presentation never touches the records directly: it reads Snapshots.

use crate::aggregate::{summary_stats, AggregateViews, SummaryStats};
use crate::config::{IngestConfig, SessionConfig};
use crate::error::{IngestError, RowWarning};
use crate::ingest::{load, LoadedDataset, SizeGate};
use crate::parser::HeaderCollision;
use crate::query::{filter, provider_options, year_options, FilterSpec};
use crate::record::Record;
use crate::source::TextSource;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, info};

// ============================================================================
// RECOMPUTE SCHEDULER (debounce)
// ============================================================================

/// Single-slot "latest request wins" debouncer.
///
/// Each `request` replaces whatever was pending and pushes the deadline out
/// by `delay`. `poll` hands the value back once the deadline has passed.
/// Time is passed in by the caller.
#[derive(Debug, Clone)]
pub struct RecomputeScheduler<T> {
    delay: Duration,
    pending: Option<(T, Instant)>,
}

impl<T> RecomputeScheduler<T> {
    pub fn new(delay: Duration) -> Self {
        RecomputeScheduler {
            delay,
            pending: None,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Schedule `value`, superseding any request that has not fired yet
    pub fn request(&mut self, value: T, now: Instant) {
        self.pending = Some((value, now + self.delay));
    }

    /// Take the pending value if its deadline has passed
    pub fn poll(&mut self, now: Instant) -> Option<T> {
        let ready = matches!(&self.pending, Some((_, deadline)) if now >= *deadline);
        if ready {
            self.pending.take().map(|(value, _)| value)
        } else {
            None
        }
    }

    /// Drop the pending request, if any
    pub fn cancel(&mut self) -> Option<T> {
        self.pending.take().map(|(value, _)| value)
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// When the pending request will fire
    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|(_, deadline)| *deadline)
    }
}

// ============================================================================
// SNAPSHOT
// ============================================================================

/// Everything presentation needs for one render, owned and detached from
/// the session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub source_label: Option<String>,
    pub records: Vec<Record>,
    pub filtered: Vec<Record>,
    pub filter: FilterSpec,

    /// Charts and summary for the filtered set
    pub views: AggregateViews,

    /// Summary for the full set
    pub overall: SummaryStats,

    pub warnings: Vec<RowWarning>,
    pub hidden_warnings: usize,
    pub header_collisions: Vec<HeaderCollision>,

    pub provider_options: Vec<String>,
    pub year_options: Vec<String>,
}

/// What a load did to the session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The record set was replaced
    Replaced { records: usize },
    /// Byte-identical input was already loaded; nothing changed
    Unchanged,
}

/// Provenance of the current record set
#[derive(Debug, Clone)]
struct DatasetInfo {
    source_label: String,
    fingerprint: String,
    warnings: Vec<RowWarning>,
    hidden_warnings: usize,
    header_collisions: Vec<HeaderCollision>,
}

// ============================================================================
// SESSION
// ============================================================================

pub struct Session {
    config: SessionConfig,
    records: Vec<Record>,
    dataset: Option<DatasetInfo>,
    filter: FilterSpec,
    filtered: Vec<Record>,
    views: AggregateViews,
    overall: SummaryStats,
    scheduler: RecomputeScheduler<FilterSpec>,
}

impl Session {
    pub fn new(config: SessionConfig) -> Self {
        let scheduler = RecomputeScheduler::new(config.debounce());
        Session {
            views: AggregateViews::compute(&[], config.top_markers),
            overall: summary_stats(&[]),
            config,
            records: Vec::new(),
            dataset: None,
            filter: FilterSpec::all(),
            filtered: Vec::new(),
            scheduler,
        }
    }

    /// Load from `source`, replacing the current set as a whole.
    ///
    /// On error the current set is left exactly as it was. Loading text
    /// identical to what is already loaded is a no-op.
    pub fn load(
        &mut self,
        source: &dyn TextSource,
        gate: SizeGate,
        ingest: &IngestConfig,
    ) -> Result<LoadOutcome, IngestError> {
        let dataset = load(source, gate, ingest)?;
        Ok(self.apply_loaded(dataset))
    }

    /// Like [`Session::load`], but always replaces the set
    pub fn reload(
        &mut self,
        source: &dyn TextSource,
        gate: SizeGate,
        ingest: &IngestConfig,
    ) -> Result<LoadOutcome, IngestError> {
        let dataset = load(source, gate, ingest)?;
        Ok(self.replace(dataset))
    }

    /// Install a dataset produced elsewhere (e.g. by a background load)
    pub fn apply_loaded(&mut self, dataset: LoadedDataset) -> LoadOutcome {
        let unchanged = self
            .dataset
            .as_ref()
            .map_or(false, |current| current.fingerprint == dataset.fingerprint);

        if unchanged {
            debug!(source = %dataset.source_label, "input unchanged; keeping current records");
            return LoadOutcome::Unchanged;
        }

        self.replace(dataset)
    }

    fn replace(&mut self, dataset: LoadedDataset) -> LoadOutcome {
        let count = dataset.records.len();
        let hidden_warnings = dataset.hidden_warnings();
        info!(source = %dataset.source_label, records = count, "record set replaced");

        self.dataset = Some(DatasetInfo {
            source_label: dataset.source_label,
            fingerprint: dataset.fingerprint,
            warnings: dataset.warnings,
            hidden_warnings,
            header_collisions: dataset.header_collisions,
        });
        self.records = dataset.records;
        self.filter = FilterSpec::all();
        self.scheduler.cancel();
        self.recompute();

        LoadOutcome::Replaced { records: count }
    }

    /// Drop all records and reset the filter
    pub fn clear(&mut self) {
        info!("session cleared");
        self.records.clear();
        self.dataset = None;
        self.filter = FilterSpec::all();
        self.scheduler.cancel();
        self.recompute();
    }

    /// Apply a filter immediately
    pub fn set_filter(&mut self, spec: FilterSpec) {
        self.scheduler.cancel();
        self.filter = spec;
        self.recompute();
    }

    /// Queue a filter change; it takes effect on the first
    /// [`Session::poll_recompute`] after the debounce delay
    pub fn request_filter(&mut self, spec: FilterSpec, now: Instant) {
        self.scheduler.request(spec, now);
    }

    /// Apply the queued filter if its delay has elapsed.
    /// Returns true when the filtered set was recomputed.
    pub fn poll_recompute(&mut self, now: Instant) -> bool {
        match self.scheduler.poll(now) {
            Some(spec) => {
                self.filter = spec;
                self.recompute();
                true
            }
            None => false,
        }
    }

    /// When the queued filter change will fire, if one is queued
    pub fn next_recompute_at(&self) -> Option<Instant> {
        self.scheduler.deadline()
    }

    fn recompute(&mut self) {
        self.filtered = filter(&self.records, &self.filter);
        self.views = AggregateViews::compute(&self.filtered, self.config.top_markers);
        self.overall = summary_stats(&self.records);
        debug!(
            total = self.records.len(),
            filtered = self.filtered.len(),
            "recomputed views"
        );
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn filtered(&self) -> &[Record] {
        &self.filtered
    }

    pub fn filter_spec(&self) -> &FilterSpec {
        &self.filter
    }

    pub fn views(&self) -> &AggregateViews {
        &self.views
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Owned copy of everything presentation renders
    pub fn snapshot(&self) -> Snapshot {
        let (source_label, warnings, hidden_warnings, header_collisions) = match &self.dataset {
            Some(info) => (
                Some(info.source_label.clone()),
                info.warnings.clone(),
                info.hidden_warnings,
                info.header_collisions.clone(),
            ),
            None => (None, Vec::new(), 0, Vec::new()),
        };

        Snapshot {
            source_label,
            records: self.records.clone(),
            filtered: self.filtered.clone(),
            filter: self.filter.clone(),
            views: self.views.clone(),
            overall: self.overall.clone(),
            warnings,
            hidden_warnings,
            header_collisions,
            provider_options: provider_options(&self.records),
            year_options: year_options(&self.records),
        }
    }
}

impl Default for Session {
    fn default() -> Self {
        Session::new(SessionConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dates::year_of;
    use crate::source::{BundledSample, InlineSource};

    const SCENARIO: &str = "Test,Result,Doctor,SampleDate\n\
        Ferritin,45,Dr. Smith,2024-03-01\n\
        Vitamin D,32,Dr. Jones,2024-06-15\n\
        \"Vitamin B12, quoted \"\"test\"\"\",410,Dr. Jones,2025-01-10\n\
        TSH,2.1,Dr. Smith,2025-02-20\n";

    fn loaded_session(text: &str) -> Session {
        let mut session = Session::default();
        session
            .load(
                &InlineSource::new("scenario.csv", text),
                SizeGate::Unconfirmed,
                &IngestConfig::default(),
            )
            .unwrap();
        session
    }

    #[test]
    fn test_scheduler_latest_request_wins() {
        let start = Instant::now();
        let mut scheduler = RecomputeScheduler::new(Duration::from_millis(250));

        scheduler.request("a", start);
        scheduler.request("ab", start + Duration::from_millis(100));

        assert_eq!(scheduler.poll(start + Duration::from_millis(300)), None, "deadline was pushed out");
        assert_eq!(scheduler.poll(start + Duration::from_millis(350)), Some("ab"));
        assert!(!scheduler.is_pending());
        assert_eq!(scheduler.poll(start + Duration::from_secs(5)), None, "fires once");
    }

    #[test]
    fn test_scheduler_cancel() {
        let start = Instant::now();
        let mut scheduler = RecomputeScheduler::new(Duration::from_millis(250));
        scheduler.request(1, start);

        assert_eq!(scheduler.deadline(), Some(start + Duration::from_millis(250)));
        assert_eq!(scheduler.cancel(), Some(1));
        assert_eq!(scheduler.poll(start + Duration::from_secs(1)), None);
    }

    #[test]
    fn test_scenario_four_rows() {
        let session = loaded_session(SCENARIO);
        let snapshot = session.snapshot();

        assert_eq!(snapshot.overall.total_records, 4);
        assert_eq!(snapshot.overall.unique_markers, 4);
        assert_eq!(snapshot.overall.unique_providers, 2);
        assert_eq!(snapshot.overall.latest_date, "2025-02-20");
        assert_eq!(snapshot.records[2].marker(), "Vitamin B12, quoted \"test\"");

        let years: Vec<String> = snapshot.records.iter().map(|r| year_of(r.date())).collect();
        assert_eq!(years, vec!["2024", "2024", "2025", "2025"]);
    }

    #[test]
    fn test_year_filter_in_session() {
        let mut session = loaded_session(SCENARIO);
        session.set_filter(FilterSpec::from_labels("", "All", "2024"));

        let markers: Vec<&str> = session.filtered().iter().map(Record::marker).collect();
        assert_eq!(markers, vec!["Ferritin", "Vitamin D"]);
        assert_eq!(session.views().summary.total_records, 2);

        let snapshot = session.snapshot();
        assert_eq!(snapshot.overall.total_records, 4, "overall stats ignore the filter");
        assert_eq!(snapshot.year_options, vec!["All", "2025", "2024"]);
    }

    #[test]
    fn test_debounced_filter_applies_after_delay() {
        let mut session = loaded_session(SCENARIO);
        let start = Instant::now();

        session.request_filter(FilterSpec::all().with_search("v"), start);
        session.request_filter(FilterSpec::all().with_search("vit"), start + Duration::from_millis(50));

        assert!(!session.poll_recompute(start + Duration::from_millis(200)));
        assert_eq!(session.filtered().len(), 4, "nothing applied yet");

        assert!(session.poll_recompute(start + Duration::from_millis(300)));
        assert_eq!(session.filter_spec().search_term, "vit");
        assert_eq!(session.filtered().len(), 2);
        assert!(session.next_recompute_at().is_none());
    }

    #[test]
    fn test_failed_load_keeps_previous_set() {
        let mut session = loaded_session(SCENARIO);

        let err = session
            .load(
                &InlineSource::new("empty.csv", ""),
                SizeGate::Unconfirmed,
                &IngestConfig::default(),
            )
            .unwrap_err();
        assert!(matches!(err, IngestError::Fatal { .. }));
        assert_eq!(session.records().len(), 4);

        let err = session
            .load(
                &InlineSource::new("header.csv", "marker,value\n"),
                SizeGate::Unconfirmed,
                &IngestConfig::default(),
            )
            .unwrap_err();
        assert!(matches!(err, IngestError::EmptyResult));
        assert_eq!(session.snapshot().source_label.as_deref(), Some("scenario.csv"));
    }

    #[test]
    fn test_identical_reload_is_unchanged() {
        let mut session = loaded_session(SCENARIO);
        let ids: Vec<String> = session.records().iter().map(|r| r.id().to_string()).collect();
        let source = InlineSource::new("again.csv", SCENARIO);

        let outcome = session
            .load(&source, SizeGate::Unconfirmed, &IngestConfig::default())
            .unwrap();
        assert_eq!(outcome, LoadOutcome::Unchanged);

        let outcome = session
            .reload(&source, SizeGate::Unconfirmed, &IngestConfig::default())
            .unwrap();
        assert_eq!(outcome, LoadOutcome::Replaced { records: 4 });

        let reloaded: Vec<String> = session.records().iter().map(|r| r.id().to_string()).collect();
        assert_eq!(ids, reloaded, "synthetic ids are stable across loads");
    }

    #[test]
    fn test_same_text_with_other_parser_options_is_replaced() {
        let text = "Ferritin,45\nTSH,2.1\n";
        let source = InlineSource::new("labs.csv", text);
        let mut session = Session::default();

        let outcome = session
            .load(&source, SizeGate::Unconfirmed, &IngestConfig::default())
            .unwrap();
        assert_eq!(outcome, LoadOutcome::Replaced { records: 1 });

        let headerless = IngestConfig {
            has_headers: false,
            ..IngestConfig::default()
        };
        let outcome = session
            .load(&source, SizeGate::Unconfirmed, &headerless)
            .unwrap();
        assert_eq!(outcome, LoadOutcome::Replaced { records: 2 });
        assert_eq!(session.records().len(), 2);
        assert_eq!(session.records()[0].get("0"), Some("Ferritin"));

        let outcome = session
            .load(&source, SizeGate::Unconfirmed, &headerless)
            .unwrap();
        assert_eq!(outcome, LoadOutcome::Unchanged);
    }

    #[test]
    fn test_new_load_resets_filter() {
        let mut session = loaded_session(SCENARIO);
        session.set_filter(FilterSpec::all().with_provider("Dr. Smith"));
        assert_eq!(session.filtered().len(), 2);

        session
            .load(&BundledSample, SizeGate::Unconfirmed, &IngestConfig::default())
            .unwrap();
        assert!(session.filter_spec().is_unconstrained());
        assert_eq!(session.filtered().len(), session.records().len());
    }

    #[test]
    fn test_clear() {
        let mut session = loaded_session(SCENARIO);
        session.request_filter(FilterSpec::all().with_search("x"), Instant::now());
        session.clear();

        assert!(session.is_empty());
        assert!(session.next_recompute_at().is_none());
        let snapshot = session.snapshot();
        assert!(snapshot.source_label.is_none());
        assert_eq!(snapshot.overall.latest_date, "N/A");
        assert_eq!(snapshot.provider_options, vec!["All"]);
    }

    #[test]
    fn test_snapshot_of_bundled_sample() {
        let mut session = Session::default();
        let outcome = session
            .load(&BundledSample, SizeGate::Unconfirmed, &IngestConfig::default())
            .unwrap();
        assert_eq!(outcome, LoadOutcome::Replaced { records: 24 });

        let snapshot = session.snapshot();
        assert_eq!(snapshot.overall.unique_markers, 15);
        assert_eq!(snapshot.overall.unique_providers, 3);
        assert_eq!(snapshot.overall.latest_date, "2025-06-13");
        assert_eq!(snapshot.views.top_markers[0].label, "Ferritin");
        assert_eq!(snapshot.views.top_markers[0].count, 3);
        assert!(snapshot.views.top_markers.len() <= 10);
        assert_eq!(snapshot.views.time_series.first().map(|c| c.label.as_str()), Some("2024-01"));
        assert_eq!(
            snapshot.provider_options,
            vec!["All", "Dr. Amelia Hart", "Dr. Rahul Mehta", "Dr. Sofia Alvarez"]
        );
        assert!(snapshot.warnings.is_empty());
    }
}
