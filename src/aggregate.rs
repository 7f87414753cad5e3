// Aggregation Engine - chart-ready views and summary scalars over a record set
// Every function here is pure: no state survives between calls.

use crate::dates::{parse_date, year_month_of, UNKNOWN};
use crate::record::Record;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// `latest_date` when no record has a date
pub const NO_DATE: &str = "N/A";

// ============================================================================
// TYPES
// ============================================================================

/// One bar / slice / point: a label and how many records fell under it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelCount {
    pub label: String,
    pub count: usize,
}

impl LabelCount {
    pub fn new(label: impl Into<String>, count: usize) -> Self {
        LabelCount {
            label: label.into(),
            count,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryStats {
    pub total_records: usize,
    pub unique_markers: usize,
    pub unique_providers: usize,
    /// Date string as it appeared in the source, or "N/A"
    pub latest_date: String,
}

/// All four derived views of one record set
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateViews {
    pub top_markers: Vec<LabelCount>,
    pub time_series: Vec<LabelCount>,
    pub provider_distribution: Vec<LabelCount>,
    pub summary: SummaryStats,
}

impl AggregateViews {
    pub fn compute(records: &[Record], top_n: usize) -> Self {
        AggregateViews {
            top_markers: top_markers(records, top_n),
            time_series: time_series(records),
            provider_distribution: provider_distribution(records),
            summary: summary_stats(records),
        }
    }
}

// ============================================================================
// COUNT TABLE
// ============================================================================

/// Label counts that remember first-seen order
#[derive(Default)]
struct CountTable {
    order: Vec<LabelCount>,
    index: HashMap<String, usize>,
}

impl CountTable {
    fn add(&mut self, label: &str) {
        match self.index.get(label) {
            Some(&slot) => self.order[slot].count += 1,
            None => {
                self.index.insert(label.to_string(), self.order.len());
                self.order.push(LabelCount::new(label, 1));
            }
        }
    }

    fn into_vec(self) -> Vec<LabelCount> {
        self.order
    }
}

fn or_unknown(value: &str) -> &str {
    if value.is_empty() {
        UNKNOWN
    } else {
        value
    }
}

// ============================================================================
// AGGREGATES
// ============================================================================

/// The `n` most frequent markers, most frequent first.
/// Ties keep first-seen order; records without a marker count as "Unknown".
pub fn top_markers(records: &[Record], n: usize) -> Vec<LabelCount> {
    let mut table = CountTable::default();
    for record in records {
        table.add(or_unknown(record.marker()));
    }

    let mut counts = table.into_vec();
    // sort_by is stable, so equal counts stay in first-seen order
    counts.sort_by(|a, b| b.count.cmp(&a.count));
    counts.truncate(n);
    counts
}

/// Records per `YYYY-MM`, oldest first. Undated records are dropped.
pub fn time_series(records: &[Record]) -> Vec<LabelCount> {
    let mut table = CountTable::default();
    for record in records {
        let bucket = year_month_of(record.date());
        if bucket != UNKNOWN {
            table.add(&bucket);
        }
    }

    let mut counts = table.into_vec();
    counts.sort_by(|a, b| a.label.cmp(&b.label));
    counts
}

/// Records per provider, first-seen order (not sorted).
pub fn provider_distribution(records: &[Record]) -> Vec<LabelCount> {
    let mut table = CountTable::default();
    for record in records {
        table.add(or_unknown(record.provider()));
    }
    table.into_vec()
}

/// Totals, distinct counts and the most recent date.
///
/// `latest_date` is seeded with the first non-empty date and only replaced
/// by a later one when both strings parse. If the seed itself does not
/// parse it is kept, whatever follows.
pub fn summary_stats(records: &[Record]) -> SummaryStats {
    let unique_markers: HashSet<&str> = records
        .iter()
        .map(Record::marker)
        .filter(|m| !m.is_empty())
        .collect();
    let unique_providers: HashSet<&str> = records
        .iter()
        .map(Record::provider)
        .filter(|p| !p.is_empty())
        .collect();

    SummaryStats {
        total_records: records.len(),
        unique_markers: unique_markers.len(),
        unique_providers: unique_providers.len(),
        latest_date: latest_date(records).unwrap_or(NO_DATE).to_string(),
    }
}

fn latest_date(records: &[Record]) -> Option<&str> {
    let mut dates = records.iter().map(Record::date).filter(|d| !d.is_empty());
    let mut latest = dates.next()?;
    let mut latest_parsed = parse_date(latest);

    for candidate in dates {
        let (Some(current), Some(parsed)) = (latest_parsed, parse_date(candidate)) else {
            continue;
        };
        if parsed > current {
            latest = candidate;
            latest_parsed = Some(parsed);
        }
    }

    Some(latest)
}
