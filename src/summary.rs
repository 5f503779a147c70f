//! Run summary assembly for the summary CSV and the JSON report.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::matching::{CLOSE_MATCH_CUTOFF, MatchThresholds};
use crate::metrics::MemoryStats;
use crate::models::ReportCounts;

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub total_path: String,
    pub present_path: String,
    pub total_name_column: String,
    pub present_name_column: String,
    pub total_records: usize,
    pub present_records: usize,
    pub allocated: usize,
    pub absentees: usize,
    pub unmatched_present: usize,
    pub exact: usize,
    pub token: usize,
    pub fuzzy: usize,
    pub close_match: usize,
    pub fuzzy_cutoff: f64,
    pub token_cutoff: f64,
    pub close_match_cutoff: f64,
    pub started_utc: DateTime<Utc>,
    pub ended_utc: DateTime<Utc>,
    pub duration_secs: f64,
    pub mem_total_mb: u64,
    pub mem_used_start_mb: u64,
    pub mem_used_end_mb: u64,
}

/// Builder for RunSummary to keep the call site in main readable.
#[derive(Debug, Clone)]
pub struct SummaryBuilder {
    total_path: String,
    present_path: String,
    total_name_column: String,
    present_name_column: String,
    counts: ReportCounts,
    thresholds: MatchThresholds,
    started_utc: DateTime<Utc>,
    ended_utc: DateTime<Utc>,
    mem_total_mb: u64,
    mem_used_start_mb: u64,
    mem_used_end_mb: u64,
}

impl SummaryBuilder {
    pub fn new(total_path: &str, present_path: &str) -> Self {
        let now = Utc::now();
        Self {
            total_path: total_path.to_string(),
            present_path: present_path.to_string(),
            total_name_column: String::new(),
            present_name_column: String::new(),
            counts: ReportCounts::default(),
            thresholds: MatchThresholds::default(),
            started_utc: now,
            ended_utc: now,
            mem_total_mb: 0,
            mem_used_start_mb: 0,
            mem_used_end_mb: 0,
        }
    }

    pub fn with_columns(mut self, total_col: &str, present_col: &str) -> Self {
        self.total_name_column = total_col.to_string();
        self.present_name_column = present_col.to_string();
        self
    }

    pub fn with_counts(mut self, counts: ReportCounts) -> Self {
        self.counts = counts;
        self
    }

    pub fn with_thresholds(mut self, thresholds: MatchThresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    pub fn with_timestamps(mut self, started: DateTime<Utc>, ended: DateTime<Utc>) -> Self {
        self.started_utc = started;
        self.ended_utc = ended;
        self
    }

    pub fn with_memory(mut self, start: MemoryStats, end: MemoryStats) -> Self {
        self.mem_total_mb = end.total_mb;
        self.mem_used_start_mb = start.used_mb;
        self.mem_used_end_mb = end.used_mb;
        self
    }

    pub fn build(self) -> RunSummary {
        let duration_secs = (self.ended_utc - self.started_utc).num_milliseconds() as f64 / 1000.0;
        RunSummary {
            total_path: self.total_path,
            present_path: self.present_path,
            total_name_column: self.total_name_column,
            present_name_column: self.present_name_column,
            total_records: self.counts.total,
            present_records: self.counts.present,
            allocated: self.counts.allocated,
            absentees: self.counts.absent,
            unmatched_present: self.counts.unmatched_present,
            exact: self.counts.exact,
            token: self.counts.token,
            fuzzy: self.counts.fuzzy,
            close_match: self.counts.close_match,
            fuzzy_cutoff: self.thresholds.fuzzy_cutoff,
            token_cutoff: self.thresholds.token_cutoff,
            close_match_cutoff: CLOSE_MATCH_CUTOFF,
            started_utc: self.started_utc,
            ended_utc: self.ended_utc,
            duration_secs,
            mem_total_mb: self.mem_total_mb,
            mem_used_start_mb: self.mem_used_start_mb,
            mem_used_end_mb: self.mem_used_end_mb,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;

    #[test]
    fn builder_fills_summary() {
        let started = Utc::now();
        let ended = started + TimeDelta::milliseconds(2500);
        let counts = ReportCounts {
            total: 30,
            present: 28,
            allocated: 27,
            absent: 3,
            unmatched_present: 1,
            exact: 25,
            token: 1,
            fuzzy: 1,
            close_match: 0,
        };
        let mem_start = MemoryStats {
            total_mb: 16000,
            used_mb: 100,
            avail_mb: 15900,
        };
        let mem_end = MemoryStats {
            total_mb: 16000,
            used_mb: 120,
            avail_mb: 15880,
        };
        let s = SummaryBuilder::new("total.csv", "present.csv")
            .with_columns("StudentName", "name")
            .with_counts(counts)
            .with_thresholds(MatchThresholds::default())
            .with_timestamps(started, ended)
            .with_memory(mem_start, mem_end)
            .build();
        assert_eq!(s.total_records, 30);
        assert_eq!(s.absentees, 3);
        assert_eq!(s.exact, 25);
        assert_eq!(s.mem_total_mb, 16000);
        assert_eq!(s.mem_used_end_mb, 120);
        assert!((s.duration_secs - 2.5).abs() < 1e-9);
        assert!((s.fuzzy_cutoff - 0.72).abs() < 1e-9);
        assert!((s.close_match_cutoff - 0.6).abs() < 1e-9);
        assert_eq!(s.present_name_column, "name");
    }
}
