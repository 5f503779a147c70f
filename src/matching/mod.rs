//! Reconciliation engine: allocates each sign-in entry to at most one
//! roster entry through a fixed cascade of matching stages, then reports
//! the never-allocated roster entries as absentees.
//!
//! The engine is pure: it receives pre-built records and thresholds and
//! returns a report. Reading files, resolving columns and writing output
//! all live outside this module.

pub mod similarity;
pub mod stages;

use std::collections::BTreeSet;
use std::time::Instant;

use log::debug;

use crate::error::MatchError;
use crate::metrics::memory_stats_mb;
use crate::models::{Allocation, MatchMethod, MatchReport, NameRecord, ReportCounts};

pub use similarity::{matching_ratio, nearest_candidates, token_overlap_score};
pub use stages::CLOSE_MATCH_CUTOFF;

/// Per-run cutoffs, validated to [0, 1] before any allocation happens.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchThresholds {
    pub fuzzy_cutoff: f64,
    pub token_cutoff: f64,
}

impl Default for MatchThresholds {
    fn default() -> Self {
        Self {
            fuzzy_cutoff: 0.72,
            token_cutoff: 0.50,
        }
    }
}

impl MatchThresholds {
    pub fn validate(&self) -> Result<(), MatchError> {
        validate_unit("fuzzy_cutoff", self.fuzzy_cutoff)?;
        validate_unit("token_cutoff", self.token_cutoff)?;
        Ok(())
    }
}

fn validate_unit(name: &'static str, value: f64) -> Result<(), MatchError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(MatchError::InvalidThreshold { name, value })
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ProgressConfig {
    pub update_every: usize,
}

impl Default for ProgressConfig {
    fn default() -> Self {
        Self { update_every: 1000 }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ProgressUpdate {
    pub processed: usize,
    pub total: usize,
    pub percent: f32,
    pub eta_secs: u64,
    pub mem_used_mb: u64,
    pub mem_avail_mb: u64,
    pub stage: &'static str,
}

/// Reconcile with default progress reporting (none).
pub fn reconcile(
    total: &[NameRecord],
    present: &[NameRecord],
    thresholds: MatchThresholds,
) -> Result<MatchReport, MatchError> {
    reconcile_with_progress(total, present, thresholds, ProgressConfig::default(), |_| {})
}

/// Reconcile the roster against the sign-in list.
///
/// Allocation is greedy and strictly sequential in sign-in order: each
/// entry scans the current pool of unallocated roster indices through the
/// stage cascade, and a win removes that index permanently. No
/// backtracking. The per-candidate scoring inside a stage is the only
/// parallel part.
pub fn reconcile_with_progress<F>(
    total: &[NameRecord],
    present: &[NameRecord],
    thresholds: MatchThresholds,
    cfg: ProgressConfig,
    progress: F,
) -> Result<MatchReport, MatchError>
where
    F: Fn(ProgressUpdate) + Sync,
{
    thresholds.validate()?;

    let start = Instant::now();
    let mut pool: BTreeSet<usize> = (0..total.len()).collect();
    let mut allocations: Vec<Allocation> = Vec::new();
    let mut unmatched_present: Vec<NameRecord> = Vec::new();
    let mut counts = ReportCounts {
        total: total.len(),
        present: present.len(),
        ..Default::default()
    };

    let mut last_update = 0usize;
    for (i, record) in present.iter().enumerate() {
        if record.normalized.is_empty() {
            // Nothing to match on; the pool is not consulted.
            unmatched_present.push(record.clone());
        } else {
            match run_stages(record, total, &pool, &thresholds) {
                Some((idx, method)) => {
                    pool.remove(&idx);
                    tally(&mut counts, method);
                    debug!(
                        "allocated '{}' -> '{}' ({})",
                        record.original, total[idx].original, method
                    );
                    allocations.push(Allocation {
                        present: record.clone(),
                        roster: total[idx].clone(),
                        method,
                    });
                }
                None => {
                    debug!("no allocation for '{}'", record.original);
                    unmatched_present.push(record.clone());
                }
            }
        }

        let done = i + 1;
        if done - last_update >= cfg.update_every || done == present.len() {
            let elapsed = start.elapsed();
            let frac = (done as f32 / present.len() as f32).clamp(0.0, 1.0);
            let eta_secs = if frac > 0.0 {
                (elapsed.as_secs_f32() * (1.0 - frac) / frac) as u64
            } else {
                0
            };
            let mem = memory_stats_mb();
            progress(ProgressUpdate {
                processed: done,
                total: present.len(),
                percent: frac * 100.0,
                eta_secs,
                mem_used_mb: mem.used_mb,
                mem_avail_mb: mem.avail_mb,
                stage: "reconcile",
            });
            last_update = done;
        }
    }

    // Ascending pool order is original roster order.
    let unmatched_total: Vec<NameRecord> = pool.iter().map(|&i| total[i].clone()).collect();
    counts.allocated = allocations.len();
    counts.absent = unmatched_total.len();
    counts.unmatched_present = unmatched_present.len();

    Ok(MatchReport {
        allocations,
        unmatched_present,
        unmatched_total,
        counts,
    })
}

fn run_stages(
    record: &NameRecord,
    total: &[NameRecord],
    pool: &BTreeSet<usize>,
    thresholds: &MatchThresholds,
) -> Option<(usize, MatchMethod)> {
    stages::STAGES
        .iter()
        .find_map(|stage| stage(record, total, pool, thresholds))
}

fn tally(counts: &mut ReportCounts, method: MatchMethod) {
    match method {
        MatchMethod::Exact => counts.exact += 1,
        MatchMethod::Token(_) => counts.token += 1,
        MatchMethod::Fuzzy(_) => counts.fuzzy += 1,
        MatchMethod::CloseMatch => counts.close_match += 1,
    }
}
