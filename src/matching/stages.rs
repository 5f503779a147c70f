//! The staged allocation pipeline. Each stage is a pure function from a
//! sign-in record and the current unallocated pool to an optional winner;
//! the engine runs them in fixed order and stops at the first success.

use std::collections::BTreeSet;

use rayon::prelude::*;

use super::MatchThresholds;
use super::similarity::{matching_ratio, token_overlap_score};
use crate::models::{MatchMethod, NameRecord};

/// Fixed floor for the last-resort stage, the classic close-match default.
pub const CLOSE_MATCH_CUTOFF: f64 = 0.6;

pub type StageFn =
    fn(&NameRecord, &[NameRecord], &BTreeSet<usize>, &MatchThresholds) -> Option<(usize, MatchMethod)>;

/// Stage order is fixed: cheap and precise first, recall-oriented last.
pub const STAGES: [StageFn; 4] = [exact_stage, token_stage, fuzzy_stage, close_match_stage];

/// First unallocated roster record (ascending index) with an identical
/// normalized form.
pub fn exact_stage(
    present: &NameRecord,
    total: &[NameRecord],
    pool: &BTreeSet<usize>,
    _thresholds: &MatchThresholds,
) -> Option<(usize, MatchMethod)> {
    pool.iter()
        .copied()
        .find(|&i| total[i].normalized == present.normalized)
        .map(|i| (i, MatchMethod::Exact))
}

/// Best token-overlap candidate, allocated when it reaches the token
/// cutoff. Candidates without tokens are skipped entirely.
pub fn token_stage(
    present: &NameRecord,
    total: &[NameRecord],
    pool: &BTreeSet<usize>,
    thresholds: &MatchThresholds,
) -> Option<(usize, MatchMethod)> {
    match best_candidate(pool, |i| token_overlap_score(present, &total[i])) {
        Some((i, score)) if score >= thresholds.token_cutoff => Some((i, MatchMethod::Token(score))),
        _ => None,
    }
}

/// Best character-similarity candidate at or above the fuzzy cutoff.
pub fn fuzzy_stage(
    present: &NameRecord,
    total: &[NameRecord],
    pool: &BTreeSet<usize>,
    thresholds: &MatchThresholds,
) -> Option<(usize, MatchMethod)> {
    match best_candidate(pool, |i| {
        Some(matching_ratio(&present.normalized, &total[i].normalized))
    }) {
        Some((i, ratio)) if ratio >= thresholds.fuzzy_cutoff => Some((i, MatchMethod::Fuzzy(ratio))),
        _ => None,
    }
}

/// Last resort: the same character metric against the fixed conservative
/// floor, catching near-misses the fuzzy cutoff rejected.
pub fn close_match_stage(
    present: &NameRecord,
    total: &[NameRecord],
    pool: &BTreeSet<usize>,
    _thresholds: &MatchThresholds,
) -> Option<(usize, MatchMethod)> {
    match best_candidate(pool, |i| {
        Some(matching_ratio(&present.normalized, &total[i].normalized))
    }) {
        Some((i, ratio)) if ratio >= CLOSE_MATCH_CUTOFF => Some((i, MatchMethod::CloseMatch)),
        _ => None,
    }
}

// Scoring scans are read-only over the pool, so they fan out across the
// rayon pool. The reduction is associative (higher score wins, ties to the
// lower index), which keeps the winner identical to a sequential ascending
// scan no matter how the work is split.
fn best_candidate<F>(pool: &BTreeSet<usize>, score: F) -> Option<(usize, f64)>
where
    F: Fn(usize) -> Option<f64> + Sync,
{
    pool.par_iter()
        .filter_map(|&i| score(i).map(|s| (i, s)))
        .reduce_with(better_of)
}

fn better_of(a: (usize, f64), b: (usize, f64)) -> (usize, f64) {
    if b.1 > a.1 {
        b
    } else if a.1 > b.1 {
        a
    } else if a.0 <= b.0 {
        a
    } else {
        b
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::build_records;

    fn pool_of(total: &[NameRecord]) -> BTreeSet<usize> {
        (0..total.len()).collect()
    }

    #[test]
    fn test_exact_prefers_lowest_index() {
        let total = build_records(["Alice Kumar", "Alice Kumar"]);
        let pool = pool_of(&total);
        let p = NameRecord::new("alice kumar", 0);
        let got = exact_stage(&p, &total, &pool, &MatchThresholds::default());
        assert_eq!(got, Some((0, MatchMethod::Exact)));
    }

    #[test]
    fn test_exact_skips_allocated() {
        let total = build_records(["Alice Kumar", "Alice Kumar"]);
        let mut pool = pool_of(&total);
        pool.remove(&0);
        let p = NameRecord::new("alice kumar", 0);
        let got = exact_stage(&p, &total, &pool, &MatchThresholds::default());
        assert_eq!(got, Some((1, MatchMethod::Exact)));
    }

    #[test]
    fn test_token_tie_breaks_to_lowest_index() {
        let total = build_records(["Ann Lee Xu", "Ann Lee Yu"]);
        let pool = pool_of(&total);
        let p = NameRecord::new("ann lee", 0);
        let got = token_stage(&p, &total, &pool, &MatchThresholds::default());
        assert_eq!(got, Some((0, MatchMethod::Token(1.0))));
    }

    #[test]
    fn test_token_below_cutoff() {
        let total = build_records(["Priya Patel Rao"]);
        let pool = pool_of(&total);
        let p = NameRecord::new("anil verma joshi", 0);
        let thresholds = MatchThresholds::default();
        assert_eq!(token_stage(&p, &total, &pool, &thresholds), None);
    }

    #[test]
    fn test_fuzzy_respects_cutoff() {
        let total = build_records(["Jonathan Smith"]);
        let pool = pool_of(&total);
        let p = NameRecord::new("jonathon smyth", 0);
        let defaults = MatchThresholds::default();
        let got = fuzzy_stage(&p, &total, &pool, &defaults);
        assert!(matches!(got, Some((0, MatchMethod::Fuzzy(r))) if r > 0.85));

        let strict = MatchThresholds {
            fuzzy_cutoff: 0.9,
            ..defaults
        };
        assert_eq!(fuzzy_stage(&p, &total, &pool, &strict), None);
    }

    #[test]
    fn test_close_match_window() {
        // ratio("amit", "sumit") = 2/3: below the fuzzy default, above 0.6
        let total = build_records(["Sumit"]);
        let pool = pool_of(&total);
        let p = NameRecord::new("amit", 0);
        let thresholds = MatchThresholds::default();
        assert_eq!(fuzzy_stage(&p, &total, &pool, &thresholds), None);
        assert_eq!(
            close_match_stage(&p, &total, &pool, &thresholds),
            Some((0, MatchMethod::CloseMatch))
        );
    }

    #[test]
    fn test_stages_on_empty_pool() {
        let total = build_records(["Alice Kumar"]);
        let pool = BTreeSet::new();
        let p = NameRecord::new("alice kumar", 0);
        let thresholds = MatchThresholds::default();
        for stage in STAGES {
            assert_eq!(stage(&p, &total, &pool, &thresholds), None);
        }
    }
}
