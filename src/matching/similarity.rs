//! Scoring primitives shared by the allocation stages.

use std::collections::HashSet;

use crate::models::NameRecord;

/// Token-overlap score between a sign-in entry and a roster candidate:
/// the larger of coverage (how much of the sign-in entry the candidate
/// accounts for) and Jaccard similarity. `None` when either side has no
/// tokens, so callers can skip empty candidates instead of scoring them.
pub fn token_overlap_score(present: &NameRecord, candidate: &NameRecord) -> Option<f64> {
    let p: HashSet<&str> = present.tokens().collect();
    let c: HashSet<&str> = candidate.tokens().collect();
    if p.is_empty() || c.is_empty() {
        return None;
    }
    let inter = p.intersection(&c).count() as f64;
    let union = p.union(&c).count() as f64;
    let coverage = inter / p.len() as f64;
    let jaccard = inter / union;
    Some(coverage.max(jaccard))
}

/// Sequence matching ratio in [0, 1]: 2.0 * M / T where M is the number of
/// matching characters (via longest common subsequence) and T the combined
/// length. Same family as Python's SequenceMatcher.ratio(). Inputs are
/// expected to be normalized already.
pub fn matching_ratio(a: &str, b: &str) -> f64 {
    if a.is_empty() && b.is_empty() {
        return 1.0;
    }
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let a_bytes = a.as_bytes();
    let b_bytes = b.as_bytes();
    let matches = lcs_length(a_bytes, b_bytes);
    2.0 * matches as f64 / (a_bytes.len() + b_bytes.len()) as f64
}

/// LCS length using two-row DP (space-optimised).
fn lcs_length(a: &[u8], b: &[u8]) -> usize {
    let m = a.len();
    let n = b.len();
    let mut prev = vec![0usize; n + 1];
    let mut curr = vec![0usize; n + 1];

    for i in 1..=m {
        for j in 1..=n {
            if a[i - 1] == b[j - 1] {
                curr[j] = prev[j - 1] + 1;
            } else {
                curr[j] = curr[j - 1].max(prev[j]);
            }
        }
        std::mem::swap(&mut prev, &mut curr);
        curr.fill(0);
    }
    prev[n]
}

/// Rank `candidates` by Jaro-Winkler closeness to `record`, best first,
/// ties to the lower source index, truncated to `k`. Used for operator
/// diagnostics on unmatched entries; never consulted during allocation.
pub fn nearest_candidates<'a>(
    record: &NameRecord,
    candidates: &'a [NameRecord],
    k: usize,
) -> Vec<(&'a NameRecord, f64)> {
    let mut scored: Vec<(&NameRecord, f64)> = candidates
        .iter()
        .map(|c| (c, strsim::jaro_winkler(&record.normalized, &c.normalized)))
        .collect();
    scored.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.0.source_index.cmp(&b.0.source_index))
    });
    scored.truncate(k);
    scored
}
