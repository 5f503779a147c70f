use serde::{Serialize, Serializer};
use std::fmt;

use crate::normalize::normalize_name;

/// One name as it entered the run: the verbatim cell, its canonical form,
/// and its 0-based position in the originating dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NameRecord {
    pub original: String,
    pub normalized: String,
    pub source_index: usize,
}

impl NameRecord {
    pub fn new(original: impl Into<String>, source_index: usize) -> Self {
        let original = original.into();
        let normalized = normalize_name(&original);
        Self {
            original,
            normalized,
            source_index,
        }
    }

    /// Whitespace tokens of the normalized form.
    pub fn tokens(&self) -> impl Iterator<Item = &str> {
        self.normalized.split_whitespace()
    }
}

/// Build records from raw names in input order. Normalization is
/// per-element and order-preserving, so it fans out across the rayon pool.
pub fn build_records<I, S>(names: I) -> Vec<NameRecord>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    use rayon::prelude::*;
    let names: Vec<String> = names.into_iter().map(Into::into).collect();
    names
        .into_par_iter()
        .enumerate()
        .map(|(i, name)| NameRecord::new(name, i))
        .collect()
}

/// How an allocation was won. Scores ride along for the token and fuzzy
/// stages; rendered labels carry them at two decimals.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MatchMethod {
    Exact,
    Token(f64),
    Fuzzy(f64),
    CloseMatch,
}

impl fmt::Display for MatchMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchMethod::Exact => write!(f, "exact"),
            MatchMethod::Token(score) => write!(f, "token:{score:.2}"),
            MatchMethod::Fuzzy(ratio) => write!(f, "fuzzy:{ratio:.2}"),
            MatchMethod::CloseMatch => write!(f, "close-match"),
        }
    }
}

impl Serialize for MatchMethod {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// One sign-in entry paired with the roster entry it consumed.
#[derive(Debug, Clone, Serialize)]
pub struct Allocation {
    pub present: NameRecord,
    pub roster: NameRecord,
    pub method: MatchMethod,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReportCounts {
    pub total: usize,
    pub present: usize,
    pub allocated: usize,
    pub absent: usize,
    pub unmatched_present: usize,
    pub exact: usize,
    pub token: usize,
    pub fuzzy: usize,
    pub close_match: usize,
}

/// Outcome of a reconciliation run. Every roster record appears in exactly
/// one of allocations/unmatched_total, every sign-in record in exactly one
/// of allocations/unmatched_present.
#[derive(Debug, Clone, Serialize)]
pub struct MatchReport {
    pub allocations: Vec<Allocation>,
    pub unmatched_present: Vec<NameRecord>,
    pub unmatched_total: Vec<NameRecord>,
    pub counts: ReportCounts,
}

impl MatchReport {
    /// Roster indices that were consumed, in allocation order.
    pub fn allocated_roster_indices(&self) -> Vec<usize> {
        self.allocations
            .iter()
            .map(|a| a.roster.source_index)
            .collect()
    }

    /// Roster indices never allocated, in original roster order.
    pub fn absentee_indices(&self) -> Vec<usize> {
        self.unmatched_total
            .iter()
            .map(|r| r.source_index)
            .collect()
    }
}
