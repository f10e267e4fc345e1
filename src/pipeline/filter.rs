//! The gate between untrusted model proposals and the trusted result set.

use std::collections::HashSet;

use crate::models::{ExtractionResult, PiiCandidate, PiiRecord};
use crate::pipeline::validation::{validate, ValidationRules};

/// Counters for one filter run. Values are never recorded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FilterStats {
    pub accepted: usize,
    pub rejected: usize,
    pub duplicates: usize,
}

/// Accumulates accepted records for one extraction run.
///
/// A rejected candidate is a routine validation miss: it is dropped and
/// counted, never surfaced as an error.
pub struct CandidateFilter<'r> {
    rules: &'r ValidationRules,
    records: Vec<PiiRecord>,
    seen: Option<HashSet<PiiRecord>>,
    stats: FilterStats,
}

impl<'r> CandidateFilter<'r> {
    pub fn new(rules: &'r ValidationRules) -> Self {
        Self {
            rules,
            records: Vec::new(),
            seen: None,
            stats: FilterStats::default(),
        }
    }

    /// Like [`CandidateFilter::new`], but an exact repeat of an already
    /// accepted `(value, category, location)` is dropped. Distinct tuples are
    /// unaffected.
    pub fn deduplicating(rules: &'r ValidationRules) -> Self {
        Self {
            seen: Some(HashSet::new()),
            ..Self::new(rules)
        }
    }

    /// Validate one candidate and append it to the result if it passes.
    pub fn accept(&mut self, candidate: PiiCandidate) -> bool {
        if !validate(&candidate.value, candidate.category, self.rules) {
            self.stats.rejected += 1;
            tracing::debug!(
                category = %candidate.category,
                location = candidate.location.get(),
                "Candidate dropped: validation miss"
            );
            return false;
        }

        let record = PiiRecord::accepted(candidate);
        if let Some(seen) = self.seen.as_mut() {
            if !seen.insert(record.clone()) {
                self.stats.duplicates += 1;
                return false;
            }
        }

        tracing::debug!(
            category = %record.category(),
            location = record.location().get(),
            "Candidate accepted"
        );
        self.records.push(record);
        self.stats.accepted += 1;
        true
    }

    pub fn stats(&self) -> FilterStats {
        self.stats
    }

    /// Freeze the accumulated records.
    pub fn finish(self) -> ExtractionResult {
        ExtractionResult::from_records(self.records)
    }
}

/// Run a fresh filter over a list of candidates.
pub fn filter_candidates<I>(candidates: I, rules: &ValidationRules) -> ExtractionResult
where
    I: IntoIterator<Item = PiiCandidate>,
{
    let mut filter = CandidateFilter::new(rules);
    for candidate in candidates {
        filter.accept(candidate);
    }
    filter.finish()
}
