//! Per-run recipient occurrence counts.
//!
//! Every hop created in a run is recorded here, and every decoy decision
//! reads from it. One tracker belongs to exactly one simulation run; runs
//! never share frequency state.

use std::collections::HashMap;

use rand::Rng;

use super::universe::RecipientId;

/// Occurrence counts keyed by recipient.
#[derive(Debug, Clone, Default)]
pub struct FrequencyTracker {
    /// Count per recipient seen at least once
    counts: HashMap<RecipientId, u64>,
    /// Sum of all counts
    total: u64,
}

impl FrequencyTracker {
    /// Create an empty tracker
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one occurrence of `id`
    pub fn record(&mut self, id: RecipientId) {
        *self.counts.entry(id).or_insert(0) += 1;
        self.total += 1;
    }

    /// Record one occurrence for each id in `ids`
    pub fn record_all<I>(&mut self, ids: I)
    where
        I: IntoIterator<Item = RecipientId>,
    {
        for id in ids {
            self.record(id);
        }
    }

    /// Occurrences of `id` so far (0 if unseen)
    pub fn frequency(&self, id: RecipientId) -> u64 {
        self.counts.get(&id).copied().unwrap_or(0)
    }

    /// Total occurrences across all recipients
    pub fn total(&self) -> u64 {
        self.total
    }

    /// Number of distinct recipients seen
    pub fn distinct(&self) -> usize {
        self.counts.len()
    }

    /// Whether nothing has been recorded yet
    pub fn is_empty(&self) -> bool {
        self.total == 0
    }

    /// Mean occurrences per recipient *seen so far*.
    ///
    /// The denominator is the number of distinct ids that occurred, not the
    /// universe size. Returns 0 for an empty tracker.
    pub fn mean_frequency(&self) -> f64 {
        if self.counts.is_empty() {
            return 0.0;
        }
        self.total as f64 / self.counts.len() as f64
    }

    /// Mean occurrences spread over the whole universe.
    ///
    /// This is the running aggregate the batch fast path compares against.
    pub fn aggregate_frequency(&self, universe_size: usize) -> f64 {
        if universe_size == 0 {
            return 0.0;
        }
        self.total as f64 / universe_size as f64
    }

    /// `mean_frequency() * (1 + u)`, `u ~ U[0, max_deviation]`.
    ///
    /// Drawn fresh on every call.
    pub fn randomized_threshold<R: Rng + ?Sized>(&self, max_deviation: f64, rng: &mut R) -> f64 {
        self.mean_frequency() * (1.0 + draw_deviation(max_deviation, rng))
    }

    /// Whether `id` is currently conspicuous.
    ///
    /// An unseen id is never above threshold. No randomness is consumed in
    /// that case.
    pub fn is_above_threshold<R: Rng + ?Sized>(
        &self,
        id: RecipientId,
        max_deviation: f64,
        rng: &mut R,
    ) -> bool {
        let freq = self.frequency(id);
        if freq == 0 {
            return false;
        }
        freq as f64 > self.randomized_threshold(max_deviation, rng)
    }

    /// Iterate `(recipient, count)` pairs in no particular order
    pub fn iter(&self) -> impl Iterator<Item = (RecipientId, u64)> + '_ {
        self.counts.iter().map(|(id, count)| (*id, *count))
    }

    /// Forget everything. Only valid between independent runs.
    pub fn reset(&mut self) {
        self.counts.clear();
        self.total = 0;
    }
}

/// `u ~ U[0, max_deviation]`; a zero deviation consumes no randomness.
pub(crate) fn draw_deviation<R: Rng + ?Sized>(max_deviation: f64, rng: &mut R) -> f64 {
    if max_deviation > 0.0 {
        rng.gen_range(0.0..=max_deviation)
    } else {
        0.0
    }
}
