//! Batch fast path.
//!
//! Models a whole burst as a flat array of `B^H` recipients instead of a
//! tree. All candidates are drawn up front; accidental hits on the real
//! recipient are redrawn when the real recipient's running aggregate
//! frequency is above a randomized threshold; then one slot is overwritten
//! with the real recipient if the burst carries it.
//!
//! This is a distinct mode, not the tree algorithm in disguise:
//!
//! - collisions are redrawn uniformly, once, with no directional shift and no
//!   re-check;
//! - the aggregate frequency divides by the universe size, not by the number
//!   of recipients seen;
//! - the real slot is chosen after collision handling and may land on a slot
//!   that was just redrawn.
//!
//! Aggregate entropy matches the tree mode; individual sequences do not.

use ndarray::Array1;
use rand::{Rng, RngCore};

use super::frequency::{draw_deviation, FrequencyTracker};
use super::strategy::{RouteStrategy, StrategyKind};
use super::universe::{RecipientId, RecipientUniverse};
use super::BurstOutcome;
use crate::config::DecoyConfig;
use crate::error::{GhostError, Result};

/// Packets generated per message: `branching ^ hops`, `None` on overflow.
pub fn packets_per_message(branching: u32, hops: u32) -> Option<usize> {
    (branching as usize).checked_pow(hops)
}

/// Generates flat bursts of `B^H` recipients
#[derive(Debug, Clone)]
pub struct BatchGenerator {
    universe: RecipientUniverse,
    real: RecipientId,
    batch_size: usize,
    max_deviation: f64,
}

impl BatchGenerator {
    /// Create a generator for `branching ^ hops` slots per burst
    pub fn new(
        universe: RecipientUniverse,
        real: RecipientId,
        hops: u32,
        branching: u32,
        max_deviation: f64,
    ) -> Result<Self> {
        if hops == 0 || branching == 0 {
            return Err(GhostError::invalid(
                "batch mode needs at least one hop and one branch",
            ));
        }
        if !universe.contains(real) {
            return Err(GhostError::invalid(format!(
                "real recipient {real} is outside the universe 1..={}",
                universe.len()
            )));
        }
        let batch_size = packets_per_message(branching, hops).ok_or_else(|| {
            GhostError::invalid(format!("batch size {branching}^{hops} overflows"))
        })?;

        Ok(Self {
            universe,
            real,
            batch_size,
            max_deviation,
        })
    }

    /// Create a generator using `max_hops` as H and `max_branching` as B
    pub fn from_config(config: &DecoyConfig) -> Result<Self> {
        config.validate()?;
        Self::new(
            config.universe()?,
            config.real(),
            config.max_hops,
            config.max_branching,
            config.max_deviation,
        )
    }

    /// Slots per burst
    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Generate one burst. Does not touch the tracker.
    pub fn generate<R: Rng + ?Sized>(
        &self,
        carries_real: bool,
        tracker: &FrequencyTracker,
        rng: &mut R,
    ) -> Array1<RecipientId> {
        let mut candidates =
            Array1::from_shape_simple_fn(self.batch_size, || self.universe.sample(rng));

        let collisions: Vec<usize> = candidates
            .indexed_iter()
            .filter_map(|(slot, id)| (*id == self.real).then_some(slot))
            .collect();

        if !collisions.is_empty() && self.real_is_conspicuous(tracker, rng) {
            for slot in collisions {
                candidates[slot] = self.universe.sample(rng);
            }
        }

        if carries_real {
            let slot = rng.gen_range(0..self.batch_size);
            candidates[slot] = self.real;
        }

        candidates
    }

    /// Fold a generated burst into the run history
    pub fn update_history(tracker: &mut FrequencyTracker, burst: &Array1<RecipientId>) {
        tracker.record_all(burst.iter().copied());
    }

    fn real_is_conspicuous<R: Rng + ?Sized>(&self, tracker: &FrequencyTracker, rng: &mut R) -> bool {
        if tracker.is_empty() {
            return false;
        }
        let mean = tracker.aggregate_frequency(self.universe.len());
        let threshold = mean * (1.0 + draw_deviation(self.max_deviation, rng));
        tracker.frequency(self.real) as f64 > threshold
    }
}

impl RouteStrategy for BatchGenerator {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Batch
    }

    fn run_burst(
        &self,
        requires_real: bool,
        tracker: &mut FrequencyTracker,
        rng: &mut dyn RngCore,
    ) -> Result<BurstOutcome> {
        let burst = self.generate(requires_real, tracker, rng);
        Self::update_history(tracker, &burst);
        tracing::debug!(
            slots = burst.len(),
            real = requires_real,
            "batch burst complete"
        );

        Ok(BurstOutcome {
            transmissions: 1,
            real_sent: u32::from(requires_real),
            emitted: burst.to_vec(),
            last: None,
        })
    }
}
