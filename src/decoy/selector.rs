//! Decoy recipient selection.
//!
//! A decoy is a uniform draw from the universe, except when the draw lands
//! on the real recipient while the real recipient is already conspicuous.
//! Then the pick is moved away from it:
//!
//! ```text
//!   draw index i ── ids[i] != real ──────────────────────────────> ids[i]
//!        │
//!        │ ids[i] == real && real above threshold
//!        v
//!   mod ~ U[1, N-1], coin
//!        ├── up:   min(i + mod, N-1)
//!        └── down: i - mod            (if >= 0)
//!                  0                  (underflow, first id not above threshold)
//!                  fresh uniform draw (underflow, first id above threshold)
//! ```
//!
//! The up-shift always clamps while the down-shift may re-randomize, and the
//! fresh draw is accepted without another collision check. That asymmetry is
//! part of the protocol and is reproduced as is.
//!
//! A down-shift that stays in range is kept, not redrawn. So once the real
//! recipient is conspicuous, a colliding draw can only return it again
//! through an up-shift clamp (real is the last id) or through the unchecked
//! fresh draw after an underflow. A real id in the middle of the universe,
//! with a quiet first id, is never selected as a decoy at all. Decoy
//! statistics depend on this: a selector that redraws on every down-shift
//! returns the real id a small but nonzero fraction of the time.
//!
//! The selector only reads the tracker. Recording the chosen id is the
//! caller's job.

use rand::Rng;

use super::frequency::FrequencyTracker;
use super::universe::{RecipientId, RecipientUniverse};
use super::DEFAULT_MAX_DEVIATION;

/// Picks decoy recipients biased away from the real one when it stands out
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecoySelector {
    max_deviation: f64,
}

impl Default for DecoySelector {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_DEVIATION)
    }
}

impl DecoySelector {
    /// Create a selector with the given threshold deviation
    pub fn new(max_deviation: f64) -> Self {
        Self { max_deviation }
    }

    /// Threshold deviation used for above-threshold checks
    pub fn max_deviation(&self) -> f64 {
        self.max_deviation
    }

    /// Select one decoy recipient.
    pub fn select<R: Rng + ?Sized>(
        &self,
        universe: &RecipientUniverse,
        real: RecipientId,
        tracker: &FrequencyTracker,
        rng: &mut R,
    ) -> RecipientId {
        let index = universe.sample_index(rng);
        let candidate = universe.at(index);

        if candidate != real || !tracker.is_above_threshold(real, self.max_deviation, rng) {
            return candidate;
        }

        let last = universe.len() - 1;
        if last == 0 {
            // Single-recipient universe: nowhere to shift to
            return candidate;
        }

        let offset = rng.gen_range(1..=last);
        let shifted = if rng.gen::<bool>() {
            (index + offset).min(last)
        } else if let Some(down) = index.checked_sub(offset) {
            down
        } else if !tracker.is_above_threshold(universe.first(), self.max_deviation, rng) {
            0
        } else {
            universe.sample_index(rng)
        };

        universe.at(shifted)
    }
}

/// Select one decoy recipient with an explicit deviation.
pub fn select_fake<R: Rng + ?Sized>(
    universe: &RecipientUniverse,
    real: RecipientId,
    tracker: &FrequencyTracker,
    max_deviation: f64,
    rng: &mut R,
) -> RecipientId {
    DecoySelector::new(max_deviation).select(universe, real, tracker, rng)
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;

    fn conspicuous_tracker(real: RecipientId, universe: &RecipientUniverse) -> FrequencyTracker {
        let mut tracker = FrequencyTracker::new();
        tracker.record_all(universe.iter());
        for _ in 0..100 {
            tracker.record(real);
        }
        tracker
    }

    #[test]
    fn test_empty_tracker_is_plain_uniform() {
        let universe = RecipientUniverse::new(10).unwrap();
        let tracker = FrequencyTracker::new();
        let selector = DecoySelector::default();
        let mut rng = StdRng::seed_from_u64(1);

        let mut counts = [0u32; 10];
        for _ in 0..5000 {
            let id = selector.select(&universe, RecipientId(5), &tracker, &mut rng);
            counts[universe.index_of(id).unwrap()] += 1;
        }
        // Every recipient, the real one included, is reachable
        assert!(counts.iter().all(|c| *c > 350));
    }

    #[test]
    fn test_biases_away_from_conspicuous_real() {
        let universe = RecipientUniverse::new(10).unwrap();
        let real = RecipientId(5);
        let tracker = conspicuous_tracker(real, &universe);
        let selector = DecoySelector::new(0.1);
        let mut rng = StdRng::seed_from_u64(2);

        let hits = (0..1000)
            .filter(|_| selector.select(&universe, real, &tracker, &mut rng) == real)
            .count();
        // Uniform would give ~100
        assert!(hits < 50, "real selected {hits} times");
    }

    #[test]
    fn test_up_shift_clamps_to_last() {
        // Real is the last id: every up-shift clamps back onto it, every
        // down-shift stays in range and moves off it.
        let universe = RecipientUniverse::new(4).unwrap();
        let real = RecipientId(4);
        let tracker = conspicuous_tracker(real, &universe);
        let mut rng = StdRng::seed_from_u64(3);

        let mut saw_clamp = false;
        for _ in 0..2000 {
            let id = select_fake(&universe, real, &tracker, 0.1, &mut rng);
            assert!(universe.contains(id));
            saw_clamp |= id == real;
        }
        assert!(saw_clamp);
    }

    #[test]
    fn test_down_underflow_clamps_to_first_when_first_is_quiet() {
        // Real sits at index 1. Every down-shift lands on index 0, either in
        // range or by the underflow clamp (id 1 is rarely seen).
        let universe = RecipientUniverse::new(10).unwrap();
        let real = RecipientId(2);
        let tracker = conspicuous_tracker(real, &universe);
        let mut rng = StdRng::seed_from_u64(4);

        let mut counts = [0u32; 10];
        for _ in 0..5000 {
            let id = select_fake(&universe, real, &tracker, 0.1, &mut rng);
            counts[universe.index_of(id).unwrap()] += 1;
        }
        // ~750 expected for id 1 against ~500 for an untouched id
        assert!(counts[0] > 600, "first id selected {} times", counts[0]);
        assert!(counts[1] < 100, "real selected {} times", counts[1]);
    }

    #[test]
    fn test_down_underflow_redraws_when_first_is_conspicuous() {
        // Real is the first id, so the underflow check finds the first id
        // above threshold and falls back to a fresh, unchecked draw.
        let universe = RecipientUniverse::new(3).unwrap();
        let real = RecipientId(1);
        let tracker = conspicuous_tracker(real, &universe);
        let mut rng = StdRng::seed_from_u64(4);

        let hits = (0..3000)
            .filter(|_| select_fake(&universe, real, &tracker, 0.1, &mut rng) == real)
            .count();
        // Only the unchecked redraw can return the real id: ~1/3 * 1/2 * 1/3
        assert!(hits > 0);
        assert!(hits < 400, "real selected {hits} times");
    }

    #[test]
    fn test_in_range_down_shift_never_returns_real() {
        // Real in the middle, first id quiet: up-shifts clamp below the
        // last index at worst, down-shifts stay in range or clamp to index 0.
        let universe = RecipientUniverse::new(10).unwrap();
        let real = RecipientId(6);
        let tracker = conspicuous_tracker(real, &universe);
        let selector = DecoySelector::new(0.1);
        let mut rng = StdRng::seed_from_u64(7);

        let hits = (0..20_000)
            .filter(|_| selector.select(&universe, real, &tracker, &mut rng) == real)
            .count();
        assert_eq!(hits, 0);
    }

    #[test]
    fn test_single_recipient_universe() {
        let universe = RecipientUniverse::new(1).unwrap();
        let real = RecipientId(1);
        let tracker = conspicuous_tracker(real, &universe);
        let mut rng = StdRng::seed_from_u64(5);
        assert_eq!(
            select_fake(&universe, real, &tracker, 0.1, &mut rng),
            RecipientId(1)
        );
    }

    #[test]
    fn test_selector_does_not_mutate_tracker() {
        let universe = RecipientUniverse::new(10).unwrap();
        let tracker = conspicuous_tracker(RecipientId(5), &universe);
        let before = tracker.total();
        let mut rng = StdRng::seed_from_u64(6);
        for _ in 0..100 {
            select_fake(&universe, RecipientId(5), &tracker, 0.1, &mut rng);
        }
        assert_eq!(tracker.total(), before);
    }
}
