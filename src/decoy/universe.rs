//! Recipient identifiers and the ordered candidate universe.

use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{GhostError, Result};

/// Recipient identifier as seen on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecipientId(pub u32);

impl RecipientId {
    /// Raw identifier value
    pub fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for RecipientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl From<u32> for RecipientId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

/// Ordered, fixed set of candidate recipients `1..=N`.
///
/// Selection works in index space (`0..N`), so the order matters: the
/// decoy selector shifts positions up and down within it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecipientUniverse {
    ids: Vec<RecipientId>,
}

impl RecipientUniverse {
    /// Create the universe `1..=size`
    pub fn new(size: u32) -> Result<Self> {
        if size == 0 {
            return Err(GhostError::invalid("universe size must be at least 1"));
        }
        Ok(Self {
            ids: (1..=size).map(RecipientId).collect(),
        })
    }

    /// Number of candidate recipients
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Always false for a constructed universe
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Recipient at `index`, if in range
    pub fn get(&self, index: usize) -> Option<RecipientId> {
        self.ids.get(index).copied()
    }

    /// Recipient at `index`. Callers pass indices already bounded by `len()`.
    pub(crate) fn at(&self, index: usize) -> RecipientId {
        self.ids[index]
    }

    /// First recipient in universe order
    pub fn first(&self) -> RecipientId {
        self.ids[0]
    }

    /// Position of `id`, if it belongs to the universe
    pub fn index_of(&self, id: RecipientId) -> Option<usize> {
        // ids are 1..=N in order
        let index = (id.0 as usize).checked_sub(1)?;
        (index < self.ids.len()).then_some(index)
    }

    /// Whether `id` belongs to the universe
    pub fn contains(&self, id: RecipientId) -> bool {
        self.index_of(id).is_some()
    }

    /// Uniform random index in `0..len()`
    pub fn sample_index<R: Rng + ?Sized>(&self, rng: &mut R) -> usize {
        rng.gen_range(0..self.ids.len())
    }

    /// Uniform random recipient
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> RecipientId {
        self.at(self.sample_index(rng))
    }

    /// Iterate recipients in order
    pub fn iter(&self) -> impl Iterator<Item = RecipientId> + '_ {
        self.ids.iter().copied()
    }
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;

    #[test]
    fn test_universe_is_one_based_and_ordered() {
        let universe = RecipientUniverse::new(5).unwrap();
        assert_eq!(universe.len(), 5);
        assert_eq!(universe.first(), RecipientId(1));
        assert_eq!(universe.get(4), Some(RecipientId(5)));
        assert_eq!(universe.get(5), None);
        let ids: Vec<u32> = universe.iter().map(RecipientId::get).collect();
        assert_eq!(ids, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_empty_universe_rejected() {
        let err = RecipientUniverse::new(0).unwrap_err();
        assert!(matches!(err, GhostError::InvalidConfiguration(_)));
    }

    #[test]
    fn test_index_of() {
        let universe = RecipientUniverse::new(10).unwrap();
        assert_eq!(universe.index_of(RecipientId(1)), Some(0));
        assert_eq!(universe.index_of(RecipientId(10)), Some(9));
        assert_eq!(universe.index_of(RecipientId(0)), None);
        assert_eq!(universe.index_of(RecipientId(11)), None);
        assert!(universe.contains(RecipientId(7)));
    }

    #[test]
    fn test_sample_stays_in_universe() {
        let universe = RecipientUniverse::new(7).unwrap();
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..500 {
            assert!(universe.contains(universe.sample(&mut rng)));
        }
    }

    #[test]
    fn test_display() {
        assert_eq!(RecipientId(42).to_string(), "#42");
    }
}
