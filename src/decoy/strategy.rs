//! Interchangeable burst strategies.
//!
//! Both strategies honor the same contract: run one burst against the run's
//! tracker, send the real message when required, report every recipient
//! emitted. A run uses exactly one strategy, picked explicitly.

use std::fmt;
use std::str::FromStr;

use rand::RngCore;
use serde::{Deserialize, Serialize};

use super::batch::BatchGenerator;
use super::burst::{BurstOutcome, BurstScheduler};
use super::frequency::FrequencyTracker;
use crate::config::DecoyConfig;
use crate::error::{GhostError, Result};

/// Available burst strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StrategyKind {
    /// Recursive route trees with adaptive decoy selection
    #[default]
    Tree,
    /// Flat `B^H` batches with aggregate-frequency redraws
    Batch,
}

impl StrategyKind {
    /// Get human-readable name
    pub fn name(&self) -> &'static str {
        match self {
            StrategyKind::Tree => "tree",
            StrategyKind::Batch => "batch",
        }
    }

    /// Build the strategy for a configuration
    pub fn build(self, config: &DecoyConfig) -> Result<Box<dyn RouteStrategy>> {
        Ok(match self {
            StrategyKind::Tree => Box::new(BurstScheduler::from_config(config)?),
            StrategyKind::Batch => Box::new(BatchGenerator::from_config(config)?),
        })
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for StrategyKind {
    type Err = GhostError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "tree" | "recursive" => Ok(StrategyKind::Tree),
            "batch" | "fast" | "vectorized" => Ok(StrategyKind::Batch),
            other => Err(GhostError::invalid(format!("unknown strategy: {other}"))),
        }
    }
}

/// One burst's worth of route generation
pub trait RouteStrategy: Send + Sync {
    /// Which strategy this is
    fn kind(&self) -> StrategyKind;

    /// Run one burst, recording every emitted recipient into `tracker`
    fn run_burst(
        &self,
        requires_real: bool,
        tracker: &mut FrequencyTracker,
        rng: &mut dyn RngCore,
    ) -> Result<BurstOutcome>;
}
