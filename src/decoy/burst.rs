//! Burst scheduling.
//!
//! A burst issues a randomly sized group of transmissions. When the burst
//! must carry the real message, each transmission flips a fair coin to decide
//! whether it is the one, and the burst keeps going past its target count
//! until the real message has been sent.
//!
//! ```text
//!          ┌──────────────────────────────────────────────┐
//!          v                                              │
//!   issued >= target && real satisfied? ── no ──> issue transmission
//!          │                                     (coin if real pending
//!         yes                                     and under the limit)
//!          v
//!        done
//! ```
//!
//! Without an iteration cap the loop ends with probability 1 but has no
//! fixed bound. With a cap, running into it while the real message is still
//! pending is reported as [`GhostError::NonConvergentBurst`].

use std::ops::RangeInclusive;

use rand::{Rng, RngCore};

use super::frequency::FrequencyTracker;
use super::strategy::{RouteStrategy, StrategyKind};
use super::tree::{RouteTree, RouteTreeBuilder};
use super::universe::RecipientId;
use crate::config::DecoyConfig;
use crate::error::{GhostError, Result};

/// Counters for one burst in flight
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BurstState {
    target: u64,
    issued: u64,
    requires_real: bool,
    real_sent: u32,
    real_satisfied: bool,
}

impl BurstState {
    /// Start a burst of `target` transmissions
    pub fn new(target: u64, requires_real: bool) -> Self {
        Self {
            target,
            issued: 0,
            requires_real,
            real_sent: 0,
            // Nothing to wait for: degenerate to a counted loop
            real_satisfied: !requires_real,
        }
    }

    /// Transmissions issued so far
    pub fn issued(&self) -> u64 {
        self.issued
    }

    /// Target transmission count drawn for this burst
    pub fn target(&self) -> u64 {
        self.target
    }

    /// Real messages sent so far
    pub fn real_sent(&self) -> u32 {
        self.real_sent
    }

    /// Whether the real-message requirement is met
    pub fn real_satisfied(&self) -> bool {
        self.real_satisfied
    }

    /// Whether the burst may stop
    pub fn is_complete(&self) -> bool {
        self.issued >= self.target && self.real_satisfied
    }

    /// Whether the next transmission is eligible to carry the real message
    pub fn may_carry_real(&self, real_limit: u32) -> bool {
        self.requires_real && self.real_sent < real_limit
    }

    /// Account for one issued transmission
    pub fn record(&mut self, carried_real: bool) {
        self.issued += 1;
        if carried_real {
            self.real_sent += 1;
            self.real_satisfied = true;
        }
    }
}

/// Result of one burst
#[derive(Debug, Clone, Default)]
pub struct BurstOutcome {
    /// Transmissions issued
    pub transmissions: u64,
    /// Real messages sent
    pub real_sent: u32,
    /// Every recipient emitted, in order
    pub emitted: Vec<RecipientId>,
    /// Last transmission's tree (tree strategy only)
    pub last: Option<RouteTree>,
}

/// Drives repeated tree construction within a burst
#[derive(Debug, Clone)]
pub struct BurstScheduler {
    builder: RouteTreeBuilder,
    transmissions: RangeInclusive<u64>,
    real_limit: u32,
    iteration_cap: Option<u64>,
}

impl BurstScheduler {
    /// Create a scheduler around a tree builder
    pub fn new(
        builder: RouteTreeBuilder,
        min_transmissions: u64,
        max_transmissions: u64,
        real_limit: u32,
    ) -> Result<Self> {
        if min_transmissions > max_transmissions {
            return Err(GhostError::invalid(format!(
                "min_transmissions ({min_transmissions}) exceeds max_transmissions ({max_transmissions})"
            )));
        }
        if real_limit == 0 {
            return Err(GhostError::invalid("real_per_burst must be at least 1"));
        }

        Ok(Self {
            builder,
            transmissions: min_transmissions..=max_transmissions,
            real_limit,
            iteration_cap: None,
        })
    }

    /// Create a scheduler from a decoy configuration
    pub fn from_config(config: &DecoyConfig) -> Result<Self> {
        let scheduler = Self::new(
            RouteTreeBuilder::from_config(config)?,
            config.min_transmissions,
            config.max_transmissions,
            config.real_per_burst,
        )?;
        match config.max_burst_iterations {
            Some(cap) => scheduler.with_iteration_cap(cap),
            None => Ok(scheduler),
        }
    }

    /// Bound the number of transmissions a single burst may issue.
    ///
    /// The cap must allow at least `max_transmissions`, so it only ever
    /// trips while a real message is pending.
    pub fn with_iteration_cap(mut self, cap: u64) -> Result<Self> {
        if cap < *self.transmissions.end() {
            return Err(GhostError::invalid(format!(
                "max_burst_iterations ({cap}) is below max_transmissions ({})",
                self.transmissions.end()
            )));
        }
        self.iteration_cap = Some(cap);
        Ok(self)
    }

    /// Tree builder used for each transmission
    pub fn builder(&self) -> &RouteTreeBuilder {
        &self.builder
    }

    /// Configured iteration cap, if any
    pub fn iteration_cap(&self) -> Option<u64> {
        self.iteration_cap
    }

    /// Run one burst.
    pub fn run<R: Rng + ?Sized>(
        &self,
        requires_real: bool,
        tracker: &mut FrequencyTracker,
        rng: &mut R,
    ) -> Result<BurstOutcome> {
        let target = rng.gen_range(self.transmissions.clone());
        let mut state = BurstState::new(target, requires_real);
        let mut outcome = BurstOutcome::default();

        while !state.is_complete() {
            if let Some(cap) = self.iteration_cap {
                if state.issued() >= cap {
                    tracing::warn!(
                        issued = state.issued(),
                        cap,
                        "burst hit iteration cap with real message pending"
                    );
                    return Err(GhostError::NonConvergentBurst {
                        issued: state.issued(),
                        cap,
                    });
                }
            }

            let carries_real = state.may_carry_real(self.real_limit) && rng.gen::<bool>();
            let tree = self.builder.build(carries_real, tracker, rng)?;
            outcome.emitted.extend(tree.recipients());
            state.record(carries_real);
            outcome.last = Some(tree);
        }

        outcome.transmissions = state.issued();
        outcome.real_sent = state.real_sent();
        tracing::debug!(
            planned = target,
            issued = outcome.transmissions,
            real_sent = outcome.real_sent,
            emitted = outcome.emitted.len(),
            "burst complete"
        );
        Ok(outcome)
    }
}

impl RouteStrategy for BurstScheduler {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Tree
    }

    fn run_burst(
        &self,
        requires_real: bool,
        tracker: &mut FrequencyTracker,
        rng: &mut dyn RngCore,
    ) -> Result<BurstOutcome> {
        self.run(requires_real, tracker, rng)
    }
}
