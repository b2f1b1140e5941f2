//! Simulation runs.
//!
//! A [`Simulation`] owns everything one run needs: its own frequency
//! tracker, its own seeded RNG and one burst strategy. Nothing is shared
//! between runs, so independent runs can go in parallel
//! ([`run_sessions`]) and are only combined after all of them finish.
//!
//! Each cycle:
//!
//! 1. flip a coin (`real_probability`) for whether this burst wants the real
//!    message;
//! 2. if frequency gating is on and the real recipient is currently above
//!    its randomized threshold, send no real message this cycle;
//! 3. run one burst and append its recipients to the run's emitted sequence.

mod report;

pub use report::RunReport;

use std::time::{SystemTime, UNIX_EPOCH};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::Config;
use crate::decoy::{BurstOutcome, FrequencyTracker, RecipientId, RouteStrategy};
use crate::error::{GhostError, Result};

/// One simulation run
pub struct Simulation {
    config: Config,
    seed: u64,
    rng: StdRng,
    tracker: FrequencyTracker,
    strategy: Box<dyn RouteStrategy>,
    emitted: Vec<RecipientId>,
    cycles: u64,
    bursts_with_real: u64,
    gated: u64,
    transmissions: u64,
    real_sent: u64,
}

impl Simulation {
    /// Create a run, validating the configuration
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let strategy = config.simulation.strategy.build(&config.decoy)?;
        let seed = config.simulation.seed.unwrap_or_else(time_seed);

        Ok(Self {
            seed,
            rng: StdRng::seed_from_u64(seed),
            tracker: FrequencyTracker::new(),
            strategy,
            emitted: Vec::new(),
            cycles: 0,
            bursts_with_real: 0,
            gated: 0,
            transmissions: 0,
            real_sent: 0,
            config,
        })
    }

    /// Seed this run was created from
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Run configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Frequency history so far
    pub fn tracker(&self) -> &FrequencyTracker {
        &self.tracker
    }

    /// Recipients emitted so far, in order
    pub fn emitted(&self) -> &[RecipientId] {
        &self.emitted
    }

    /// Real messages sent so far
    pub fn real_messages_sent(&self) -> u64 {
        self.real_sent
    }

    /// Run a single cycle (one burst)
    pub fn run_cycle(&mut self) -> Result<BurstOutcome> {
        let decoy = &self.config.decoy;
        let sim = &self.config.simulation;
        let real = decoy.real();

        let mut requires_real = self.rng.gen_bool(sim.real_probability);
        if requires_real
            && sim.gate_on_frequency
            && self
                .tracker
                .is_above_threshold(real, decoy.max_deviation, &mut self.rng)
        {
            tracing::debug!(cycle = self.cycles, "real recipient conspicuous, holding real message");
            requires_real = false;
            self.gated += 1;
        }

        let outcome = self
            .strategy
            .run_burst(requires_real, &mut self.tracker, &mut self.rng)?;

        self.cycles += 1;
        if requires_real {
            self.bursts_with_real += 1;
        }
        self.transmissions += outcome.transmissions;
        self.real_sent += u64::from(outcome.real_sent);
        self.emitted.extend_from_slice(&outcome.emitted);

        Ok(outcome)
    }

    /// Run all configured cycles and produce the report
    pub fn run(mut self) -> Result<RunReport> {
        tracing::info!(
            seed = self.seed,
            strategy = %self.strategy.kind(),
            cycles = self.config.simulation.cycles,
            "starting simulation run"
        );

        for _ in 0..self.config.simulation.cycles {
            self.run_cycle()?;
        }

        let report = self.into_report();
        tracing::info!(
            emitted = report.emitted_count(),
            real_sent = report.real_messages_sent,
            transmissions = report.transmissions,
            "simulation run complete"
        );
        Ok(report)
    }

    /// Snapshot the run as a report
    pub fn into_report(self) -> RunReport {
        let real = self.config.decoy.real();
        RunReport {
            strategy: self.strategy.kind(),
            seed: self.seed,
            cycles: self.cycles,
            bursts_with_real: self.bursts_with_real,
            gated: self.gated,
            transmissions: self.transmissions,
            real_messages_sent: self.real_sent,
            real_recipient: real,
            real_recipient_frequency: self.tracker.frequency(real),
            mean_frequency: self.tracker.mean_frequency(),
            emitted: self.emitted,
        }
    }
}

/// Run `sessions` independent simulations in parallel.
///
/// Session `i` is seeded `base + i`, where `base` is the configured seed or a
/// time-derived one. Reports come back in session order once every session
/// has finished.
pub fn run_sessions(config: &Config, sessions: usize) -> Result<Vec<RunReport>> {
    config.validate()?;
    let base = config.simulation.seed.unwrap_or_else(time_seed);

    std::thread::scope(|scope| {
        let handles: Vec<_> = (0..sessions)
            .map(|i| {
                let mut session_config = config.clone();
                session_config.simulation.seed = Some(base.wrapping_add(i as u64));
                scope.spawn(move || Simulation::new(session_config)?.run())
            })
            .collect();

        handles
            .into_iter()
            .enumerate()
            .map(|(i, handle)| match handle.join() {
                Ok(result) => result,
                Err(_) => Err(GhostError::SessionFailed(i)),
            })
            .collect()
    })
}

fn time_seed() -> u64 {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default();
    tracing::info!(seed = millis, "no seed configured, using wall clock");
    millis
}
