//! Configuration management.
//!
//! Supports configuration from:
//! - TOML config files
//! - Environment variables
//! - CLI arguments (for the `ghost` binary)
//!
//! Every engine constructor validates the decoy section again, so an invalid
//! configuration fails before the first tree is built.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::decoy::{
    RecipientId, RecipientUniverse, StrategyKind, DEFAULT_MAX_DEVIATION, DEFAULT_REAL_PER_BURST,
};
use crate::error::{GhostError, Result};

/// Main configuration struct
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Route generation parameters
    #[serde(default)]
    pub decoy: DecoyConfig,

    /// Run driver parameters
    #[serde(default)]
    pub simulation: SimulationConfig,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let content = std::fs::read_to_string(&path)
            .map_err(|e| GhostError::Config(format!("Failed to read config file: {e}")))?;

        toml::from_str(&content)
            .map_err(|e| GhostError::Config(format!("Failed to parse config: {e}")))
    }

    /// Default config file location (`<config dir>/ghost/config.toml`)
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("ghost").join("config.toml"))
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self::default().apply_env()
    }

    /// Override fields from `GHOST_*` environment variables
    pub fn apply_env(mut self) -> Self {
        if let Some(seed) = env_parse("GHOST_SEED") {
            self.simulation.seed = Some(seed);
        }
        if let Some(cycles) = env_parse("GHOST_CYCLES") {
            self.simulation.cycles = cycles;
        }
        if let Some(strategy) = env_parse("GHOST_STRATEGY") {
            self.simulation.strategy = strategy;
        }
        if let Some(size) = env_parse("GHOST_UNIVERSE_SIZE") {
            self.decoy.universe_size = size;
        }
        if let Some(real) = env_parse("GHOST_REAL_RECIPIENT") {
            self.decoy.real_recipient = real;
        }
        if let Some(cap) = env_parse("GHOST_MAX_BURST_ITERATIONS") {
            self.decoy.max_burst_iterations = Some(cap);
        }

        self
    }

    /// Validate both sections
    pub fn validate(&self) -> Result<()> {
        self.decoy.validate()?;
        self.simulation.validate()
    }

    /// Render as TOML
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    let raw = std::env::var(key).ok()?;
    match raw.parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!("Ignoring unparsable {key}={raw}");
            None
        }
    }
}

/// Route generation parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecoyConfig {
    /// Number of candidate recipients (ids `1..=N`)
    pub universe_size: u32,

    /// Minimum hop depth per transmission
    pub min_hops: u32,

    /// Maximum hop depth per transmission
    pub max_hops: u32,

    /// Maximum children per hop
    pub max_branching: u32,

    /// Minimum transmissions per burst
    pub min_transmissions: u64,

    /// Maximum transmissions per burst
    pub max_transmissions: u64,

    /// Real recipient id
    pub real_recipient: u32,

    /// Maximum relative deviation of the randomized threshold
    pub max_deviation: f64,

    /// Real messages allowed per burst
    pub real_per_burst: u32,

    /// Transmissions a burst may issue before it is declared non-convergent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_burst_iterations: Option<u64>,
}

impl Default for DecoyConfig {
    fn default() -> Self {
        Self {
            universe_size: 1000,
            min_hops: 1,
            max_hops: 4,
            max_branching: 2,
            min_transmissions: 1,
            max_transmissions: 2,
            real_recipient: 15,
            max_deviation: DEFAULT_MAX_DEVIATION,
            real_per_burst: DEFAULT_REAL_PER_BURST,
            max_burst_iterations: None,
        }
    }
}

impl DecoyConfig {
    /// Reject configurations no engine can run
    pub fn validate(&self) -> Result<()> {
        if self.universe_size == 0 {
            return Err(GhostError::invalid("universe_size must be at least 1"));
        }
        if self.min_hops == 0 {
            return Err(GhostError::invalid("min_hops must be at least 1"));
        }
        if self.min_hops > self.max_hops {
            return Err(GhostError::invalid(format!(
                "min_hops ({}) exceeds max_hops ({})",
                self.min_hops, self.max_hops
            )));
        }
        if self.max_branching == 0 {
            return Err(GhostError::invalid("max_branching must be at least 1"));
        }
        if self.min_transmissions > self.max_transmissions {
            return Err(GhostError::invalid(format!(
                "min_transmissions ({}) exceeds max_transmissions ({})",
                self.min_transmissions, self.max_transmissions
            )));
        }
        if self.real_recipient == 0 || self.real_recipient > self.universe_size {
            return Err(GhostError::invalid(format!(
                "real_recipient ({}) is outside the universe 1..={}",
                self.real_recipient, self.universe_size
            )));
        }
        if !self.max_deviation.is_finite() || self.max_deviation < 0.0 {
            return Err(GhostError::invalid(format!(
                "max_deviation ({}) must be a non-negative number",
                self.max_deviation
            )));
        }
        if self.real_per_burst == 0 {
            return Err(GhostError::invalid("real_per_burst must be at least 1"));
        }
        if let Some(cap) = self.max_burst_iterations {
            if cap < self.max_transmissions {
                return Err(GhostError::invalid(format!(
                    "max_burst_iterations ({cap}) is below max_transmissions ({})",
                    self.max_transmissions
                )));
            }
        }
        Ok(())
    }

    /// Candidate universe
    pub fn universe(&self) -> Result<RecipientUniverse> {
        RecipientUniverse::new(self.universe_size)
    }

    /// Real recipient id
    pub fn real(&self) -> RecipientId {
        RecipientId(self.real_recipient)
    }
}

/// Run driver parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Bursts to run (one per cycle)
    pub cycles: u64,

    /// Burst strategy
    pub strategy: StrategyKind,

    /// RNG seed; a time-derived seed is used (and logged) when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,

    /// Probability that a cycle wants to send the real message
    pub real_probability: f64,

    /// Skip the real message while the real recipient is above threshold
    pub gate_on_frequency: bool,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            cycles: 100,
            strategy: StrategyKind::Tree,
            seed: None,
            real_probability: 0.5,
            gate_on_frequency: true,
        }
    }
}

impl SimulationConfig {
    /// Reject unusable driver settings
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.real_probability) {
            return Err(GhostError::invalid(format!(
                "real_probability ({}) must be within [0, 1]",
                self.real_probability
            )));
        }
        Ok(())
    }
}
