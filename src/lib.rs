//! # G.H.O.S.T. - Decoy Route-Tree Simulator
//!
//! Statistical model of recipient-anonymous messaging by decoy routing. A
//! sender hides one real message to one recipient by also generating many
//! decoy messages to other recipients, structured as branching multi-hop
//! forwarding trees. An observer who only sees recipient ids on the wire
//! should not be able to single out the real recipient, even after many
//! bursts (frequency and intersection attacks).
//!
//! No transport, cryptography or delivery is modelled: only who gets
//! addressed, and how often.
//!
//! ## Architecture
//!
//! ```text
//!  Simulation (one run: tracker + seeded RNG + strategy)
//!      │
//!      │  per cycle: coin for real message, frequency gate
//!      v
//!  RouteStrategy ─────────────┬──────────────────────────────┐
//!      │ Tree                 │                              │ Batch
//!      v                      │                              v
//!  BurstScheduler             │                        BatchGenerator
//!      │ per transmission     │                        (B^H flat slots)
//!      v                      │                              │
//!  RouteTreeBuilder ──> DecoySelector                        │
//!      │                      │                              │
//!      └──────────> FrequencyTracker <───────────────────────┘
//! ```
//!
//! ### Burst loop
//!
//! ```text
//!     [Issuing] ── issued >= target && real satisfied ──> [Done]
//!        │  ^
//!        └──┘ one transmission (coin decides if it carries the real message)
//!        │
//!        │ iteration cap reached, real pending
//!        v
//!     NonConvergentBurst
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use ghost::{Config, Simulation, StrategyKind};
//!
//! let mut config = Config::default();
//! config.decoy.universe_size = 100;
//! config.simulation.seed = Some(42);
//! config.simulation.strategy = StrategyKind::Tree;
//!
//! let report = Simulation::new(config)?.run()?;
//! println!("{} recipients emitted, {} real", report.emitted_count(), report.real_messages_sent);
//! ```
//!
//! ### Building a single tree
//!
//! ```rust,ignore
//! use ghost::decoy::{DecoySelector, FrequencyTracker, RecipientId, RecipientUniverse, RouteTreeBuilder};
//! use rand::SeedableRng;
//!
//! let builder = RouteTreeBuilder::new(
//!     RecipientUniverse::new(10)?,
//!     RecipientId(5),
//!     3, 3, 1,
//!     DecoySelector::default(),
//! )?;
//! let mut tracker = FrequencyTracker::new();
//! let mut rng = rand::rngs::StdRng::seed_from_u64(7);
//! let tree = builder.build(true, &mut tracker, &mut rng)?;
//! assert_eq!(tree.real_count(), 1);
//! ```
//!
//! ## Modules
//!
//! - [`decoy`]: route generation engine
//! - [`simulation`]: run driver and reports
//! - [`config`]: Configuration management
//! - [`error`]: Error types and result aliases

pub mod config;
pub mod decoy;
pub mod error;
pub mod simulation;

// Re-exports for convenience
pub use config::{Config, DecoyConfig, SimulationConfig};
pub use decoy::{
    BatchGenerator, BurstOutcome, BurstScheduler, DecoySelector, FrequencyTracker, RecipientId,
    RecipientUniverse, RouteNode, RouteStrategy, RouteTree, RouteTreeBuilder, StrategyKind,
};
pub use error::{GhostError, Result};
pub use simulation::{run_sessions, RunReport, Simulation};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
