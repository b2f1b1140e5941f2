//! Decoy route generation engine.
//!
//! A sender hides one real message among many decoys, arranged as branching
//! multi-hop forwarding trees. An observer who only sees recipient ids on the
//! wire should not be able to single out the real recipient, even across many
//! bursts.
//!
//! ## Components
//!
//! - [`RecipientUniverse`]: ordered candidate ids `1..=N`
//! - [`FrequencyTracker`]: per-run occurrence counts and randomized thresholds
//! - [`DecoySelector`]: decoy picks biased away from a conspicuous real recipient
//! - [`RouteTreeBuilder`]: one transmission's forwarding tree
//! - [`BurstScheduler`]: repeated transmissions until the real message is out
//! - [`BatchGenerator`]: flat `B^H` fast path with the same contract
//!
//! ## Data flow
//!
//! ```text
//! Simulation ──> RouteStrategy ──┬─> BurstScheduler ─> RouteTreeBuilder ─> DecoySelector
//!                                │                            │
//!                                └─> BatchGenerator           v
//!                                          │           FrequencyTracker
//!                                          └────────────────> ^
//! ```
//!
//! Everything is single-threaded and driven by an explicitly passed RNG.

pub mod batch;
pub mod burst;
pub mod frequency;
pub mod selector;
pub mod strategy;
pub mod tree;
pub mod universe;

pub use batch::{packets_per_message, BatchGenerator};
pub use burst::{BurstOutcome, BurstScheduler, BurstState};
pub use frequency::FrequencyTracker;
pub use selector::{select_fake, DecoySelector};
pub use strategy::{RouteStrategy, StrategyKind};
pub use tree::{HopKind, RouteNode, RouteTree, RouteTreeBuilder};
pub use universe::{RecipientId, RecipientUniverse};

/// Default maximum threshold deviation
pub const DEFAULT_MAX_DEVIATION: f64 = 0.1;

/// Default real messages allowed per burst
pub const DEFAULT_REAL_PER_BURST: u32 = 1;
