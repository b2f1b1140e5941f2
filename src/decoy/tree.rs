//! Branching route trees for a single transmission.
//!
//! A transmission is a forwarding tree of hops. Every hop is a decoy except,
//! for transmissions designated to carry the real message, exactly one hop
//! at a depth chosen up front.
//!
//! ```text
//! depth 1             [d]
//!                    /   \
//! depth 2         [d]     [R]   <- real_depth = 2, first node reached wins
//!                /   \      \
//! depth 3      [d]   [d]    [d]
//! ```
//!
//! Construction is depth-first and records each hop into the run's
//! [`FrequencyTracker`] as soon as the hop exists, so later hops (in this and
//! every following transmission) see it.

use std::ops::RangeInclusive;

use rand::Rng;

use super::frequency::FrequencyTracker;
use super::selector::DecoySelector;
use super::universe::{RecipientId, RecipientUniverse};
use crate::config::DecoyConfig;
use crate::error::{GhostError, Result};

/// Role of a hop in a transmission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HopKind {
    /// The hop delivering the real message
    Real,
    /// A decoy hop
    Decoy,
}

/// One hop of a forwarding tree. Owns its subtree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteNode {
    recipient: RecipientId,
    kind: HopKind,
    depth: u32,
    children: Vec<RouteNode>,
}

impl RouteNode {
    fn new(recipient: RecipientId, kind: HopKind, depth: u32) -> Self {
        Self {
            recipient,
            kind,
            depth,
            children: Vec::new(),
        }
    }

    /// Recipient addressed at this hop
    pub fn recipient(&self) -> RecipientId {
        self.recipient
    }

    /// Whether this hop is real or a decoy
    pub fn kind(&self) -> HopKind {
        self.kind
    }

    /// Whether this hop carries the real message
    pub fn is_real(&self) -> bool {
        self.kind == HopKind::Real
    }

    /// Depth of this hop, root is 1
    pub fn depth(&self) -> u32 {
        self.depth
    }

    /// Next hops
    pub fn children(&self) -> &[RouteNode] {
        &self.children
    }

    /// Pre-order traversal of this subtree (creation order)
    pub fn iter(&self) -> Nodes<'_> {
        Nodes { stack: vec![self] }
    }

    /// Number of hops in this subtree
    pub fn node_count(&self) -> usize {
        self.iter().count()
    }

    /// Deepest hop in this subtree
    pub fn max_depth(&self) -> u32 {
        self.iter().map(RouteNode::depth).max().unwrap_or(self.depth)
    }
}

/// Pre-order iterator over a [`RouteNode`] subtree
#[derive(Debug)]
pub struct Nodes<'a> {
    stack: Vec<&'a RouteNode>,
}

impl<'a> Iterator for Nodes<'a> {
    type Item = &'a RouteNode;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children.iter().rev());
        Some(node)
    }
}

/// A single transmission: one forwarding tree plus the draws that shaped it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteTree {
    root: RouteNode,
    hop_depth: u32,
    real_depth: Option<u32>,
}

impl RouteTree {
    /// Root hop
    pub fn root(&self) -> &RouteNode {
        &self.root
    }

    /// Hop depth drawn for this transmission
    pub fn hop_depth(&self) -> u32 {
        self.hop_depth
    }

    /// Depth the real message was placed at, if this transmission carries it
    pub fn real_depth(&self) -> Option<u32> {
        self.real_depth
    }

    /// Whether this transmission was designated to carry the real message
    pub fn carries_real(&self) -> bool {
        self.real_depth.is_some()
    }

    /// All hops, in creation order
    pub fn nodes(&self) -> Nodes<'_> {
        self.root.iter()
    }

    /// Recipients of all hops, in creation order
    pub fn recipients(&self) -> impl Iterator<Item = RecipientId> + '_ {
        self.nodes().map(RouteNode::recipient)
    }

    /// Number of hops
    pub fn node_count(&self) -> usize {
        self.root.node_count()
    }

    /// Number of hops carrying the real message (0 or 1)
    pub fn real_count(&self) -> usize {
        self.nodes().filter(|n| n.is_real()).count()
    }
}

/// Builds [`RouteTree`]s over a fixed universe.
///
/// Tree size grows as `max_branching ^ hop_depth`; the builder enforces no cap
/// beyond the configured bounds.
#[derive(Debug, Clone)]
pub struct RouteTreeBuilder {
    universe: RecipientUniverse,
    real: RecipientId,
    hops: RangeInclusive<u32>,
    max_branching: u32,
    selector: DecoySelector,
}

impl RouteTreeBuilder {
    /// Create a builder, validating the bounds
    pub fn new(
        universe: RecipientUniverse,
        real: RecipientId,
        min_hops: u32,
        max_hops: u32,
        max_branching: u32,
        selector: DecoySelector,
    ) -> Result<Self> {
        if min_hops == 0 {
            return Err(GhostError::invalid("min_hops must be at least 1"));
        }
        if min_hops > max_hops {
            return Err(GhostError::invalid(format!(
                "min_hops ({min_hops}) exceeds max_hops ({max_hops})"
            )));
        }
        if max_branching == 0 {
            return Err(GhostError::invalid("max_branching must be at least 1"));
        }
        if !universe.contains(real) {
            return Err(GhostError::invalid(format!(
                "real recipient {real} is outside the universe 1..={}",
                universe.len()
            )));
        }

        Ok(Self {
            universe,
            real,
            hops: min_hops..=max_hops,
            max_branching,
            selector,
        })
    }

    /// Create a builder from a validated decoy configuration
    pub fn from_config(config: &DecoyConfig) -> Result<Self> {
        config.validate()?;
        Self::new(
            config.universe()?,
            config.real(),
            config.min_hops,
            config.max_hops,
            config.max_branching,
            DecoySelector::new(config.max_deviation),
        )
    }

    /// Candidate universe
    pub fn universe(&self) -> &RecipientUniverse {
        &self.universe
    }

    /// Real recipient
    pub fn real(&self) -> RecipientId {
        self.real
    }

    /// Build one transmission.
    ///
    /// Draws the hop depth, then (when `carries_real`) the real depth, then
    /// grows the tree depth-first. Every hop is recorded into `tracker`.
    pub fn build<R: Rng + ?Sized>(
        &self,
        carries_real: bool,
        tracker: &mut FrequencyTracker,
        rng: &mut R,
    ) -> Result<RouteTree> {
        let hop_depth = rng.gen_range(self.hops.clone());
        let real_depth = carries_real.then(|| rng.gen_range(1..=hop_depth));

        let mut placed = false;
        let root = self
            .grow(1, hop_depth, real_depth, &mut placed, tracker, rng)
            .ok_or_else(|| GhostError::invalid("hop depth drew zero levels"))?;

        let tree = RouteTree {
            root,
            hop_depth,
            real_depth,
        };
        tracing::trace!(
            hop_depth,
            ?real_depth,
            nodes = tree.node_count(),
            "built route tree"
        );
        Ok(tree)
    }

    /// Grow the subtree rooted at `depth`.
    ///
    /// `placed` is shared by the whole transmission so siblings and cousins
    /// at the real depth never duplicate the real hop.
    fn grow<R: Rng + ?Sized>(
        &self,
        depth: u32,
        hop_depth: u32,
        real_depth: Option<u32>,
        placed: &mut bool,
        tracker: &mut FrequencyTracker,
        rng: &mut R,
    ) -> Option<RouteNode> {
        if depth > hop_depth {
            return None;
        }

        let branches = rng.gen_range(1..=self.max_branching);

        let mut node = if real_depth == Some(depth) && !*placed {
            *placed = true;
            RouteNode::new(self.real, HopKind::Real, depth)
        } else {
            let decoy = self
                .selector
                .select(&self.universe, self.real, tracker, rng);
            RouteNode::new(decoy, HopKind::Decoy, depth)
        };
        tracker.record(node.recipient);

        for _ in 0..branches {
            if let Some(child) = self.grow(depth + 1, hop_depth, real_depth, placed, tracker, rng) {
                node.children.push(child);
            }
        }

        Some(node)
    }
}
