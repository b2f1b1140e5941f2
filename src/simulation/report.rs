//! Run reports.
//!
//! What a run hands to downstream analysis: the flat, time-ordered sequence of
//! every recipient emitted and how many real messages actually went out.
//! Histograms, entropy and plotting happen elsewhere.

use serde::{Deserialize, Serialize};

use crate::decoy::{RecipientId, StrategyKind};
use crate::error::Result;

/// Outcome of one simulation run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    /// Strategy used for every burst
    pub strategy: StrategyKind,
    /// Seed the run's RNG was created from
    pub seed: u64,
    /// Cycles (bursts) run
    pub cycles: u64,
    /// Bursts that were required to carry the real message
    pub bursts_with_real: u64,
    /// Real-message requests suppressed by frequency gating
    pub gated: u64,
    /// Transmissions issued across all bursts
    pub transmissions: u64,
    /// Real messages sent
    pub real_messages_sent: u64,
    /// Real recipient
    pub real_recipient: RecipientId,
    /// Occurrences of the real recipient in `emitted`
    pub real_recipient_frequency: u64,
    /// Mean occurrences per recipient seen
    pub mean_frequency: f64,
    /// Every recipient emitted, in order
    pub emitted: Vec<RecipientId>,
}

impl RunReport {
    /// Number of recipients emitted
    pub fn emitted_count(&self) -> usize {
        self.emitted.len()
    }

    /// Real recipient frequency relative to the mean (1.0 = unremarkable)
    pub fn real_exposure(&self) -> f64 {
        if self.mean_frequency == 0.0 {
            return 0.0;
        }
        self.real_recipient_frequency as f64 / self.mean_frequency
    }

    /// Serialize to JSON
    pub fn to_json(&self, pretty: bool) -> Result<String> {
        let json = if pretty {
            serde_json::to_string_pretty(self)?
        } else {
            serde_json::to_string(self)?
        };
        Ok(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report() -> RunReport {
        RunReport {
            strategy: StrategyKind::Tree,
            seed: 1,
            cycles: 2,
            bursts_with_real: 1,
            gated: 0,
            transmissions: 3,
            real_messages_sent: 1,
            real_recipient: RecipientId(5),
            real_recipient_frequency: 2,
            mean_frequency: 1.0,
            emitted: vec![RecipientId(5), RecipientId(1), RecipientId(5)],
        }
    }

    #[test]
    fn test_real_exposure() {
        let report = report();
        assert!((report.real_exposure() - 2.0).abs() < f64::EPSILON);
        assert_eq!(report.emitted_count(), 3);
    }

    #[test]
    fn test_json_uses_plain_ids() {
        let json = report().to_json(false).unwrap();
        assert!(json.contains("\"emitted\":[5,1,5]"));
        assert!(json.contains("\"strategy\":\"tree\""));

        let parsed: RunReport = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, report());
    }
}
