//! G.H.O.S.T. error types.
//!
//! The simulation is closed-form: once a configuration has been validated,
//! every random draw is over a well-formed bounded range. What remains is
//! configuration failures up front and the one liveness failure a burst can
//! hit when it is given an iteration cap.
//!
//! Neutral conditions (an empty frequency history, an unseen recipient) are
//! answered with zero/false and are not errors.

use thiserror::Error;

/// G.H.O.S.T. simulation errors.
#[derive(Error, Debug)]
pub enum GhostError {
    /// Configuration rejected before any tree was built.
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// A burst requiring a real message hit its iteration cap before the
    /// real message was sent.
    #[error("Burst did not converge: {issued} transmissions issued, cap {cap}, real message still pending")]
    NonConvergentBurst {
        /// Transmissions issued when the cap was reached.
        issued: u64,
        /// Configured iteration cap.
        cap: u64,
    },

    /// A parallel simulation session panicked.
    #[error("Session {0} failed to complete")]
    SessionFailed(usize),

    /// Configuration file error.
    #[error("Config error: {0}")]
    Config(String),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for G.H.O.S.T. operations
pub type Result<T> = std::result::Result<T, GhostError>;

impl GhostError {
    /// Shorthand for an [`GhostError::InvalidConfiguration`] error.
    pub fn invalid(msg: impl Into<String>) -> Self {
        GhostError::InvalidConfiguration(msg.into())
    }

    /// Whether this error reports a burst that failed to converge.
    pub fn is_non_convergent(&self) -> bool {
        matches!(self, GhostError::NonConvergentBurst { .. })
    }
}

impl From<toml::de::Error> for GhostError {
    fn from(err: toml::de::Error) -> Self {
        GhostError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for GhostError {
    fn from(err: toml::ser::Error) -> Self {
        GhostError::Config(err.to_string())
    }
}
