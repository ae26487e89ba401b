//! Coterie error types

use thiserror::Error;

/// Errors that can occur while building or driving a topology
#[derive(Debug, Error)]
pub enum CoterieError {
    /// Multiplexing substrate not installed or not reachable
    #[error("Multiplexer unavailable: {0}")]
    SubstrateUnavailable(String),

    /// A session or pane could not be created
    #[error("Topology error in session '{session}': {reason}")]
    Topology { session: String, reason: String },

    /// Text or a key could not be delivered to a pane
    #[error("Delivery failed for pane '{pane}': {reason}")]
    Delivery { pane: String, reason: String },

    /// Invalid topology descriptor or configuration file
    #[error("Configuration error: {0}")]
    Config(String),

    /// Filesystem error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
