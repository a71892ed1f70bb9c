//! Error types for the distribution fabric.

use thiserror::Error;

/// Errors raised while building a topology or moving messages through it.
#[derive(Debug, Error)]
pub enum FabricError {
    /// A kernel or stream error inside one unit or feeder.
    #[error(transparent)]
    Stream(#[from] colmax_gemm::Error),

    /// A split message named an instance the topology does not have.
    #[error("Packet id {id} has no instance (topology has {instances})")]
    Unroutable { id: u8, instances: usize },

    /// The topology configuration is unusable.
    #[error("Invalid topology: {0}")]
    Config(String),

    /// A worker thread could not be started.
    #[error("Failed to spawn compute unit {index}: {source}")]
    Spawn {
        index: usize,
        #[source]
        source: std::io::Error,
    },

    /// A unit, feeder or collector thread panicked.
    #[error("{0} panicked")]
    Panicked(String),
}

/// Result type for fabric operations.
pub type Result<T> = std::result::Result<T, FabricError>;
