//! Error types for the simulation harness.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A line that should hold a number does not.
    #[error("line {line}: cannot parse {text:?}")]
    Parse { line: usize, text: String },

    /// Input files disagree with the configured topology.
    #[error("Malformed input: {0}")]
    Format(String),

    #[error(transparent)]
    Gemm(#[from] colmax_gemm::Error),

    #[error(transparent)]
    Fabric(#[from] colmax_fabric::FabricError),
}

impl SimError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, SimError>;
