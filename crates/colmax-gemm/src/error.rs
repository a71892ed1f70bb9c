//! Error types for colmax-gemm.

use thiserror::Error;

/// Errors raised while configuring a kernel or moving words on a stream.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// Matrix dimensions do not agree (e.g. R_b != C_a, buffer too short).
    #[error("Dimension mismatch: {0}")]
    DimensionMismatch(String),

    /// A dimension is not an exact multiple of the block shape.
    #[error("Block shape error: {0}")]
    BlockShape(String),

    /// The stream closed on a message boundary.
    #[error("Stream closed")]
    StreamClosed,

    /// The stream closed part-way through a fixed-length payload.
    #[error("Unexpected end of stream: expected {expected} words, got {got}")]
    UnexpectedEnd { expected: usize, got: usize },

    /// The stream closed before an end-of-message flag was seen.
    #[error("Stream closed after {0} words without end-of-message")]
    UnterminatedMessage(usize),

    /// A packet header word failed its odd-parity check.
    #[error("Packet header parity check failed: {0:#010x}")]
    HeaderParity(u32),
}

/// Result type for colmax-gemm operations.
pub type Result<T> = std::result::Result<T, Error>;
