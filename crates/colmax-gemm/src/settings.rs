//! Deployment constants.
//!
//! These fix the problem size of the reference deployment: a 128-row query
//! batch with 32-dimensional embeddings against 32 reference columns per
//! compute unit, multiplied with the 4×2×4 block MAC.

use crate::core::{BlockShape, Dims, Mmul4x2x4};

/// Query batch rows (R_a).
pub const F_RA: usize = 128;
/// Embedding width (C_a).
pub const F_CA: usize = 32;
/// Rows of B; always equal to [`F_CA`].
pub const F_RB: usize = F_CA;
/// Reference columns per compute unit (C_b).
pub const F_CB: usize = 32;
/// Rows of the full product.
pub const F_RC: usize = F_RA;
/// Columns of the full product, and the length of one result message.
pub const F_CC: usize = F_CB;

/// Block shape of the deployed MAC unit.
pub type DefaultShape = Mmul4x2x4;

/// Message type written into every result header.
pub const PACKET_TYPE: u8 = 0;

/// Compute units in the reference topology.
pub const DEFAULT_INSTANCES: usize = 6;

/// Elements per vector in the dot-product scan.
pub const SCAN_QUERY_LEN: usize = 16;
/// Reference vectors per scan invocation.
pub const SCAN_REFERENCES: usize = 256;
/// References held at once when a scan is fed in blocks.
pub const SCAN_BLOCK: usize = 128;

const _: () = {
    let (m, k, n) = (
        <DefaultShape as BlockShape>::M,
        <DefaultShape as BlockShape>::K,
        <DefaultShape as BlockShape>::N,
    );
    assert!(F_RB == F_CA, "R_b must equal C_a");
    assert!(F_RA % m == 0, "M must divide R_a");
    assert!(F_CA % k == 0, "K must divide C_a");
    assert!(F_CB % n == 0, "N must divide C_b");
    assert!(SCAN_REFERENCES % SCAN_BLOCK == 0, "scan block must divide reference count");
};

/// Dimensions of one deployed invocation.
pub const fn default_dims() -> Dims {
    Dims::product(F_RA, F_CA, F_CB)
}
