//! Fused blocked matrix multiply with column-max reduction.
//!
//! Given a query batch `A` (`R_a × C_a`) and a reference matrix `B`
//! (`C_a × C_b`), this crate computes
//!
//! ```text
//! colMax[c] = max_r Σ_k A[r][k] · B[k][c]
//! ```
//!
//! without ever holding the full product: the product is produced one
//! M×N block at a time by a fixed-shape block MAC and folded straight into
//! the running column maxima.
//!
//! # Quick Start
//!
//! ```
//! use colmax_gemm::colmax_matmul;
//!
//! // 4x2 queries, 2x4 references
//! let a = vec![1.0f32, 0.0, 0.0, 1.0, 1.0, 1.0, -1.0, 2.0];
//! let b = vec![1.0f32, 2.0, 3.0, 4.0, 0.5, -1.0, 0.0, 2.0];
//!
//! let col_max = colmax_matmul(&a, 4, 2, &b, 4).unwrap();
//! assert_eq!(col_max, vec![1.5, 2.0, 3.0, 6.0]);
//! ```
//!
//! # Crate Layout
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`types`] | Element and wire scalars |
//! | [`core`] | Block MAC, tiling, packing, kernels, dot-product scan |
//! | [`stream`] | Words, packet headers, operand ingest, result emission |
//! | [`settings`] | Deployment constants |
//!
//! The top-level functions ([`colmax_matmul`], [`blocked_matmul`],
//! [`ColMaxGemm`], [`colmax_matmul_batched`]) take row-major or
//! pre-blocked operands and hide the grid bookkeeping.
//!
//! # Features
//!
//! - `parallel` (default): batched entry points run on rayon.

pub mod core;
pub mod settings;
pub mod stream;
pub mod types;

mod api;
mod error;

pub use api::{blocked_matmul, colmax_matmul, colmax_matmul_batched, colmax_matmul_with_shape, ColMaxGemm};
pub use error::{Error, Result};

pub use crate::core::{
    colmax_blocked, dot_scan, gemm_blocked, naive_colmax, naive_matmul, scan_stream, BlockGrid, BlockMac,
    BlockShape, ColMaxReducer, Dims, DotScan, LoopOrder, Mmul, Mmul4x2x4, ScanResult, Workspace,
};
pub use crate::types::{Element, WireCodec, WireWord};
