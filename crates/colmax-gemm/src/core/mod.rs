//! Blocked multiply-reduce kernels.
//!
//! Every kernel in this module is built from one primitive, a fixed-shape
//! block multiply-accumulate ([`BlockMac`]), iterated over a grid of block
//! coordinates:
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │ for (z, j) in grid.blocks(order)        (row blocks × col blocks)
//! │   Cblk = A(z,0) · B(0,j)                          mul
//! │   for i in 1..kBlocks: Cblk += A(z,i) · B(i,j)    mac
//! │   ├─ colmax: colMax[j*N..] = max(colMax, max_m Cblk)
//! │   └─ gemm:   C(z,j) = Cblk
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Pre-blocked layout
//!
//! A is stored as `rowBlocks × kBlocks` contiguous M×K blocks and B as
//! `kBlocks × colBlocks` contiguous K×N blocks, both block-row-major. The
//! [`packing`] helpers convert to and from row-major.
//!
//! # Module Contents
//!
//! - [`kernel`]: [`BlockShape`], [`BlockMac`] and the portable [`Mmul`]
//! - [`tiling`]: [`Dims`], [`BlockGrid`], [`LoopOrder`]
//! - [`packing`]: row-major ⇄ blocked conversion
//! - [`colmax`]: fused multiply + column max
//! - [`gemm`]: plain blocked GEMM
//! - [`scan`]: single-query dot-product scan with argmax, on slices or streams
//! - [`reference`]: naive triple-loop references
//! - [`workspace`]: reusable buffers for long-running units

pub mod colmax;
pub mod gemm;
pub mod kernel;
pub mod packing;
pub mod reference;
pub mod scan;
pub mod tiling;
pub mod workspace;

pub use colmax::{colmax_blocked, colmax_blocked_with_scratch, compute_block, fold_block, ColMaxReducer};
pub use gemm::gemm_blocked;
pub use kernel::{BlockMac, BlockShape, Mmul, Mmul4x2x4};
pub use packing::{
    blocked_offset, pack_a, pack_b, pack_blocked, pack_blocked_into, unpack_blocked, unpack_c,
};
pub use reference::{naive_colmax, naive_matmul};
pub use scan::{dot, dot_scan, scan_stream, DotScan, ScanResult};
pub use tiling::{BlockGrid, BlockIterator, Dims, LoopOrder};
pub use workspace::Workspace;
