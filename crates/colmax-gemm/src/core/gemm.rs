//! Plain blocked GEMM: the same tiling, writing every output block.

use super::colmax::compute_block;
use super::kernel::BlockMac;
use super::tiling::{BlockGrid, LoopOrder};
use crate::types::Element;

/// `C = A × B` over pre-blocked operands, with C written as
/// `rowBlocks × colBlocks` contiguous M×N blocks.
///
/// Use [`unpack_c`](super::unpack_c) to recover a row-major C.
///
/// # Panics
/// If a buffer length does not match the grid.
pub fn gemm_blocked<T: Element, S: BlockMac<T>>(
    grid: &BlockGrid<S>,
    a: &[T],
    b: &[T],
    c: &mut [T],
    order: LoopOrder,
) {
    let dims = grid.dims();
    assert_eq!(a.len(), dims.a_len(), "A dimensions mismatch");
    assert_eq!(b.len(), dims.b_len(), "B dimensions mismatch");
    assert_eq!(c.len(), dims.c_len(), "C dimensions mismatch");

    for (z, j) in grid.blocks(order) {
        let off = grid.c_block_offset(z, j);
        compute_block(grid, a, b, z, j, &mut c[off..off + S::SIZE_C]);
    }
}
