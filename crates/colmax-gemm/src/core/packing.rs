//! Conversion between row-major matrices and the pre-blocked layout.
//!
//! The kernels read A and B as sequences of contiguous blocks in
//! block-row-major order, each block itself row-major:
//!
//! ```text
//! 4x4 matrix, 2x2 blocks:
//!
//!  a b | c d          [a b e f] [c d g h] [i j m n] [k l o p]
//!  e f | g h   ──►     block 0   block 1   block 2   block 3
//!  ----+----
//!  i j | k l
//!  m n | o p
//! ```
//!
//! Producers must emit operand streams in this order; the kernels never
//! reorder, and a mismatch silently corrupts the result.

use super::kernel::BlockShape;

/// Position of element `(row, col)` of a `rows × cols` matrix in its
/// `br × bc` blocked layout.
#[inline]
pub fn blocked_offset(row: usize, col: usize, cols: usize, br: usize, bc: usize) -> usize {
    let col_blocks = cols / bc;
    let (bi, r) = (row / br, row % br);
    let (bj, c) = (col / bc, col % bc);
    (bi * col_blocks + bj) * br * bc + r * bc + c
}

/// Rearrange a row-major `rows × cols` matrix into `br × bc` blocks.
///
/// # Panics
/// If `src.len() != rows * cols` or the block shape does not divide the
/// matrix.
pub fn pack_blocked<T: Copy + Default>(
    src: &[T],
    rows: usize,
    cols: usize,
    br: usize,
    bc: usize,
) -> Vec<T> {
    let mut dst = vec![T::default(); rows * cols];
    pack_blocked_into(src, rows, cols, br, bc, &mut dst);
    dst
}

/// [`pack_blocked`] into a caller-provided buffer.
pub fn pack_blocked_into<T: Copy>(
    src: &[T],
    rows: usize,
    cols: usize,
    br: usize,
    bc: usize,
    dst: &mut [T],
) {
    check_layout(src.len(), rows, cols, br, bc);
    assert_eq!(dst.len(), rows * cols, "destination size mismatch");

    for r in 0..rows {
        for c in 0..cols {
            dst[blocked_offset(r, c, cols, br, bc)] = src[r * cols + c];
        }
    }
}

/// Inverse of [`pack_blocked`].
pub fn unpack_blocked<T: Copy + Default>(
    src: &[T],
    rows: usize,
    cols: usize,
    br: usize,
    bc: usize,
) -> Vec<T> {
    check_layout(src.len(), rows, cols, br, bc);

    let mut dst = vec![T::default(); rows * cols];
    for r in 0..rows {
        for c in 0..cols {
            dst[r * cols + c] = src[blocked_offset(r, c, cols, br, bc)];
        }
    }
    dst
}

/// Pack a row-major A (`rows × cols`) into M×K blocks of shape `S`.
pub fn pack_a<S: BlockShape, T: Copy + Default>(a: &[T], rows: usize, cols: usize) -> Vec<T> {
    pack_blocked(a, rows, cols, S::M, S::K)
}

/// Pack a row-major B (`rows × cols`) into K×N blocks of shape `S`.
pub fn pack_b<S: BlockShape, T: Copy + Default>(b: &[T], rows: usize, cols: usize) -> Vec<T> {
    pack_blocked(b, rows, cols, S::K, S::N)
}

/// Unpack a blocked C (`rows × cols`, M×N blocks of shape `S`) to row-major.
pub fn unpack_c<S: BlockShape, T: Copy + Default>(c: &[T], rows: usize, cols: usize) -> Vec<T> {
    unpack_blocked(c, rows, cols, S::M, S::N)
}

fn check_layout(len: usize, rows: usize, cols: usize, br: usize, bc: usize) {
    assert_eq!(
        len,
        rows * cols,
        "matrix size mismatch: expected {}x{} = {}, got {}",
        rows,
        cols,
        rows * cols,
        len
    );
    assert!(br > 0 && bc > 0, "block extents must be non-zero");
    assert!(
        rows % br == 0 && cols % bc == 0,
        "{}x{} blocks do not divide a {}x{} matrix",
        br,
        bc,
        rows,
        cols
    );
}
