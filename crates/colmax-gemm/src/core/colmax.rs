//! Blocked multiply with column-max reduction.
//!
//! ```text
//! for (z, j) in blocks(order):
//!     Cblk  = A(z,0) · B(0,j)                 // mul
//!     Cblk += A(z,k) · B(k,j)  for k in 1..   // mac
//!     colMax[j*N + n] = max(colMax[j*N + n], max_m Cblk[m*N + n])
//! ```
//!
//! Only one M×N block of the product exists at any time.

use super::kernel::{BlockMac, BlockShape};
use super::tiling::{BlockGrid, LoopOrder};
use crate::types::Element;

/// Compute output block `(z, j)` of `A × B` into `cblk` (length `SIZE_C`).
///
/// With no shared blocks (`C_a == 0`) the block is all zeros.
#[inline]
pub fn compute_block<T: Element, S: BlockMac<T>>(
    grid: &BlockGrid<S>,
    a: &[T],
    b: &[T],
    z: usize,
    j: usize,
    cblk: &mut [T],
) {
    if grid.k_blocks() == 0 {
        cblk[..S::SIZE_C].fill(T::ZERO);
        return;
    }

    let a0 = grid.a_block_offset(z, 0);
    let b0 = grid.b_block_offset(0, j);
    S::mul(&a[a0..a0 + S::SIZE_A], &b[b0..b0 + S::SIZE_B], cblk);

    for i in 1..grid.k_blocks() {
        let ai = grid.a_block_offset(z, i);
        let bi = grid.b_block_offset(i, j);
        S::mac(&a[ai..ai + S::SIZE_A], &b[bi..bi + S::SIZE_B], cblk);
    }
}

/// Fold the rows of a finished M×N block into the maxima of block column `j`.
#[inline]
pub fn fold_block<T: Element, S: BlockShape>(cblk: &[T], j: usize, col_max: &mut [T]) {
    let cols = &mut col_max[j * S::N..(j + 1) * S::N];
    for (n, slot) in cols.iter_mut().enumerate() {
        let mut cur = *slot;
        for m in 0..S::M {
            cur = cur.max_of(cblk[m * S::N + n]);
        }
        *slot = cur;
    }
}

/// Column maxima of `A × B` over pre-blocked operands.
///
/// `col_max` (length `C_b`) is reset to [`Element::NEG_SENTINEL`] and then
/// receives `max_r C[r][c]` for every column `c`. Columns stay at the
/// sentinel when `R_a == 0`.
///
/// # Panics
/// If a buffer length does not match the grid.
///
/// # Example
///
/// ```
/// use colmax_gemm::core::{colmax_blocked, pack_a, pack_b, BlockGrid, Dims, LoopOrder, Mmul};
///
/// type S = Mmul<2, 2, 2>;
/// let a = [1.0f32, 2.0, 3.0, 4.0];   // 2x2
/// let b = [1.0f32, -1.0, 0.0, 1.0];  // 2x2
/// let grid = BlockGrid::<S>::new(Dims::product(2, 2, 2)).unwrap();
///
/// let mut col_max = vec![0.0f32; 2];
/// colmax_blocked::<f32, S>(
///     &grid,
///     &pack_a::<S, _>(&a, 2, 2),
///     &pack_b::<S, _>(&b, 2, 2),
///     &mut col_max,
///     LoopOrder::RowBlocksOuter,
/// );
///
/// // C = [[1, 1], [3, 1]]
/// assert_eq!(col_max, vec![3.0, 1.0]);
/// ```
pub fn colmax_blocked<T: Element, S: BlockMac<T>>(
    grid: &BlockGrid<S>,
    a: &[T],
    b: &[T],
    col_max: &mut [T],
    order: LoopOrder,
) {
    let mut cblk = vec![T::ZERO; S::SIZE_C];
    colmax_blocked_with_scratch(grid, a, b, col_max, &mut cblk, order);
}

/// [`colmax_blocked`] using a caller-owned M×N block buffer.
pub fn colmax_blocked_with_scratch<T: Element, S: BlockMac<T>>(
    grid: &BlockGrid<S>,
    a: &[T],
    b: &[T],
    col_max: &mut [T],
    cblk: &mut [T],
    order: LoopOrder,
) {
    check_operands(grid, a, b, col_max, cblk);

    col_max.fill(T::NEG_SENTINEL);
    for (z, j) in grid.blocks(order) {
        compute_block(grid, a, b, z, j, cblk);
        fold_block::<T, S>(cblk, j, col_max);
    }
}

fn check_operands<T, S: BlockShape>(grid: &BlockGrid<S>, a: &[T], b: &[T], col_max: &[T], cblk: &[T]) {
    let dims = grid.dims();
    assert_eq!(
        a.len(),
        dims.a_len(),
        "A size mismatch: expected {}, got {}",
        dims.a_len(),
        a.len()
    );
    assert_eq!(
        b.len(),
        dims.b_len(),
        "B size mismatch: expected {}, got {}",
        dims.b_len(),
        b.len()
    );
    assert_eq!(
        col_max.len(),
        dims.cb,
        "column maxima size mismatch: expected {}, got {}",
        dims.cb,
        col_max.len()
    );
    assert!(cblk.len() >= S::SIZE_C, "block scratch too small");
}

/// Incremental column-max reduction, one row block at a time.
///
/// After any prefix of row blocks has been folded, `col_max()` holds the
/// column maxima of that prefix of A's rows; every value only ever grows.
///
/// ```
/// use colmax_gemm::core::{BlockGrid, ColMaxReducer, Dims, Mmul};
///
/// type S = Mmul<1, 1, 1>;
/// let grid = BlockGrid::<S>::new(Dims::product(3, 1, 1)).unwrap();
/// let a = [2.0f32, 5.0, 1.0];
/// let b = [1.0f32];
///
/// let mut reducer = ColMaxReducer::new(grid, &a, &b);
/// reducer.fold_next_row_block();
/// assert_eq!(reducer.col_max(), &[2.0]);
/// reducer.fold_remaining();
/// assert_eq!(reducer.col_max(), &[5.0]);
/// ```
pub struct ColMaxReducer<'a, T: Element, S: BlockMac<T>> {
    grid: BlockGrid<S>,
    a: &'a [T],
    b: &'a [T],
    col_max: Vec<T>,
    cblk: Vec<T>,
    next_row_block: usize,
}

impl<'a, T: Element, S: BlockMac<T>> ColMaxReducer<'a, T, S> {
    pub fn new(grid: BlockGrid<S>, a: &'a [T], b: &'a [T]) -> Self {
        let col_max = vec![T::NEG_SENTINEL; grid.dims().cb];
        let cblk = vec![T::ZERO; S::SIZE_C];
        check_operands(&grid, a, b, &col_max, &cblk);
        Self {
            grid,
            a,
            b,
            col_max,
            cblk,
            next_row_block: 0,
        }
    }

    /// Fold row block `z` across every column block.
    pub fn fold_row_block(&mut self, z: usize) {
        assert!(z < self.grid.row_blocks(), "row block {} out of range", z);
        for j in 0..self.grid.col_blocks() {
            compute_block(&self.grid, self.a, self.b, z, j, &mut self.cblk);
            fold_block::<T, S>(&self.cblk, j, &mut self.col_max);
        }
    }

    /// Fold the next unfolded row block; `false` once all are done.
    pub fn fold_next_row_block(&mut self) -> bool {
        if self.next_row_block >= self.grid.row_blocks() {
            return false;
        }
        self.fold_row_block(self.next_row_block);
        self.next_row_block += 1;
        true
    }

    pub fn fold_remaining(&mut self) {
        while self.fold_next_row_block() {}
    }

    /// Row blocks folded so far by [`fold_next_row_block`](Self::fold_next_row_block).
    pub fn folded(&self) -> usize {
        self.next_row_block
    }

    pub fn col_max(&self) -> &[T] {
        &self.col_max
    }

    pub fn into_col_max(self) -> Vec<T> {
        self.col_max
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{naive_colmax, pack_a, pack_b, Dims, Mmul, Mmul4x2x4};

    fn run<S: BlockMac<f32>>(
        a: &[f32],
        b: &[f32],
        dims: Dims,
        order: LoopOrder,
    ) -> Vec<f32> {
        let grid = BlockGrid::<S>::new(dims).unwrap();
        let ap = pack_a::<S, _>(a, dims.ra, dims.ca);
        let bp = pack_b::<S, _>(b, dims.rb, dims.cb);
        let mut col_max = vec![0.0; dims.cb];
        colmax_blocked::<f32, S>(&grid, &ap, &bp, &mut col_max, order);
        col_max
    }

    #[test]
    fn test_row_and_column_index_scenario() {
        // M=4,K=2,N=4; A[r][k] = r, B[k][c] = c
        // C[r][c] = sum_k r * c = 4 * r * c, max over r (r = 7) = 28 * c
        let dims = Dims::product(8, 4, 8);
        let a: Vec<f32> = (0..8).flat_map(|r| std::iter::repeat(r as f32).take(4)).collect();
        let b: Vec<f32> = (0..4).flat_map(|_| (0..8).map(|c| c as f32)).collect();

        let col_max = run::<Mmul4x2x4>(&a, &b, dims, LoopOrder::RowBlocksOuter);

        let expected: Vec<f32> = (0..8).map(|c| 28.0 * c as f32).collect();
        assert_eq!(col_max, expected);
    }

    #[test]
    fn test_negative_products_keep_true_max() {
        // Every product negative: the sentinel must not leak through.
        let dims = Dims::product(4, 2, 4);
        let a = vec![-1.0f32; 8];
        let b: Vec<f32> = (0..8).map(|i| (i + 1) as f32).collect();

        let col_max = run::<Mmul4x2x4>(&a, &b, dims, LoopOrder::RowBlocksOuter);

        // C[r][c] = -(B[0][c] + B[1][c]) = -((c+1) + (c+5))
        assert_eq!(col_max, vec![-6.0, -8.0, -10.0, -12.0]);
    }

    #[test]
    fn test_loop_orders_bit_identical() {
        let dims = Dims::product(16, 8, 12);
        let a: Vec<f32> = (0..dims.a_len()).map(|i| ((i * 37 % 101) as f32 - 50.0) * 0.37).collect();
        let b: Vec<f32> = (0..dims.b_len()).map(|i| ((i * 53 % 97) as f32 - 48.0) * 0.11).collect();

        let row = run::<Mmul<4, 2, 4>>(&a, &b, dims, LoopOrder::RowBlocksOuter);
        let col = run::<Mmul<4, 2, 4>>(&a, &b, dims, LoopOrder::ColBlocksOuter);

        let row_bits: Vec<u32> = row.iter().map(|v| v.to_bits()).collect();
        let col_bits: Vec<u32> = col.iter().map(|v| v.to_bits()).collect();
        assert_eq!(row_bits, col_bits);
    }

    #[test]
    fn test_matches_naive_reference() {
        let dims = Dims::product(12, 6, 9);
        let a: Vec<f32> = (0..dims.a_len()).map(|i| (i as f32).sin() * 10.0).collect();
        let b: Vec<f32> = (0..dims.b_len()).map(|i| (i as f32).cos() * 3.0).collect();

        let blocked = run::<Mmul<3, 2, 3>>(&a, &b, dims, LoopOrder::ColBlocksOuter);
        let naive = naive_colmax(&a, dims.ra, dims.ca, &b, dims.cb);

        assert_eq!(blocked, naive);
    }

    #[test]
    fn test_zero_row_blocks_leaves_sentinel() {
        let dims = Dims::product(0, 4, 8);
        let col_max = run::<Mmul4x2x4>(&[], &vec![1.0; 32], dims, LoopOrder::RowBlocksOuter);
        assert_eq!(col_max, vec![f32::NEG_INFINITY; 8]);
    }

    #[test]
    fn test_zero_col_blocks_is_empty() {
        let dims = Dims::product(8, 4, 0);
        let col_max = run::<Mmul4x2x4>(&vec![1.0; 32], &[], dims, LoopOrder::RowBlocksOuter);
        assert!(col_max.is_empty());
    }

    #[test]
    fn test_zero_shared_dimension_gives_zero_products() {
        let dims = Dims::product(4, 0, 4);
        let col_max = run::<Mmul4x2x4>(&[], &[], dims, LoopOrder::RowBlocksOuter);
        assert_eq!(col_max, vec![0.0; 4]);
    }

    #[test]
    fn test_overwrites_previous_contents() {
        type S = Mmul<1, 1, 1>;
        let grid = BlockGrid::<S>::new(Dims::product(2, 1, 2)).unwrap();
        let mut col_max = vec![1e9f32, 1e9];
        colmax_blocked::<f32, S>(&grid, &[1.0, 2.0], &[1.0, -1.0], &mut col_max, LoopOrder::RowBlocksOuter);
        // C = [[1, -1], [2, -2]]
        assert_eq!(col_max, vec![2.0, -1.0]);
    }

    #[test]
    fn test_integer_elements() {
        type S = Mmul<2, 2, 2>;
        let a = [1i32, 2, 3, 4];
        let b = [5i32, 6, 7, 8];
        let grid = BlockGrid::<S>::new(Dims::product(2, 2, 2)).unwrap();
        let mut col_max = vec![0i32; 2];
        colmax_blocked::<i32, S>(
            &grid,
            &pack_a::<S, _>(&a, 2, 2),
            &pack_b::<S, _>(&b, 2, 2),
            &mut col_max,
            LoopOrder::RowBlocksOuter,
        );
        // C = [[19, 22], [43, 50]]
        assert_eq!(col_max, vec![43, 50]);
    }

    #[test]
    fn test_reducer_is_monotone() {
        type S = Mmul<2, 2, 2>;
        let dims = Dims::product(8, 4, 6);
        let a: Vec<f32> = (0..dims.a_len()).map(|i| ((i * 13 % 17) as f32) - 8.0).collect();
        let b: Vec<f32> = (0..dims.b_len()).map(|i| ((i * 7 % 11) as f32) - 5.0).collect();
        let grid = BlockGrid::<S>::new(dims).unwrap();
        let ap = pack_a::<S, _>(&a, dims.ra, dims.ca);
        let bp = pack_b::<S, _>(&b, dims.rb, dims.cb);

        let mut reducer = ColMaxReducer::new(grid, &ap, &bp);
        let mut prev = reducer.col_max().to_vec();
        while reducer.fold_next_row_block() {
            let cur = reducer.col_max();
            assert!(prev.iter().zip(cur).all(|(p, c)| c >= p));
            prev = cur.to_vec();
        }
        assert_eq!(reducer.folded(), 4);

        let mut full = vec![0.0; dims.cb];
        colmax_blocked::<f32, S>(&grid, &ap, &bp, &mut full, LoopOrder::RowBlocksOuter);
        assert_eq!(reducer.into_col_max(), full);
    }

    #[test]
    #[should_panic(expected = "A size mismatch")]
    fn test_rejects_short_a() {
        let grid = BlockGrid::<Mmul4x2x4>::new(Dims::product(4, 2, 4)).unwrap();
        let mut col_max = vec![0.0f32; 4];
        colmax_blocked::<f32, Mmul4x2x4>(&grid, &[0.0; 7], &[0.0; 8], &mut col_max, LoopOrder::RowBlocksOuter);
    }
}
