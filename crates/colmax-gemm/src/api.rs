use std::marker::PhantomData;

use crate::core::{
    colmax_blocked, gemm_blocked, pack_a, pack_b, unpack_c, BlockGrid, BlockMac, Dims, LoopOrder,
};
use crate::error::{Error, Result};
use crate::settings::DefaultShape;
use crate::types::Element;

#[cfg(feature = "parallel")]
use rayon::prelude::*;
use tracing::debug;

/// Column maxima of `C = A × B` with the deployed 4×2×4 block shape.
///
/// Returns `col_max[c] = max_r C[r][c]`, computed without materialising C.
///
/// # Arguments
/// - `a`: Matrix A data in row-major order
/// - `ra`: Number of rows in A
/// - `ca`: Number of columns in A / rows in B
/// - `b`: Matrix B data in row-major order
/// - `cb`: Number of columns in B
///
/// # Errors
/// [`Error::BlockShape`] if the block shape does
/// not divide the dimensions.
///
/// # Example
///
/// ```
/// use colmax_gemm::colmax_matmul;
///
/// let a = vec![1.0f32; 4 * 2]; // 4x2
/// let b = vec![1.0f32, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0]; // 2x4
///
/// let col_max = colmax_matmul(&a, 4, 2, &b, 4).unwrap();
/// assert_eq!(col_max, vec![6.0, 8.0, 10.0, 12.0]);
/// ```
pub fn colmax_matmul<T: Element>(a: &[T], ra: usize, ca: usize, b: &[T], cb: usize) -> Result<Vec<T>> {
    colmax_matmul_with_shape::<DefaultShape, T>(a, ra, ca, b, cb)
}

/// [`colmax_matmul`] with an explicit block shape.
pub fn colmax_matmul_with_shape<S: BlockMac<T>, T: Element>(
    a: &[T],
    ra: usize,
    ca: usize,
    b: &[T],
    cb: usize,
) -> Result<Vec<T>> {
    ColMaxGemm::<T, S>::new(Dims::product(ra, ca, cb))?.execute_row_major(a, b)
}

/// Plain `C = A × B` through the blocked kernel, row-major in and out.
///
/// # Example
///
/// ```
/// use colmax_gemm::{blocked_matmul, Mmul};
///
/// let a = vec![1.0f64, 2.0, 3.0, 4.0]; // 2x2
/// let b = vec![5.0f64, 6.0, 7.0, 8.0]; // 2x2
///
/// let c = blocked_matmul::<Mmul<1, 1, 1>, _>(&a, 2, 2, &b, 2).unwrap();
/// assert_eq!(c, vec![19.0, 22.0, 43.0, 50.0]);
/// ```
pub fn blocked_matmul<S: BlockMac<T>, T: Element>(
    a: &[T],
    ra: usize,
    ca: usize,
    b: &[T],
    cb: usize,
) -> Result<Vec<T>> {
    assert_eq!(a.len(), ra * ca, "A dimensions mismatch");
    assert_eq!(b.len(), ca * cb, "B dimensions mismatch");

    let grid = BlockGrid::<S>::new(Dims::product(ra, ca, cb))?;
    let mut c = vec![T::ZERO; ra * cb];
    gemm_blocked(
        &grid,
        &pack_a::<S, _>(a, ra, ca),
        &pack_b::<S, _>(b, ca, cb),
        &mut c,
        LoopOrder::default(),
    );
    Ok(unpack_c::<S, _>(&c, ra, cb))
}

/// Builder for configuring column-max GEMM operations.
///
/// Validates the grid once, then runs any number of invocations over
/// pre-blocked or row-major operands.
///
/// # Example
///
/// ```
/// use colmax_gemm::{ColMaxGemm, Dims, LoopOrder, Mmul};
///
/// let gemm = ColMaxGemm::<f32, Mmul<2, 1, 2>>::new(Dims::product(2, 1, 2))
///     .unwrap()
///     .loop_order(LoopOrder::ColBlocksOuter);
///
/// // A = [1; -3] (2x1), B = [2 -1] (1x2)
/// let col_max = gemm.execute_row_major(&[1.0, -3.0], &[2.0, -1.0]).unwrap();
/// assert_eq!(col_max, vec![2.0, 3.0]);
/// ```
pub struct ColMaxGemm<T: Element, S: BlockMac<T> = DefaultShape> {
    grid: BlockGrid<S>,
    order: LoopOrder,
    _phantom: PhantomData<T>,
}

impl<T: Element, S: BlockMac<T>> ColMaxGemm<T, S> {
    /// Create a new builder for `dims`.
    pub fn new(dims: Dims) -> Result<Self> {
        let grid = BlockGrid::<S>::new(dims)?;
        debug!(
            row_blocks = grid.row_blocks(),
            k_blocks = grid.k_blocks(),
            col_blocks = grid.col_blocks(),
            "column-max grid"
        );
        Ok(Self {
            grid,
            order: LoopOrder::default(),
            _phantom: PhantomData,
        })
    }

    /// Set the block visiting order.
    pub fn loop_order(mut self, order: LoopOrder) -> Self {
        self.order = order;
        self
    }

    pub fn grid(&self) -> &BlockGrid<S> {
        &self.grid
    }

    /// Run over pre-blocked operands.
    ///
    /// # Panics
    /// If `a` or `b` does not match the configured dimensions.
    pub fn execute(&self, a: &[T], b: &[T]) -> Vec<T> {
        let mut col_max = vec![T::NEG_SENTINEL; self.grid.dims().cb];
        self.execute_into(a, b, &mut col_max);
        col_max
    }

    /// Run over pre-blocked operands, writing into `col_max`.
    pub fn execute_into(&self, a: &[T], b: &[T], col_max: &mut [T]) {
        colmax_blocked(&self.grid, a, b, col_max, self.order);
    }

    /// Run over row-major operands, packing them first.
    pub fn execute_row_major(&self, a: &[T], b: &[T]) -> Result<Vec<T>> {
        let dims = self.grid.dims();
        if a.len() != dims.a_len() || b.len() != dims.b_len() {
            return Err(Error::DimensionMismatch(format!(
                "expected A of {} and B of {} elements, got {} and {}",
                dims.a_len(),
                dims.b_len(),
                a.len(),
                b.len()
            )));
        }
        let a = pack_a::<S, _>(a, dims.ra, dims.ca);
        let b = pack_b::<S, _>(b, dims.rb, dims.cb);
        Ok(self.execute(&a, &b))
    }
}

// ============================================================================
// Batched Operations
// ============================================================================

/// Column maxima for a batch of independent pre-blocked problems.
///
/// `a` holds `batch_size` A operands back to back and `b` the matching B
/// operands; the result holds `batch_size` column-max vectors of `C_b`
/// elements. Runs in parallel with the `parallel` feature.
///
/// # Example
///
/// ```
/// use colmax_gemm::{colmax_matmul_batched, Dims, Mmul};
///
/// // Two 1x1 problems: 2*3 and -1*4
/// let out = colmax_matmul_batched::<Mmul<1, 1, 1>, f32>(
///     &[2.0, -1.0],
///     &[3.0, 4.0],
///     2,
///     Dims::product(1, 1, 1),
/// )
/// .unwrap();
/// assert_eq!(out, vec![6.0, -4.0]);
/// ```
pub fn colmax_matmul_batched<S: BlockMac<T>, T: Element>(
    a: &[T],
    b: &[T],
    batch_size: usize,
    dims: Dims,
) -> Result<Vec<T>> {
    let gemm = ColMaxGemm::<T, S>::new(dims)?;
    let a_stride = dims.a_len();
    let b_stride = dims.b_len();
    let c_stride = dims.cb;

    assert_eq!(
        a.len(),
        batch_size * a_stride,
        "A size mismatch: expected {}, got {}",
        batch_size * a_stride,
        a.len()
    );
    assert_eq!(
        b.len(),
        batch_size * b_stride,
        "B size mismatch: expected {}, got {}",
        batch_size * b_stride,
        b.len()
    );

    if batch_size == 0 || c_stride == 0 {
        return Ok(Vec::new());
    }

    let mut out = vec![T::NEG_SENTINEL; batch_size * c_stride];

    #[cfg(feature = "parallel")]
    {
        out.par_chunks_mut(c_stride)
            .enumerate()
            .for_each(|(i, col_max)| {
                let a_slice = &a[i * a_stride..(i + 1) * a_stride];
                let b_slice = &b[i * b_stride..(i + 1) * b_stride];
                gemm.execute_into(a_slice, b_slice, col_max);
            });
    }

    #[cfg(not(feature = "parallel"))]
    {
        for (i, col_max) in out.chunks_mut(c_stride).enumerate() {
            let a_slice = &a[i * a_stride..(i + 1) * a_stride];
            let b_slice = &b[i * b_stride..(i + 1) * b_stride];
            gemm.execute_into(a_slice, b_slice, col_max);
        }
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{naive_colmax, naive_matmul, Mmul, Mmul4x2x4};

    fn ramp(len: usize, scale: f32, offset: f32) -> Vec<f32> {
        (0..len).map(|i| ((i * 7) % 11) as f32 * scale + offset).collect()
    }

    #[test]
    fn test_colmax_matmul() {
        // A = row index, B = column index, 8x4 · 4x8.
        // C[r][c] = 4*r*c, max over r=7 gives 28*c.
        let a: Vec<f32> = (0..8).flat_map(|r| [r as f32; 4]).collect();
        let b: Vec<f32> = (0..4).flat_map(|_| (0..8).map(|c| c as f32)).collect();

        let col_max = colmax_matmul(&a, 8, 4, &b, 8).unwrap();
        let expected: Vec<f32> = (0..8).map(|c| 28.0 * c as f32).collect();
        assert_eq!(col_max, expected);
    }

    #[test]
    fn test_colmax_matmul_matches_naive() {
        let a = ramp(16 * 8, 0.5, -2.0);
        let b = ramp(8 * 12, -0.25, 1.0);

        let got = colmax_matmul(&a, 16, 8, &b, 12).unwrap();
        assert_eq!(got, naive_colmax(&a, 16, 8, &b, 12));
    }

    #[test]
    fn test_deployed_size_random() {
        use crate::settings::{F_CA, F_CB, F_RA};
        use rand::rngs::StdRng;
        use rand::{Rng, SeedableRng};

        let mut rng = StdRng::seed_from_u64(2024);
        let a: Vec<f32> = (0..F_RA * F_CA).map(|_| rng.gen_range(-1.0..1.0)).collect();
        let b: Vec<f32> = (0..F_CA * F_CB).map(|_| rng.gen_range(-1.0..1.0)).collect();

        let got = colmax_matmul(&a, F_RA, F_CA, &b, F_CB).unwrap();
        assert_eq!(got.len(), F_CB);
        assert_eq!(got, naive_colmax(&a, F_RA, F_CA, &b, F_CB));
    }

    #[test]
    fn test_colmax_matmul_rejects_bad_shape() {
        let a = vec![0.0f32; 6 * 2];
        let b = vec![0.0f32; 2 * 4];
        assert!(matches!(colmax_matmul(&a, 6, 2, &b, 4), Err(Error::BlockShape(_))));
    }

    #[test]
    fn test_colmax_matmul_i32() {
        // [1 -2] · [3 0]   [-1  -4]
        // [0  5]   [2 2] = [10  10]
        let a = vec![1i32, -2, 0, 5];
        let b = vec![3i32, 0, 2, 2];
        let got = colmax_matmul_with_shape::<Mmul<1, 2, 1>, _>(&a, 2, 2, &b, 2).unwrap();
        assert_eq!(got, vec![10, 10]);
    }

    #[test]
    fn test_blocked_matmul_matches_naive() {
        let a = ramp(8 * 4, 1.0, -3.0);
        let b = ramp(4 * 8, 0.5, 0.0);
        let c = blocked_matmul::<Mmul4x2x4, _>(&a, 8, 4, &b, 8).unwrap();
        assert_eq!(c, naive_matmul(&a, 8, 4, &b, 8));
    }

    #[test]
    fn test_builder_loop_orders_agree() {
        let dims = Dims::product(16, 8, 16);
        let a = ramp(dims.a_len(), 1.5, -7.0);
        let b = ramp(dims.b_len(), -0.5, 2.0);

        let rows = ColMaxGemm::<f32, Mmul4x2x4>::new(dims).unwrap();
        let cols = ColMaxGemm::<f32, Mmul4x2x4>::new(dims)
            .unwrap()
            .loop_order(LoopOrder::ColBlocksOuter);

        let r = rows.execute_row_major(&a, &b).unwrap();
        let c = cols.execute_row_major(&a, &b).unwrap();
        assert_eq!(
            r.iter().map(|x| x.to_bits()).collect::<Vec<_>>(),
            c.iter().map(|x| x.to_bits()).collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_builder_rejects_wrong_lengths() {
        let gemm = ColMaxGemm::<f32, Mmul4x2x4>::new(Dims::product(4, 2, 4)).unwrap();
        let err = gemm.execute_row_major(&[0.0; 7], &[0.0; 8]).unwrap_err();
        assert!(matches!(err, Error::DimensionMismatch(_)));
    }

    #[test]
    fn test_colmax_matmul_batched() {
        let dims = Dims::product(8, 4, 8);
        let batch = 3;
        let a: Vec<Vec<f32>> = (0..batch).map(|i| ramp(dims.a_len(), 1.0, i as f32)).collect();
        let b: Vec<Vec<f32>> = (0..batch).map(|i| ramp(dims.b_len(), 0.5, -(i as f32))).collect();

        let a_packed: Vec<f32> = a.iter().flat_map(|m| pack_a::<Mmul4x2x4, _>(m, 8, 4)).collect();
        let b_packed: Vec<f32> = b.iter().flat_map(|m| pack_b::<Mmul4x2x4, _>(m, 4, 8)).collect();

        let out = colmax_matmul_batched::<Mmul4x2x4, f32>(&a_packed, &b_packed, batch, dims).unwrap();
        assert_eq!(out.len(), batch * 8);

        for i in 0..batch {
            let expected = naive_colmax(&a[i], 8, 4, &b[i], 8);
            assert_eq!(&out[i * 8..(i + 1) * 8], expected.as_slice());
        }
    }

    #[test]
    fn test_colmax_matmul_batched_empty() {
        let out = colmax_matmul_batched::<Mmul4x2x4, f32>(&[], &[], 0, Dims::product(4, 2, 4)).unwrap();
        assert!(out.is_empty());
    }
}
