//! Block MAC primitive.

use crate::types::Element;
use std::fmt::Debug;

/// Compile-time block shape of the MAC unit: (M×K) · (K×N) → (M×N).
pub trait BlockShape: Copy + Default + Debug + Send + Sync + 'static {
    /// Rows of an A block and of an output block.
    const M: usize;
    /// Shared extent: columns of an A block, rows of a B block.
    const K: usize;
    /// Columns of a B block and of an output block.
    const N: usize;

    /// Elements in one M×K block.
    const SIZE_A: usize = Self::M * Self::K;
    /// Elements in one K×N block.
    const SIZE_B: usize = Self::K * Self::N;
    /// Elements in one M×N block.
    const SIZE_C: usize = Self::M * Self::N;
}

/// Fixed-shape multiply-accumulate over dense row-major blocks.
///
/// Both forms are pure functions of their inputs:
///
/// ```text
/// mul:  C  = A · B
/// mac:  C += A · B
/// ```
///
/// Each output element is accumulated over `k` in increasing order, one
/// [`Element::mac`] step at a time, so a chain of `mul` followed by `mac`
/// calls reproduces a sequential dot product exactly.
pub trait BlockMac<T: Element>: BlockShape {
    /// Overwrite `c[..SIZE_C]` with `a[..SIZE_A] · b[..SIZE_B]`.
    fn mul(a: &[T], b: &[T], c: &mut [T]);

    /// Add `a[..SIZE_A] · b[..SIZE_B]` into `c[..SIZE_C]`.
    fn mac(a: &[T], b: &[T], c: &mut [T]);
}

/// Portable block MAC for any `M×K×N` shape.
///
/// ```rust
/// use colmax_gemm::core::{BlockMac, Mmul};
///
/// // [1 2] · [5 6]   [19 22]
/// // [3 4]   [7 8] = [43 50]
/// let a = [1.0f32, 2.0, 3.0, 4.0];
/// let b = [5.0f32, 6.0, 7.0, 8.0];
/// let mut c = [0.0f32; 4];
/// Mmul::<2, 2, 2>::mul(&a, &b, &mut c);
/// assert_eq!(c, [19.0, 22.0, 43.0, 50.0]);
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Mmul<const M: usize, const K: usize, const N: usize>;

/// The 4×2×4 single-precision MAC shape of the reference deployment.
pub type Mmul4x2x4 = Mmul<4, 2, 4>;

impl<const M: usize, const K: usize, const N: usize> Mmul<M, K, N> {
    // Evaluated at monomorphization; a zero extent fails the build.
    const NON_EMPTY: () = assert!(M > 0 && K > 0 && N > 0, "block extents must be non-zero");
}

impl<const M: usize, const K: usize, const N: usize> BlockShape for Mmul<M, K, N> {
    const M: usize = M;
    const K: usize = K;
    const N: usize = N;
}

impl<T: Element, const M: usize, const K: usize, const N: usize> BlockMac<T> for Mmul<M, K, N> {
    #[inline]
    fn mul(a: &[T], b: &[T], c: &mut [T]) {
        #[allow(clippy::let_unit_value)]
        let () = Self::NON_EMPTY;
        let (a, b, c) = (&a[..M * K], &b[..K * N], &mut c[..M * N]);

        for (a_row, c_row) in a.chunks_exact(K).zip(c.chunks_exact_mut(N)) {
            for (n, out) in c_row.iter_mut().enumerate() {
                let mut acc = T::ZERO;
                for (kk, &av) in a_row.iter().enumerate() {
                    acc = T::mac(acc, av, b[kk * N + n]);
                }
                *out = acc;
            }
        }
    }

    #[inline]
    fn mac(a: &[T], b: &[T], c: &mut [T]) {
        #[allow(clippy::let_unit_value)]
        let () = Self::NON_EMPTY;
        let (a, b, c) = (&a[..M * K], &b[..K * N], &mut c[..M * N]);

        for (a_row, c_row) in a.chunks_exact(K).zip(c.chunks_exact_mut(N)) {
            for (n, out) in c_row.iter_mut().enumerate() {
                let mut acc = *out;
                for (kk, &av) in a_row.iter().enumerate() {
                    acc = T::mac(acc, av, b[kk * N + n]);
                }
                *out = acc;
            }
        }
    }
}
