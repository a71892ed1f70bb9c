//! Naive reference implementations.
//!
//! Each product element is accumulated over `k` in increasing order with
//! [`Element::mac`], the same order the blocked kernels use, so results
//! can be compared exactly.

use crate::types::Element;

/// Row-major `C = A × B` by the triple loop.
pub fn naive_matmul<T: Element>(a: &[T], ra: usize, ca: usize, b: &[T], cb: usize) -> Vec<T> {
    assert_eq!(a.len(), ra * ca, "A dimensions mismatch");
    assert_eq!(b.len(), ca * cb, "B dimensions mismatch");

    let mut c = vec![T::ZERO; ra * cb];
    for r in 0..ra {
        for col in 0..cb {
            c[r * cb + col] = dot_column(a, r, ca, b, col, cb);
        }
    }
    c
}

/// Column maxima of the row-major product, without the blocked layout.
pub fn naive_colmax<T: Element>(a: &[T], ra: usize, ca: usize, b: &[T], cb: usize) -> Vec<T> {
    assert_eq!(a.len(), ra * ca, "A dimensions mismatch");
    assert_eq!(b.len(), ca * cb, "B dimensions mismatch");

    let mut col_max = vec![T::NEG_SENTINEL; cb];
    for r in 0..ra {
        for (col, slot) in col_max.iter_mut().enumerate() {
            *slot = slot.max_of(dot_column(a, r, ca, b, col, cb));
        }
    }
    col_max
}

#[inline]
fn dot_column<T: Element>(a: &[T], r: usize, ca: usize, b: &[T], col: usize, cb: usize) -> T {
    let mut acc = T::ZERO;
    for k in 0..ca {
        acc = T::mac(acc, a[r * ca + k], b[k * cb + col]);
    }
    acc
}
