//! Reusable per-unit buffers.

use super::colmax::colmax_blocked_with_scratch;
use super::kernel::BlockMac;
use super::tiling::{BlockGrid, LoopOrder};
use crate::types::Element;

/// Operand, block and result storage for one compute unit.
///
/// Allocated once for a grid and overwritten by every invocation, so a
/// long-running unit never allocates on its hot path.
#[derive(Debug)]
pub struct Workspace<T: Element, S: BlockMac<T>> {
    grid: BlockGrid<S>,
    a: Vec<T>,
    b: Vec<T>,
    col_max: Vec<T>,
    cblk: Vec<T>,
}

impl<T: Element, S: BlockMac<T>> Workspace<T, S> {
    pub fn new(grid: BlockGrid<S>) -> Self {
        let dims = grid.dims();
        Self {
            grid,
            a: vec![T::ZERO; dims.a_len()],
            b: vec![T::ZERO; dims.b_len()],
            col_max: vec![T::NEG_SENTINEL; dims.cb],
            cblk: vec![T::ZERO; S::SIZE_C],
        }
    }

    pub fn grid(&self) -> &BlockGrid<S> {
        &self.grid
    }

    /// Pre-blocked A buffer, `R_a * C_a` elements.
    pub fn a_mut(&mut self) -> &mut [T] {
        &mut self.a
    }

    /// Pre-blocked B buffer, `R_b * C_b` elements.
    pub fn b_mut(&mut self) -> &mut [T] {
        &mut self.b
    }

    /// Both operand buffers at once.
    pub fn operands_mut(&mut self) -> (&mut [T], &mut [T]) {
        (&mut self.a, &mut self.b)
    }

    /// Column maxima of the last [`reduce`](Self::reduce).
    pub fn col_max(&self) -> &[T] {
        &self.col_max
    }

    /// Run the multiply-reduce kernel over the current operands.
    pub fn reduce(&mut self, order: LoopOrder) -> &[T] {
        colmax_blocked_with_scratch(
            &self.grid,
            &self.a,
            &self.b,
            &mut self.col_max,
            &mut self.cblk,
            order,
        );
        &self.col_max
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Dims, Mmul};

    #[test]
    fn test_workspace_sizes() {
        let grid = BlockGrid::<Mmul<4, 2, 4>>::new(Dims::product(8, 4, 8)).unwrap();
        let mut ws = Workspace::<f32, _>::new(grid);
        assert_eq!(ws.a_mut().len(), 32);
        assert_eq!(ws.b_mut().len(), 32);
        assert_eq!(ws.col_max().len(), 8);
    }

    #[test]
    fn test_workspace_reuse_overwrites() {
        type S = Mmul<1, 1, 1>;
        let grid = BlockGrid::<S>::new(Dims::product(2, 1, 1)).unwrap();
        let mut ws = Workspace::<i32, S>::new(grid);

        ws.a_mut().copy_from_slice(&[3, 9]);
        ws.b_mut().copy_from_slice(&[2]);
        assert_eq!(ws.reduce(LoopOrder::RowBlocksOuter), &[18]);

        // A smaller second batch must not see the first one's maximum.
        ws.a_mut().copy_from_slice(&[1, -4]);
        assert_eq!(ws.reduce(LoopOrder::ColBlocksOuter), &[2]);
    }
}
