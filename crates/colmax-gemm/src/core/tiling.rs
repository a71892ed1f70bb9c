//! Problem dimensions, block grids and block iteration order.

use super::kernel::BlockShape;
use crate::error::{Error, Result};
use std::marker::PhantomData;

/// Dimensions of one `C = A × B` problem.
///
/// `A` is `ra × ca` (queries × embedding), `B` is `rb × cb`
/// (embedding × references). The shared dimension must agree: `rb == ca`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Dims {
    pub ra: usize,
    pub ca: usize,
    pub rb: usize,
    pub cb: usize,
}

impl Dims {
    /// Validate and build a set of dimensions.
    pub fn new(ra: usize, ca: usize, rb: usize, cb: usize) -> Result<Self> {
        if rb != ca {
            return Err(Error::DimensionMismatch(format!(
                "A is {}x{} but B is {}x{} (R_b must equal C_a)",
                ra, ca, rb, cb
            )));
        }
        Ok(Self { ra, ca, rb, cb })
    }

    /// Dimensions for `(ra × ca) · (ca × cb)`.
    pub const fn product(ra: usize, ca: usize, cb: usize) -> Self {
        Self { ra, ca, rb: ca, cb }
    }

    /// Elements in A.
    pub fn a_len(&self) -> usize {
        self.ra * self.ca
    }

    /// Elements in B.
    pub fn b_len(&self) -> usize {
        self.rb * self.cb
    }

    /// Elements in the full product C.
    pub fn c_len(&self) -> usize {
        self.ra * self.cb
    }
}

/// Order in which output blocks `(z, j)` are visited.
///
/// Both orders visit every block exactly once and, for any one output
/// column, visit row blocks in increasing `z`. The column maxima they
/// produce are bit-identical.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum LoopOrder {
    /// `for z { for j { .. } }`
    #[default]
    RowBlocksOuter,
    /// `for j { for z { .. } }`: each B block column is reused across all
    /// row blocks before moving on.
    ColBlocksOuter,
}

/// Block index space of a problem for block shape `S`.
///
/// ```text
/// rowBlocks = R_a / M    kBlocks = C_a / K    colBlocks = C_b / N
///
/// A: rowBlocks × kBlocks  blocks of M×K, block-row-major
/// B: kBlocks  × colBlocks blocks of K×N, block-row-major
/// C: rowBlocks × colBlocks blocks of M×N, block-row-major
/// ```
#[derive(Debug)]
pub struct BlockGrid<S: BlockShape> {
    dims: Dims,
    row_blocks: usize,
    k_blocks: usize,
    col_blocks: usize,
    _shape: PhantomData<S>,
}

impl<S: BlockShape> Clone for BlockGrid<S> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<S: BlockShape> Copy for BlockGrid<S> {}

impl<S: BlockShape> PartialEq for BlockGrid<S> {
    fn eq(&self, other: &Self) -> bool {
        self.dims == other.dims
    }
}

impl<S: BlockShape> BlockGrid<S> {
    /// Build the grid, checking that every dimension divides exactly.
    pub fn new(dims: Dims) -> Result<Self> {
        if dims.rb != dims.ca {
            return Err(Error::DimensionMismatch(format!(
                "R_b ({}) must equal C_a ({})",
                dims.rb, dims.ca
            )));
        }
        for (name, value, block) in [("R_a", dims.ra, S::M), ("C_a", dims.ca, S::K), ("C_b", dims.cb, S::N)] {
            if value % block != 0 {
                return Err(Error::BlockShape(format!(
                    "{} = {} is not a multiple of the {}x{}x{} block",
                    name,
                    value,
                    S::M,
                    S::K,
                    S::N
                )));
            }
        }

        Ok(Self {
            dims,
            row_blocks: dims.ra / S::M,
            k_blocks: dims.ca / S::K,
            col_blocks: dims.cb / S::N,
            _shape: PhantomData,
        })
    }

    pub fn dims(&self) -> Dims {
        self.dims
    }

    pub fn row_blocks(&self) -> usize {
        self.row_blocks
    }

    pub fn k_blocks(&self) -> usize {
        self.k_blocks
    }

    pub fn col_blocks(&self) -> usize {
        self.col_blocks
    }

    /// Offset of A block `(z, i)` in the pre-blocked A buffer.
    #[inline]
    pub fn a_block_offset(&self, z: usize, i: usize) -> usize {
        (z * self.k_blocks + i) * S::SIZE_A
    }

    /// Offset of B block `(i, j)` in the pre-blocked B buffer.
    #[inline]
    pub fn b_block_offset(&self, i: usize, j: usize) -> usize {
        (i * self.col_blocks + j) * S::SIZE_B
    }

    /// Offset of C block `(z, j)` in a blocked output buffer.
    #[inline]
    pub fn c_block_offset(&self, z: usize, j: usize) -> usize {
        (z * self.col_blocks + j) * S::SIZE_C
    }

    /// Iterate output block coordinates `(z, j)` in the given order.
    pub fn blocks(&self, order: LoopOrder) -> BlockIterator {
        BlockIterator::new(self.row_blocks, self.col_blocks, order)
    }
}

/// Iterator over output block coordinates `(z, j)`.
#[derive(Clone, Debug)]
pub struct BlockIterator {
    row_blocks: usize,
    col_blocks: usize,
    order: LoopOrder,
    pos: usize,
}

impl BlockIterator {
    pub fn new(row_blocks: usize, col_blocks: usize, order: LoopOrder) -> Self {
        Self {
            row_blocks,
            col_blocks,
            order,
            pos: 0,
        }
    }
}

impl Iterator for BlockIterator {
    type Item = (usize, usize);

    fn next(&mut self) -> Option<Self::Item> {
        let total = self.row_blocks * self.col_blocks;
        if self.pos >= total {
            return None;
        }
        let p = self.pos;
        self.pos += 1;

        Some(match self.order {
            LoopOrder::RowBlocksOuter => (p / self.col_blocks, p % self.col_blocks),
            LoopOrder::ColBlocksOuter => (p % self.row_blocks, p / self.row_blocks),
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.row_blocks * self.col_blocks - self.pos.min(self.row_blocks * self.col_blocks);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for BlockIterator {}
