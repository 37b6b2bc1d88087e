//! Adaptive grids over a bounding box
//!
//! A grid cell is a leaf of a binary tree whose `k`-th level halves the
//! parent box along axis `k mod D`. Cells are addressed by dense
//! [`GridElement`] ids. [`TreeGrid`] layers the geometry and the box-cover
//! algorithm on top of any [`Tree`](crate::tree::Tree) implementation.

mod cover;
mod tree_grid;

pub use cover::INTPHASEWIDTH;
pub use tree_grid::{CompressedGrid, TreeGrid};

use std::ops::Range;

use thiserror::Error;

use crate::geometry::{Geo, RectGeo};
use crate::tree::{PointerTree, SuccinctTree, TreeError, TreeIndex};

/// Dense id of a grid cell, `0..size()`.
pub type GridElement = usize;

/// Grid over a pointer tree: cheap targeted subdivision.
pub type PointerGrid = TreeGrid<PointerTree>;

/// Grid over a succinct tree: compact, rebuilt on every subdivision.
pub type SuccinctGrid = TreeGrid<SuccinctTree>;

/// Errors raised by grid queries and construction.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GridError {
    /// A grid element past the end of the grid.
    #[error("grid element {element} out of range (grid has {size} cells)")]
    OutOfRange {
        /// Offending element.
        element: GridElement,
        /// Number of cells in the grid.
        size: usize,
    },

    /// A tree node id that does not belong to this grid's tree.
    #[error("tree node {node} does not belong to this grid")]
    ForeignElement {
        /// Offending node id.
        node: TreeIndex,
    },

    /// Vectors describing the grid disagree on the dimension.
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Dimension of the grid bounds.
        expected: usize,
        /// Dimension that was supplied.
        actual: usize,
    },

    /// Splitting the node would exhaust the fixed-point resolution.
    #[error("tree node {node} is at depth {depth}; cells cannot be split past depth {limit}")]
    DepthLimit {
        /// Node that was to be split.
        node: TreeIndex,
        /// Its depth.
        depth: usize,
        /// Deepest splittable level plus one.
        limit: usize,
    },

    /// Failure in the underlying tree.
    #[error(transparent)]
    Tree(#[from] TreeError),
}

/// Operations every grid offers to the rest of the crate.
pub trait Grid: Sized {
    /// Number of cells.
    fn size(&self) -> usize;

    /// All cell ids.
    fn elements(&self) -> Range<GridElement> {
        0..self.size()
    }

    /// Number of axes.
    fn dimension(&self) -> usize;

    /// Outer bounding box.
    fn bounds(&self) -> &RectGeo;

    /// Per-axis periodicity flags.
    fn periodicity(&self) -> &[bool];

    /// Box of cell `element`.
    fn geometry(&self, element: GridElement) -> Result<RectGeo, GridError>;

    /// Number of subdivisions between the outer box and cell `element`.
    fn depth(&self, element: GridElement) -> Result<usize, GridError>;

    /// Depth of the deepest cell.
    fn max_depth(&self) -> usize {
        self.elements()
            .filter_map(|element| self.depth(element).ok())
            .max()
            .unwrap_or(0)
    }

    /// Cells whose closed box meets `geo`, each listed once.
    ///
    /// Regions entirely outside the bounds cover nothing.
    fn cover(&self, geo: &Geo) -> Vec<GridElement>;

    /// Cells of `self` that overlap some cell of `other`.
    ///
    /// Both grids must share bounds; `other` may be finer or coarser.
    fn subset(&self, other: &Self) -> Vec<GridElement>;

    /// Independent grid holding only `elements`, at the same resolution.
    fn subgrid(&self, elements: &[GridElement]) -> Result<Self, GridError>;

    /// Split every cell in two.
    fn subdivide(&mut self) -> Result<(), GridError>;

    /// Union with `other` over the same bounds: split wherever either grid
    /// is split, and keep every region either grid has a cell on.
    fn adjoin(&mut self, other: &Self) -> Result<(), GridError>;

    /// Union of all `grids`, or `None` when there are none.
    fn join<'a, I>(grids: I) -> Result<Option<Self>, GridError>
    where
        Self: Clone + 'a,
        I: IntoIterator<Item = &'a Self>,
    {
        let mut grids = grids.into_iter();
        let Some(first) = grids.next() else {
            return Ok(None);
        };
        let mut joined = first.clone();
        for grid in grids {
            joined.adjoin(grid)?;
        }
        Ok(Some(joined))
    }

    /// Approximate heap footprint in bytes.
    fn memory(&self) -> usize;
}
