use bitvec::prelude::*;

use super::cover::{node_box_to_rect, INTPHASEWIDTH};
use super::{Grid, GridElement, GridError};
use crate::geometry::{Geo, RectGeo};
use crate::succinct::{Bits, RankSelect};
use crate::tree::{CompressedTree, Direction, Preorder, Tree, TreeIndex};

/// Halvings of the fixed-point unit interval before a cell has width one.
const MAX_SPLITS_PER_AXIS: usize = 60;

/// Persisted form of a [`TreeGrid`].
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "persist", derive(serde::Serialize, serde::Deserialize))]
pub struct CompressedGrid {
    /// Tree shape and cell validity.
    pub tree: CompressedTree,
    /// Outer bounding box.
    pub bounds: RectGeo,
    /// Per-axis periodicity flags.
    pub periodic: Vec<bool>,
}

/// Grid whose cells are the valid leaves of a binary tree.
///
/// Cells are numbered in increasing node-id order, so a single rank/select
/// index over a node-indexed marker translates both ways. Ghost leaves (kept
/// by [`Grid::subgrid`] to keep the tree full) carry no cell.
#[derive(Debug, Clone)]
pub struct TreeGrid<T: Tree> {
    pub(super) tree: T,
    pub(super) bounds: RectGeo,
    pub(super) periodic: Vec<bool>,
    /// Validity of each leaf, in pre-order.
    valid: Bits,
    /// Node-indexed marker of valid leaves.
    pub(super) cells: RankSelect,
}

impl<T: Tree> TreeGrid<T> {
    /// Single-cell, non-periodic grid covering `bounds`.
    ///
    /// # Panics
    /// If `bounds` has dimension zero.
    pub fn new(bounds: RectGeo) -> Self {
        assert!(bounds.dimension() > 0, "grid needs at least one axis");
        let periodic = vec![false; bounds.dimension()];
        let mut grid = Self {
            tree: T::default(),
            bounds,
            periodic,
            valid: bitvec![u64, Lsb0; 1],
            cells: RankSelect::default(),
        };
        grid.rebuild();
        grid
    }

    /// Single-cell grid with per-axis periodicity.
    pub fn with_periodicity(bounds: RectGeo, periodic: Vec<bool>) -> Result<Self, GridError> {
        if periodic.len() != bounds.dimension() {
            return Err(GridError::DimensionMismatch {
                expected: bounds.dimension(),
                actual: periodic.len(),
            });
        }
        let mut grid = Self::new(bounds);
        grid.periodic = periodic;
        Ok(grid)
    }

    /// Rebuild a grid from its persisted form.
    pub fn from_compressed(compressed: &CompressedGrid) -> Result<Self, GridError> {
        let mut grid =
            Self::with_periodicity(compressed.bounds.clone(), compressed.periodic.clone())?;
        grid.assign(&compressed.tree)?;
        Ok(grid)
    }

    /// Persisted form of this grid.
    pub fn compress(&self) -> CompressedGrid {
        CompressedGrid {
            tree: self.compressed_tree(),
            bounds: self.bounds.clone(),
            periodic: self.periodic.clone(),
        }
    }

    /// Tree shape plus validity, keeping bounds and periodicity.
    pub fn compressed_tree(&self) -> CompressedTree {
        CompressedTree::from_parts(self.tree.leaf_sequence(), self.valid.clone())
    }

    /// Replace the tree shape, keeping bounds and periodicity.
    pub fn assign(&mut self, compressed: &CompressedTree) -> Result<(), GridError> {
        self.tree.assign(compressed.leaf_sequence())?;
        self.valid = compressed.valid_sequence().to_bitvec();
        self.rebuild();
        Ok(())
    }

    /// Underlying tree.
    pub fn tree(&self) -> &T {
        &self.tree
    }

    /// Tree node holding cell `element`.
    pub fn grid_to_tree(&self, element: GridElement) -> Result<TreeIndex, GridError> {
        self.cells.select1(element).ok_or(GridError::OutOfRange {
            element,
            size: self.size(),
        })
    }

    /// Cell held by tree node `node`, if it is a valid leaf.
    pub fn tree_to_grid(&self, node: TreeIndex) -> Option<GridElement> {
        self.cells.get(node).then(|| self.cells.rank1(node))
    }

    /// Box of any tree node, leaf or internal.
    pub fn node_geometry(&self, node: TreeIndex) -> Result<RectGeo, GridError> {
        if node >= self.tree.size() {
            return Err(GridError::ForeignElement { node });
        }
        let dimension = self.dimension();
        let mut lower = vec![0u64; dimension];
        let mut upper = vec![INTPHASEWIDTH; dimension];
        for (depth, direction) in self.tree.prefix(node).into_iter().enumerate() {
            let axis = depth % dimension;
            let half = (upper[axis] - lower[axis]) >> 1;
            match direction {
                Direction::Left => upper[axis] -= half,
                Direction::Right => lower[axis] += half,
            }
        }
        Ok(node_box_to_rect(&self.bounds, &lower, &upper))
    }

    /// Cells inside the subtree of `node`.
    pub fn cells_below(&self, node: TreeIndex) -> Vec<GridElement> {
        Preorder::from_node(&self.tree, node)
            .filter_map(|it| self.tree_to_grid(it))
            .collect()
    }

    /// Split only the listed cells.
    pub fn subdivide_elements(&mut self, elements: &[GridElement]) -> Result<(), GridError> {
        let mut nodes = Vec::with_capacity(elements.len());
        for &element in elements {
            nodes.push(self.grid_to_tree(element)?);
        }
        self.subdivide_nodes(&nodes)
    }

    fn subdivide_nodes(&mut self, nodes: &[TreeIndex]) -> Result<(), GridError> {
        let limit = MAX_SPLITS_PER_AXIS * self.dimension();
        let mut targets = bitvec![u64, Lsb0; 0; self.tree.size()];
        for &node in nodes {
            let depth = self.tree.depth(node);
            if depth >= limit {
                return Err(GridError::DepthLimit { node, depth, limit });
            }
            targets.set(node, true);
        }

        // Each split leaf becomes two valid leaves, adjacent in pre-order.
        let mut valid = Bits::with_capacity(self.valid.len() + nodes.len());
        let mut leaf_rank = 0;
        for node in Preorder::new(&self.tree) {
            if !self.tree.isleaf(node) {
                continue;
            }
            if targets[node] {
                valid.push(true);
                valid.push(true);
            } else {
                valid.push(self.valid.get(leaf_rank).is_some_and(|bit| *bit));
            }
            leaf_rank += 1;
        }

        self.tree.subdivide_leaves(nodes)?;
        self.valid = valid;
        self.rebuild();
        Ok(())
    }

    /// Recompute the node-to-cell index after a change of shape.
    fn rebuild(&mut self) {
        let mut marker = bitvec![u64, Lsb0; 0; self.tree.size()];
        let mut leaf_rank = 0;
        for node in Preorder::new(&self.tree) {
            if self.tree.isleaf(node) {
                if self.valid.get(leaf_rank).is_some_and(|bit| *bit) {
                    marker.set(node, true);
                }
                leaf_rank += 1;
            }
        }
        self.cells = RankSelect::build(marker);
    }
}

impl<T: Tree> Grid for TreeGrid<T> {
    #[inline]
    fn size(&self) -> usize {
        self.cells.count_ones()
    }

    #[inline]
    fn dimension(&self) -> usize {
        self.bounds.dimension()
    }

    fn bounds(&self) -> &RectGeo {
        &self.bounds
    }

    fn periodicity(&self) -> &[bool] {
        &self.periodic
    }

    fn geometry(&self, element: GridElement) -> Result<RectGeo, GridError> {
        let node = self.grid_to_tree(element)?;
        self.node_geometry(node)
    }

    fn depth(&self, element: GridElement) -> Result<usize, GridError> {
        let node = self.grid_to_tree(element)?;
        Ok(self.tree.depth(node))
    }

    fn cover(&self, geo: &Geo) -> Vec<GridElement> {
        self.cover_geo(geo)
    }

    fn subset(&self, other: &Self) -> Vec<GridElement> {
        let mut result = Vec::new();
        let mut work_stack = vec![(self.tree.begin(), other.tree.begin())];
        while let Some((this_it, other_it)) = work_stack.pop() {
            if other.tree.isleaf(other_it) {
                if other.tree_to_grid(other_it).is_some() {
                    result.extend(self.cells_below(this_it));
                }
                continue;
            }
            if self.tree.isleaf(this_it) {
                // Coarser here than in `other`: keep the cell if any valid
                // leaf of `other` lies below.
                if let Some(element) = self.tree_to_grid(this_it) {
                    if !other.cells_below(other_it).is_empty() {
                        result.push(element);
                    }
                }
                continue;
            }
            work_stack.push((self.tree.right(this_it), other.tree.right(other_it)));
            work_stack.push((self.tree.left(this_it), other.tree.left(other_it)));
        }
        result.sort_unstable();
        result
    }

    fn subgrid(&self, elements: &[GridElement]) -> Result<Self, GridError> {
        let mut leaves = Vec::with_capacity(elements.len());
        for &element in elements {
            leaves.push(self.grid_to_tree(element)?);
        }
        let compressed = self.tree.subtree(&leaves)?;
        let mut grid = Self {
            tree: T::from_leaf_sequence(compressed.leaf_sequence())?,
            bounds: self.bounds.clone(),
            periodic: self.periodic.clone(),
            valid: compressed.valid_sequence().to_bitvec(),
            cells: RankSelect::default(),
        };
        grid.rebuild();
        Ok(grid)
    }

    fn subdivide(&mut self) -> Result<(), GridError> {
        let nodes: Vec<TreeIndex> = self.cells.bits().iter_ones().collect();
        self.subdivide_nodes(&nodes)
    }

    fn adjoin(&mut self, other: &Self) -> Result<(), GridError> {
        if other.dimension() != self.dimension() {
            return Err(GridError::DimensionMismatch {
                expected: self.dimension(),
                actual: other.dimension(),
            });
        }

        // Lockstep walk; a leaf hands its validity down to whatever the
        // other tree splits it into.
        let mut leaf_sequence = Bits::with_capacity(self.tree.size().max(other.tree.size()));
        let mut valid = Bits::with_capacity(self.valid.len().max(other.valid.len()));
        let mut work_stack = vec![(
            Some(self.tree.begin()),
            false,
            Some(other.tree.begin()),
            false,
        )];
        while let Some((this_it, this_valid, other_it, other_valid)) = work_stack.pop() {
            let this_split = this_it.is_some_and(|node| !self.tree.isleaf(node));
            let other_split = other_it.is_some_and(|node| !other.tree.isleaf(node));
            let this_valid =
                this_valid || this_it.is_some_and(|node| self.tree_to_grid(node).is_some());
            let other_valid =
                other_valid || other_it.is_some_and(|node| other.tree_to_grid(node).is_some());
            if !(this_split || other_split) {
                leaf_sequence.push(false);
                valid.push(this_valid || other_valid);
                continue;
            }
            leaf_sequence.push(true);
            let this_children = this_it
                .filter(|_| this_split)
                .map(|node| (self.tree.left(node), self.tree.right(node)));
            let other_children = other_it
                .filter(|_| other_split)
                .map(|node| (other.tree.left(node), other.tree.right(node)));
            work_stack.push((
                this_children.map(|(_, right)| right),
                this_valid,
                other_children.map(|(_, right)| right),
                other_valid,
            ));
            work_stack.push((
                this_children.map(|(left, _)| left),
                this_valid,
                other_children.map(|(left, _)| left),
                other_valid,
            ));
        }

        self.tree.assign(&leaf_sequence)?;
        self.valid = valid;
        self.rebuild();
        Ok(())
    }

    fn memory(&self) -> usize {
        std::mem::size_of::<Self>()
            + self.tree.memory()
            + self.cells.memory()
            + self.valid.as_raw_slice().len() * std::mem::size_of::<u64>()
            + 2 * self.bounds.dimension() * std::mem::size_of::<f64>()
            + self.periodic.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::{PointerGrid, SuccinctGrid};

    fn unit_square<T: Tree>() -> TreeGrid<T> {
        TreeGrid::new(RectGeo::new(vec![0.0, 0.0], vec![1.0, 1.0]))
    }

    #[test]
    fn first_split_halves_axis_zero() {
        let mut grid: PointerGrid = unit_square();
        grid.subdivide().unwrap();
        assert_eq!(grid.size(), 2);
        assert_eq!(
            grid.geometry(0).unwrap(),
            RectGeo::new(vec![0.0, 0.0], vec![0.5, 1.0])
        );
        assert_eq!(
            grid.geometry(1).unwrap(),
            RectGeo::new(vec![0.5, 0.0], vec![1.0, 1.0])
        );
        grid.subdivide().unwrap();
        assert_eq!(grid.size(), 4);
        assert_eq!(grid.depth(3).unwrap(), 2);
    }

    #[test]
    fn geometry_out_of_range_is_an_error() {
        let grid: SuccinctGrid = unit_square();
        assert_eq!(
            grid.geometry(1).unwrap_err(),
            GridError::OutOfRange {
                element: 1,
                size: 1
            }
        );
        assert_eq!(
            grid.node_geometry(5).unwrap_err(),
            GridError::ForeignElement { node: 5 }
        );
    }

    #[test]
    fn subgrid_keeps_selected_cells_only() {
        let mut grid: SuccinctGrid = unit_square();
        for _ in 0..3 {
            grid.subdivide().unwrap();
        }
        let picked = [1, 6];
        let sub = grid.subgrid(&picked).unwrap();
        assert_eq!(sub.size(), 2);
        let mut expected: Vec<RectGeo> =
            picked.iter().map(|&e| grid.geometry(e).unwrap()).collect();
        let mut actual: Vec<RectGeo> = sub.elements().map(|e| sub.geometry(e).unwrap()).collect();
        let key = |r: &RectGeo| (r.lower_bounds[0].to_bits(), r.lower_bounds[1].to_bits());
        expected.sort_by_key(key);
        actual.sort_by_key(key);
        assert_eq!(expected, actual);
        assert_eq!(grid.subset(&sub), picked.to_vec());
    }

    #[test]
    fn subgrid_subdivision_ignores_ghost_leaves() {
        let mut grid: PointerGrid = unit_square();
        grid.subdivide().unwrap();
        grid.subdivide().unwrap();
        let mut sub = grid.subgrid(&[0]).unwrap();
        assert_eq!(sub.size(), 1);
        sub.subdivide().unwrap();
        assert_eq!(sub.size(), 2);
        let cell = grid.geometry(0).unwrap();
        for element in sub.elements() {
            assert!(cell.contains(&sub.geometry(element).unwrap()));
        }
    }

    #[test]
    fn subgrid_rejects_unknown_elements() {
        let grid: PointerGrid = unit_square();
        assert!(matches!(
            grid.subgrid(&[3]),
            Err(GridError::OutOfRange { element: 3, .. })
        ));
    }

    #[test]
    fn compressed_round_trip_preserves_cells() {
        let mut grid: PointerGrid = unit_square();
        grid.subdivide().unwrap();
        grid.subdivide_elements(&[1]).unwrap();
        let sub = grid.subgrid(&[0, 2]).unwrap();
        let restored = SuccinctGrid::from_compressed(&sub.compress()).unwrap();
        assert_eq!(restored.size(), sub.size());
        assert_eq!(restored.compress(), sub.compress());
    }

    #[test]
    fn adjoin_keeps_the_cells_of_both_grids() {
        let mut grid: PointerGrid = unit_square();
        grid.subdivide().unwrap();
        grid.subdivide().unwrap();
        let left = grid.subgrid(&[0]).unwrap();
        let mut right = grid.subgrid(&[3]).unwrap();
        right.subdivide().unwrap();

        let mut union = left.clone();
        union.adjoin(&right).unwrap();
        assert_eq!(union.size(), left.size() + right.size());
        assert_eq!(union.subset(&left).len(), 1);
        assert_eq!(union.subset(&right).len(), 2);

        let mut expected = left.tree().clone();
        expected.adjoin(right.tree()).unwrap();
        assert_eq!(union.tree().leaf_sequence(), expected.leaf_sequence());

        // A coarse cell absorbs the finer pieces of the same region.
        let mut coarse = grid.subgrid(&[3]).unwrap();
        coarse.adjoin(&right).unwrap();
        assert_eq!(coarse.size(), 2);
    }

    #[test]
    fn join_of_nothing_is_none() {
        let grids: Vec<SuccinctGrid> = Vec::new();
        assert!(SuccinctGrid::join(&grids).unwrap().is_none());

        let mut grid: SuccinctGrid = unit_square();
        grid.subdivide().unwrap();
        let parts = [grid.subgrid(&[0]).unwrap(), grid.subgrid(&[1]).unwrap()];
        let joined = SuccinctGrid::join(&parts).unwrap().unwrap();
        assert_eq!(joined.compress(), grid.compress());
    }

    #[test]
    fn splitting_stops_at_the_fixed_point_resolution() {
        let mut grid = PointerGrid::new(RectGeo::new(vec![0.0], vec![1.0]));
        let deepest = |grid: &PointerGrid| {
            grid.elements()
                .max_by_key(|&e| grid.depth(e).unwrap())
                .unwrap()
        };
        for _ in 0..60 {
            let cell = deepest(&grid);
            grid.subdivide_elements(&[cell]).unwrap();
        }
        let cell = deepest(&grid);
        assert_eq!(grid.depth(cell).unwrap(), 60);
        let rect = grid.geometry(cell).unwrap();
        assert!(rect.is_well_formed());
        assert!(grid.cover(&Geo::Rect(rect)).contains(&cell));
        assert!(matches!(
            grid.subdivide_elements(&[cell]),
            Err(GridError::DepthLimit { depth: 60, limit: 60, .. })
        ));
    }

    #[test]
    fn periodicity_must_match_dimension() {
        let err = PointerGrid::with_periodicity(RectGeo::unit(2), vec![true]).unwrap_err();
        assert_eq!(
            err,
            GridError::DimensionMismatch {
                expected: 2,
                actual: 1
            }
        );
    }
}
