#![allow(dead_code)]

use morsedb::tree::Preorder;
use morsedb::{Geo, Grid, GridElement, MapError, RectGeo, Tree, TreeGrid, TreeIndex};

/// Leaves of `tree` in pre-order.
pub fn preorder_leaves<T: Tree>(tree: &T) -> Vec<TreeIndex> {
    Preorder::new(tree).filter(|&node| tree.isleaf(node)).collect()
}

/// Apply rounds of targeted subdivision; each pick selects a leaf by its
/// pre-order rank modulo the leaf count, so every backend sees the same
/// shape regardless of how it numbers nodes.
pub fn grow<T: Tree>(tree: &mut T, rounds: &[Vec<usize>]) {
    for picks in rounds {
        let leaves = preorder_leaves(tree);
        let targets: Vec<TreeIndex> = picks.iter().map(|&p| leaves[p % leaves.len()]).collect();
        tree.subdivide_leaves(&targets).expect("picked nodes are leaves");
    }
}

/// Same as [`grow`] on a grid, picking among its cells in pre-order.
pub fn grow_grid<T: Tree>(grid: &mut TreeGrid<T>, rounds: &[Vec<usize>]) {
    for picks in rounds {
        let cells = preorder_cells(grid);
        let targets: Vec<GridElement> = picks.iter().map(|&p| cells[p % cells.len()]).collect();
        grid.subdivide_elements(&targets).expect("picked cells exist");
    }
}

/// Cells of `grid` in the pre-order of their leaves.
pub fn preorder_cells<T: Tree>(grid: &TreeGrid<T>) -> Vec<GridElement> {
    preorder_leaves(grid.tree())
        .into_iter()
        .filter_map(|leaf| grid.tree_to_grid(leaf))
        .collect()
}

/// Uniformly subdivided grid.
pub fn uniform_grid<T: Tree>(bounds: RectGeo, depth: usize) -> TreeGrid<T> {
    let mut grid = TreeGrid::new(bounds);
    for _ in 0..depth {
        grid.subdivide().expect("uniform subdivision succeeds");
    }
    grid
}

/// Map sending everything to a single point.
pub fn constant_map(point: Vec<f64>) -> impl Fn(&RectGeo) -> Result<Geo, MapError> {
    move |_: &RectGeo| Ok(RectGeo::point(point.clone()).into())
}

/// Box enclosing all cells of `grid`.
pub fn hull_of<G: Grid>(grid: &G) -> Option<RectGeo> {
    grid.elements()
        .filter_map(|element| grid.geometry(element).ok())
        .reduce(|hull, cell| hull.hull(&cell))
}
