use super::Digraph;
use crate::geometry::{Geo, RectGeo};
use crate::grid::{Grid, GridElement, GridError};

/// Directed graph on the cells of a grid: `a -> b` when the image of cell
/// `a` meets cell `b`.
///
/// The map is evaluated once per cell while building; adjacency is stored in
/// compressed sparse rows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MapGraph {
    offsets: Vec<usize>,
    targets: Vec<GridElement>,
}

impl MapGraph {
    /// Image every cell of `grid` with `image` and cover the result.
    ///
    /// The first error from `image` aborts the build.
    pub fn build<G, E, F>(grid: &G, mut image: F) -> Result<Self, E>
    where
        G: Grid,
        E: From<GridError>,
        F: FnMut(&RectGeo) -> Result<Geo, E>,
    {
        let mut offsets = Vec::with_capacity(grid.size() + 1);
        let mut targets = Vec::new();
        offsets.push(0);
        for element in grid.elements() {
            let geometry = grid.geometry(element)?;
            let mut cover = grid.cover(&image(&geometry)?);
            cover.sort_unstable();
            cover.dedup();
            targets.extend(cover);
            offsets.push(targets.len());
        }
        Ok(Self { offsets, targets })
    }

    /// Graph from explicit adjacency lists.
    pub fn from_adjacency(adjacency: &[Vec<GridElement>]) -> Self {
        let mut offsets = Vec::with_capacity(adjacency.len() + 1);
        let mut targets = Vec::new();
        offsets.push(0);
        for successors in adjacency {
            let mut row = successors.clone();
            row.sort_unstable();
            row.dedup();
            targets.extend(row);
            offsets.push(targets.len());
        }
        Self { offsets, targets }
    }

    /// Number of edges.
    pub fn num_edges(&self) -> usize {
        self.targets.len()
    }

    /// True when `v` maps into itself.
    pub fn has_self_loop(&self, v: GridElement) -> bool {
        self.successors(v).binary_search(&v).is_ok()
    }

    /// Approximate heap footprint in bytes.
    pub fn memory(&self) -> usize {
        std::mem::size_of::<Self>()
            + (self.offsets.capacity() + self.targets.capacity()) * std::mem::size_of::<usize>()
    }
}

impl Digraph for MapGraph {
    fn num_vertices(&self) -> usize {
        self.offsets.len().saturating_sub(1)
    }

    fn successors(&self, v: usize) -> &[usize] {
        &self.targets[self.offsets[v]..self.offsets[v + 1]]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::PointerGrid;

    #[test]
    fn shift_map_on_a_line() {
        let mut grid = PointerGrid::new(RectGeo::new(vec![0.0], vec![4.0]));
        grid.subdivide().unwrap();
        grid.subdivide().unwrap();
        // x -> x + 1.5 clipped to the bounds.
        let graph = MapGraph::build(&grid, |rect: &RectGeo| -> Result<Geo, GridError> {
            let lower = (rect.lower_bounds[0] + 1.5).min(4.0);
            let upper = (rect.upper_bounds[0] + 1.5).min(4.0);
            Ok(RectGeo::new(vec![lower], vec![upper]).into())
        })
        .unwrap();

        assert_eq!(graph.num_vertices(), 4);
        assert_eq!(graph.successors(0), &[1, 2]);
        assert_eq!(graph.successors(1), &[2, 3]);
        assert_eq!(graph.successors(3), &[3]);
        assert!(graph.has_self_loop(3));
        assert!(!graph.has_self_loop(0));
        assert_eq!(graph.num_edges(), 6);
    }

    #[test]
    fn image_errors_abort_the_build() {
        let grid = PointerGrid::new(RectGeo::unit(1));
        let result = MapGraph::build(&grid, |_: &RectGeo| -> Result<Geo, GridError> {
            Err(GridError::ForeignElement { node: 9 })
        });
        assert_eq!(result.unwrap_err(), GridError::ForeignElement { node: 9 });
    }

    #[test]
    fn adjacency_rows_are_normalised() {
        let graph = MapGraph::from_adjacency(&[vec![2, 0, 2], vec![], vec![1]]);
        assert_eq!(graph.successors(0), &[0, 2]);
        assert!(graph.successors(1).is_empty());
        assert_eq!(graph.num_edges(), 3);
    }
}
