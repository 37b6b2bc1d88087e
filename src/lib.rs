//! # Morse Decompositions over Adaptive Binary-Tree Grids
//!
//! This library computes Morse decompositions of box maps: a phase-space box
//! is cut into cells by a binary tree, a conservative map is imaged on every
//! cell, and the recurrent strongly connected components of the resulting
//! cell graph are refined until a depth or size limit is reached.
//!
//! ## Core Pieces
//!
//! 1. **Trees**: full binary trees behind one trait, as a pointer arena or as
//!    balanced parentheses with rank/select (about two bits per node)
//! 2. **Grids**: tree leaves as cells, with a fixed-point iterative cover
//!    that never recurses
//! 3. **Graph theory**: iterative Tarjan, condensation sweeps and 64-way
//!    bitmask reachability
//! 4. **Refinement**: the decomposition hierarchy that turns all of the
//!    above into a [`MorseGraph`]
//!
//! ## Usage Example
//!
//! ```
//! use morsedb::{compute_morse_graph, Geo, Grid, MapError, MorseConfig, RectGeo, SuccinctGrid};
//!
//! // Everything flows to the point (0.3, 0.3).
//! let map = |_: &RectGeo| -> Result<Geo, MapError> {
//!     Ok(RectGeo::point(vec![0.3, 0.3]).into())
//! };
//! let grid = SuccinctGrid::new(RectGeo::unit(2));
//! let config = MorseConfig::new(4, 8, 100)?;
//! let graph = compute_morse_graph(grid, &map, &config)?;
//! assert_eq!(graph.num_vertices(), 1);
//! assert_eq!(graph.grid(0).size(), 1);
//! # Ok::<(), morsedb::MorseError>(())
//! ```

#![warn(missing_docs, missing_debug_implementations)]
#![allow(clippy::new_without_default)]

pub mod succinct;   // Rank/select and balanced parentheses
pub mod tree;       // Full binary trees: pointer arena and succinct
pub mod geometry;   // Boxes, prisms and their unions/intersections
pub mod grid;       // Tree-indexed grids and the box cover
pub mod graph;      // Map graphs, SCCs, reachability
pub mod map;        // Box maps and the failure boundary
pub mod morse;      // Refinement loop and Morse graphs

// Re-exports for convenience
pub use geometry::{Geo, IntersectionGeo, PrismGeo, RectGeo, UnionGeo};
pub use grid::{CompressedGrid, Grid, GridElement, GridError, PointerGrid, SuccinctGrid, TreeGrid};
pub use map::{CachedMap, FallbackPolicy, Interval, LeslieMap, Map, MapError};
pub use morse::{
    compute_morse_graph, compute_morse_graph_with_stats, MorseConfig, MorseError, MorseGraph,
    RefinementStats,
};
pub use tree::{CompressedTree, PointerTree, SuccinctTree, Tree, TreeError, TreeIndex};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backends_agree_on_a_small_run() {
        let map = LeslieMap::from_parameter_box(&RectGeo::new(vec![19.0, 19.0], vec![19.5, 19.5]));
        let bounds = RectGeo::new(vec![0.0, 0.0], vec![320.0, 224.0]);
        let config = MorseConfig::new(8, 10, 500).unwrap();
        let pointer = compute_morse_graph(PointerGrid::new(bounds.clone()), &map, &config).unwrap();
        let succinct = compute_morse_graph(SuccinctGrid::new(bounds), &map, &config).unwrap();

        // Cell numbering differs between backends; the sets themselves do not.
        fn shape<G: Grid>(graph: &MorseGraph<G>) -> Vec<(usize, usize)> {
            let mut sizes: Vec<(usize, usize)> = graph
                .vertices()
                .map(|v| (graph.depth(v), graph.grid(v).size()))
                .collect();
            sizes.sort_unstable();
            sizes
        }
        assert_eq!(shape(&pointer), shape(&succinct));
        assert_eq!(pointer.num_edges(), succinct.num_edges());
    }
}
