//! Directed graphs over grid cells
//!
//! The refinement loop turns a map into a [`MapGraph`] on the cells of a
//! grid, splits it into strongly connected components and propagates
//! reachability between the recurrent ones. All traversals are iterative so
//! that graphs with millions of cells cannot exhaust the call stack.

mod map_graph;
mod reachability;
mod scc;

pub use map_graph::MapGraph;
pub use reachability::{backward_sweep, compute_reachability, forward_sweep};
pub use scc::{compute_strong_components, StrongComponents};

/// Read access to a directed graph on vertices `0..num_vertices()`.
pub trait Digraph {
    /// Number of vertices.
    fn num_vertices(&self) -> usize;

    /// Out-neighbours of `v`, sorted and without repeats.
    fn successors(&self, v: usize) -> &[usize];
}

impl Digraph for Vec<Vec<usize>> {
    fn num_vertices(&self) -> usize {
        self.len()
    }

    fn successors(&self, v: usize) -> &[usize] {
        &self[v]
    }
}
