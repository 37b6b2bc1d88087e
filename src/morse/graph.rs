use std::collections::BTreeSet;
use std::ops::Range;

use crate::grid::Grid;

/// Vertex id of a [`MorseGraph`].
pub type Vertex = usize;

/// Directed graph of Morse sets.
///
/// Each vertex owns the grid of its Morse set. Edges record reachability and
/// are kept as a set, so adding an edge twice has no effect.
#[derive(Debug, Clone)]
pub struct MorseGraph<G> {
    grids: Vec<G>,
    depths: Vec<usize>,
    edges: BTreeSet<(Vertex, Vertex)>,
    phase_space: Option<G>,
}

impl<G> Default for MorseGraph<G> {
    fn default() -> Self {
        Self {
            grids: Vec::new(),
            depths: Vec::new(),
            edges: BTreeSet::new(),
            phase_space: None,
        }
    }
}

impl<G: Grid> MorseGraph<G> {
    /// Empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a vertex owning `grid`, a Morse set found at resolution `depth`.
    pub fn add_vertex(&mut self, grid: G, depth: usize) -> Vertex {
        self.grids.push(grid);
        self.depths.push(depth);
        self.grids.len() - 1
    }

    /// Add the edge `from -> to`; false if it was already present.
    ///
    /// # Panics
    /// If either vertex does not exist.
    pub fn add_edge(&mut self, from: Vertex, to: Vertex) -> bool {
        assert!(
            from < self.num_vertices() && to < self.num_vertices(),
            "edge ({from}, {to}) names a missing vertex"
        );
        self.edges.insert((from, to))
    }

    /// Grid holding the cells of every Morse set at once.
    pub fn phase_space(&self) -> Option<&G> {
        self.phase_space.as_ref()
    }

    /// Record the joined grid of all Morse sets.
    pub fn set_phase_space(&mut self, grid: G) {
        self.phase_space = Some(grid);
    }

    /// Remove the edge `from -> to`; false if it was absent.
    pub fn remove_edge(&mut self, from: Vertex, to: Vertex) -> bool {
        self.edges.remove(&(from, to))
    }

    /// Number of vertices.
    pub fn num_vertices(&self) -> usize {
        self.grids.len()
    }

    /// Number of edges.
    pub fn num_edges(&self) -> usize {
        self.edges.len()
    }

    /// All vertex ids.
    pub fn vertices(&self) -> Range<Vertex> {
        0..self.num_vertices()
    }

    /// All edges in lexicographic order.
    pub fn edges(&self) -> impl Iterator<Item = (Vertex, Vertex)> + '_ {
        self.edges.iter().copied()
    }

    /// Targets of edges leaving `v`, ascending.
    pub fn successors(&self, v: Vertex) -> impl Iterator<Item = Vertex> + '_ {
        self.edges
            .range((v, 0)..(v + 1, 0))
            .map(|&(_, target)| target)
    }

    /// Grid of the Morse set at `v`.
    pub fn grid(&self, v: Vertex) -> &G {
        &self.grids[v]
    }

    /// Resolution at which `v` was found.
    pub fn depth(&self, v: Vertex) -> usize {
        self.depths[v]
    }

    /// Total cells over all Morse sets.
    pub fn total_cells(&self) -> usize {
        self.grids.iter().map(Grid::size).sum()
    }

    /// Content hash of the graph.
    ///
    /// Covers every vertex's depth and cell boxes plus the edge set, so two
    /// runs that agree on labels hash equal exactly when they agree on content.
    pub fn fingerprint(&self) -> blake3::Hash {
        let mut hasher = blake3::Hasher::new();
        hasher.update(&(self.num_vertices() as u64).to_le_bytes());
        for v in self.vertices() {
            let grid = self.grid(v);
            hasher.update(&(self.depth(v) as u64).to_le_bytes());
            hasher.update(&(grid.size() as u64).to_le_bytes());
            for element in grid.elements() {
                if let Ok(rect) = grid.geometry(element) {
                    for x in rect.lower_bounds.iter().chain(&rect.upper_bounds) {
                        hasher.update(&x.to_bits().to_le_bytes());
                    }
                }
            }
        }
        for (from, to) in self.edges() {
            hasher.update(&(from as u64).to_le_bytes());
            hasher.update(&(to as u64).to_le_bytes());
        }
        hasher.finalize()
    }
}
