use tracing::{debug, debug_span, info, info_span};

use super::{MorseConfig, MorseError, MorseGraph, Vertex};
use crate::geometry::{Geo, RectGeo};
use crate::graph::{compute_reachability, compute_strong_components, MapGraph};
use crate::grid::Grid;
use crate::map::{Map, MapBoundary};

/// Counters from one run of [`compute_morse_graph_with_stats`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RefinementStats {
    /// Uniform subdivisions applied to reach the minimum depth.
    pub initial_subdivisions: usize,
    /// Map graphs built and decomposed.
    pub decompositions: usize,
    /// Morse sets subdivided for further refinement.
    pub subdivisions: usize,
    /// Morse sets frozen into vertices.
    pub frozen_sets: usize,
    /// Refined sets in which no recurrence survived.
    pub spurious_sets: usize,
    /// Cells discarded as transient.
    pub transient_cells: usize,
    /// Map evaluations.
    pub map_evaluations: u64,
    /// Map evaluations replaced by the fallback region.
    pub map_failures: u64,
    /// Largest map graph, in bytes.
    pub peak_graph_memory: usize,
    /// Largest grid decomposed, in bytes.
    pub peak_grid_memory: usize,
}

/// Node of the decomposition hierarchy.
///
/// Children always sit at larger indices than their parent.
#[derive(Debug)]
struct Decomposition<G> {
    grid: Option<G>,
    depth: usize,
    frozen: bool,
    children: Vec<usize>,
    /// Morse-set reachability between `children`, by child position.
    reach: Vec<Vec<usize>>,
}

impl<G> Decomposition<G> {
    fn new(grid: G, depth: usize, frozen: bool) -> Self {
        Self {
            grid: Some(grid),
            depth,
            frozen,
            children: Vec::new(),
            reach: Vec::new(),
        }
    }
}

/// Morse graph of `map` over `grid`.
///
/// See [`compute_morse_graph_with_stats`].
pub fn compute_morse_graph<G, M>(
    grid: G,
    map: &M,
    config: &MorseConfig,
) -> Result<MorseGraph<G>, MorseError>
where
    G: Grid,
    M: Map + ?Sized,
{
    compute_morse_graph_with_stats(grid, map, config).map(|(graph, _)| graph)
}

/// Morse graph of `map` over `grid`, with run counters.
///
/// `grid` is first subdivided uniformly until its deepest cell reaches
/// `min_depth`. Then each Morse set found is either frozen (at `max_depth`,
/// or when it has more than `complexity_limit` cells) or subdivided once and
/// decomposed again. Transient cells are dropped for good at the resolution
/// where they are found. Frozen sets become vertices; reachability found
/// between two sets becomes edges between every vertex descending from the
/// one and every vertex descending from the other. The union of all vertex
/// grids is kept as [`MorseGraph::phase_space`].
///
/// The result depends only on the inputs: sets are processed in a fixed
/// order and the map is the only source of data.
pub fn compute_morse_graph_with_stats<G, M>(
    mut grid: G,
    map: &M,
    config: &MorseConfig,
) -> Result<(MorseGraph<G>, RefinementStats), MorseError>
where
    G: Grid,
    M: Map + ?Sized,
{
    if config.min_depth > config.max_depth {
        return Err(MorseError::InvalidConfiguration {
            reason: format!(
                "min_depth {} exceeds max_depth {}",
                config.min_depth, config.max_depth
            ),
        });
    }
    if !map.good() {
        return Err(MorseError::MapUnavailable);
    }

    let _span = info_span!(
        "compute_morse_graph",
        min_depth = config.min_depth,
        max_depth = config.max_depth,
        complexity_limit = config.complexity_limit
    )
    .entered();

    let mut stats = RefinementStats::default();
    while grid.max_depth() < config.min_depth {
        grid.subdivide()?;
        stats.initial_subdivisions += 1;
    }

    let mut boundary = MapBoundary::new(
        map,
        grid.bounds(),
        &config.fallback,
        config.failure_log_interval,
    );

    // No cells, same bounds and periodicity.
    let mut phase_space = grid.subgrid(&[])?;
    let root_depth = grid.max_depth();
    let mut hierarchy = vec![Decomposition::new(grid, root_depth, false)];
    let mut work_stack = vec![0usize];

    while let Some(node) = work_stack.pop() {
        let Some(grid) = hierarchy[node].grid.take() else {
            continue;
        };
        let depth = hierarchy[node].depth;
        let (sets, reach) = decompose(&grid, depth, &mut boundary, &mut stats)?;
        drop(grid);

        if sets.is_empty() && node != 0 {
            stats.spurious_sets += 1;
            debug!(depth, "refined set holds no recurrence");
        }
        hierarchy[node].reach = reach;

        let mut refine = Vec::new();
        for mut set in sets {
            let child = hierarchy.len();
            let frozen = depth >= config.max_depth || set.size() > config.complexity_limit;
            let child_depth = if frozen {
                stats.frozen_sets += 1;
                depth
            } else {
                set.subdivide()?;
                stats.subdivisions += 1;
                refine.push(child);
                depth + 1
            };
            hierarchy.push(Decomposition::new(set, child_depth, frozen));
            hierarchy[node].children.push(child);
        }
        work_stack.extend(refine.into_iter().rev());
    }

    stats.map_evaluations = boundary.evaluations();
    stats.map_failures = boundary.failures();

    let mut graph = assemble(hierarchy);
    for v in graph.vertices() {
        phase_space.adjoin(graph.grid(v))?;
    }
    graph.set_phase_space(phase_space);
    info!(
        vertices = graph.num_vertices(),
        edges = graph.num_edges(),
        decompositions = stats.decompositions,
        map_failures = stats.map_failures,
        "morse graph complete"
    );
    Ok((graph, stats))
}

/// One map graph and SCC pass: the Morse sets of `grid` as subgrids, with
/// their reachability.
fn decompose<G, M>(
    grid: &G,
    depth: usize,
    boundary: &mut MapBoundary<'_, M>,
    stats: &mut RefinementStats,
) -> Result<(Vec<G>, Vec<Vec<usize>>), MorseError>
where
    G: Grid,
    M: Map + ?Sized,
{
    let _span = debug_span!("decompose", depth, cells = grid.size()).entered();
    stats.decompositions += 1;
    stats.peak_grid_memory = stats.peak_grid_memory.max(grid.memory());

    let graph = MapGraph::build(grid, |rect: &RectGeo| -> Result<Geo, MorseError> {
        Ok(boundary.evaluate(rect)?)
    })?;
    stats.peak_graph_memory = stats.peak_graph_memory.max(graph.memory());

    let scc = compute_strong_components(&graph);
    let transient = grid.size() - scc.recurrent_vertex_count();
    stats.transient_cells += transient;
    let reach = compute_reachability(&graph, &scc);

    let mut sets = Vec::new();
    for c in scc.recurrent_components() {
        sets.push(grid.subgrid(&scc.components[c])?);
    }
    debug!(
        edges = graph.num_edges(),
        morse_sets = sets.len(),
        transient,
        "decomposed"
    );
    Ok((sets, reach))
}

/// Turn a finished hierarchy into the Morse graph.
fn assemble<G: Grid>(mut hierarchy: Vec<Decomposition<G>>) -> MorseGraph<G> {
    let mut graph = MorseGraph::new();
    let mut under: Vec<Vec<Vertex>> = vec![Vec::new(); hierarchy.len()];
    for (index, node) in hierarchy.iter_mut().enumerate() {
        if !node.frozen {
            continue;
        }
        if let Some(grid) = node.grid.take() {
            under[index].push(graph.add_vertex(grid, node.depth));
        }
    }

    // Children first, so every child's vertex list is final when its parent
    // lifts reachability onto it.
    for index in (0..hierarchy.len()).rev() {
        let node = &hierarchy[index];
        for (i, targets) in node.reach.iter().enumerate() {
            for &j in targets {
                for &u in &under[node.children[i]] {
                    for &v in &under[node.children[j]] {
                        graph.add_edge(u, v);
                    }
                }
            }
        }
        if node.frozen {
            continue;
        }
        let mut collected = Vec::new();
        for &child in &node.children {
            collected.append(&mut under[child]);
        }
        under[index] = collected;
    }
    graph
}
