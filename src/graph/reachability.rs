use bitvec::prelude::*;

use super::{Digraph, StrongComponents};
use crate::succinct::Bits;

/// Components reachable from any component in `sources`, sources included.
pub fn forward_sweep<G: Digraph>(
    graph: &G,
    scc: &StrongComponents,
    sources: &[usize],
) -> Bits {
    let dag = scc.condensation(graph);
    let mut reached = bitvec![u64, Lsb0; 0; scc.len()];
    for &c in sources {
        reached.set(c, true);
    }
    for &c in &scc.topological_order {
        if reached[c] {
            for &d in &dag[c] {
                reached.set(d, true);
            }
        }
    }
    reached
}

/// Components from which some component in `targets` is reachable, targets
/// included.
pub fn backward_sweep<G: Digraph>(
    graph: &G,
    scc: &StrongComponents,
    targets: &[usize],
) -> Bits {
    let dag = scc.condensation(graph);
    let mut reaching = bitvec![u64, Lsb0; 0; scc.len()];
    for &c in targets {
        reaching.set(c, true);
    }
    for &c in scc.topological_order.iter().rev() {
        if !reaching[c] && dag[c].iter().any(|&d| reaching[d]) {
            reaching.set(c, true);
        }
    }
    reaching
}

/// Reachability among the recurrent components.
///
/// Morse sets are numbered as in [`StrongComponents::recurrent_components`].
/// Entry `i` of the result lists, ascending, every other Morse set that some
/// path from set `i` reaches, possibly through transient cells. Sets are
/// processed 64 at a time with one machine word per component.
pub fn compute_reachability<G: Digraph>(graph: &G, scc: &StrongComponents) -> Vec<Vec<usize>> {
    let morse_sets = scc.recurrent_components();
    let mut morse_index = vec![usize::MAX; scc.len()];
    for (i, &c) in morse_sets.iter().enumerate() {
        morse_index[c] = i;
    }

    let dag = scc.condensation(graph);
    let mut reach = vec![Vec::new(); morse_sets.len()];
    let mut masks = vec![0u64; scc.len()];

    for group_start in (0..morse_sets.len()).step_by(64) {
        let group = group_start..(group_start + 64).min(morse_sets.len());
        masks.fill(0);
        for &c in scc.topological_order.iter().rev() {
            let below = dag[c].iter().fold(0u64, |mask, &d| mask | masks[d]);
            let i = morse_index[c];
            if i != usize::MAX {
                if group.contains(&i) {
                    masks[c] = below | (1 << (i - group_start));
                } else {
                    masks[c] = below;
                }
                let mut bits = below;
                while bits != 0 {
                    let offset = bits.trailing_zeros() as usize;
                    reach[i].push(group_start + offset);
                    bits &= bits - 1;
                }
            } else {
                masks[c] = below;
            }
        }
    }

    for targets in &mut reach {
        targets.sort_unstable();
    }
    reach
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::compute_strong_components;

    fn graph(edges: &[(usize, usize)], n: usize) -> Vec<Vec<usize>> {
        let mut adjacency = vec![Vec::new(); n];
        for &(from, to) in edges {
            adjacency[from].push(to);
        }
        for successors in &mut adjacency {
            successors.sort_unstable();
            successors.dedup();
        }
        adjacency
    }

    #[test]
    fn reachability_passes_through_transient_cells() {
        // Cycle {0,1} -> 2 (transient) -> self-loop 3; 4 self-loop, isolated.
        let g = graph(&[(0, 1), (1, 0), (1, 2), (2, 3), (3, 3), (4, 4)], 5);
        let scc = compute_strong_components(&g);
        let morse_sets = scc.recurrent_components();
        assert_eq!(morse_sets.len(), 3);
        let position = |v: usize| {
            morse_sets
                .iter()
                .position(|&c| c == scc.component_of[v])
                .unwrap()
        };

        let reach = compute_reachability(&g, &scc);
        assert_eq!(reach[position(0)], vec![position(3)]);
        assert!(reach[position(3)].is_empty());
        assert!(reach[position(4)].is_empty());
    }

    #[test]
    fn more_than_one_word_of_morse_sets() {
        // Chain of 130 self-loops: i -> i+1.
        let n = 130;
        let mut edges: Vec<(usize, usize)> = (0..n).map(|v| (v, v)).collect();
        edges.extend((0..n - 1).map(|v| (v, v + 1)));
        let g = graph(&edges, n);
        let scc = compute_strong_components(&g);
        let reach = compute_reachability(&g, &scc);
        assert_eq!(reach.len(), n);
        // Topological numbering puts vertex 0 first.
        assert_eq!(reach[0], (1..n).collect::<Vec<_>>());
        assert_eq!(reach[n - 2], vec![n - 1]);
        assert!(reach[n - 1].is_empty());
    }

    #[test]
    fn sweeps_follow_the_condensation() {
        let g = graph(&[(0, 1), (1, 2), (3, 2)], 4);
        let scc = compute_strong_components(&g);
        let c = |v: usize| scc.component_of[v];

        let forward = forward_sweep(&g, &scc, &[c(1)]);
        assert!(forward[c(1)] && forward[c(2)]);
        assert!(!forward[c(0)] && !forward[c(3)]);

        let backward = backward_sweep(&g, &scc, &[c(2)]);
        assert_eq!(backward.count_ones(), 4);
        let backward = backward_sweep(&g, &scc, &[c(1)]);
        assert!(backward[c(0)] && backward[c(1)]);
        assert!(!backward[c(3)]);
    }
}
