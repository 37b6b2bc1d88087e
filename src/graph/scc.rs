use bitvec::prelude::*;

use super::Digraph;

const UNVISITED: usize = usize::MAX;

/// Strongly connected components of a digraph.
///
/// Components are stored in the order Tarjan's algorithm closes them, which
/// is reverse topological: a component never reaches one stored after it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StrongComponents {
    /// Members of each component, ascending.
    pub components: Vec<Vec<usize>>,
    /// Component indices, sources first.
    pub topological_order: Vec<usize>,
    /// Component index of every vertex.
    pub component_of: Vec<usize>,
    /// Root vertex of every component (first vertex the search entered).
    pub roots: Vec<usize>,
    /// Whether each component carries a cycle (size > 1 or a self-loop).
    pub recurrent: Vec<bool>,
}

impl StrongComponents {
    /// Number of components.
    pub fn len(&self) -> usize {
        self.components.len()
    }

    /// True for the empty graph.
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// Root vertex of the component holding `v`.
    pub fn scc_root(&self, v: usize) -> usize {
        self.roots[self.component_of[v]]
    }

    /// Recurrent component indices in topological order.
    pub fn recurrent_components(&self) -> Vec<usize> {
        self.topological_order
            .iter()
            .copied()
            .filter(|&c| self.recurrent[c])
            .collect()
    }

    /// Vertices lying in a recurrent component.
    pub fn recurrent_vertex_count(&self) -> usize {
        self.components
            .iter()
            .zip(&self.recurrent)
            .filter(|(_, recurrent)| **recurrent)
            .map(|(members, _)| members.len())
            .sum()
    }

    /// Condensation: component-level successors, sorted, no self-edges.
    pub fn condensation<G: Digraph>(&self, graph: &G) -> Vec<Vec<usize>> {
        let mut dag = vec![Vec::new(); self.len()];
        for (c, members) in self.components.iter().enumerate() {
            let successors = &mut dag[c];
            for &v in members {
                for &w in graph.successors(v) {
                    let target = self.component_of[w];
                    if target != c {
                        successors.push(target);
                    }
                }
            }
            successors.sort_unstable();
            successors.dedup();
        }
        dag
    }
}

/// Iterative Tarjan.
///
/// Vertices are entered in increasing order and successors are scanned in
/// stored order, so the output depends only on the graph.
pub fn compute_strong_components<G: Digraph>(graph: &G) -> StrongComponents {
    let n = graph.num_vertices();
    let mut index = vec![UNVISITED; n];
    let mut lowlink = vec![0usize; n];
    let mut on_stack = bitvec![u64, Lsb0; 0; n];
    let mut self_loop = bitvec![u64, Lsb0; 0; n];
    let mut stack = Vec::new();
    let mut call_stack: Vec<(usize, usize)> = Vec::new();
    let mut next_index = 0usize;

    let mut result = StrongComponents {
        components: Vec::new(),
        topological_order: Vec::new(),
        component_of: vec![UNVISITED; n],
        roots: Vec::new(),
        recurrent: Vec::new(),
    };

    for start in 0..n {
        if index[start] != UNVISITED {
            continue;
        }
        index[start] = next_index;
        lowlink[start] = next_index;
        next_index += 1;
        stack.push(start);
        on_stack.set(start, true);
        call_stack.push((start, 0));

        while let Some((v, position)) = call_stack.pop() {
            if let Some(&w) = graph.successors(v).get(position) {
                call_stack.push((v, position + 1));
                if w == v {
                    self_loop.set(v, true);
                } else if index[w] == UNVISITED {
                    index[w] = next_index;
                    lowlink[w] = next_index;
                    next_index += 1;
                    stack.push(w);
                    on_stack.set(w, true);
                    call_stack.push((w, 0));
                } else if on_stack[w] {
                    lowlink[v] = lowlink[v].min(index[w]);
                }
                continue;
            }

            // `v` is finished; its caller is back on top.
            if let Some(&(caller, _)) = call_stack.last() {
                lowlink[caller] = lowlink[caller].min(lowlink[v]);
            }
            if lowlink[v] != index[v] {
                continue;
            }

            let component = result.components.len();
            let mut members = Vec::new();
            while let Some(w) = stack.pop() {
                on_stack.set(w, false);
                result.component_of[w] = component;
                members.push(w);
                if w == v {
                    break;
                }
            }
            members.sort_unstable();
            let recurrent = members.len() > 1 || self_loop[v];
            result.components.push(members);
            result.roots.push(v);
            result.recurrent.push(recurrent);
        }
    }

    result.topological_order = (0..result.components.len()).rev().collect();
    result
}

#[cfg(test)]
mod tests {
    use super::*;

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
    fn cycle_and_tail() {
        // 0 -> 1 -> 2 -> 1, 2 -> 3
        let g = graph(&[(0, 1), (1, 2), (2, 1), (2, 3)], 4);
        let scc = compute_strong_components(&g);
        assert_eq!(scc.len(), 3);
        let cycle = scc.component_of[1];
        assert_eq!(scc.components[cycle], vec![1, 2]);
        assert!(scc.recurrent[cycle]);
        assert!(!scc.recurrent[scc.component_of[0]]);
        assert!(!scc.recurrent[scc.component_of[3]]);
        assert_eq!(scc.scc_root(2), scc.scc_root(1));
        assert_eq!(scc.recurrent_components(), vec![cycle]);
        assert_eq!(scc.recurrent_vertex_count(), 2);
    }

    #[test]
    fn self_loop_makes_singleton_recurrent() {
        let g = graph(&[(0, 0), (0, 1)], 2);
        let scc = compute_strong_components(&g);
        assert!(scc.recurrent[scc.component_of[0]]);
        assert!(!scc.recurrent[scc.component_of[1]]);
    }

    #[test]
    fn topological_order_respects_edges() {
        let g = graph(
            &[(0, 1), (1, 0), (1, 2), (2, 3), (3, 4), (4, 3), (0, 5), (5, 4)],
            6,
        );
        let scc = compute_strong_components(&g);
        let mut position = vec![0; scc.len()];
        for (rank, &c) in scc.topological_order.iter().enumerate() {
            position[c] = rank;
        }
        for (c, successors) in scc.condensation(&g).iter().enumerate() {
            for &d in successors {
                assert!(position[c] < position[d], "{c} -> {d} out of order");
            }
        }
    }

    #[test]
    fn deep_chain_does_not_recurse() {
        let n = 200_000;
        let g: Vec<Vec<usize>> = (0..n).map(|v| vec![(v + 1) % n]).collect();
        let scc = compute_strong_components(&g);
        assert_eq!(scc.len(), 1);
        assert_eq!(scc.components[0].len(), n);
    }

    #[test]
    fn empty_graph() {
        let g: Vec<Vec<usize>> = Vec::new();
        let scc = compute_strong_components(&g);
        assert!(scc.is_empty());
        assert!(scc.recurrent_components().is_empty());
    }
}
