use bitvec::prelude::*;

use super::{validate_leaf_sequence, Node, Tree, TreeError, TreeIndex};

/// Full binary tree stored as an arena of linked nodes.
///
/// Node ids are arena positions: the root is `0` and every split appends the
/// two new children at the end. Splitting one leaf is O(1), so targeted
/// refinement never touches the rest of the tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PointerTree {
    nodes: Vec<Node>,
    leaf_count: usize,
}

impl Default for PointerTree {
    fn default() -> Self {
        Self {
            nodes: vec![Node::root()],
            leaf_count: 1,
        }
    }
}

impl PointerTree {
    /// Single-node tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Arena node behind `it`.
    pub fn node(&self, it: TreeIndex) -> Option<&Node> {
        self.nodes.get(it)
    }

    fn split(&mut self, leaf: TreeIndex) {
        let left = self.nodes.len();
        let right = left + 1;
        self.nodes.push(Node::child_of(leaf));
        self.nodes.push(Node::child_of(leaf));
        let node = &mut self.nodes[leaf];
        node.left = Some(left);
        node.right = Some(right);
        self.leaf_count += 1;
    }

    fn check_leaf(&self, it: TreeIndex) -> Result<(), TreeError> {
        match self.nodes.get(it) {
            None => Err(TreeError::OutOfRange {
                index: it,
                size: self.nodes.len(),
            }),
            Some(node) if !node.is_leaf() => Err(TreeError::ForeignElement { index: it }),
            Some(_) => Ok(()),
        }
    }
}

impl Tree for PointerTree {
    #[inline]
    fn size(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    fn leaf_count(&self) -> usize {
        self.leaf_count
    }

    #[inline]
    fn parent(&self, it: TreeIndex) -> TreeIndex {
        self.nodes
            .get(it)
            .and_then(|node| node.parent)
            .unwrap_or(self.nodes.len())
    }

    #[inline]
    fn left(&self, it: TreeIndex) -> TreeIndex {
        self.nodes
            .get(it)
            .and_then(|node| node.left)
            .unwrap_or(self.nodes.len())
    }

    #[inline]
    fn right(&self, it: TreeIndex) -> TreeIndex {
        self.nodes
            .get(it)
            .and_then(|node| node.right)
            .unwrap_or(self.nodes.len())
    }

    #[inline]
    fn isleaf(&self, it: TreeIndex) -> bool {
        self.nodes.get(it).is_some_and(Node::is_leaf)
    }

    fn subdivide(&mut self) {
        let leaves: Vec<TreeIndex> = (0..self.nodes.len())
            .filter(|&it| self.nodes[it].is_leaf())
            .collect();
        self.nodes.reserve(2 * leaves.len());
        for leaf in leaves {
            self.split(leaf);
        }
    }

    fn subdivide_leaves(&mut self, leaves: &[TreeIndex]) -> Result<(), TreeError> {
        for &leaf in leaves {
            self.check_leaf(leaf)?;
        }
        let mut targets = leaves.to_vec();
        targets.sort_unstable();
        targets.dedup();
        self.nodes.reserve(2 * targets.len());
        for leaf in targets {
            self.split(leaf);
        }
        Ok(())
    }

    fn assign(&mut self, leaf_sequence: &BitSlice<u64, Lsb0>) -> Result<(), TreeError> {
        let leaves = validate_leaf_sequence(leaf_sequence)?;

        let mut nodes: Vec<Node> = Vec::with_capacity(leaf_sequence.len());
        // Internal nodes still waiting for their right child.
        let mut path_to_root: Vec<TreeIndex> = Vec::new();
        for bit in leaf_sequence.iter() {
            let id = nodes.len();
            let parent = path_to_root.last().copied();
            nodes.push(match parent {
                Some(parent) => Node::child_of(parent),
                None => Node::root(),
            });
            if let Some(parent) = parent {
                if nodes[parent].left.is_none() {
                    nodes[parent].left = Some(id);
                } else {
                    nodes[parent].right = Some(id);
                    path_to_root.pop();
                }
            }
            if *bit {
                path_to_root.push(id);
            }
        }

        self.nodes = nodes;
        self.leaf_count = leaves;
        Ok(())
    }

    fn adjoin<O: Tree>(&mut self, other: &O) -> Result<(), TreeError> {
        let mut work_stack = vec![(self.begin(), other.begin())];
        while let Some((this_it, other_it)) = work_stack.pop() {
            if other.isleaf(other_it) {
                continue;
            }
            if self.nodes[this_it].is_leaf() {
                self.split(this_it);
            }
            let node = self.nodes[this_it];
            if let (Some(left), Some(right)) = (node.left, node.right) {
                work_stack.push((right, other.right(other_it)));
                work_stack.push((left, other.left(other_it)));
            }
        }
        Ok(())
    }

    fn memory(&self) -> usize {
        std::mem::size_of::<Self>() + self.nodes.capacity() * std::mem::size_of::<Node>()
    }
}
