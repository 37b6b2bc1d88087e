//! Stack-based traversals
//!
//! Trees can be millions of nodes deep in the worst case, so nothing here
//! recurses: every walk keeps an explicit stack.

use super::{Tree, TreeIndex};
use crate::succinct::Bits;

/// Which child of its parent a node is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Left child (lower half along the split axis).
    Left,

    /// Right child (upper half along the split axis).
    Right,
}

/// Pre-order iterator over the node ids of a tree.
#[derive(Debug)]
pub struct Preorder<'a, T: Tree> {
    tree: &'a T,
    stack: Vec<TreeIndex>,
}

impl<'a, T: Tree> Preorder<'a, T> {
    /// Start a walk at the root of `tree`.
    pub fn new(tree: &'a T) -> Self {
        Self::from_node(tree, tree.begin())
    }

    /// Start a walk at `node`, visiting only its subtree.
    pub fn from_node(tree: &'a T, node: TreeIndex) -> Self {
        let stack = if node < tree.end() { vec![node] } else { Vec::new() };
        Self { tree, stack }
    }
}

impl<T: Tree> Iterator for Preorder<'_, T> {
    type Item = TreeIndex;

    fn next(&mut self) -> Option<TreeIndex> {
        let node = self.stack.pop()?;
        let end = self.tree.end();
        let right = self.tree.right(node);
        if right != end {
            self.stack.push(right);
        }
        let left = self.tree.left(node);
        if left != end {
            self.stack.push(left);
        }
        Some(node)
    }
}

/// Path of child directions from the root down to `it`.
pub(crate) fn prefix<T: Tree>(tree: &T, it: TreeIndex) -> Vec<Direction> {
    let end = tree.end();
    let mut reversed = Vec::new();
    let mut node = it;
    while node < end {
        let parent = tree.parent(node);
        if parent == end {
            break;
        }
        reversed.push(if tree.isleft(node) {
            Direction::Left
        } else {
            Direction::Right
        });
        node = parent;
    }
    reversed.reverse();
    reversed
}

/// Pre-order leaf sequence of the union of two subdivision patterns.
pub(crate) fn merged_leaf_sequence<A: Tree, B: Tree>(mine: &A, theirs: &B) -> Bits {
    let mut merged = Bits::with_capacity(mine.size().max(theirs.size()));
    let mut work_stack = vec![(Some(mine.begin()), Some(theirs.begin()))];

    while let Some((this_it, other_it)) = work_stack.pop() {
        let this_split = this_it.is_some_and(|node| !mine.isleaf(node));
        let other_split = other_it.is_some_and(|node| !theirs.isleaf(node));
        if !(this_split || other_split) {
            merged.push(false);
            continue;
        }
        merged.push(true);
        let this_children = this_it
            .filter(|_| this_split)
            .map(|node| (mine.left(node), mine.right(node)));
        let other_children = other_it
            .filter(|_| other_split)
            .map(|node| (theirs.left(node), theirs.right(node)));
        work_stack.push((
            this_children.map(|(_, right)| right),
            other_children.map(|(_, right)| right),
        ));
        work_stack.push((
            this_children.map(|(left, _)| left),
            other_children.map(|(left, _)| left),
        ));
    }
    merged
}
