//! Full binary trees indexed by integer node ids
//!
//! Every node has zero or two children. Nodes are addressed by an integer
//! "iterator" in `begin()..end()`; `end()` doubles as the sentinel returned
//! by navigation when a parent or child does not exist.
//!
//! Two implementations share the [`Tree`] trait:
//! - [`PointerTree`]: arena of nodes with explicit links, cheap targeted
//!   subdivision.
//! - [`SuccinctTree`]: balanced-parenthesis bits with rank/select, compact
//!   but rebuilt wholesale on every structural change.
//!
//! Both persist to the same pre-order leaf sequence (`1` internal, `0` leaf).

mod node;
mod pointer;
mod succinct;
mod traversal;

pub use node::Node;
pub use pointer::PointerTree;
pub use succinct::SuccinctTree;
pub use traversal::{Direction, Preorder};

use std::fmt;
use std::ops::Range;

use bitvec::prelude::*;
use thiserror::Error;

use crate::succinct::Bits;

/// Integer id of a tree node.
pub type TreeIndex = usize;

/// Errors raised by tree construction and queries.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TreeError {
    /// A leaf sequence does not describe a full binary tree.
    #[error("malformed leaf sequence at bit {position}: {reason}")]
    MalformedSequence {
        /// Offending bit position (the sequence length when it ended early).
        position: usize,
        /// What went wrong.
        reason: &'static str,
    },

    /// A node id that is not a leaf of this tree was used as one.
    #[error("node {index} is not a leaf of this tree")]
    ForeignElement {
        /// Offending node id.
        index: TreeIndex,
    },

    /// A node id past the end of the tree.
    #[error("node {index} out of range (tree has {size} nodes)")]
    OutOfRange {
        /// Offending node id.
        index: TreeIndex,
        /// Node count of the tree.
        size: usize,
    },

    /// A valid-sequence does not have one bit per leaf.
    #[error("valid sequence has {actual} bits but the tree has {expected} leaves")]
    ValidLengthMismatch {
        /// Number of leaves in the leaf sequence.
        expected: usize,
        /// Length of the valid sequence.
        actual: usize,
    },
}

/// Check that `sequence` is the pre-order leaf sequence of a full binary tree.
///
/// Returns the number of leaves.
pub fn validate_leaf_sequence(sequence: &BitSlice<u64, Lsb0>) -> Result<usize, TreeError> {
    let mut pending = 1usize;
    let mut leaves = 0usize;
    for (position, bit) in sequence.iter().enumerate() {
        if pending == 0 {
            return Err(TreeError::MalformedSequence {
                position,
                reason: "bits after the tree is complete",
            });
        }
        pending -= 1;
        if *bit {
            pending += 2;
        } else {
            leaves += 1;
        }
    }
    if pending != 0 {
        return Err(TreeError::MalformedSequence {
            position: sequence.len(),
            reason: "sequence ends inside an open subtree",
        });
    }
    Ok(leaves)
}

/// Persisted form of a tree, possibly carrying ghost leaves.
///
/// `leaf_sequence` lists nodes in pre-order (`1` internal, `0` leaf);
/// `valid_sequence` has one bit per leaf in the same order, set for leaves
/// that are real cells. Ghost leaves appear when a subtree keeps the sibling
/// of a selected node only to stay full.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "persist", derive(serde::Serialize, serde::Deserialize))]
pub struct CompressedTree {
    leaf_sequence: Bits,
    valid_sequence: Bits,
}

impl Default for CompressedTree {
    fn default() -> Self {
        Self {
            leaf_sequence: bitvec![u64, Lsb0; 0],
            valid_sequence: bitvec![u64, Lsb0; 1],
        }
    }
}

impl CompressedTree {
    /// Validate and wrap a leaf sequence with its valid sequence.
    pub fn new(leaf_sequence: Bits, valid_sequence: Bits) -> Result<Self, TreeError> {
        let leaves = validate_leaf_sequence(&leaf_sequence)?;
        if leaves != valid_sequence.len() {
            return Err(TreeError::ValidLengthMismatch {
                expected: leaves,
                actual: valid_sequence.len(),
            });
        }
        Ok(Self {
            leaf_sequence,
            valid_sequence,
        })
    }

    /// Wrap a leaf sequence in which every leaf is valid.
    pub fn from_leaf_sequence(leaf_sequence: Bits) -> Result<Self, TreeError> {
        let leaves = validate_leaf_sequence(&leaf_sequence)?;
        Ok(Self {
            leaf_sequence,
            valid_sequence: bitvec![u64, Lsb0; 1; leaves],
        })
    }

    /// Pair two sequences already known to agree.
    pub(crate) fn from_parts(leaf_sequence: Bits, valid_sequence: Bits) -> Self {
        debug_assert_eq!(validate_leaf_sequence(&leaf_sequence), Ok(valid_sequence.len()));
        Self {
            leaf_sequence,
            valid_sequence,
        }
    }

    /// Pre-order leaf sequence.
    pub fn leaf_sequence(&self) -> &BitSlice<u64, Lsb0> {
        &self.leaf_sequence
    }

    /// Per-leaf validity, in pre-order.
    pub fn valid_sequence(&self) -> &BitSlice<u64, Lsb0> {
        &self.valid_sequence
    }

    /// Total node count.
    pub fn node_count(&self) -> usize {
        self.leaf_sequence.len()
    }

    /// Number of valid leaves.
    pub fn valid_count(&self) -> usize {
        self.valid_sequence.count_ones()
    }

    /// Split into the two sequences.
    pub fn into_parts(self) -> (Bits, Bits) {
        (self.leaf_sequence, self.valid_sequence)
    }
}

/// Full binary tree navigated through integer node ids.
///
/// Navigation on ids outside `begin()..end()` returns `end()` (or `false`
/// for the predicates) rather than panicking.
pub trait Tree: Clone + Default + fmt::Debug {
    /// Total node count.
    fn size(&self) -> usize;

    /// Number of leaves.
    fn leaf_count(&self) -> usize;

    /// Id of the root.
    #[inline]
    fn begin(&self) -> TreeIndex {
        0
    }

    /// Sentinel id one past the last node.
    #[inline]
    fn end(&self) -> TreeIndex {
        self.size()
    }

    /// All node ids.
    fn nodes(&self) -> Range<TreeIndex> {
        self.begin()..self.end()
    }

    /// Parent of `it`, or `end()` for the root.
    fn parent(&self, it: TreeIndex) -> TreeIndex;

    /// Left child of `it`, or `end()` for a leaf.
    fn left(&self, it: TreeIndex) -> TreeIndex;

    /// Right child of `it`, or `end()` for a leaf.
    fn right(&self, it: TreeIndex) -> TreeIndex;

    /// True when `it` is the left child of its parent.
    fn isleft(&self, it: TreeIndex) -> bool {
        let parent = self.parent(it);
        parent != self.end() && self.left(parent) == it
    }

    /// True when `it` is the right child of its parent.
    fn isright(&self, it: TreeIndex) -> bool {
        let parent = self.parent(it);
        parent != self.end() && self.right(parent) == it
    }

    /// True when `it` has no children.
    fn isleaf(&self, it: TreeIndex) -> bool {
        it < self.size() && self.left(it) == self.end()
    }

    /// Distance from the root.
    fn depth(&self, it: TreeIndex) -> usize {
        let end = self.end();
        let mut depth = 0;
        let mut node = self.parent(it);
        while node != end {
            depth += 1;
            node = self.parent(node);
        }
        depth
    }

    /// Path from the root down to `it`.
    fn prefix(&self, it: TreeIndex) -> Vec<Direction> {
        traversal::prefix(self, it)
    }

    /// Give every leaf two new leaf children.
    fn subdivide(&mut self);

    /// Give each listed leaf two new leaf children.
    ///
    /// Duplicates are ignored; any id that is not a leaf fails the whole call
    /// before the tree is touched.
    fn subdivide_leaves(&mut self, leaves: &[TreeIndex]) -> Result<(), TreeError>;

    /// Replace the whole tree with the one described by `leaf_sequence`.
    fn assign(&mut self, leaf_sequence: &BitSlice<u64, Lsb0>) -> Result<(), TreeError>;

    /// Build a tree from its pre-order leaf sequence.
    fn from_leaf_sequence(leaf_sequence: &BitSlice<u64, Lsb0>) -> Result<Self, TreeError> {
        let mut tree = Self::default();
        tree.assign(leaf_sequence)?;
        Ok(tree)
    }

    /// Export the pre-order leaf sequence.
    fn leaf_sequence(&self) -> Bits {
        let mut sequence = Bits::with_capacity(self.size());
        for node in Preorder::new(self) {
            sequence.push(!self.isleaf(node));
        }
        sequence
    }

    /// Union of subdivision patterns: split wherever `other` is split and
    /// `self` is not.
    fn adjoin<O: Tree>(&mut self, other: &O) -> Result<(), TreeError> {
        let merged = traversal::merged_leaf_sequence(self, other);
        self.assign(&merged)
    }

    /// Minimal full tree spanning `leaves`, in persisted form.
    ///
    /// Ancestors of the given leaves are kept; a kept internal node keeps both
    /// children, and children that are not ancestors of a selected leaf become
    /// ghost leaves (cleared in the valid sequence).
    fn subtree(&self, leaves: &[TreeIndex]) -> Result<CompressedTree, TreeError> {
        let end = self.end();
        let mut marked = bitvec![u64, Lsb0; 0; self.size()];
        for &leaf in leaves {
            if leaf >= end {
                return Err(TreeError::OutOfRange {
                    index: leaf,
                    size: self.size(),
                });
            }
            if !self.isleaf(leaf) {
                return Err(TreeError::ForeignElement { index: leaf });
            }
            let mut node = leaf;
            while node != end && !marked[node] {
                marked.set(node, true);
                node = self.parent(node);
            }
        }

        let mut leaf_sequence = Bits::new();
        let mut valid_sequence = Bits::new();
        let mut work_stack = vec![self.begin()];
        while let Some(node) = work_stack.pop() {
            if marked[node] && !self.isleaf(node) {
                leaf_sequence.push(true);
                work_stack.push(self.right(node));
                work_stack.push(self.left(node));
            } else {
                leaf_sequence.push(false);
                valid_sequence.push(marked[node]);
            }
        }
        Ok(CompressedTree {
            leaf_sequence,
            valid_sequence,
        })
    }

    /// Approximate heap footprint in bytes.
    fn memory(&self) -> usize;
}
