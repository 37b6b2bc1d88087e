use bitvec::prelude::*;

use super::{validate_leaf_sequence, Tree, TreeError, TreeIndex};
use crate::succinct::{BalancedParens, Bits};

/// Full binary tree encoded as balanced parentheses.
///
/// Node `i` (pre-order) is the `i`-th opening parenthesis; a leaf encodes as
/// `10` and an internal node as `1 <left> <right> 0`, about two bits per node
/// plus the rank/select directories. Navigation is read-only and cheap. Any
/// structural change re-derives the leaf sequence and rebuilds everything in
/// O(n); there is intentionally no incremental update path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuccinctTree {
    parens: BalancedParens,
    size: usize,
    leaf_count: usize,
}

impl Default for SuccinctTree {
    fn default() -> Self {
        Self {
            parens: BalancedParens::build(bitvec![u64, Lsb0; 1, 0]),
            size: 1,
            leaf_count: 1,
        }
    }
}

/// Expand a pre-order leaf sequence into its parenthesis encoding.
///
/// The sequence must already be validated.
fn parens_from_leaf_sequence(leaf_sequence: &BitSlice<u64, Lsb0>) -> Bits {
    let mut parens = Bits::with_capacity(2 * leaf_sequence.len());
    // Children still expected by each open internal node.
    let mut pending: Vec<u8> = Vec::new();
    for bit in leaf_sequence.iter() {
        parens.push(true);
        if *bit {
            pending.push(2);
            continue;
        }
        parens.push(false);
        while let Some(remaining) = pending.last_mut() {
            *remaining -= 1;
            if *remaining > 0 {
                break;
            }
            pending.pop();
            parens.push(false);
        }
    }
    parens
}

impl SuccinctTree {
    /// Single-node tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw parenthesis sequence.
    pub fn parentheses(&self) -> &BitSlice<u64, Lsb0> {
        self.parens.rank_select().bits()
    }

    /// Position of the opening parenthesis of node `it`.
    #[inline]
    fn open_position(&self, it: TreeIndex) -> Option<usize> {
        if it >= self.size {
            return None;
        }
        self.parens.rank_select().select1(it)
    }

    fn rebuild(&mut self, leaf_sequence: &BitSlice<u64, Lsb0>, leaf_count: usize) {
        self.parens = BalancedParens::build(parens_from_leaf_sequence(leaf_sequence));
        self.size = leaf_sequence.len();
        self.leaf_count = leaf_count;
    }
}

impl Tree for SuccinctTree {
    #[inline]
    fn size(&self) -> usize {
        self.size
    }

    #[inline]
    fn leaf_count(&self) -> usize {
        self.leaf_count
    }

    fn parent(&self, it: TreeIndex) -> TreeIndex {
        if it == 0 {
            return self.end();
        }
        let Some(open) = self.open_position(it) else {
            return self.end();
        };
        if self.parens.is_open(open - 1) {
            return it - 1;
        }
        // The previous bit closes the left sibling.
        match self.parens.find_open(open - 1) {
            Some(sibling_open) => it - (open - sibling_open) / 2 - 1,
            None => self.end(),
        }
    }

    fn left(&self, it: TreeIndex) -> TreeIndex {
        match self.open_position(it) {
            Some(open) if self.parens.is_open(open + 1) => it + 1,
            _ => self.end(),
        }
    }

    fn right(&self, it: TreeIndex) -> TreeIndex {
        let Some(open) = self.open_position(it) else {
            return self.end();
        };
        if !self.parens.is_open(open + 1) {
            return self.end();
        }
        match self.parens.find_close(open + 1) {
            Some(close) => it + 1 + (close - open) / 2,
            None => self.end(),
        }
    }

    fn isleft(&self, it: TreeIndex) -> bool {
        it != 0
            && self
                .open_position(it)
                .is_some_and(|open| self.parens.is_open(open - 1))
    }

    fn isright(&self, it: TreeIndex) -> bool {
        it != 0 && it < self.size && !self.isleft(it)
    }

    fn isleaf(&self, it: TreeIndex) -> bool {
        self.open_position(it)
            .is_some_and(|open| !self.parens.is_open(open + 1))
    }

    fn depth(&self, it: TreeIndex) -> usize {
        self.open_position(it)
            .map(|open| self.parens.excess(open) as usize)
            .unwrap_or(0)
    }

    fn subdivide(&mut self) {
        let current = self.leaf_sequence();
        let mut next = Bits::with_capacity(current.len() + 2 * self.leaf_count);
        for bit in current.iter() {
            if *bit {
                next.push(true);
            } else {
                next.extend_from_bitslice(bits![u64, Lsb0; 1, 0, 0]);
            }
        }
        let leaves = 2 * self.leaf_count;
        self.rebuild(&next, leaves);
    }

    fn subdivide_leaves(&mut self, leaves: &[TreeIndex]) -> Result<(), TreeError> {
        let mut targets = bitvec![u64, Lsb0; 0; self.size];
        for &leaf in leaves {
            if leaf >= self.size {
                return Err(TreeError::OutOfRange {
                    index: leaf,
                    size: self.size,
                });
            }
            if !self.isleaf(leaf) {
                return Err(TreeError::ForeignElement { index: leaf });
            }
            targets.set(leaf, true);
        }
        let split = targets.count_ones();
        if split == 0 {
            return Ok(());
        }

        // Pre-order position in the leaf sequence is the node id.
        let current = self.leaf_sequence();
        let mut next = Bits::with_capacity(current.len() + 2 * split);
        for (it, bit) in current.iter().enumerate() {
            if targets[it] {
                next.extend_from_bitslice(bits![u64, Lsb0; 1, 0, 0]);
            } else {
                next.push(*bit);
            }
        }
        let leaves = self.leaf_count + split;
        self.rebuild(&next, leaves);
        Ok(())
    }

    fn assign(&mut self, leaf_sequence: &BitSlice<u64, Lsb0>) -> Result<(), TreeError> {
        let leaves = validate_leaf_sequence(leaf_sequence)?;
        self.rebuild(leaf_sequence, leaves);
        Ok(())
    }

    fn leaf_sequence(&self) -> Bits {
        let parens = self.parentheses();
        let mut sequence = Bits::with_capacity(self.size);
        for open in parens.iter_ones() {
            sequence.push(parens.get(open + 1).is_some_and(|bit| *bit));
        }
        sequence
    }

    fn memory(&self) -> usize {
        std::mem::size_of::<Self>() + self.parens.memory()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subdivide_rewrites_leaf_as_three_nodes() {
        let mut tree = SuccinctTree::new();
        tree.subdivide();
        assert_eq!(tree.parentheses(), bits![u64, Lsb0; 1, 1, 0, 1, 0, 0]);
        assert_eq!(tree.size(), 3);
        assert_eq!(tree.left(0), 1);
        assert_eq!(tree.right(0), 2);
        assert_eq!(tree.parent(2), 0);
        assert!(tree.isleft(1));
        assert!(tree.isright(2));
    }

    #[test]
    fn navigation_on_skewed_tree() {
        // Root with a deep right spine.
        let tree =
            SuccinctTree::from_leaf_sequence(bits![u64, Lsb0; 1, 0, 1, 0, 1, 0, 0]).unwrap();
        assert_eq!(tree.right(0), 2);
        assert_eq!(tree.right(2), 4);
        assert_eq!(tree.right(4), 6);
        assert_eq!(tree.parent(6), 4);
        assert_eq!(tree.parent(5), 4);
        assert_eq!(tree.parent(2), 0);
        assert_eq!(tree.depth(6), 3);
        assert_eq!(tree.leaf_count(), 4);
        assert_eq!(tree.left(1), tree.end());
        assert_eq!(tree.parent(0), tree.end());
    }

    #[test]
    fn targeted_subdivision_rebuilds() {
        let mut tree = SuccinctTree::new();
        tree.subdivide();
        tree.subdivide_leaves(&[2]).unwrap();
        assert_eq!(tree.leaf_sequence(), bitvec![u64, Lsb0; 1, 0, 1, 0, 0]);
        assert_eq!(
            tree.subdivide_leaves(&[0]).unwrap_err(),
            TreeError::ForeignElement { index: 0 }
        );
    }

    #[test]
    fn malformed_sequence_is_reported() {
        let err = SuccinctTree::from_leaf_sequence(bits![u64, Lsb0; 1, 1, 0]).unwrap_err();
        assert!(matches!(err, TreeError::MalformedSequence { position: 3, .. }));
    }

    #[test]
    fn out_of_range_ids_behave_as_end() {
        let tree = SuccinctTree::new();
        assert_eq!(tree.parent(7), tree.end());
        assert_eq!(tree.left(7), tree.end());
        assert!(!tree.isleaf(7));
        assert!(!tree.isright(7));
    }
}
