//! Arena node of a pointer tree
//!
//! Links are indices into the owning arena, so there is nothing to free and
//! nothing can dangle.

use super::TreeIndex;

/// One node of a [`super::PointerTree`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Node {
    /// Parent id, `None` for the root.
    pub parent: Option<TreeIndex>,

    /// Left child id, `None` for a leaf.
    pub left: Option<TreeIndex>,

    /// Right child id, `None` for a leaf.
    pub right: Option<TreeIndex>,
}

impl Node {
    /// Detached root node.
    pub fn root() -> Self {
        Self::default()
    }

    /// Fresh leaf hanging below `parent`.
    pub fn child_of(parent: TreeIndex) -> Self {
        Self {
            parent: Some(parent),
            left: None,
            right: None,
        }
    }

    /// Check if leaf (no children)
    #[inline]
    pub fn is_leaf(&self) -> bool {
        self.left.is_none() && self.right.is_none()
    }
}
