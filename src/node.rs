use core::{borrow::Borrow, cmp::Ordering, fmt};

use crate::{Color, Link, NodeId, RbTree};

/// A read-only view of a node in an [`RbTree`].
///
/// The view borrows the tree, so it cannot outlive the next mutation.
pub struct NodeRef<'a, K> {
    tree: &'a RbTree<K>,
    id: NodeId,
}

impl<'a, K> NodeRef<'a, K> {
    pub(crate) fn new(tree: &'a RbTree<K>, id: NodeId) -> NodeRef<'a, K> {
        NodeRef { tree, id }
    }

    fn wrap(&self, link: Link) -> Option<NodeRef<'a, K>> {
        link.map(|id| NodeRef::new(self.tree, id))
    }

    /// Returns the key stored in this node.
    pub fn key(&self) -> &'a K {
        &self.tree.node(self.id).key
    }

    pub fn color(&self) -> Color {
        self.tree.node(self.id).color
    }

    pub fn is_red(&self) -> bool {
        self.color() == Color::Red
    }

    pub fn is_black(&self) -> bool {
        self.color() == Color::Black
    }

    pub fn left(&self) -> Option<NodeRef<'a, K>> {
        self.wrap(self.tree.node(self.id).left())
    }

    pub fn right(&self) -> Option<NodeRef<'a, K>> {
        self.wrap(self.tree.node(self.id).right())
    }

    /// Returns this node's parent, or `None` for the root.
    pub fn parent(&self) -> Option<NodeRef<'a, K>> {
        self.wrap(self.tree.node(self.id).parent)
    }

    pub fn is_root(&self) -> bool {
        self.tree.root == Some(self.id)
    }

    /// Returns the node holding the smallest key in this node's subtree.
    pub fn find_min(self) -> NodeRef<'a, K> {
        NodeRef::new(self.tree, self.tree.min_in_subtree(self.id))
    }

    /// Searches this node's subtree for `key`.
    pub fn search<Q>(self, key: &Q) -> Option<NodeRef<'a, K>>
    where
        K: Borrow<Q> + Ord,
        Q: Ord + ?Sized,
    {
        let mut cur = self;

        loop {
            cur = match key.cmp(cur.key().borrow()) {
                Ordering::Less => cur.left()?,
                Ordering::Equal => return Some(cur),
                Ordering::Greater => cur.right()?,
            };
        }
    }
}

impl<K> Clone for NodeRef<'_, K> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<K> Copy for NodeRef<'_, K> {}

impl<K> PartialEq for NodeRef<'_, K> {
    fn eq(&self, other: &Self) -> bool {
        core::ptr::eq(self.tree, other.tree) && self.id == other.id
    }
}

impl<K> Eq for NodeRef<'_, K> {}

impl<K: fmt::Debug> fmt::Debug for NodeRef<'_, K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeRef")
            .field("key", self.key())
            .field("color", &self.color())
            .finish()
    }
}
