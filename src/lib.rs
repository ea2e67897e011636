//! An arena-backed red-black tree.
//!
//! Nodes live in a slot arena and refer to each other by index, so the parent back-references
//! required by the bottom-up fixups are plain lookups rather than aliased pointers.

// The red-black invariants maintained by every public operation:
// 1. Keys are in strict BST order; no key is stored twice.
// 2. The root is black (or the tree is empty).
// 3. No red node has a red child.
// 4. Every path from a node down to a missing child passes through the same number of black
//    nodes. Missing children count as black.
//
// Naming used in comments:
// - `p(x)` is the parent of `x`, `g(x)` its grandparent.
// - The "side" of `x` is the direction from `p(x)` to `x`.
// - The "near" child of a sibling is on the same side as `x`; the "far" child is on the other.

use core::{borrow::Borrow, cmp::Ordering, fmt, mem, ops::Not};

use log::{debug, trace};

mod debug;
mod error;
mod node;
mod snapshot;

#[cfg(any(test, feature = "model"))]
pub mod model;


pub use error::InvariantError;
pub use node::NodeRef;
pub use snapshot::Snapshot;

/// The color of a node.
///
/// Missing children are treated as black.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum Color {
    Red,
    Black,
}

/// The result of [`RbTree::insert`].
#[must_use]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum InsertOutcome {
    /// The key was not present and has been added.
    Inserted,
    /// An equal key was already present; the tree is unchanged.
    AlreadyPresent,
}

impl InsertOutcome {
    pub const fn is_inserted(self) -> bool {
        matches!(self, InsertOutcome::Inserted)
    }
}

/// The result of [`RbTree::delete`].
#[must_use]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// The key was present and has been removed.
    Removed,
    /// No equal key was present; the tree is unchanged.
    NotFound,
}

impl DeleteOutcome {
    pub const fn is_removed(self) -> bool {
        matches!(self, DeleteOutcome::Removed)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Dir {
    Left = 0,
    Right = 1,
}

impl Not for Dir {
    type Output = Dir;

    fn not(self) -> Self::Output {
        match self {
            Dir::Left => Dir::Right,
            Dir::Right => Dir::Left,
        }
    }
}

/// Index of an occupied slot in the node arena.
///
/// Only valid until the next mutation of the owning tree.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
struct NodeId(usize);

type Link = Option<NodeId>;

struct Node<K> {
    key: K,
    color: Color,
    parent: Link,
    children: [Link; 2],
}

impl<K> Node<K> {
    #[inline]
    fn child(&self, dir: Dir) -> Link {
        self.children[dir as usize]
    }

    #[inline]
    fn left(&self) -> Link {
        self.child(Dir::Left)
    }

    #[inline]
    fn right(&self) -> Link {
        self.child(Dir::Right)
    }

    #[inline]
    fn set_child(&mut self, dir: Dir, child: Link) -> Link {
        mem::replace(&mut self.children[dir as usize], child)
    }
}

/// A red-black tree of unique keys.
///
/// All operations complete in _O(log(n))_ time.
pub struct RbTree<K> {
    nodes: Vec<Option<Node<K>>>,
    free: Vec<NodeId>,
    root: Link,
    len: usize,
}

impl<K> RbTree<K> {
    /// Returns a new empty tree.
    pub const fn new() -> RbTree<K> {
        RbTree {
            nodes: Vec::new(),
            free: Vec::new(),
            root: None,
            len: 0,
        }
    }

    /// Returns a new empty tree with room for `capacity` nodes before reallocating.
    pub fn with_capacity(capacity: usize) -> RbTree<K> {
        RbTree {
            nodes: Vec::with_capacity(capacity),
            free: Vec::new(),
            root: None,
            len: 0,
        }
    }

    /// Returns `true` if the tree contains no keys.
    pub fn is_empty(&self) -> bool {
        let empty = self.len == 0;
        debug_assert_eq!(empty, self.root.is_none());
        empty
    }

    /// Returns the number of keys in the tree.
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Returns a view of the root node, or `None` if the tree is empty.
    pub fn root(&self) -> Option<NodeRef<'_, K>> {
        self.root.map(|id| NodeRef::new(self, id))
    }

    /// Returns the node holding the smallest key.
    pub fn find_min(&self) -> Option<NodeRef<'_, K>> {
        self.root().map(NodeRef::find_min)
    }

    /// Removes every key, keeping the arena's allocation.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.free.clear();
        self.root = None;
        self.len = 0;
    }

    // Arena ==================================================================

    fn alloc(&mut self, node: Node<K>) -> NodeId {
        match self.free.pop() {
            Some(id) => {
                debug_assert!(self.nodes[id.0].is_none());
                self.nodes[id.0] = Some(node);
                id
            }
            None => {
                self.nodes.push(Some(node));
                NodeId(self.nodes.len() - 1)
            }
        }
    }

    // Vacates the slot of a node that has already been unlinked from the tree.
    fn release(&mut self, id: NodeId) -> K {
        let node = self.nodes[id.0].take().expect("released a vacant slot");
        self.free.push(id);
        node.key
    }

    #[inline]
    fn node(&self, id: NodeId) -> &Node<K> {
        self.nodes[id.0].as_ref().expect("stale node id")
    }

    #[inline]
    fn node_mut(&mut self, id: NodeId) -> &mut Node<K> {
        self.nodes[id.0].as_mut().expect("stale node id")
    }

    #[inline]
    fn parent(&self, id: NodeId) -> Link {
        self.node(id).parent
    }

    #[inline]
    fn child(&self, id: NodeId, dir: Dir) -> Link {
        self.node(id).child(dir)
    }

    #[inline]
    fn color(&self, link: Link) -> Color {
        link.map_or(Color::Black, |id| self.node(id).color)
    }

    #[inline]
    fn is_red(&self, link: Link) -> bool {
        self.color(link) == Color::Red
    }

    #[inline]
    fn set_color(&mut self, id: NodeId, color: Color) {
        self.node_mut(id).color = color;
    }

    #[inline]
    fn set_parent(&mut self, link: Link, parent: Link) {
        if let Some(id) = link {
            self.node_mut(id).parent = parent;
        }
    }

    fn which_child(&self, parent: NodeId, child: NodeId) -> Dir {
        if self.node(parent).left() == Some(child) {
            Dir::Left
        } else {
            debug_assert_eq!(self.node(parent).right(), Some(child));
            Dir::Right
        }
    }

    // Exchanges the keys stored in two distinct occupied slots.
    fn swap_keys(&mut self, a: NodeId, b: NodeId) {
        assert_ne!(a, b);
        let (lo, hi) = if a.0 < b.0 { (a, b) } else { (b, a) };
        let (head, tail) = self.nodes.split_at_mut(hi.0);

        match (head[lo.0].as_mut(), tail[0].as_mut()) {
            (Some(lo), Some(hi)) => mem::swap(&mut lo.key, &mut hi.key),
            _ => unreachable!("stale node id"),
        }
    }

    // Returns the leftmost node of the subtree rooted at `root`.
    fn min_in_subtree(&self, root: NodeId) -> NodeId {
        let mut cur = root;

        while let Some(left) = self.node(cur).left() {
            cur = left;
        }

        cur
    }
}

impl<K> RbTree<K>
where
    K: Ord + fmt::Debug,
{
    /// Returns `true` if the tree contains `key`.
    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.locate(self.root, key).is_some()
    }

    /// Returns the node holding `key`, or `None` if no such key is stored.
    pub fn search<Q>(&self, key: &Q) -> Option<NodeRef<'_, K>>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.locate(self.root, key).map(|id| NodeRef::new(self, id))
    }

    // Descends from `start` looking for `key`.
    fn locate<Q>(&self, start: Link, key: &Q) -> Link
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let mut opt_cur = start;

        loop {
            let cur = opt_cur?;
            let node = self.node(cur);

            match key.cmp(node.key.borrow()) {
                Ordering::Less => opt_cur = node.left(),
                Ordering::Equal => return Some(cur),
                Ordering::Greater => opt_cur = node.right(),
            }
        }
    }

    /// Inserts `key` into the tree.
    ///
    /// If an equal key is already present the tree is left untouched and
    /// [`InsertOutcome::AlreadyPresent`] is returned.
    pub fn insert(&mut self, key: K) -> InsertOutcome {
        let root = match self.root {
            Some(root) => root,
            None => {
                // Tree is empty. The new node becomes the black root and nothing needs fixing.
                debug!("inserting {key:?} as the root");
                let id = self.alloc(Node {
                    key,
                    color: Color::Black,
                    parent: None,
                    children: [None; 2],
                });
                self.root = Some(id);
                self.len += 1;
                return InsertOutcome::Inserted;
            }
        };

        // Descend the tree, looking for an empty slot.
        let mut parent = root;
        let dir = loop {
            let node = self.node(parent);

            let dir = match key.cmp(&node.key) {
                Ordering::Less => Dir::Left,
                Ordering::Equal => {
                    debug!("{key:?} is already present, ignoring");
                    return InsertOutcome::AlreadyPresent;
                }
                Ordering::Greater => Dir::Right,
            };

            match node.child(dir) {
                Some(child) => {
                    trace!("traversing {dir:?} from {:?}", node.key);
                    parent = child;
                }
                None => break dir,
            }
        };

        debug!("inserting {key:?} as the {dir:?} child of {:?}", self.node(parent).key);

        let id = self.alloc(Node {
            key,
            color: Color::Red,
            parent: Some(parent),
            children: [None; 2],
        });
        self.node_mut(parent).set_child(dir, Some(id));
        self.len += 1;

        self.rebalance_inserted(id);

        InsertOutcome::Inserted
    }

    // Restores the invariants after `node` has been attached as a red leaf.
    //
    // Only invariant 3 can be broken, and only on the edge between `node` and its parent.
    fn rebalance_inserted(&mut self, node: NodeId) {
        let mut x = node;

        while let Some(parent) = self.parent(x).filter(|&p| self.is_red(Some(p))) {
            // A red parent is never the root, so the grandparent exists.
            let Some(grandparent) = self.parent(parent) else {
                break;
            };

            let side = self.which_child(grandparent, parent);
            let uncle = self.child(grandparent, !side);

            debug!(
                "fixing red {:?} under red {:?}, grandparent {:?}",
                self.node(x).key,
                self.node(parent).key,
                self.node(grandparent).key,
            );

            if self.is_red(uncle) {
                // Push the grandparent's blackness down to both children and retry two levels up.
                debug!("uncle is red, flipping colors at {:?}", self.node(grandparent).key);
                self.flip_colors(grandparent);
            } else {
                if self.which_child(parent, x) != side {
                    // `x`, `p(x)` and `g(x)` form a triangle. Straighten it into a line.
                    debug!("{:?} is an inner child, rotating its parent", self.node(x).key);
                    self.rotate(parent, side);
                }

                // Lift the middle of the line above `g(x)`. The promoted node takes the
                // grandparent's black and the grandparent becomes red.
                self.rotate(grandparent, !side);
            }

            x = grandparent;
        }

        if let Some(root) = self.root {
            self.set_color(root, Color::Black);
        }
    }

    /// Removes `key` from the tree.
    ///
    /// If no equal key is present the tree is left untouched and [`DeleteOutcome::NotFound`] is
    /// returned.
    pub fn delete<Q>(&mut self, key: &Q) -> DeleteOutcome
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let Some(target) = self.locate(self.root, key) else {
            debug!("delete: key not found");
            return DeleteOutcome::NotFound;
        };

        let removed = self.remove_at(target);
        debug!("deleted {removed:?}");

        self.len -= 1;
        DeleteOutcome::Removed
    }

    // Unlinks `target`, rebalances, and returns the key that was removed from the tree.
    fn remove_at(&mut self, target: NodeId) -> K {
        let node = self.node(target);

        match (node.left(), node.right()) {
            (None, None) => {
                if node.color == Color::Black {
                    // Removing a black leaf shortens every path through it. Rebalance while it is
                    // still attached, since the fixup reads its parent and sibling.
                    trace!("{:?} is a black leaf", node.key);
                    self.rebalance_removed(target);
                } else {
                    trace!("{:?} is a red leaf", node.key);
                }

                self.transplant(target, None);
            }

            (Some(child), None) | (None, Some(child)) => {
                // The lone child absorbs the removed node's blackness.
                trace!("{:?} has a single child", node.key);
                let parent = node.parent;

                self.set_color(child, Color::Black);
                self.transplant(target, Some(child));
                self.set_parent(Some(child), parent);
            }

            (Some(_), Some(right)) => {
                // Move the in-order successor's key into `target`, then remove the successor's
                // slot instead. The successor has no left child, so this recursion bottoms out in
                // one of the cases above.
                let successor = self.min_in_subtree(right);
                trace!(
                    "{:?} has two children, successor is {:?}",
                    node.key,
                    self.node(successor).key
                );

                self.swap_keys(target, successor);
                return self.remove_at(successor);
            }
        }

        self.release(target)
    }

    // Restores black-height after `node`, a black non-root node, loses one black from every path
    // through it ("double black").
    fn rebalance_removed(&mut self, node: NodeId) {
        let mut x = node;

        while Some(x) != self.root && !self.is_red(Some(x)) {
            let parent = self.parent(x).expect("non-root node must have a parent");
            let side = self.which_child(parent, x);
            let sibling = self
                .child(parent, !side)
                .expect("double-black node must have a sibling");

            if self.is_red(Some(sibling)) {
                // Rotate the red sibling above the parent. The rotation hands the parent's black
                // to the sibling and turns the parent red, giving `x` a black sibling.
                debug!(
                    "sibling {:?} is red, rotating at parent {:?}",
                    self.node(sibling).key,
                    self.node(parent).key
                );
                self.rotate(parent, side);
                continue;
            }

            let near = self.child(sibling, side);
            let far = self.child(sibling, !side);

            if !self.is_red(near) && !self.is_red(far) {
                self.set_color(sibling, Color::Red);

                if self.is_red(Some(parent)) {
                    debug!(
                        "parent {:?} is red, recoloring it black and sibling {:?} red",
                        self.node(parent).key,
                        self.node(sibling).key
                    );
                    self.set_color(parent, Color::Black);
                    break;
                }

                debug!(
                    "sibling {:?} and parent {:?} are black, moving up",
                    self.node(sibling).key,
                    self.node(parent).key
                );
                x = parent;
                continue;
            }

            if !self.is_red(far) {
                // Only the near child is red. Rotate it above the sibling so that the next
                // iteration sees a red far child.
                debug!(
                    "near child of sibling {:?} is red, rotating at sibling",
                    self.node(sibling).key
                );
                self.rotate(sibling, !side);
                continue;
            }

            debug!(
                "far child of sibling {:?} is red, rotating at parent {:?}",
                self.node(sibling).key,
                self.node(parent).key
            );
            self.rotate(parent, side);
            self.set_color(parent, Color::Black);
            if let Some(far) = far {
                self.set_color(far, Color::Black);
            }
            break;
        }
    }

    // Rewrites the link from `target`'s parent (or the root) to point at `replacement`.
    //
    // `replacement`'s parent link is not updated.
    fn transplant(&mut self, target: NodeId, replacement: Link) {
        trace!("transplanting {:?}", self.node(target).key);

        match self.parent(target) {
            Some(parent) => {
                let dir = self.which_child(parent, target);
                self.node_mut(parent).set_child(dir, replacement);
            }
            None => self.root = replacement,
        }
    }

    // Performs a rotation moving `down` one level down in direction `dir`; its `!dir` child is
    // promoted into its place.
    //
    // The promoted node inherits `down`'s color and `down` becomes red.
    fn rotate(&mut self, down: NodeId, dir: Dir) {
        let up = self
            .child(down, !dir)
            .expect("rotation requires a child to promote");

        trace!(
            "rotating {dir:?} at {:?}, promoting {:?}",
            self.node(down).key,
            self.node(up).key
        );

        // `across` moves from the `dir` child of `up` to the `!dir` child of `down`.
        let across = self.child(up, dir);
        self.node_mut(down).set_child(!dir, across);
        self.set_parent(across, Some(down));

        let parent = self.parent(down);
        self.transplant(down, Some(up));
        self.node_mut(up).parent = parent;

        self.node_mut(up).set_child(dir, Some(down));
        self.node_mut(down).parent = Some(up);

        let color = self.node(down).color;
        self.set_color(up, color);
        self.set_color(down, Color::Red);
    }

    // Turns `node` red and both of its children black.
    fn flip_colors(&mut self, node: NodeId) {
        let left = self.node(node).left().expect("flip requires a left child");
        let right = self.node(node).right().expect("flip requires a right child");

        self.set_color(node, Color::Red);
        self.set_color(left, Color::Black);
        self.set_color(right, Color::Black);
    }

    /// Checks every red-black invariant, returning the black-height of the tree.
    ///
    /// The black-height counts black nodes on any path from the root down to a missing child,
    /// excluding the root itself and counting the missing child. An empty tree has black-height 0.
    ///
    /// This walks the whole tree and is meant for tests and debugging.
    pub fn validate(&self) -> Result<usize, InvariantError> {
        let Some(root) = self.root else {
            return match self.len {
                0 => Ok(0),
                len => Err(InvariantError::LengthMismatch { len, counted: 0 }),
            };
        };

        if self.node(root).color == Color::Red {
            return Err(InvariantError::RedRoot);
        }

        if self.node(root).parent.is_some() {
            return Err(InvariantError::BrokenParentLink {
                key: format!("{:?}", self.node(root).key),
            });
        }

        let mut counted = 0;
        let height = self.validate_at(root, &mut counted)?;

        if counted != self.len {
            return Err(InvariantError::LengthMismatch {
                len: self.len,
                counted,
            });
        }

        // The root is black and the missing child below it is too, so the two swap places.
        Ok(height)
    }

    // Returns the number of black nodes on every path from `node` (inclusive) to a missing child.
    fn validate_at(&self, node: NodeId, counted: &mut usize) -> Result<usize, InvariantError> {
        *counted += 1;
        let n = self.node(node);
        let mut heights = [0; 2];

        for dir in [Dir::Left, Dir::Right] {
            let Some(child) = n.child(dir) else {
                continue;
            };
            let c = self.node(child);

            if c.parent != Some(node) {
                return Err(InvariantError::BrokenParentLink {
                    key: format!("{:?}", c.key),
                });
            }

            let ordered = match dir {
                Dir::Left => c.key < n.key,
                Dir::Right => c.key > n.key,
            };
            if !ordered {
                return Err(InvariantError::OutOfOrder {
                    parent: format!("{:?}", n.key),
                    child: format!("{:?}", c.key),
                });
            }

            if n.color == Color::Red && c.color == Color::Red {
                return Err(InvariantError::RedChildOfRed {
                    parent: format!("{:?}", n.key),
                    child: format!("{:?}", c.key),
                });
            }

            heights[dir as usize] = self.validate_at(child, counted)?;
        }

        let [left, right] = heights;
        if left != right {
            return Err(InvariantError::BlackHeightMismatch {
                key: format!("{:?}", n.key),
                left,
                right,
            });
        }

        Ok(left + usize::from(n.color == Color::Black))
    }

    #[doc(hidden)]
    pub fn assert_invariants(&self) {
        if let Err(e) = self.validate() {
            panic!("red-black invariant violated: {e}");
        }
    }
}

impl<K> Default for RbTree<K> {
    fn default() -> Self {
        RbTree::new()
    }
}

impl<K> fmt::Debug for RbTree<K>
where
    K: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RbTree")
            .field("len", &self.len)
            .field("root", &self.root())
            .finish()
    }
}

impl<K> Extend<K> for RbTree<K>
where
    K: Ord + fmt::Debug,
{
    fn extend<I: IntoIterator<Item = K>>(&mut self, iter: I) {
        for key in iter {
            let _ = self.insert(key);
        }
    }
}

impl<K> FromIterator<K> for RbTree<K>
where
    K: Ord + fmt::Debug,
{
    fn from_iter<I: IntoIterator<Item = K>>(iter: I) -> Self {
        let mut tree = RbTree::new();
        tree.extend(iter);
        tree
    }
}
