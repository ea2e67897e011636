use crate::{Color, NodeRef, RbTree};

/// An owned copy of a subtree's keys, colors and shape.
///
/// Children are listed left to right; missing children are omitted, so a node with a single child
/// has a one-element `children` list. Use [`NodeRef`] when the side of a lone child matters.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Snapshot<K> {
    pub key: K,
    pub color: Color,
    pub children: Vec<Snapshot<K>>,
}

impl<K: Clone> Snapshot<K> {
    /// Copies the subtree rooted at `node`.
    pub fn of(node: NodeRef<'_, K>) -> Snapshot<K> {
        Snapshot {
            key: node.key().clone(),
            color: node.color(),
            children: [node.left(), node.right()]
                .into_iter()
                .flatten()
                .map(Snapshot::of)
                .collect(),
        }
    }
}

impl<K: Ord> Snapshot<K> {
    /// Returns the snapshot's keys in ascending order.
    pub fn in_order(&self) -> Vec<&K> {
        fn walk<'a, K: Ord>(snap: &'a Snapshot<K>, out: &mut Vec<&'a K>) {
            match snap.children.as_slice() {
                [] => out.push(&snap.key),
                [left, right] => {
                    walk(left, out);
                    out.push(&snap.key);
                    walk(right, out);
                }
                // A lone child's side is recovered from its key.
                [only] if only.key < snap.key => {
                    walk(only, out);
                    out.push(&snap.key);
                }
                [only] => {
                    out.push(&snap.key);
                    walk(only, out);
                }
                _ => unreachable!("a binary tree node has at most two children"),
            }
        }

        let mut out = Vec::new();
        walk(self, &mut out);
        out
    }
}

impl<K> RbTree<K>
where
    K: Clone,
{
    /// Copies the whole tree into a [`Snapshot`], or returns `None` if the tree is empty.
    ///
    /// The snapshot is rebuilt from scratch on every call.
    pub fn snapshot(&self) -> Option<Snapshot<K>> {
        self.root().map(Snapshot::of)
    }
}
