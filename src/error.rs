/// A red-black invariant found broken by [`RbTree::validate`](crate::RbTree::validate).
///
/// Keys are recorded in their `Debug` form.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum InvariantError {
    #[error("the root is red")]
    RedRoot,

    #[error("red node {parent} has red child {child}")]
    RedChildOfRed { parent: String, child: String },

    #[error("node {key} has black-height {left} on the left but {right} on the right")]
    BlackHeightMismatch {
        key: String,
        left: usize,
        right: usize,
    },

    #[error("child {child} is on the wrong side of {parent}")]
    OutOfOrder { parent: String, child: String },

    #[error("parent link of node {key} does not match the tree structure")]
    BrokenParentLink { key: String },

    #[error("tree reports {len} keys but {counted} nodes are reachable from the root")]
    LengthMismatch { len: usize, counted: usize },
}
