use thiserror::Error;

/// A broken structural invariant, as reported by [`AvlTree::check_invariants`].
///
/// The mutating operations of [`AvlTree`] never produce these; seeing one means the tree's
/// bookkeeping has a bug.
///
/// [`AvlTree`]: crate::AvlTree
/// [`AvlTree::check_invariants`]: crate::AvlTree::check_invariants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum InvariantViolation {
    #[error("in-order keys are not strictly ascending")]
    Unordered,
    #[error("node has balance factor {balance_factor}")]
    Unbalanced { balance_factor: i8 },
    #[error("cached height {cached} does not match subtree height {actual}")]
    StaleHeight { cached: u8, actual: u8 },
    #[error("tree records {len} elements but holds {counted}")]
    LengthMismatch { len: usize, counted: usize },
}
