//! An owned AVL tree.

// Conventions used in comments:
// - The height `h(x)` of a node `x` counts the nodes on the longest downward path starting at
//   `x`, so a leaf has height 1 and a missing subtree has height 0.
// - The balance factor of `x` is `h(left(x)) - h(right(x))`. Positive means left-heavy.
//
// The fundamental invariants of the tree are:
// 1. An in-order walk yields strictly ascending keys.
// 2. All balance factors are -1, 0 or 1.
// 3. The cached height of every node equals `1 + max(h(left), h(right))`.
//
// Every mutation takes a subtree out of its slot, recurses, and stores whatever root the
// rebalance step hands back into the same slot on the way up. Nodes are never copied; rotations
// only move boxes between slots.

use core::{borrow::Borrow, cmp::Ordering, fmt, mem, ops::Not};

mod debug;
pub mod error;
mod iter;
#[cfg(any(test, feature = "model"))]
pub mod model;

pub use debug::BalanceFactors;
pub use error::InvariantViolation;
pub use iter::Iter;

/// A self-balancing binary search tree holding unique keys.
///
/// Insertion, removal and lookup complete in _O(log(n))_ time regardless of insertion order.
pub struct AvlTree<K> {
    root: Link<K>,
    len: usize,
}

struct Node<K> {
    key: K,
    children: [Link<K>; 2],
    height: u8,
}

type Link<K> = Option<Box<Node<K>>>;

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

impl Dir {
    // Sign of the balance factor of a node leaning toward `self`.
    #[inline]
    fn sign(self) -> i8 {
        match self {
            Dir::Left => 1,
            Dir::Right => -1,
        }
    }
}

// Outcome of inserting into a subtree.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Inserted {
    // The key was already present; nothing changed.
    Duplicate,
    // The subtree was empty and is now the new leaf.
    Leaf,
    // The key went down the given side of the subtree root.
    Below(Dir),
}

impl<K> AvlTree<K> {
    /// Returns a new empty tree.
    pub const fn new() -> AvlTree<K> {
        AvlTree { root: None, len: 0 }
    }

    /// Returns `true` if the tree contains no elements.
    pub const fn is_empty(&self) -> bool {
        let empty = self.len() == 0;

        if cfg!(debug_assertions) {
            // Can't use assert_eq!() in const fn.
            assert!(empty == self.root.is_none());
        }

        empty
    }

    /// Returns the number of elements in the tree.
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Returns the height of the tree: 0 when empty, 1 for a single element.
    ///
    /// This reads the height cached at the root and completes in _O(1)_ time.
    pub fn height(&self) -> usize {
        height_of(self.root.as_deref()).into()
    }

    /// Returns the key stored at the root of the tree.
    ///
    /// The root changes as rotations rebalance the tree.
    pub fn root(&self) -> Option<&K> {
        self.root.as_deref().map(|root| &root.key)
    }

    /// Returns the minimum element of the tree.
    pub fn first(&self) -> Option<&K> {
        self.root.as_deref().map(|root| &outermost(root, Dir::Left).key)
    }

    /// Returns the maximum element of the tree.
    pub fn last(&self) -> Option<&K> {
        self.root.as_deref().map(|root| &outermost(root, Dir::Right).key)
    }

    /// Returns an iterator over the elements of the tree in ascending order.
    pub fn iter(&self) -> Iter<'_, K> {
        Iter::new(self)
    }

    /// Returns an iterator over each element paired with the balance factor of its node, in
    /// ascending order.
    ///
    /// The balance factor is the height of the node's left subtree minus the height of its right
    /// subtree.
    pub fn balance_factors(&self) -> BalanceFactors<'_, K> {
        BalanceFactors::new(self)
    }

    /// Clears the tree, removing all elements.
    pub fn clear(&mut self) {
        self.root = None;
        self.len = 0;
    }

    /// Checks the structural invariants of the tree.
    ///
    /// Verifies that keys ascend in order, that every node is balanced, that every cached height
    /// matches the shape of its subtree, and that the element count is accurate.
    pub fn check_invariants(&self) -> Result<(), InvariantViolation>
    where
        K: Ord,
    {
        let mut keys = self.iter();
        if let Some(mut prev) = keys.next() {
            for key in keys {
                if prev >= key {
                    return Err(InvariantViolation::Unordered);
                }
                prev = key;
            }
        }

        let (_, counted) = check_subtree(self.root.as_deref())?;
        if counted != self.len {
            return Err(InvariantViolation::LengthMismatch {
                len: self.len,
                counted,
            });
        }

        Ok(())
    }

    #[doc(hidden)]
    pub fn assert_invariants(&self)
    where
        K: Ord,
    {
        if let Err(violation) = self.check_invariants() {
            panic!("AVL invariant violated: {violation}");
        }
    }
}

impl<K: Ord> AvlTree<K> {
    /// Returns a reference to the element equal to `key`.
    pub fn get<Q>(&self, key: &Q) -> Option<&K>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let mut opt_cur = self.root.as_deref();

        loop {
            let cur = opt_cur?;

            match key.cmp(cur.key.borrow()) {
                Ordering::Less => opt_cur = cur.left(),
                Ordering::Equal => return Some(&cur.key),
                Ordering::Greater => opt_cur = cur.right(),
            }
        }
    }

    /// Returns `true` if the tree contains an element equal to `key`.
    #[inline]
    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.get(key).is_some()
    }

    /// Inserts `key` into the tree.
    ///
    /// Returns `false` if an equal key was already present, in which case the tree is left
    /// untouched and the stored key is kept.
    ///
    /// This operation completes in _O(log(n))_ time.
    pub fn insert(&mut self, key: K) -> bool {
        let (root, outcome) = insert_at(self.root.take(), key);
        self.root = Some(root);

        let inserted = outcome != Inserted::Duplicate;
        if inserted {
            self.len += 1;
        }

        tracing::trace!(inserted, len = self.len, height = self.height(), "insert");
        inserted
    }

    /// Removes the element equal to `key` from the tree and returns it.
    ///
    /// Returns `None`, leaving the tree untouched, if no such element exists.
    ///
    /// This operation completes in _O(log(n))_ time.
    pub fn remove<Q>(&mut self, key: &Q) -> Option<K>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let (root, removed) = remove_at(self.root.take(), key);
        self.root = root;

        if removed.is_some() {
            self.len -= 1;
        }

        tracing::trace!(
            removed = removed.is_some(),
            len = self.len,
            height = self.height(),
            "remove"
        );
        removed
    }

    /// Removes and returns the minimum element of the tree.
    pub fn pop_first(&mut self) -> Option<K> {
        self.pop_outermost(Dir::Left)
    }

    /// Removes and returns the maximum element of the tree.
    pub fn pop_last(&mut self) -> Option<K> {
        self.pop_outermost(Dir::Right)
    }

    fn pop_outermost(&mut self, dir: Dir) -> Option<K> {
        let root = self.root.take()?;
        let (root, key) = remove_outermost(root, dir);
        self.root = root;
        self.len -= 1;

        tracing::trace!(?dir, len = self.len, height = self.height(), "pop");
        Some(key)
    }
}

impl<K> Default for AvlTree<K> {
    fn default() -> Self {
        AvlTree::new()
    }
}

impl<K: fmt::Debug> fmt::Debug for AvlTree<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl<K: Ord> Extend<K> for AvlTree<K> {
    fn extend<I: IntoIterator<Item = K>>(&mut self, iter: I) {
        for key in iter {
            self.insert(key);
        }
    }
}

impl<K: Ord> FromIterator<K> for AvlTree<K> {
    fn from_iter<I: IntoIterator<Item = K>>(iter: I) -> Self {
        let mut tree = AvlTree::new();
        tree.extend(iter);
        tree
    }
}

impl<'tree, K> IntoIterator for &'tree AvlTree<K> {
    type Item = &'tree K;
    type IntoIter = Iter<'tree, K>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

// Node bookkeeping ===========================================================

impl<K> Node<K> {
    fn leaf(key: K) -> Box<Node<K>> {
        Box::new(Node {
            key,
            children: [None, None],
            height: 1,
        })
    }

    #[inline]
    fn child(&self, dir: Dir) -> Option<&Node<K>> {
        self.children[dir as usize].as_deref()
    }

    #[inline]
    fn left(&self) -> Option<&Node<K>> {
        self.child(Dir::Left)
    }

    #[inline]
    fn right(&self) -> Option<&Node<K>> {
        self.child(Dir::Right)
    }

    #[inline]
    fn take_child(&mut self, dir: Dir) -> Link<K> {
        self.children[dir as usize].take()
    }

    #[inline]
    fn set_child(&mut self, dir: Dir, child: Link<K>) -> Link<K> {
        mem::replace(&mut self.children[dir as usize], child)
    }

    // Recomputes the cached height from the children, which must already be up to date.
    #[inline]
    fn update_height(&mut self) {
        self.height = 1 + height_of(self.left()).max(height_of(self.right()));
    }

    #[inline]
    fn balance_factor(&self) -> i8 {
        height_of(self.left()) as i8 - height_of(self.right()) as i8
    }

    // Returns the side that is more than one level taller than the other, if any.
    fn heavy_side(&self) -> Option<Dir> {
        match self.balance_factor() {
            bf if bf > 1 => Some(Dir::Left),
            bf if bf < -1 => Some(Dir::Right),
            _ => None,
        }
    }
}

/// Returns the cached height of the subtree, or 0 if it is empty.
#[inline]
fn height_of<K>(node: Option<&Node<K>>) -> u8 {
    node.map_or(0, |n| n.height)
}

/// Returns the balance factor of the subtree root, or 0 if it is empty.
#[inline]
fn balance_factor_of<K>(node: Option<&Node<K>>) -> i8 {
    node.map_or(0, Node::balance_factor)
}

// Returns the last node reached by following `dir` links from `node`.
fn outermost<K>(node: &Node<K>, dir: Dir) -> &Node<K> {
    let mut cur = node;

    while let Some(next) = cur.child(dir) {
        cur = next;
    }

    cur
}

fn check_subtree<K>(node: Option<&Node<K>>) -> Result<(u8, usize), InvariantViolation> {
    let Some(node) = node else {
        return Ok((0, 0));
    };

    let (left_height, left_len) = check_subtree(node.left())?;
    let (right_height, right_len) = check_subtree(node.right())?;

    let actual = 1 + left_height.max(right_height);
    if node.height != actual {
        return Err(InvariantViolation::StaleHeight {
            cached: node.height,
            actual,
        });
    }

    let balance_factor = left_height as i8 - right_height as i8;
    if !(-1..=1).contains(&balance_factor) {
        return Err(InvariantViolation::Unbalanced { balance_factor });
    }

    Ok((actual, left_len + right_len + 1))
}

// Rotations ==================================================================

// Rotates `down` toward `dir`, promoting its child on the opposite side to subtree root.
//
// `rotate(y, Dir::Right)` is a right rotation: `x = y.left` becomes the root, `y` becomes
// `x.right`, and `x`'s old right subtree becomes `y.left`. `rotate(x, Dir::Left)` is the mirror
// image. Heights are updated child first.
fn rotate<K>(mut down: Box<Node<K>>, dir: Dir) -> Box<Node<K>> {
    let mut up = down
        .take_child(!dir)
        .expect("rotation requires a child to promote");

    let across = up.take_child(dir);
    down.set_child(!dir, across);
    down.update_height();

    up.set_child(dir, Some(down));
    up.update_height();

    tracing::trace!(?dir, height = up.height, "rotate");
    up
}

// Performs a double rotation of `down` toward `dir`.
//
// `rotate_twice(y, Dir::Right)` resolves the left-right case by rotating `y.left` left and then
// `y` right; `rotate_twice(x, Dir::Left)` resolves the right-left case.
fn rotate_twice<K>(mut down: Box<Node<K>>, dir: Dir) -> Box<Node<K>> {
    let child = down
        .take_child(!dir)
        .expect("double rotation requires a child on the heavy side");

    tracing::trace!(?dir, "double rotation");
    down.set_child(!dir, Some(rotate(child, !dir)));
    rotate(down, dir)
}

// Insertion ==================================================================

// Inserts `key` into the subtree, returning the new subtree root.
fn insert_at<K: Ord>(link: Link<K>, key: K) -> (Box<Node<K>>, Inserted) {
    let Some(mut node) = link else {
        return (Node::leaf(key), Inserted::Leaf);
    };

    let dir = match key.cmp(&node.key) {
        Ordering::Less => Dir::Left,
        Ordering::Equal => return (node, Inserted::Duplicate),
        Ordering::Greater => Dir::Right,
    };

    let (child, below) = insert_at(node.take_child(dir), key);
    node.set_child(dir, Some(child));

    if below == Inserted::Duplicate {
        return (node, Inserted::Duplicate);
    }

    node.update_height();
    (rebalance_inserted(node, below), Inserted::Below(dir))
}

// Restores balance at `node` after an insertion into one of its children.
//
// `below` is what the insertion reported for that child. Its direction is the side of the child
// the new key went down, i.e. how the new key compares to the child's key.
fn rebalance_inserted<K>(node: Box<Node<K>>, below: Inserted) -> Box<Node<K>> {
    let Some(heavy) = node.heavy_side() else {
        return node;
    };

    let grandchild = match below {
        Inserted::Below(dir) => dir,
        _ => unreachable!("a new leaf cannot unbalance its parent"),
    };

    if grandchild == heavy {
        // Left-left or right-right.
        rotate(node, !heavy)
    } else {
        // Left-right or right-left.
        rotate_twice(node, !heavy)
    }
}

// Removal ====================================================================

// Removes the node holding `key` from the subtree, returning the new subtree root and the
// removed key.
fn remove_at<K, Q>(link: Link<K>, key: &Q) -> (Link<K>, Option<K>)
where
    K: Borrow<Q> + Ord,
    Q: Ord + ?Sized,
{
    let Some(mut node) = link else {
        return (None, None);
    };

    let dir = match key.cmp(node.key.borrow()) {
        Ordering::Less => Dir::Left,
        Ordering::Equal => return unlink(node),
        Ordering::Greater => Dir::Right,
    };

    let (child, removed) = remove_at(node.take_child(dir), key);
    node.set_child(dir, child);

    if removed.is_none() {
        // Not found. The subtree is unchanged.
        return (Some(node), None);
    }

    (Some(rebalance_removed(node)), removed)
}

// Removes `node` from its subtree, returning the subtree that takes its place and its key.
fn unlink<K>(mut node: Box<Node<K>>) -> (Link<K>, Option<K>) {
    match (node.take_child(Dir::Left), node.take_child(Dir::Right)) {
        (Some(left), Some(right)) => {
            // The in-order successor leaves the right subtree and its key replaces this one.
            let (right, successor) = remove_outermost(right, Dir::Left);
            let removed = mem::replace(&mut node.key, successor);

            node.set_child(Dir::Left, Some(left));
            node.set_child(Dir::Right, right);

            (Some(rebalance_removed(node)), Some(removed))
        }

        (left, right) => {
            let Node { key, .. } = *node;
            (left.or(right), Some(key))
        }
    }
}

// Removes the outermost node on the `dir` side of the subtree, returning the remaining subtree
// and the removed key.
fn remove_outermost<K>(mut node: Box<Node<K>>, dir: Dir) -> (Link<K>, K) {
    match node.take_child(dir) {
        Some(child) => {
            let (child, key) = remove_outermost(child, dir);
            node.set_child(dir, child);

            (Some(rebalance_removed(node)), key)
        }

        None => {
            let rest = node.take_child(!dir);
            let Node { key, .. } = *node;

            (rest, key)
        }
    }
}

// Restores balance at `node` after a removal from one of its children.
//
// Unlike insertion there is no new key to steer by, so the shape of the heavy child decides: a
// child leaning the same way or not at all takes a single rotation, a child leaning inward takes a
// double rotation.
fn rebalance_removed<K>(mut node: Box<Node<K>>) -> Box<Node<K>> {
    node.update_height();

    let Some(heavy) = node.heavy_side() else {
        return node;
    };

    let lean = balance_factor_of(node.child(heavy)) * heavy.sign();

    if lean >= 0 {
        rotate(node, !heavy)
    } else {
        rotate_twice(node, !heavy)
    }
}

#[cfg(test)]
mod unit_tests {
    use super::*;

    fn leaf(key: u32) -> Link<u32> {
        Some(Node::leaf(key))
    }

    fn branch(key: u32, left: Link<u32>, right: Link<u32>) -> Link<u32> {
        let mut node = Node::leaf(key);
        node.set_child(Dir::Left, left);
        node.set_child(Dir::Right, right);
        node.update_height();
        Some(node)
    }

    fn keys(node: Option<&Node<u32>>, out: &mut Vec<u32>) {
        if let Some(node) = node {
            keys(node.left(), out);
            out.push(node.key);
            keys(node.right(), out);
        }
    }

    fn inorder(node: &Node<u32>) -> Vec<u32> {
        let mut out = Vec::new();
        keys(Some(node), &mut out);
        out
    }

    #[test]
    fn heights_and_balance_factors() {
        assert_eq!(height_of::<u32>(None), 0);
        assert_eq!(balance_factor_of::<u32>(None), 0);

        let node = branch(20, branch(10, leaf(5), None), None).unwrap();
        assert_eq!(node.height, 3);
        assert_eq!(node.balance_factor(), 2);
        assert_eq!(node.heavy_side(), Some(Dir::Left));
        assert_eq!(balance_factor_of(node.left()), 1);

        let node = branch(20, None, leaf(30)).unwrap();
        assert_eq!(node.height, 2);
        assert_eq!(node.balance_factor(), -1);
        assert_eq!(node.heavy_side(), None);
    }

    #[test]
    fn rotate_right_promotes_left_child() {
        // 30 -> 20 -> 10, all left children.
        let y = branch(30, branch(20, leaf(10), leaf(25)), leaf(40)).unwrap();
        let x = rotate(y, Dir::Right);

        assert_eq!(x.key, 20);
        assert_eq!(x.left().map(|n| n.key), Some(10));
        assert_eq!(x.right().map(|n| n.key), Some(30));
        // The old right subtree of `x` moved across to `y`.
        assert_eq!(x.right().and_then(Node::left).map(|n| n.key), Some(25));
        assert_eq!(inorder(&x), [10, 20, 25, 30, 40]);
        assert_eq!(x.height, 3);
        check_subtree(Some(&*x)).unwrap();
    }

    #[test]
    fn rotate_left_promotes_right_child() {
        let x = branch(10, None, branch(20, None, leaf(30))).unwrap();
        let y = rotate(x, Dir::Left);

        assert_eq!(y.key, 20);
        assert_eq!(inorder(&y), [10, 20, 30]);
        assert_eq!(y.height, 2);
        assert_eq!(y.balance_factor(), 0);
    }

    #[test]
    fn rotate_left_right() {
        let y = branch(30, branch(10, None, leaf(20)), None).unwrap();
        let root = rotate_twice(y, Dir::Right);

        assert_eq!(root.key, 20);
        assert_eq!(root.left().map(|n| n.key), Some(10));
        assert_eq!(root.right().map(|n| n.key), Some(30));
        assert_eq!(root.height, 2);
    }

    #[test]
    fn rotate_right_left() {
        let x = branch(10, None, branch(30, leaf(20), None)).unwrap();
        let root = rotate_twice(x, Dir::Left);

        assert_eq!(root.key, 20);
        assert_eq!(inorder(&root), [10, 20, 30]);
        assert_eq!(root.height, 2);
    }

    #[test]
    #[should_panic(expected = "rotation requires a child to promote")]
    fn rotate_without_child_panics() {
        let _ = rotate(Node::leaf(1u32), Dir::Right);
    }

    #[test]
    fn insert_reports_direction() {
        let (root, outcome) = insert_at(None, 5u32);
        assert_eq!(outcome, Inserted::Leaf);

        let (root, outcome) = insert_at(Some(root), 3);
        assert_eq!(outcome, Inserted::Below(Dir::Left));

        let (root, outcome) = insert_at(Some(root), 3);
        assert_eq!(outcome, Inserted::Duplicate);
        assert_eq!(inorder(&root), [3, 5]);
    }

    #[test]
    fn remove_outermost_takes_minimum() {
        let root = branch(20, branch(10, None, leaf(15)), branch(30, leaf(25), None)).unwrap();
        let (rest, key) = remove_outermost(root, Dir::Left);

        assert_eq!(key, 10);
        let rest = rest.unwrap();
        assert_eq!(inorder(&rest), [15, 20, 25, 30]);
        check_subtree(Some(&*rest)).unwrap();
    }
}
