use core::iter::FusedIterator;

use crate::{AvlTree, Node};

// In-order walk over the nodes of a tree.
//
// The stack holds the nodes whose left subtrees have been entered but which have not been yielded
// yet, innermost last. It never grows beyond the tree height.
pub(crate) struct Nodes<'tree, K> {
    stack: Vec<&'tree Node<K>>,
    len: usize,
}

impl<'tree, K> Nodes<'tree, K> {
    pub(crate) fn new(tree: &'tree AvlTree<K>) -> Self {
        let mut nodes = Nodes {
            stack: Vec::with_capacity(tree.height()),
            len: tree.len(),
        };

        nodes.descend(tree.root.as_deref());
        nodes
    }

    // Upon entering a new subtree, stack up the path to its minimum element.
    fn descend(&mut self, mut opt_cur: Option<&'tree Node<K>>) {
        while let Some(cur) = opt_cur {
            self.stack.push(cur);
            opt_cur = cur.left();
        }
    }
}

impl<'tree, K> Iterator for Nodes<'tree, K> {
    type Item = &'tree Node<K>;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;

        // The left subtree of `node` is exhausted; its right subtree comes next.
        self.descend(node.right());
        self.len -= 1;

        Some(node)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.len, Some(self.len))
    }
}

/// An iterator over the elements of an [`AvlTree`] in ascending order.
///
/// Created by [`AvlTree::iter`].
pub struct Iter<'tree, K> {
    nodes: Nodes<'tree, K>,
}

impl<'tree, K> Iter<'tree, K> {
    pub(crate) fn new(tree: &'tree AvlTree<K>) -> Self {
        Iter {
            nodes: Nodes::new(tree),
        }
    }
}

impl<'tree, K> Iterator for Iter<'tree, K> {
    type Item = &'tree K;

    fn next(&mut self) -> Option<Self::Item> {
        self.nodes.next().map(|node| &node.key)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.nodes.size_hint()
    }
}

impl<K> ExactSizeIterator for Iter<'_, K> {}

impl<K> FusedIterator for Iter<'_, K> {}
