use core::iter::FusedIterator;
use std::{collections::VecDeque, fmt};

use crate::{iter::Nodes, AvlTree, Node};

/// An iterator over the elements of an [`AvlTree`] paired with the balance factors of their
/// nodes, in ascending order.
///
/// Created by [`AvlTree::balance_factors`].
pub struct BalanceFactors<'tree, K> {
    nodes: Nodes<'tree, K>,
}

impl<'tree, K> BalanceFactors<'tree, K> {
    pub(crate) fn new(tree: &'tree AvlTree<K>) -> Self {
        BalanceFactors {
            nodes: Nodes::new(tree),
        }
    }
}

impl<'tree, K> Iterator for BalanceFactors<'tree, K> {
    type Item = (&'tree K, i8);

    fn next(&mut self) -> Option<Self::Item> {
        self.nodes
            .next()
            .map(|node| (&node.key, node.balance_factor()))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.nodes.size_hint()
    }
}

impl<K> ExactSizeIterator for BalanceFactors<'_, K> {}

impl<K> FusedIterator for BalanceFactors<'_, K> {}

impl<K> AvlTree<K> {
    /// Writes the tree to `w` as a Graphviz digraph.
    ///
    /// Each level of the tree is laid out as one rank. Nodes are labelled `key:balance_factor`
    /// and missing children are drawn as points.
    pub fn dotgraph<W>(&self, name: &str, mut w: W) -> fmt::Result
    where
        W: fmt::Write,
        K: fmt::Display,
    {
        let root = match self.root.as_deref() {
            Some(r) => r,
            None => return write!(w, "digraph \"graph-{name}\" {{}}"),
        };

        enum Item<'a, K> {
            Node(&'a Node<K>),
            Missing(u32),
        }

        let mut queue = VecDeque::new();
        queue.push_back(Item::Node(root));

        write!(
            w,
            "digraph \"graph-{name}\" {{\n subgraph \"subgraph-{name}\" {{"
        )?;

        let mut missing = 0;
        let mut links = String::new();

        while !queue.is_empty() {
            use fmt::Write;

            write!(w, "{{rank=same; ")?;

            for _ in 0..queue.len() {
                let node = match queue.pop_front() {
                    Some(Item::Node(node)) => node,
                    Some(Item::Missing(id)) => {
                        write!(w, "\"graph{name}-missing{id}\" [shape=point]; ")?;
                        continue;
                    }
                    None => break,
                };

                let key = &node.key;
                let bf = node.balance_factor();
                write!(w, "\"graph{name}-{key}\" [label=\"{key}:{bf}\"]; ")?;

                for child in [node.left(), node.right()] {
                    match child {
                        Some(child) => {
                            let child_key = &child.key;
                            queue.push_back(Item::Node(child));
                            writeln!(
                                links,
                                "\"graph{name}-{key}\" -> \"graph{name}-{child_key}\";"
                            )?;
                        }

                        None => {
                            queue.push_back(Item::Missing(missing));
                            writeln!(
                                links,
                                "\"graph{name}-{key}\" -> \"graph{name}-missing{missing}\";"
                            )?;
                            missing += 1;
                        }
                    }
                }
            }

            writeln!(w, "}}")?;
        }

        w.write_str(&links)?;

        w.write_str(" }\n}")
    }
}
