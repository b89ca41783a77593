use super::Node;

/// An iterator that iteratively traverses the tree of nodes in left-to-right post-order (i.e.
/// depth-first).
///
/// This iterator is created by [`Node::post_order_iter`].
pub struct NodeIter {
    /// Nodes still to be visited, each paired with whether its operands have already been pushed.
    stack: Vec<(Node, bool)>,
}

impl NodeIter {
    /// Creates a new iterator that traverses the tree rooted at `node`.
    pub fn new(node: Node) -> Self {
        Self { stack: vec![(node, false)] }
    }
}

impl Iterator for NodeIter {
    type Item = Node;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let (node, expanded) = self.stack.pop()?;
            if expanded {
                return Some(node);
            }

            let args = node.args();
            self.stack.push((node, true));
            for arg in args.into_iter().rev() {
                self.stack.push((arg, false));
            }
        }
    }
}
