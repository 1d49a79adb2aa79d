use crate::{ChildList, Family, GreenNode, Identity};

/// A checkpoint for maybe wrapping a node. See `GreenNodeBuilder::checkpoint` for details.
#[derive(Clone, Copy, Debug)]
pub struct Checkpoint(usize);

/// A builder for a green tree, top down.
///
/// Unlike trees built from syntax, nodes here are never deduplicated: two
/// equal payloads still become two nodes with distinct identities.
pub struct GreenNodeBuilder<F: Family> {
    parents: Vec<(F::Payload, Identity, usize)>,
    children: Vec<GreenNode<F>>,
}

impl<F: Family> Default for GreenNodeBuilder<F> {
    fn default() -> Self {
        GreenNodeBuilder { parents: Vec::new(), children: Vec::new() }
    }
}

impl<F: Family> GreenNodeBuilder<F> {
    /// Creates new builder.
    #[inline]
    pub fn new() -> GreenNodeBuilder<F> {
        GreenNodeBuilder::default()
    }

    /// Adds a new leaf to the current branch.
    #[inline]
    pub fn leaf(&mut self, payload: F::Payload) -> Identity {
        let leaf = GreenNode::leaf(payload);
        let identity = leaf.identity();
        self.children.push(leaf);
        identity
    }

    /// Adds an already built subtree to the current branch.
    #[inline]
    pub fn push(&mut self, node: GreenNode<F>) {
        self.children.push(node);
    }

    /// Start new node and make it current. The node's identity is allocated
    /// now, so it is known before its children are.
    #[inline]
    pub fn start_node(&mut self, payload: F::Payload) -> Identity {
        let len = self.children.len();
        let identity = Identity::new();
        self.parents.push((payload, identity, len));
        identity
    }

    /// Finish current branch and restore previous
    /// branch as current.
    #[inline]
    pub fn finish_node(&mut self) -> Identity {
        let (payload, identity, first_child) =
            self.parents.pop().expect("finish_node without a matching start_node");
        let order = F::child_order(F::kind(&payload));
        let children = ChildList::new(order, self.children.drain(first_child..));
        self.children.push(GreenNode::from_parts(identity, payload, Some(children), None));
        identity
    }

    /// Prepare for maybe wrapping the next node.
    /// The way wrapping works is that you first of all get a checkpoint,
    /// then you add all nodes you want to wrap, and then *maybe* call
    /// `start_node_at`.
    #[inline]
    pub fn checkpoint(&self) -> Checkpoint {
        Checkpoint(self.children.len())
    }

    /// Wrap the previous nodes marked by `checkpoint` in a new branch and
    /// make it current.
    #[inline]
    pub fn start_node_at(&mut self, checkpoint: Checkpoint, payload: F::Payload) -> Identity {
        let Checkpoint(checkpoint) = checkpoint;
        assert!(
            checkpoint <= self.children.len(),
            "checkpoint no longer valid, was finish_node called early?"
        );

        if let Some(&(_, _, first_child)) = self.parents.last() {
            assert!(
                checkpoint >= first_child,
                "checkpoint no longer valid, was an unmatched start_node_at called?"
            );
        }

        let identity = Identity::new();
        self.parents.push((payload, identity, checkpoint));
        identity
    }

    /// Complete tree building. Make sure that
    /// `start_node_at` and `finish_node` calls
    /// are paired!
    #[inline]
    pub fn finish(mut self) -> GreenNode<F> {
        assert!(self.parents.is_empty(), "unfinished nodes left in the builder");
        assert_eq!(self.children.len(), 1);
        match self.children.pop() {
            Some(root) => root,
            None => unreachable!(),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        fixture::{heading, Item, Outline},
        GreenNodeBuilder,
    };

    #[test]
    fn builds_nested_nodes() {
        let mut builder = GreenNodeBuilder::<Outline>::new();
        let root = builder.start_node(Item::section("root"));
        let a = builder.leaf(Item::heading("a"));
        let inner = builder.start_node(Item::section("inner"));
        builder.push(heading("b"));
        assert_eq!(builder.finish_node(), inner);
        builder.finish_node();
        let tree = builder.finish();

        assert_eq!(tree.identity(), root);
        assert_eq!(tree.children().unwrap().len(), 2);
        assert_eq!(tree.parent_of(a).unwrap().identity(), root);
        assert_eq!(tree.find(inner).unwrap().children().unwrap().len(), 1);
        tree.validate_internal_integrity().unwrap();
    }

    #[test]
    fn checkpoint_wraps_earlier_nodes() {
        let mut builder = GreenNodeBuilder::<Outline>::new();
        builder.start_node(Item::section("root"));
        let checkpoint = builder.checkpoint();
        let a = builder.leaf(Item::heading("a"));
        let b = builder.leaf(Item::heading("b"));
        let wrapper = builder.start_node_at(checkpoint, Item::section("wrapper"));
        builder.finish_node();
        builder.finish_node();
        let tree = builder.finish();

        assert_eq!(tree.children().unwrap().len(), 1);
        assert_eq!(tree.parent_of(a).unwrap().identity(), wrapper);
        assert_eq!(tree.parent_of(b).unwrap().identity(), wrapper);
    }
}
