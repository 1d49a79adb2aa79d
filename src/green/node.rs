use std::{fmt, sync::Arc};

use countme::Count;

use crate::{
    lookup::{self, LookupTable, TableState},
    ChildList, Children, Family, Identity, Result, TreeError,
};

pub(crate) struct GreenNodeData<F: Family> {
    identity: Identity,
    payload: F::Payload,
    children: Option<ChildList<F>>,
    pub(crate) lookup: TableState<F>,
    inefficiency_load: u32,
    _c: Count<GreenNode<F>>,
}

// Dropping a deep tree recursively would overflow the stack, so the last
// owner of a node hands its children and table entries to an explicit stack.
impl<F: Family> Drop for GreenNodeData<F> {
    fn drop(&mut self) {
        let mut stack = Vec::new();
        self.release_into(&mut stack);
        while let Some(node) = stack.pop() {
            if let Ok(mut data) = Arc::try_unwrap(node.data) {
                data.release_into(&mut stack);
            }
        }
    }
}

impl<F: Family> GreenNodeData<F> {
    fn release_into(&mut self, stack: &mut Vec<GreenNode<F>>) {
        if let Some(children) = self.children.take() {
            children.release_into(stack);
        }
        if let TableState::Deferred(cell) = &mut self.lookup {
            if let Some(table) = cell.take() {
                stack.extend(table.iter().map(|(_, entry)| entry.node.clone()));
            }
        }
    }
}

/// Immutable, parent-unaware node of a persistent tree.
///
/// A green node knows its identity, its payload and (for parents) its
/// children, and nothing about where it sits in a larger tree. That is what
/// lets one green node be shared by any number of trees and versions. Use
/// [`GreenNode::as_root`] or [`GreenNode::with_root`] to get a view that can
/// navigate upwards.
///
/// Equality is structural: identity, payload and children must all match.
/// Use [`GreenNode::ptr_eq`] to ask whether two handles are the same
/// allocation.
pub struct GreenNode<F: Family> {
    pub(crate) data: Arc<GreenNodeData<F>>,
}

impl<F: Family> Clone for GreenNode<F> {
    #[inline]
    fn clone(&self) -> Self {
        GreenNode { data: Arc::clone(&self.data) }
    }
}

impl<F: Family> PartialEq for GreenNode<F> {
    fn eq(&self, other: &GreenNode<F>) -> bool {
        GreenNode::ptr_eq(self, other)
            || (self.identity() == other.identity()
                && self.payload() == other.payload()
                && self.data.children == other.data.children)
    }
}

impl<F: Family> fmt::Debug for GreenNode<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("GreenNode");
        s.field("identity", &self.identity()).field("payload", self.payload());
        if let Some(children) = &self.data.children {
            s.field("children", children);
        }
        s.finish()
    }
}

impl<F: Family> GreenNode<F> {
    /// Creates a node that cannot have children.
    pub fn leaf(payload: F::Payload) -> GreenNode<F> {
        GreenNode::from_parts(Identity::new(), payload, None, None)
    }

    /// Creates a parent node. Children of a sorted kind are sorted here.
    pub fn parent(
        payload: F::Payload,
        children: impl IntoIterator<Item = GreenNode<F>>,
    ) -> GreenNode<F> {
        let order = F::child_order(F::kind(&payload));
        let children = ChildList::new(order, children);
        GreenNode::from_parts(Identity::new(), payload, Some(children), None)
    }

    /// Assembles a node, deciding whether it wants a lookup table. A `prior`
    /// table is adopted as is, so it must already describe `children`.
    pub(crate) fn from_parts(
        identity: Identity,
        payload: F::Payload,
        children: Option<ChildList<F>>,
        prior: Option<LookupTable<F>>,
    ) -> GreenNode<F> {
        let (lookup, inefficiency_load) = match &children {
            Some(children) => lookup::initialize(children, prior),
            None => (TableState::Absent, 1),
        };
        GreenNode::from_raw_parts(identity, payload, children, lookup, inefficiency_load)
    }

    pub(crate) fn from_raw_parts(
        identity: Identity,
        payload: F::Payload,
        children: Option<ChildList<F>>,
        lookup: TableState<F>,
        inefficiency_load: u32,
    ) -> GreenNode<F> {
        let data =
            GreenNodeData { identity, payload, children, lookup, inefficiency_load, _c: Count::new() };
        GreenNode { data: Arc::new(data) }
    }

    #[inline]
    pub fn identity(&self) -> Identity {
        self.data.identity
    }

    #[inline]
    pub fn payload(&self) -> &F::Payload {
        &self.data.payload
    }

    #[inline]
    pub fn kind(&self) -> F::Kind {
        F::kind(self.payload())
    }

    /// Whether this node carries a children collection, even an empty one.
    #[inline]
    pub fn is_parent(&self) -> bool {
        self.data.children.is_some()
    }

    #[inline]
    pub fn child_list(&self) -> Option<&ChildList<F>> {
        self.data.children.as_ref()
    }

    /// Children of this node, `None` for leaves.
    #[inline]
    pub fn children(&self) -> Option<Children<'_, F>> {
        self.data.children.as_ref().map(ChildList::iter)
    }

    #[inline]
    pub(crate) fn inefficiency_load(&self) -> u32 {
        self.data.inefficiency_load
    }

    /// Whether both handles point to the same allocation.
    #[inline]
    pub fn ptr_eq(this: &GreenNode<F>, other: &GreenNode<F>) -> bool {
        Arc::ptr_eq(&this.data, &other.data)
    }

    /// A new version of this node with a different payload.
    ///
    /// Returns `self` unchanged when the payload is equal. Descendants are
    /// untouched, so a materialized lookup table carries over.
    pub fn with_payload(&self, payload: F::Payload) -> GreenNode<F> {
        if *self.payload() == payload {
            return self.clone();
        }
        let order = F::child_order(F::kind(&payload));
        let (children, prior) = match &self.data.children {
            Some(children) if children.order() != order => (Some(children.reordered(order)), None),
            Some(children) => (Some(children.clone()), self.data.lookup.materialized().cloned()),
            None => (None, None),
        };
        GreenNode::from_parts(self.identity(), payload, children, prior)
    }

    /// A new version of this node with the given children, turning a leaf
    /// into a parent if necessary.
    pub fn with_children(&self, children: impl IntoIterator<Item = GreenNode<F>>) -> GreenNode<F> {
        let children = ChildList::new(F::child_order(self.kind()), children);
        GreenNode::from_parts(self.identity(), self.payload().clone(), Some(children), None)
    }

    /// A new version of this node without a children collection.
    pub fn to_leaf(&self) -> GreenNode<F> {
        if !self.is_parent() {
            return self.clone();
        }
        GreenNode::from_parts(self.identity(), self.payload().clone(), None, None)
    }

    pub fn add_child(&self, child: GreenNode<F>) -> Result<GreenNode<F>> {
        let children = self
            .child_list()
            .ok_or(TreeError::NotAParent { identity: self.identity() })?
            .insert(child);
        Ok(GreenNode::from_parts(self.identity(), self.payload().clone(), Some(children), None))
    }

    pub fn remove_child(&self, identity: Identity) -> Result<GreenNode<F>> {
        let children = self
            .child_list()
            .and_then(|it| it.remove(identity))
            .ok_or(TreeError::NotFound { identity })?;
        Ok(GreenNode::from_parts(self.identity(), self.payload().clone(), Some(children), None))
    }
}
