use std::{cmp::Ordering, fmt, iter::FusedIterator, slice, sync::Arc};

use crate::{ChildOrder, Family, GreenNode, Identity};

/// The recursive collection of a parent node.
///
/// Cloning is cheap, and a list is never modified in place: every edit
/// returns a new list, so two nodes share children exactly when
/// [`ChildList::ptr_eq`] says so.
pub struct ChildList<F: Family> {
    order: ChildOrder,
    nodes: Arc<[GreenNode<F>]>,
}

impl<F: Family> Clone for ChildList<F> {
    fn clone(&self) -> Self {
        ChildList { order: self.order, nodes: Arc::clone(&self.nodes) }
    }
}

impl<F: Family> fmt::Debug for ChildList<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.nodes.iter()).finish()
    }
}

impl<F: Family> PartialEq for ChildList<F> {
    fn eq(&self, other: &ChildList<F>) -> bool {
        ChildList::ptr_eq(self, other) || self.nodes[..] == other.nodes[..]
    }
}

impl<F: Family> ChildList<F> {
    pub(crate) fn new(order: ChildOrder, nodes: impl IntoIterator<Item = GreenNode<F>>) -> Self {
        let mut nodes: Vec<_> = nodes.into_iter().collect();
        if order == ChildOrder::Sorted {
            nodes.sort_by(|a, b| F::compare(a.payload(), b.payload()));
        }
        ChildList { order, nodes: nodes.into() }
    }

    /// Moves the children onto `stack` when this is the last handle to the
    /// list, so dropping it afterwards releases no node.
    pub(crate) fn release_into(mut self, stack: &mut Vec<GreenNode<F>>) {
        if Arc::get_mut(&mut self.nodes).is_some() {
            stack.extend(self.nodes.iter().cloned());
        }
    }

    #[inline]
    pub fn order(&self) -> ChildOrder {
        self.order
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<&GreenNode<F>> {
        self.nodes.get(index)
    }

    #[inline]
    pub fn iter(&self) -> Children<'_, F> {
        Children { inner: self.nodes.iter() }
    }

    #[inline]
    pub fn as_slice(&self) -> &[GreenNode<F>] {
        &self.nodes
    }

    pub fn index_of(&self, identity: Identity) -> Option<usize> {
        self.nodes.iter().position(|it| it.identity() == identity)
    }

    /// Whether both lists are the very same collection.
    #[inline]
    pub fn ptr_eq(this: &ChildList<F>, other: &ChildList<F>) -> bool {
        Arc::ptr_eq(&this.nodes, &other.nodes)
    }

    pub(crate) fn reordered(&self, order: ChildOrder) -> ChildList<F> {
        ChildList::new(order, self.nodes.iter().cloned())
    }

    /// Index a sorted list would insert `payload` at, after any equal keys.
    pub(crate) fn insertion_point(nodes: &[GreenNode<F>], payload: &F::Payload) -> usize {
        nodes.partition_point(|it| F::compare(it.payload(), payload) != Ordering::Greater)
    }

    pub(crate) fn insert(&self, child: GreenNode<F>) -> ChildList<F> {
        let mut nodes = self.nodes.to_vec();
        match self.order {
            ChildOrder::Sorted => {
                let at = ChildList::insertion_point(&nodes, child.payload());
                nodes.insert(at, child);
            }
            ChildOrder::Ordered | ChildOrder::Unordered => nodes.push(child),
        }
        ChildList { order: self.order, nodes: nodes.into() }
    }

    pub(crate) fn remove(&self, identity: Identity) -> Option<ChildList<F>> {
        let index = self.index_of(identity)?;
        let mut nodes = self.nodes.to_vec();
        nodes.remove(index);
        Some(ChildList { order: self.order, nodes: nodes.into() })
    }

    /// Swaps the child named `old` for `new`, re-sorting a sorted list.
    pub(crate) fn replace(&self, old: Identity, new: GreenNode<F>) -> Option<ChildList<F>> {
        let index = self.index_of(old)?;
        let mut nodes = self.nodes.to_vec();
        match self.order {
            ChildOrder::Sorted => {
                nodes.remove(index);
                let at = ChildList::insertion_point(&nodes, new.payload());
                nodes.insert(at, new);
            }
            ChildOrder::Ordered | ChildOrder::Unordered => nodes[index] = new,
        }
        Some(ChildList { order: self.order, nodes: nodes.into() })
    }
}

impl<'a, F: Family> IntoIterator for &'a ChildList<F> {
    type Item = &'a GreenNode<F>;
    type IntoIter = Children<'a, F>;

    fn into_iter(self) -> Children<'a, F> {
        self.iter()
    }
}

/// Iterator over the children of a parent node.
pub struct Children<'a, F: Family> {
    inner: slice::Iter<'a, GreenNode<F>>,
}

impl<F: Family> Clone for Children<'_, F> {
    fn clone(&self) -> Self {
        Children { inner: self.inner.clone() }
    }
}

impl<F: Family> fmt::Debug for Children<'_, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.inner.clone()).finish()
    }
}

impl<F: Family> ExactSizeIterator for Children<'_, F> {
    #[inline(always)]
    fn len(&self) -> usize {
        self.inner.len()
    }
}

impl<'a, F: Family> Iterator for Children<'a, F> {
    type Item = &'a GreenNode<F>;

    #[inline]
    fn next(&mut self) -> Option<&'a GreenNode<F>> {
        self.inner.next()
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }

    #[inline]
    fn count(self) -> usize
    where
        Self: Sized,
    {
        self.inner.count()
    }

    #[inline]
    fn nth(&mut self, n: usize) -> Option<Self::Item> {
        self.inner.nth(n)
    }

    #[inline]
    fn last(mut self) -> Option<Self::Item>
    where
        Self: Sized,
    {
        self.next_back()
    }
}

impl<F: Family> DoubleEndedIterator for Children<'_, F> {
    #[inline]
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back()
    }

    #[inline]
    fn nth_back(&mut self, n: usize) -> Option<Self::Item> {
        self.inner.nth_back(n)
    }
}

impl<F: Family> FusedIterator for Children<'_, F> {}
