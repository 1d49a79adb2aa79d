use std::{collections::VecDeque, fmt, mem};

use crate::{Family, GreenNode};

/// `WalkEvent` describes tree walking process.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum WalkEvent<T> {
    /// Fired before traversing the node.
    Enter(T),
    /// Fired after the node is traversed.
    Leave(T),
}

impl<T> WalkEvent<T> {
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> WalkEvent<U> {
        match self {
            WalkEvent::Enter(it) => WalkEvent::Enter(f(it)),
            WalkEvent::Leave(it) => WalkEvent::Leave(f(it)),
        }
    }
}

/// A node together with the parent it was reached through.
pub struct ParentedNode<F: Family> {
    pub node: GreenNode<F>,
    pub parent: Option<GreenNode<F>>,
}

impl<F: Family> Clone for ParentedNode<F> {
    fn clone(&self) -> Self {
        ParentedNode { node: self.node.clone(), parent: self.parent.clone() }
    }
}

impl<F: Family> PartialEq for ParentedNode<F> {
    fn eq(&self, other: &ParentedNode<F>) -> bool {
        self.node == other.node && self.parent == other.parent
    }
}

impl<F: Family> fmt::Debug for ParentedNode<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParentedNode")
            .field("node", &self.node.identity())
            .field("parent", &self.parent.as_ref().map(GreenNode::identity))
            .finish()
    }
}

/// Depth-first traversal of a subtree, starting at (and including) its root.
pub struct Preorder<F: Family> {
    start: Option<GreenNode<F>>,
    // Entered nodes still being walked, with the index of the next child.
    stack: Vec<(GreenNode<F>, usize)>,
    skip_subtree: bool,
    entered_last: bool,
}

impl<F: Family> Preorder<F> {
    fn new(start: GreenNode<F>) -> Preorder<F> {
        Preorder { start: Some(start), stack: Vec::new(), skip_subtree: false, entered_last: false }
    }

    /// Skips the children of the node that was just entered; the next event
    /// is its `Leave`.
    pub fn skip_subtree(&mut self) {
        self.skip_subtree = true;
    }

    #[cold]
    fn do_skip(&mut self) {
        if self.entered_last {
            if let Some((_, next_child)) = self.stack.last_mut() {
                *next_child = usize::MAX;
            }
        }
    }
}

impl<F: Family> Iterator for Preorder<F> {
    type Item = WalkEvent<ParentedNode<F>>;

    fn next(&mut self) -> Option<WalkEvent<ParentedNode<F>>> {
        if let Some(start) = self.start.take() {
            self.stack.push((start.clone(), 0));
            self.entered_last = true;
            return Some(WalkEvent::Enter(ParentedNode { node: start, parent: None }));
        }
        if mem::take(&mut self.skip_subtree) {
            self.do_skip();
        }

        let (node, next_child) = self.stack.last_mut()?;
        let child = node.child_list().and_then(|it| it.get(*next_child)).cloned();
        match child {
            Some(child) => {
                *next_child += 1;
                let parent = node.clone();
                self.stack.push((child.clone(), 0));
                self.entered_last = true;
                Some(WalkEvent::Enter(ParentedNode { node: child, parent: Some(parent) }))
            }
            None => {
                let (node, _) = self.stack.pop()?;
                let parent = self.stack.last().map(|(parent, _)| parent.clone());
                self.entered_last = false;
                Some(WalkEvent::Leave(ParentedNode { node, parent }))
            }
        }
    }
}

/// Level-order traversal of a subtree, starting at (and including) its root.
pub struct BreadthFirst<F: Family> {
    queue: VecDeque<ParentedNode<F>>,
}

impl<F: Family> Iterator for BreadthFirst<F> {
    type Item = ParentedNode<F>;

    fn next(&mut self) -> Option<ParentedNode<F>> {
        let next = self.queue.pop_front()?;
        for child in next.node.children().into_iter().flatten() {
            self.queue.push_back(ParentedNode { node: child.clone(), parent: Some(next.node.clone()) });
        }
        Some(next)
    }
}

impl<F: Family> GreenNode<F> {
    #[inline]
    pub fn preorder(&self) -> Preorder<F> {
        Preorder::new(self.clone())
    }

    /// This node and every descendant, depth first, each with its parent
    /// within this subtree (`None` for this node).
    pub fn self_and_descendants(&self) -> impl Iterator<Item = ParentedNode<F>> {
        self.preorder().filter_map(|event| match event {
            WalkEvent::Enter(it) => Some(it),
            WalkEvent::Leave(_) => None,
        })
    }

    /// Every descendant of this node, depth first.
    pub fn descendants(&self) -> impl Iterator<Item = ParentedNode<F>> {
        self.self_and_descendants().skip(1)
    }

    /// This node and every descendant, level by level.
    pub fn self_and_descendants_breadth_first(&self) -> BreadthFirst<F> {
        let root = ParentedNode { node: self.clone(), parent: None };
        BreadthFirst { queue: VecDeque::from(vec![root]) }
    }
}
