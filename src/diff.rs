//! Structural differences between two versions of one tree.
//!
//! Nodes are matched across versions by identity. A node only in the older
//! version was removed, a node only in the newer one was added, and a node
//! in both was replaced if any of its fields, its parent or its position
//! among its siblings changed. Only the topmost node of an added or removed
//! subtree is reported.

use std::{cmp::Ordering, fmt};

use bitflags::Flags;
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::debug;

use crate::{
    ChildList, ChildOrder, Family, GreenNode, Identity, ParentedNode, PropertySet, Result,
    TreeError,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiffKind {
    Added,
    Replaced,
    Removed,
}

/// One change between two versions of a tree.
pub struct DiffGram<F: Family> {
    before: Option<GreenNode<F>>,
    after: Option<GreenNode<F>>,
    kind: DiffKind,
    changes: F::Properties,
}

impl<F: Family> Clone for DiffGram<F> {
    fn clone(&self) -> Self {
        DiffGram {
            before: self.before.clone(),
            after: self.after.clone(),
            kind: self.kind,
            changes: self.changes,
        }
    }
}

impl<F: Family> PartialEq for DiffGram<F> {
    fn eq(&self, other: &DiffGram<F>) -> bool {
        self.kind == other.kind
            && self.changes == other.changes
            && self.before == other.before
            && self.after == other.after
    }
}

impl<F: Family> fmt::Debug for DiffGram<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DiffGram")
            .field("identity", &self.identity())
            .field("kind", &self.kind)
            .field("changes", &self.changes)
            .field("before", &self.before.as_ref().map(GreenNode::payload))
            .field("after", &self.after.as_ref().map(GreenNode::payload))
            .finish()
    }
}

impl<F: Family> DiffGram<F> {
    fn added(after: GreenNode<F>) -> DiffGram<F> {
        DiffGram {
            before: None,
            after: Some(after),
            kind: DiffKind::Added,
            changes: F::Properties::empty(),
        }
    }

    fn removed(before: GreenNode<F>) -> DiffGram<F> {
        DiffGram {
            before: Some(before),
            after: None,
            kind: DiffKind::Removed,
            changes: F::Properties::empty(),
        }
    }

    fn replaced(before: GreenNode<F>, after: GreenNode<F>, changes: F::Properties) -> DiffGram<F> {
        DiffGram { before: Some(before), after: Some(after), kind: DiffKind::Replaced, changes }
    }

    /// The node as it was; `None` for additions.
    #[inline]
    pub fn before(&self) -> Option<&GreenNode<F>> {
        self.before.as_ref()
    }

    /// The node as it is now; `None` for removals.
    #[inline]
    pub fn after(&self) -> Option<&GreenNode<F>> {
        self.after.as_ref()
    }

    #[inline]
    pub fn kind(&self) -> DiffKind {
        self.kind
    }

    /// Properties that differ between `before` and `after`. Empty unless
    /// the kind is [`DiffKind::Replaced`].
    #[inline]
    pub fn changes(&self) -> F::Properties {
        self.changes
    }

    pub fn identity(&self) -> Identity {
        match (&self.before, &self.after) {
            (Some(node), _) | (None, Some(node)) => node.identity(),
            (None, None) => unreachable!("a diffgram always has a node"),
        }
    }
}

/// Every node of one version with its parent, in preorder.
struct Snapshot<F: Family> {
    nodes: Vec<ParentedNode<F>>,
    index: FxHashMap<Identity, usize>,
}

impl<F: Family> Snapshot<F> {
    fn new(root: &GreenNode<F>) -> Snapshot<F> {
        let nodes: Vec<_> = root.self_and_descendants().collect();
        let index = nodes.iter().enumerate().map(|(i, it)| (it.node.identity(), i)).collect();
        Snapshot { nodes, index }
    }

    fn get(&self, identity: Identity) -> Option<&ParentedNode<F>> {
        self.index.get(&identity).map(|&i| &self.nodes[i])
    }

    fn contains(&self, identity: Identity) -> bool {
        self.index.contains_key(&identity)
    }

    /// Nodes missing from `other`, skipping those under another such node.
    fn topmost_missing_from(&self, other: &Snapshot<F>) -> Vec<GreenNode<F>> {
        let mut buried = FxHashSet::default();
        let mut res = Vec::new();
        for it in &self.nodes {
            let identity = it.node.identity();
            let under_buried = it.parent.as_ref().map_or(false, |p| buried.contains(&p.identity()));
            if under_buried {
                buried.insert(identity);
            } else if !other.contains(identity) {
                buried.insert(identity);
                res.push(it.node.clone());
            }
        }
        res
    }
}

impl<F: Family> GreenNode<F> {
    /// Changes that turn `prior` into `self`, which must be two versions of
    /// the same logical node.
    ///
    /// Removals come first, then replacements, both in the preorder of
    /// `prior`, then additions in the preorder of `self`.
    pub fn changes_since(&self, prior: &GreenNode<F>) -> Result<Vec<DiffGram<F>>> {
        if self.identity() != prior.identity() {
            return Err(TreeError::VersionMismatch {
                current: self.identity(),
                prior: prior.identity(),
            });
        }
        if GreenNode::ptr_eq(self, prior) {
            return Ok(Vec::new());
        }

        let before = Snapshot::new(prior);
        let after = Snapshot::new(self);

        let removed = before.topmost_missing_from(&after);
        let added = after.topmost_missing_from(&before);

        let mut replaced = Vec::new();
        for old in &before.nodes {
            let new = match after.get(old.node.identity()) {
                Some(it) => it,
                None => continue,
            };
            if !is_candidate(old, new) {
                continue;
            }
            let changes = node_changes(old, new);
            if !changes.is_empty() {
                replaced.push(DiffGram::replaced(old.node.clone(), new.node.clone(), changes));
            }
        }

        debug!(
            root = %self.identity(),
            removed = removed.len(),
            replaced = replaced.len(),
            added = added.len(),
            "computed changes"
        );
        let mut res = Vec::with_capacity(removed.len() + replaced.len() + added.len());
        res.extend(removed.into_iter().map(DiffGram::removed));
        res.extend(replaced);
        res.extend(added.into_iter().map(DiffGram::added));
        Ok(res)
    }
}

fn is_candidate<F: Family>(old: &ParentedNode<F>, new: &ParentedNode<F>) -> bool {
    if !GreenNode::ptr_eq(&old.node, &new.node) {
        return true;
    }
    match (&old.parent, &new.parent) {
        (None, None) => false,
        (Some(old), Some(new)) => !GreenNode::ptr_eq(old, new),
        _ => true,
    }
}

fn node_changes<F: Family>(old: &ParentedNode<F>, new: &ParentedNode<F>) -> F::Properties {
    let mut changes = F::diff_properties(old.node.payload(), new.node.payload());
    if old.node.kind() != new.node.kind() {
        changes.insert(F::Properties::TYPE);
    }
    match (&old.parent, &new.parent) {
        (None, None) => (),
        (Some(old_parent), Some(new_parent)) if old_parent.identity() == new_parent.identity() => {
            if moved_under_parent(old, old_parent, new, new_parent) {
                changes.insert(F::Properties::POSITION_UNDER_PARENT);
            }
        }
        _ => changes.insert(F::Properties::PARENT),
    }
    changes
}

fn moved_under_parent<F: Family>(
    old: &ParentedNode<F>,
    old_parent: &GreenNode<F>,
    new: &ParentedNode<F>,
    new_parent: &GreenNode<F>,
) -> bool {
    let (old_list, new_list) = match (old_parent.child_list(), new_parent.child_list()) {
        (Some(old_list), Some(new_list)) => (old_list, new_list),
        _ => return false,
    };
    match new_list.order() {
        ChildOrder::Unordered => false,
        ChildOrder::Sorted => moved_in_sorted(&old.node, &new.node, new_list),
        ChildOrder::Ordered => {
            let identity = new.node.identity();
            common_index(old_list, new_list, identity) != common_index(new_list, old_list, identity)
        }
    }
}

// A sibling added or removed elsewhere shifts indices without moving the
// node, so the old payload is placed among the new siblings and only a
// landing spot other than the node's own slot (or the one right after it)
// counts as a move.
fn moved_in_sorted<F: Family>(
    old: &GreenNode<F>,
    new: &GreenNode<F>,
    new_list: &ChildList<F>,
) -> bool {
    if F::compare(old.payload(), new.payload()) == Ordering::Equal {
        return false;
    }
    let landing = match new_list.index_of(new.identity()) {
        Some(it) => it,
        None => return false,
    };
    let siblings: Vec<_> =
        new_list.iter().filter(|it| it.identity() != new.identity()).cloned().collect();
    let old_landing = ChildList::insertion_point(&siblings, old.payload());
    old_landing != landing && old_landing != landing + 1
}

// Index of `identity` among the children of `list` that also appear in
// `other`.
fn common_index<F: Family>(
    list: &ChildList<F>,
    other: &ChildList<F>,
    identity: Identity,
) -> Option<usize> {
    let shared: FxHashSet<Identity> = other.iter().map(GreenNode::identity).collect();
    list.iter()
        .filter(|it| shared.contains(&it.identity()))
        .position(|it| it.identity() == identity)
}
