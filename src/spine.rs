//! Paths from a root to one of its descendants, and rewriting them.
//!
//! Editing a node of a persistent tree means building new versions of all of
//! its ancestors. The chain of ancestors is the *spine*; each ancestor is
//! rebuilt with [`GreenNode::replace_child`], which also carries the
//! ancestor's lookup table over to the new version.

use std::{collections::VecDeque, slice};

use once_cell::sync::OnceCell;
use tracing::trace;

use crate::{
    lookup::{self, TableState},
    Family, GreenNode, Identity, Result, TreeError,
};

impl<F: Family> GreenNode<F> {
    /// The nodes from `self` down to the node with identity `target`, both
    /// included. Empty when `target` is not in this subtree.
    pub fn spine(&self, target: Identity) -> Vec<GreenNode<F>> {
        let mut spine = Vec::new();
        if self.collect_spine(target, &mut spine) {
            spine.push(self.clone());
            spine.reverse();
        } else {
            trace!(root = %self.identity(), %target, "no spine to target");
        }
        spine
    }

    /// Like [`GreenNode::spine`], but only when the node found under
    /// `node`'s identity is `node` itself.
    pub fn spine_to(&self, node: &GreenNode<F>) -> Vec<GreenNode<F>> {
        let spine = self.spine(node.identity());
        match spine.last() {
            Some(tail) if tail == node => spine,
            _ => Vec::new(),
        }
    }

    // Pushes the spine below `self` leaf first, excluding `self`.
    fn collect_spine(&self, target: Identity, acc: &mut Vec<GreenNode<F>>) -> bool {
        if self.identity() == target {
            return true;
        }
        if let Some(table) = self.lookup_table() {
            let mut entry = match table.get(target) {
                Some(it) => it,
                None => return false,
            };
            let start = acc.len();
            loop {
                acc.push(entry.node.clone());
                if entry.parent == self.identity() {
                    return true;
                }
                entry = match table.get(entry.parent) {
                    Some(it) => it,
                    None => {
                        acc.truncate(start);
                        return false;
                    }
                };
            }
        }
        for child in self.children().into_iter().flatten() {
            if child.collect_spine(target, acc) {
                acc.push(child.clone());
                return true;
            }
        }
        false
    }

    /// A new version of this node with one child swapped.
    ///
    /// `old_spine` runs from the old child down to the edited node and
    /// `new_spine` from its replacement down to the new version of that
    /// node. An empty `old_spine` adds `new_spine[0]` as a new child; an
    /// empty `new_spine` removes `old_spine[0]`.
    pub fn replace_child(
        &self,
        old_spine: &[GreenNode<F>],
        new_spine: &[GreenNode<F>],
    ) -> Result<GreenNode<F>> {
        let list = match self.child_list() {
            Some(it) => it,
            None => {
                return Err(match old_spine.first() {
                    Some(old) => TreeError::NotFound { identity: old.identity() },
                    None => TreeError::NotAParent { identity: self.identity() },
                })
            }
        };
        let children = match (old_spine.first(), new_spine.first()) {
            (Some(old), Some(new)) => list.replace(old.identity(), new.clone()),
            (Some(old), None) => list.remove(old.identity()),
            (None, Some(new)) => Some(list.insert(new.clone())),
            (None, None) => return Ok(self.clone()),
        };
        let children = children.ok_or_else(|| TreeError::NotFound {
            identity: old_spine.first().map_or(self.identity(), GreenNode::identity),
        })?;

        let (mut table, mut load) = lookup::initialize(&children, None);
        if table.is_deferred() {
            if let Some(old_table) = self.data.lookup.materialized() {
                let fixed = old_table.fixup(self.identity(), new_spine, old_spine);
                table = TableState::Deferred(OnceCell::with_value(fixed));
                load = 1;
            }
        }
        Ok(GreenNode::from_raw_parts(
            self.identity(),
            self.payload().clone(),
            Some(children),
            table,
            load,
        ))
    }

    /// A new version of this tree with the descendant sharing `updated`'s
    /// identity replaced by `updated`.
    pub fn replace_descendant(&self, updated: &GreenNode<F>) -> Result<GreenNode<F>> {
        let spine = self.spine(updated.identity());
        match spine.last() {
            None => return Err(TreeError::NotFound { identity: updated.identity() }),
            Some(old) if GreenNode::ptr_eq(old, updated) => return Ok(self.clone()),
            Some(_) => (),
        }
        let new_spine = replace_descendant_spine(&spine, vec![updated.clone()], false)?;
        Ok(spine_head(new_spine))
    }

    /// A new version of this tree with `value` added to the children of the
    /// node with identity `parent`.
    pub fn add_descendant(&self, value: GreenNode<F>, parent: Identity) -> Result<GreenNode<F>> {
        let spine = self.spine(parent);
        let old_parent = spine.last().ok_or(TreeError::NotFound { identity: parent })?;
        let new_parent = old_parent.replace_child(&[], slice::from_ref(&value))?;
        let new_spine = replace_descendant_spine(&spine, vec![new_parent, value], false)?;
        Ok(spine_head(new_spine))
    }

    /// A new version of this tree without the descendant with the given
    /// identity and its subtree.
    pub fn remove_descendant(&self, identity: Identity) -> Result<GreenNode<F>> {
        let spine = self.spine(identity);
        let (doomed, ancestors) = match spine.split_last() {
            None => return Err(TreeError::NotFound { identity }),
            Some((_, [])) => return Err(TreeError::CannotRemoveRoot { identity }),
            Some(it) => it,
        };
        let old_parent = ancestors.last().ok_or(TreeError::CannotRemoveRoot { identity })?;
        let new_parent = old_parent.replace_child(slice::from_ref(doomed), &[])?;
        let new_spine = replace_descendant_spine(&spine, vec![new_parent], true)?;
        Ok(spine_head(new_spine))
    }
}

/// Rebuilds every node of `spine` above its rewritten bottom, returning the
/// new spine root first.
///
/// `tip` holds the new bottom of the spine. It replaces the last node of
/// `spine`, or the second to last when `spine_includes_deleted_element` is
/// set, in which case the last node of `spine` is the one that was deleted.
/// A `tip` longer than the part it replaces describes an addition. An
/// empty `tip` is rejected with [`TreeError::EmptyReplacement`].
pub fn replace_descendant_spine<F: Family>(
    spine: &[GreenNode<F>],
    tip: Vec<GreenNode<F>>,
    spine_includes_deleted_element: bool,
) -> Result<Vec<GreenNode<F>>> {
    if tip.is_empty() {
        return Err(TreeError::EmptyReplacement);
    }
    let replaced = if spine_includes_deleted_element { 2 } else { 1 };
    let new_spine = unwind(spine, VecDeque::from(tip), replaced)?;
    Ok(new_spine.into())
}

fn unwind<F: Family>(
    spine: &[GreenNode<F>],
    tip: VecDeque<GreenNode<F>>,
    replaced: usize,
) -> Result<VecDeque<GreenNode<F>>> {
    let (head, rest) = match spine.split_first() {
        Some(it) if spine.len() > replaced => it,
        _ => return Ok(tip),
    };
    let mut new_rest = unwind(rest, tip, replaced)?;
    let new_head = head.replace_child(rest, new_rest.make_contiguous())?;
    new_rest.push_front(new_head);
    Ok(new_rest)
}

fn spine_head<F: Family>(spine: Vec<GreenNode<F>>) -> GreenNode<F> {
    match spine.into_iter().next() {
        Some(it) => it,
        None => unreachable!("rewritten spine is never empty"),
    }
}
