//! Persistent, identity-addressed immutable trees.
//!
//! Trees are built from [`GreenNode`]s: immutable, shareable nodes that know
//! their children but not their parent. Every node carries an [`Identity`]
//! that survives edits, so two versions of a tree can be compared node by
//! node with [`GreenNode::changes_since`]. Large subtrees index their
//! descendants by identity in a lazily built [`LookupTable`], which is
//! patched rather than rebuilt when a node deep in the tree is edited.
//!
//! [`Rooted`] pairs a node with the root of the tree it is viewed in and adds
//! parent navigation and edits that produce a new root.
#![forbid(
    // missing_debug_implementations,
    unconditional_recursion,
    future_incompatible,
    // missing_docs,
)]
#![deny(unsafe_code)]

mod identity;
mod error;
mod family;
mod green;
mod lookup;
mod walk;
mod search;
mod spine;
mod rooted;
mod typed;
mod diff;
#[cfg(feature = "serde1")]
mod serde_impls;
#[cfg(test)]
mod fixture;

pub use crate::{
    diff::{DiffGram, DiffKind},
    error::{Result, TreeError},
    family::{ChildOrder, Family, PropertySet},
    green::{Checkpoint, ChildList, Children, GreenNode, GreenNodeBuilder},
    identity::Identity,
    lookup::{LookupEntry, LookupTable},
    rooted::Rooted,
    spine::replace_descendant_spine,
    typed::TypedNode,
    walk::{BreadthFirst, ParentedNode, Preorder, WalkEvent},
};
