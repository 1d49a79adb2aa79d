use thiserror::Error;

use crate::Identity;

/// Errors raised by tree navigation, mutation, diffing and validation.
///
/// Every operation in this crate is a pure function over immutable input,
/// so none of these are transient: the only recovery is to call again with
/// corrected arguments.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TreeError {
    /// A member other than `is_default` was used on a default `Rooted`.
    #[error("invalid use of default value")]
    DefaultValue,

    /// The identity does not name the node or any of its descendants.
    #[error("node {identity} was not found")]
    NotFound { identity: Identity },

    /// The node is not reachable from the root it was paired with.
    #[error("node {identity} is not part of the same tree")]
    NotInSameTree { identity: Identity },

    /// `changes_since` was given a version of a different logical node.
    #[error("node {prior} is not another version of node {current}")]
    VersionMismatch { current: Identity, prior: Identity },

    /// A child was to be added under a node that carries no children.
    #[error("node {identity} cannot have children")]
    NotAParent { identity: Identity },

    /// A spine rewrite was given nothing to put at its bottom.
    #[error("replacement spine is empty")]
    EmptyReplacement,

    /// The root has no parent to be removed from.
    #[error("node {identity} is the root and cannot be removed")]
    CannotRemoveRoot { identity: Identity },

    /// Two nodes in one tree share an identity.
    #[error("identity {identity} appears more than once in the tree")]
    RecursiveChildNotUnique { identity: Identity },

    /// A materialized lookup table does not cover exactly the descendants of its owner.
    #[error("lookup table of {owner} has {actual} entries but the node has {expected} descendants")]
    LookupTableMismatch { owner: Identity, expected: usize, actual: usize },

    /// A lookup table entry points to the wrong node or the wrong parent.
    #[error("lookup table of {owner} holds a stale entry for {identity}")]
    StaleLookupEntry { owner: Identity, identity: Identity },
}

pub type Result<T, E = TreeError> = std::result::Result<T, E>;
