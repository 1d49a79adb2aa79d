//! Parent-aware views of green nodes.
//!
//! A [`GreenNode`] has no idea where it sits, so a node that is shared by two
//! trees cannot answer "who is my parent". [`Rooted`] pairs a node with the
//! root of the tree it is being viewed in. Parent and ancestor queries go
//! through the root's lookup table (or a search, for small trees), and edits
//! rebuild the spine from the node up to a new root.
//!
//! Rooted nodes are cheap to create and are never modified: every edit
//! returns a new rooted node whose root is the new version of the tree.

use std::{fmt, slice};

use crate::{
    replace_descendant_spine, DiffGram, Family, GreenNode, Identity, Result, TreeError, TypedNode,
};

struct RootedData<F: Family> {
    green: GreenNode<F>,
    root: GreenNode<F>,
}

/// A green node viewed within the tree under `root`.
///
/// The default value stands for "no node"; every accessor on it other than
/// [`Rooted::is_default`] fails with [`TreeError::DefaultValue`].
pub struct Rooted<F: Family> {
    inner: Option<RootedData<F>>,
}

impl<F: Family> Default for Rooted<F> {
    fn default() -> Self {
        Rooted { inner: None }
    }
}

impl<F: Family> Clone for Rooted<F> {
    fn clone(&self) -> Self {
        let inner = self
            .inner
            .as_ref()
            .map(|it| RootedData { green: it.green.clone(), root: it.root.clone() });
        Rooted { inner }
    }
}

/// Equal when both the node and the root are equal, so one logical node
/// seen in two versions of a tree gives two different rooted nodes.
impl<F: Family> PartialEq for Rooted<F> {
    fn eq(&self, other: &Rooted<F>) -> bool {
        match (&self.inner, &other.inner) {
            (None, None) => true,
            (Some(this), Some(other)) => this.green == other.green && this.root == other.root,
            _ => false,
        }
    }
}

impl<F: Family> fmt::Debug for Rooted<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.inner {
            None => f.write_str("Rooted(default)"),
            Some(it) => f
                .debug_struct("Rooted")
                .field("identity", &it.green.identity())
                .field("payload", it.green.payload())
                .field("root", &it.root.identity())
                .finish(),
        }
    }
}

impl<F: Family> GreenNode<F> {
    /// Views this node as the root of its own tree.
    pub fn as_root(&self) -> Rooted<F> {
        Rooted::new(self.clone(), self.clone())
    }

    /// Views this node within the tree under `root`.
    pub fn with_root(&self, root: &GreenNode<F>) -> Result<Rooted<F>> {
        if root.spine_to(self).is_empty() {
            return Err(TreeError::NotInSameTree { identity: self.identity() });
        }
        Ok(Rooted::new(self.clone(), root.clone()))
    }
}

impl<F: Family> Rooted<F> {
    fn new(green: GreenNode<F>, root: GreenNode<F>) -> Rooted<F> {
        Rooted { inner: Some(RootedData { green, root }) }
    }

    fn data(&self) -> Result<&RootedData<F>> {
        self.inner.as_ref().ok_or(TreeError::DefaultValue)
    }

    fn sibling(&self, green: GreenNode<F>) -> Result<Rooted<F>> {
        Ok(Rooted::new(green, self.data()?.root.clone()))
    }

    #[inline]
    pub fn is_default(&self) -> bool {
        self.inner.is_none()
    }

    /// The wrapped green node.
    pub fn green(&self) -> Result<&GreenNode<F>> {
        Ok(&self.data()?.green)
    }

    pub fn into_green(self) -> Result<GreenNode<F>> {
        self.inner.map(|it| it.green).ok_or(TreeError::DefaultValue)
    }

    /// The green root of the tree this node is viewed in.
    pub fn root_green(&self) -> Result<&GreenNode<F>> {
        Ok(&self.data()?.root)
    }

    pub fn root(&self) -> Result<Rooted<F>> {
        Ok(self.data()?.root.as_root())
    }

    pub fn is_root(&self) -> Result<bool> {
        let data = self.data()?;
        Ok(GreenNode::ptr_eq(&data.green, &data.root))
    }

    pub fn identity(&self) -> Result<Identity> {
        Ok(self.data()?.green.identity())
    }

    pub fn payload(&self) -> Result<&F::Payload> {
        Ok(self.data()?.green.payload())
    }

    pub fn kind(&self) -> Result<F::Kind> {
        Ok(self.data()?.green.kind())
    }

    /// The parent of this node, or a default value for the root.
    pub fn parent(&self) -> Result<Rooted<F>> {
        let data = self.data()?;
        let identity = data.green.identity();
        if identity == data.root.identity() {
            return Ok(Rooted::default());
        }
        match data.root.parent_of(identity) {
            Some(parent) => self.sibling(parent),
            None => Err(TreeError::NotInSameTree { identity }),
        }
    }

    /// Parent, grandparent and so on up to the root, nearest first.
    pub fn ancestors(&self) -> Result<impl Iterator<Item = Rooted<F>>> {
        let data = self.data()?;
        let mut spine = data.root.spine(data.green.identity());
        if spine.pop().is_none() {
            return Err(TreeError::NotInSameTree { identity: data.green.identity() });
        }
        let root = data.root.clone();
        Ok(spine.into_iter().rev().map(move |it| Rooted::new(it, root.clone())))
    }

    /// The children of this node; empty for leaves.
    pub fn children(&self) -> Result<impl Iterator<Item = Rooted<F>> + '_> {
        let data = self.data()?;
        Ok(data
            .green
            .children()
            .into_iter()
            .flatten()
            .map(move |it| Rooted::new(it.clone(), data.root.clone())))
    }

    /// Finds this node or one of its descendants, viewed in the same tree.
    pub fn find(&self, identity: Identity) -> Result<Rooted<F>> {
        let found = self.data()?.green.find(identity)?;
        self.sibling(found)
    }

    pub fn try_find(&self, identity: Identity) -> Result<Option<Rooted<F>>> {
        match self.data()?.green.try_find(identity) {
            Some(found) => self.sibling(found).map(Some),
            None => Ok(None),
        }
    }

    /// This node with a new payload, in a new version of the tree.
    pub fn with_payload(&self, payload: F::Payload) -> Result<Rooted<F>> {
        let updated = self.data()?.green.with_payload(payload);
        self.replace_with(updated)
    }

    pub fn update(&self, f: impl FnOnce(&F::Payload) -> F::Payload) -> Result<Rooted<F>> {
        let payload = f(self.payload()?);
        self.with_payload(payload)
    }

    /// Puts `replacement` where this node is, in a new version of the tree.
    pub fn replace_with(&self, replacement: GreenNode<F>) -> Result<Rooted<F>> {
        let data = self.data()?;
        if GreenNode::ptr_eq(&data.green, &replacement) {
            return Ok(self.clone());
        }
        let spine = self.spine()?;
        let new_spine = replace_descendant_spine(&spine, vec![replacement], false)?;
        Ok(rooted_tail(new_spine, 0))
    }

    /// Adds `child` to this node; returns the new version of this node.
    pub fn add_child(&self, child: GreenNode<F>) -> Result<Rooted<F>> {
        let data = self.data()?;
        let new_self = data.green.replace_child(&[], slice::from_ref(&child))?;
        let spine = self.spine()?;
        let new_spine = replace_descendant_spine(&spine, vec![new_self, child], false)?;
        Ok(rooted_tail(new_spine, 1))
    }

    /// Removes the child with the given identity; returns the new version of
    /// this node.
    pub fn remove_child(&self, identity: Identity) -> Result<Rooted<F>> {
        let data = self.data()?;
        let child = data
            .green
            .children()
            .and_then(|mut it| it.find(|child| child.identity() == identity))
            .cloned()
            .ok_or(TreeError::NotFound { identity })?;
        let new_self = data.green.replace_child(slice::from_ref(&child), &[])?;
        let mut spine = self.spine()?;
        spine.push(child);
        let new_spine = replace_descendant_spine(&spine, vec![new_self], true)?;
        Ok(rooted_tail(new_spine, 0))
    }

    /// This node if its kind satisfies `test`, a default value otherwise.
    pub fn as_kind(&self, test: impl FnOnce(F::Kind) -> bool) -> Rooted<F> {
        match &self.inner {
            Some(data) if test(data.green.kind()) => self.clone(),
            _ => Rooted::default(),
        }
    }

    pub fn cast<N: TypedNode<Family = F>>(self) -> Option<N> {
        N::cast(self)
    }

    /// Changes from `prior` to this version of the same logical node.
    pub fn changes_since(&self, prior: &Rooted<F>) -> Result<Vec<DiffGram<F>>> {
        self.green()?.changes_since(prior.green()?)
    }

    fn spine(&self) -> Result<Vec<GreenNode<F>>> {
        let data = self.data()?;
        let spine = data.root.spine(data.green.identity());
        if spine.is_empty() {
            return Err(TreeError::NotInSameTree { identity: data.green.identity() });
        }
        Ok(spine)
    }
}

// Wraps the node `from_end` places before the end of a rewritten spine,
// rooted at the spine's new head.
fn rooted_tail<F: Family>(new_spine: Vec<GreenNode<F>>, from_end: usize) -> Rooted<F> {
    let green = new_spine[new_spine.len() - 1 - from_end].clone();
    let root = new_spine[0].clone();
    root.debug_validate_internal_integrity();
    Rooted::new(green, root)
}
