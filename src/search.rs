use crate::{Family, GreenNode, Identity, ParentedNode, Result, TreeError};

impl<F: Family> GreenNode<F> {
    /// Finds this node or the descendant with the given identity.
    pub fn try_find(&self, identity: Identity) -> Option<GreenNode<F>> {
        if self.identity() == identity {
            return Some(self.clone());
        }
        if let Some(found) = self.try_lookup(identity) {
            return found.map(|entry| entry.node.clone());
        }
        self.children()?.find_map(|child| child.try_find(identity))
    }

    /// Like [`GreenNode::try_find`], but a missing identity is an error.
    pub fn find(&self, identity: Identity) -> Result<GreenNode<F>> {
        self.try_find(identity).ok_or(TreeError::NotFound { identity })
    }

    /// Finds the node with the given identity together with its parent.
    /// The parent of `self` is unknown here and reported as `None`.
    pub fn parented_node(&self, identity: Identity) -> Option<ParentedNode<F>> {
        if self.identity() == identity {
            return Some(ParentedNode { node: self.clone(), parent: None });
        }
        self.find_parented(identity)
    }

    fn find_parented(&self, identity: Identity) -> Option<ParentedNode<F>> {
        if let Some(table) = self.lookup_table() {
            let entry = table.get(identity)?;
            let parent = if entry.parent == self.identity() {
                self.clone()
            } else {
                table.get(entry.parent)?.node.clone()
            };
            return Some(ParentedNode { node: entry.node.clone(), parent: Some(parent) });
        }
        for child in self.children()? {
            if child.identity() == identity {
                return Some(ParentedNode { node: child.clone(), parent: Some(self.clone()) });
            }
            if let Some(found) = child.find_parented(identity) {
                return Some(found);
            }
        }
        None
    }

    /// The parent of the descendant with the given identity.
    pub fn parent_of(&self, identity: Identity) -> Option<GreenNode<F>> {
        self.parented_node(identity)?.parent
    }

    /// Whether a strict descendant of this node has the given identity.
    pub fn has_descendant(&self, identity: Identity) -> bool {
        self.identity() != identity && self.try_find(identity).is_some()
    }
}
