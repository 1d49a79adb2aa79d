//! Identity index over the descendants of a parent node.
//!
//! Searching a plain tree for an identity is linear in the size of the
//! subtree. Past a size threshold a parent keeps a persistent map from
//! every descendant's identity to that descendant and its parent's
//! identity, which makes `find`, `spine` and parent lookups cost
//! proportional to depth instead.
//!
//! The map is built lazily: a freshly constructed parent only records
//! that it *wants* one (the deferred state), and the first lookup
//! materializes it. When a parent with a materialized table is rewritten
//! along a spine, [`LookupTable::fixup`] derives the new table from the old
//! one by touching only the spine and the subtree that was added or
//! removed.

use std::{fmt, hash::BuildHasherDefault};

use once_cell::sync::OnceCell;
use rustc_hash::{FxHashSet, FxHasher};
use tracing::{debug, trace};

use crate::{ChildList, Family, GreenNode, Identity, Result, TreeError};

type Entries<F> = im::HashMap<Identity, LookupEntry<F>, BuildHasherDefault<FxHasher>>;

/// A descendant and the identity of its immediate parent.
pub struct LookupEntry<F: Family> {
    pub node: GreenNode<F>,
    pub parent: Identity,
}

impl<F: Family> Clone for LookupEntry<F> {
    fn clone(&self) -> Self {
        LookupEntry { node: self.node.clone(), parent: self.parent }
    }
}

impl<F: Family> PartialEq for LookupEntry<F> {
    fn eq(&self, other: &LookupEntry<F>) -> bool {
        self.parent == other.parent && self.node == other.node
    }
}

impl<F: Family> fmt::Debug for LookupEntry<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LookupEntry")
            .field("node", &self.node.identity())
            .field("parent", &self.parent)
            .finish()
    }
}

/// Persistent map from the identity of every descendant of one node to
/// that descendant and its parent's identity.
pub struct LookupTable<F: Family> {
    entries: Entries<F>,
}

impl<F: Family> Clone for LookupTable<F> {
    fn clone(&self) -> Self {
        LookupTable { entries: self.entries.clone() }
    }
}

impl<F: Family> PartialEq for LookupTable<F> {
    fn eq(&self, other: &LookupTable<F>) -> bool {
        self.len() == other.len()
            && self.entries.iter().all(|(identity, entry)| other.get(*identity) == Some(entry))
    }
}

impl<F: Family> fmt::Debug for LookupTable<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.entries.iter()).finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ChangeKind {
    Added,
    Replaced,
    Removed,
}

impl<F: Family> LookupTable<F> {
    /// Builds the table of `owner` from scratch.
    pub fn create(owner: &GreenNode<F>) -> LookupTable<F> {
        let mut entries = Entries::default();
        contribute_descendants(&mut entries, owner);
        trace!(owner = %owner.identity(), entries = entries.len(), "materialized lookup table");
        LookupTable { entries }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[inline]
    pub fn get(&self, identity: Identity) -> Option<&LookupEntry<F>> {
        self.entries.get(&identity)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Identity, &LookupEntry<F>)> + '_ {
        self.entries.iter().map(|(identity, entry)| (*identity, entry))
    }

    /// Derives the table of a rewritten owner from this one, the table of
    /// the owner before the rewrite.
    ///
    /// `new_spine` and `old_spine` run from the owner's child down to the
    /// node that was edited (excluding the owner itself, whose identity is
    /// `owner` in both versions). A longer new spine means the tail was
    /// added, a shorter one means the old tail was removed, and equal
    /// lengths mean the tail was replaced. Either spine may be empty when
    /// the edit adds or removes a direct child of the owner.
    pub fn fixup(
        &self,
        owner: Identity,
        new_spine: &[GreenNode<F>],
        old_spine: &[GreenNode<F>],
    ) -> LookupTable<F> {
        let change = match new_spine.len().cmp(&old_spine.len()) {
            std::cmp::Ordering::Greater => ChangeKind::Added,
            std::cmp::Ordering::Less => ChangeKind::Removed,
            std::cmp::Ordering::Equal => ChangeKind::Replaced,
        };
        let children_changed = match (change, new_spine.last(), old_spine.last()) {
            (ChangeKind::Replaced, None, _) => return self.clone(),
            (ChangeKind::Replaced, Some(new_tail), Some(old_tail)) => {
                if GreenNode::ptr_eq(new_tail, old_tail) {
                    return self.clone();
                }
                match (old_tail.child_list(), new_tail.child_list()) {
                    (None, None) => false,
                    (Some(old), Some(new)) => !ChildList::ptr_eq(old, new),
                    _ => true,
                }
            }
            _ => false,
        };
        debug!(
            owner = %owner,
            ?change,
            children_changed,
            new_spine = new_spine.len(),
            old_spine = old_spine.len(),
            "fixing up lookup table"
        );

        let mut entries = self.entries.clone();
        match (old_spine.last(), new_spine.last()) {
            (Some(old_tail), _) if children_changed || change == ChangeKind::Removed => {
                for it in old_tail.self_and_descendants() {
                    entries.remove(&it.node.identity());
                }
            }
            (Some(old_tail), Some(new_tail))
                if change == ChangeKind::Replaced && old_tail.identity() != new_tail.identity() =>
            {
                entries.remove(&old_tail.identity());
                for child in new_tail.children().into_iter().flatten() {
                    let entry = LookupEntry { node: child.clone(), parent: new_tail.identity() };
                    entries.insert(child.identity(), entry);
                }
            }
            _ => (),
        }

        let mut parent = owner;
        for node in new_spine {
            entries.insert(node.identity(), LookupEntry { node: node.clone(), parent });
            parent = node.identity();
        }

        if let Some(new_tail) = new_spine.last() {
            if children_changed || change == ChangeKind::Added {
                contribute_descendants(&mut entries, new_tail);
            }
        }
        LookupTable { entries }
    }
}

fn contribute_descendants<F: Family>(entries: &mut Entries<F>, parent: &GreenNode<F>) {
    let mut stack = vec![parent.clone()];
    while let Some(parent) = stack.pop() {
        for child in parent.children().into_iter().flatten() {
            let entry = LookupEntry { node: child.clone(), parent: parent.identity() };
            entries.insert(child.identity(), entry);
            if child.is_parent() {
                stack.push(child.clone());
            }
        }
    }
}

/// Lookup table slot of a parent node.
///
/// `Deferred` with an empty cell is the lazy sentinel: the owner has decided
/// a table pays off but has not built it yet. The first lookup from any
/// thread fills the cell; building is deterministic, so which thread does
/// it does not matter.
pub(crate) enum TableState<F: Family> {
    Absent,
    Deferred(OnceCell<LookupTable<F>>),
}

impl<F: Family> TableState<F> {
    #[inline]
    pub(crate) fn is_deferred(&self) -> bool {
        matches!(self, TableState::Deferred(_))
    }

    /// The table, if it has been built.
    #[inline]
    pub(crate) fn materialized(&self) -> Option<&LookupTable<F>> {
        match self {
            TableState::Absent => None,
            TableState::Deferred(cell) => cell.get(),
        }
    }
}

/// Decides the table slot and inefficiency load of a parent about to be
/// constructed over `children`.
///
/// The load estimates how many nodes a search below the parent touches.
/// Children with a table of their own count as one, and the sum stops as
/// soon as it passes the threshold so the estimate stays cheap. A parent
/// past the threshold defers a table and reports a load of one.
pub(crate) fn initialize<F: Family>(
    children: &ChildList<F>,
    prior: Option<LookupTable<F>>,
) -> (TableState<F>, u32) {
    if let Some(table) = prior {
        return (TableState::Deferred(OnceCell::with_value(table)), 1);
    }

    let mut load = 1u32;
    for child in children {
        load = load.saturating_add(child.inefficiency_load());
        if load > F::LOOKUP_TABLE_THRESHOLD {
            break;
        }
    }

    if load > F::LOOKUP_TABLE_THRESHOLD {
        (TableState::Deferred(OnceCell::new()), 1)
    } else {
        (TableState::Absent, load)
    }
}

impl<F: Family> GreenNode<F> {
    /// The lookup table of this node, building it on first use. `None` when
    /// the node is small enough to be searched directly.
    pub fn lookup_table(&self) -> Option<&LookupTable<F>> {
        match &self.data.lookup {
            TableState::Absent => None,
            TableState::Deferred(cell) => Some(cell.get_or_init(|| LookupTable::create(self))),
        }
    }

    /// Whether this node keeps a lookup table, built or not.
    #[inline]
    pub fn has_lookup_table(&self) -> bool {
        self.data.lookup.is_deferred()
    }

    /// Whether the lookup table of this node has been built.
    #[inline]
    pub fn is_lookup_table_materialized(&self) -> bool {
        self.data.lookup.materialized().is_some()
    }

    /// Looks `identity` up in this node's table.
    ///
    /// The outer `Option` says whether there is a table at all; the inner
    /// one whether it has an entry for `identity`.
    pub fn try_lookup(&self, identity: Identity) -> Option<Option<&LookupEntry<F>>> {
        self.lookup_table().map(|table| table.get(identity))
    }

    /// Checks the structural invariants of the subtree under this node:
    /// identities are unique, and every materialized lookup table has
    /// exactly one entry per descendant, pointing at the very node in the
    /// tree and its actual parent.
    ///
    /// Walks the whole subtree; meant for tests and assertions.
    pub fn validate_internal_integrity(&self) -> Result<()> {
        let mut seen = FxHashSet::default();
        for it in self.self_and_descendants() {
            let node = &it.node;
            if !seen.insert(node.identity()) {
                return Err(TreeError::RecursiveChildNotUnique { identity: node.identity() });
            }

            let table = match node.data.lookup.materialized() {
                Some(table) => table,
                None => continue,
            };
            let mut expected = 0;
            for descendant in node.descendants() {
                expected += 1;
                let parent = descendant.parent.as_ref().map(GreenNode::identity);
                let consistent = table.get(descendant.node.identity()).map_or(false, |entry| {
                    GreenNode::ptr_eq(&entry.node, &descendant.node) && Some(entry.parent) == parent
                });
                if !consistent {
                    return Err(TreeError::StaleLookupEntry {
                        owner: node.identity(),
                        identity: descendant.node.identity(),
                    });
                }
            }
            if table.len() != expected {
                return Err(TreeError::LookupTableMismatch {
                    owner: node.identity(),
                    expected,
                    actual: table.len(),
                });
            }
        }
        Ok(())
    }

    /// [`GreenNode::validate_internal_integrity`] in debug builds, panicking
    /// on failure. Compiles to nothing in release builds.
    #[inline]
    pub fn debug_validate_internal_integrity(&self) {
        #[cfg(debug_assertions)]
        if let Err(err) = self.validate_internal_integrity() {
            panic!("tree integrity violated: {}", err);
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        fixture::{heading, section, IndexedOutline, Item, Outline},
        GreenNode, Identity, LookupTable,
    };

    #[test]
    fn small_parents_have_no_table() {
        let root = section::<Outline>("root", (0..3).map(|i| heading(&format!("h{}", i))));
        assert!(!root.has_lookup_table());
        assert!(root.lookup_table().is_none());
        assert!(root.try_lookup(root.identity()).is_none());
        assert_eq!(root.inefficiency_load(), 4);
    }

    #[test]
    fn table_is_deferred_until_first_lookup() {
        let root = section::<Outline>("root", (0..20).map(|i| heading(&format!("h{}", i))));
        assert!(root.has_lookup_table());
        assert!(!root.is_lookup_table_materialized());
        assert_eq!(root.inefficiency_load(), 1);

        let table = root.lookup_table().unwrap();
        assert!(root.is_lookup_table_materialized());
        assert_eq!(table.len(), 20);
        root.validate_internal_integrity().unwrap();
    }

    #[test]
    fn load_accumulates_through_nested_parents() {
        let inner = section::<Outline>("inner", (0..10).map(|i| heading(&format!("h{}", i))));
        assert!(!inner.has_lookup_table());
        assert_eq!(inner.inefficiency_load(), 11);

        let mut children = vec![inner];
        children.extend(["a", "b", "c", "d", "e", "f"].iter().map(|it| heading(it)));
        let outer = section("outer", children);
        assert!(outer.has_lookup_table());
    }

    #[test]
    fn table_maps_descendants_to_parents() {
        let leaf = heading::<IndexedOutline>("leaf");
        let middle = section("middle", vec![leaf.clone()]);
        let root = section("root", vec![middle.clone()]);

        let table = root.lookup_table().unwrap();
        assert_eq!(table.len(), 2);
        let entry = table.get(leaf.identity()).unwrap();
        assert!(GreenNode::ptr_eq(&entry.node, &leaf));
        assert_eq!(entry.parent, middle.identity());
        assert_eq!(table.get(middle.identity()).unwrap().parent, root.identity());
        assert!(table.get(root.identity()).is_none());
    }

    #[test]
    fn with_payload_reuses_a_built_table() {
        let root = section::<Outline>("root", (0..20).map(|i| heading(&format!("h{}", i))));
        root.lookup_table().unwrap();
        let renamed = root.with_payload(Item::section("renamed"));
        assert!(renamed.is_lookup_table_materialized());
        assert_eq!(renamed.lookup_table(), root.lookup_table());
        renamed.validate_internal_integrity().unwrap();
    }

    #[test]
    fn fixup_matches_fresh_table_after_replacing_a_leaf() {
        let leaf = heading::<IndexedOutline>("leaf");
        let middle = section("middle", vec![leaf.clone(), heading("other")]);
        let root = section("root", vec![middle.clone(), heading("sibling")]);
        let old_table = LookupTable::create(&root);

        let new_leaf = leaf.with_payload(Item::heading("renamed"));
        let new_root = root.replace_descendant(&new_leaf).unwrap();
        let new_middle = new_root.find(middle.identity()).unwrap();

        let fixed = old_table.fixup(
            root.identity(),
            &[new_middle, new_leaf],
            &[middle, leaf],
        );
        assert_eq!(fixed, LookupTable::create(&new_root));
    }

    #[test]
    fn fixup_drops_removed_subtrees() {
        let doomed = section::<IndexedOutline>("doomed", vec![heading("a"), heading("b")]);
        let middle = section("middle", vec![doomed.clone(), heading("kept")]);
        let root = section("root", vec![middle.clone()]);
        let old_table = LookupTable::create(&root);

        let new_root = root.remove_descendant(doomed.identity()).unwrap();
        let new_middle = new_root.find(middle.identity()).unwrap();
        let fixed = old_table.fixup(root.identity(), &[new_middle], &[middle, doomed]);

        assert_eq!(fixed.len(), 2);
        assert_eq!(fixed, LookupTable::create(&new_root));
    }

    #[test]
    fn fixup_rewrites_parents_when_tail_identity_changes() {
        let old = section::<IndexedOutline>("old", vec![heading("a"), heading("b")]);
        let root = section("root", vec![old.clone()]);
        let old_table = LookupTable::create(&root);

        let new = GreenNode::from_parts(
            Identity::new(),
            Item::section("new"),
            old.child_list().cloned(),
            None,
        );
        let new_root = root.with_children(vec![new.clone()]);

        let fixed = old_table.fixup(root.identity(), &[new.clone()], &[old.clone()]);
        assert_eq!(fixed, LookupTable::create(&new_root));
        assert!(fixed.get(old.identity()).is_none());
    }

    #[test]
    fn racing_lookups_build_one_consistent_table() {
        let leaves: Vec<GreenNode<Outline>> =
            (0..64).map(|i| heading(&format!("h{}", i))).collect();
        let root = section("root", leaves.iter().cloned());
        assert!(root.has_lookup_table());
        assert!(!root.is_lookup_table_materialized());

        std::thread::scope(|s| {
            for leaf in &leaves {
                let root = &root;
                s.spawn(move || {
                    let found = root.try_find(leaf.identity()).unwrap();
                    assert!(GreenNode::ptr_eq(&found, leaf));
                });
            }
        });

        assert!(root.is_lookup_table_materialized());
        assert_eq!(root.lookup_table().unwrap().len(), leaves.len());
        root.validate_internal_integrity().unwrap();
    }

    #[test]
    fn deep_chains_build_and_drop_without_recursion() {
        let leaf = heading::<IndexedOutline>("leaf");
        let mut root = leaf.clone();
        for i in 0..50_000 {
            root = section(&format!("s{}", i), vec![root]);
        }

        assert!(GreenNode::ptr_eq(&root.find(leaf.identity()).unwrap(), &leaf));
        assert_eq!(root.lookup_table().unwrap().len(), 50_000);
        assert_eq!(root.spine(leaf.identity()).len(), 50_001);
        drop(root);
    }

    #[test]
    fn integrity_detects_duplicate_identities() {
        let twin = heading::<Outline>("twin");
        let root = section("root", vec![twin.clone(), section("inner", vec![twin.clone()])]);
        assert_eq!(
            root.validate_internal_integrity(),
            Err(crate::TreeError::RecursiveChildNotUnique { identity: twin.identity() })
        );
    }
}
