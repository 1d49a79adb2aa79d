//! A small outline family shared by the unit tests.

use std::cmp::Ordering;

use crate::{ChildOrder, Family, GreenNode, PropertySet};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum ItemKind {
    Heading,
    Section,
    // A section whose children are kept sorted by title.
    Glossary,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Item {
    pub(crate) kind: ItemKind,
    pub(crate) title: String,
    pub(crate) done: bool,
}

impl Item {
    pub(crate) fn heading(title: &str) -> Item {
        Item { kind: ItemKind::Heading, title: title.to_string(), done: false }
    }

    pub(crate) fn section(title: &str) -> Item {
        Item { kind: ItemKind::Section, title: title.to_string(), done: false }
    }

    pub(crate) fn glossary(title: &str) -> Item {
        Item { kind: ItemKind::Glossary, title: title.to_string(), done: false }
    }
}

bitflags::bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub(crate) struct OutlineProps: u8 {
        const TYPE = 1 << 0;
        const PARENT = 1 << 1;
        const POSITION_UNDER_PARENT = 1 << 2;
        const TITLE = 1 << 3;
        const DONE = 1 << 4;
    }
}

impl PropertySet for OutlineProps {
    const TYPE: Self = OutlineProps::TYPE;
    const PARENT: Self = OutlineProps::PARENT;
    const POSITION_UNDER_PARENT: Self = OutlineProps::POSITION_UNDER_PARENT;
}

/// Outline family with a configurable lookup table threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct OutlineFamily<const THRESHOLD: u32>;

/// Builds tables only for large subtrees.
pub(crate) type Outline = OutlineFamily<16>;
/// Gives every parent a lookup table.
pub(crate) type IndexedOutline = OutlineFamily<0>;

impl<const THRESHOLD: u32> Family for OutlineFamily<THRESHOLD> {
    type Kind = ItemKind;
    type Payload = Item;
    type Properties = OutlineProps;

    const LOOKUP_TABLE_THRESHOLD: u32 = THRESHOLD;

    fn kind(payload: &Item) -> ItemKind {
        payload.kind
    }

    fn child_order(kind: ItemKind) -> ChildOrder {
        match kind {
            ItemKind::Glossary => ChildOrder::Sorted,
            ItemKind::Heading | ItemKind::Section => ChildOrder::Ordered,
        }
    }

    fn compare(a: &Item, b: &Item) -> Ordering {
        a.title.cmp(&b.title)
    }

    fn diff_properties(before: &Item, after: &Item) -> OutlineProps {
        let mut changes = OutlineProps::empty();
        changes.set(OutlineProps::TYPE, before.kind != after.kind);
        changes.set(OutlineProps::TITLE, before.title != after.title);
        changes.set(OutlineProps::DONE, before.done != after.done);
        changes
    }
}

pub(crate) fn heading<F: Family<Payload = Item>>(title: &str) -> GreenNode<F> {
    GreenNode::leaf(Item::heading(title))
}

pub(crate) fn section<F: Family<Payload = Item>>(
    title: &str,
    children: impl IntoIterator<Item = GreenNode<F>>,
) -> GreenNode<F> {
    GreenNode::parent(Item::section(title), children)
}

pub(crate) fn glossary<F: Family<Payload = Item>>(
    title: &str,
    children: impl IntoIterator<Item = GreenNode<F>>,
) -> GreenNode<F> {
    GreenNode::parent(Item::glossary(title), children)
}
