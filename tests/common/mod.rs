#![allow(dead_code)]

use std::cmp::Ordering;

use thicket::{ChildOrder, Family, GreenNode, PropertySet};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FsKind {
    File,
    Directory,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FsItem {
    pub kind: FsKind,
    pub path_segment: String,
    pub read_only: bool,
}

impl FsItem {
    pub fn file(path_segment: &str) -> FsItem {
        FsItem { kind: FsKind::File, path_segment: path_segment.to_string(), read_only: false }
    }

    pub fn directory(path_segment: &str) -> FsItem {
        FsItem { kind: FsKind::Directory, path_segment: path_segment.to_string(), read_only: false }
    }
}

#[cfg(feature = "serde1")]
impl serde::Serialize for FsItem {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.path_segment)
    }
}

bitflags::bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct FsProps: u32 {
        const TYPE = 1 << 0;
        const PARENT = 1 << 1;
        const POSITION_UNDER_PARENT = 1 << 2;
        const PATH_SEGMENT = 1 << 3;
        const READ_ONLY = 1 << 4;
    }
}

impl PropertySet for FsProps {
    const TYPE: Self = FsProps::TYPE;
    const PARENT: Self = FsProps::PARENT;
    const POSITION_UNDER_PARENT: Self = FsProps::POSITION_UNDER_PARENT;
}

/// Files and directories, with directory entries sorted by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileSystem<const THRESHOLD: u32>;

pub type Fs = FileSystem<16>;
pub type IndexedFs = FileSystem<0>;

impl<const THRESHOLD: u32> Family for FileSystem<THRESHOLD> {
    type Kind = FsKind;
    type Payload = FsItem;
    type Properties = FsProps;

    const LOOKUP_TABLE_THRESHOLD: u32 = THRESHOLD;

    fn kind(payload: &FsItem) -> FsKind {
        payload.kind
    }

    fn child_order(_: FsKind) -> ChildOrder {
        ChildOrder::Sorted
    }

    fn compare(a: &FsItem, b: &FsItem) -> Ordering {
        a.path_segment.cmp(&b.path_segment)
    }

    fn diff_properties(before: &FsItem, after: &FsItem) -> FsProps {
        let mut changes = FsProps::empty();
        changes.set(FsProps::TYPE, before.kind != after.kind);
        changes.set(FsProps::PATH_SEGMENT, before.path_segment != after.path_segment);
        changes.set(FsProps::READ_ONLY, before.read_only != after.read_only);
        changes
    }
}

pub fn file<F: Family<Payload = FsItem>>(name: &str) -> GreenNode<F> {
    GreenNode::leaf(FsItem::file(name))
}

pub fn dir<F: Family<Payload = FsItem>>(
    name: &str,
    children: impl IntoIterator<Item = GreenNode<F>>,
) -> GreenNode<F> {
    GreenNode::parent(FsItem::directory(name), children)
}

/// `c:\ {a.cs, b.cs, c\ {d.cs}}`, returning the root and `d.cs`.
pub fn sample<F: Family<Payload = FsItem>>() -> (GreenNode<F>, GreenNode<F>) {
    let d = file("d.cs");
    let root = dir("c:", vec![file("a.cs"), file("b.cs"), dir("c", vec![d.clone()])]);
    (root, d)
}

/// Name of the node with the given identity and of its parent, if any.
pub fn describe<F: Family<Payload = FsItem>>(
    root: &GreenNode<F>,
    identity: thicket::Identity,
) -> (String, Option<String>) {
    let it = root.parented_node(identity).expect("node is in the tree");
    (
        it.node.payload().path_segment.clone(),
        it.parent.map(|p| p.payload().path_segment.clone()),
    )
}
