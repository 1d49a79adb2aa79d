use std::{cmp::Ordering, fmt};

/// How a parent's children are arranged, which in turn decides whether the
/// differ reports `POSITION_UNDER_PARENT` changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChildOrder {
    /// Children form a set; position carries no meaning.
    Unordered,
    /// Children keep the order they were inserted in.
    Ordered,
    /// Children are kept sorted by [`Family::compare`].
    Sorted,
}

/// Bitset of semantic properties a [`crate::DiffGram`] reports as changed.
///
/// Besides the family's own fields it must be able to express the three
/// synthetic properties computed by the differ itself.
pub trait PropertySet: bitflags::Flags + Copy + Eq + fmt::Debug + Send + Sync + 'static {
    /// The node's runtime kind changed.
    const TYPE: Self;
    /// The node moved to a different parent, or gained/lost one.
    const PARENT: Self;
    /// The node moved within the ordered children of its parent.
    const POSITION_UNDER_PARENT: Self;
}

/// A family of node types sharing one recursive children collection.
///
/// This is the seam between the generic tree machinery and the concrete
/// node types of a model: it plays the role generated per-type code plays
/// elsewhere, supplying the payload, the kind of each payload, the ordering
/// of children and a field-by-field comparison for diffing.
///
/// ```
/// use std::cmp::Ordering;
/// use thicket::{ChildOrder, Family, PropertySet};
///
/// bitflags::bitflags! {
///     #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
///     pub struct TodoProps: u32 {
///         const TYPE = 1;
///         const PARENT = 1 << 1;
///         const POSITION_UNDER_PARENT = 1 << 2;
///         const TITLE = 1 << 3;
///     }
/// }
///
/// impl PropertySet for TodoProps {
///     const TYPE: Self = TodoProps::TYPE;
///     const PARENT: Self = TodoProps::PARENT;
///     const POSITION_UNDER_PARENT: Self = TodoProps::POSITION_UNDER_PARENT;
/// }
///
/// enum Todo {}
///
/// impl Family for Todo {
///     type Kind = ();
///     type Payload = String;
///     type Properties = TodoProps;
///
///     fn kind(_: &String) {}
///
///     fn diff_properties(before: &String, after: &String) -> TodoProps {
///         if before != after { TodoProps::TITLE } else { TodoProps::empty() }
///     }
/// }
///
/// assert_eq!(Todo::child_order(()), ChildOrder::Ordered);
/// ```
pub trait Family: Sized + Send + Sync + 'static {
    type Kind: Copy + Eq + fmt::Debug + Send + Sync;
    type Payload: Clone + PartialEq + fmt::Debug + Send + Sync;
    type Properties: PropertySet;

    /// Estimated search cost above which a parent builds a lookup table.
    const LOOKUP_TABLE_THRESHOLD: u32 = 16;

    fn kind(payload: &Self::Payload) -> Self::Kind;

    /// Arrangement of the children of a parent of the given kind.
    fn child_order(kind: Self::Kind) -> ChildOrder {
        let _ = kind;
        ChildOrder::Ordered
    }

    /// Total order used for [`ChildOrder::Sorted`] children.
    fn compare(a: &Self::Payload, b: &Self::Payload) -> Ordering {
        let _ = (a, b);
        Ordering::Equal
    }

    /// Field-by-field inequality between two versions of one payload.
    fn diff_properties(before: &Self::Payload, after: &Self::Payload) -> Self::Properties;
}
