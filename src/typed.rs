use crate::{Family, Rooted};

/// The main trait to go from an untyped [`Rooted`] node to a typed view of
/// one kind of node. The conversion has no runtime cost: a typed node is a
/// `Rooted` whose kind has been checked.
pub trait TypedNode {
    type Family: Family;

    fn can_cast(kind: <Self::Family as Family>::Kind) -> bool
    where
        Self: Sized;

    fn cast(node: Rooted<Self::Family>) -> Option<Self>
    where
        Self: Sized;

    fn rooted(&self) -> &Rooted<Self::Family>;

    /// Re-views this node as another typed node of the same family, if its
    /// kind allows it.
    fn upcast<N: TypedNode<Family = Self::Family>>(&self) -> Option<N>
    where
        Self: Sized,
    {
        N::cast(self.rooted().clone())
    }
}
