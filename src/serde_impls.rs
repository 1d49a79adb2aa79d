use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};

use crate::{DiffGram, DiffKind, Family, GreenNode, Identity};

impl Serialize for Identity {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u32(self.get())
    }
}

impl Serialize for DiffKind {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let name = match self {
            DiffKind::Added => "Added",
            DiffKind::Replaced => "Replaced",
            DiffKind::Removed => "Removed",
        };
        serializer.serialize_unit_variant("DiffKind", *self as u32, name)
    }
}

impl<F: Family> Serialize for GreenNode<F>
where
    F::Payload: Serialize,
{
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let len = if self.is_parent() { 3 } else { 2 };
        let mut state = serializer.serialize_map(Some(len))?;
        state.serialize_entry("identity", &self.identity())?;
        state.serialize_entry("payload", self.payload())?;
        if self.is_parent() {
            state.serialize_entry("children", &Children(self))?;
        }
        state.end()
    }
}

struct Children<T>(T);

impl<F: Family> Serialize for Children<&'_ GreenNode<F>>
where
    F::Payload: Serialize,
{
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut state = serializer.serialize_seq(self.0.children().map(|it| it.len()))?;
        self.0.children().into_iter().flatten().try_for_each(|it| state.serialize_element(it))?;
        state.end()
    }
}

impl<F: Family> Serialize for DiffGram<F>
where
    F::Payload: Serialize,
{
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut state = serializer.serialize_map(Some(5))?;
        state.serialize_entry("identity", &self.identity())?;
        state.serialize_entry("kind", &self.kind())?;
        //FIXME: properties have no serde support of their own, so they go out in Debug form.
        state.serialize_entry("changes", format!("{:?}", self.changes()).as_str())?;
        state.serialize_entry("before", &self.before().map(GreenNode::payload))?;
        state.serialize_entry("after", &self.after().map(GreenNode::payload))?;
        state.end()
    }
}
