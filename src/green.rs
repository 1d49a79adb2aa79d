mod node;
mod children;
mod builder;

pub use self::{
    builder::{Checkpoint, GreenNodeBuilder},
    children::{ChildList, Children},
    node::GreenNode,
};
