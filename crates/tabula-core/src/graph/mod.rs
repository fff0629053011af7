//! # Completion Graph
//!
//! The data model the tableau builds: individuals and literals, their concept
//! labels, and role edges stored at both endpoints.
//!
//! Nodes live in an arena owned by `Abox`; this module only defines the node
//! and edge values. All structural mutation goes through `Abox`, which keeps
//! both edge lists consistent and stamps every change with a dependency set.

mod edge;
mod node;

pub use edge::{Edge, EdgeList};
pub use node::{IndividualData, Label, LiteralData, Node, NodeKind};
