// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Abstract Syntax Tree types for the Silica hardware description language.
//!
//! This crate defines the AST nodes shared between the parser, type checker,
//! and IR conversion. Nodes are plain boxed trees; every node carries a
//! `NodeId` that semantic passes use as its identity (maps are keyed by id,
//! never by structural equality).

pub mod decl;
pub mod expr;
pub mod span;

pub use span::Span;

/// Unique identifier for AST nodes.
///
/// Assigned once at construction time; uniqueness within a module tree is
/// what allows passes to key side tables by node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NodeId(pub u32);

impl NodeId {
    /// Id for synthesized references with no backing definition
    /// (e.g. a name reference to a builtin).
    pub const DUMMY: NodeId = NodeId(u32::MAX);
}
