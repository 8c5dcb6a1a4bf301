// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Type system data consumed by IR conversion.
//!
//! This crate holds the output side of type checking: `ConcreteType` (fully
//! shaped types whose dimensions may still be parametric expressions),
//! `SymbolicBindings` (parametric identifier → integer assignments), and the
//! read-only `TypeInfo` table that maps AST nodes to their deduced types.

pub mod bindings;
pub mod type_info;
pub mod types;

pub use bindings::{SymbolicBinding, SymbolicBindings};
pub use type_info::{StartAndWidth, TypeInfo};
pub use types::{ConcreteType, Dim, ParametricExpr, TupleMember};
