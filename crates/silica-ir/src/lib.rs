// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Silica IR - a flat, SSA-style, bit-precise intermediate representation.
//!
//! A `Package` holds finished `IrFunction`s; a `FunctionBuilder` appends
//! nodes to one function under construction. Everything is typed with the
//! three-shape IR type system (bits, arrays, tuples); signedness lives in
//! the ops, not the types.

pub mod bits;
pub mod builder;
mod display;
pub mod function;
pub mod package;
pub mod types;
pub mod value;

pub use bits::Bits;
pub use builder::FunctionBuilder;
pub use function::{
    BinaryOp, Fileno, FunctionRef, IrFunction, LsbOrMsb, NaryOp, Node, NodeRef, Op,
    SourceLocation, UnaryOp,
};
pub use package::{Package, PackageError};
pub use types::Type;
pub use value::Value;
