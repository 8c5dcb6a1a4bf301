// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! AST → IR conversion for Silica.
//!
//! The entry points (`convert_module_to_package`, `convert_one_function`)
//! walk a type-checked module and emit one IR function per surface function
//! into a `Package`. The per-function work is done by `IrConverter`, which
//! owns a `FunctionBuilder` for the duration of one function and a name
//! environment mapping AST nodes to the IR values they lowered to.
//!
//! The converter consults type checking results strictly through the
//! `TypeInfo` query interface and never mutates them; it reports failures
//! as `ConvertError`s rather than logging or panicking.

mod builtins;
mod driver;
mod error;
mod expr;
mod ir_converter;
mod mangle;
mod matcher;


pub use driver::{
    convert_function_into_package, convert_module, convert_module_to_package,
    convert_one_function,
};
pub use error::ConvertError;
pub use ir_converter::{
    interp_value_to_value, value_to_interp_value, IrConverter, IrValue,
};
pub use mangle::mangle_name;
