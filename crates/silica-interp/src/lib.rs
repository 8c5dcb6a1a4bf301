// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Interpreter value representation.
//!
//! `InterpValue` is the value domain of the Silica interpreter. IR
//! conversion touches it only through the static conversions in
//! `silica-convert`; it is kept separate so the interpreter and the IR do
//! not depend on each other's internals.

use std::fmt;

use silica_ir::Bits;

/// A value as the interpreter sees it. Unlike IR `Value`s, interpreter
/// values remember surface-level distinctions: signedness, enum membership,
/// and function references.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InterpValue {
    UBits(Bits),
    SBits(Bits),
    /// Enum member; carries the member's underlying bits.
    Enum(Bits),
    Tuple(Vec<InterpValue>),
    Array(Vec<InterpValue>),
    /// Reference to a function, by name. Has no IR value form.
    Function(String),
}

impl InterpValue {
    pub fn tag_name(&self) -> &'static str {
        match self {
            InterpValue::UBits(_) => "ubits",
            InterpValue::SBits(_) => "sbits",
            InterpValue::Enum(_) => "enum",
            InterpValue::Tuple(_) => "tuple",
            InterpValue::Array(_) => "array",
            InterpValue::Function(_) => "function",
        }
    }

    pub fn bits(&self) -> Option<&Bits> {
        match self {
            InterpValue::UBits(b) | InterpValue::SBits(b) | InterpValue::Enum(b) => Some(b),
            _ => None,
        }
    }
}

impl fmt::Display for InterpValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InterpValue::UBits(b) | InterpValue::Enum(b) => write!(f, "{}", b),
            InterpValue::SBits(b) => write!(f, "s{}", b),
            InterpValue::Tuple(members) => {
                write!(f, "(")?;
                for (i, m) in members.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", m)?;
                }
                write!(f, ")")
            }
            InterpValue::Array(members) => {
                write!(f, "[")?;
                for (i, m) in members.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", m)?;
                }
                write!(f, "]")
            }
            InterpValue::Function(name) => write!(f, "fn:{}", name),
        }
    }
}
