// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! IR values: bits and aggregates of bits.

use std::fmt;

use crate::bits::Bits;
use crate::types::Type;

/// A constant IR value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Value {
    Bits(Bits),
    Tuple(Vec<Value>),
    Array(Vec<Value>),
}

impl Value {
    pub fn ubits(value: u64, width: usize) -> Option<Value> {
        Bits::ubits(value, width).map(Value::Bits)
    }

    pub fn bits(&self) -> Option<&Bits> {
        match self {
            Value::Bits(b) => Some(b),
            _ => None,
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Bits(_) => "bits",
            Value::Tuple(_) => "tuple",
            Value::Array(_) => "array",
        }
    }

    /// The IR type of this value. Empty arrays get a zero-width element.
    pub fn get_type(&self) -> Type {
        match self {
            Value::Bits(b) => Type::Bits(b.width()),
            Value::Tuple(members) => Type::Tuple(members.iter().map(Value::get_type).collect()),
            Value::Array(members) => Type::Array {
                element: Box::new(
                    members
                        .first()
                        .map(Value::get_type)
                        .unwrap_or(Type::Bits(0)),
                ),
                size: members.len(),
            },
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bits(b) => write!(f, "{}", b),
            Value::Tuple(members) => {
                write!(f, "(")?;
                for (i, m) in members.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", m)?;
                }
                write!(f, ")")
            }
            Value::Array(members) => {
                write!(f, "[")?;
                for (i, m) in members.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", m)?;
                }
                write!(f, "]")
            }
        }
    }
}
