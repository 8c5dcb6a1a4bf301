// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Concrete types with possibly-parametric dimensions.

use std::fmt;

use crate::bindings::SymbolicBindings;

/// A fully shaped surface type. Dimensions are `Dim`s: ground integers or
/// parametric expressions awaiting symbolic bindings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConcreteType {
    Bits {
        signed: bool,
        size: Dim,
    },
    /// Enums carry their underlying bits shape; the name is kept for
    /// diagnostics only.
    Enum {
        name: String,
        signed: bool,
        size: Dim,
    },
    Array {
        element: Box<ConcreteType>,
        size: Dim,
    },
    Tuple {
        members: Vec<TupleMember>,
    },
}

/// Tuple member; named when the tuple models a struct.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TupleMember {
    pub name: Option<String>,
    pub ty: ConcreteType,
}

impl ConcreteType {
    pub fn ubits(bit_count: i64) -> Self {
        ConcreteType::Bits {
            signed: false,
            size: Dim::Int(bit_count),
        }
    }

    pub fn sbits(bit_count: i64) -> Self {
        ConcreteType::Bits {
            signed: true,
            size: Dim::Int(bit_count),
        }
    }

    pub fn array(element: ConcreteType, size: i64) -> Self {
        ConcreteType::Array {
            element: Box::new(element),
            size: Dim::Int(size),
        }
    }

    pub fn tuple(members: impl IntoIterator<Item = ConcreteType>) -> Self {
        ConcreteType::Tuple {
            members: members
                .into_iter()
                .map(|ty| TupleMember { name: None, ty })
                .collect(),
        }
    }

    /// Whether values of this type carry a sign. `None` for aggregates.
    pub fn is_signed(&self) -> Option<bool> {
        match self {
            ConcreteType::Bits { signed, .. } | ConcreteType::Enum { signed, .. } => Some(*signed),
            ConcreteType::Array { .. } | ConcreteType::Tuple { .. } => None,
        }
    }

    /// Total flat bit count of a value of this type.
    pub fn total_bit_count(&self) -> Dim {
        match self {
            ConcreteType::Bits { size, .. } | ConcreteType::Enum { size, .. } => size.clone(),
            ConcreteType::Array { element, size } => element.total_bit_count().mul(size),
            ConcreteType::Tuple { members } => members
                .iter()
                .fold(Dim::Int(0), |acc, m| acc.add(&m.ty.total_bit_count())),
        }
    }

    /// Index of the named member, for tuples modeling structs.
    pub fn member_index(&self, name: &str) -> Option<usize> {
        match self {
            ConcreteType::Tuple { members } => members
                .iter()
                .position(|m| m.name.as_deref() == Some(name)),
            _ => None,
        }
    }

    /// Rebuild the type with every dimension passed through `f`.
    pub fn map_size<E>(
        &self,
        f: &mut impl FnMut(&Dim) -> Result<Dim, E>,
    ) -> Result<ConcreteType, E> {
        Ok(match self {
            ConcreteType::Bits { signed, size } => ConcreteType::Bits {
                signed: *signed,
                size: f(size)?,
            },
            ConcreteType::Enum { name, signed, size } => ConcreteType::Enum {
                name: name.clone(),
                signed: *signed,
                size: f(size)?,
            },
            ConcreteType::Array { element, size } => ConcreteType::Array {
                element: Box::new(element.map_size(f)?),
                size: f(size)?,
            },
            ConcreteType::Tuple { members } => ConcreteType::Tuple {
                members: members
                    .iter()
                    .map(|m| {
                        Ok(TupleMember {
                            name: m.name.clone(),
                            ty: m.ty.map_size(f)?,
                        })
                    })
                    .collect::<Result<_, E>>()?,
            },
        })
    }
}

impl fmt::Display for ConcreteType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConcreteType::Bits { signed, size } => {
                write!(f, "{}N[{}]", if *signed { "s" } else { "u" }, size)
            }
            ConcreteType::Enum { name, .. } => write!(f, "{}", name),
            ConcreteType::Array { element, size } => write!(f, "{}[{}]", element, size),
            ConcreteType::Tuple { members } => {
                write!(f, "(")?;
                for (i, m) in members.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", m.ty)?;
                }
                write!(f, ")")
            }
        }
    }
}

/// A type dimension: a ground integer or a parametric expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dim {
    Int(i64),
    Parametric(ParametricExpr),
}

impl Dim {
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Dim::Int(v) => Some(*v),
            Dim::Parametric(_) => None,
        }
    }

    pub fn add(&self, other: &Dim) -> Dim {
        match (self, other) {
            (Dim::Int(a), Dim::Int(b)) => Dim::Int(a + b),
            _ => Dim::Parametric(ParametricExpr::Add(
                Box::new(self.to_expr()),
                Box::new(other.to_expr()),
            )),
        }
    }

    pub fn mul(&self, other: &Dim) -> Dim {
        match (self, other) {
            (Dim::Int(a), Dim::Int(b)) => Dim::Int(a * b),
            _ => Dim::Parametric(ParametricExpr::Mul(
                Box::new(self.to_expr()),
                Box::new(other.to_expr()),
            )),
        }
    }

    fn to_expr(&self) -> ParametricExpr {
        match self {
            Dim::Int(v) => ParametricExpr::Int(*v),
            Dim::Parametric(e) => e.clone(),
        }
    }
}

impl fmt::Display for Dim {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dim::Int(v) => write!(f, "{}", v),
            Dim::Parametric(e) => write!(f, "{}", e),
        }
    }
}

/// Expression over parametric identifiers, e.g. `N + 1` in `bits[N + 1]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParametricExpr {
    Symbol(String),
    Int(i64),
    Add(Box<ParametricExpr>, Box<ParametricExpr>),
    Sub(Box<ParametricExpr>, Box<ParametricExpr>),
    Mul(Box<ParametricExpr>, Box<ParametricExpr>),
}

impl ParametricExpr {
    pub fn symbol(name: impl Into<String>) -> Self {
        ParametricExpr::Symbol(name.into())
    }

    /// Substitute bound symbols and fold. Symbols absent from `env` survive.
    pub fn evaluate(&self, env: &SymbolicBindings) -> ParametricExpr {
        match self {
            ParametricExpr::Symbol(name) => match env.get(name) {
                Some(v) => ParametricExpr::Int(v),
                None => self.clone(),
            },
            ParametricExpr::Int(v) => ParametricExpr::Int(*v),
            ParametricExpr::Add(a, b) => Self::fold(a.evaluate(env), b.evaluate(env), |x, y| {
                x + y
            })
            .unwrap_or_else(|(a, b)| ParametricExpr::Add(Box::new(a), Box::new(b))),
            ParametricExpr::Sub(a, b) => Self::fold(a.evaluate(env), b.evaluate(env), |x, y| {
                x - y
            })
            .unwrap_or_else(|(a, b)| ParametricExpr::Sub(Box::new(a), Box::new(b))),
            ParametricExpr::Mul(a, b) => Self::fold(a.evaluate(env), b.evaluate(env), |x, y| {
                x * y
            })
            .unwrap_or_else(|(a, b)| ParametricExpr::Mul(Box::new(a), Box::new(b))),
        }
    }

    /// Into a `Dim`: ground when fully folded.
    pub fn to_dim(self) -> Dim {
        match self {
            ParametricExpr::Int(v) => Dim::Int(v),
            other => Dim::Parametric(other),
        }
    }

    fn fold(
        a: ParametricExpr,
        b: ParametricExpr,
        op: impl FnOnce(i64, i64) -> i64,
    ) -> Result<ParametricExpr, (ParametricExpr, ParametricExpr)> {
        match (a, b) {
            (ParametricExpr::Int(x), ParametricExpr::Int(y)) => Ok(ParametricExpr::Int(op(x, y))),
            (a, b) => Err((a, b)),
        }
    }
}

impl fmt::Display for ParametricExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParametricExpr::Symbol(s) => write!(f, "{}", s),
            ParametricExpr::Int(v) => write!(f, "{}", v),
            ParametricExpr::Add(a, b) => write!(f, "({} + {})", a, b),
            ParametricExpr::Sub(a, b) => write!(f, "({} - {})", a, b),
            ParametricExpr::Mul(a, b) => write!(f, "({} * {})", a, b),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn total_bit_count_of_aggregates() {
        let ty = ConcreteType::tuple([
            ConcreteType::ubits(8),
            ConcreteType::array(ConcreteType::ubits(4), 3),
        ]);
        assert_eq!(ty.total_bit_count(), Dim::Int(20));
    }

    #[test]
    fn parametric_dim_evaluation() {
        let expr = ParametricExpr::Add(
            Box::new(ParametricExpr::symbol("N")),
            Box::new(ParametricExpr::Int(1)),
        );
        let env = SymbolicBindings::new([("N".to_string(), 7)]);
        assert_eq!(expr.evaluate(&env), ParametricExpr::Int(8));

        let empty = SymbolicBindings::default();
        assert!(matches!(expr.evaluate(&empty), ParametricExpr::Add(..)));
    }

    #[test]
    fn member_index_on_struct_tuple() {
        let ty = ConcreteType::Tuple {
            members: vec![
                TupleMember {
                    name: Some("x".to_string()),
                    ty: ConcreteType::ubits(8),
                },
                TupleMember {
                    name: Some("y".to_string()),
                    ty: ConcreteType::ubits(8),
                },
            ],
        };
        assert_eq!(ty.member_index("y"), Some(1));
        assert_eq!(ty.member_index("z"), None);
    }
}
