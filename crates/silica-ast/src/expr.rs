// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Expression AST nodes.

use crate::decl::NameDef;
use crate::{NodeId, Span};

/// An expression in the AST.
#[derive(Debug, Clone)]
pub struct Expr {
    pub id: NodeId,
    pub kind: ExprKind,
    pub span: Span,
}

/// The kind of expression.
#[derive(Debug, Clone)]
pub enum ExprKind {
    /// Numeric literal, e.g. `u8:42`
    Number(Number),
    /// Reference to a name bound elsewhere in the function or module
    NameRef(NameRef),
    /// Reference to a module-level constant
    ConstRef(NameRef),
    /// Subject-qualified reference, e.g. `imported::FOO` or `Color::Red`
    ColonRef(ColonRef),
    /// Unary operation
    Unop { kind: UnopKind, operand: Box<Expr> },
    /// Binary operation
    Binop {
        kind: BinopKind,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    /// Two-way select, `if test { consequent } else { alternate }`
    Ternary {
        test: Box<Expr>,
        consequent: Box<Expr>,
        alternate: Box<Expr>,
    },
    /// Tuple literal ((a, b, c))
    Tuple(Vec<Expr>),
    /// Struct literal (Point { x: a, y: b })
    StructInstance(StructInstance),
    /// Struct literal with splatted base (Point { x: a, ..p })
    SplatStructInstance(SplatStructInstance),
    /// Struct field access
    Attr { lhs: Box<Expr>, attr: String },
    /// Index or slice access
    Index { lhs: Box<Expr>, rhs: IndexRhs },
    /// Array literal ([a, b, c] or [a, b, ...])
    Array(Array),
    /// Array literal whose members are all compile-time constants
    ConstantArray(Array),
    /// Numeric cast (`x as u4`)
    Cast {
        expr: Box<Expr>,
        type_annotation: TypeAnnotation,
    },
    /// Name binding with optional tuple destructuring
    Let(Box<Let>),
    /// Pattern match
    Match(Match),
    /// Function or builtin invocation
    Invocation(Invocation),
}

/// Numeric literal. The concrete type (and therefore bit width) comes from
/// the type-information table, not from the annotation.
#[derive(Debug, Clone)]
pub struct Number {
    pub value: i128,
    pub type_annotation: Option<TypeAnnotation>,
}

/// Type written in the source, e.g. `u8`, `s4`, or a named type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeAnnotation {
    Builtin { signed: bool, bit_count: usize },
    TypeRef(String),
}

/// Reference to a name definition. `name_def` is the id of the defining
/// `NameDef` node; `NodeId::DUMMY` for builtins, which have no definition.
#[derive(Debug, Clone)]
pub struct NameRef {
    pub name_def: NodeId,
    pub identifier: String,
}

/// `subject::attr`. The subject names an import or a type definition.
#[derive(Debug, Clone)]
pub struct ColonRef {
    pub subject: Box<Expr>,
    pub attr: String,
}

impl ColonRef {
    /// The identifier of the subject, when the subject is a plain name.
    pub fn subject_identifier(&self) -> Option<&str> {
        match &self.subject.kind {
            ExprKind::NameRef(nr) | ExprKind::ConstRef(nr) => Some(&nr.identifier),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnopKind {
    /// Arithmetic negation (`-x`)
    Negate,
    /// Bitwise inversion (`!x`)
    Invert,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinopKind {
    Add,
    Sub,
    Mul,
    Div,
    Eq,
    Ne,
    Ge,
    Gt,
    Le,
    Lt,
    Shll,
    Shrl,
    Shra,
    And,
    Or,
    Xor,
    LogicalAnd,
    LogicalOr,
    Concat,
}

#[derive(Debug, Clone)]
pub struct StructInstance {
    /// Name of the struct (or a typedef resolving to one)
    pub struct_ref: String,
    /// Members in source order, not necessarily declaration order
    pub members: Vec<(String, Expr)>,
}

#[derive(Debug, Clone)]
pub struct SplatStructInstance {
    pub struct_ref: String,
    pub members: Vec<(String, Expr)>,
    pub splatted: Box<Expr>,
}

/// Right-hand side of an index expression.
#[derive(Debug, Clone)]
pub enum IndexRhs {
    /// Tuple or array index
    Expr(Box<Expr>),
    /// Bit slice with compile-time bounds, `x[2:6]`
    Slice(Slice),
    /// Bit slice with dynamic start and type-determined width, `x[i +: u4]`
    WidthSlice(WidthSlice),
}

/// Compile-time bit slice. Start/width resolution is pre-computed by the
/// type checker per set of symbolic bindings; the slice node id keys that
/// lookup.
#[derive(Debug, Clone)]
pub struct Slice {
    pub id: NodeId,
    pub span: Span,
    pub start: Option<Box<Expr>>,
    pub limit: Option<Box<Expr>>,
}

#[derive(Debug, Clone)]
pub struct WidthSlice {
    pub start: Box<Expr>,
}

#[derive(Debug, Clone)]
pub struct Array {
    pub members: Vec<Expr>,
    /// `[a, b, ...]` — trailing members repeat the last element up to the
    /// type-declared length.
    pub has_ellipsis: bool,
}

#[derive(Debug, Clone)]
pub struct Let {
    pub name_def_tree: NameDefTree,
    pub rhs: Expr,
    pub body: Expr,
}

#[derive(Debug, Clone)]
pub struct Match {
    pub matched: Box<Expr>,
    pub arms: Vec<MatchArm>,
}

/// One arm of a match: one or more patterns sharing an expression.
#[derive(Debug, Clone)]
pub struct MatchArm {
    pub patterns: Vec<NameDefTree>,
    pub expr: Box<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct Invocation {
    pub callee: Box<Expr>,
    pub args: Vec<Expr>,
}

/// Tree of names being bound, as appears on the left of a `let` or as a
/// match pattern. Interior nodes destructure tuples; leaves bind or test.
#[derive(Debug, Clone)]
pub struct NameDefTree {
    pub id: NodeId,
    pub span: Span,
    pub kind: NameDefTreeKind,
}

#[derive(Debug, Clone)]
pub enum NameDefTreeKind {
    Leaf(LeafPattern),
    Branch(Vec<NameDefTree>),
}

/// Leaf of a `NameDefTree`.
#[derive(Debug, Clone)]
pub enum LeafPattern {
    /// Fresh binding
    NameDef(NameDef),
    /// `_`
    Wildcard(WildcardPattern),
    /// Literal to compare against (kind is `Number`)
    Number(Expr),
    /// Qualified literal to compare against (kind is `ColonRef`)
    ColonRef(Expr),
    /// Already-bound name to compare against (kind is `NameRef`)
    NameRef(Expr),
}

#[derive(Debug, Clone)]
pub struct WildcardPattern {
    pub id: NodeId,
    pub span: Span,
}

impl LeafPattern {
    /// Id of the AST node backing this leaf.
    pub fn node_id(&self) -> NodeId {
        match self {
            LeafPattern::NameDef(nd) => nd.id,
            LeafPattern::Wildcard(w) => w.id,
            LeafPattern::Number(e) | LeafPattern::ColonRef(e) | LeafPattern::NameRef(e) => e.id,
        }
    }
}

impl NameDefTree {
    pub fn is_leaf(&self) -> bool {
        matches!(self.kind, NameDefTreeKind::Leaf(_))
    }

    /// True when the pattern matches every value of its type.
    pub fn is_irrefutable(&self) -> bool {
        match &self.kind {
            NameDefTreeKind::Leaf(LeafPattern::NameDef(_))
            | NameDefTreeKind::Leaf(LeafPattern::Wildcard(_)) => true,
            NameDefTreeKind::Leaf(_) => false,
            NameDefTreeKind::Branch(nodes) => nodes.iter().all(NameDefTree::is_irrefutable),
        }
    }
}
