// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! IR function representation - a flat, append-only list of SSA nodes.

use crate::types::Type;
use crate::value::Value;

/// Handle to a node within one `IrFunction`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeRef(pub u32);

/// Interned source file id, scoped to a `Package`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fileno(pub u32);

/// Source position attached to a node when position emission is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceLocation {
    pub fileno: Fileno,
    pub start: usize,
    pub end: usize,
}

/// One SSA node.
#[derive(Debug, Clone)]
pub struct Node {
    pub op: Op,
    pub operands: Vec<NodeRef>,
    pub ty: Type,
    pub name: Option<String>,
    pub loc: Option<SourceLocation>,
}

/// A function under construction or finished: nodes in emission order.
/// `return_value` is set when the function is built.
#[derive(Debug, Clone)]
pub struct IrFunction {
    pub name: String,
    pub params: Vec<NodeRef>,
    pub nodes: Vec<Node>,
    pub return_value: Option<NodeRef>,
}

impl IrFunction {
    pub fn node(&self, r: NodeRef) -> &Node {
        &self.nodes[r.0 as usize]
    }

    pub fn return_type(&self) -> Option<&Type> {
        self.return_value.map(|r| &self.node(r).ty)
    }

    /// Nodes matching a predicate on the op, in emission order.
    pub fn nodes_matching(&self, mut pred: impl FnMut(&Op) -> bool) -> Vec<NodeRef> {
        (0..self.nodes.len() as u32)
            .map(NodeRef)
            .filter(|r| pred(&self.node(*r).op))
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Not,
    Identity,
    Reverse,
    Clz,
    Ctz,
    AndReduce,
    OrReduce,
    XorReduce,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    UMul,
    SMul,
    UDiv,
    Shll,
    Shrl,
    Shra,
    Eq,
    Ne,
    UGe,
    UGt,
    ULe,
    ULt,
    SGe,
    SGt,
    SLe,
    SLt,
}

impl BinaryOp {
    /// Comparisons produce `bits[1]`; everything else keeps the lhs type.
    pub fn is_comparison(self) -> bool {
        use BinaryOp::*;
        matches!(self, Eq | Ne | UGe | UGt | ULe | ULt | SGe | SGt | SLe | SLt)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NaryOp {
    And,
    Or,
    Xor,
}

/// Priority direction for `OneHot`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LsbOrMsb {
    Lsb,
    Msb,
}

/// Reference to another function in the package, by mangled name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionRef {
    pub name: String,
}

impl FunctionRef {
    pub fn new(name: impl Into<String>) -> Self {
        FunctionRef { name: name.into() }
    }
}

/// Node operation. Operand arity and types are preconditions of the
/// `FunctionBuilder` constructor for each op.
#[derive(Debug, Clone, PartialEq)]
pub enum Op {
    Param,
    Literal(Value),
    Unary(UnaryOp),
    Binary(BinaryOp),
    Nary(NaryOp),
    Concat,
    ArrayConcat,
    Array,
    ArrayIndex,
    /// Operands: [array, new_value, index]
    ArrayUpdate,
    Tuple,
    TupleIndex(usize),
    BitSlice { start: usize, width: usize },
    /// Operands: [input, start]
    DynamicBitSlice { width: usize },
    SignExtend { new_width: usize },
    ZeroExtend { new_width: usize },
    OneHot(LsbOrMsb),
    /// Operands: [selector, case...]
    OneHotSelect,
    /// Operands: [test, consequent, alternate]
    Select,
    /// Operands: [selector..., value..., default]; `arm_count` selectors.
    MatchTrue { arm_count: usize },
    Map(FunctionRef),
    Invoke(FunctionRef),
}

impl Op {
    pub fn mnemonic(&self) -> &'static str {
        match self {
            Op::Param => "param",
            Op::Literal(_) => "literal",
            Op::Unary(UnaryOp::Neg) => "neg",
            Op::Unary(UnaryOp::Not) => "not",
            Op::Unary(UnaryOp::Identity) => "identity",
            Op::Unary(UnaryOp::Reverse) => "reverse",
            Op::Unary(UnaryOp::Clz) => "clz",
            Op::Unary(UnaryOp::Ctz) => "ctz",
            Op::Unary(UnaryOp::AndReduce) => "and_reduce",
            Op::Unary(UnaryOp::OrReduce) => "or_reduce",
            Op::Unary(UnaryOp::XorReduce) => "xor_reduce",
            Op::Binary(BinaryOp::Add) => "add",
            Op::Binary(BinaryOp::Sub) => "sub",
            Op::Binary(BinaryOp::UMul) => "umul",
            Op::Binary(BinaryOp::SMul) => "smul",
            Op::Binary(BinaryOp::UDiv) => "udiv",
            Op::Binary(BinaryOp::Shll) => "shll",
            Op::Binary(BinaryOp::Shrl) => "shrl",
            Op::Binary(BinaryOp::Shra) => "shra",
            Op::Binary(BinaryOp::Eq) => "eq",
            Op::Binary(BinaryOp::Ne) => "ne",
            Op::Binary(BinaryOp::UGe) => "uge",
            Op::Binary(BinaryOp::UGt) => "ugt",
            Op::Binary(BinaryOp::ULe) => "ule",
            Op::Binary(BinaryOp::ULt) => "ult",
            Op::Binary(BinaryOp::SGe) => "sge",
            Op::Binary(BinaryOp::SGt) => "sgt",
            Op::Binary(BinaryOp::SLe) => "sle",
            Op::Binary(BinaryOp::SLt) => "slt",
            Op::Nary(NaryOp::And) => "and",
            Op::Nary(NaryOp::Or) => "or",
            Op::Nary(NaryOp::Xor) => "xor",
            Op::Concat => "concat",
            Op::ArrayConcat => "array_concat",
            Op::Array => "array",
            Op::ArrayIndex => "array_index",
            Op::ArrayUpdate => "array_update",
            Op::Tuple => "tuple",
            Op::TupleIndex(_) => "tuple_index",
            Op::BitSlice { .. } => "bit_slice",
            Op::DynamicBitSlice { .. } => "dynamic_bit_slice",
            Op::SignExtend { .. } => "sign_ext",
            Op::ZeroExtend { .. } => "zero_ext",
            Op::OneHot(_) => "one_hot",
            Op::OneHotSelect => "one_hot_sel",
            Op::Select => "sel",
            Op::MatchTrue { .. } => "match_true",
            Op::Map(_) => "map",
            Op::Invoke(_) => "invoke",
        }
    }
}
