// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! FunctionBuilder - appends SSA nodes to a growing function.
//!
//! Each constructor computes the result type from its operands. Operand
//! shape requirements (e.g. `concat` wants bits-typed operands) are
//! preconditions: violating them panics, they are not recoverable errors.
//! Callers that construct IR from checked types satisfy them by
//! construction.

use crate::function::{
    BinaryOp, FunctionRef, IrFunction, LsbOrMsb, NaryOp, Node, NodeRef, Op, SourceLocation,
    UnaryOp,
};
use crate::package::PackageError;
use crate::types::Type;
use crate::value::Value;

pub struct FunctionBuilder {
    function: IrFunction,
}

impl FunctionBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        FunctionBuilder {
            function: IrFunction {
                name: name.into(),
                params: Vec::new(),
                nodes: Vec::new(),
                return_value: None,
            },
        }
    }

    pub fn name(&self) -> &str {
        &self.function.name
    }

    fn add_node(
        &mut self,
        op: Op,
        operands: Vec<NodeRef>,
        ty: Type,
        loc: Option<SourceLocation>,
    ) -> NodeRef {
        let r = NodeRef(self.function.nodes.len() as u32);
        self.function.nodes.push(Node {
            op,
            operands,
            ty,
            name: None,
            loc,
        });
        r
    }

    fn ty(&self, r: NodeRef) -> &Type {
        &self.function.node(r).ty
    }

    fn bits_width(&self, r: NodeRef) -> usize {
        match self.ty(r) {
            Type::Bits(n) => *n,
            other => panic!("operand must be bits-typed, got {}", other),
        }
    }

    fn array_parts(&self, r: NodeRef) -> (Type, usize) {
        match self.ty(r) {
            Type::Array { element, size } => ((**element).clone(), *size),
            other => panic!("operand must be array-typed, got {}", other),
        }
    }

    // ── parameters and literals ─────────────────────────────────

    pub fn param(&mut self, name: impl Into<String>, ty: Type) -> NodeRef {
        let name = name.into();
        let r = self.add_node(Op::Param, Vec::new(), ty, None);
        self.function.nodes[r.0 as usize].name = Some(name);
        self.function.params.push(r);
        r
    }

    pub fn literal(&mut self, value: Value, loc: Option<SourceLocation>) -> NodeRef {
        let ty = value.get_type();
        self.add_node(Op::Literal(value), Vec::new(), ty, loc)
    }

    // ── generic op constructors ─────────────────────────────────

    pub fn add_unop(&mut self, op: UnaryOp, arg: NodeRef, loc: Option<SourceLocation>) -> NodeRef {
        let ty = match op {
            UnaryOp::AndReduce | UnaryOp::OrReduce | UnaryOp::XorReduce => Type::Bits(1),
            UnaryOp::Neg
            | UnaryOp::Not
            | UnaryOp::Reverse
            | UnaryOp::Clz
            | UnaryOp::Ctz => Type::Bits(self.bits_width(arg)),
            UnaryOp::Identity => self.ty(arg).clone(),
        };
        self.add_node(Op::Unary(op), vec![arg], ty, loc)
    }

    pub fn add_binop(
        &mut self,
        op: BinaryOp,
        lhs: NodeRef,
        rhs: NodeRef,
        loc: Option<SourceLocation>,
    ) -> NodeRef {
        let ty = if op.is_comparison() {
            Type::Bits(1)
        } else {
            self.ty(lhs).clone()
        };
        self.add_node(Op::Binary(op), vec![lhs, rhs], ty, loc)
    }

    pub fn add_nary_op(
        &mut self,
        op: NaryOp,
        args: Vec<NodeRef>,
        loc: Option<SourceLocation>,
    ) -> NodeRef {
        assert!(!args.is_empty(), "nary op needs at least one operand");
        let ty = self.ty(args[0]).clone();
        self.add_node(Op::Nary(op), args, ty, loc)
    }

    // ── arithmetic, comparisons, shifts, bitwise ────────────────

    pub fn add(&mut self, lhs: NodeRef, rhs: NodeRef, loc: Option<SourceLocation>) -> NodeRef {
        self.add_binop(BinaryOp::Add, lhs, rhs, loc)
    }

    pub fn sub(&mut self, lhs: NodeRef, rhs: NodeRef, loc: Option<SourceLocation>) -> NodeRef {
        self.add_binop(BinaryOp::Sub, lhs, rhs, loc)
    }

    pub fn umul(&mut self, lhs: NodeRef, rhs: NodeRef, loc: Option<SourceLocation>) -> NodeRef {
        self.add_binop(BinaryOp::UMul, lhs, rhs, loc)
    }

    pub fn smul(&mut self, lhs: NodeRef, rhs: NodeRef, loc: Option<SourceLocation>) -> NodeRef {
        self.add_binop(BinaryOp::SMul, lhs, rhs, loc)
    }

    pub fn udiv(&mut self, lhs: NodeRef, rhs: NodeRef, loc: Option<SourceLocation>) -> NodeRef {
        self.add_binop(BinaryOp::UDiv, lhs, rhs, loc)
    }

    pub fn eq(&mut self, lhs: NodeRef, rhs: NodeRef, loc: Option<SourceLocation>) -> NodeRef {
        self.add_binop(BinaryOp::Eq, lhs, rhs, loc)
    }

    pub fn ne(&mut self, lhs: NodeRef, rhs: NodeRef, loc: Option<SourceLocation>) -> NodeRef {
        self.add_binop(BinaryOp::Ne, lhs, rhs, loc)
    }

    pub fn uge(&mut self, lhs: NodeRef, rhs: NodeRef, loc: Option<SourceLocation>) -> NodeRef {
        self.add_binop(BinaryOp::UGe, lhs, rhs, loc)
    }

    pub fn ugt(&mut self, lhs: NodeRef, rhs: NodeRef, loc: Option<SourceLocation>) -> NodeRef {
        self.add_binop(BinaryOp::UGt, lhs, rhs, loc)
    }

    pub fn ule(&mut self, lhs: NodeRef, rhs: NodeRef, loc: Option<SourceLocation>) -> NodeRef {
        self.add_binop(BinaryOp::ULe, lhs, rhs, loc)
    }

    pub fn ult(&mut self, lhs: NodeRef, rhs: NodeRef, loc: Option<SourceLocation>) -> NodeRef {
        self.add_binop(BinaryOp::ULt, lhs, rhs, loc)
    }

    pub fn sge(&mut self, lhs: NodeRef, rhs: NodeRef, loc: Option<SourceLocation>) -> NodeRef {
        self.add_binop(BinaryOp::SGe, lhs, rhs, loc)
    }

    pub fn sgt(&mut self, lhs: NodeRef, rhs: NodeRef, loc: Option<SourceLocation>) -> NodeRef {
        self.add_binop(BinaryOp::SGt, lhs, rhs, loc)
    }

    pub fn sle(&mut self, lhs: NodeRef, rhs: NodeRef, loc: Option<SourceLocation>) -> NodeRef {
        self.add_binop(BinaryOp::SLe, lhs, rhs, loc)
    }

    pub fn slt(&mut self, lhs: NodeRef, rhs: NodeRef, loc: Option<SourceLocation>) -> NodeRef {
        self.add_binop(BinaryOp::SLt, lhs, rhs, loc)
    }

    pub fn shll(&mut self, lhs: NodeRef, rhs: NodeRef, loc: Option<SourceLocation>) -> NodeRef {
        self.add_binop(BinaryOp::Shll, lhs, rhs, loc)
    }

    pub fn shrl(&mut self, lhs: NodeRef, rhs: NodeRef, loc: Option<SourceLocation>) -> NodeRef {
        self.add_binop(BinaryOp::Shrl, lhs, rhs, loc)
    }

    pub fn shra(&mut self, lhs: NodeRef, rhs: NodeRef, loc: Option<SourceLocation>) -> NodeRef {
        self.add_binop(BinaryOp::Shra, lhs, rhs, loc)
    }

    pub fn and(&mut self, lhs: NodeRef, rhs: NodeRef, loc: Option<SourceLocation>) -> NodeRef {
        self.add_nary_op(NaryOp::And, vec![lhs, rhs], loc)
    }

    pub fn or(&mut self, lhs: NodeRef, rhs: NodeRef, loc: Option<SourceLocation>) -> NodeRef {
        self.add_nary_op(NaryOp::Or, vec![lhs, rhs], loc)
    }

    pub fn xor(&mut self, lhs: NodeRef, rhs: NodeRef, loc: Option<SourceLocation>) -> NodeRef {
        self.add_nary_op(NaryOp::Xor, vec![lhs, rhs], loc)
    }

    pub fn neg(&mut self, arg: NodeRef, loc: Option<SourceLocation>) -> NodeRef {
        self.add_unop(UnaryOp::Neg, arg, loc)
    }

    pub fn not(&mut self, arg: NodeRef, loc: Option<SourceLocation>) -> NodeRef {
        self.add_unop(UnaryOp::Not, arg, loc)
    }

    pub fn identity(&mut self, arg: NodeRef, loc: Option<SourceLocation>) -> NodeRef {
        self.add_unop(UnaryOp::Identity, arg, loc)
    }

    pub fn reverse(&mut self, arg: NodeRef, loc: Option<SourceLocation>) -> NodeRef {
        self.add_unop(UnaryOp::Reverse, arg, loc)
    }

    pub fn clz(&mut self, arg: NodeRef, loc: Option<SourceLocation>) -> NodeRef {
        self.add_unop(UnaryOp::Clz, arg, loc)
    }

    pub fn ctz(&mut self, arg: NodeRef, loc: Option<SourceLocation>) -> NodeRef {
        self.add_unop(UnaryOp::Ctz, arg, loc)
    }

    pub fn and_reduce(&mut self, arg: NodeRef, loc: Option<SourceLocation>) -> NodeRef {
        self.add_unop(UnaryOp::AndReduce, arg, loc)
    }

    pub fn or_reduce(&mut self, arg: NodeRef, loc: Option<SourceLocation>) -> NodeRef {
        self.add_unop(UnaryOp::OrReduce, arg, loc)
    }

    pub fn xor_reduce(&mut self, arg: NodeRef, loc: Option<SourceLocation>) -> NodeRef {
        self.add_unop(UnaryOp::XorReduce, arg, loc)
    }

    // ── bit manipulation ────────────────────────────────────────

    pub fn concat(&mut self, parts: Vec<NodeRef>, loc: Option<SourceLocation>) -> NodeRef {
        let width = parts.iter().map(|r| self.bits_width(*r)).sum();
        self.add_node(Op::Concat, parts, Type::Bits(width), loc)
    }

    pub fn bit_slice(
        &mut self,
        arg: NodeRef,
        start: usize,
        width: usize,
        loc: Option<SourceLocation>,
    ) -> NodeRef {
        self.add_node(
            Op::BitSlice { start, width },
            vec![arg],
            Type::Bits(width),
            loc,
        )
    }

    pub fn dynamic_bit_slice(
        &mut self,
        arg: NodeRef,
        start: NodeRef,
        width: usize,
        loc: Option<SourceLocation>,
    ) -> NodeRef {
        self.add_node(
            Op::DynamicBitSlice { width },
            vec![arg, start],
            Type::Bits(width),
            loc,
        )
    }

    pub fn sign_extend(
        &mut self,
        arg: NodeRef,
        new_width: usize,
        loc: Option<SourceLocation>,
    ) -> NodeRef {
        self.add_node(
            Op::SignExtend { new_width },
            vec![arg],
            Type::Bits(new_width),
            loc,
        )
    }

    pub fn zero_extend(
        &mut self,
        arg: NodeRef,
        new_width: usize,
        loc: Option<SourceLocation>,
    ) -> NodeRef {
        self.add_node(
            Op::ZeroExtend { new_width },
            vec![arg],
            Type::Bits(new_width),
            loc,
        )
    }

    /// One-hot with an implicit "nothing set" bit: result is one wider than
    /// the input.
    pub fn one_hot(
        &mut self,
        arg: NodeRef,
        priority: LsbOrMsb,
        loc: Option<SourceLocation>,
    ) -> NodeRef {
        let width = self.bits_width(arg) + 1;
        self.add_node(Op::OneHot(priority), vec![arg], Type::Bits(width), loc)
    }

    pub fn one_hot_select(
        &mut self,
        selector: NodeRef,
        cases: Vec<NodeRef>,
        loc: Option<SourceLocation>,
    ) -> NodeRef {
        assert!(!cases.is_empty(), "one_hot_select needs at least one case");
        let ty = self.ty(cases[0]).clone();
        let mut operands = vec![selector];
        operands.extend(cases);
        self.add_node(Op::OneHotSelect, operands, ty, loc)
    }

    // ── aggregates ──────────────────────────────────────────────

    pub fn array(
        &mut self,
        members: Vec<NodeRef>,
        element_type: Type,
        loc: Option<SourceLocation>,
    ) -> NodeRef {
        let size = members.len();
        self.add_node(
            Op::Array,
            members,
            Type::Array {
                element: Box::new(element_type),
                size,
            },
            loc,
        )
    }

    pub fn array_concat(&mut self, parts: Vec<NodeRef>, loc: Option<SourceLocation>) -> NodeRef {
        assert!(!parts.is_empty(), "array_concat needs at least one operand");
        let (element, _) = self.array_parts(parts[0]);
        let size = parts.iter().map(|r| self.array_parts(*r).1).sum();
        self.add_node(
            Op::ArrayConcat,
            parts,
            Type::Array {
                element: Box::new(element),
                size,
            },
            loc,
        )
    }

    pub fn array_index(
        &mut self,
        array: NodeRef,
        index: NodeRef,
        loc: Option<SourceLocation>,
    ) -> NodeRef {
        let (element, _) = self.array_parts(array);
        self.add_node(Op::ArrayIndex, vec![array, index], element, loc)
    }

    pub fn array_update(
        &mut self,
        array: NodeRef,
        new_value: NodeRef,
        index: NodeRef,
        loc: Option<SourceLocation>,
    ) -> NodeRef {
        let ty = self.ty(array).clone();
        self.add_node(Op::ArrayUpdate, vec![array, new_value, index], ty, loc)
    }

    pub fn tuple(&mut self, members: Vec<NodeRef>, loc: Option<SourceLocation>) -> NodeRef {
        let ty = Type::Tuple(members.iter().map(|r| self.ty(*r).clone()).collect());
        self.add_node(Op::Tuple, members, ty, loc)
    }

    pub fn tuple_index(
        &mut self,
        tuple: NodeRef,
        index: usize,
        loc: Option<SourceLocation>,
    ) -> NodeRef {
        let ty = match self.ty(tuple) {
            Type::Tuple(members) => members[index].clone(),
            other => panic!("tuple_index on non-tuple type {}", other),
        };
        self.add_node(Op::TupleIndex(index), vec![tuple], ty, loc)
    }

    // ── selection and calls ─────────────────────────────────────

    pub fn select(
        &mut self,
        test: NodeRef,
        consequent: NodeRef,
        alternate: NodeRef,
        loc: Option<SourceLocation>,
    ) -> NodeRef {
        let ty = self.ty(consequent).clone();
        self.add_node(Op::Select, vec![test, consequent, alternate], ty, loc)
    }

    /// Priority-select over 1-bit selectors: the first true selector's value
    /// wins, `default` when none fire.
    pub fn match_true(
        &mut self,
        selectors: Vec<NodeRef>,
        values: Vec<NodeRef>,
        default: NodeRef,
        loc: Option<SourceLocation>,
    ) -> NodeRef {
        assert_eq!(
            selectors.len(),
            values.len(),
            "match_true selector/value count mismatch"
        );
        let arm_count = selectors.len();
        let ty = self.ty(default).clone();
        let mut operands = selectors;
        operands.extend(values);
        operands.push(default);
        self.add_node(Op::MatchTrue { arm_count }, operands, ty, loc)
    }

    /// Element-wise application of `callee` over an array argument.
    /// `return_type` is the callee's return type.
    pub fn map(
        &mut self,
        array: NodeRef,
        callee: FunctionRef,
        return_type: Type,
        loc: Option<SourceLocation>,
    ) -> NodeRef {
        let (_, size) = self.array_parts(array);
        self.add_node(
            Op::Map(callee),
            vec![array],
            Type::Array {
                element: Box::new(return_type),
                size,
            },
            loc,
        )
    }

    pub fn invoke(
        &mut self,
        args: Vec<NodeRef>,
        callee: FunctionRef,
        return_type: Type,
        loc: Option<SourceLocation>,
    ) -> NodeRef {
        self.add_node(Op::Invoke(callee), args, return_type, loc)
    }

    // ── node metadata ───────────────────────────────────────────

    pub fn set_name(&mut self, r: NodeRef, name: impl Into<String>) {
        self.function.nodes[r.0 as usize].name = Some(name.into());
    }

    pub fn has_assigned_name(&self, r: NodeRef) -> bool {
        self.function.node(r).name.is_some()
    }

    /// Assigned name, or `<mnemonic>.<id>` for anonymous nodes.
    pub fn get_name(&self, r: NodeRef) -> String {
        let node = self.function.node(r);
        match &node.name {
            Some(name) => name.clone(),
            None => format!("{}.{}", node.op.mnemonic(), r.0),
        }
    }

    pub fn get_type(&self, r: NodeRef) -> &Type {
        self.ty(r)
    }

    pub fn node(&self, r: NodeRef) -> &Node {
        self.function.node(r)
    }

    pub fn last_value(&self) -> Option<NodeRef> {
        match self.function.nodes.len() {
            0 => None,
            n => Some(NodeRef(n as u32 - 1)),
        }
    }

    /// Finish the function. The most recently added node becomes the return
    /// value.
    pub fn build(mut self) -> Result<IrFunction, PackageError> {
        let last = self
            .last_value()
            .ok_or_else(|| PackageError::EmptyFunction(self.function.name.clone()))?;
        self.function.return_value = Some(last);
        Ok(self.function)
    }
}
