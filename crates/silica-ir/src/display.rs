// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Text rendering of packages and functions.
//!
//! One line per node: `name: type = op(operands, attributes)`. The format is
//! stable; tests and downstream tooling match on it.

use std::fmt;

use crate::function::{IrFunction, LsbOrMsb, Node, NodeRef, Op};
use crate::package::Package;

fn node_name(f: &IrFunction, r: NodeRef) -> String {
    let node = f.node(r);
    match &node.name {
        Some(name) => name.clone(),
        None => format!("{}.{}", node.op.mnemonic(), r.0),
    }
}

fn write_attributes(f: &mut fmt::Formatter<'_>, node: &Node, lead: bool) -> fmt::Result {
    let mut sep = if lead { ", " } else { "" };
    let mut item = |f: &mut fmt::Formatter<'_>, s: String| -> fmt::Result {
        write!(f, "{}{}", sep, s)?;
        sep = ", ";
        Ok(())
    };
    match &node.op {
        Op::Literal(value) => item(f, format!("value={}", value))?,
        Op::TupleIndex(index) => item(f, format!("index={}", index))?,
        Op::BitSlice { start, width } => {
            item(f, format!("start={}", start))?;
            item(f, format!("width={}", width))?;
        }
        Op::DynamicBitSlice { width } => item(f, format!("width={}", width))?,
        Op::SignExtend { new_width } | Op::ZeroExtend { new_width } => {
            item(f, format!("new_bit_count={}", new_width))?
        }
        Op::OneHot(priority) => item(
            f,
            format!(
                "lsb_prio={}",
                match priority {
                    LsbOrMsb::Lsb => "true",
                    LsbOrMsb::Msb => "false",
                }
            ),
        )?,
        Op::Map(callee) | Op::Invoke(callee) => item(f, format!("to_apply={}", callee.name))?,
        _ => {}
    }
    Ok(())
}

impl fmt::Display for IrFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "fn {}(", self.name)?;
        for (i, p) in self.params.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}: {}", node_name(self, *p), self.node(*p).ty)?;
        }
        write!(f, ")")?;
        if let Some(ret) = self.return_type() {
            write!(f, " -> {}", ret)?;
        }
        writeln!(f, " {{")?;
        for i in 0..self.nodes.len() {
            let r = NodeRef(i as u32);
            let node = self.node(r);
            if matches!(node.op, Op::Param) {
                continue;
            }
            let is_ret = self.return_value == Some(r);
            write!(
                f,
                "  {}{}: {} = {}(",
                if is_ret { "ret " } else { "" },
                node_name(self, r),
                node.ty,
                node.op.mnemonic()
            )?;
            for (i, operand) in node.operands.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{}", node_name(self, *operand))?;
            }
            write_attributes(f, node, !node.operands.is_empty())?;
            writeln!(f, ")")?;
        }
        writeln!(f, "}}")
    }
}

impl fmt::Display for Package {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "package {}", self.name())?;
        for function in self.functions() {
            writeln!(f)?;
            write!(f, "{}", function)?;
        }
        Ok(())
    }
}
