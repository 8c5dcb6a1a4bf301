// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Match-expression compilation.
//!
//! Each non-default arm compiles to a 1-bit selector plus a value; the
//! trailing irrefutable arm supplies the default. The whole match becomes a
//! single `MatchTrue` op.

use silica_ast::expr::{Expr, ExprKind, LeafPattern, Match, NameDefTree, NameDefTreeKind};
use silica_ir::{Bits, NaryOp, NodeRef, Value};
use silica_types::ConcreteType;

use crate::error::{internal, ConvertError, Result};
use crate::ir_converter::{IrConverter, IrValue};

fn literal_true() -> Value {
    Value::Bits(Bits::from_bool(true))
}

impl<'a> IrConverter<'a> {
    pub(crate) fn handle_match(&mut self, node: &'a Expr, match_: &'a Match) -> Result<()> {
        let last_is_irrefutable = match_
            .arms
            .last()
            .and_then(|arm| arm.patterns.first())
            .map(NameDefTree::is_irrefutable)
            .unwrap_or(false);
        if !last_is_irrefutable {
            return Err(ConvertError::Unimplemented {
                span: node.span,
                message: "only matches with trailing irrefutable patterns are supported for IR \
                          conversion"
                    .to_string(),
            });
        }

        self.visit_expr(&match_.matched)?;
        let matched = self.use_node(match_.matched.id)?;
        let matched_type = self.resolve_type(match_.matched.id, match_.matched.span)?;

        let default_arm = match_
            .arms
            .last()
            .ok_or_else(|| internal("match with no arms"))?;
        if default_arm.patterns.len() != 1 {
            return Err(ConvertError::Unimplemented {
                span: node.span,
                message: "multiple patterns in the default arm are not supported for IR \
                          conversion"
                    .to_string(),
            });
        }
        self.handle_matcher(&default_arm.patterns[0], matched, &matched_type)?;
        self.visit_expr(&default_arm.expr)?;

        let mut arm_selectors = Vec::new();
        let mut arm_values = Vec::new();
        for arm in &match_.arms[..match_.arms.len() - 1] {
            let mut this_arm_selectors = Vec::new();
            for pattern in &arm.patterns {
                this_arm_selectors.push(self.handle_matcher(pattern, matched, &matched_type)?);
            }
            // Or together this arm's patterns to decide whether it fires.
            let selector = match this_arm_selectors.len() {
                0 => return Err(internal("match arm has no patterns")),
                1 => this_arm_selectors[0],
                _ => {
                    let loc = self.to_source_location(arm.span);
                    self.fb_mut()?.add_nary_op(NaryOp::Or, this_arm_selectors, loc)
                }
            };
            arm_selectors.push(selector);
            self.visit_expr(&arm.expr)?;
            arm_values.push(self.use_node(arm.expr.id)?);
        }

        // selectors: [matched == p0, matched == p1, ...]
        // values:    [arm0,          arm1,          ...]
        // default:   the trailing irrefutable arm's value
        let default_value = self.use_node(default_arm.expr.id)?;
        let result = self
            .fb_mut()?
            .match_true(arm_selectors, arm_values, default_value, None);
        self.set_node_to_ir(node.id, IrValue::Computed(result));
        self.last_expression = Some(node);
        Ok(())
    }

    /// Compile one pattern to a 1-bit selector against `matched_value`.
    /// Fresh bindings are defined as a side effect.
    fn handle_matcher(
        &mut self,
        matcher: &'a NameDefTree,
        matched_value: NodeRef,
        matched_type: &ConcreteType,
    ) -> Result<NodeRef> {
        match &matcher.kind {
            NameDefTreeKind::Leaf(LeafPattern::Wildcard(_)) => {
                self.def(matcher.id, matcher.span, |fb, loc| {
                    fb.literal(literal_true(), loc)
                })
            }
            NameDefTreeKind::Leaf(LeafPattern::Number(expr))
            | NameDefTreeKind::Leaf(LeafPattern::ColonRef(expr)) => {
                self.visit_expr(expr)?;
                let to_match = self.use_node(expr.id)?;
                self.def(matcher.id, matcher.span, |fb, loc| {
                    fb.eq(to_match, matched_value, loc)
                })
            }
            NameDefTreeKind::Leaf(LeafPattern::NameRef(expr)) => {
                // Compare for equivalence with an already-bound name.
                let ExprKind::NameRef(name_ref) = &expr.kind else {
                    return Err(internal("name-ref pattern does not hold a name reference"));
                };
                let to_match = self.use_node(name_ref.name_def)?;
                let result = self.def(matcher.id, matcher.span, |fb, loc| {
                    fb.eq(to_match, matched_value, loc)
                })?;
                self.def_alias(name_ref.name_def, expr.id)?;
                Ok(result)
            }
            NameDefTreeKind::Leaf(LeafPattern::NameDef(name_def)) => {
                let ok = self.def(name_def.id, name_def.span, |fb, loc| {
                    fb.literal(literal_true(), loc)
                })?;
                self.set_node_to_ir(matcher.id, IrValue::Computed(matched_value));
                self.set_node_to_ir(name_def.id, IrValue::Computed(matched_value));
                Ok(ok)
            }
            NameDefTreeKind::Branch(children) => {
                let ConcreteType::Tuple { members } = matched_type else {
                    return Err(internal("tuple pattern against a non-tuple type"));
                };
                if members.len() != children.len() {
                    return Err(internal(format!(
                        "tuple pattern arity {} does not match type arity {}",
                        children.len(),
                        members.len()
                    )));
                }
                let mut ok = self.fb_mut()?.literal(literal_true(), None);
                for (i, child) in children.iter().enumerate() {
                    let member = self.fb_mut()?.tuple_index(matched_value, i, None);
                    let cond = self.handle_matcher(child, member, &members[i].ty)?;
                    ok = self.fb_mut()?.and(ok, cond, None);
                }
                Ok(ok)
            }
        }
    }
}
