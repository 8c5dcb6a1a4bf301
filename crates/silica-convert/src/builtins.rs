// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Invocation lowering: named builtins, higher-order `map`, and calls to
//! package functions.

use std::collections::BTreeSet;

use log::{debug, trace};

use silica_ast::decl::Module;
use silica_ast::expr::{Expr, ExprKind, Invocation, TypeAnnotation};
use silica_ir::{
    BinaryOp, FunctionBuilder, FunctionRef, LsbOrMsb, Type, UnaryOp,
};
use silica_types::SymbolicBindings;

use crate::error::{internal, ConvertError, Result};
use crate::ir_converter::IrConverter;
use crate::mangle::mangle_name;

/// Names the converter recognizes as builtins. Free references to these are
/// not constant dependencies.
pub(crate) const BUILTIN_NAMES: &[&str] = &[
    "and_reduce",
    "bit_slice",
    "clz",
    "ctz",
    "fail!",
    "map",
    "one_hot",
    "one_hot_sel",
    "or_reduce",
    "rev",
    "sge",
    "sgt",
    "signex",
    "sle",
    "slt",
    "trace",
    "update",
    "xor_reduce",
];

/// Builtins whose body is polymorphic over the argument type; `map` wraps
/// these in a synthesized single-parameter function.
const PARAMETRIC_BUILTINS: &[&str] = &["clz", "ctz"];

pub(crate) fn is_builtin_name(name: &str) -> bool {
    BUILTIN_NAMES.contains(&name)
}

impl<'a> IrConverter<'a> {
    /// Resolve the callee of an invocation to the name it is called by in
    /// the IR: a mangled package symbol for module functions, the plain
    /// name for builtins.
    pub(crate) fn get_callee_identifier(
        &self,
        node: &'a Expr,
        invocation: &'a Invocation,
    ) -> Result<String> {
        let (callee_name, module): (&str, &Module) = match &invocation.callee.kind {
            ExprKind::NameRef(nr) => (nr.identifier.as_str(), self.module),
            ExprKind::ColonRef(cr) => {
                let subject = cr
                    .subject_identifier()
                    .ok_or_else(|| internal("colon-ref callee subject is not a plain name"))?;
                let import = self
                    .module
                    .find_import(subject)
                    .ok_or_else(|| internal("colon-ref callee subject is not an import"))?;
                (cr.attr.as_str(), self.imported_module(import.id)?)
            }
            _ => return Err(internal("invalid invocation callee")),
        };

        let Some(function) = module.get_function(callee_name) else {
            // Builtins are not module functions; the plain name stands.
            return Ok(callee_name.to_string());
        };
        let free_keys: BTreeSet<String> = function.free_parametric_keys().into_iter().collect();
        if !function.is_parametric() {
            return mangle_name(function.identifier(), &free_keys, &module.name, None);
        }
        let bindings = self
            .type_info
            .get_invocation_bindings(node.id)
            .ok_or_else(|| {
                internal(format!(
                    "no resolved bindings for parametric invocation of '{}'",
                    callee_name
                ))
            })?;
        trace!("invocation {:?} symbolic bindings {}", node.id, bindings);
        if bindings.is_empty() {
            return Err(internal(format!(
                "resolved bindings for parametric invocation of '{}' are empty",
                callee_name
            )));
        }
        mangle_name(function.identifier(), &free_keys, &module.name, Some(bindings))
    }

    pub(crate) fn handle_invocation(
        &mut self,
        node: &'a Expr,
        invocation: &'a Invocation,
    ) -> Result<()> {
        let called_name = self.get_callee_identifier(node, invocation)?;
        match called_name.as_str() {
            "fail!" | "trace" => {
                self.accept_args(invocation)?;
                self.expect_arity(invocation, 1, &called_name)?;
                let arg = self.use_node(invocation.args[0].id)?;
                self.def(node.id, node.span, |fb, loc| fb.identity(arg, loc))?;
                Ok(())
            }
            "clz" => self.handle_builtin_unop(node, invocation, UnaryOp::Clz, "clz"),
            "ctz" => self.handle_builtin_unop(node, invocation, UnaryOp::Ctz, "ctz"),
            "rev" => self.handle_builtin_unop(node, invocation, UnaryOp::Reverse, "rev"),
            "and_reduce" => {
                self.handle_builtin_unop(node, invocation, UnaryOp::AndReduce, "and_reduce")
            }
            "or_reduce" => {
                self.handle_builtin_unop(node, invocation, UnaryOp::OrReduce, "or_reduce")
            }
            "xor_reduce" => {
                self.handle_builtin_unop(node, invocation, UnaryOp::XorReduce, "xor_reduce")
            }
            "sgt" => self.handle_scmp(node, invocation, BinaryOp::SGt),
            "sge" => self.handle_scmp(node, invocation, BinaryOp::SGe),
            "slt" => self.handle_scmp(node, invocation, BinaryOp::SLt),
            "sle" => self.handle_scmp(node, invocation, BinaryOp::SLe),
            "update" => self.handle_builtin_update(node, invocation),
            "signex" => self.handle_builtin_signex(node, invocation),
            "one_hot" => self.handle_builtin_one_hot(node, invocation),
            "one_hot_sel" => self.handle_builtin_one_hot_sel(node, invocation),
            "bit_slice" => self.handle_builtin_bit_slice(node, invocation),
            "map" => self.handle_map(node, invocation),
            _ => self.handle_package_call(node, invocation, &called_name),
        }
    }

    /// Lower every argument expression.
    fn accept_args(&mut self, invocation: &'a Invocation) -> Result<()> {
        for arg in &invocation.args {
            self.visit_expr(arg)?;
        }
        Ok(())
    }

    fn expect_arity(&self, invocation: &Invocation, arity: usize, name: &str) -> Result<()> {
        if invocation.args.len() != arity {
            return Err(internal(format!(
                "{} expects {} argument(s), got {}",
                name,
                arity,
                invocation.args.len()
            )));
        }
        Ok(())
    }

    fn handle_builtin_unop(
        &mut self,
        node: &'a Expr,
        invocation: &'a Invocation,
        op: UnaryOp,
        name: &str,
    ) -> Result<()> {
        self.accept_args(invocation)?;
        self.expect_arity(invocation, 1, name)?;
        let arg = self.use_node(invocation.args[0].id)?;
        self.def(node.id, node.span, |fb, loc| fb.add_unop(op, arg, loc))?;
        Ok(())
    }

    fn handle_scmp(
        &mut self,
        node: &'a Expr,
        invocation: &'a Invocation,
        op: BinaryOp,
    ) -> Result<()> {
        self.accept_args(invocation)?;
        self.expect_arity(invocation, 2, "signed comparison")?;
        let lhs = self.use_node(invocation.args[0].id)?;
        let rhs = self.use_node(invocation.args[1].id)?;
        self.def(node.id, node.span, |fb, loc| {
            fb.add_binop(op, lhs, rhs, loc)
        })?;
        Ok(())
    }

    fn handle_builtin_update(&mut self, node: &'a Expr, invocation: &'a Invocation) -> Result<()> {
        self.accept_args(invocation)?;
        self.expect_arity(invocation, 3, "update")?;
        let arg = self.use_node(invocation.args[0].id)?;
        let index = self.use_node(invocation.args[1].id)?;
        let new_value = self.use_node(invocation.args[2].id)?;
        self.def(node.id, node.span, |fb, loc| {
            fb.array_update(arg, new_value, index, loc)
        })?;
        Ok(())
    }

    fn handle_builtin_signex(&mut self, node: &'a Expr, invocation: &'a Invocation) -> Result<()> {
        self.accept_args(invocation)?;
        self.expect_arity(invocation, 2, "signex")?;
        let arg = self.use_node(invocation.args[0].id)?;
        // The _type_ of the second argument gives the new bit count, not
        // its value.
        let ExprKind::Number(number) = &invocation.args[1].kind else {
            return Err(internal("signex width argument must be a number literal"));
        };
        let Some(TypeAnnotation::Builtin { bit_count, .. }) = &number.type_annotation else {
            return Err(internal("signex width argument has no builtin type annotation"));
        };
        let new_bit_count = *bit_count;
        self.def(node.id, node.span, |fb, loc| {
            fb.sign_extend(arg, new_bit_count, loc)
        })?;
        Ok(())
    }

    fn handle_builtin_one_hot(&mut self, node: &'a Expr, invocation: &'a Invocation) -> Result<()> {
        self.accept_args(invocation)?;
        self.expect_arity(invocation, 2, "one_hot")?;
        let input = self.use_node(invocation.args[0].id)?;
        let lsb_prio = self.get_const_bits(invocation.args[1].id)?;
        let priority = if lsb_prio.is_zero() {
            LsbOrMsb::Msb
        } else {
            LsbOrMsb::Lsb
        };
        self.def(node.id, node.span, |fb, loc| {
            fb.one_hot(input, priority, loc)
        })?;
        Ok(())
    }

    fn handle_builtin_one_hot_sel(
        &mut self,
        node: &'a Expr,
        invocation: &'a Invocation,
    ) -> Result<()> {
        self.accept_args(invocation)?;
        self.expect_arity(invocation, 2, "one_hot_sel")?;
        let selector = self.use_node(invocation.args[0].id)?;
        // Cases come from the array-literal AST node, not the value domain.
        let ExprKind::Array(array) = &invocation.args[1].kind else {
            return Err(internal("one_hot_sel cases must be an array literal"));
        };
        let mut cases = Vec::with_capacity(array.members.len());
        for case in &array.members {
            cases.push(self.use_node(case.id)?);
        }
        self.def(node.id, node.span, move |fb, loc| {
            fb.one_hot_select(selector, cases, loc)
        })?;
        Ok(())
    }

    fn handle_builtin_bit_slice(
        &mut self,
        node: &'a Expr,
        invocation: &'a Invocation,
    ) -> Result<()> {
        self.accept_args(invocation)?;
        self.expect_arity(invocation, 3, "bit_slice")?;
        let arg = self.use_node(invocation.args[0].id)?;
        let start = self.const_arg_as_usize(&invocation.args[1], "bit_slice start")?;
        let width = self.const_arg_as_usize(&invocation.args[2], "bit_slice width")?;
        self.def(node.id, node.span, |fb, loc| {
            fb.bit_slice(arg, start, width, loc)
        })?;
        Ok(())
    }

    fn const_arg_as_usize(&self, arg: &Expr, what: &str) -> Result<usize> {
        let bits = self.get_const_bits(arg.id)?;
        let value = bits
            .to_u64()
            .ok_or_else(|| internal(format!("{} does not fit in 64 bits", what)))?;
        Ok(value as usize)
    }

    /// Invocation of a function already lowered into the package.
    fn handle_package_call(
        &mut self,
        node: &'a Expr,
        invocation: &'a Invocation,
        called_name: &str,
    ) -> Result<()> {
        let (callee, return_type) = {
            let function =
                self.package
                    .get_function(called_name)
                    .ok_or_else(|| ConvertError::Conversion {
                        span: Some(node.span),
                        message: format!(
                            "failed to resolve function '{}' for invocation",
                            called_name
                        ),
                    })?;
            let return_type = function
                .return_type()
                .cloned()
                .ok_or_else(|| internal(format!("function '{}' has no return value", called_name)))?;
            (FunctionRef::new(called_name), return_type)
        };
        self.accept_args(invocation)?;
        let mut args = Vec::with_capacity(invocation.args.len());
        for arg in &invocation.args {
            args.push(self.use_node(arg.id)?);
        }
        self.def(node.id, node.span, move |fb, loc| {
            fb.invoke(args, callee, return_type, loc)
        })?;
        Ok(())
    }

    // ── map ─────────────────────────────────────────────────────

    pub(crate) fn handle_map(&mut self, node: &'a Expr, invocation: &'a Invocation) -> Result<()> {
        self.expect_arity(invocation, 2, "map")?;
        // The trailing argument names the mapped function; it is not
        // lowered as a value.
        for arg in &invocation.args[..invocation.args.len() - 1] {
            self.visit_expr(arg)?;
        }
        let arg = self.use_node(invocation.args[0].id)?;
        let fn_node = &invocation.args[1];
        let bindings = self.type_info.get_invocation_bindings(node.id).cloned();

        let (map_fn_name, lookup_module): (&str, &Module) = match &fn_node.kind {
            ExprKind::NameRef(nr) => {
                if PARAMETRIC_BUILTINS.contains(&nr.identifier.as_str()) {
                    debug!("map of parametric builtin: {}", nr.identifier);
                    return self.def_map_with_builtin(
                        node,
                        &nr.identifier,
                        &invocation.args[0],
                        bindings.unwrap_or_default(),
                    );
                }
                (nr.identifier.as_str(), self.module)
            }
            ExprKind::ColonRef(cr) => {
                let subject = cr
                    .subject_identifier()
                    .ok_or_else(|| internal("map callee subject is not a plain name"))?;
                let import = self
                    .module
                    .find_import(subject)
                    .ok_or_else(|| internal("map callee subject is not an import"))?;
                (cr.attr.as_str(), self.imported_module(import.id)?)
            }
            _ => {
                return Err(ConvertError::Unimplemented {
                    span: fn_node.span,
                    message: "unhandled function mapping".to_string(),
                })
            }
        };

        let mapped_fn = lookup_module.get_function(map_fn_name).ok_or_else(|| {
            internal(format!(
                "module '{}' has no function '{}' to map",
                lookup_module.name, map_fn_name
            ))
        })?;
        if mapped_fn.is_parametric() && bindings.is_none() {
            return Err(internal(format!(
                "no resolved bindings for map of parametric function '{}'",
                map_fn_name
            )));
        }
        let free_keys: BTreeSet<String> = mapped_fn.free_parametric_keys().into_iter().collect();
        let mangled = mangle_name(
            mapped_fn.identifier(),
            &free_keys,
            &lookup_module.name,
            bindings.as_ref(),
        )?;
        debug!(
            "map: getting function '{}' from package '{}'",
            mangled,
            self.package.name()
        );
        let (callee, return_type) = self.mapped_function_parts(&mangled)?;
        self.def(node.id, node.span, move |fb, loc| {
            fb.map(arg, callee, return_type, loc)
        })?;
        Ok(())
    }

    /// Map over a parametric builtin: synthesize a single-parameter wrapper
    /// in the package (idempotent per mangled name) and map over that.
    fn def_map_with_builtin(
        &mut self,
        parent: &'a Expr,
        builtin_name: &str,
        arg_node: &'a Expr,
        bindings: SymbolicBindings,
    ) -> Result<()> {
        let mangled = mangle_name(
            builtin_name,
            &BTreeSet::new(),
            &self.module.name,
            Some(&bindings),
        )?;
        let arg_value = self.use_node(arg_node.id)?;
        let element_type = match self.fb()?.get_type(arg_value) {
            Type::Array { element, .. } => (**element).clone(),
            other => {
                return Err(internal(format!(
                    "map argument must be an array, got {}",
                    other
                )))
            }
        };

        if !self.package.has_function_with_name(&mangled) {
            let mut fb = FunctionBuilder::new(&mangled);
            let param = fb.param("arg", element_type);
            match builtin_name {
                "clz" => fb.clz(param, None),
                "ctz" => fb.ctz(param, None),
                _ => {
                    return Err(internal(format!(
                        "invalid builtin name for map: {}",
                        builtin_name
                    )))
                }
            };
            self.package.add_function(fb.build()?)?;
        }

        let (callee, return_type) = self.mapped_function_parts(&mangled)?;
        self.def(parent.id, parent.span, move |fb, loc| {
            fb.map(arg_value, callee, return_type, loc)
        })?;
        Ok(())
    }

    fn mapped_function_parts(&self, mangled: &str) -> Result<(FunctionRef, Type)> {
        let function = self
            .package
            .get_function(mangled)
            .ok_or_else(|| ConvertError::NotFound(format!("package has no function '{}'", mangled)))?;
        let return_type = function
            .return_type()
            .cloned()
            .ok_or_else(|| internal(format!("function '{}' has no return value", mangled)))?;
        Ok((FunctionRef::new(mangled), return_type))
    }
}
