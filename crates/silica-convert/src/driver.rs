// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Module-level conversion drivers.
//!
//! Functions are converted in declaration order; lowering dependencies
//! across functions (a callee must be in the package before its callers)
//! is the caller's responsibility. Free names in a function body that
//! resolve to module constants are registered as constant dependencies so
//! they lower ahead of the body.

use std::collections::HashSet;

use silica_ast::decl::{Function, Module};
use silica_ast::expr::{Expr, ExprKind, IndexRhs, LeafPattern, NameDefTree, NameDefTreeKind};
use silica_ir::Package;
use silica_types::{SymbolicBindings, TypeInfo};

use crate::builtins::is_builtin_name;
use crate::error::{ConvertError, Result};
use crate::ir_converter::IrConverter;

/// Convert one function under the given bindings into `package`. Returns
/// the mangled name of the installed IR function.
pub fn convert_function_into_package(
    package: &mut Package,
    module: &Module,
    function: &Function,
    type_info: &TypeInfo,
    symbolic_bindings: Option<&SymbolicBindings>,
    emit_positions: bool,
) -> Result<String> {
    let binding_keys: HashSet<&str> = symbolic_bindings
        .map(|b| b.keys().collect())
        .unwrap_or_default();
    for key in function.free_parametric_keys() {
        if !binding_keys.contains(key.as_str()) {
            return Err(ConvertError::InvalidArgument(format!(
                "not enough symbolic bindings to convert function '{}'; '{}' is unbound",
                function.identifier(),
                key
            )));
        }
    }

    let mut converter = IrConverter::new(package, module, type_info, emit_positions);
    for name in free_variables(function) {
        if module.get_function(name).is_some()
            || module.has_type_definition(name)
            || module.find_import(name).is_some()
            || is_builtin_name(name)
        {
            continue;
        }
        if let Some(constant) = module.get_constant_def(name) {
            converter.add_constant_dep(constant);
            continue;
        }
        return Err(ConvertError::Unimplemented {
            span: function.span,
            message: format!(
                "cannot convert free variable '{}': neither a function nor a constant",
                name
            ),
        });
    }

    converter.convert_function(function, symbolic_bindings)
}

/// Convert every non-parametric function of `module`, in declaration
/// order. Parametric functions are converted per invocation by callers
/// that supply bindings.
pub fn convert_module_to_package(
    module: &Module,
    type_info: &TypeInfo,
    emit_positions: bool,
) -> Result<Package> {
    let mut package = Package::new(&module.name);
    for function in module.functions() {
        if function.is_parametric() {
            continue;
        }
        convert_function_into_package(
            &mut package,
            module,
            function,
            type_info,
            None,
            emit_positions,
        )?;
    }
    Ok(package)
}

/// Same as `convert_module_to_package`, but renders the IR text.
pub fn convert_module(module: &Module, type_info: &TypeInfo, emit_positions: bool) -> Result<String> {
    Ok(convert_module_to_package(module, type_info, emit_positions)?.to_string())
}

/// Convert a single named function and render the resulting package text.
pub fn convert_one_function(
    module: &Module,
    entry_function_name: &str,
    type_info: &TypeInfo,
    emit_positions: bool,
) -> Result<String> {
    let function = module.get_function(entry_function_name).ok_or_else(|| {
        ConvertError::InvalidArgument(format!(
            "module '{}' has no function named '{}'",
            module.name, entry_function_name
        ))
    })?;
    let mut package = Package::new(&module.name);
    convert_function_into_package(&mut package, module, function, type_info, None, emit_positions)?;
    Ok(package.to_string())
}

/// Names referenced by the body but not bound anywhere within the function.
fn free_variables(function: &Function) -> Vec<&str> {
    let mut defined: HashSet<&str> = HashSet::new();
    for param in &function.params {
        defined.insert(&param.name.identifier);
    }
    for binding in &function.parametric_bindings {
        defined.insert(&binding.name.identifier);
    }
    let mut referenced = Vec::new();
    walk_names(&function.body, &mut defined, &mut referenced);

    let mut seen = HashSet::new();
    referenced
        .into_iter()
        .filter(|name| !defined.contains(name) && seen.insert(*name))
        .collect()
}

fn walk_names<'e>(
    expr: &'e Expr,
    defined: &mut HashSet<&'e str>,
    referenced: &mut Vec<&'e str>,
) {
    match &expr.kind {
        ExprKind::Number(_) => {}
        ExprKind::NameRef(nr) | ExprKind::ConstRef(nr) => referenced.push(&nr.identifier),
        ExprKind::ColonRef(cr) => walk_names(&cr.subject, defined, referenced),
        ExprKind::Unop { operand, .. } => walk_names(operand, defined, referenced),
        ExprKind::Binop { lhs, rhs, .. } => {
            walk_names(lhs, defined, referenced);
            walk_names(rhs, defined, referenced);
        }
        ExprKind::Ternary {
            test,
            consequent,
            alternate,
        } => {
            walk_names(test, defined, referenced);
            walk_names(consequent, defined, referenced);
            walk_names(alternate, defined, referenced);
        }
        ExprKind::Tuple(members) => {
            for member in members {
                walk_names(member, defined, referenced);
            }
        }
        ExprKind::StructInstance(instance) => {
            for (_, member) in &instance.members {
                walk_names(member, defined, referenced);
            }
        }
        ExprKind::SplatStructInstance(instance) => {
            for (_, member) in &instance.members {
                walk_names(member, defined, referenced);
            }
            walk_names(&instance.splatted, defined, referenced);
        }
        ExprKind::Attr { lhs, .. } => walk_names(lhs, defined, referenced),
        ExprKind::Index { lhs, rhs } => {
            walk_names(lhs, defined, referenced);
            match rhs {
                IndexRhs::Expr(e) => walk_names(e, defined, referenced),
                IndexRhs::Slice(slice) => {
                    if let Some(start) = &slice.start {
                        walk_names(start, defined, referenced);
                    }
                    if let Some(limit) = &slice.limit {
                        walk_names(limit, defined, referenced);
                    }
                }
                IndexRhs::WidthSlice(ws) => walk_names(&ws.start, defined, referenced),
            }
        }
        ExprKind::Array(array) | ExprKind::ConstantArray(array) => {
            for member in &array.members {
                walk_names(member, defined, referenced);
            }
        }
        ExprKind::Cast { expr: operand, .. } => walk_names(operand, defined, referenced),
        ExprKind::Let(let_) => {
            collect_pattern_names(&let_.name_def_tree, defined, referenced);
            walk_names(&let_.rhs, defined, referenced);
            walk_names(&let_.body, defined, referenced);
        }
        ExprKind::Match(match_) => {
            walk_names(&match_.matched, defined, referenced);
            for arm in &match_.arms {
                for pattern in &arm.patterns {
                    collect_pattern_names(pattern, defined, referenced);
                }
                walk_names(&arm.expr, defined, referenced);
            }
        }
        ExprKind::Invocation(invocation) => {
            walk_names(&invocation.callee, defined, referenced);
            for arg in &invocation.args {
                walk_names(arg, defined, referenced);
            }
        }
    }
}

/// Names bound by a pattern go to `defined`; literal leaves may reference
/// outer names and are walked.
fn collect_pattern_names<'e>(
    tree: &'e NameDefTree,
    defined: &mut HashSet<&'e str>,
    referenced: &mut Vec<&'e str>,
) {
    match &tree.kind {
        NameDefTreeKind::Leaf(LeafPattern::NameDef(name_def)) => {
            defined.insert(&name_def.identifier);
        }
        NameDefTreeKind::Leaf(LeafPattern::Wildcard(_)) => {}
        NameDefTreeKind::Leaf(LeafPattern::Number(e))
        | NameDefTreeKind::Leaf(LeafPattern::ColonRef(e))
        | NameDefTreeKind::Leaf(LeafPattern::NameRef(e)) => walk_names(e, defined, referenced),
        NameDefTreeKind::Branch(children) => {
            for child in children {
                collect_pattern_names(child, defined, referenced);
            }
        }
    }
}
