// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Deterministic IR symbol names for surface functions.

use std::collections::BTreeSet;

use silica_types::SymbolicBindings;

use crate::error::{ConvertError, Result};

/// Mangle a surface function name into its IR package symbol.
///
/// The wire format is `__<module>__<fn>[__<v1>_<v2>_...]` with dots in the
/// module name replaced by underscores. Binding values are appended in the
/// order the bindings were supplied (the function's parametric declaration
/// order). It is an error for any free parametric key to be unbound.
pub fn mangle_name(
    function_name: &str,
    free_keys: &BTreeSet<String>,
    module_name: &str,
    symbolic_bindings: Option<&SymbolicBindings>,
) -> Result<String> {
    let mut binding_keys = BTreeSet::new();
    let mut values = Vec::new();
    if let Some(bindings) = symbolic_bindings {
        for b in bindings.bindings() {
            binding_keys.insert(b.identifier.clone());
            values.push(b.value);
        }
    }

    let unbound: Vec<&String> = free_keys.difference(&binding_keys).collect();
    if !unbound.is_empty() {
        let have: Vec<&String> = binding_keys.iter().collect();
        return Err(ConvertError::InvalidArgument(format!(
            "not enough symbolic bindings to convert function '{}'; need {:?} got {:?}",
            function_name, free_keys, have
        )));
    }

    let module_name = module_name.replace('.', "_");
    if values.is_empty() {
        return Ok(format!("__{}__{}", module_name, function_name));
    }
    let suffix = values
        .iter()
        .map(i64::to_string)
        .collect::<Vec<_>>()
        .join("_");
    Ok(format!("__{}__{}__{}", module_name, function_name, suffix))
}
