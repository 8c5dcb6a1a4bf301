// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Read-only table of type-checking results, keyed by AST node id.

use std::collections::HashMap;
use std::sync::Arc;

use silica_ast::decl::Module;
use silica_ast::NodeId;

use crate::bindings::SymbolicBindings;
use crate::types::ConcreteType;

/// Pre-computed bounds of a compile-time bit slice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StartAndWidth {
    pub start: i64,
    pub width: i64,
}

/// Results of type checking a module, consumed read-only by IR conversion.
///
/// Entries for nodes of imported modules live in the same table; imports are
/// resolved ahead of conversion.
#[derive(Debug, Default)]
pub struct TypeInfo {
    types: HashMap<NodeId, ConcreteType>,
    imports: HashMap<NodeId, Arc<Module>>,
    invocation_bindings: HashMap<NodeId, SymbolicBindings>,
    slice_bounds: HashMap<NodeId, HashMap<SymbolicBindings, StartAndWidth>>,
}

impl TypeInfo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_type(&mut self, node: NodeId, ty: ConcreteType) {
        self.types.insert(node, ty);
    }

    pub fn get_type(&self, node: NodeId) -> Option<&ConcreteType> {
        self.types.get(&node)
    }

    /// Record the module an `Import` declaration resolves to.
    pub fn add_import(&mut self, import_node: NodeId, module: Arc<Module>) {
        self.imports.insert(import_node, module);
    }

    pub fn get_imported(&self, import_node: NodeId) -> Option<&Arc<Module>> {
        self.imports.get(&import_node)
    }

    /// Record the callee bindings resolved for a parametric invocation.
    pub fn set_invocation_bindings(&mut self, invocation: NodeId, bindings: SymbolicBindings) {
        self.invocation_bindings.insert(invocation, bindings);
    }

    pub fn get_invocation_bindings(&self, invocation: NodeId) -> Option<&SymbolicBindings> {
        self.invocation_bindings.get(&invocation)
    }

    /// Record pre-computed slice bounds for a `Slice` node under a
    /// particular set of symbolic bindings.
    pub fn set_slice_start_and_width(
        &mut self,
        slice: NodeId,
        bindings: SymbolicBindings,
        bounds: StartAndWidth,
    ) {
        self.slice_bounds
            .entry(slice)
            .or_default()
            .insert(bindings, bounds);
    }

    pub fn get_slice_start_and_width(
        &self,
        slice: NodeId,
        bindings: &SymbolicBindings,
    ) -> Option<StartAndWidth> {
        self.slice_bounds.get(&slice)?.get(bindings).copied()
    }
}
