// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! The per-function conversion engine.
//!
//! One `IrConverter` lowers one surface function into one IR function. It
//! holds the name environment (AST node id → IR value) for the duration of
//! that lowering; the package and type table outlive it and are shared.

use std::collections::{BTreeSet, HashMap, HashSet};

use log::{debug, trace};

use silica_ast::decl::{ConstantDef, EnumDef, Function, Module, NameDef, Param, StructDef,
                       TypeDefinition};
use silica_ast::expr::{Expr, ExprKind};
use silica_ast::{NodeId, Span};
use silica_interp::InterpValue;
use silica_ir::{Bits, Fileno, FunctionBuilder, NodeRef, Package, SourceLocation, Type, Value};
use silica_types::{ConcreteType, Dim, SymbolicBindings, TypeInfo};

use crate::error::{internal, ConvertError, Result};
use crate::mangle::mangle_name;

/// What an AST node lowered to.
#[derive(Debug, Clone, PartialEq)]
pub enum IrValue {
    /// Handle to a node in the function under construction.
    Computed(NodeRef),
    /// Compile-time value plus the literal node that materialized it.
    Constant { value: Value, node: NodeRef },
}

impl IrValue {
    /// The IR node handle, for either variant.
    pub fn node(&self) -> NodeRef {
        match self {
            IrValue::Computed(r) => *r,
            IrValue::Constant { node, .. } => *node,
        }
    }
}

/// A struct or enum definition reached through a typedef chain.
pub(crate) enum DerefVariant<'a> {
    Struct(&'a StructDef),
    Enum(&'a EnumDef),
}

pub struct IrConverter<'a> {
    pub(crate) package: &'a mut Package,
    pub(crate) module: &'a Module,
    pub(crate) type_info: &'a TypeInfo,
    pub(crate) emit_positions: bool,
    pub(crate) fileno: Fileno,
    pub(crate) function_builder: Option<FunctionBuilder>,
    node_to_ir: HashMap<NodeId, IrValue>,
    pub(crate) symbolic_bindings: SymbolicBindings,
    constant_deps: Vec<&'a ConstantDef>,
    pub(crate) last_expression: Option<&'a Expr>,
}

impl<'a> IrConverter<'a> {
    pub fn new(
        package: &'a mut Package,
        module: &'a Module,
        type_info: &'a TypeInfo,
        emit_positions: bool,
    ) -> Self {
        let fileno = package.get_or_create_fileno(&format!("{}.x", module.name));
        trace!("constructed IR converter for module '{}'", module.name);
        IrConverter {
            package,
            module,
            type_info,
            emit_positions,
            fileno,
            function_builder: None,
            node_to_ir: HashMap::new(),
            symbolic_bindings: SymbolicBindings::default(),
            constant_deps: Vec::new(),
            last_expression: None,
        }
    }

    /// Record a module-level constant to lower before the function body.
    pub fn add_constant_dep(&mut self, constant: &'a ConstantDef) {
        trace!("adding constant dep: {}", constant.name.identifier);
        self.constant_deps.push(constant);
    }

    /// Install the function builder. Exactly once per converter.
    pub fn instantiate_function_builder(&mut self, mangled_name: &str) -> Result<()> {
        if self.function_builder.is_some() {
            return Err(internal("function builder already instantiated"));
        }
        self.function_builder = Some(FunctionBuilder::new(mangled_name));
        Ok(())
    }

    pub fn set_symbolic_bindings(&mut self, bindings: SymbolicBindings) {
        self.symbolic_bindings = bindings;
    }

    /// The current bindings with module-level constant identifiers removed;
    /// this is the cache key shape the type table uses for slice bounds.
    pub fn get_symbolic_bindings_tuple(&self) -> SymbolicBindings {
        let module_constants: HashSet<&str> = self
            .module
            .constant_defs()
            .map(|c| c.name.identifier.as_str())
            .collect();
        self.symbolic_bindings.without_keys(&module_constants)
    }

    // ── name environment ────────────────────────────────────────

    pub fn set_node_to_ir(&mut self, node: NodeId, value: IrValue) {
        trace!("setting node {:?} to {:?}", node, value);
        self.node_to_ir.insert(node, value);
    }

    pub fn get_node_to_ir(&self, node: NodeId) -> Option<&IrValue> {
        self.node_to_ir.get(&node)
    }

    /// The IR node handle an AST node lowered to. Constants resolve to
    /// their literal node.
    pub fn use_node(&self, node: NodeId) -> Result<NodeRef> {
        match self.node_to_ir.get(&node) {
            Some(value) => Ok(value.node()),
            None => Err(ConvertError::NotFound(format!(
                "AST node {} was used before it was defined",
                node.0
            ))),
        }
    }

    /// Copy `from`'s value under `to`.
    pub fn def_alias(&mut self, from: NodeId, to: NodeId) -> Result<NodeRef> {
        let value = self
            .node_to_ir
            .get(&from)
            .cloned()
            .ok_or_else(|| internal(format!("could not find AST node {} for aliasing", from.0)))?;
        trace!("aliased node {:?} to be same as {:?}", to, from);
        self.node_to_ir.insert(to, value);
        self.use_node(to)
    }

    /// Copy `from`'s value under a name definition, propagating the
    /// identifier as the IR node's debug name when the value is computed.
    pub fn def_alias_to_name_def(&mut self, from: NodeId, to: &NameDef) -> Result<NodeRef> {
        let value = self
            .node_to_ir
            .get(&from)
            .cloned()
            .ok_or_else(|| internal(format!("could not find AST node {} for aliasing", from.0)))?;
        if let IrValue::Computed(r) = value {
            self.fb_mut()?.set_name(r, &to.identifier);
        }
        self.node_to_ir.insert(to.id, value);
        self.use_node(to.id)
    }

    /// Run `f` against the function builder and record the resulting node
    /// under `node`. The source location is derived from `span` when
    /// position emission is on.
    pub fn def<F>(&mut self, node: NodeId, span: Span, f: F) -> Result<NodeRef>
    where
        F: FnOnce(&mut FunctionBuilder, Option<SourceLocation>) -> NodeRef,
    {
        self.def_with_status(node, span, |fb, loc| Ok(f(fb, loc)))
    }

    pub fn def_with_status<F>(&mut self, node: NodeId, span: Span, f: F) -> Result<NodeRef>
    where
        F: FnOnce(&mut FunctionBuilder, Option<SourceLocation>) -> Result<NodeRef>,
    {
        let loc = self.to_source_location(span);
        let fb = self
            .function_builder
            .as_mut()
            .ok_or_else(|| internal("no function builder instantiated"))?;
        let result = f(fb, loc)?;
        trace!("defined node {:?} as {:?}", node, result);
        self.node_to_ir.insert(node, IrValue::Computed(result));
        Ok(result)
    }

    /// Emit a literal and record a constant entry for `node`.
    pub fn def_const(&mut self, node: NodeId, span: Span, value: Value) -> Result<NodeRef> {
        let literal_value = value.clone();
        let result = self.def(node, span, move |fb, loc| fb.literal(literal_value, loc))?;
        self.node_to_ir
            .insert(node, IrValue::Constant { value, node: result });
        Ok(result)
    }

    pub fn is_constant(&self, node: NodeId) -> bool {
        matches!(self.node_to_ir.get(&node), Some(IrValue::Constant { .. }))
    }

    pub fn get_const_value(&self, node: NodeId) -> Result<Value> {
        match self.node_to_ir.get(&node) {
            None => Err(internal(format!(
                "AST node {} has no associated IR value",
                node.0
            ))),
            Some(IrValue::Computed(_)) => Err(internal(format!(
                "AST node {} has a non-constant IR value",
                node.0
            ))),
            Some(IrValue::Constant { value, .. }) => Ok(value.clone()),
        }
    }

    pub fn get_const_bits(&self, node: NodeId) -> Result<Bits> {
        let value = self.get_const_value(node)?;
        value
            .bits()
            .cloned()
            .ok_or_else(|| internal(format!("constant for AST node {} is not bits", node.0)))
    }

    // ── builder access ──────────────────────────────────────────

    pub(crate) fn fb_mut(&mut self) -> Result<&mut FunctionBuilder> {
        self.function_builder
            .as_mut()
            .ok_or_else(|| internal("no function builder instantiated"))
    }

    pub(crate) fn fb(&self) -> Result<&FunctionBuilder> {
        self.function_builder
            .as_ref()
            .ok_or_else(|| internal("no function builder instantiated"))
    }

    pub(crate) fn to_source_location(&self, span: Span) -> Option<SourceLocation> {
        if !self.emit_positions {
            return None;
        }
        Some(SourceLocation {
            fileno: self.fileno,
            start: span.start,
            end: span.end,
        })
    }

    // ── type resolution ─────────────────────────────────────────

    /// Evaluate a dimension against the current symbolic bindings.
    pub(crate) fn resolve_dim(&self, dim: &Dim) -> Dim {
        match dim {
            Dim::Int(_) => dim.clone(),
            Dim::Parametric(expr) => expr.evaluate(&self.symbolic_bindings).to_dim(),
        }
    }

    /// Deduced type of `node` with every dimension resolved to the current
    /// bindings.
    pub(crate) fn resolve_type(&self, node: NodeId, span: Span) -> Result<ConcreteType> {
        let ty = self.type_info.get_type(node).ok_or_else(|| ConvertError::Conversion {
            span: Some(span),
            message: "IR conversion failed because type information was missing for AST node"
                .to_string(),
        })?;
        ty.map_size(&mut |dim| Ok(self.resolve_dim(dim)))
    }

    pub(crate) fn resolve_type_to_ir(&self, node: NodeId, span: Span) -> Result<Type> {
        let concrete = self.resolve_type(node, span)?;
        self.type_to_ir(&concrete)
    }

    /// Lower a resolved surface type to its IR shape. Enums become their
    /// underlying bits.
    pub(crate) fn type_to_ir(&self, ty: &ConcreteType) -> Result<Type> {
        match ty {
            ConcreteType::Bits { size, .. } | ConcreteType::Enum { size, .. } => {
                Ok(self.package.get_bits_type(self.dim_to_width(size)?))
            }
            ConcreteType::Array { element, size } => {
                let element = self.type_to_ir(element)?;
                Ok(self.package.get_array_type(self.dim_to_width(size)?, element))
            }
            ConcreteType::Tuple { members } => {
                let members = members
                    .iter()
                    .map(|m| self.type_to_ir(&m.ty))
                    .collect::<Result<Vec<_>>>()?;
                Ok(self.package.get_tuple_type(members))
            }
        }
    }

    /// A resolved dimension as a width. Still-parametric dimensions mean a
    /// binding was missing, which the driver owes us.
    pub(crate) fn dim_to_width(&self, dim: &Dim) -> Result<usize> {
        match dim.as_int() {
            Some(v) if v >= 0 => Ok(v as usize),
            Some(v) => Err(internal(format!("negative type dimension: {}", v))),
            None => Err(internal(format!("unresolved parametric dimension: {}", dim))),
        }
    }

    /// Total bit count of a node's resolved type.
    pub(crate) fn resolved_bit_count(&self, node: NodeId, span: Span) -> Result<usize> {
        let ty = self.resolve_type(node, span)?;
        self.dim_to_width(&ty.total_bit_count())
    }

    // ── struct/enum resolution ──────────────────────────────────

    /// Walk a typedef chain to the struct or enum it names.
    pub(crate) fn deref_struct_or_enum(&self, name: &str) -> Result<DerefVariant<'a>> {
        let module = self.module;
        let mut current = name;
        // Bounded walk; the type checker rejects alias cycles, but a broken
        // table must not hang us.
        for _ in 0..32 {
            match module.find_type_definition(current) {
                Some(TypeDefinition::Struct(s)) => return Ok(DerefVariant::Struct(s)),
                Some(TypeDefinition::Enum(e)) => return Ok(DerefVariant::Enum(e)),
                Some(TypeDefinition::TypeDef(td)) => current = &td.target,
                None => {
                    return Err(ConvertError::Unimplemented {
                        span: Span::default(),
                        message: format!(
                            "unhandled typedef '{}' while resolving to struct or enum",
                            current
                        ),
                    })
                }
            }
        }
        Err(internal(format!("typedef chain starting at '{}' does not terminate", name)))
    }

    pub(crate) fn deref_struct(&self, name: &str) -> Result<&'a StructDef> {
        match self.deref_struct_or_enum(name)? {
            DerefVariant::Struct(s) => Ok(s),
            DerefVariant::Enum(_) => {
                Err(internal(format!("'{}' resolved to an enum, expected a struct", name)))
            }
        }
    }

    pub(crate) fn deref_enum(&self, name: &str) -> Result<&'a EnumDef> {
        match self.deref_struct_or_enum(name)? {
            DerefVariant::Enum(e) => Ok(e),
            DerefVariant::Struct(_) => {
                Err(internal(format!("'{}' resolved to a struct, expected an enum", name)))
            }
        }
    }

    /// The module an import declaration resolves to.
    pub(crate) fn imported_module(&self, import_node: NodeId) -> Result<&'a Module> {
        let type_info = self.type_info;
        type_info
            .get_imported(import_node)
            .map(|m| m.as_ref())
            .ok_or_else(|| internal(format!("import node {} was not resolved", import_node.0)))
    }

    // ── declaration handling ────────────────────────────────────

    /// Lower a constant definition: its value expression, aliased to the
    /// constant's name.
    pub fn handle_constant_def(&mut self, node: &'a ConstantDef) -> Result<()> {
        self.visit_expr(&node.value)?;
        trace!("aliasing name def for constant: {}", node.name.identifier);
        self.def_alias_to_name_def(node.value.id, &node.name)?;
        Ok(())
    }

    fn handle_param(&mut self, param: &'a Param) -> Result<()> {
        let ty = self.resolve_type_to_ir(param.name.id, param.name.span)?;
        let identifier = param.name.identifier.clone();
        self.def(param.name.id, param.name.span, move |fb, _loc| {
            fb.param(identifier, ty)
        })?;
        Ok(())
    }

    /// Convert one function under the given bindings, installing the result
    /// in the package. Returns the mangled name.
    pub fn convert_function(
        &mut self,
        function: &'a Function,
        symbolic_bindings: Option<&SymbolicBindings>,
    ) -> Result<String> {
        if let Some(bindings) = symbolic_bindings {
            self.set_symbolic_bindings(bindings.clone());
        }
        let free_keys: BTreeSet<String> = function.free_parametric_keys().into_iter().collect();
        let mangled =
            mangle_name(function.identifier(), &free_keys, &self.module.name, symbolic_bindings)?;
        debug!("converting function '{}' as '{}'", function.identifier(), mangled);
        self.instantiate_function_builder(&mangled)?;

        for param in &function.params {
            self.handle_param(param)?;
        }

        for binding in &function.parametric_bindings {
            let value = self
                .symbolic_bindings
                .get(&binding.name.identifier)
                .ok_or_else(|| {
                    internal(format!(
                        "no symbolic binding for parametric '{}'",
                        binding.name.identifier
                    ))
                })?;
            let bit_count = self.resolved_bit_count(binding.id, binding.span)?;
            let bits = Bits::from_i128(value as i128, bit_count).ok_or_else(|| {
                internal(format!(
                    "parametric value {} does not fit in {} bits",
                    value, bit_count
                ))
            })?;
            self.def_const(binding.id, binding.span, Value::Bits(bits))?;
            self.def_alias_to_name_def(binding.id, &binding.name)?;
        }

        for dep in std::mem::take(&mut self.constant_deps) {
            self.handle_constant_def(dep)?;
        }

        self.visit_expr(&function.body)?;

        // A trailing bare name reference would make some earlier node the
        // freshest one; append an identity so the built function returns it.
        let last = self.last_expression.unwrap_or(&function.body);
        if matches!(last.kind, ExprKind::NameRef(_) | ExprKind::ConstRef(_)) {
            let value = self.use_node(last.id)?;
            self.def(last.id, last.span, |fb, loc| fb.identity(value, loc))?;
        }

        self.finalize()
    }

    /// Build the function and install it in the package.
    fn finalize(&mut self) -> Result<String> {
        let fb = self
            .function_builder
            .take()
            .ok_or_else(|| internal("no function builder to finalize"))?;
        let function = fb.build()?;
        let name = function.name.clone();
        debug!("built function: {}", name);
        self.package.add_function(function)?;
        Ok(name)
    }

    // ── expression dispatch ─────────────────────────────────────

    /// Lower one expression (and, recursively, its operands).
    pub fn visit_expr(&mut self, expr: &'a Expr) -> Result<()> {
        match &expr.kind {
            ExprKind::Number(n) => self.handle_number(expr, n),
            ExprKind::NameRef(nr) | ExprKind::ConstRef(nr) => self.handle_name_ref(expr, nr),
            ExprKind::ColonRef(cr) => self.handle_colon_ref(expr, cr),
            ExprKind::Unop { kind, operand } => self.handle_unop(expr, *kind, operand),
            ExprKind::Binop { kind, lhs, rhs } => self.handle_binop(expr, *kind, lhs, rhs),
            ExprKind::Ternary {
                test,
                consequent,
                alternate,
            } => self.handle_ternary(expr, test, consequent, alternate),
            ExprKind::Tuple(members) => self.handle_tuple(expr, members),
            ExprKind::StructInstance(si) => self.handle_struct_instance(expr, si),
            ExprKind::SplatStructInstance(ssi) => self.handle_splat_struct_instance(expr, ssi),
            ExprKind::Attr { lhs, attr } => self.handle_attr(expr, lhs, attr),
            ExprKind::Index { lhs, rhs } => self.handle_index(expr, lhs, rhs),
            ExprKind::Array(array) => self.handle_array(expr, array),
            ExprKind::ConstantArray(array) => self.handle_constant_array(expr, array),
            ExprKind::Cast { expr: operand, .. } => self.handle_cast(expr, operand),
            ExprKind::Let(let_) => self.handle_let(expr, let_),
            ExprKind::Match(match_) => self.handle_match(expr, match_),
            ExprKind::Invocation(invocation) => self.handle_invocation(expr, invocation),
        }
    }
}

// ── interpreter value conversions ───────────────────────────────

/// Lower an interpreter value to an IR value. Bits-kinded values (signed,
/// unsigned, enum) become raw bits; aggregates recurse. Function values
/// have no IR form.
pub fn interp_value_to_value(value: &InterpValue) -> Result<Value> {
    match value {
        InterpValue::UBits(b) | InterpValue::SBits(b) | InterpValue::Enum(b) => {
            Ok(Value::Bits(b.clone()))
        }
        InterpValue::Tuple(members) => Ok(Value::Tuple(
            members.iter().map(interp_value_to_value).collect::<Result<_>>()?,
        )),
        InterpValue::Array(members) => Ok(Value::Array(
            members.iter().map(interp_value_to_value).collect::<Result<_>>()?,
        )),
        InterpValue::Function(_) => Err(ConvertError::InvalidArgument(format!(
            "cannot convert interpreter value with tag: {}",
            value.tag_name()
        ))),
    }
}

/// Lift an IR value back into the interpreter's domain. Bits surface as
/// unsigned; sign information does not survive the IR.
pub fn value_to_interp_value(value: &Value) -> Result<InterpValue> {
    match value {
        Value::Bits(b) => Ok(InterpValue::UBits(b.clone())),
        Value::Tuple(members) => Ok(InterpValue::Tuple(
            members.iter().map(value_to_interp_value).collect::<Result<_>>()?,
        )),
        Value::Array(members) => Ok(InterpValue::Array(
            members.iter().map(value_to_interp_value).collect::<Result<_>>()?,
        )),
    }
}
