// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Module-level declaration AST nodes.

use crate::expr::{Expr, TypeAnnotation};
use crate::{NodeId, Span};

/// A name definition: the defining occurrence of an identifier.
#[derive(Debug, Clone)]
pub struct NameDef {
    pub id: NodeId,
    pub identifier: String,
    pub span: Span,
}

/// A Silica module: a named collection of top-level declarations.
#[derive(Debug, Clone)]
pub struct Module {
    pub name: String,
    pub members: Vec<ModuleMember>,
}

#[derive(Debug, Clone)]
pub enum ModuleMember {
    Function(Function),
    Constant(ConstantDef),
    Enum(EnumDef),
    Struct(StructDef),
    TypeDef(TypeDef),
    Import(Import),
}

/// A type definition resolvable from a name: struct, enum, or alias.
#[derive(Debug, Clone, Copy)]
pub enum TypeDefinition<'a> {
    Struct(&'a StructDef),
    Enum(&'a EnumDef),
    TypeDef(&'a TypeDef),
}

impl Module {
    pub fn new(name: impl Into<String>) -> Self {
        Module {
            name: name.into(),
            members: Vec::new(),
        }
    }

    pub fn functions(&self) -> impl Iterator<Item = &Function> {
        self.members.iter().filter_map(|m| match m {
            ModuleMember::Function(f) => Some(f),
            _ => None,
        })
    }

    pub fn get_function(&self, name: &str) -> Option<&Function> {
        self.functions().find(|f| f.identifier() == name)
    }

    pub fn constant_defs(&self) -> impl Iterator<Item = &ConstantDef> {
        self.members.iter().filter_map(|m| match m {
            ModuleMember::Constant(c) => Some(c),
            _ => None,
        })
    }

    pub fn get_constant_def(&self, name: &str) -> Option<&ConstantDef> {
        self.constant_defs().find(|c| c.name.identifier == name)
    }

    pub fn find_import(&self, name: &str) -> Option<&Import> {
        self.members.iter().find_map(|m| match m {
            ModuleMember::Import(i) if i.name.identifier == name => Some(i),
            _ => None,
        })
    }

    /// Look up a struct, enum, or typedef by name.
    pub fn find_type_definition(&self, name: &str) -> Option<TypeDefinition<'_>> {
        self.members.iter().find_map(|m| match m {
            ModuleMember::Struct(s) if s.name.identifier == name => {
                Some(TypeDefinition::Struct(s))
            }
            ModuleMember::Enum(e) if e.name.identifier == name => Some(TypeDefinition::Enum(e)),
            ModuleMember::TypeDef(t) if t.name.identifier == name => {
                Some(TypeDefinition::TypeDef(t))
            }
            _ => None,
        })
    }

    pub fn has_type_definition(&self, name: &str) -> bool {
        self.find_type_definition(name).is_some()
    }
}

#[derive(Debug, Clone)]
pub struct Function {
    pub name: NameDef,
    pub parametric_bindings: Vec<ParametricBinding>,
    pub params: Vec<Param>,
    pub body: Expr,
    pub span: Span,
}

impl Function {
    pub fn identifier(&self) -> &str {
        &self.name.identifier
    }

    pub fn is_parametric(&self) -> bool {
        !self.parametric_bindings.is_empty()
    }

    /// Identifiers of the parametric bindings, in declaration order.
    pub fn free_parametric_keys(&self) -> Vec<String> {
        self.parametric_bindings
            .iter()
            .map(|pb| pb.name.identifier.clone())
            .collect()
    }
}

/// Function parameter. The parameter's concrete type is recorded against the
/// `NameDef` in the type-information table.
#[derive(Debug, Clone)]
pub struct Param {
    pub name: NameDef,
    pub type_annotation: TypeAnnotation,
    pub span: Span,
}

/// A parametric binding, e.g. the `N` in `fn f<N: u32>(...)`.
#[derive(Debug, Clone)]
pub struct ParametricBinding {
    pub id: NodeId,
    pub name: NameDef,
    pub span: Span,
}

/// Module-level constant definition.
#[derive(Debug, Clone)]
pub struct ConstantDef {
    pub id: NodeId,
    pub name: NameDef,
    pub value: Expr,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct EnumDef {
    pub id: NodeId,
    pub name: NameDef,
    pub members: Vec<EnumMember>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct EnumMember {
    pub name: String,
    pub value: Expr,
}

impl EnumDef {
    /// The value expression for the named member.
    pub fn get_value(&self, name: &str) -> Option<&Expr> {
        self.members
            .iter()
            .find(|m| m.name == name)
            .map(|m| &m.value)
    }
}

/// Struct definition. Member types live in the type-information table; the
/// AST keeps the declaration-ordered member names.
#[derive(Debug, Clone)]
pub struct StructDef {
    pub id: NodeId,
    pub name: NameDef,
    pub members: Vec<String>,
    pub span: Span,
}

/// Type alias, `type Word = u32;`. `target` names another type definition.
#[derive(Debug, Clone)]
pub struct TypeDef {
    pub id: NodeId,
    pub name: NameDef,
    pub target: String,
    pub span: Span,
}

/// Import of another module under a local name.
#[derive(Debug, Clone)]
pub struct Import {
    pub id: NodeId,
    pub name: NameDef,
    /// Dotted module path, e.g. `["std", "math"]`
    pub subject: Vec<String>,
    pub span: Span,
}
