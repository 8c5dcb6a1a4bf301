// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! IR package - a named collection of finished functions.

use crate::function::{Fileno, IrFunction};
use crate::types::Type;

/// Errors from package and builder bookkeeping.
#[derive(Debug, thiserror::Error)]
pub enum PackageError {
    #[error("package already has a function named '{0}'")]
    DuplicateFunction(String),
    #[error("function '{0}' has no nodes")]
    EmptyFunction(String),
}

#[derive(Debug, Default)]
pub struct Package {
    name: String,
    filenos: Vec<String>,
    functions: Vec<IrFunction>,
}

impl Package {
    pub fn new(name: impl Into<String>) -> Self {
        Package {
            name: name.into(),
            filenos: Vec::new(),
            functions: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Intern a source file path.
    pub fn get_or_create_fileno(&mut self, path: &str) -> Fileno {
        if let Some(i) = self.filenos.iter().position(|p| p == path) {
            return Fileno(i as u32);
        }
        self.filenos.push(path.to_string());
        Fileno(self.filenos.len() as u32 - 1)
    }

    pub fn fileno_path(&self, fileno: Fileno) -> Option<&str> {
        self.filenos.get(fileno.0 as usize).map(String::as_str)
    }

    pub fn add_function(&mut self, function: IrFunction) -> Result<(), PackageError> {
        if self.has_function_with_name(&function.name) {
            return Err(PackageError::DuplicateFunction(function.name));
        }
        self.functions.push(function);
        Ok(())
    }

    pub fn get_function(&self, name: &str) -> Option<&IrFunction> {
        self.functions.iter().find(|f| f.name == name)
    }

    pub fn has_function_with_name(&self, name: &str) -> bool {
        self.get_function(name).is_some()
    }

    pub fn functions(&self) -> &[IrFunction] {
        &self.functions
    }

    pub fn get_bits_type(&self, bit_count: usize) -> Type {
        Type::Bits(bit_count)
    }

    pub fn get_array_type(&self, size: usize, element: Type) -> Type {
        Type::Array {
            element: Box::new(element),
            size,
        }
    }

    pub fn get_tuple_type(&self, members: Vec<Type>) -> Type {
        Type::Tuple(members)
    }
}
