// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Symbolic bindings: parametric identifier → integer assignments.

use std::collections::HashSet;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SymbolicBinding {
    pub identifier: String,
    pub value: i64,
}

/// An ordered set of parametric bindings. Order is the order the caller
/// supplied (parametric declaration order for a function instantiation);
/// it is observable in mangled names, so it must be stable.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct SymbolicBindings {
    bindings: Vec<SymbolicBinding>,
}

impl SymbolicBindings {
    /// Build from (identifier, value) pairs. The first occurrence of an
    /// identifier wins; later duplicates are dropped.
    pub fn new(pairs: impl IntoIterator<Item = (String, i64)>) -> Self {
        let mut seen = HashSet::new();
        let mut bindings = Vec::new();
        for (identifier, value) in pairs {
            if seen.insert(identifier.clone()) {
                bindings.push(SymbolicBinding { identifier, value });
            }
        }
        SymbolicBindings { bindings }
    }

    pub fn get(&self, identifier: &str) -> Option<i64> {
        self.bindings
            .iter()
            .find(|b| b.identifier == identifier)
            .map(|b| b.value)
    }

    pub fn bindings(&self) -> &[SymbolicBinding] {
        &self.bindings
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.bindings.iter().map(|b| b.identifier.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    /// Copy with every binding whose identifier is in `exclude` removed.
    pub fn without_keys(&self, exclude: &HashSet<&str>) -> SymbolicBindings {
        SymbolicBindings {
            bindings: self
                .bindings
                .iter()
                .filter(|b| !exclude.contains(b.identifier.as_str()))
                .cloned()
                .collect(),
        }
    }
}

impl fmt::Display for SymbolicBindings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, b) in self.bindings.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}: {}", b.identifier, b.value)?;
        }
        write!(f, "}}")
    }
}
