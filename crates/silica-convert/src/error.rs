// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Conversion error types.

use silica_ast::Span;
use silica_ir::PackageError;

/// An IR conversion failure. Returned, never thrown; partial builder state
/// is abandoned by the caller on error.
#[derive(Debug, thiserror::Error)]
pub enum ConvertError {
    /// An AST node was used before it was defined. Driver bug.
    #[error("not found: {0}")]
    NotFound(String),
    /// An invariant the converter owns was violated.
    #[error("internal error: {0}")]
    Internal(String),
    /// A caller-supplied constraint was violated (e.g. unbound parametric).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    /// Construct recognized but not convertible yet.
    #[error("unimplemented: {span}: {message}")]
    Unimplemented { span: Span, message: String },
    /// Missing type information detected at a known source span.
    #[error("conversion error: {}: {message}", fmt_span(.span))]
    Conversion { span: Option<Span>, message: String },
}

fn fmt_span(span: &Option<Span>) -> String {
    match span {
        Some(s) => s.to_string(),
        None => "<no span>".to_string(),
    }
}

pub(crate) fn internal(message: impl Into<String>) -> ConvertError {
    ConvertError::Internal(message.into())
}

impl From<PackageError> for ConvertError {
    fn from(err: PackageError) -> Self {
        ConvertError::Internal(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ConvertError>;
