//! Error types for the typed element layer.

use thiserror::Error;

use crate::parser::{SyntaxKind, TextRange};

/// A child that every well-formed node of this kind carries is missing.
///
/// Only produced for trees built from malformed input; callers isolate it to
/// the offending subtree and report it as a diagnostic.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{node:?} at {range:?} is missing its {expected}")]
pub struct StructuralError {
    pub node: SyntaxKind,
    pub range: TextRange,
    pub expected: &'static str,
}

/// The element factory has no constructor for a node kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("no element type registered for {kind:?}")]
pub struct UnknownNodeType {
    pub kind: SyntaxKind,
}

/// A tree-only accessor was called on an element rebuilt from a stub.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("`{accessor}` is unavailable on detached element `{name}`")]
pub struct DetachedNodeError {
    pub accessor: &'static str,
    pub name: smol_str::SmolStr,
}

/// Any failure of the typed element layer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PsiError {
    #[error(transparent)]
    Structural(#[from] StructuralError),

    #[error(transparent)]
    UnknownNodeType(#[from] UnknownNodeType),

    #[error(transparent)]
    Detached(#[from] DetachedNodeError),
}
