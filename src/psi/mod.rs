//! Typed elements over the untyped rowan CST.
//!
//! Each struct wraps a [`SyntaxNode`] handle and exposes accessors computed by
//! structural queries over the node's own children. Wrappers hold no state of
//! their own: wrapping the same node twice yields equal values.
//!
//! Accessors for children that the grammar always produces return
//! `Result<_, StructuralError>`; accessors for optional children return
//! `Option<_>`.
//!
//! ## Dispatch
//!
//! [`ElementFactory`] maps every composite [`SyntaxKind`] to a constructor
//! producing a [`PerlElement`]. Elements accept a [`PerlVisitor`], which
//! falls back from the specific method to the capability methods
//! (`visit_variable`, `visit_expr`, `visit_stmt`) and finally to
//! `visit_element`.

use crate::parser::{SyntaxKind, SyntaxNode, SyntaxToken};

/// Trait for typed elements that wrap a SyntaxNode
pub trait AstNode: Sized {
    fn can_cast(kind: SyntaxKind) -> bool;
    fn cast(node: SyntaxNode) -> Option<Self>;
    fn syntax(&self) -> &SyntaxNode;
}

// ============================================================================
// Helper macros
// ============================================================================

macro_rules! ast_node {
    ($(#[$meta:meta])* $name:ident, $kind:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash)]
        pub struct $name(SyntaxNode);

        impl AstNode for $name {
            fn can_cast(kind: SyntaxKind) -> bool {
                kind == SyntaxKind::$kind
            }

            fn cast(node: SyntaxNode) -> Option<Self> {
                if Self::can_cast(node.kind()) {
                    Some(Self(node))
                } else {
                    None
                }
            }

            fn syntax(&self) -> &SyntaxNode {
                &self.0
            }
        }
    };
}

mod errors;
mod expr;
mod factory;
mod nodes;
mod scope;
mod visitor;

pub use errors::{DetachedNodeError, PsiError, StructuralError, UnknownNodeType};
pub use expr::*;
pub use factory::{ElementConstructor, ElementFactory, PerlElement};
pub use nodes::*;
pub use scope::{DEFAULT_NAMESPACE, enclosing_block, enclosing_namespace, is_file_scope};
pub use visitor::{PerlVisitor, walk};

/// Build and validate the process-wide element factory.
///
/// Must be called before any parsing work; an incomplete registry is a
/// configuration error and is reported here rather than mid-indexing.
pub fn init() -> Result<(), UnknownNodeType> {
    ElementFactory::global().map(|_| ())
}

// ============================================================================
// Child lookup helpers
// ============================================================================

/// First direct child that casts to `N`.
pub(crate) fn child<N: AstNode>(parent: &SyntaxNode) -> Option<N> {
    parent.children().find_map(N::cast)
}

/// Like [`child`], for children the grammar always produces.
pub(crate) fn mandatory_child<N: AstNode>(
    parent: &SyntaxNode,
    expected: &'static str,
) -> Result<N, StructuralError> {
    child(parent).ok_or_else(|| missing(parent, expected))
}

/// The `n`th direct child that casts to `N`.
pub(crate) fn nth_child<N: AstNode>(
    parent: &SyntaxNode,
    n: usize,
    expected: &'static str,
) -> Result<N, StructuralError> {
    parent
        .children()
        .filter_map(N::cast)
        .nth(n)
        .ok_or_else(|| missing(parent, expected))
}

/// First direct token child of the given kind.
pub(crate) fn token(parent: &SyntaxNode, kind: SyntaxKind) -> Option<SyntaxToken> {
    parent
        .children_with_tokens()
        .filter_map(|e| e.into_token())
        .find(|t| t.kind() == kind)
}

/// First direct non-trivia token child.
pub(crate) fn first_significant_token(parent: &SyntaxNode) -> Option<SyntaxToken> {
    parent
        .children_with_tokens()
        .filter_map(|e| e.into_token())
        .find(|t| !t.kind().is_trivia())
}

pub(crate) fn missing(parent: &SyntaxNode, expected: &'static str) -> StructuralError {
    StructuralError {
        node: parent.kind(),
        range: parent.text_range(),
        expected,
    }
}
