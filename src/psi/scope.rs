//! Lexical context of a node: owning package and enclosing block.

use rowan::Direction;
use smol_str::SmolStr;

use super::AstNode;
use super::nodes::{Block, PackageStatement};
use crate::parser::SyntaxNode;

/// Namespace of code that follows no `package` statement.
pub const DEFAULT_NAMESPACE: &str = "main";

/// The package in effect at `node`.
///
/// `package NAME;` applies to the statements after it up to the end of the
/// enclosing block or file; `package NAME { ... }` applies inside its block.
pub fn enclosing_namespace(node: &SyntaxNode) -> SmolStr {
    for ancestor in node.ancestors() {
        if ancestor != *node {
            if let Some(name) = PackageStatement::cast(ancestor.clone())
                .filter(|pkg| pkg.block().is_some())
                .and_then(|pkg| pkg.name().ok())
            {
                return name;
            }
        }
        let preceding = ancestor
            .siblings(Direction::Prev)
            .skip(1)
            .filter_map(PackageStatement::cast)
            .find(|pkg| pkg.block().is_none());
        if let Some(name) = preceding.and_then(|pkg| pkg.name().ok()) {
            return name;
        }
    }
    SmolStr::new_static(DEFAULT_NAMESPACE)
}

/// Innermost block strictly containing `node`.
pub fn enclosing_block(node: &SyntaxNode) -> Option<Block> {
    node.ancestors().skip(1).find_map(Block::cast)
}

/// Whether `node` sits outside every block.
pub fn is_file_scope(node: &SyntaxNode) -> bool {
    enclosing_block(node).is_none()
}
