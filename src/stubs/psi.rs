//! Declarations backed either by a live tree node or by a stub.

use std::borrow::Cow;

use smol_str::SmolStr;

use super::{PerlStub, StubFlags, StubKind, element_type_for};
use crate::parser::{SyntaxNode, TextRange};
use crate::psi::{
    AstNode, ArrayVariable, Block, DetachedNodeError, HashVariable, PackageStatement, PsiError,
    ScalarVariable, StructuralError, SubDefinition, enclosing_block,
};

/// An element that is either a live tree node or rebuilt from its stub.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum StubBased<N> {
    Tree(N),
    Detached(PerlStub),
}

impl<N: AstNode> StubBased<N> {
    pub fn is_detached(&self) -> bool {
        matches!(self, Self::Detached(_))
    }

    pub fn node(&self) -> Option<&N> {
        match self {
            Self::Tree(node) => Some(node),
            Self::Detached(_) => None,
        }
    }

    pub fn stub(&self) -> Option<&PerlStub> {
        match self {
            Self::Tree(_) => None,
            Self::Detached(stub) => Some(stub),
        }
    }
}

/// Queries every stub-capable element answers.
///
/// Stub fields are available in both forms. Accessors that need the tree
/// fail with [`DetachedNodeError`] on detached elements.
pub trait Declaration {
    fn kind(&self) -> StubKind;
    fn name(&self) -> Result<SmolStr, PsiError>;
    fn namespace(&self) -> Result<SmolStr, PsiError>;
    fn flags(&self) -> Result<StubFlags, PsiError>;

    fn qualified_name(&self) -> Result<String, PsiError> {
        Ok(format!("{}::{}", self.namespace()?, self.name()?))
    }

    /// Innermost block containing the declaration; `None` at file scope.
    fn enclosing_block(&self) -> Result<Option<Block>, PsiError>;

    fn text_range(&self) -> Result<TextRange, PsiError>;
}

/// Every stub-capable element.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DeclarationPsi {
    Scalar(StubBased<ScalarVariable>),
    Array(StubBased<ArrayVariable>),
    Hash(StubBased<HashVariable>),
    Sub(StubBased<SubDefinition>),
    Package(StubBased<PackageStatement>),
}

impl DeclarationPsi {
    /// Live element for `node`, if it is a stub-producing declaration.
    pub fn from_node(node: &SyntaxNode) -> Option<Self> {
        let element_type = element_type_for(node.kind())?;
        if !element_type.should_create_stub(node) {
            return None;
        }
        let node = node.clone();
        let tree = match element_type.kind() {
            StubKind::ScalarVariable => Self::Scalar(StubBased::Tree(ScalarVariable::cast(node)?)),
            StubKind::ArrayVariable => Self::Array(StubBased::Tree(ArrayVariable::cast(node)?)),
            StubKind::HashVariable => Self::Hash(StubBased::Tree(HashVariable::cast(node)?)),
            StubKind::SubDefinition => Self::Sub(StubBased::Tree(SubDefinition::cast(node)?)),
            StubKind::Package => Self::Package(StubBased::Tree(PackageStatement::cast(node)?)),
        };
        Some(tree)
    }

    /// Detached element for `stub`.
    pub fn from_stub(stub: PerlStub) -> Self {
        stub.kind.element_type().create_psi(stub)
    }

    pub fn is_detached(&self) -> bool {
        matches!(self.form(), Form::Detached(_))
    }

    pub fn syntax(&self) -> Option<&SyntaxNode> {
        match self.form() {
            Form::Tree(node) => Some(node),
            Form::Detached(_) => None,
        }
    }

    fn form(&self) -> Form<'_> {
        match self {
            Self::Scalar(e) => Form::of(e),
            Self::Array(e) => Form::of(e),
            Self::Hash(e) => Form::of(e),
            Self::Sub(e) => Form::of(e),
            Self::Package(e) => Form::of(e),
        }
    }

    /// Stub data: borrowed when detached, computed from the tree otherwise.
    pub fn to_stub(&self) -> Result<Cow<'_, PerlStub>, StructuralError> {
        match self.form() {
            Form::Detached(stub) => Ok(Cow::Borrowed(stub)),
            Form::Tree(node) => self.kind().element_type().create_stub(node).map(Cow::Owned),
        }
    }

    fn tree_only<T>(
        &self,
        accessor: &'static str,
        f: impl FnOnce(&SyntaxNode) -> T,
    ) -> Result<T, PsiError> {
        match self.form() {
            Form::Tree(node) => Ok(f(node)),
            Form::Detached(stub) => Err(DetachedNodeError {
                accessor,
                name: stub.name.clone(),
            }
            .into()),
        }
    }
}

enum Form<'a> {
    Tree(&'a SyntaxNode),
    Detached(&'a PerlStub),
}

impl<'a> Form<'a> {
    fn of<N: AstNode>(element: &'a StubBased<N>) -> Self {
        match element {
            StubBased::Tree(node) => Form::Tree(node.syntax()),
            StubBased::Detached(stub) => Form::Detached(stub),
        }
    }
}

impl Declaration for DeclarationPsi {
    fn kind(&self) -> StubKind {
        match self {
            Self::Scalar(_) => StubKind::ScalarVariable,
            Self::Array(_) => StubKind::ArrayVariable,
            Self::Hash(_) => StubKind::HashVariable,
            Self::Sub(_) => StubKind::SubDefinition,
            Self::Package(_) => StubKind::Package,
        }
    }

    fn name(&self) -> Result<SmolStr, PsiError> {
        Ok(self.to_stub()?.name.clone())
    }

    fn namespace(&self) -> Result<SmolStr, PsiError> {
        Ok(self.to_stub()?.namespace.clone())
    }

    fn flags(&self) -> Result<StubFlags, PsiError> {
        Ok(self.to_stub()?.flags)
    }

    fn enclosing_block(&self) -> Result<Option<Block>, PsiError> {
        self.tree_only("enclosing_block", enclosing_block)
    }

    fn text_range(&self) -> Result<TextRange, PsiError> {
        self.tree_only("text_range", |node| node.text_range())
    }
}
