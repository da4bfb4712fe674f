//! Stub element types: which nodes produce stubs, and how.

use smol_str::SmolStr;
use tracing::trace;

use super::psi::{DeclarationPsi, StubBased};
use super::{IndexKey, PerlStub, StubFlags, StubKind};
use crate::parser::{SyntaxKind, SyntaxNode};
use crate::psi::{
    AstNode, DEFAULT_NAMESPACE, Declarator, PackageStatement, StructuralError, SubDefinition,
    Variable, enclosing_namespace, is_file_scope, missing, split_qualified,
};

/// Bridge between a stub-capable node kind and its stub.
pub trait StubElementType: Send + Sync {
    fn kind(&self) -> StubKind;

    fn index_key(&self) -> IndexKey {
        self.kind().index_key()
    }

    /// Whether `node` is a declaration this type summarises.
    fn should_create_stub(&self, node: &SyntaxNode) -> bool;

    /// Summarise `node`, which must satisfy [`Self::should_create_stub`].
    fn create_stub(&self, node: &SyntaxNode) -> Result<PerlStub, StructuralError>;

    /// Detached element answering declaration queries from `stub` alone.
    fn create_psi(&self, stub: PerlStub) -> DeclarationPsi;
}

/// Split a possibly qualified name, falling back to the package in effect.
fn name_and_namespace(node: &SyntaxNode, name: &str) -> (SmolStr, SmolStr) {
    match split_qualified(name) {
        (Some(namespace), short) => (SmolStr::new(short), SmolStr::new(namespace)),
        (None, short) => (SmolStr::new(short), enclosing_namespace(node)),
    }
}

fn scope_flags(node: &SyntaxNode) -> StubFlags {
    if is_file_scope(node) {
        StubFlags::FILE_SCOPE
    } else {
        StubFlags::empty()
    }
}

/// Like [`scope_flags`], but variables declared in a statement header
/// (`for my $i (...)`, `while (my $line = ...)`) belong to that statement.
fn variable_scope_flags(node: &SyntaxNode) -> StubFlags {
    let in_header = node
        .ancestors()
        .take_while(|n| n.kind() != SyntaxKind::BLOCK)
        .any(|n| matches!(n.kind(), SyntaxKind::CONDITION | SyntaxKind::FOR_STATEMENT));
    if in_header {
        StubFlags::empty()
    } else {
        scope_flags(node)
    }
}

// ============================================================================
// Variables
// ============================================================================

/// `my $x`, `our @list`, `state %seen`, `local $x`.
#[derive(Debug, Clone, Copy)]
pub struct VariableStubElementType {
    kind: StubKind,
    node_kind: SyntaxKind,
}

impl VariableStubElementType {
    pub const SCALAR: Self = Self {
        kind: StubKind::ScalarVariable,
        node_kind: SyntaxKind::SCALAR_VARIABLE,
    };
    pub const ARRAY: Self = Self {
        kind: StubKind::ArrayVariable,
        node_kind: SyntaxKind::ARRAY_VARIABLE,
    };
    pub const HASH: Self = Self {
        kind: StubKind::HashVariable,
        node_kind: SyntaxKind::HASH_VARIABLE,
    };

    fn declarator_flags(declarator: Declarator) -> StubFlags {
        match declarator {
            Declarator::My => StubFlags::LEXICAL,
            Declarator::Our => StubFlags::PACKAGE,
            Declarator::Local => StubFlags::LOCAL,
            Declarator::State => StubFlags::LEXICAL | StubFlags::STATE,
        }
    }
}

impl StubElementType for VariableStubElementType {
    fn kind(&self) -> StubKind {
        self.kind
    }

    fn should_create_stub(&self, node: &SyntaxNode) -> bool {
        node.kind() == self.node_kind
            && Variable::cast(node.clone()).is_some_and(|v| v.declaration().is_some())
    }

    fn create_stub(&self, node: &SyntaxNode) -> Result<PerlStub, StructuralError> {
        let variable = Variable::cast(node.clone()).ok_or_else(|| missing(node, "variable"))?;
        let declaration = variable
            .declaration()
            .ok_or_else(|| missing(node, "enclosing declaration"))?;
        let (name, namespace) = name_and_namespace(node, &variable.name()?);
        let flags = Self::declarator_flags(declaration.declarator()?) | variable_scope_flags(node);
        trace!(kind = %self.kind, %name, %namespace, "variable stub");
        Ok(PerlStub {
            kind: self.kind,
            name,
            namespace,
            flags,
        })
    }

    fn create_psi(&self, stub: PerlStub) -> DeclarationPsi {
        match self.kind {
            StubKind::ArrayVariable => DeclarationPsi::Array(StubBased::Detached(stub)),
            StubKind::HashVariable => DeclarationPsi::Hash(StubBased::Detached(stub)),
            _ => DeclarationPsi::Scalar(StubBased::Detached(stub)),
        }
    }
}

// ============================================================================
// Subs
// ============================================================================

/// `sub NAME ...`
#[derive(Debug, Clone, Copy, Default)]
pub struct SubStubElementType;

impl StubElementType for SubStubElementType {
    fn kind(&self) -> StubKind {
        StubKind::SubDefinition
    }

    fn should_create_stub(&self, node: &SyntaxNode) -> bool {
        node.kind() == SyntaxKind::SUB_DEFINITION
    }

    fn create_stub(&self, node: &SyntaxNode) -> Result<PerlStub, StructuralError> {
        let sub = SubDefinition::cast(node.clone()).ok_or_else(|| missing(node, "sub"))?;
        let (name, namespace) = name_and_namespace(node, &sub.name()?);
        trace!(%name, %namespace, "sub stub");
        Ok(PerlStub {
            kind: StubKind::SubDefinition,
            name,
            namespace,
            flags: scope_flags(node),
        })
    }

    fn create_psi(&self, stub: PerlStub) -> DeclarationPsi {
        DeclarationPsi::Sub(StubBased::Detached(stub))
    }
}

// ============================================================================
// Packages
// ============================================================================

/// `package NAME;` and `package NAME { ... }`
///
/// The stub name is the full package name; its namespace is the parent
/// package (`Foo` for `Foo::Bar`, `main` for top-level packages).
#[derive(Debug, Clone, Copy, Default)]
pub struct PackageStubElementType;

impl StubElementType for PackageStubElementType {
    fn kind(&self) -> StubKind {
        StubKind::Package
    }

    fn should_create_stub(&self, node: &SyntaxNode) -> bool {
        node.kind() == SyntaxKind::PACKAGE_STATEMENT
    }

    fn create_stub(&self, node: &SyntaxNode) -> Result<PerlStub, StructuralError> {
        let package =
            PackageStatement::cast(node.clone()).ok_or_else(|| missing(node, "package"))?;
        let name = package.name()?;
        let namespace = SmolStr::new(split_qualified(&name).0.unwrap_or(DEFAULT_NAMESPACE));
        trace!(%name, "package stub");
        Ok(PerlStub {
            kind: StubKind::Package,
            name,
            namespace,
            flags: scope_flags(node),
        })
    }

    fn create_psi(&self, stub: PerlStub) -> DeclarationPsi {
        DeclarationPsi::Package(StubBased::Detached(stub))
    }
}

// ============================================================================
// Lookup
// ============================================================================

static SCALAR: VariableStubElementType = VariableStubElementType::SCALAR;
static ARRAY: VariableStubElementType = VariableStubElementType::ARRAY;
static HASH: VariableStubElementType = VariableStubElementType::HASH;
static SUB: SubStubElementType = SubStubElementType;
static PACKAGE: PackageStubElementType = PackageStubElementType;

/// Every stub element type, in stub kind tag order.
pub fn element_types() -> [&'static dyn StubElementType; 5] {
    [&SCALAR, &ARRAY, &HASH, &SUB, &PACKAGE]
}

/// The stub element type for nodes of `kind`, if they can carry stubs.
pub fn element_type_for(kind: SyntaxKind) -> Option<&'static dyn StubElementType> {
    match kind {
        SyntaxKind::SCALAR_VARIABLE => Some(&SCALAR),
        SyntaxKind::ARRAY_VARIABLE => Some(&ARRAY),
        SyntaxKind::HASH_VARIABLE => Some(&HASH),
        SyntaxKind::SUB_DEFINITION => Some(&SUB),
        SyntaxKind::PACKAGE_STATEMENT => Some(&PACKAGE),
        _ => None,
    }
}

impl StubKind {
    pub fn element_type(self) -> &'static dyn StubElementType {
        match self {
            StubKind::ScalarVariable => &SCALAR,
            StubKind::ArrayVariable => &ARRAY,
            StubKind::HashVariable => &HASH,
            StubKind::SubDefinition => &SUB,
            StubKind::Package => &PACKAGE,
        }
    }
}
