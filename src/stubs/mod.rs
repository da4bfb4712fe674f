//! Stub model: detached, serializable summaries of declarations.
//!
//! A [`PerlStub`] owns its data and never points into a tree or source text,
//! so it can be persisted and later turned back into a detached element via
//! [`StubElementType::create_psi`].
//!
//! - [`StubKind`] - Declaration category with a stable numeric tag
//! - [`StubFlags`] - Scope flags
//! - [`IndexKey`] - Logical index a stub is filed under
//! - [`codec`] - Binary record layout

pub mod codec;
mod element_type;
mod psi;

pub use codec::{
    FORMAT_VERSION, FileStubs, IndexCorruption, decode_file_stubs, decode_stub, encode_file_stubs,
    encode_stub,
};
pub use element_type::{
    PackageStubElementType, StubElementType, SubStubElementType, VariableStubElementType,
    element_type_for, element_types,
};
pub use psi::{Declaration, DeclarationPsi, StubBased};

use std::fmt;

use smol_str::SmolStr;

/// Declaration category of a stub.
///
/// Tags are persisted: new kinds get new tags, existing tags never change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u16)]
pub enum StubKind {
    ScalarVariable = 1,
    ArrayVariable = 2,
    HashVariable = 3,
    SubDefinition = 4,
    Package = 5,
}

impl StubKind {
    pub const ALL: [StubKind; 5] = [
        Self::ScalarVariable,
        Self::ArrayVariable,
        Self::HashVariable,
        Self::SubDefinition,
        Self::Package,
    ];

    pub fn tag(self) -> u16 {
        self as u16
    }

    pub fn from_tag(tag: u16) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.tag() == tag)
    }

    /// The index this kind of stub is filed under.
    pub fn index_key(self) -> IndexKey {
        match self {
            Self::ScalarVariable => IndexKey::SCALAR,
            Self::ArrayVariable => IndexKey::ARRAY,
            Self::HashVariable => IndexKey::HASH,
            Self::SubDefinition => IndexKey::SUB,
            Self::Package => IndexKey::PACKAGE,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::ScalarVariable => "scalar variable",
            Self::ArrayVariable => "array variable",
            Self::HashVariable => "hash variable",
            Self::SubDefinition => "sub definition",
            Self::Package => "package",
        }
    }
}

impl fmt::Display for StubKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Scope flags of a declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct StubFlags(u8);

impl StubFlags {
    /// `my`
    pub const LEXICAL: StubFlags = StubFlags(1 << 0);
    /// `our`
    pub const PACKAGE: StubFlags = StubFlags(1 << 1);
    /// `local`
    pub const LOCAL: StubFlags = StubFlags(1 << 2);
    /// `state`
    pub const STATE: StubFlags = StubFlags(1 << 3);
    /// Declared outside any block.
    pub const FILE_SCOPE: StubFlags = StubFlags(1 << 4);

    const ALL_BITS: u8 = 0b1_1111;

    pub const fn empty() -> Self {
        StubFlags(0)
    }

    pub const fn bits(self) -> u8 {
        self.0
    }

    /// `None` if `bits` has undefined flags set.
    pub const fn from_bits(bits: u8) -> Option<Self> {
        if bits & !Self::ALL_BITS == 0 {
            Some(StubFlags(bits))
        } else {
            None
        }
    }

    pub const fn contains(self, other: StubFlags) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn union(self, other: StubFlags) -> Self {
        StubFlags(self.0 | other.0)
    }

    pub fn insert(&mut self, other: StubFlags) {
        self.0 |= other.0;
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl std::ops::BitOr for StubFlags {
    type Output = StubFlags;

    fn bitor(self, rhs: StubFlags) -> StubFlags {
        self.union(rhs)
    }
}

impl std::ops::BitOrAssign for StubFlags {
    fn bitor_assign(&mut self, rhs: StubFlags) {
        self.insert(rhs);
    }
}

/// Detached summary of one declaration.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PerlStub {
    pub kind: StubKind,
    /// Unqualified name, without sigil.
    pub name: SmolStr,
    /// Package the declaration belongs to.
    pub namespace: SmolStr,
    pub flags: StubFlags,
}

impl PerlStub {
    pub fn new(
        kind: StubKind,
        name: impl Into<SmolStr>,
        namespace: impl Into<SmolStr>,
        flags: StubFlags,
    ) -> Self {
        Self {
            kind,
            name: name.into(),
            namespace: namespace.into(),
            flags,
        }
    }

    pub fn index_key(&self) -> IndexKey {
        self.kind.index_key()
    }

    /// `Namespace::name`
    pub fn qualified_name(&self) -> String {
        format!("{}::{}", self.namespace, self.name)
    }
}

/// Name of a stub index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IndexKey(&'static str);

impl IndexKey {
    pub const SCALAR: IndexKey = IndexKey("perl.scalar");
    pub const ARRAY: IndexKey = IndexKey("perl.array");
    pub const HASH: IndexKey = IndexKey("perl.hash");
    pub const SUB: IndexKey = IndexKey("perl.sub");
    pub const PACKAGE: IndexKey = IndexKey("perl.package");

    pub const fn new(name: &'static str) -> Self {
        IndexKey(name)
    }

    pub const fn as_str(&self) -> &'static str {
        self.0
    }
}

impl fmt::Display for IndexKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_tags_are_stable() {
        assert_eq!(StubKind::ScalarVariable.tag(), 1);
        assert_eq!(StubKind::ArrayVariable.tag(), 2);
        assert_eq!(StubKind::HashVariable.tag(), 3);
        assert_eq!(StubKind::SubDefinition.tag(), 4);
        assert_eq!(StubKind::Package.tag(), 5);
    }

    #[test]
    fn test_kind_from_tag() {
        for kind in StubKind::ALL {
            assert_eq!(StubKind::from_tag(kind.tag()), Some(kind));
        }
        assert_eq!(StubKind::from_tag(0), None);
        assert_eq!(StubKind::from_tag(6), None);
    }

    #[test]
    fn test_flags() {
        let flags = StubFlags::LEXICAL | StubFlags::FILE_SCOPE;
        assert!(flags.contains(StubFlags::LEXICAL));
        assert!(flags.contains(StubFlags::FILE_SCOPE));
        assert!(!flags.contains(StubFlags::PACKAGE));
        assert_eq!(StubFlags::from_bits(flags.bits()), Some(flags));
        assert_eq!(StubFlags::from_bits(0b1000_0000), None);
        assert!(StubFlags::empty().is_empty());
    }

    #[test]
    fn test_qualified_name() {
        let stub = PerlStub::new(StubKind::SubDefinition, "new", "Foo::Bar", StubFlags::FILE_SCOPE);
        assert_eq!(stub.qualified_name(), "Foo::Bar::new");
        assert_eq!(stub.index_key(), IndexKey::SUB);
    }
}
