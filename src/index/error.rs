//! Error types for stub indexing.

use thiserror::Error;

use crate::base::FileId;
use crate::psi::UnknownNodeType;
use crate::stubs::{IndexCorruption, IndexKey, StubKind};

/// Errors raised by the stub index and the indexer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IndexError {
    /// A result for an older content version arrived after a newer one.
    #[error("{file}: version {version} is older than committed version {committed}")]
    Superseded {
        file: FileId,
        version: u64,
        committed: u64,
    },

    /// Lookup against a key no registry entry exists for.
    #[error("index key `{0}` is not registered")]
    UnknownKey(IndexKey),

    /// A stub of a kind that has no registered index key.
    #[error("no index key registered for {0} stubs")]
    UnregisteredKind(StubKind),

    /// The same key registered twice with different kinds.
    #[error("index key `{key}` is already registered for {existing} stubs")]
    DuplicateKey { key: IndexKey, existing: StubKind },

    #[error("stub index registry is already installed")]
    AlreadyInstalled,

    #[error("stub index registry is not installed")]
    NotInstalled,

    #[error(transparent)]
    Corruption(#[from] IndexCorruption),

    #[error(transparent)]
    Factory(#[from] UnknownNodeType),

    #[error("could not start indexing threads: {0}")]
    ThreadPool(String),
}
