//! Stub index
//!
//! - [`StubIndexRegistry`] - Index keys and the stub kinds stored under them
//! - [`StubIndex`] - Committed stubs per file, queried by key and name
//! - [`Indexer`] - Parses files and commits their stubs
//! - [`Diagnostic`] - Problems found while indexing a file

mod config;
mod diagnostics;
mod error;
mod indexer;
pub mod registry;
mod store;

pub use config::IndexerConfig;
pub use diagnostics::{Diagnostic, Severity};
pub use error::IndexError;
pub use indexer::{FileIndexReport, FileText, IndexOutcome, Indexer};
pub use registry::{RegistryBuilder, StubIndexRegistry};
pub use store::{FileIndexState, FileStubSet, IndexedStub, LoadOutcome, StubIndex};
