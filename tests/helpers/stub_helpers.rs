//! Helpers for indexing sources and inspecting stubs

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use perl5::FileId;
use perl5::index::{Indexer, IndexerConfig, StubIndex, StubIndexRegistry};
use perl5::stubs::PerlStub;

pub fn new_indexer() -> Indexer {
    let index = Arc::new(StubIndex::new(Arc::new(StubIndexRegistry::perl())));
    Indexer::new(index, IndexerConfig::default()).unwrap()
}

/// Index `source` as file 1 and return its committed stubs in source order.
pub fn stubs_of(source: &str) -> Vec<PerlStub> {
    let indexer = new_indexer();
    indexer.index_text(FileId::new(1), 1, source).unwrap();
    indexer
        .index()
        .file_stubs(FileId::new(1))
        .map(|set| set.stubs().to_vec())
        .unwrap_or_default()
}

/// `(kind, namespace, name)` triples for compact assertions.
pub fn summarize(stubs: &[PerlStub]) -> Vec<(&'static str, &str, &str)> {
    stubs
        .iter()
        .map(|stub| (stub.kind.as_str(), stub.namespace.as_str(), stub.name.as_str()))
        .collect()
}
