//! Indexer options

use std::path::Path;

use serde::Deserialize;
use smol_str::SmolStr;

/// Options for an [`Indexer`](super::Indexer).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct IndexerConfig {
    /// Worker threads for batch indexing (0 = rayon's global pool)
    pub threads: usize,
    /// Files larger than this are not parsed and index to no stubs
    pub max_file_bytes: usize,
    /// File extensions (without the dot) treated as Perl sources
    pub extensions: Vec<SmolStr>,
    /// Skip reparsing when a file's content hash is unchanged
    pub skip_unchanged: bool,
}

impl Default for IndexerConfig {
    fn default() -> Self {
        Self {
            threads: 0,
            max_file_bytes: 4 * 1024 * 1024,
            extensions: ["pl", "pm", "t"].into_iter().map(SmolStr::new_static).collect(),
            skip_unchanged: true,
        }
    }
}

impl IndexerConfig {
    /// Whether `path` has one of the configured Perl extensions
    pub fn accepts_path(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| self.extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)))
    }
}
