//! Turns source text into committed stubs.
//!
//! One file is parsed, walked once in source order, and its stubs are
//! committed as a unit. A declaration that cannot be summarised becomes a
//! warning and is skipped; the rest of the file is still indexed.

use std::sync::Arc;

use parking_lot::Mutex;
use rayon::prelude::*;
use rustc_hash::FxHashMap;
use tracing::{debug, info, warn};
use xxhash_rust::xxh3::xxh3_64;

use super::{Diagnostic, IndexError, IndexerConfig, StubIndex};
use crate::base::{FileId, LineIndex};
use crate::parser::{self, SyntaxNode};
use crate::psi::{self, PerlVisitor};
use crate::stubs::{self, PerlStub};

/// One file handed to [`Indexer::index_files`].
#[derive(Debug, Clone, Copy)]
pub struct FileText<'a> {
    pub file: FileId,
    pub version: u64,
    pub text: &'a str,
}

impl<'a> FileText<'a> {
    pub fn new(file: FileId, version: u64, text: &'a str) -> Self {
        Self { file, version, text }
    }
}

/// What happened to a file's entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexOutcome {
    /// Parsed and committed.
    Indexed,
    /// Content matched the committed version; stubs were kept.
    Unchanged,
    /// Over the size limit; committed with no stubs.
    TooLarge,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileIndexReport {
    pub file: FileId,
    pub version: u64,
    pub outcome: IndexOutcome,
    /// Number of stubs now committed for the file.
    pub stubs: usize,
    pub diagnostics: Vec<Diagnostic>,
}

impl FileIndexReport {
    fn new(
        file: FileId,
        version: u64,
        outcome: IndexOutcome,
        stubs: usize,
        diagnostics: Vec<Diagnostic>,
    ) -> Self {
        Self {
            file,
            version,
            outcome,
            stubs,
            diagnostics,
        }
    }
}

/// Collects stubs in source order during a preorder walk.
struct StubCollector<'a> {
    file: FileId,
    line_index: &'a LineIndex,
    stubs: Vec<PerlStub>,
    diagnostics: Vec<Diagnostic>,
}

impl PerlVisitor for StubCollector<'_> {
    fn visit_element(&mut self, node: &SyntaxNode) {
        let Some(element_type) = stubs::element_type_for(node.kind()) else {
            return;
        };
        if !element_type.should_create_stub(node) {
            return;
        }
        match element_type.create_stub(node) {
            Ok(stub) => self.stubs.push(stub),
            Err(err) => {
                warn!("Skipping malformed declaration in {}: {}", self.file, err);
                self.diagnostics.push(Diagnostic::from_structural_error(
                    self.file,
                    &err,
                    self.line_index,
                ));
            }
        }
    }
}

/// Indexes files into a shared [`StubIndex`].
pub struct Indexer {
    index: Arc<StubIndex>,
    config: IndexerConfig,
    /// Content hash of each file's committed text, with its version.
    hashes: Mutex<FxHashMap<FileId, (u64, u64)>>,
    pool: Option<rayon::ThreadPool>,
}

impl Indexer {
    /// Fails if the element factory is incomplete or the thread pool cannot start.
    pub fn new(index: Arc<StubIndex>, config: IndexerConfig) -> Result<Self, IndexError> {
        psi::init()?;
        let pool = match config.threads {
            0 => None,
            threads => Some(
                rayon::ThreadPoolBuilder::new()
                    .num_threads(threads)
                    .thread_name(|i| format!("perl-indexer-{i}"))
                    .build()
                    .map_err(|err| IndexError::ThreadPool(err.to_string()))?,
            ),
        };
        Ok(Self {
            index,
            config,
            hashes: Mutex::new(FxHashMap::default()),
            pool,
        })
    }

    pub fn index(&self) -> &Arc<StubIndex> {
        &self.index
    }

    pub fn config(&self) -> &IndexerConfig {
        &self.config
    }

    /// Index `text` as content `version` of `file`.
    pub fn index_text(
        &self,
        file: FileId,
        version: u64,
        text: &str,
    ) -> Result<FileIndexReport, IndexError> {
        if text.len() > self.config.max_file_bytes {
            warn!(
                "Not indexing {}: {} bytes exceeds limit of {}",
                file,
                text.len(),
                self.config.max_file_bytes
            );
            self.index.commit(file, version, Vec::new())?;
            self.hashes.lock().remove(&file);
            let outcome = IndexOutcome::TooLarge;
            return Ok(FileIndexReport::new(file, version, outcome, 0, Vec::new()));
        }

        let hash = xxh3_64(text.as_bytes());
        if self.config.skip_unchanged
            && let Some(expected) = self.unchanged_since(file, hash)
            && let Some(report) = self.restamp(file, expected, version, hash)?
        {
            return Ok(report);
        }

        self.index.begin_indexing(file, version)?;
        let (stubs, diagnostics) = match collect_stubs(file, text) {
            Ok(collected) => collected,
            Err(err) => {
                self.index.cancel_indexing(file, version);
                return Err(err);
            }
        };
        let count = stubs.len();
        if let Err(err) = self.index.commit(file, version, stubs) {
            self.index.cancel_indexing(file, version);
            return Err(err);
        }
        self.record_hash(file, version, hash);
        debug!(
            "Indexed {} at version {}: {} stubs, {} diagnostics",
            file,
            version,
            count,
            diagnostics.len()
        );
        Ok(FileIndexReport::new(file, version, IndexOutcome::Indexed, count, diagnostics))
    }

    /// Index many files in parallel. A failure in one file does not affect the others.
    pub fn index_files(
        &self,
        files: &[FileText<'_>],
    ) -> Vec<(FileId, Result<FileIndexReport, IndexError>)> {
        let run = || -> Vec<(FileId, Result<FileIndexReport, IndexError>)> {
            files
                .par_iter()
                .map(|f| (f.file, self.index_text(f.file, f.version, f.text)))
                .collect()
        };
        let results = match &self.pool {
            Some(pool) => pool.install(run),
            None => run(),
        };
        let failed = results.iter().filter(|(_, r)| r.is_err()).count();
        info!("Indexed {} files ({} failed)", results.len(), failed);
        results
    }

    /// Forget `file` entirely.
    pub fn remove_file(&self, file: FileId) -> bool {
        self.hashes.lock().remove(&file);
        self.index.remove_file(file)
    }

    /// Committed version of `file` if its content hashed to `hash`.
    fn unchanged_since(&self, file: FileId, hash: u64) -> Option<u64> {
        let committed = self.index.committed_version(file)?;
        let known = self.hashes.lock().get(&file).copied();
        known
            .filter(|&(version, known)| known == hash && version == committed)
            .map(|(version, _)| version)
    }

    /// Carry the stubs committed at `expected` over to `version`. `None`
    /// when another commit replaced them after the hash was checked.
    fn restamp(
        &self,
        file: FileId,
        expected: u64,
        version: u64,
        hash: u64,
    ) -> Result<Option<FileIndexReport>, IndexError> {
        if !self.index.recommit(file, expected, version)? {
            debug!("{} moved past version {}; reindexing {}", file, expected, version);
            return Ok(None);
        }
        self.record_hash(file, version, hash);
        let stubs = self.index.file_stubs(file).map_or(0, |set| set.len());
        debug!("Skipped unchanged {} at version {}", file, version);
        let outcome = IndexOutcome::Unchanged;
        Ok(Some(FileIndexReport::new(file, version, outcome, stubs, Vec::new())))
    }

    fn record_hash(&self, file: FileId, version: u64, hash: u64) {
        let mut hashes = self.hashes.lock();
        let slot = hashes.entry(file).or_insert((version, hash));
        if slot.0 <= version {
            *slot = (version, hash);
        }
    }
}

/// Parse `text` and extract its stubs in source order, with parse errors
/// and skipped declarations as diagnostics.
fn collect_stubs(
    file: FileId,
    text: &str,
) -> Result<(Vec<PerlStub>, Vec<Diagnostic>), IndexError> {
    let parse = parser::parse(text);
    let line_index = LineIndex::new(text);
    let mut collector = StubCollector {
        file,
        line_index: &line_index,
        stubs: Vec::new(),
        diagnostics: parse
            .errors
            .iter()
            .map(|err| Diagnostic::from_syntax_error(file, err, &line_index))
            .collect(),
    };
    psi::walk(&parse.syntax(), &mut collector)?;
    Ok((collector.stubs, collector.diagnostics))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::{FileIndexState, Severity, StubIndexRegistry};
    use crate::stubs::{IndexKey, StubFlags, StubKind};

    fn indexer(config: IndexerConfig) -> Indexer {
        let index = Arc::new(StubIndex::new(Arc::new(StubIndexRegistry::perl())));
        Indexer::new(index, config).unwrap()
    }

    #[test]
    fn test_two_scalars_in_source_order() {
        let indexer = indexer(IndexerConfig::default());
        let file = FileId::new(1);
        let report = indexer.index_text(file, 1, "my $x; my $y;").unwrap();
        assert_eq!(report.outcome, IndexOutcome::Indexed);
        assert_eq!(report.stubs, 2);
        assert!(report.diagnostics.is_empty());

        let set = indexer.index().file_stubs(file).unwrap();
        let stubs: Vec<_> = set
            .stubs()
            .iter()
            .map(|s| (s.kind, s.name.as_str()))
            .collect();
        assert_eq!(
            stubs,
            vec![(StubKind::ScalarVariable, "x"), (StubKind::ScalarVariable, "y")]
        );

        let found = indexer.index().lookup(IndexKey::SCALAR, "x").unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].stub.flags, StubFlags::LEXICAL | StubFlags::FILE_SCOPE);
        assert_eq!(found[0].stub.namespace, "main");
    }

    #[test]
    fn test_structural_error_is_isolated() {
        let indexer = indexer(IndexerConfig::default());
        let report = indexer
            .index_text(FileId::new(1), 1, "package;\nmy $kept;\n")
            .unwrap();
        assert_eq!(report.stubs, 1);

        let warnings: Vec<_> = report
            .diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Warning)
            .collect();
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].start.line, 0);
        assert!(report.diagnostics.iter().any(|d| d.is_error()));
        assert_eq!(indexer.index().lookup(IndexKey::SCALAR, "kept").unwrap().len(), 1);
    }

    #[test]
    fn test_unchanged_content_is_skipped() {
        let indexer = indexer(IndexerConfig::default());
        let file = FileId::new(1);
        indexer.index_text(file, 1, "our @list;").unwrap();
        let report = indexer.index_text(file, 2, "our @list;").unwrap();
        assert_eq!(report.outcome, IndexOutcome::Unchanged);
        assert_eq!(report.stubs, 1);
        assert_eq!(indexer.index().committed_version(file), Some(2));

        let report = indexer.index_text(file, 3, "our %table;").unwrap();
        assert_eq!(report.outcome, IndexOutcome::Indexed);
        assert!(indexer.index().lookup(IndexKey::ARRAY, "list").unwrap().is_empty());
        assert_eq!(indexer.index().lookup(IndexKey::HASH, "table").unwrap().len(), 1);
    }

    #[test]
    fn test_unchanged_hash_does_not_restamp_newer_commit() {
        let indexer = indexer(IndexerConfig::default());
        let file = FileId::new(1);
        indexer.index_text(file, 1, "my $a;").unwrap();
        let hash = xxh3_64(b"my $a;");
        let expected = indexer.unchanged_since(file, hash).unwrap();
        assert_eq!(expected, 1);

        // Version 2 commits after version 3 matched the hash of version 1.
        indexer.index_text(file, 2, "my $b;").unwrap();
        assert!(indexer.restamp(file, expected, 3, hash).unwrap().is_none());
        assert_eq!(indexer.index().committed_version(file), Some(2));

        let report = indexer.index_text(file, 3, "my $a;").unwrap();
        assert_eq!(report.outcome, IndexOutcome::Indexed);
        let set = indexer.index().file_stubs(file).unwrap();
        assert_eq!(set.version(), 3);
        let names: Vec<_> = set.stubs().iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["a"]);
    }

    #[test]
    fn test_skip_unchanged_disabled() {
        let indexer = indexer(IndexerConfig {
            skip_unchanged: false,
            ..IndexerConfig::default()
        });
        let file = FileId::new(1);
        indexer.index_text(file, 1, "sub run {}").unwrap();
        let report = indexer.index_text(file, 2, "sub run {}").unwrap();
        assert_eq!(report.outcome, IndexOutcome::Indexed);
    }

    #[test]
    fn test_too_large_file() {
        let indexer = indexer(IndexerConfig {
            max_file_bytes: 8,
            ..IndexerConfig::default()
        });
        let file = FileId::new(1);
        indexer.index_text(file, 1, "my $a;").unwrap();
        let report = indexer.index_text(file, 2, "my $a; my $b;").unwrap();
        assert_eq!(report.outcome, IndexOutcome::TooLarge);
        assert_eq!(indexer.index().file_stubs(file).unwrap().len(), 0);
        assert_eq!(indexer.index().file_state(file), FileIndexState::Indexed);
    }

    #[test]
    fn test_superseded_version_is_rejected() {
        let indexer = indexer(IndexerConfig::default());
        let file = FileId::new(1);
        indexer.index_text(file, 5, "my $new;").unwrap();
        let err = indexer.index_text(file, 4, "my $old;").unwrap_err();
        assert!(matches!(err, IndexError::Superseded { version: 4, committed: 5, .. }));
        assert!(indexer.index().lookup(IndexKey::SCALAR, "old").unwrap().is_empty());
        assert_eq!(indexer.index().file_state(file), FileIndexState::Indexed);
    }

    #[test]
    fn test_index_files_in_parallel() {
        let indexer = indexer(IndexerConfig {
            threads: 2,
            ..IndexerConfig::default()
        });
        let files = [
            FileText::new(FileId::new(1), 1, "package A; our $shared;"),
            FileText::new(FileId::new(2), 1, "package B; our $shared; sub go {}"),
            FileText::new(FileId::new(3), 1, "my $x = ;"),
        ];
        let results = indexer.index_files(&files);
        assert_eq!(results.len(), 3);
        assert!(results.iter().all(|(_, r)| r.is_ok()));

        let found = indexer.index().lookup(IndexKey::SCALAR, "shared").unwrap();
        let namespaces: Vec<_> = found.iter().map(|s| s.stub.namespace.as_str()).collect();
        assert_eq!(namespaces, vec!["A", "B"]);
        assert_eq!(indexer.index().lookup(IndexKey::SUB, "go").unwrap().len(), 1);
    }

    #[test]
    fn test_remove_file_forgets_hash() {
        let indexer = indexer(IndexerConfig::default());
        let file = FileId::new(1);
        indexer.index_text(file, 1, "my $x;").unwrap();
        assert!(indexer.remove_file(file));
        let report = indexer.index_text(file, 1, "my $x;").unwrap();
        assert_eq!(report.outcome, IndexOutcome::Indexed);
    }
}
