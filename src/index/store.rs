//! Per-file stub storage.
//!
//! Every file owns one slot behind its own lock. The outer map is locked
//! only to find, insert or remove a slot, so reindexing one file never
//! blocks queries against others. A slot's stubs live in an `Arc` that is
//! swapped whole on commit: readers clone the `Arc` and see either the old
//! set or the new one.
//!
//! A name table maps each `(key, name)` to the files whose committed set
//! holds it, so a lookup only visits those files. It is updated under the
//! slot lock of the file being committed and may briefly list a file whose
//! set no longer holds the name; lookups filter by the set itself.

use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::RwLock;
use rustc_hash::{FxHashMap, FxHashSet};
use smol_str::SmolStr;

use super::{IndexError, StubIndexRegistry};
use crate::base::FileId;
use crate::stubs::{self, IndexCorruption, IndexKey, PerlStub};

/// Lifecycle of one file's index entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileIndexState {
    /// Nothing has been committed for the file.
    NotIndexed,
    /// A reindex is in progress. Previously committed stubs stay queryable.
    Indexing,
    /// Committed stubs match the newest known content version.
    Indexed,
    /// Newer content is known but not yet reindexed.
    Stale,
}

/// The committed stubs of one file, in source order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileStubSet {
    version: u64,
    stubs: Vec<PerlStub>,
    by_name: IndexMap<(IndexKey, SmolStr), Vec<usize>>,
}

impl FileStubSet {
    fn new(
        version: u64,
        stubs: Vec<PerlStub>,
        registry: &StubIndexRegistry,
    ) -> Result<Self, IndexError> {
        let mut by_name: IndexMap<(IndexKey, SmolStr), Vec<usize>> = IndexMap::new();
        for (ordinal, stub) in stubs.iter().enumerate() {
            let key = registry
                .key_for(stub.kind)
                .ok_or(IndexError::UnregisteredKind(stub.kind))?;
            by_name.entry((key, stub.name.clone())).or_default().push(ordinal);
        }
        Ok(Self { version, stubs, by_name })
    }

    /// Content version the stubs were extracted from.
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn stubs(&self) -> &[PerlStub] {
        &self.stubs
    }

    pub fn len(&self) -> usize {
        self.stubs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stubs.is_empty()
    }

    fn matching<'a>(
        &'a self,
        key: IndexKey,
        name: &str,
    ) -> impl Iterator<Item = (usize, &'a PerlStub)> + 'a {
        self.by_name
            .get(&(key, SmolStr::new(name)))
            .into_iter()
            .flatten()
            .map(|&ordinal| (ordinal, &self.stubs[ordinal]))
    }
}

/// A stub found by [`StubIndex::lookup`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexedStub {
    pub file: FileId,
    /// Position among the file's stubs.
    pub ordinal: usize,
    pub stub: PerlStub,
}

/// Result of loading persisted stubs for a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    Loaded { version: u64, stubs: usize },
    /// The bytes were unusable; the entry was reset and the file must be
    /// reindexed from source.
    RebuildRequired(IndexCorruption),
}

#[derive(Debug, Default)]
struct FileEntry {
    committed: Option<u64>,
    indexing: Option<u64>,
    latest: Option<u64>,
    stubs: Arc<FileStubSet>,
}

impl FileEntry {
    fn state(&self) -> FileIndexState {
        match (self.indexing, self.committed) {
            (Some(_), _) => FileIndexState::Indexing,
            (None, None) => FileIndexState::NotIndexed,
            (None, Some(committed)) if self.latest.is_some_and(|latest| latest > committed) => {
                FileIndexState::Stale
            }
            (None, Some(_)) => FileIndexState::Indexed,
        }
    }

    fn note_version(&mut self, version: u64) {
        self.latest = Some(self.latest.map_or(version, |latest| latest.max(version)));
    }

    fn check_not_superseded(&self, file: FileId, version: u64) -> Result<(), IndexError> {
        match self.committed {
            Some(committed) if version < committed => Err(IndexError::Superseded {
                file,
                version,
                committed,
            }),
            _ => Ok(()),
        }
    }

    fn install(&mut self, set: FileStubSet) {
        let version = set.version;
        self.stubs = Arc::new(set);
        self.committed = Some(version);
        self.note_version(version);
        if self.indexing.is_some_and(|indexing| indexing <= version) {
            self.indexing = None;
        }
    }
}

type NameTable = FxHashMap<(IndexKey, SmolStr), FxHashSet<FileId>>;

/// Drop `file` from the names `old` holds and `kept` does not.
fn unlink_names(names: &mut NameTable, file: FileId, old: &FileStubSet, kept: &FileStubSet) {
    for name in old.by_name.keys() {
        if kept.by_name.contains_key(name) {
            continue;
        }
        if let Some(files) = names.get_mut(name) {
            files.remove(&file);
            if files.is_empty() {
                names.remove(name);
            }
        }
    }
}

/// Stub storage for all indexed files.
#[derive(Debug)]
pub struct StubIndex {
    registry: Arc<StubIndexRegistry>,
    files: RwLock<FxHashMap<FileId, Arc<RwLock<FileEntry>>>>,
    names: RwLock<NameTable>,
}

impl StubIndex {
    pub fn new(registry: Arc<StubIndexRegistry>) -> Self {
        Self {
            registry,
            files: RwLock::new(FxHashMap::default()),
            names: RwLock::new(FxHashMap::default()),
        }
    }

    /// Index backed by the installed process-wide registry.
    pub fn with_global_registry() -> Result<Self, IndexError> {
        Ok(Self::new(super::registry::global()?))
    }

    pub fn registry(&self) -> &StubIndexRegistry {
        &self.registry
    }

    fn entry(&self, file: FileId) -> Option<Arc<RwLock<FileEntry>>> {
        self.files.read().get(&file).cloned()
    }

    fn entry_or_insert(&self, file: FileId) -> Arc<RwLock<FileEntry>> {
        if let Some(entry) = self.entry(file) {
            return entry;
        }
        Arc::clone(self.files.write().entry(file).or_default())
    }

    /// Swap `set` into the slot of `file`, keeping the name table in step.
    /// Names are linked before the swap and unlinked after it.
    fn install(&self, file: FileId, entry: &mut FileEntry, set: FileStubSet) {
        let previous = Arc::clone(&entry.stubs);
        let mut names = self.names.write();
        for name in set.by_name.keys() {
            names.entry(name.clone()).or_default().insert(file);
        }
        entry.install(set);
        unlink_names(&mut names, file, &previous, &entry.stubs);
    }

    /// Files the name table lists for `(key, name)`, in id order.
    fn candidates(&self, key: IndexKey, name: &str) -> Vec<FileId> {
        let mut files: Vec<FileId> = self
            .names
            .read()
            .get(&(key, SmolStr::new(name)))
            .map(|files| files.iter().copied().collect())
            .unwrap_or_default();
        files.sort();
        files
    }

    /// Record that `file` changed to content `version`. Committed stubs
    /// remain queryable until a reindex commits.
    pub fn mark_stale(&self, file: FileId, version: u64) {
        self.entry_or_insert(file).write().note_version(version);
    }

    /// Record that a reindex of `file` at `version` has started.
    pub fn begin_indexing(&self, file: FileId, version: u64) -> Result<(), IndexError> {
        let entry = self.entry_or_insert(file);
        let mut entry = entry.write();
        entry.check_not_superseded(file, version)?;
        entry.indexing = Some(entry.indexing.map_or(version, |current| current.max(version)));
        entry.note_version(version);
        Ok(())
    }

    /// Replace every stub of `file` with `stubs`, extracted from `version`.
    ///
    /// Fails with [`IndexError::Superseded`] when a newer version has already
    /// been committed; the index is left untouched in that case.
    pub fn commit(
        &self,
        file: FileId,
        version: u64,
        stubs: Vec<PerlStub>,
    ) -> Result<(), IndexError> {
        // Built before taking the slot lock; validation failures leave the entry as is.
        let set = FileStubSet::new(version, stubs, &self.registry)?;
        let entry = self.entry_or_insert(file);
        let mut entry = entry.write();
        entry.check_not_superseded(file, version)?;
        tracing::debug!("Committed {} stubs for {} at version {}", set.len(), file, version);
        self.install(file, &mut entry, set);
        Ok(())
    }

    /// Re-stamp the stubs of `file` committed at `expected` with `version`
    /// without replacing them. Used when new content hashes to the same
    /// text as `expected`.
    ///
    /// Returns `false` and leaves the entry untouched when the committed
    /// version is no longer `expected`.
    pub fn recommit(&self, file: FileId, expected: u64, version: u64) -> Result<bool, IndexError> {
        let Some(entry) = self.entry(file) else {
            return Ok(false);
        };
        let mut entry = entry.write();
        entry.check_not_superseded(file, version)?;
        if entry.committed != Some(expected) {
            return Ok(false);
        }
        let set = FileStubSet {
            version,
            ..FileStubSet::clone(&entry.stubs)
        };
        entry.install(set);
        Ok(true)
    }

    /// Abandon the reindex of `file` at `version` without committing. A
    /// newer reindex that started meanwhile keeps running.
    pub fn cancel_indexing(&self, file: FileId, version: u64) {
        if let Some(entry) = self.entry(file) {
            let mut entry = entry.write();
            if entry.indexing.is_some_and(|indexing| indexing <= version) {
                entry.indexing = None;
            }
        }
    }

    /// Drop every stub of `file`. Returns whether the file was known.
    pub fn remove_file(&self, file: FileId) -> bool {
        let Some(entry) = self.files.write().remove(&file) else {
            return false;
        };
        let entry = entry.read();
        unlink_names(&mut self.names.write(), file, &entry.stubs, &FileStubSet::default());
        true
    }

    /// All stubs registered under `key` named `name`, across all files.
    ///
    /// Results are grouped by file id, then source order within a file;
    /// callers should treat them as a set.
    pub fn lookup(&self, key: IndexKey, name: &str) -> Result<Vec<IndexedStub>, IndexError> {
        if !self.registry.contains(key) {
            return Err(IndexError::UnknownKey(key));
        }

        let snapshots: Vec<(FileId, Arc<FileStubSet>)> = self
            .candidates(key, name)
            .into_iter()
            .filter_map(|file| Some((file, Arc::clone(&self.entry(file)?.read().stubs))))
            .collect();

        Ok(snapshots
            .iter()
            .flat_map(|(file, set)| {
                set.matching(key, name).map(|(ordinal, stub)| IndexedStub {
                    file: *file,
                    ordinal,
                    stub: stub.clone(),
                })
            })
            .collect())
    }

    /// Committed stubs of `file`, if any were committed.
    pub fn file_stubs(&self, file: FileId) -> Option<Arc<FileStubSet>> {
        let entry = self.entry(file)?;
        let entry = entry.read();
        entry.committed.map(|_| Arc::clone(&entry.stubs))
    }

    pub fn file_state(&self, file: FileId) -> FileIndexState {
        self.entry(file)
            .map_or(FileIndexState::NotIndexed, |entry| entry.read().state())
    }

    pub fn committed_version(&self, file: FileId) -> Option<u64> {
        self.entry(file)?.read().committed
    }

    /// Files with an entry, in id order.
    pub fn files(&self) -> Vec<FileId> {
        let mut files: Vec<_> = self.files.read().keys().copied().collect();
        files.sort();
        files
    }

    /// Restore `file` from persisted bytes.
    ///
    /// Corrupt bytes never fail the call: the entry is reset to
    /// [`FileIndexState::NotIndexed`] and [`LoadOutcome::RebuildRequired`] is
    /// returned. Loading a version older than the committed one fails with
    /// [`IndexError::Superseded`].
    pub fn load_file_bytes(&self, file: FileId, bytes: &[u8]) -> Result<LoadOutcome, IndexError> {
        let decoded = stubs::decode_file_stubs(bytes).and_then(|decoded| {
            FileStubSet::new(decoded.version, decoded.stubs, &self.registry)
                .map_err(|err| match err {
                    IndexError::UnregisteredKind(kind) => IndexCorruption::UnknownKind(kind.tag()),
                    other => IndexCorruption::Malformed(other.to_string()),
                })
        });

        let entry = self.entry_or_insert(file);
        let mut entry = entry.write();
        match decoded {
            Ok(set) => {
                entry.check_not_superseded(file, set.version)?;
                let outcome = LoadOutcome::Loaded {
                    version: set.version,
                    stubs: set.len(),
                };
                self.install(file, &mut entry, set);
                Ok(outcome)
            }
            Err(corruption) => {
                tracing::warn!("Discarding persisted stubs for {}: {}", file, corruption);
                unlink_names(&mut self.names.write(), file, &entry.stubs, &FileStubSet::default());
                let latest = entry.latest;
                *entry = FileEntry {
                    latest,
                    ..FileEntry::default()
                };
                Ok(LoadOutcome::RebuildRequired(corruption))
            }
        }
    }

    /// Committed stubs of `file` in their persisted form.
    pub fn file_bytes(&self, file: FileId) -> Result<Option<Vec<u8>>, IndexError> {
        match self.file_stubs(file) {
            Some(set) => Ok(Some(stubs::encode_file_stubs(set.version, &set.stubs)?)),
            None => Ok(None),
        }
    }
}
