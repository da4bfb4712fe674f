//! Registry of stub index keys.
//!
//! The key set is decided once at startup: a [`RegistryBuilder`] collects
//! `(key, kind)` pairs, [`RegistryBuilder::build`] freezes them, and
//! [`install`] publishes the result process-wide. Lookups afterwards only
//! read the frozen table.

use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::RwLock;

use super::IndexError;
use crate::stubs::{IndexKey, StubKind};

/// Frozen mapping between index keys and the stub kinds stored under them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StubIndexRegistry {
    keys: IndexMap<IndexKey, StubKind>,
}

impl StubIndexRegistry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    /// Registry with one key per Perl declaration kind.
    pub fn perl() -> Self {
        let keys = StubKind::ALL
            .into_iter()
            .map(|kind| (kind.index_key(), kind))
            .collect();
        Self { keys }
    }

    pub fn kind_for(&self, key: IndexKey) -> Option<StubKind> {
        self.keys.get(&key).copied()
    }

    pub fn key_for(&self, kind: StubKind) -> Option<IndexKey> {
        self.keys
            .iter()
            .find_map(|(key, registered)| (*registered == kind).then_some(*key))
    }

    pub fn contains(&self, key: IndexKey) -> bool {
        self.keys.contains_key(&key)
    }

    /// Registered keys in registration order.
    pub fn keys(&self) -> impl Iterator<Item = IndexKey> + '_ {
        self.keys.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

/// Collects registrations before the registry is frozen.
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    keys: IndexMap<IndexKey, StubKind>,
}

impl RegistryBuilder {
    /// Associate `key` with `kind`. Registering the same pair twice is a no-op.
    pub fn register(&mut self, key: IndexKey, kind: StubKind) -> Result<&mut Self, IndexError> {
        match self.keys.get(&key) {
            Some(&existing) if existing != kind => {
                return Err(IndexError::DuplicateKey { key, existing });
            }
            Some(_) => {}
            None => {
                self.keys.insert(key, kind);
            }
        }
        Ok(self)
    }

    pub fn build(self) -> StubIndexRegistry {
        StubIndexRegistry { keys: self.keys }
    }
}

static GLOBAL: RwLock<Option<Arc<StubIndexRegistry>>> = parking_lot::const_rwlock(None);

/// Publish `registry` as the process-wide registry.
pub fn install(registry: StubIndexRegistry) -> Result<Arc<StubIndexRegistry>, IndexError> {
    let mut slot = GLOBAL.write();
    if slot.is_some() {
        return Err(IndexError::AlreadyInstalled);
    }
    let registry = Arc::new(registry);
    tracing::info!("Installed stub index registry with {} keys", registry.len());
    *slot = Some(Arc::clone(&registry));
    Ok(registry)
}

/// The process-wide registry.
pub fn global() -> Result<Arc<StubIndexRegistry>, IndexError> {
    GLOBAL.read().clone().ok_or(IndexError::NotInstalled)
}

/// Clear the process-wide registry. Holders of the returned `Arc` keep a
/// usable registry; later [`global`] calls fail until [`install`] runs again.
pub fn teardown() -> Option<Arc<StubIndexRegistry>> {
    let previous = GLOBAL.write().take();
    if previous.is_some() {
        tracing::info!("Tore down stub index registry");
    }
    previous
}
