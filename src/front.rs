//! Live lookup handle
//!
//! A [`CacheFront`] stands in for a registered function at serving time.
//! It never runs the function: it derives the key from the call's
//! arguments and answers from an in-memory snapshot of the store.

use crate::domain::{DomainValue, ParameterSpec};
use crate::error::{PrecacheError, PrecacheResult};
use crate::key::{self, CacheKey};
use crate::store::{CacheStore, PersistentStore};
use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use std::collections::HashSet;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::debug;

/// Shared, atomically replaced snapshot of one function's entries
#[derive(Debug, Default)]
pub(crate) struct SnapshotCell {
    current: RwLock<Option<Arc<CacheStore>>>,
}

impl SnapshotCell {
    pub(crate) fn get(&self) -> Option<Arc<CacheStore>> {
        self.current.read().clone()
    }

    pub(crate) fn replace(&self, store: CacheStore) {
        *self.current.write() = Some(Arc::new(store));
    }
}

/// Runtime-facing replacement for a registered function
pub struct CacheFront<T> {
    function: String,
    specs: Arc<[ParameterSpec]>,
    store: Arc<PersistentStore>,
    snapshot: Arc<SnapshotCell>,
    _result: PhantomData<fn() -> T>,
}

impl<T> Clone for CacheFront<T> {
    fn clone(&self) -> Self {
        Self {
            function: self.function.clone(),
            specs: Arc::clone(&self.specs),
            store: Arc::clone(&self.store),
            snapshot: Arc::clone(&self.snapshot),
            _result: PhantomData,
        }
    }
}

impl<T> std::fmt::Debug for CacheFront<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheFront")
            .field("function", &self.function)
            .field("specs", &self.specs)
            .field("loaded", &self.is_loaded())
            .finish()
    }
}

impl<T> CacheFront<T> {
    pub(crate) fn new(
        function: String,
        specs: Arc<[ParameterSpec]>,
        store: Arc<PersistentStore>,
        snapshot: Arc<SnapshotCell>,
    ) -> Self {
        Self {
            function,
            specs,
            store,
            snapshot,
            _result: PhantomData,
        }
    }

    pub fn function(&self) -> &str {
        &self.function
    }

    pub fn specs(&self) -> &[ParameterSpec] {
        &self.specs
    }

    /// Whether a snapshot has been loaded yet
    pub fn is_loaded(&self) -> bool {
        self.snapshot.get().is_some()
    }
}

impl<T: DeserializeOwned> CacheFront<T> {
    /// Look up the precomputed result for `args`
    ///
    /// Loads the snapshot from the store on first use. Arguments may be
    /// given in any order.
    pub async fn call<I, K, V>(&self, args: I) -> PrecacheResult<T>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<DomainValue>,
    {
        if !self.is_loaded() {
            self.refresh().await?;
        }
        self.lookup(args)
    }

    /// Look up `args` in the current snapshot without touching the store
    pub fn lookup<I, K, V>(&self, args: I) -> PrecacheResult<T>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<DomainValue>,
    {
        let key = self.key_for(args)?;
        let value = self.get(&key)?;
        serde_json::from_value(value).map_err(|e| PrecacheError::EntryMismatch {
            key: key.into_string(),
            reason: e.to_string(),
        })
    }

    fn get(&self, key: &CacheKey) -> PrecacheResult<serde_json::Value> {
        self.snapshot
            .get()
            .and_then(|store| store.get(key).cloned())
            .ok_or_else(|| {
                debug!("Cache miss for {}", key);
                PrecacheError::CacheMiss {
                    function: self.function.clone(),
                    key: key.to_string(),
                }
            })
    }

    /// Cache key for `args`, after checking the names match the signature
    pub fn key_for<I, K, V>(&self, args: I) -> PrecacheResult<CacheKey>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<DomainValue>,
    {
        let pairs: Vec<(String, DomainValue)> = args
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        self.check_names(&pairs)?;
        Ok(key::encode_pairs(&self.function, &pairs))
    }

    /// Reload this function's entries from the store
    ///
    /// The new snapshot replaces the old one in a single swap; concurrent
    /// lookups see either the old or the new snapshot.
    pub async fn refresh(&self) -> PrecacheResult<usize> {
        let store = self.store.load(&self.function).await?;
        let count = store.len();
        self.snapshot.replace(store);
        debug!("Refreshed {} snapshot: {} entries", self.function, count);
        Ok(count)
    }

    fn check_names(&self, pairs: &[(String, DomainValue)]) -> PrecacheResult<()> {
        let mut seen = HashSet::new();
        for (name, _) in pairs {
            if !self.specs.iter().any(|s| &s.name == name) {
                return Err(self.invalid(format!("unknown parameter {}", name)));
            }
            if !seen.insert(name.as_str()) {
                return Err(self.invalid(format!("parameter {} given twice", name)));
            }
        }

        let missing: Vec<&str> = self
            .specs
            .iter()
            .map(|s| s.name.as_str())
            .filter(|n| !seen.contains(n))
            .collect();
        if !missing.is_empty() {
            return Err(self.invalid(format!("missing {}", missing.join(", "))));
        }
        Ok(())
    }

    fn invalid(&self, reason: String) -> PrecacheError {
        PrecacheError::InvalidArguments {
            function: self.function.clone(),
            reason,
        }
    }
}
