//! Durable result store
//!
//! One JSON file maps cache keys to results for any number of functions.
//! Each key carries its function's namespace, so functions share the file
//! without colliding. The file is meant to be read and edited by people:
//! edited values are served as-is after the next load.
//!
//! # Write discipline
//!
//! - All mutation goes through a single async mutex
//! - Every write replaces the file atomically (temp file + rename)
//! - Entries are flushed after every `flush_every` upserts (default 1)
//! - Keys of other namespaces and malformed keys are preserved on write

mod file;

pub use file::Document;

use crate::error::{PrecacheError, PrecacheResult};
use crate::key::{self, CacheKey};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// All cached results of one function
#[derive(Debug, Clone, Default)]
pub struct CacheStore {
    namespace: String,
    entries: HashMap<CacheKey, Value>,
}

impl CacheStore {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            entries: HashMap::new(),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn get(&self, key: &CacheKey) -> Option<&Value> {
        self.entries.get(key)
    }

    pub fn contains(&self, key: &CacheKey) -> bool {
        self.entries.contains_key(key)
    }

    /// Insert an entry; returns the previous value for the key, if any
    pub fn insert(&mut self, key: CacheKey, value: Value) -> Option<Value> {
        self.entries.insert(key, value)
    }

    pub fn remove(&mut self, key: &CacheKey) -> Option<Value> {
        self.entries.remove(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&CacheKey, &Value)> {
        self.entries.iter()
    }
}

#[derive(Debug, Default)]
struct StoreState {
    /// Last document read from or written to disk, plus pending upserts
    document: Option<Document>,
    /// Upserts not yet written
    pending: usize,
}

/// File-backed key/result store shared by all registered functions
#[derive(Debug)]
pub struct PersistentStore {
    path: PathBuf,
    flush_every: usize,
    state: Mutex<StoreState>,
}

impl PersistentStore {
    /// Create a store backed by the file at `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            flush_every: 1,
            state: Mutex::new(StoreState::default()),
        }
    }

    /// Write to disk only after `n` upserts have accumulated
    pub fn with_flush_every(mut self, n: usize) -> Self {
        self.flush_every = n.max(1);
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the entries of `namespace` from disk
    ///
    /// A missing file yields an empty store. Keys of other namespaces are
    /// skipped; malformed keys are skipped with a warning.
    pub async fn load(&self, namespace: &str) -> PrecacheResult<CacheStore> {
        let mut state = self.state.lock().await;
        self.write_pending(&mut state).await?;

        let document = file::read_document(&self.path).await?;
        let store = filter_namespace(&document, namespace);
        state.document = Some(document);

        debug!(
            "Loaded {} entries for {} from {}",
            store.len(),
            namespace,
            self.path.display()
        );
        Ok(store)
    }

    /// Replace every entry of the store's namespace with the store contents
    pub async fn save(&self, store: &CacheStore) -> PrecacheResult<()> {
        let mut state = self.state.lock().await;
        let mut document = match state.document.take() {
            Some(doc) => doc,
            None => file::read_document(&self.path).await?,
        };

        document.retain(|k, _| !key::belongs_to(k, store.namespace()));
        for (key, value) in store.iter() {
            document.insert(key.as_str().to_string(), value.clone());
        }

        let result = file::write_document(&self.path, &document).await;
        state.document = Some(document);
        if result.is_ok() {
            state.pending = 0;
        }
        result
    }

    /// Insert one result, writing to disk once enough upserts accumulated
    pub async fn upsert(&self, namespace: &str, key: &CacheKey, value: Value) -> PrecacheResult<()> {
        if !key::belongs_to(key.as_str(), namespace) {
            return Err(PrecacheError::Internal(format!(
                "key {} does not belong to namespace {}",
                key, namespace
            )));
        }

        let mut state = self.state.lock().await;
        if state.document.is_none() {
            state.document = Some(file::read_document(&self.path).await?);
        }
        if let Some(document) = state.document.as_mut() {
            document.insert(key.as_str().to_string(), value);
        }
        state.pending += 1;

        if state.pending >= self.flush_every {
            self.write_pending(&mut state).await?;
        }
        Ok(())
    }

    /// Write any upserts still held in memory
    pub async fn flush(&self) -> PrecacheResult<()> {
        let mut state = self.state.lock().await;
        self.write_pending(&mut state).await
    }

    /// Remove the given keys of `namespace`; returns how many existed
    pub async fn remove(&self, namespace: &str, keys: &[CacheKey]) -> PrecacheResult<usize> {
        self.rewrite(|document| {
            keys.iter()
                .filter(|k| key::belongs_to(k.as_str(), namespace))
                .filter(|k| document.remove(k.as_str()).is_some())
                .count()
        })
        .await
    }

    /// Remove every entry of `namespace`; returns how many were removed
    pub async fn clear(&self, namespace: &str) -> PrecacheResult<usize> {
        self.rewrite(|document| {
            let before = document.len();
            document.retain(|k, _| !key::belongs_to(k, namespace));
            before - document.len()
        })
        .await
    }

    /// Entry counts per namespace, as currently on disk
    pub async fn namespaces(&self) -> PrecacheResult<BTreeMap<String, usize>> {
        let mut state = self.state.lock().await;
        self.write_pending(&mut state).await?;

        let document = file::read_document(&self.path).await?;
        let mut counts = BTreeMap::new();
        for k in document.keys() {
            if let Some(ns) = key::parse_namespace(k) {
                *counts.entry(ns.to_string()).or_insert(0) += 1;
            }
        }
        state.document = Some(document);
        Ok(counts)
    }

    /// Re-read the file, apply `edit`, and write it back if anything changed
    async fn rewrite<F>(&self, edit: F) -> PrecacheResult<usize>
    where
        F: FnOnce(&mut Document) -> usize,
    {
        let mut state = self.state.lock().await;
        self.write_pending(&mut state).await?;

        let mut document = file::read_document(&self.path).await?;
        let changed = edit(&mut document);
        if changed > 0 {
            file::write_document(&self.path, &document).await?;
        }
        state.document = Some(document);
        Ok(changed)
    }

    async fn write_pending(&self, state: &mut StoreState) -> PrecacheResult<()> {
        if state.pending == 0 {
            return Ok(());
        }
        if let Some(document) = state.document.as_ref() {
            file::write_document(&self.path, document).await?;
        }
        state.pending = 0;
        Ok(())
    }
}

fn filter_namespace(document: &Document, namespace: &str) -> CacheStore {
    let mut store = CacheStore::new(namespace);
    for (k, v) in document {
        match key::parse_namespace(k) {
            Some(ns) if ns == namespace => {
                store.insert(CacheKey::from_stored(k.clone()), v.clone());
            }
            Some(_) => {}
            None => warn!("Ignoring malformed store key: {}", k),
        }
    }
    store
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::DomainValue;
    use crate::key::encode_pairs;
    use tempfile::TempDir;

    fn key(namespace: &str, store: i64) -> CacheKey {
        encode_pairs(namespace, &[("store".to_string(), DomainValue::Int(store))])
    }

    fn test_store(dir: &TempDir) -> PersistentStore {
        PersistentStore::new(dir.path().join("store.json"))
    }

    #[tokio::test]
    async fn load_missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let store = test_store(&dir).load("sales").await.unwrap();
        assert!(store.is_empty());
        assert_eq!(store.namespace(), "sales");
    }

    #[tokio::test]
    async fn upsert_is_durable_immediately() {
        let dir = TempDir::new().unwrap();
        let store = test_store(&dir);
        store
            .upsert("sales", &key("sales", 101), serde_json::json!({"total": 5}))
            .await
            .unwrap();

        // A second handle sees the entry without any flush
        let reopened = test_store(&dir).load("sales").await.unwrap();
        assert_eq!(
            reopened.get(&key("sales", 101)),
            Some(&serde_json::json!({"total": 5}))
        );
    }

    #[tokio::test]
    async fn batched_upserts_wait_for_flush() {
        let dir = TempDir::new().unwrap();
        let store = test_store(&dir).with_flush_every(3);

        store.upsert("sales", &key("sales", 1), serde_json::json!(1)).await.unwrap();
        store.upsert("sales", &key("sales", 2), serde_json::json!(2)).await.unwrap();
        assert!(!store.path().exists());

        store.flush().await.unwrap();
        assert_eq!(test_store(&dir).load("sales").await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn namespaces_do_not_collide() {
        let dir = TempDir::new().unwrap();
        let store = test_store(&dir);
        store.upsert("sales", &key("sales", 1), serde_json::json!("s")).await.unwrap();
        store.upsert("returns", &key("returns", 1), serde_json::json!("r")).await.unwrap();

        let sales = store.load("sales").await.unwrap();
        assert_eq!(sales.len(), 1);
        assert_eq!(sales.get(&key("sales", 1)), Some(&serde_json::json!("s")));

        let counts = store.namespaces().await.unwrap();
        assert_eq!(counts.get("sales"), Some(&1));
        assert_eq!(counts.get("returns"), Some(&1));
    }

    #[tokio::test]
    async fn upsert_rejects_foreign_key() {
        let dir = TempDir::new().unwrap();
        let err = test_store(&dir)
            .upsert("sales", &key("returns", 1), serde_json::json!(0))
            .await
            .unwrap_err();
        assert!(matches!(err, PrecacheError::Internal(_)));
    }

    #[tokio::test]
    async fn malformed_keys_are_ignored_and_preserved() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("store.json");
        std::fs::write(
            &path,
            r#"{"sales:region=Region.EMEA": 1, "sales::{\"store\":7}": {"total": 7}}"#,
        )
        .unwrap();

        let store = PersistentStore::new(&path);
        let sales = store.load("sales").await.unwrap();
        assert_eq!(sales.len(), 1);

        store.upsert("sales", &key("sales", 8), serde_json::json!(8)).await.unwrap();
        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.contains("sales:region=Region.EMEA"));
    }

    #[tokio::test]
    async fn corrupt_file_fails_load() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("store.json"), "garbage").unwrap();
        let err = test_store(&dir).load("sales").await.unwrap_err();
        assert!(matches!(err, PrecacheError::StoreCorrupt { .. }));
    }

    #[tokio::test]
    async fn manual_edits_are_honored_on_load() {
        let dir = TempDir::new().unwrap();
        let store = test_store(&dir);
        let k = key("sales", 101);
        store.upsert("sales", &k, serde_json::json!({"total": 5})).await.unwrap();

        let raw = std::fs::read_to_string(store.path()).unwrap();
        std::fs::write(store.path(), raw.replace("5", "42")).unwrap();

        let reloaded = store.load("sales").await.unwrap();
        assert_eq!(reloaded.get(&k), Some(&serde_json::json!({"total": 42})));
    }

    #[tokio::test]
    async fn save_replaces_only_own_namespace() {
        let dir = TempDir::new().unwrap();
        let store = test_store(&dir);
        store.upsert("sales", &key("sales", 1), serde_json::json!(1)).await.unwrap();
        store.upsert("returns", &key("returns", 1), serde_json::json!(1)).await.unwrap();

        let mut sales = CacheStore::new("sales");
        sales.insert(key("sales", 2), serde_json::json!(2));
        store.save(&sales).await.unwrap();

        let reloaded = store.load("sales").await.unwrap();
        assert_eq!(reloaded.len(), 1);
        assert!(reloaded.contains(&key("sales", 2)));
        assert_eq!(store.load("returns").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn remove_and_clear() {
        let dir = TempDir::new().unwrap();
        let store = test_store(&dir);
        for n in 1..=3 {
            store.upsert("sales", &key("sales", n), serde_json::json!(n)).await.unwrap();
        }
        store.upsert("returns", &key("returns", 1), serde_json::json!(1)).await.unwrap();

        assert_eq!(store.remove("sales", &[key("sales", 1), key("sales", 9)]).await.unwrap(), 1);
        assert_eq!(store.clear("sales").await.unwrap(), 2);
        assert!(store.load("sales").await.unwrap().is_empty());
        assert_eq!(store.load("returns").await.unwrap().len(), 1);
    }
}
