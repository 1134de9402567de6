//! Flat-file JSON persistence.
//!
//! Each collection is a single JSON array at `<DATA_DIR>/<name>.json`. Reads
//! are lock-free and tolerate missing or damaged files. Mutations take a
//! per-collection lock, so read-modify-write cycles inside one process never
//! lose updates, and every write goes through a temp file plus `rename` so a
//! reader never observes a half-written array.
//!
//! Entries that do not decode as the collection's record type are hidden
//! from readers but carried through every rewrite untouched, so a mutation
//! never drops data it could not understand.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::instrument;

use crate::models::{AdminAccount, BlogPost, Order, Product};

/// Errors from the persistence layer.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Filesystem operation failed.
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Records could not be serialized.
    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// A record stored in a [`JsonCollection`].
pub trait Record: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Identifier used for lookups, compared as a string.
    fn record_id(&self) -> &str;
}

/// Result of loading a collection file.
enum Loaded<T> {
    Missing,
    Records {
        records: Vec<T>,
        undecodable: Vec<serde_json::Value>,
    },
    Corrupt(String),
}

/// A named collection persisted as one JSON array file.
pub struct JsonCollection<T> {
    inner: Arc<CollectionInner>,
    _marker: std::marker::PhantomData<fn() -> T>,
}

struct CollectionInner {
    name: &'static str,
    path: PathBuf,
    lock: Mutex<()>,
}

impl<T> Clone for JsonCollection<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            _marker: std::marker::PhantomData,
        }
    }
}

impl<T: Record> JsonCollection<T> {
    /// Bind a collection to `<dir>/<name>.json`.
    #[must_use]
    pub fn new(dir: &Path, name: &'static str) -> Self {
        Self {
            inner: Arc::new(CollectionInner {
                name,
                path: dir.join(format!("{name}.json")),
                lock: Mutex::new(()),
            }),
            _marker: std::marker::PhantomData,
        }
    }

    /// Collection name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.inner.name
    }

    /// Path of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.inner.path
    }

    /// Read every record.
    ///
    /// A missing file is an empty collection. A file that cannot be read or
    /// is not a JSON array is also treated as empty, with a warning.
    pub async fn read(&self) -> Vec<T> {
        match self.load().await {
            Loaded::Missing => Vec::new(),
            Loaded::Records { records, .. } => records,
            Loaded::Corrupt(reason) => {
                tracing::warn!(
                    collection = self.name(),
                    reason = %reason,
                    "Collection file unreadable, treating as empty"
                );
                Vec::new()
            }
        }
    }

    /// Find a record by identifier.
    pub async fn find(&self, id: &str) -> Option<T> {
        self.read().await.into_iter().find(|r| r.record_id() == id)
    }

    /// Inspect the backing file without repairing it.
    ///
    /// Returns the count of decodable records, or the reason the file is
    /// unreadable.
    pub async fn check(&self) -> Result<usize, String> {
        match self.load().await {
            Loaded::Missing => Ok(0),
            Loaded::Records { records, .. } => Ok(records.len()),
            Loaded::Corrupt(reason) => Err(reason),
        }
    }

    /// Run a read-modify-write cycle under the collection lock.
    ///
    /// The closure receives the current records. Returning `Ok(Some(_))`
    /// persists the (possibly modified) records; `Ok(None)` leaves the file
    /// untouched. A corrupt file is moved aside before the closure runs.
    ///
    /// # Errors
    ///
    /// Returns the closure's error unchanged, or a [`StoreError`] (converted
    /// into `E`) if the file cannot be written.
    pub async fn mutate<R, E, F>(&self, f: F) -> Result<Option<R>, E>
    where
        F: FnOnce(&mut Vec<T>) -> Result<Option<R>, E>,
        E: From<StoreError>,
    {
        let _guard = self.inner.lock.lock().await;

        let (mut records, undecodable) = self.load_for_update().await?;
        let outcome = f(&mut records)?;

        if outcome.is_some() {
            self.write_locked(&records, &undecodable).await?;
        }

        Ok(outcome)
    }

    /// Append a record.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] if the file cannot be written.
    pub async fn insert(&self, record: T) -> Result<T, StoreError> {
        self.insert_with(|_| Ok::<_, StoreError>(record)).await
    }

    /// Build a record from the current contents and append it, all under
    /// the collection lock.
    ///
    /// Used when the new record depends on what is already stored, such as
    /// a generated identifier or a uniqueness check.
    ///
    /// # Errors
    ///
    /// Returns the builder's error unchanged, or a [`StoreError`] (converted
    /// into `E`) if the file cannot be written.
    pub async fn insert_with<E, F>(&self, build: F) -> Result<T, E>
    where
        F: FnOnce(&[T]) -> Result<T, E>,
        E: From<StoreError>,
    {
        let _guard = self.inner.lock.lock().await;

        let (mut records, undecodable) = self.load_for_update().await?;
        let record = build(&records)?;
        records.push(record.clone());
        self.write_locked(&records, &undecodable).await?;

        Ok(record)
    }

    /// Apply `f` to the record with the given identifier.
    ///
    /// Returns the updated record, or `None` if no record matched (in which
    /// case the file is not rewritten).
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] if the file cannot be written.
    pub async fn update<F>(&self, id: &str, f: F) -> Result<Option<T>, StoreError>
    where
        F: FnOnce(&mut T),
    {
        self.mutate(|records| {
            let Some(record) = records.iter_mut().find(|r| r.record_id() == id) else {
                return Ok(None);
            };
            f(record);
            Ok(Some(record.clone()))
        })
        .await
    }

    /// Remove the record with the given identifier.
    ///
    /// Returns the removed record, or `None` if no record matched.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] if the file cannot be written.
    pub async fn remove(&self, id: &str) -> Result<Option<T>, StoreError> {
        self.mutate(|records| {
            let Some(pos) = records.iter().position(|r| r.record_id() == id) else {
                return Ok(None);
            };
            Ok(Some(records.remove(pos)))
        })
        .await
    }

    /// Replace the whole collection, including any undecodable entries.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] if the file cannot be written.
    pub async fn write(&self, records: &[T]) -> Result<(), StoreError> {
        let _guard = self.inner.lock.lock().await;
        self.write_locked(records, &[]).await
    }

    async fn load(&self) -> Loaded<T> {
        let bytes = match tokio::fs::read(self.path()).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Loaded::Missing,
            Err(e) => return Loaded::Corrupt(e.to_string()),
        };

        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Loaded::Records {
                records: Vec::new(),
                undecodable: Vec::new(),
            };
        }

        let values: Vec<serde_json::Value> = match serde_json::from_slice(&bytes) {
            Ok(values) => values,
            Err(e) => return Loaded::Corrupt(e.to_string()),
        };

        let mut records = Vec::with_capacity(values.len());
        let mut undecodable = Vec::new();
        for (index, value) in values.into_iter().enumerate() {
            match T::deserialize(&value) {
                Ok(record) => records.push(record),
                Err(e) => {
                    tracing::warn!(
                        collection = self.name(),
                        index,
                        error = %e,
                        "Record failed to decode, preserving it as-is"
                    );
                    undecodable.push(value);
                }
            }
        }

        Loaded::Records {
            records,
            undecodable,
        }
    }

    #[instrument(skip(self), fields(collection = self.name()))]
    async fn load_for_update(&self) -> Result<(Vec<T>, Vec<serde_json::Value>), StoreError> {
        match self.load().await {
            Loaded::Missing => Ok((Vec::new(), Vec::new())),
            Loaded::Records {
                records,
                undecodable,
            } => Ok((records, undecodable)),
            Loaded::Corrupt(reason) => {
                let quarantine = self.path().with_extension(format!(
                    "json.corrupt-{}",
                    chrono::Utc::now().timestamp()
                ));
                tokio::fs::rename(self.path(), &quarantine)
                    .await
                    .map_err(|source| StoreError::Io {
                        path: self.path().to_path_buf(),
                        source,
                    })?;
                tracing::warn!(
                    reason = %reason,
                    moved_to = %quarantine.display(),
                    "Corrupt collection file moved aside"
                );
                Ok((Vec::new(), Vec::new()))
            }
        }
    }

    async fn write_locked(
        &self,
        records: &[T],
        undecodable: &[serde_json::Value],
    ) -> Result<(), StoreError> {
        let mut values = records
            .iter()
            .map(serde_json::to_value)
            .collect::<Result<Vec<_>, _>>()?;
        values.extend_from_slice(undecodable);
        let json = serde_json::to_vec_pretty(&values)?;
        let io_err = |source| StoreError::Io {
            path: self.path().to_path_buf(),
            source,
        };

        if let Some(dir) = self.path().parent() {
            tokio::fs::create_dir_all(dir).await.map_err(io_err)?;
        }

        let tmp = self
            .path()
            .with_extension(format!("json.tmp-{}", uuid::Uuid::new_v4().simple()));
        tokio::fs::write(&tmp, json).await.map_err(io_err)?;
        if let Err(source) = tokio::fs::rename(&tmp, self.path()).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(io_err(source));
        }

        tracing::debug!(
            collection = self.name(),
            count = records.len(),
            preserved = undecodable.len(),
            "Collection written"
        );
        Ok(())
    }
}

/// Generate a millisecond-timestamp identifier that is not already taken.
///
/// Starts at `now_ms` and counts up until the value is unused, so records
/// created within the same millisecond still get distinct IDs.
#[must_use]
pub fn unique_timestamp_id<T: Record>(existing: &[T], now_ms: i64) -> String {
    let mut candidate = now_ms;
    loop {
        let id = candidate.to_string();
        if !existing.iter().any(|r| r.record_id() == id) {
            return id;
        }
        candidate += 1;
    }
}

/// All collections used by the server.
#[derive(Clone)]
pub struct Store {
    pub products: JsonCollection<Product>,
    pub orders: JsonCollection<Order>,
    pub blog_posts: JsonCollection<BlogPost>,
    pub admins: JsonCollection<AdminAccount>,
}

impl Store {
    /// Bind every collection under `data_dir`.
    #[must_use]
    pub fn new(data_dir: &Path) -> Self {
        Self {
            products: JsonCollection::new(data_dir, "products"),
            orders: JsonCollection::new(data_dir, "orders"),
            blog_posts: JsonCollection::new(data_dir, "blog_posts"),
            admins: JsonCollection::new(data_dir, "admins"),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Note {
        id: String,
        text: String,
    }

    impl Record for Note {
        fn record_id(&self) -> &str {
            &self.id
        }
    }

    fn note(id: &str, text: &str) -> Note {
        Note {
            id: id.to_string(),
            text: text.to_string(),
        }
    }

    fn temp_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("bagworks-store-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[tokio::test]
    async fn test_missing_file_reads_empty() {
        let dir = temp_dir();
        let notes: JsonCollection<Note> = JsonCollection::new(&dir, "notes");
        assert!(notes.read().await.is_empty());
        assert_eq!(notes.check().await, Ok(0));
    }

    #[tokio::test]
    async fn test_malformed_file_reads_empty() {
        let dir = temp_dir();
        std::fs::write(dir.join("notes.json"), "{\"not\": \"an array\"}").unwrap();
        let notes: JsonCollection<Note> = JsonCollection::new(&dir, "notes");

        assert!(notes.read().await.is_empty());
        assert!(notes.check().await.is_err());
    }

    #[tokio::test]
    async fn test_undecodable_records_are_skipped() {
        let dir = temp_dir();
        std::fs::write(
            dir.join("notes.json"),
            r#"[{"id":"1","text":"kept"},{"id":2},{"id":"3","text":"also kept"}]"#,
        )
        .unwrap();
        let notes: JsonCollection<Note> = JsonCollection::new(&dir, "notes");

        let ids: Vec<_> = notes.read().await.into_iter().map(|n| n.id).collect();
        assert_eq!(ids, vec!["1", "3"]);
    }

    #[tokio::test]
    async fn test_mutation_preserves_undecodable_records() {
        let dir = temp_dir();
        std::fs::write(
            dir.join("notes.json"),
            r#"[{"id":"1","text":"kept"},{"id":2,"extra":true}]"#,
        )
        .unwrap();
        let notes: JsonCollection<Note> = JsonCollection::new(&dir, "notes");

        notes.insert(note("3", "new")).await.unwrap();
        notes
            .update("1", |n: &mut Note| n.text = "edited".to_string())
            .await
            .unwrap();
        notes.remove("3").await.unwrap();

        let stored: Vec<serde_json::Value> =
            serde_json::from_slice(&std::fs::read(notes.path()).unwrap()).unwrap();
        assert_eq!(
            stored,
            vec![
                serde_json::json!({"id": "1", "text": "edited"}),
                serde_json::json!({"id": 2, "extra": true}),
            ]
        );
        assert_eq!(notes.check().await, Ok(1));
    }

    #[tokio::test]
    async fn test_insert_then_find() {
        let dir = temp_dir();
        let notes = JsonCollection::new(&dir, "notes");
        notes.insert(note("1", "first")).await.unwrap();
        notes.insert(note("2", "second")).await.unwrap();

        assert_eq!(notes.read().await.len(), 2);
        assert_eq!(notes.find("2").await, Some(note("2", "second")));
        assert_eq!(notes.find("3").await, None);
    }

    #[tokio::test]
    async fn test_update_missing_leaves_file_untouched() {
        let dir = temp_dir();
        let notes = JsonCollection::new(&dir, "notes");
        notes.insert(note("1", "first")).await.unwrap();
        let before = std::fs::read(notes.path()).unwrap();

        let updated = notes
            .update("404", |n: &mut Note| n.text = "changed".to_string())
            .await
            .unwrap();

        assert!(updated.is_none());
        assert_eq!(std::fs::read(notes.path()).unwrap(), before);
    }

    #[tokio::test]
    async fn test_update_and_remove() {
        let dir = temp_dir();
        let notes = JsonCollection::new(&dir, "notes");
        notes.insert(note("1", "first")).await.unwrap();

        let updated = notes
            .update("1", |n: &mut Note| n.text = "edited".to_string())
            .await
            .unwrap();
        assert_eq!(updated, Some(note("1", "edited")));

        assert_eq!(notes.remove("1").await.unwrap(), Some(note("1", "edited")));
        assert_eq!(notes.remove("1").await.unwrap(), None);
        assert!(notes.read().await.is_empty());
    }

    #[tokio::test]
    async fn test_mutation_quarantines_corrupt_file() {
        let dir = temp_dir();
        std::fs::write(dir.join("notes.json"), "not json at all").unwrap();
        let notes = JsonCollection::new(&dir, "notes");

        notes.insert(note("1", "fresh")).await.unwrap();

        assert_eq!(notes.read().await, vec![note("1", "fresh")]);
        let quarantined = std::fs::read_dir(&dir)
            .unwrap()
            .filter_map(Result::ok)
            .any(|e| e.file_name().to_string_lossy().starts_with("notes.json.corrupt-"));
        assert!(quarantined);
    }

    #[tokio::test]
    async fn test_concurrent_inserts_are_not_lost() {
        let dir = temp_dir();
        let notes: JsonCollection<Note> = JsonCollection::new(&dir, "notes");

        let handles: Vec<_> = (0..20)
            .map(|i| {
                let notes = notes.clone();
                tokio::spawn(async move { notes.insert(note(&i.to_string(), "x")).await })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(notes.read().await.len(), 20);
    }

    #[test]
    fn test_unique_timestamp_id_skips_taken_values() {
        let existing = vec![note("1000", "a"), note("1001", "b")];
        assert_eq!(unique_timestamp_id(&existing, 1000), "1002");
        assert_eq!(unique_timestamp_id(&existing, 999), "999");
    }
}
