use std::path::Path;

use redb::{
    Database,
    ReadableDatabase,
    ReadableTable,
    ReadableTableMetadata,
    TableDefinition,
    WriteTransaction,
};

use crate::{
    document::IndexedDocument,
    error::{Error, Result},
};

/// id -> JSON-encoded [`IndexedDocument`].
const DOCS: TableDefinition<u64, &[u8]> = TableDefinition::new("docs");
/// path -> id. Enforces one record per path.
const DOC_PATHS: TableDefinition<&str, u64> = TableDefinition::new("doc_paths");

/// Persistent record store, keyed by document path.
pub struct DocStore {
    db: Database,
}

impl DocStore {
    /// Open or create the database, creating missing tables.
    pub fn open(path: &Path) -> Result<Self> {
        let db = Database::create(path)?;

        let txn = db.begin_write()?;
        txn.open_table(DOCS)?;
        txn.open_table(DOC_PATHS)?;
        txn.commit()?;

        Ok(Self { db })
    }

    /// Open a database that an indexing run already created. Nothing is
    /// created when `path` is absent.
    pub fn open_existing(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(Error::NotFound {
                kind: "store",
                name: path.display().to_string(),
            });
        }
        Ok(Self {
            db: Database::open(path)?,
        })
    }

    /// Start the write transaction for an indexing run.
    pub fn begin_batch(&self) -> Result<StoreBatch> {
        Ok(StoreBatch {
            txn: self.db.begin_write()?,
            writes: 0,
        })
    }

    pub fn get(&self, path: &str) -> Result<Option<IndexedDocument>> {
        let txn = self.db.begin_read()?;
        let paths = txn.open_table(DOC_PATHS)?;
        let Some(id) = paths.get(path)?.map(|v| v.value()) else {
            return Ok(None);
        };
        let docs = txn.open_table(DOCS)?;
        docs.get(id)?.map(|v| decode(v.value())).transpose()
    }

    /// All records in id order.
    pub fn list(&self) -> Result<Vec<IndexedDocument>> {
        let txn = self.db.begin_read()?;
        let docs = txn.open_table(DOCS)?;
        let mut result = Vec::new();
        for entry in docs.iter()? {
            let (_id, v) = entry?;
            result.push(decode(v.value())?);
        }
        Ok(result)
    }

    pub fn count(&self) -> Result<u64> {
        let txn = self.db.begin_read()?;
        let docs = txn.open_table(DOCS)?;
        Ok(docs.len()?)
    }
}

impl std::fmt::Debug for DocStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocStore").finish_non_exhaustive()
    }
}

/// Writes of one run. Nothing is visible to readers until [`Self::commit`];
/// dropping the batch discards it.
pub struct StoreBatch {
    txn: WriteTransaction,
    writes: usize,
}

impl StoreBatch {
    /// The modification time recorded for `path`, if it was indexed before.
    pub fn stored_mtime(&self, path: &str) -> Result<Option<f64>> {
        let paths = self.txn.open_table(DOC_PATHS)?;
        let Some(id) = paths.get(path)?.map(|v| v.value()) else {
            return Ok(None);
        };
        let docs = self.txn.open_table(DOCS)?;
        let doc = docs.get(id)?.map(|v| decode(v.value())).transpose()?;
        Ok(doc.map(|d| d.mtime))
    }

    /// Insert `doc`, or replace every field of the record with the same
    /// path while keeping its id. Returns the stored record.
    pub fn upsert(&mut self, doc: &IndexedDocument) -> Result<IndexedDocument> {
        let stored = {
            let mut paths = self.txn.open_table(DOC_PATHS)?;
            let mut docs = self.txn.open_table(DOCS)?;

            let existing = paths.get(doc.path.as_str())?.map(|v| v.value());
            let id = match existing {
                Some(id) => id,
                None => docs.last()?.map(|(k, _)| k.value() + 1).unwrap_or(1),
            };

            let stored = IndexedDocument {
                id,
                ..doc.clone()
            };
            let bytes = serde_json::to_vec(&stored)?;
            docs.insert(id, bytes.as_slice())?;
            if existing.is_none() {
                paths.insert(doc.path.as_str(), id)?;
            }
            stored
        };
        self.writes += 1;
        Ok(stored)
    }

    /// Delete the record for `path`. Returns whether one existed.
    pub fn remove(&mut self, path: &str) -> Result<bool> {
        let removed = {
            let mut paths = self.txn.open_table(DOC_PATHS)?;
            let id = paths.remove(path)?.map(|v| v.value());
            match id {
                Some(id) => {
                    let mut docs = self.txn.open_table(DOCS)?;
                    docs.remove(id)?;
                    true
                }
                None => false,
            }
        };
        if removed {
            self.writes += 1;
        }
        Ok(removed)
    }

    /// Every indexed path, sorted.
    pub fn paths(&self) -> Result<Vec<String>> {
        let paths = self.txn.open_table(DOC_PATHS)?;
        let mut result = Vec::new();
        for entry in paths.iter()? {
            let (k, _v) = entry?;
            result.push(k.value().to_string());
        }
        Ok(result)
    }

    /// Number of upserts and removals made so far.
    pub fn writes(&self) -> usize {
        self.writes
    }

    pub fn commit(self) -> Result<()> {
        self.txn.commit()?;
        Ok(())
    }

    pub fn abort(self) -> Result<()> {
        self.txn.abort()?;
        Ok(())
    }
}

fn decode(bytes: &[u8]) -> Result<IndexedDocument> {
    Ok(serde_json::from_slice(bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sidecar::SidecarMetadata;

    fn test_store() -> (tempfile::TempDir, DocStore) {
        let tmp = tempfile::tempdir().unwrap();
        let store = DocStore::open(&tmp.path().join("docs.redb")).unwrap();
        (tmp, store)
    }

    fn doc(path: &str, title: &str, mtime: f64) -> IndexedDocument {
        IndexedDocument::from_parts(
            path.to_string(),
            SidecarMetadata {
                title: Some(title.to_string()),
                ..Default::default()
            },
            mtime,
            format!("text of {path}"),
        )
    }

    #[test]
    fn upsert_assigns_increasing_ids() {
        let (_tmp, store) = test_store();
        let mut batch = store.begin_batch().unwrap();
        let a = batch.upsert(&doc("a.pdf", "A", 1.0)).unwrap();
        let b = batch.upsert(&doc("b.pdf", "B", 2.0)).unwrap();
        batch.commit().unwrap();

        assert_eq!(a.id, 1);
        assert_eq!(b.id, 2);
        assert_eq!(store.count().unwrap(), 2);
        assert_eq!(store.get("a.pdf").unwrap().unwrap(), a);
        assert_eq!(store.get("b.pdf").unwrap().unwrap(), b);
    }

    #[test]
    fn upsert_replaces_existing_record() {
        let (_tmp, store) = test_store();
        let mut batch = store.begin_batch().unwrap();
        let first = batch.upsert(&doc("a.pdf", "Old", 1.0)).unwrap();
        batch.commit().unwrap();

        let mut batch = store.begin_batch().unwrap();
        let mut replacement = doc("a.pdf", "New", 2.5);
        replacement.lecture = Some(7);
        let second = batch.upsert(&replacement).unwrap();
        batch.commit().unwrap();

        assert_eq!(second.id, first.id);
        assert_eq!(store.count().unwrap(), 1);
        let stored = store.get("a.pdf").unwrap().unwrap();
        assert_eq!(stored.title.as_deref(), Some("New"));
        assert_eq!(stored.lecture, Some(7));
        assert_eq!(stored.mtime, 2.5);
    }

    #[test]
    fn stored_mtime_sees_uncommitted_writes() {
        let (_tmp, store) = test_store();
        let mut batch = store.begin_batch().unwrap();
        assert_eq!(batch.stored_mtime("a.pdf").unwrap(), None);
        batch.upsert(&doc("a.pdf", "A", 123.456)).unwrap();
        assert_eq!(batch.stored_mtime("a.pdf").unwrap(), Some(123.456));
        assert_eq!(batch.writes(), 1);
    }

    #[test]
    fn aborted_and_dropped_batches_leave_no_trace() {
        let (_tmp, store) = test_store();

        let mut batch = store.begin_batch().unwrap();
        batch.upsert(&doc("a.pdf", "A", 1.0)).unwrap();
        batch.abort().unwrap();
        assert_eq!(store.count().unwrap(), 0);

        {
            let mut batch = store.begin_batch().unwrap();
            batch.upsert(&doc("b.pdf", "B", 1.0)).unwrap();
        }
        assert_eq!(store.count().unwrap(), 0);
        assert_eq!(store.get("b.pdf").unwrap(), None);
    }

    #[test]
    fn remove_deletes_both_tables() {
        let (_tmp, store) = test_store();
        let mut batch = store.begin_batch().unwrap();
        batch.upsert(&doc("a.pdf", "A", 1.0)).unwrap();
        batch.upsert(&doc("b.pdf", "B", 1.0)).unwrap();
        assert!(batch.remove("a.pdf").unwrap());
        assert!(!batch.remove("a.pdf").unwrap());
        assert_eq!(batch.paths().unwrap(), vec!["b.pdf"]);
        batch.commit().unwrap();

        assert_eq!(store.get("a.pdf").unwrap(), None);
        assert_eq!(store.list().unwrap().len(), 1);
    }

    #[test]
    fn reopen_preserves_data() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("docs.redb");

        {
            let store = DocStore::open(&path).unwrap();
            let mut batch = store.begin_batch().unwrap();
            batch.upsert(&doc("a.pdf", "Kept", 9.0)).unwrap();
            batch.commit().unwrap();
        }

        {
            let store = DocStore::open_existing(&path).unwrap();
            let stored = store.get("a.pdf").unwrap().unwrap();
            assert_eq!(stored.title.as_deref(), Some("Kept"));
            assert_eq!(stored.id, 1);
        }
    }

    #[test]
    fn open_existing_does_not_create() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("absent").join("docs.redb");

        let err = DocStore::open_existing(&path).unwrap_err();
        assert!(matches!(err, Error::NotFound { kind: "store", .. }));
        assert!(!tmp.path().join("absent").exists());
    }

    #[test]
    fn not_found_returns_none() {
        let (_tmp, store) = test_store();
        assert_eq!(store.get("ghost.pdf").unwrap(), None);
        assert!(store.list().unwrap().is_empty());
    }
}
