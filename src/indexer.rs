use std::collections::HashSet;

use tantivy::IndexWriter;
use tracing::{debug, info, warn};

use crate::{
    config::IndexConfig,
    document::IndexedDocument,
    error::Result,
    extract::{self, Extraction},
    sidecar,
    store::{DocStore, StoreBatch},
    text_index::TextIndex,
    walker::{self, DiscoveredFile},
};

/// How a discovered file compares with what the store remembers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Staleness {
    /// No record for this path yet.
    New,
    /// A record exists but its mtime differs from the file's.
    Changed,
    /// The stored mtime equals the file's exactly.
    Unchanged,
}

impl Staleness {
    /// Compare a stored mtime with the current one. Any difference, however
    /// small, counts as a change.
    ///
    /// # Examples
    ///
    /// ```
    /// use scandex::indexer::Staleness;
    ///
    /// assert_eq!(Staleness::of(None, 10.0), Staleness::New);
    /// assert_eq!(Staleness::of(Some(10.0), 10.0), Staleness::Unchanged);
    /// assert_eq!(Staleness::of(Some(10.0), 10.000001), Staleness::Changed);
    /// ```
    pub fn of(stored: Option<f64>, current: f64) -> Self {
        match stored {
            None => Self::New,
            Some(mtime) if mtime == current => Self::Unchanged,
            Some(_) => Self::Changed,
        }
    }
}

/// What one run did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexReport {
    /// Documents found in the source directory.
    pub scanned: usize,
    /// Records created for paths seen for the first time.
    pub added: usize,
    /// Existing records replaced because the file's mtime moved.
    pub refreshed: usize,
    /// Files left alone because their mtime matched.
    pub skipped: usize,
    /// Written records whose text is the failure sentinel.
    pub extraction_failures: usize,
    /// Records removed because their file disappeared.
    pub pruned: usize,
}

impl IndexReport {
    /// Number of records written this run.
    pub fn touched(&self) -> usize {
        self.added + self.refreshed
    }
}

/// Owns the open store and text index for a configuration.
#[derive(Debug)]
pub struct Indexer {
    config: IndexConfig,
    store: DocStore,
    text: TextIndex,
}

impl Indexer {
    /// Open (creating if needed) the store behind `config`.
    pub fn open(config: IndexConfig) -> Result<Self> {
        config.ensure_store_dir()?;
        let store = DocStore::open(&config.docs_db())?;
        let text = TextIndex::open(&config.text_index_dir())?;
        Ok(Self {
            config,
            store,
            text,
        })
    }

    /// Bring the store up to date with the source directory.
    ///
    /// Everything is committed once at the end, the text index first. Any
    /// error other than a failed text extraction aborts the run and
    /// discards its writes. A run that changes nothing commits nothing.
    pub fn run(&self) -> Result<IndexReport> {
        let files = walker::discover_documents(
            &self.config.source_dir,
            &self.config.document_extension,
        )?;
        debug!(
            count = files.len(),
            dir = %self.config.source_dir.display(),
            "discovered documents"
        );

        let mut batch = self.store.begin_batch()?;
        let mut writer = self.text.writer()?;
        let mut report = IndexReport {
            scanned: files.len(),
            ..Default::default()
        };

        for file in &files {
            self.process(file, &mut batch, &writer, &mut report)?;
        }

        if self.config.prune_orphans {
            report.pruned = self.prune(&files, &mut batch, &writer)?;
        }

        if batch.writes() == 0 {
            writer.rollback()?;
            batch.abort()?;
            info!(skipped = report.skipped, "index already up to date");
            return Ok(report);
        }

        writer.commit()?;
        batch.commit()?;

        info!(
            added = report.added,
            refreshed = report.refreshed,
            skipped = report.skipped,
            failures = report.extraction_failures,
            pruned = report.pruned,
            "index updated"
        );
        Ok(report)
    }

    fn process(
        &self,
        file: &DiscoveredFile,
        batch: &mut StoreBatch,
        writer: &IndexWriter,
        report: &mut IndexReport,
    ) -> Result<()> {
        let key = file.key();
        let staleness = Staleness::of(batch.stored_mtime(&key)?, file.mtime);
        if staleness == Staleness::Unchanged {
            debug!(path = %key, "unchanged");
            report.skipped += 1;
            return Ok(());
        }

        let meta = sidecar::load(&self.config.sidecar_path(&file.stem))?;
        let tags = meta.tags.clone().unwrap_or_default();
        let extraction =
            extract::extract_text(&file.path, self.config.max_pages);
        if let Extraction::Failed(err) = &extraction {
            warn!(path = %key, error = %err, "text extraction failed");
            report.extraction_failures += 1;
        }

        let text = extraction.into_stored_text();
        let doc = IndexedDocument::for_file(file, meta, text);
        let stored = batch.upsert(&doc)?;
        self.text.upsert(writer, &stored, &tags)?;

        if staleness == Staleness::New {
            debug!(path = %key, id = stored.id, "added");
            report.added += 1;
        } else {
            debug!(path = %key, id = stored.id, "refreshed");
            report.refreshed += 1;
        }
        Ok(())
    }

    /// Remove records for files of the source directory that no longer
    /// exist. Records outside the source directory are left alone.
    fn prune(
        &self,
        files: &[DiscoveredFile],
        batch: &mut StoreBatch,
        writer: &IndexWriter,
    ) -> Result<usize> {
        let present: HashSet<String> = files.iter().map(|f| f.key()).collect();
        let mut pruned = 0;

        for path in batch.paths()? {
            if present.contains(&path) {
                continue;
            }
            let in_source_dir = std::path::Path::new(&path).parent()
                == Some(self.config.source_dir.as_path());
            if !in_source_dir {
                continue;
            }
            batch.remove(&path)?;
            self.text.delete_path(writer, &path)?;
            debug!(path = %path, "pruned");
            pruned += 1;
        }
        Ok(pruned)
    }
}

/// Open the store for `config`, run once, and close it again.
pub fn run(config: &IndexConfig) -> Result<IndexReport> {
    Indexer::open(config.clone())?.run()
}
