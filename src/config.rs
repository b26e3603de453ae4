use std::path::PathBuf;

use crate::error::{Error, Result};

pub const DEFAULT_SOURCE_DIR: &str = "data/scans_ocr";
pub const DEFAULT_META_DIR: &str = "meta";
pub const DEFAULT_STORE_DIR: &str = "index";
pub const DEFAULT_MAX_PAGES: usize = 100;

/// Explicit values that take priority over the environment and defaults.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub source_dir: Option<PathBuf>,
    pub meta_dir: Option<PathBuf>,
    pub store_dir: Option<PathBuf>,
    pub max_pages: Option<usize>,
    pub prune_orphans: bool,
}

/// Everything a single indexing run needs to know.
#[derive(Debug, Clone)]
pub struct IndexConfig {
    /// Flat directory of documents. Only the top level is scanned.
    pub source_dir: PathBuf,
    /// Directory holding `<stem>.<sidecar_extension>` metadata files.
    pub meta_dir: PathBuf,
    /// Directory holding the record database and the text index.
    pub store_dir: PathBuf,
    /// Pages past this bound are not extracted.
    pub max_pages: usize,
    pub document_extension: String,
    pub sidecar_extension: String,
    /// Remove records whose source file has disappeared.
    pub prune_orphans: bool,
}

impl IndexConfig {
    /// Build a config with default knobs over explicit locations.
    pub fn new(
        source_dir: impl Into<PathBuf>,
        meta_dir: impl Into<PathBuf>,
        store_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            source_dir: source_dir.into(),
            meta_dir: meta_dir.into(),
            store_dir: store_dir.into(),
            max_pages: DEFAULT_MAX_PAGES,
            document_extension: "pdf".to_string(),
            sidecar_extension: "yml".to_string(),
            prune_orphans: false,
        }
    }

    /// Resolve each location from, in order of priority:
    /// 1. An explicit value (from the command line)
    /// 2. The matching `SCANDEX_*_DIR` environment variable
    /// 3. The built-in default, relative to the working directory
    pub fn resolve(overrides: ConfigOverrides) -> Self {
        let source_dir = pick(
            overrides.source_dir,
            "SCANDEX_SOURCE_DIR",
            DEFAULT_SOURCE_DIR,
        );
        let meta_dir =
            pick(overrides.meta_dir, "SCANDEX_META_DIR", DEFAULT_META_DIR);
        let store_dir =
            pick(overrides.store_dir, "SCANDEX_STORE_DIR", DEFAULT_STORE_DIR);

        let mut config = Self::new(source_dir, meta_dir, store_dir);
        if let Some(max_pages) = overrides.max_pages {
            config.max_pages = max_pages;
        }
        config.prune_orphans = overrides.prune_orphans;
        config
    }

    /// Create the store directory if it does not exist yet.
    pub fn ensure_store_dir(&self) -> Result<()> {
        std::fs::create_dir_all(&self.store_dir)
            .map_err(|_| Error::StoreDir(self.store_dir.clone()))
    }

    pub fn docs_db(&self) -> PathBuf {
        self.store_dir.join("docs.redb")
    }

    pub fn text_index_dir(&self) -> PathBuf {
        self.store_dir.join("text")
    }

    /// Sidecar location for a document with the given file stem.
    pub fn sidecar_path(&self, stem: &str) -> PathBuf {
        self.meta_dir
            .join(format!("{stem}.{}", self.sidecar_extension))
    }
}

fn pick(explicit: Option<PathBuf>, var: &str, default: &str) -> PathBuf {
    explicit
        .or_else(|| std::env::var_os(var).map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(default))
}
