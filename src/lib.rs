//! scandex - an incremental index of scanned lecture PDFs.
//!
//! Each run lists the PDFs directly under a source directory, skips those
//! whose modification time matches the stored one, and for the rest reads
//! an optional YAML sidecar (title, course, term, lecture, tags), extracts
//! the text of the first pages, and upserts the result keyed by path. Records
//! live in a [redb](https://github.com/cberner/redb) database, with a
//! [Tantivy](https://github.com/quickwit-oss/tantivy) index over text and
//! tags next to it.
//!
//! # Quick start
//!
//! ```no_run
//! use scandex::{IndexConfig, indexer};
//!
//! let config = IndexConfig::new("data/scans_ocr", "meta", "index");
//! let report = indexer::run(&config).unwrap();
//! println!("{} written, {} unchanged", report.touched(), report.skipped);
//! ```

pub mod cli;
pub mod config;
pub mod document;
pub mod error;
pub mod extract;
pub mod indexer;
pub mod sidecar;
pub mod store;
pub mod text_index;
pub mod walker;

pub use config::{ConfigOverrides, IndexConfig};
pub use document::IndexedDocument;
pub use error::{Error, Result};
pub use indexer::{IndexReport, Indexer};
pub use store::DocStore;
pub use text_index::TextIndex;
