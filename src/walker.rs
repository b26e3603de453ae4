use std::{
    path::{Path, PathBuf},
    time::SystemTime,
};

use tracing::warn;

use crate::error::Result;

/// A document file found directly under the source directory.
#[derive(Debug, Clone, PartialEq)]
pub struct DiscoveredFile {
    /// `source_dir` joined with the file name. Used as the record key.
    pub path: PathBuf,
    /// File name without its extension; names the metadata sidecar.
    pub stem: String,
    /// Last modification time as fractional seconds since the Unix epoch.
    pub mtime: f64,
}

impl DiscoveredFile {
    /// The string form of [`Self::path`] stored in the index. Discovery
    /// only yields UTF-8 paths, so this is lossless.
    pub fn key(&self) -> String {
        self.path.to_string_lossy().into_owned()
    }
}

/// List the documents directly under `root` whose extension is `extension`.
///
/// Subdirectories are not entered. Hidden entries (names starting with `.`)
/// are skipped, symlinks are followed when they resolve to a regular file,
/// and results come back sorted by path. Paths that are not valid UTF-8
/// cannot be stored as keys and are skipped with a warning.
pub fn discover_documents(
    root: &Path,
    extension: &str,
) -> Result<Vec<DiscoveredFile>> {
    let mut results = Vec::new();

    for entry in std::fs::read_dir(root)? {
        let entry = entry?;
        let file_name = entry.file_name();
        let name = file_name.to_string_lossy();

        if name.starts_with('.') {
            continue;
        }

        let path = entry.path();
        if !has_extension(&path, extension) {
            continue;
        }

        let file_type = entry.file_type()?;
        let is_file = if file_type.is_symlink() {
            // Broken links are skipped.
            path.is_file()
        } else {
            file_type.is_file()
        };
        if !is_file {
            continue;
        }

        let Some(stem) = utf8_stem(&path) else {
            warn!(path = %path.display(), "skipping non UTF-8 path");
            continue;
        };
        let mtime = modified_seconds(&std::fs::metadata(&path)?.modified()?);

        results.push(DiscoveredFile { path, stem, mtime });
    }

    results.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(results)
}

fn utf8_stem(path: &Path) -> Option<String> {
    path.to_str()?;
    path.file_stem()?.to_str().map(str::to_string)
}

fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext == extension)
}

/// Seconds relative to the Unix epoch, negative for earlier timestamps.
pub fn modified_seconds(time: &SystemTime) -> f64 {
    match time.duration_since(SystemTime::UNIX_EPOCH) {
        Ok(after) => after.as_secs_f64(),
        Err(before) => -before.duration().as_secs_f64(),
    }
}
