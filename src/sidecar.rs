use std::{io::ErrorKind, path::Path};

use serde::Deserialize;

use crate::error::{Error, Result};

/// Descriptive fields read from a document's YAML sidecar.
///
/// Every key is optional and unknown keys are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SidecarMetadata {
    pub title: Option<String>,
    pub course: Option<String>,
    pub term: Option<String>,
    pub lecture: Option<i64>,
    pub tags: Option<Vec<String>>,
}

impl SidecarMetadata {
    /// Tags joined with `,`, or `None` when there are none.
    pub fn joined_tags(&self) -> Option<String> {
        self.tags
            .as_ref()
            .filter(|tags| !tags.is_empty())
            .map(|tags| tags.join(","))
    }
}

/// Load the sidecar at `path`.
///
/// A missing file yields empty metadata. An empty document or a YAML
/// `null` does too. Anything that does not parse as the expected mapping
/// is an [`Error::Sidecar`].
pub fn load(path: &Path) -> Result<SidecarMetadata> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Ok(SidecarMetadata::default());
        }
        Err(e) => return Err(e.into()),
    };
    parse(&content).map_err(|source| Error::Sidecar {
        path: path.to_path_buf(),
        source,
    })
}

fn parse(
    content: &str,
) -> std::result::Result<SidecarMetadata, serde_yaml::Error> {
    if content.trim().is_empty() {
        return Ok(SidecarMetadata::default());
    }
    let parsed: Option<SidecarMetadata> = serde_yaml::from_str(content)?;
    Ok(parsed.unwrap_or_default())
}
