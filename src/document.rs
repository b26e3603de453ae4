use serde::{Deserialize, Serialize};

use crate::{sidecar::SidecarMetadata, walker::DiscoveredFile};

/// One indexed source document.
///
/// # Examples
///
/// ```
/// use scandex::{IndexedDocument, sidecar::SidecarMetadata};
///
/// let meta = SidecarMetadata {
///     title: Some("Intro".to_string()),
///     tags: Some(vec!["foo".to_string(), "bar".to_string()]),
///     ..Default::default()
/// };
/// let doc = IndexedDocument::from_parts(
///     "scans/lec01.pdf".to_string(),
///     meta,
///     1_700_000_000.5,
///     "page one".to_string(),
/// );
/// assert_eq!(doc.tags.as_deref(), Some("foo,bar"));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexedDocument {
    /// Surrogate key, assigned by the store on first insert.
    pub id: u64,
    pub path: String,
    pub title: Option<String>,
    pub course: Option<String>,
    pub term: Option<String>,
    pub lecture: Option<i64>,
    /// Comma-joined tags. The separate values live in the text index.
    pub tags: Option<String>,
    /// Source modification time when the text was extracted.
    pub mtime: f64,
    pub text: String,
}

impl IndexedDocument {
    /// Assemble a record that has not been assigned an id yet.
    pub fn from_parts(
        path: String,
        meta: SidecarMetadata,
        mtime: f64,
        text: String,
    ) -> Self {
        let tags = meta.joined_tags();
        Self {
            id: 0,
            path,
            title: meta.title,
            course: meta.course,
            term: meta.term,
            lecture: meta.lecture,
            tags,
            mtime,
            text,
        }
    }

    pub fn for_file(
        file: &DiscoveredFile,
        meta: SidecarMetadata,
        text: String,
    ) -> Self {
        Self::from_parts(file.key(), meta, file.mtime, text)
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    #[test]
    fn empty_metadata_leaves_fields_absent() {
        let file = DiscoveredFile {
            path: PathBuf::from("scans/lec02.pdf"),
            stem: "lec02".to_string(),
            mtime: 42.0,
        };
        let doc = IndexedDocument::for_file(
            &file,
            SidecarMetadata::default(),
            "text".to_string(),
        );

        assert_eq!(doc.path, "scans/lec02.pdf");
        assert_eq!(doc.title, None);
        assert_eq!(doc.course, None);
        assert_eq!(doc.term, None);
        assert_eq!(doc.lecture, None);
        assert_eq!(doc.tags, None);
        assert_eq!(doc.mtime, 42.0);
    }

    #[test]
    fn json_roundtrip_keeps_fractional_mtime() {
        let doc = IndexedDocument {
            id: 9,
            path: "a.pdf".to_string(),
            title: Some("T".to_string()),
            course: None,
            term: Some("Spring".to_string()),
            lecture: Some(4),
            tags: Some("x,y".to_string()),
            mtime: 1_712_345_678.123_456_7,
            text: "body".to_string(),
        };
        let bytes = serde_json::to_vec(&doc).unwrap();
        let back: IndexedDocument = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(back, doc);
    }
}
