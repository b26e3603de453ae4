//! Page-bounded text extraction from PDF documents.
//!
//! Extraction never fails the caller: every problem, including a panic
//! inside the PDF library, comes back as [`Extraction::Failed`].

use std::{
    any::Any,
    panic::{AssertUnwindSafe, catch_unwind},
    path::Path,
};

use lopdf::Document;

/// Prefix of the text stored for documents that could not be read.
pub const FAILURE_MARKER: &str = "[EXTRACT_FAIL]";

#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error("{0}")]
    Pdf(#[from] lopdf::Error),

    #[error("PDF library panicked: {0}")]
    Panicked(String),
}

/// Outcome of reading the text of one document.
#[derive(Debug)]
pub enum Extraction {
    Text(String),
    Failed(ExtractError),
}

impl Extraction {
    /// The value stored in the record's text field.
    pub fn into_stored_text(self) -> String {
        match self {
            Self::Text(text) => text,
            Self::Failed(err) => format!("{FAILURE_MARKER} {err}"),
        }
    }
}

/// Extract the text of the first `max_pages` pages of the PDF at `path`.
///
/// Pages are read in page-number order and joined with a newline. Pages
/// past the bound are ignored.
pub fn extract_text(path: &Path, max_pages: usize) -> Extraction {
    guarded(|| read_pages(path, max_pages))
}

/// Run `read`, turning an error or a panic into [`Extraction::Failed`].
fn guarded(
    read: impl FnOnce() -> Result<String, ExtractError>,
) -> Extraction {
    match catch_unwind(AssertUnwindSafe(read)) {
        Ok(Ok(text)) => Extraction::Text(text),
        Ok(Err(err)) => Extraction::Failed(err),
        Err(payload) => {
            Extraction::Failed(ExtractError::Panicked(panic_message(payload)))
        }
    }
}

fn read_pages(
    path: &Path,
    max_pages: usize,
) -> Result<String, ExtractError> {
    let doc = Document::load(path)?;
    let page_numbers: Vec<u32> =
        doc.get_pages().into_keys().take(max_pages).collect();

    let mut pages = Vec::with_capacity(page_numbers.len());
    for page in page_numbers {
        pages.push(doc.extract_text(&[page])?);
    }
    Ok(pages.join("\n"))
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_every_page_in_order() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("lec01.pdf");
        fixture::write_pdf(&path, &["alpha page", "beta page", "gamma page"]);

        let text = match extract_text(&path, 100) {
            Extraction::Text(text) => text,
            Extraction::Failed(e) => panic!("extraction failed: {e}"),
        };
        let alpha = text.find("alpha").unwrap();
        let beta = text.find("beta").unwrap();
        let gamma = text.find("gamma").unwrap();
        assert!(alpha < beta && beta < gamma);
    }

    #[test]
    fn stops_at_the_page_bound() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("long.pdf");
        fixture::write_pdf(&path, &["first", "second", "third"]);

        let text = extract_text(&path, 2).into_stored_text();
        assert!(text.contains("first"));
        assert!(text.contains("second"));
        assert!(!text.contains("third"));
    }

    #[test]
    fn zero_page_bound_yields_empty_text() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("any.pdf");
        fixture::write_pdf(&path, &["ignored"]);

        assert_eq!(extract_text(&path, 0).into_stored_text(), "");
    }

    #[test]
    fn corrupt_file_becomes_sentinel() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("lec02.pdf");
        std::fs::write(&path, b"this is not a pdf").unwrap();

        let extraction = extract_text(&path, 100);
        assert!(matches!(extraction, Extraction::Failed(_)));
        let text = extraction.into_stored_text();
        assert!(text.starts_with(FAILURE_MARKER));
        assert!(text.len() > FAILURE_MARKER.len() + 1);
    }

    #[test]
    fn missing_file_becomes_sentinel() {
        let tmp = tempfile::tempdir().unwrap();
        let extraction = extract_text(&tmp.path().join("gone.pdf"), 100);
        assert!(matches!(extraction, Extraction::Failed(_)));
    }

    #[test]
    fn panic_while_reading_becomes_sentinel() {
        let extraction = guarded(|| panic!("bad xref at {}", 42));
        assert!(matches!(
            extraction,
            Extraction::Failed(ExtractError::Panicked(_))
        ));
        assert_eq!(
            extraction.into_stored_text(),
            "[EXTRACT_FAIL] PDF library panicked: bad xref at 42"
        );
    }

    #[test]
    fn panic_payloads_are_described() {
        let payload: Box<dyn Any + Send> = Box::new("boom");
        assert_eq!(panic_message(payload), "boom");
        let payload: Box<dyn Any + Send> = Box::new(String::from("bang"));
        assert_eq!(panic_message(payload), "bang");
        let payload: Box<dyn Any + Send> = Box::new(7_u8);
        assert_eq!(panic_message(payload), "unknown panic");
    }
}
