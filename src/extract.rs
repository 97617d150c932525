//! Document text extraction
//!
//! Converts uploaded document bytes to plain text ahead of chunking.
//! PDF extraction uses lopdf; plain text and markdown pass through.
//! Other file types are reported as unsupported so ingestion can skip
//! them without failing the triggering event.

use crate::errors::{AppError, Result};
use tracing::{debug, warn};

/// Supported document kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Pdf,
    PlainText,
}

/// Determine the document kind from a file name.
///
/// Unknown extensions yield `UnsupportedInput`; the caller decides whether
/// that skips the file or rejects the request.
pub fn detect_kind(file_name: &str) -> Result<DocumentKind> {
    let extension = file_name
        .rsplit('.')
        .next()
        .unwrap_or_default()
        .to_ascii_lowercase();

    match extension.as_str() {
        "pdf" => Ok(DocumentKind::Pdf),
        "txt" | "md" => Ok(DocumentKind::PlainText),
        _ => Err(AppError::UnsupportedInput { extension }),
    }
}

/// Extract plain text from document bytes
pub fn extract_text(kind: DocumentKind, bytes: &[u8]) -> Result<String> {
    match kind {
        DocumentKind::Pdf => extract_pdf_text(bytes),
        DocumentKind::PlainText => Ok(String::from_utf8_lossy(bytes).into_owned()),
    }
}

fn extract_pdf_text(bytes: &[u8]) -> Result<String> {
    let doc = lopdf::Document::load_mem(bytes).map_err(|e| AppError::Validation {
        message: format!("Failed to load PDF: {}", e),
    })?;

    let pages = doc.get_pages();
    debug!(page_count = pages.len(), "Extracting text from PDF");

    let mut text = String::new();
    for (&page_num, _) in pages.iter() {
        match doc.extract_text(&[page_num]) {
            Ok(page_text) => {
                text.push_str(&page_text);
                text.push('\n');
            }
            Err(e) => {
                warn!(page = page_num, error = %e, "Failed to extract text from page, skipping");
            }
        }
    }

    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_kind() {
        assert_eq!(detect_kind("resume.pdf").unwrap(), DocumentKind::Pdf);
        assert_eq!(detect_kind("notes.TXT").unwrap(), DocumentKind::PlainText);
        assert_eq!(detect_kind("README.md").unwrap(), DocumentKind::PlainText);
    }

    #[test]
    fn test_unsupported_extension() {
        let err = detect_kind("resume.docx").unwrap_err();
        match err {
            AppError::UnsupportedInput { extension } => assert_eq!(extension, "docx"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_plain_text_passthrough() {
        let text = extract_text(DocumentKind::PlainText, b"supported clients daily").unwrap();
        assert_eq!(text, "supported clients daily");
    }

    #[test]
    fn test_invalid_pdf_rejected() {
        assert!(extract_text(DocumentKind::Pdf, b"not a pdf").is_err());
    }
}
