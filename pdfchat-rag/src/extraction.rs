//! Text extraction from uploaded PDF bytes.
//!
//! The parser works on files, so uploaded bytes are written to a scoped
//! temporary file that is removed as soon as extraction finishes, whether it
//! succeeded or not.

use std::path::Path;

use crate::document::PageText;
use crate::error::Result;

/// Every PDF starts with this marker within its first kilobyte.
const PDF_MAGIC: &[u8] = b"%PDF-";
const MAGIC_SEARCH_WINDOW: usize = 1024;

/// Extracts per-page text from a document on disk.
pub trait TextExtractor: Send + Sync {
    /// Return the text of each page in page order.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ExtractionError`](crate::RagError::ExtractionError)
    /// if the file cannot be parsed.
    fn extract_pages(&self, path: &Path) -> Result<Vec<PageText>>;
}

/// Whether `bytes` carry a PDF header.
pub fn looks_like_pdf(bytes: &[u8]) -> bool {
    let window = &bytes[..bytes.len().min(MAGIC_SEARCH_WINDOW)];
    window.windows(PDF_MAGIC.len()).any(|w| w == PDF_MAGIC)
}

#[cfg(feature = "pdf")]
pub use pdf::{PdfTextExtractor, extract_pdf_bytes, with_temp_pdf};

#[cfg(feature = "pdf")]
mod pdf {
    use std::io::Write;
    use std::panic::{AssertUnwindSafe, catch_unwind};
    use std::path::Path;

    use tracing::{debug, warn};

    use super::{TextExtractor, looks_like_pdf};
    use crate::document::PageText;
    use crate::error::{RagError, Result};

    /// A [`TextExtractor`] backed by the `pdf-extract` crate.
    ///
    /// Parser panics on malformed input are caught and reported as
    /// [`RagError::ExtractionError`].
    #[derive(Debug, Clone, Copy, Default)]
    pub struct PdfTextExtractor;

    impl TextExtractor for PdfTextExtractor {
        fn extract_pages(&self, path: &Path) -> Result<Vec<PageText>> {
            let outcome = catch_unwind(AssertUnwindSafe(|| pdf_extract::extract_text_by_pages(path)));
            match outcome {
                Ok(Ok(pages)) => {
                    debug!(page_count = pages.len(), "extracted PDF text");
                    Ok(pages.into_iter().enumerate().map(|(i, text)| PageText::new(i, text)).collect())
                }
                Ok(Err(e)) => {
                    warn!(error = %e, "PDF parsing failed");
                    Err(RagError::ExtractionError(format!("failed to parse PDF: {e}")))
                }
                Err(payload) => {
                    let message = payload
                        .downcast_ref::<&str>()
                        .map(|s| s.to_string())
                        .or_else(|| payload.downcast_ref::<String>().cloned())
                        .unwrap_or_else(|| "unknown panic".to_string());
                    warn!(panic = %message, "PDF parser panicked");
                    Err(RagError::ExtractionError(format!("failed to parse PDF: {message}")))
                }
            }
        }
    }

    /// Write `bytes` to a temporary `.pdf` file, run `f` on its path, and
    /// delete the file before returning on every path.
    pub fn with_temp_pdf<T>(bytes: &[u8], f: impl FnOnce(&Path) -> Result<T>) -> Result<T> {
        let mut file = tempfile::Builder::new()
            .prefix("pdfchat-")
            .suffix(".pdf")
            .tempfile()
            .map_err(|e| RagError::ExtractionError(format!("failed to create temporary file: {e}")))?;
        file.write_all(bytes)
            .and_then(|()| file.flush())
            .map_err(|e| RagError::ExtractionError(format!("failed to write temporary file: {e}")))?;

        let result = f(file.path());
        if let Err(e) = file.close() {
            warn!(error = %e, "failed to remove temporary PDF");
        }
        result
    }

    /// Extract per-page text from in-memory PDF bytes.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ExtractionError`] if `bytes` is not a PDF or the
    /// extractor cannot parse it.
    pub fn extract_pdf_bytes(extractor: &dyn TextExtractor, bytes: &[u8]) -> Result<Vec<PageText>> {
        if !looks_like_pdf(bytes) {
            return Err(RagError::ExtractionError("uploaded file is not a PDF".to_string()));
        }
        with_temp_pdf(bytes, |path| extractor.extract_pages(path))
    }
}

#[cfg(all(test, feature = "pdf"))]
mod tests {
    use std::cell::RefCell;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::error::RagError;

    fn is_extraction_error(err: &RagError) -> bool {
        matches!(err, RagError::ExtractionError(_))
    }

    struct CountingExtractor {
        calls: AtomicUsize,
    }

    impl TextExtractor for CountingExtractor {
        fn extract_pages(&self, path: &Path) -> Result<Vec<PageText>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let text = std::fs::read_to_string(path).unwrap_or_default();
            Ok(vec![PageText::new(0, text)])
        }
    }

    #[test]
    fn detects_pdf_header() {
        assert!(looks_like_pdf(b"%PDF-1.7\n..."));
        assert!(looks_like_pdf(b"\xef\xbb\xbf%PDF-1.4"));
        assert!(!looks_like_pdf(b"hello world"));
        assert!(!looks_like_pdf(b""));
    }

    #[test]
    fn temp_file_is_removed_after_success() {
        let seen: RefCell<Option<PathBuf>> = RefCell::new(None);
        let value = with_temp_pdf(b"%PDF-1.4 body", |path| {
            assert!(path.exists());
            assert_eq!(path.extension().and_then(|e| e.to_str()), Some("pdf"));
            *seen.borrow_mut() = Some(path.to_path_buf());
            Ok(42)
        })
        .unwrap();

        assert_eq!(value, 42);
        assert!(!seen.into_inner().unwrap().exists());
    }

    #[test]
    fn temp_file_is_removed_after_failure() {
        let seen: RefCell<Option<PathBuf>> = RefCell::new(None);
        let result: Result<()> = with_temp_pdf(b"%PDF-1.4 body", |path| {
            *seen.borrow_mut() = Some(path.to_path_buf());
            Err(RagError::ExtractionError("boom".into()))
        });

        assert!(result.is_err());
        assert!(!seen.into_inner().unwrap().exists());
    }

    #[test]
    fn non_pdf_bytes_never_reach_the_extractor() {
        let extractor = CountingExtractor { calls: AtomicUsize::new(0) };
        let err = extract_pdf_bytes(&extractor, b"just some text").unwrap_err();
        assert!(is_extraction_error(&err));
        assert_eq!(extractor.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn extractor_sees_the_uploaded_bytes() {
        let extractor = CountingExtractor { calls: AtomicUsize::new(0) };
        let pages = extract_pdf_bytes(&extractor, b"%PDF-1.4 The sky is blue.").unwrap();
        assert_eq!(pages, vec![PageText::new(0, "%PDF-1.4 The sky is blue.")]);
        assert_eq!(extractor.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn corrupt_pdf_is_an_extraction_error() {
        let err = extract_pdf_bytes(&PdfTextExtractor, b"%PDF-1.4\nthis is not really a pdf\n%%EOF")
            .unwrap_err();
        assert!(is_extraction_error(&err));
    }
}
