use std::{fmt, sync::Arc};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default cap on extracted text, in chars.
pub const DEFAULT_MAX_CHARS: usize = 15_000;

/// The only accepted upload content type.
pub const PDF_CONTENT_TYPE: &str = "application/pdf";

/// File received from the upload surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedDocument {
    /// Original file name.
    pub file_name: String,
    /// Declared MIME type.
    pub content_type: String,
    /// Raw file bytes.
    pub bytes: Vec<u8>,
}

impl UploadedDocument {
    /// Creates an upload with an explicit content type.
    #[must_use]
    pub fn new(
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        bytes: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: content_type.into(),
            bytes: bytes.into(),
        }
    }

    /// Creates a PDF upload.
    #[must_use]
    pub fn pdf(file_name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self::new(file_name, PDF_CONTENT_TYPE, bytes)
    }
}

/// Errors emitted while turning an upload into document text.
#[derive(Debug, Error)]
pub enum IngestionError {
    /// Nothing was uploaded.
    #[error("No file uploaded")]
    MissingFile,
    /// The upload is not declared as a PDF.
    #[error("Only PDF files are allowed")]
    NotPdf {
        /// Declared content type.
        content_type: String,
    },
    /// The extractor could not read the file.
    #[error("text extraction failed: {0}")]
    Extraction(String),
}

impl IngestionError {
    /// True for errors caused by the caller's upload rather than by
    /// processing.
    #[must_use]
    pub const fn is_rejection(&self) -> bool {
        matches!(self, Self::MissingFile | Self::NotPdf { .. })
    }
}

/// Turns raw file bytes into plain text.
pub trait TextExtractor: Send + Sync {
    /// Extracts the full text of `bytes`.
    ///
    /// # Errors
    /// Returns [`IngestionError::Extraction`] when the bytes cannot be read.
    fn extract(&self, bytes: &[u8]) -> Result<String, IngestionError>;
}

/// PDF text layer extraction backed by `pdf-extract`.
#[derive(Debug, Default, Clone, Copy)]
pub struct PdfTextExtractor;

impl TextExtractor for PdfTextExtractor {
    fn extract(&self, bytes: &[u8]) -> Result<String, IngestionError> {
        pdf_extract::extract_text_from_mem(bytes)
            .map_err(|err| IngestionError::Extraction(err.to_string()))
    }
}

/// Extracted document text, cut to the configured number of chars.
///
/// Evidence offsets always refer to this truncated text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentText {
    text: String,
    original_chars: usize,
}

impl DocumentText {
    /// Keeps at most `max_chars` chars of `raw`.
    #[must_use]
    pub fn new(raw: impl Into<String>, max_chars: usize) -> Self {
        let mut text = raw.into();
        let original_chars = text.chars().count();
        if original_chars > max_chars {
            let cut = text
                .char_indices()
                .nth(max_chars)
                .map_or(text.len(), |(byte, _)| byte);
            text.truncate(cut);
        }
        Self {
            text,
            original_chars,
        }
    }

    /// The (possibly truncated) text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Length of the kept text in chars.
    #[must_use]
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }

    /// Length of the extracted text before truncation, in chars.
    #[must_use]
    pub const fn original_chars(&self) -> usize {
        self.original_chars
    }

    /// True when the extracted text was longer than the cap.
    #[must_use]
    pub fn is_truncated(&self) -> bool {
        self.original_chars > self.char_len()
    }
}

/// Validates uploads and extracts their text.
#[derive(Clone)]
pub struct DocumentIngestor {
    extractor: Arc<dyn TextExtractor>,
    max_chars: usize,
}

impl fmt::Debug for DocumentIngestor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DocumentIngestor")
            .field("max_chars", &self.max_chars)
            .finish_non_exhaustive()
    }
}

impl DocumentIngestor {
    /// Creates an ingestor.
    #[must_use]
    pub fn new(extractor: Arc<dyn TextExtractor>, max_chars: usize) -> Self {
        Self {
            extractor,
            max_chars,
        }
    }

    /// Configured char cap.
    #[must_use]
    pub const fn max_chars(&self) -> usize {
        self.max_chars
    }

    /// Validates `upload`, extracts its text and applies the char cap.
    ///
    /// # Errors
    /// Rejects empty or non-PDF uploads and propagates extraction failures.
    pub fn ingest(&self, upload: &UploadedDocument) -> Result<DocumentText, IngestionError> {
        if upload.bytes.is_empty() {
            return Err(IngestionError::MissingFile);
        }
        if upload.content_type != PDF_CONTENT_TYPE {
            return Err(IngestionError::NotPdf {
                content_type: upload.content_type.clone(),
            });
        }
        let raw = self.extractor.extract(&upload.bytes)?;
        Ok(DocumentText::new(raw, self.max_chars))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Utf8Extractor;

    impl TextExtractor for Utf8Extractor {
        fn extract(&self, bytes: &[u8]) -> Result<String, IngestionError> {
            String::from_utf8(bytes.to_vec())
                .map_err(|err| IngestionError::Extraction(err.to_string()))
        }
    }

    fn ingestor(max_chars: usize) -> DocumentIngestor {
        DocumentIngestor::new(Arc::new(Utf8Extractor), max_chars)
    }

    #[test]
    fn truncates_by_chars() {
        let text = DocumentText::new("流水线冒险abc", 5);
        assert_eq!(text.as_str(), "流水线冒险");
        assert_eq!(text.original_chars(), 8);
        assert!(text.is_truncated());

        let short = DocumentText::new("short", DEFAULT_MAX_CHARS);
        assert_eq!(short.as_str(), "short");
        assert!(!short.is_truncated());
    }

    #[test]
    fn ingests_pdf_uploads() {
        let upload = UploadedDocument::pdf("lecture3.pdf", "Pipeline hazards\nForwarding");
        let text = ingestor(10).ingest(&upload).unwrap();
        assert_eq!(text.as_str(), "Pipeline h");
        assert_eq!(text.char_len(), 10);
    }

    #[test]
    fn rejects_bad_uploads() {
        let err = ingestor(100)
            .ingest(&UploadedDocument::pdf("empty.pdf", Vec::<u8>::new()))
            .unwrap_err();
        assert!(matches!(err, IngestionError::MissingFile));
        assert_eq!(err.to_string(), "No file uploaded");

        let err = ingestor(100)
            .ingest(&UploadedDocument::new("notes.txt", "text/plain", "hello"))
            .unwrap_err();
        assert!(err.is_rejection());
        assert_eq!(err.to_string(), "Only PDF files are allowed");
    }

    #[test]
    fn surfaces_extraction_failures() {
        let err = ingestor(100)
            .ingest(&UploadedDocument::pdf("broken.pdf", vec![0xff_u8, 0xfe]))
            .unwrap_err();
        assert!(matches!(err, IngestionError::Extraction(_)));
        assert!(!err.is_rejection());
    }
}
