//! Text extraction for uploaded documents.
//!
//! The extractor dispatches purely on the declared MIME type of an upload. Three formats are
//! recognized (PDF, Word `.docx`, and UTF-8 plain text); every other type is rejected before the
//! bytes are inspected.

mod docx;
mod pdf;

use sha2::{Digest, Sha256};
use std::fmt;
use thiserror::Error;

/// MIME type declared for PDF uploads.
pub const PDF_MIME: &str = "application/pdf";
/// MIME type declared for Word-processing (`.docx`) uploads.
pub const DOCX_MIME: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.document";
/// MIME type declared for plain text uploads.
pub const TEXT_MIME: &str = "text/plain";

/// Errors raised while turning an upload into plain text.
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// The declared MIME type is not one of the recognized formats.
    #[error("Unsupported file type '{0}'. Please upload a PDF, DOCX, or TXT file.")]
    UnsupportedFormat(String),
    /// Plain text bytes were not valid UTF-8.
    #[error("Failed to decode text file as UTF-8: {0}")]
    Decoding(#[from] std::string::FromUtf8Error),
    /// The container could not be opened by the format parser.
    #[error("Failed to read {format} document: {message}")]
    MalformedDocument {
        /// Format the upload was declared as.
        format: DocumentFormat,
        /// Parser diagnostic.
        message: String,
    },
}

/// Document formats understood by the extractor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    /// Page-structured PDF document.
    Pdf,
    /// Office Open XML word-processing document.
    Docx,
    /// UTF-8 plain text.
    PlainText,
}

impl DocumentFormat {
    /// Resolve a declared MIME type, ignoring case and media-type parameters.
    pub fn from_mime(mime_type: &str) -> Option<Self> {
        let essence = mime_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        match essence.as_str() {
            PDF_MIME => Some(Self::Pdf),
            DOCX_MIME => Some(Self::Docx),
            TEXT_MIME => Some(Self::PlainText),
            _ => None,
        }
    }

    /// Canonical MIME type for the format.
    pub const fn mime_type(self) -> &'static str {
        match self {
            Self::Pdf => PDF_MIME,
            Self::Docx => DOCX_MIME,
            Self::PlainText => TEXT_MIME,
        }
    }
}

impl fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Pdf => "PDF",
            Self::Docx => "DOCX",
            Self::PlainText => "plain text",
        };
        f.write_str(label)
    }
}

/// A single user upload: raw bytes plus the MIME type the client declared for them.
#[derive(Debug, Clone)]
pub struct UploadedDocument {
    bytes: Vec<u8>,
    mime_type: String,
    file_name: Option<String>,
}

impl UploadedDocument {
    /// Wrap raw bytes with their declared MIME type.
    pub fn new(bytes: impl Into<Vec<u8>>, mime_type: impl Into<String>) -> Self {
        Self {
            bytes: bytes.into(),
            mime_type: mime_type.into(),
            file_name: None,
        }
    }

    /// Attach the client-supplied file name, used only for logging and responses.
    pub fn with_file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = Some(file_name.into());
        self
    }

    /// Raw upload contents.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// MIME type as declared by the client.
    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    /// Client-supplied file name, if any.
    pub fn file_name(&self) -> Option<&str> {
        self.file_name.as_deref()
    }

    /// Recognized format for the declared MIME type.
    pub fn format(&self) -> Result<DocumentFormat, ExtractionError> {
        DocumentFormat::from_mime(&self.mime_type)
            .ok_or_else(|| ExtractionError::UnsupportedFormat(self.mime_type.clone()))
    }

    /// Hex SHA-256 digest of the upload, used to correlate log lines without logging content.
    pub fn fingerprint(&self) -> String {
        hex::encode(Sha256::digest(&self.bytes))
    }
}

/// Extract the plain text of an upload according to its declared format.
///
/// - PDF: per-page text concatenated in page order with no separator.
/// - DOCX: body paragraphs joined with `\n`.
/// - Plain text: the bytes decoded as UTF-8, untouched.
///
/// Empty pages or paragraphs contribute empty segments; only an unrecognized type, undecodable
/// text, or an unreadable container fails the extraction.
pub fn extract(document: &UploadedDocument) -> Result<String, ExtractionError> {
    let format = document.format()?;
    tracing::debug!(
        %format,
        bytes = document.bytes().len(),
        file_name = ?document.file_name(),
        "Extracting document text"
    );
    let text = match format {
        DocumentFormat::Pdf => pdf::extract_pdf_text(document.bytes())?,
        DocumentFormat::Docx => docx::extract_docx_text(document.bytes())?,
        DocumentFormat::PlainText => String::from_utf8(document.bytes().to_vec())?,
    };
    tracing::debug!(%format, chars = text.chars().count(), "Extracted document text");
    Ok(text)
}

fn malformed(format: DocumentFormat, error: impl fmt::Display) -> ExtractionError {
    ExtractionError::MalformedDocument {
        format,
        message: error.to_string(),
    }
}
