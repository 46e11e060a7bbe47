//! Uploaded documents and the text-extraction contract.
//!
//! Extraction concatenates per-page text in document order. No structure
//! (headings, tables) survives; the result is one flat string.

use std::path::Path;

use crate::error::ExtractionError;

/// Page separator understood by [`PlainTextExtractor`].
const FORM_FEED: u8 = 0x0c;

/// Turns raw document bytes into prompt-ready text.
pub trait TextExtractor: Send + Sync {
    /// A short name for logs (e.g., "plain-text").
    fn name(&self) -> &str;

    /// Extract the text of every page, concatenated in order.
    fn extract_text(&self, bytes: &[u8]) -> Result<String, ExtractionError>;
}

/// Extractor for UTF-8 text where pages are separated by form feeds.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlainTextExtractor;

impl TextExtractor for PlainTextExtractor {
    fn name(&self) -> &str {
        "plain-text"
    }

    fn extract_text(&self, bytes: &[u8]) -> Result<String, ExtractionError> {
        if bytes.is_empty() {
            return Err(ExtractionError::Empty);
        }

        let mut text = String::with_capacity(bytes.len());
        for (index, page) in bytes.split(|b| *b == FORM_FEED).enumerate() {
            let page = std::str::from_utf8(page).map_err(|e| ExtractionError::Page {
                index,
                reason: e.to_string(),
            })?;
            text.push_str(page);
        }
        Ok(text)
    }
}

/// A document whose text has been extracted and is ready to merge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    /// Display name (usually the file name)
    pub name: String,

    /// Extracted text
    pub text: String,
}

impl Document {
    pub fn new(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            text: text.into(),
        }
    }

    /// Read a file and run it through `extractor`.
    pub fn load(path: &Path, extractor: &dyn TextExtractor) -> Result<Self, ExtractionError> {
        let bytes = std::fs::read(path).map_err(|e| ExtractionError::Io {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let text = extractor.extract_text(&bytes)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        tracing::info!(
            document = %name,
            extractor = extractor.name(),
            chars = text.len(),
            "Document loaded"
        );

        Ok(Self { name, text })
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}
