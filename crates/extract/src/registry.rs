//! Extractor capability trait and format registry.

use crate::kind::DocumentKind;
use docchat_core::{AppError, AppResult};
use std::collections::HashMap;
use std::path::Path;

/// A document produced by extraction, ready for ingestion.
#[derive(Debug, Clone)]
pub struct ExtractedDocument {
    /// Original file name (not the full path)
    pub source_name: String,

    /// Extracted plain text
    pub text: String,
}

/// Capability interface for format-specific text extraction.
pub trait Extractor: Send + Sync {
    /// The format this extractor handles.
    fn kind(&self) -> DocumentKind;

    /// Extract plain text from raw file bytes.
    fn extract(&self, bytes: &[u8]) -> AppResult<String>;
}

/// Registry of extractors keyed on detected document kind.
pub struct ExtractorRegistry {
    extractors: HashMap<DocumentKind, Box<dyn Extractor>>,
}

impl ExtractorRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            extractors: HashMap::new(),
        }
    }

    /// Create a registry with the built-in extractors registered.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(crate::formats::PlainTextExtractor));
        registry.register(Box::new(crate::formats::MarkdownExtractor));
        registry.register(Box::new(crate::formats::HtmlExtractor));
        registry
    }

    /// Register an extractor, replacing any existing one for its kind.
    pub fn register(&mut self, extractor: Box<dyn Extractor>) {
        self.extractors.insert(extractor.kind(), extractor);
    }

    /// Whether a kind has a registered extractor.
    pub fn supports(&self, kind: DocumentKind) -> bool {
        self.extractors.contains_key(&kind)
    }

    /// Extract text from raw bytes of a known kind.
    pub fn extract_bytes(&self, kind: DocumentKind, bytes: &[u8]) -> AppResult<String> {
        let extractor = self.extractors.get(&kind).ok_or_else(|| {
            AppError::Ingestion(format!(
                "No extractor registered for {} documents",
                kind.as_str()
            ))
        })?;

        extractor.extract(bytes)
    }

    /// Read a file, detect its kind, and extract its text.
    pub fn extract_file(&self, path: &Path) -> AppResult<ExtractedDocument> {
        let kind = DocumentKind::from_path(path);
        tracing::info!("Extracting {:?} as {}", path, kind.as_str());

        let bytes = std::fs::read(path)
            .map_err(|e| AppError::Ingestion(format!("Failed to read {:?}: {}", path, e)))?;

        let text = self.extract_bytes(kind, &bytes)?;

        let source_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("document")
            .to_string();

        Ok(ExtractedDocument { source_name, text })
    }
}

impl Default for ExtractorRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_cover_text_formats() {
        let registry = ExtractorRegistry::with_defaults();
        assert!(registry.supports(DocumentKind::PlainText));
        assert!(registry.supports(DocumentKind::Markdown));
        assert!(registry.supports(DocumentKind::Html));
        assert!(!registry.supports(DocumentKind::Pdf));
        assert!(!registry.supports(DocumentKind::Docx));
    }

    #[test]
    fn test_unregistered_kind_is_an_ingestion_error() {
        let registry = ExtractorRegistry::with_defaults();
        let result = registry.extract_bytes(DocumentKind::Pdf, b"%PDF-1.4");
        match result {
            Err(AppError::Ingestion(msg)) => assert!(msg.contains("pdf")),
            other => panic!("Expected ingestion error, got {:?}", other),
        }
    }

    #[test]
    fn test_external_extractor_can_be_registered() {
        struct FakePdf;
        impl Extractor for FakePdf {
            fn kind(&self) -> DocumentKind {
                DocumentKind::Pdf
            }
            fn extract(&self, _bytes: &[u8]) -> AppResult<String> {
                Ok("pdf text".to_string())
            }
        }

        let mut registry = ExtractorRegistry::with_defaults();
        registry.register(Box::new(FakePdf));

        let text = registry.extract_bytes(DocumentKind::Pdf, b"ignored").unwrap();
        assert_eq!(text, "pdf text");
    }

    #[test]
    fn test_extract_file_detects_kind() {
        let mut file = tempfile::Builder::new().suffix(".txt").tempfile().unwrap();
        write!(file, "hello from a file").unwrap();

        let registry = ExtractorRegistry::with_defaults();
        let doc = registry.extract_file(file.path()).unwrap();

        assert!(doc.source_name.ends_with(".txt"));
        assert_eq!(doc.text, "hello from a file");
    }
}
