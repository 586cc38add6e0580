//! Document text extraction for docchat.
//!
//! Extraction is a capability boundary: the RAG core only ever consumes
//! `(source_name, raw_text)`. Each supported format implements
//! [`Extractor`], and a [`ExtractorRegistry`] keyed on the detected
//! [`DocumentKind`] selects the implementation, with no extension branching
//! scattered across callers.
//!
//! Plain text, Markdown, and HTML extraction ship in this crate. PDF and
//! DOCX are recognized kinds whose parsers live outside the core; callers
//! may register their own [`Extractor`] for them.

pub mod formats;
pub mod kind;
pub mod registry;

pub use formats::{HtmlExtractor, MarkdownExtractor, PlainTextExtractor};
pub use kind::DocumentKind;
pub use registry::{ExtractedDocument, Extractor, ExtractorRegistry};
