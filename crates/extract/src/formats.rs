//! Built-in extractor implementations.

use crate::kind::DocumentKind;
use crate::registry::Extractor;
use docchat_core::{AppError, AppResult};

fn decode_utf8(bytes: &[u8]) -> AppResult<String> {
    String::from_utf8(bytes.to_vec())
        .map_err(|e| AppError::Ingestion(format!("File is not valid UTF-8: {}", e)))
}

/// Plain text passes through unchanged.
pub struct PlainTextExtractor;

impl Extractor for PlainTextExtractor {
    fn kind(&self) -> DocumentKind {
        DocumentKind::PlainText
    }

    fn extract(&self, bytes: &[u8]) -> AppResult<String> {
        decode_utf8(bytes)
    }
}

/// Markdown with formatting noise removed.
pub struct MarkdownExtractor;

impl Extractor for MarkdownExtractor {
    fn kind(&self) -> DocumentKind {
        DocumentKind::Markdown
    }

    fn extract(&self, bytes: &[u8]) -> AppResult<String> {
        Ok(clean_markdown(&decode_utf8(bytes)?))
    }
}

/// HTML reduced to its visible text.
pub struct HtmlExtractor;

impl Extractor for HtmlExtractor {
    fn kind(&self) -> DocumentKind {
        DocumentKind::Html
    }

    fn extract(&self, bytes: &[u8]) -> AppResult<String> {
        Ok(strip_html(&decode_utf8(bytes)?))
    }
}

/// Remove markdown headers, fences, and horizontal rules, keeping content.
fn clean_markdown(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut in_fence = false;

    for line in text.lines() {
        let trimmed = line.trim();

        if trimmed.starts_with("```") || trimmed.starts_with("~~~") {
            in_fence = !in_fence;
            continue;
        }

        if in_fence {
            result.push_str(line);
            result.push('\n');
            continue;
        }

        if trimmed.starts_with("---") || trimmed.starts_with("===") {
            continue;
        }

        let content = trimmed.trim_start_matches('#').trim();
        if !content.is_empty() {
            result.push_str(content);
            result.push('\n');
        } else {
            result.push('\n');
        }
    }

    collapse_blank_lines(result.trim())
}

/// Case-insensitive check for an ASCII tag prefix at a byte offset.
fn tag_at(text: &str, at: usize, tag: &str) -> bool {
    text.get(at..)
        .and_then(|rest| rest.get(..tag.len()))
        .map(|head| head.eq_ignore_ascii_case(tag))
        .unwrap_or(false)
}

/// Strip tags plus script/style bodies, keeping visible text.
fn strip_html(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut in_tag = false;
    let mut in_script = false;
    let mut in_style = false;

    for (i, ch) in text.char_indices() {
        if ch == '<' {
            in_tag = true;

            if tag_at(text, i, "<script") {
                in_script = true;
            } else if tag_at(text, i, "</script") {
                in_script = false;
            } else if tag_at(text, i, "<style") {
                in_style = true;
            } else if tag_at(text, i, "</style") {
                in_style = false;
            }
        } else if ch == '>' {
            in_tag = false;
        } else if !in_tag && !in_script && !in_style {
            result.push(ch);
        }
    }

    collapse_blank_lines(result.trim())
}

/// Collapse runs of blank lines so stripped markup doesn't leave holes.
fn collapse_blank_lines(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut blank_run = 0;

    for line in text.lines() {
        if line.trim().is_empty() {
            blank_run += 1;
            if blank_run > 1 {
                continue;
            }
        } else {
            blank_run = 0;
        }
        result.push_str(line);
        result.push('\n');
    }

    result.trim_end().to_string()
}
