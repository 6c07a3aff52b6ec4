//! Paginated-document (PDF) extractor.
//!
//! Emits a title/author header (title falls back to the file's base name,
//! author to "Unknown" when the info dictionary carries neither), then per
//! page a `--- Page N ---` marker and the page's extracted text. Pages with
//! no extractable text (e.g. scanned images) are omitted entirely; that is
//! an accepted gap, not an error.

use std::path::Path;

use crate::error::ExtractError;
use crate::models::{CanonicalDocument, TextBlock};

pub fn extract(path: &Path) -> CanonicalDocument {
    if !path.exists() {
        tracing::warn!(path = %path.display(), "pdf file not found");
        return CanonicalDocument::empty();
    }
    match extract_inner(path) {
        Ok(doc) => doc,
        Err(e) => {
            tracing::error!(path = %path.display(), error = %e, "pdf extraction failed");
            CanonicalDocument::diagnostic(format!("Error parsing PDF file: {}", e))
        }
    }
}

fn extract_inner(path: &Path) -> Result<CanonicalDocument, ExtractError> {
    let bytes = std::fs::read(path).map_err(|e| ExtractError::Pdf(e.to_string()))?;

    let pages = pdf_extract::extract_text_from_mem_by_pages(&bytes)
        .map_err(|e| ExtractError::Pdf(e.to_string()))?;

    let (meta_title, meta_author) = read_info_strings(&bytes);
    let title = meta_title.unwrap_or_else(|| {
        path.file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    });
    let author = meta_author.unwrap_or_else(|| "Unknown".to_string());

    let mut doc = CanonicalDocument {
        title: Some(title.clone()),
        author: Some(author.clone()),
        sections: vec![
            TextBlock::paragraph(format!("Title: {}", title)),
            TextBlock::paragraph(format!("Author: {}", author)),
            TextBlock::blank(),
        ],
    };

    for (idx, page) in pages.iter().enumerate() {
        let text = page.trim();
        if text.is_empty() {
            continue;
        }
        doc.sections
            .push(TextBlock::heading(format!("--- Page {} ---", idx + 1)));
        doc.sections.push(TextBlock::paragraph(text));
        doc.sections.push(TextBlock::blank());
    }

    Ok(doc)
}

/// Title and author from the trailer's info dictionary, when present.
/// Metadata problems are absence, never a fault — page text is what matters.
fn read_info_strings(bytes: &[u8]) -> (Option<String>, Option<String>) {
    let document = match lopdf::Document::load_mem(bytes) {
        Ok(d) => d,
        Err(_) => return (None, None),
    };
    (
        info_string(&document, b"Title"),
        info_string(&document, b"Author"),
    )
}

fn info_string(document: &lopdf::Document, key: &[u8]) -> Option<String> {
    let info = document.trailer.get(b"Info").ok()?;
    let dict = match info {
        lopdf::Object::Reference(id) => document.get_object(*id).ok()?.as_dict().ok()?,
        lopdf::Object::Dictionary(d) => d,
        _ => return None,
    };
    let raw = dict.get(key).ok()?.as_str().ok()?;
    let text = decode_pdf_string(raw);
    let text = text.trim();
    if text.is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}

/// PDF text strings are either UTF-16BE (BOM-prefixed) or PDFDocEncoding,
/// which is ASCII-compatible for the range that matters here.
fn decode_pdf_string(raw: &[u8]) -> String {
    if raw.starts_with(&[0xFE, 0xFF]) {
        let units: Vec<u16> = raw[2..]
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        String::from_utf16_lossy(&units)
    } else {
        String::from_utf8_lossy(raw).into_owned()
    }
}
