//! Word-processing (docx) extractor.
//!
//! Emits an optional title/author/created header, every non-blank body
//! paragraph in document order, then every table as a `--- Table N ---`
//! heading followed by pipe-joined rows (all-empty rows are dropped).
//! Table-cell paragraphs belong to their table, not the body flow.

use std::path::Path;

use crate::error::ExtractError;
use crate::models::{CanonicalDocument, TextBlock};
use crate::ooxml::{open_archive, read_core_properties, read_zip_entry_bounded, MAX_XML_ENTRY_BYTES};

pub fn extract(path: &Path) -> CanonicalDocument {
    if !path.exists() {
        tracing::warn!(path = %path.display(), "docx file not found");
        return CanonicalDocument::empty();
    }
    match extract_inner(path) {
        Ok(doc) => doc,
        Err(e) => {
            tracing::error!(path = %path.display(), error = %e, "docx extraction failed");
            CanonicalDocument::diagnostic(format!("Error parsing DOCX file: {}", e))
        }
    }
}

fn extract_inner(path: &Path) -> Result<CanonicalDocument, ExtractError> {
    let bytes = std::fs::read(path).map_err(|e| ExtractError::Ooxml(e.to_string()))?;
    let mut archive = open_archive(&bytes)?;

    let props = read_core_properties(&mut archive);
    let mut doc = CanonicalDocument {
        title: props.title.clone(),
        author: props.author.clone(),
        sections: Vec::new(),
    };

    if props.title.is_some() || props.author.is_some() || props.created.is_some() {
        if let Some(title) = &props.title {
            doc.sections
                .push(TextBlock::paragraph(format!("Title: {}", title)));
        }
        if let Some(author) = &props.author {
            doc.sections
                .push(TextBlock::paragraph(format!("Author: {}", author)));
        }
        if let Some(created) = &props.created {
            doc.sections
                .push(TextBlock::paragraph(format!("Created: {}", created)));
        }
        doc.sections.push(TextBlock::blank());
    }

    let xml = read_zip_entry_bounded(&mut archive, "word/document.xml", MAX_XML_ENTRY_BYTES)?;
    let body = parse_document_body(&xml)?;

    for paragraph in body.paragraphs {
        doc.sections.push(TextBlock::paragraph(paragraph));
    }

    for (n, table) in body.tables.iter().enumerate() {
        doc.sections
            .push(TextBlock::heading(format!("--- Table {} ---", n + 1)));
        for row in table {
            if row.iter().any(|cell| !cell.is_empty()) {
                doc.sections.push(TextBlock::table_row(row.join(" | ")));
            }
        }
        doc.sections.push(TextBlock::blank());
    }

    Ok(doc)
}

struct DocumentBody {
    /// Non-blank body-level paragraphs, in document order.
    paragraphs: Vec<String>,
    /// Tables as rows of trimmed cell texts.
    tables: Vec<Vec<Vec<String>>>,
}

fn parse_document_body(xml: &[u8]) -> Result<DocumentBody, ExtractError> {
    let mut body = DocumentBody {
        paragraphs: Vec::new(),
        tables: Vec::new(),
    };

    let mut reader = quick_xml::Reader::from_reader(xml);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();

    let mut table_depth = 0usize;
    let mut in_paragraph = false;
    let mut in_text = false;
    let mut paragraph = String::new();
    let mut cell = String::new();
    let mut row: Vec<String> = Vec::new();
    let mut table: Vec<Vec<String>> = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(quick_xml::events::Event::Start(e)) => match e.local_name().as_ref() {
                b"tbl" => table_depth += 1,
                b"tr" if table_depth == 1 => row.clear(),
                b"tc" if table_depth == 1 => cell.clear(),
                b"p" if table_depth == 0 => {
                    in_paragraph = true;
                    paragraph.clear();
                }
                b"p" if table_depth >= 1 && !cell.is_empty() => {
                    // python-docx joins cell paragraphs with newlines
                    cell.push('\n');
                }
                b"t" => in_text = true,
                _ => {}
            },
            Ok(quick_xml::events::Event::Text(te)) if in_text => {
                let text = te.unescape().unwrap_or_default();
                if table_depth >= 1 {
                    cell.push_str(&text);
                } else if in_paragraph {
                    paragraph.push_str(&text);
                }
                in_text = false;
            }
            Ok(quick_xml::events::Event::End(e)) => match e.local_name().as_ref() {
                b"t" => in_text = false,
                b"p" if table_depth == 0 && in_paragraph => {
                    in_paragraph = false;
                    let text = paragraph.trim();
                    if !text.is_empty() {
                        body.paragraphs.push(text.to_string());
                    }
                }
                b"tc" if table_depth == 1 => row.push(cell.trim().to_string()),
                b"tr" if table_depth == 1 => table.push(std::mem::take(&mut row)),
                b"tbl" => {
                    table_depth = table_depth.saturating_sub(1);
                    if table_depth == 0 {
                        body.tables.push(std::mem::take(&mut table));
                    }
                }
                _ => {}
            },
            Ok(quick_xml::events::Event::Eof) => break,
            Err(e) => return Err(ExtractError::Ooxml(e.to_string())),
            _ => {}
        }
        buf.clear();
    }

    Ok(body)
}

#[cfg(test)]
mod tests {
    use super::*;

    const NS: &str = r#"xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main""#;

    fn body_of(inner: &str) -> Vec<u8> {
        format!(
            r#"<?xml version="1.0"?><w:document {}><w:body>{}</w:body></w:document>"#,
            NS, inner
        )
        .into_bytes()
    }

    #[test]
    fn paragraphs_in_order_blanks_dropped() {
        let xml = body_of(
            "<w:p><w:r><w:t>first</w:t></w:r></w:p>\
             <w:p><w:r><w:t>  </w:t></w:r></w:p>\
             <w:p><w:r><w:t>sec</w:t></w:r><w:r><w:t>ond</w:t></w:r></w:p>",
        );
        let body = parse_document_body(&xml).unwrap();
        assert_eq!(body.paragraphs, vec!["first", "second"]);
        assert!(body.tables.is_empty());
    }

    #[test]
    fn table_cells_do_not_leak_into_paragraphs() {
        let xml = body_of(
            "<w:p><w:r><w:t>intro</w:t></w:r></w:p>\
             <w:tbl><w:tr>\
               <w:tc><w:p><w:r><w:t>a1</w:t></w:r></w:p></w:tc>\
               <w:tc><w:p><w:r><w:t>b1</w:t></w:r></w:p></w:tc>\
             </w:tr><w:tr>\
               <w:tc><w:p><w:r><w:t></w:t></w:r></w:p></w:tc>\
               <w:tc><w:p><w:r><w:t></w:t></w:r></w:p></w:tc>\
             </w:tr></w:tbl>",
        );
        let body = parse_document_body(&xml).unwrap();
        assert_eq!(body.paragraphs, vec!["intro"]);
        assert_eq!(body.tables.len(), 1);
        assert_eq!(body.tables[0][0], vec!["a1", "b1"]);
        assert_eq!(body.tables[0][1], vec!["", ""]);
    }

    #[test]
    fn nonexistent_path_yields_empty_document() {
        let doc = extract(Path::new("/nonexistent/design.docx"));
        assert!(doc.is_empty());
    }

    #[test]
    fn invalid_zip_yields_diagnostic() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.docx");
        std::fs::write(&path, b"not a zip").unwrap();
        let doc = extract(&path);
        assert_eq!(doc.sections.len(), 1);
        assert!(doc.sections[0].text.starts_with("Error parsing DOCX file:"));
    }
}
