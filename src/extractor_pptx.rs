//! Slide-deck (pptx) extractor.
//!
//! Emits an optional title/author header, then per slide (numeric part
//! order, numbered from 1): a slide marker, the slide's title if it has
//! one, and each shape's text. A shape whose text duplicates the slide
//! title already emitted is skipped, as are shapes carrying no text.

use std::path::Path;

use crate::error::ExtractError;
use crate::models::{CanonicalDocument, TextBlock};
use crate::ooxml::{
    numbered_parts, open_archive, read_core_properties, read_zip_entry_bounded, MAX_XML_ENTRY_BYTES,
};

pub fn extract(path: &Path) -> CanonicalDocument {
    if !path.exists() {
        tracing::warn!(path = %path.display(), "pptx file not found");
        return CanonicalDocument::empty();
    }
    match extract_inner(path) {
        Ok(doc) => doc,
        Err(e) => {
            tracing::error!(path = %path.display(), error = %e, "pptx extraction failed");
            CanonicalDocument::diagnostic(format!("Error parsing PPTX file: {}", e))
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

    if props.title.is_some() || props.author.is_some() {
        if let Some(title) = &props.title {
            doc.sections
                .push(TextBlock::paragraph(format!("Title: {}", title)));
        }
        if let Some(author) = &props.author {
            doc.sections
                .push(TextBlock::paragraph(format!("Author: {}", author)));
        }
        doc.sections.push(TextBlock::blank());
    }

    let parts = numbered_parts(&archive, "ppt/slides/slide");
    for (idx, part) in parts.into_iter().enumerate() {
        let xml = read_zip_entry_bounded(&mut archive, &part, MAX_XML_ENTRY_BYTES)?;
        let shapes = parse_slide_shapes(&xml)?;
        emit_slide(&mut doc.sections, idx + 1, &shapes);
    }

    Ok(doc)
}

/// One text-bearing shape on a slide.
#[derive(Debug, PartialEq)]
struct Shape {
    is_title: bool,
    text: String,
}

fn emit_slide(sections: &mut Vec<TextBlock>, number: usize, shapes: &[Shape]) {
    sections.push(TextBlock::slide_marker(number));

    let title = shapes
        .iter()
        .find(|s| s.is_title && !s.text.is_empty())
        .map(|s| s.text.clone());

    if let Some(title) = &title {
        sections.push(TextBlock::paragraph(format!("Title: {}", title)));
    }

    for shape in shapes {
        if shape.text.is_empty() {
            continue;
        }
        if title.as_deref() == Some(shape.text.as_str()) {
            continue;
        }
        sections.push(TextBlock::paragraph(shape.text.clone()));
    }

    sections.push(TextBlock::blank());
}

/// Parse the `p:sp` shapes of one slide part, in slide order. A shape is a
/// title when its placeholder is of type `title` or `ctrTitle`. Text runs
/// within a shape are joined, with one newline per shape paragraph.
fn parse_slide_shapes(xml: &[u8]) -> Result<Vec<Shape>, ExtractError> {
    let mut shapes = Vec::new();
    let mut reader = quick_xml::Reader::from_reader(xml);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();

    let mut in_shape = false;
    let mut is_title = false;
    let mut text = String::new();
    let mut paragraph_open = false;
    let mut in_text = false;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(quick_xml::events::Event::Start(e)) | Ok(quick_xml::events::Event::Empty(e)) => {
                match e.local_name().as_ref() {
                    b"sp" => {
                        in_shape = true;
                        is_title = false;
                        text.clear();
                        paragraph_open = false;
                    }
                    b"ph" if in_shape => {
                        for attr in e.attributes().flatten() {
                            if attr.key.as_ref() == b"type"
                                && matches!(attr.value.as_ref(), b"title" | b"ctrTitle")
                            {
                                is_title = true;
                            }
                        }
                    }
                    b"p" if in_shape => {
                        if paragraph_open {
                            text.push('\n');
                        }
                        paragraph_open = true;
                    }
                    b"t" if in_shape => in_text = true,
                    _ => {}
                }
            }
            Ok(quick_xml::events::Event::Text(te)) if in_text => {
                text.push_str(te.unescape().unwrap_or_default().as_ref());
                in_text = false;
            }
            Ok(quick_xml::events::Event::End(e)) => match e.local_name().as_ref() {
                b"t" => in_text = false,
                b"sp" if in_shape => {
                    in_shape = false;
                    shapes.push(Shape {
                        is_title,
                        text: text.trim().to_string(),
                    });
                }
                _ => {}
            },
            Ok(quick_xml::events::Event::Eof) => break,
            Err(e) => return Err(ExtractError::Ooxml(e.to_string())),
            _ => {}
        }
        buf.clear();
    }

    Ok(shapes)
}
