//! Shared plumbing for the OOXML container family (docx, pptx, xlsx).
//!
//! All three formats are ZIP archives of XML parts. This module owns the
//! bounded entry reads (zip-bomb protection) and the `docProps/core.xml`
//! metadata shared by every extractor; format-specific part parsing lives in
//! the individual `extractor_*` modules.

use std::io::{Cursor, Read};

use crate::error::ExtractError;

/// Maximum decompressed bytes to read from a single ZIP entry.
pub(crate) const MAX_XML_ENTRY_BYTES: u64 = 50 * 1024 * 1024;

pub(crate) type Archive<'a> = zip::ZipArchive<Cursor<&'a [u8]>>;

pub(crate) fn open_archive(bytes: &[u8]) -> Result<Archive<'_>, ExtractError> {
    zip::ZipArchive::new(Cursor::new(bytes)).map_err(|e| ExtractError::Ooxml(e.to_string()))
}

pub(crate) fn read_zip_entry_bounded(
    archive: &mut Archive<'_>,
    name: &str,
    max_bytes: u64,
) -> Result<Vec<u8>, ExtractError> {
    let entry = archive
        .by_name(name)
        .map_err(|e| ExtractError::Ooxml(e.to_string()))?;
    let mut out = Vec::new();
    entry
        .take(max_bytes)
        .read_to_end(&mut out)
        .map_err(|e| ExtractError::Ooxml(e.to_string()))?;
    if out.len() as u64 >= max_bytes {
        return Err(ExtractError::Ooxml(format!(
            "ZIP entry {} exceeds size limit ({} bytes)",
            name, max_bytes
        )));
    }
    Ok(out)
}

/// Document metadata from `docProps/core.xml`.
#[derive(Debug, Default, Clone)]
pub(crate) struct CoreProperties {
    pub title: Option<String>,
    pub author: Option<String>,
    pub created: Option<String>,
}

/// Read core properties, treating a missing or malformed part as absence.
pub(crate) fn read_core_properties(archive: &mut Archive<'_>) -> CoreProperties {
    let xml = match read_zip_entry_bounded(archive, "docProps/core.xml", MAX_XML_ENTRY_BYTES) {
        Ok(xml) => xml,
        Err(_) => return CoreProperties::default(),
    };
    parse_core_properties(&xml).unwrap_or_default()
}

fn parse_core_properties(xml: &[u8]) -> Result<CoreProperties, ExtractError> {
    let mut props = CoreProperties::default();
    let mut reader = quick_xml::Reader::from_reader(xml);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();
    let mut current: Option<&'static str> = None;
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(quick_xml::events::Event::Start(e)) => {
                current = match e.local_name().as_ref() {
                    b"title" => Some("title"),
                    b"creator" => Some("creator"),
                    b"created" => Some("created"),
                    _ => None,
                };
            }
            Ok(quick_xml::events::Event::Text(te)) => {
                if let Some(field) = current {
                    let text = te.unescape().unwrap_or_default().trim().to_string();
                    if !text.is_empty() {
                        match field {
                            "title" => props.title = Some(text),
                            "creator" => props.author = Some(text),
                            "created" => props.created = Some(text),
                            _ => {}
                        }
                    }
                }
            }
            Ok(quick_xml::events::Event::End(_)) => {
                current = None;
            }
            Ok(quick_xml::events::Event::Eof) => break,
            Err(e) => return Err(ExtractError::Ooxml(e.to_string())),
            _ => {}
        }
        buf.clear();
    }
    Ok(props)
}

/// List archive part names matching `{prefix}{N}.xml`, sorted by N.
/// Used for `xl/worksheets/sheet{N}.xml` and `ppt/slides/slide{N}.xml`.
pub(crate) fn numbered_parts(archive: &Archive<'_>, prefix: &str) -> Vec<String> {
    let mut names: Vec<String> = archive
        .file_names()
        .filter(|n| n.starts_with(prefix) && n.ends_with(".xml"))
        .filter(|n| {
            n.trim_start_matches(prefix)
                .trim_end_matches(".xml")
                .parse::<u32>()
                .is_ok()
        })
        .map(|s| s.to_string())
        .collect();
    names.sort_by_key(|name| {
        name.trim_start_matches(prefix)
            .trim_end_matches(".xml")
            .parse::<u32>()
            .unwrap_or(u32::MAX)
    });
    names
}
