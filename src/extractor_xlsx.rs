//! Spreadsheet (xlsx) extractor.
//!
//! Emits an optional title/author header, then per sheet: a sheet marker,
//! a header row built from the sheet's first row, a dash separator, and up
//! to [`MAX_DATA_ROWS`] non-empty data rows rendered as pipe-joined cells.
//! Sheets beyond the cap end with a truncation notice stating how many rows
//! were omitted.

use std::path::Path;

use crate::error::ExtractError;
use crate::models::{CanonicalDocument, TextBlock};
use crate::ooxml::{
    numbered_parts, open_archive, read_core_properties, read_zip_entry_bounded, Archive,
    MAX_XML_ENTRY_BYTES,
};

/// Data rows rendered per sheet before truncation (header row included in
/// the count, matching the legacy output this feeds).
const MAX_DATA_ROWS: usize = 200;
/// Sheets processed per workbook.
const MAX_SHEETS: usize = 100;

pub fn extract(path: &Path) -> CanonicalDocument {
    if !path.exists() {
        tracing::warn!(path = %path.display(), "xlsx file not found");
        return CanonicalDocument::empty();
    }
    match extract_inner(path) {
        Ok(doc) => doc,
        Err(e) => {
            tracing::error!(path = %path.display(), error = %e, "xlsx extraction failed");
            CanonicalDocument::diagnostic(format!("Error parsing XLSX file: {}", e))
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

    let shared_strings = read_shared_strings(&mut archive)?;
    let display_names = read_sheet_names(&mut archive)?;
    let parts = numbered_parts(&archive, "xl/worksheets/sheet");

    for (idx, part) in parts.into_iter().take(MAX_SHEETS).enumerate() {
        let name = display_names
            .get(idx)
            .cloned()
            .unwrap_or_else(|| format!("Sheet{}", idx + 1));
        let xml = read_zip_entry_bounded(&mut archive, &part, MAX_XML_ENTRY_BYTES)?;
        let grid = parse_sheet_grid(&xml, &shared_strings)?;
        emit_sheet(&mut doc.sections, &name, &grid);
    }

    Ok(doc)
}

fn emit_sheet(sections: &mut Vec<TextBlock>, name: &str, grid: &[Vec<String>]) {
    sections.push(TextBlock::sheet_marker(name));

    if !grid.is_empty() && !grid[0].is_empty() {
        let headers = &grid[0];
        if headers.iter().any(|h| !h.is_empty()) {
            sections.push(TextBlock::table_row(headers.join(" | ")));
            let width: usize =
                headers.iter().map(|h| h.len()).sum::<usize>() + 3 * (headers.len() - 1);
            sections.push(TextBlock::table_row("-".repeat(width)));
        }

        let last_row = grid.len().min(MAX_DATA_ROWS);
        for row in &grid[1..last_row] {
            if row.iter().any(|c| !c.is_empty()) {
                sections.push(TextBlock::table_row(row.join(" | ")));
            }
        }

        if grid.len() > last_row {
            sections.push(TextBlock::truncation_notice(grid.len() - last_row));
        }
    }

    sections.push(TextBlock::blank());
}

/// Sheet display names from `xl/workbook.xml`, in declaration order.
fn read_sheet_names(archive: &mut Archive<'_>) -> Result<Vec<String>, ExtractError> {
    let xml = match read_zip_entry_bounded(archive, "xl/workbook.xml", MAX_XML_ENTRY_BYTES) {
        Ok(xml) => xml,
        Err(_) => return Ok(Vec::new()),
    };
    let mut names = Vec::new();
    let mut reader = quick_xml::Reader::from_reader(xml.as_slice());
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(quick_xml::events::Event::Start(e)) | Ok(quick_xml::events::Event::Empty(e)) => {
                if e.local_name().as_ref() == b"sheet" {
                    for attr in e.attributes().flatten() {
                        if attr.key.as_ref() == b"name" {
                            names.push(String::from_utf8_lossy(&attr.value).into_owned());
                        }
                    }
                }
            }
            Ok(quick_xml::events::Event::Eof) => break,
            Err(e) => return Err(ExtractError::Ooxml(e.to_string())),
            _ => {}
        }
        buf.clear();
    }
    Ok(names)
}

fn read_shared_strings(archive: &mut Archive<'_>) -> Result<Vec<String>, ExtractError> {
    // Workbooks with no string cells have no sharedStrings part at all.
    let xml = match read_zip_entry_bounded(archive, "xl/sharedStrings.xml", MAX_XML_ENTRY_BYTES) {
        Ok(xml) => xml,
        Err(_) => return Ok(Vec::new()),
    };
    let mut strings = Vec::new();
    let mut reader = quick_xml::Reader::from_reader(xml.as_slice());
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();
    let mut in_si = false;
    let mut current = String::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(quick_xml::events::Event::Start(e)) => {
                if e.local_name().as_ref() == b"si" {
                    in_si = true;
                    current.clear();
                } else if in_si && e.local_name().as_ref() == b"t" {
                    if let Ok(quick_xml::events::Event::Text(te)) = reader.read_event_into(&mut buf)
                    {
                        current.push_str(te.unescape().unwrap_or_default().as_ref());
                    }
                }
            }
            Ok(quick_xml::events::Event::End(e)) => {
                if e.local_name().as_ref() == b"si" {
                    in_si = false;
                    strings.push(std::mem::take(&mut current));
                }
            }
            Ok(quick_xml::events::Event::Eof) => break,
            Err(e) => return Err(ExtractError::Ooxml(e.to_string())),
            _ => {}
        }
        buf.clear();
    }
    Ok(strings)
}

/// Column index from an `A1`-style cell reference (`A` = 0, `AA` = 26).
/// `None` for references with no letters or with a letter run too long to
/// be a real column (crafted input must not overflow).
fn column_index(cell_ref: &str) -> Option<usize> {
    let letters: String = cell_ref.chars().take_while(|c| c.is_ascii_alphabetic()).collect();
    if letters.is_empty() {
        return None;
    }
    let mut idx = 0usize;
    for c in letters.chars() {
        idx = idx
            .checked_mul(26)?
            .checked_add(c.to_ascii_uppercase() as usize - 'A' as usize + 1)?;
    }
    Some(idx - 1)
}

/// Parse one worksheet part into a dense grid. Every row is padded to the
/// sheet's max column so empty cells render as empty strings, not gaps.
fn parse_sheet_grid(xml: &[u8], shared_strings: &[String]) -> Result<Vec<Vec<String>>, ExtractError> {
    #[derive(PartialEq)]
    enum CellType {
        Raw,
        Shared,
        Inline,
    }

    let mut sparse_rows: Vec<Vec<(usize, String)>> = Vec::new();
    let mut current_row: Vec<(usize, String)> = Vec::new();
    let mut in_row = false;

    let mut cell_col = 0usize;
    let mut next_col = 0usize;
    let mut cell_type = CellType::Raw;
    let mut in_value = false;

    let mut reader = quick_xml::Reader::from_reader(xml);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(quick_xml::events::Event::Start(e)) | Ok(quick_xml::events::Event::Empty(e)) => {
                match e.local_name().as_ref() {
                    b"row" => {
                        in_row = true;
                        next_col = 0;
                        current_row.clear();
                    }
                    b"c" if in_row => {
                        cell_col = next_col;
                        cell_type = CellType::Raw;
                        for attr in e.attributes().flatten() {
                            match attr.key.as_ref() {
                                b"r" => {
                                    if let Some(col) =
                                        column_index(&String::from_utf8_lossy(&attr.value))
                                    {
                                        cell_col = col;
                                    }
                                }
                                b"t" => {
                                    cell_type = match attr.value.as_ref() {
                                        b"s" => CellType::Shared,
                                        b"inlineStr" => CellType::Inline,
                                        _ => CellType::Raw,
                                    };
                                }
                                _ => {}
                            }
                        }
                        next_col = cell_col + 1;
                    }
                    b"v" if in_row => in_value = true,
                    b"t" if in_row && cell_type == CellType::Inline => in_value = true,
                    _ => {}
                }
            }
            Ok(quick_xml::events::Event::Text(te)) if in_value => {
                let raw = te.unescape().unwrap_or_default().into_owned();
                let value = match cell_type {
                    CellType::Shared => raw
                        .trim()
                        .parse::<usize>()
                        .ok()
                        .and_then(|i| shared_strings.get(i).cloned())
                        .unwrap_or_default(),
                    _ => raw,
                };
                if !value.is_empty() {
                    current_row.push((cell_col, value));
                }
                in_value = false;
            }
            Ok(quick_xml::events::Event::End(e)) => match e.local_name().as_ref() {
                b"v" | b"t" => in_value = false,
                b"row" => {
                    in_row = false;
                    sparse_rows.push(std::mem::take(&mut current_row));
                }
                _ => {}
            },
            Ok(quick_xml::events::Event::Eof) => break,
            Err(e) => return Err(ExtractError::Ooxml(e.to_string())),
            _ => {}
        }
        buf.clear();
    }

    let max_col = sparse_rows
        .iter()
        .flat_map(|row| row.iter().map(|(col, _)| col + 1))
        .max()
        .unwrap_or(0);

    Ok(sparse_rows
        .into_iter()
        .map(|row| {
            let mut dense = vec![String::new(); max_col];
            for (col, value) in row {
                if col < max_col {
                    dense[col] = value;
                }
            }
            dense
        })
        .collect())
}
