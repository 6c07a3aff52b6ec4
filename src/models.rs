//! Core data models used throughout the aggregation pipeline.
//!
//! Every extractor normalizes into the same block-sequence shape
//! ([`CanonicalDocument`]) so the orchestrator and the summary synthesizer
//! never branch per format. All entities here are created and consumed
//! within a single run; there is no persisted store.

use serde_json::{Map, Value};

/// Structural tag for a [`TextBlock`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    Heading,
    Paragraph,
    TableRow,
    ListItem,
    SlideMarker,
    SheetMarker,
    TruncationNotice,
}

/// One ordered unit of extracted text. Ordering within
/// [`CanonicalDocument::sections`] reflects document reading order and is
/// preserved through formatting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextBlock {
    pub kind: BlockKind,
    pub text: String,
    pub level: Option<u8>,
}

impl TextBlock {
    pub fn heading(text: impl Into<String>) -> Self {
        Self {
            kind: BlockKind::Heading,
            text: text.into(),
            level: None,
        }
    }

    pub fn paragraph(text: impl Into<String>) -> Self {
        Self {
            kind: BlockKind::Paragraph,
            text: text.into(),
            level: None,
        }
    }

    /// Blank separator line (renders as an empty line in plain text).
    pub fn blank() -> Self {
        Self::paragraph("")
    }

    pub fn table_row(text: impl Into<String>) -> Self {
        Self {
            kind: BlockKind::TableRow,
            text: text.into(),
            level: None,
        }
    }

    pub fn slide_marker(number: usize) -> Self {
        Self {
            kind: BlockKind::SlideMarker,
            text: format!("--- Slide {} ---", number),
            level: None,
        }
    }

    pub fn sheet_marker(name: &str) -> Self {
        Self {
            kind: BlockKind::SheetMarker,
            text: format!("--- Sheet: {} ---", name),
            level: None,
        }
    }

    pub fn truncation_notice(omitted_rows: usize) -> Self {
        Self {
            kind: BlockKind::TruncationNotice,
            text: format!("... (truncated, {} more rows)", omitted_rows),
            level: None,
        }
    }
}

/// Normalized text produced by an extractor. Immutable once produced.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CanonicalDocument {
    pub title: Option<String>,
    pub author: Option<String>,
    pub sections: Vec<TextBlock>,
}

impl CanonicalDocument {
    /// Empty-but-valid document, returned when the input file does not exist.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Document whose sole content is one diagnostic paragraph. Used to
    /// record an extraction fault in-band instead of raising it.
    pub fn diagnostic(message: impl Into<String>) -> Self {
        Self {
            title: None,
            author: None,
            sections: vec![TextBlock::paragraph(message)],
        }
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// Render all blocks in reading order, one per line.
    pub fn to_plain_text(&self) -> String {
        self.sections
            .iter()
            .map(|b| b.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// A candidate file discovered in the file store. Identity is `id`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub id: String,
    pub name: String,
    pub content_type: String,
    pub origin_url: Option<String>,
}

/// One file's extraction outcome. A failure is recorded in
/// `extraction_error` (and mirrored as a diagnostic block) so the aggregate
/// stays complete.
#[derive(Debug, Clone)]
pub struct ExtractedDocument {
    pub source: SourceFile,
    pub canonical: CanonicalDocument,
    pub extraction_error: Option<String>,
}

/// Project record fetched from the knowledge base. Pass-through shape; the
/// `properties` map is opaque structured data owned by the connector.
#[derive(Debug, Clone)]
pub struct ProjectOverview {
    pub id: String,
    pub title: String,
    pub properties: Map<String, Value>,
    pub content: String,
}

/// Normalized issue from the issue tracker.
#[derive(Debug, Clone)]
pub struct IssueRecord {
    pub key: String,
    pub id: String,
    pub title: String,
    pub description: String,
    pub type_label: String,
    pub status_label: String,
    pub priority_label: String,
}

/// The unit passed to synthesis: one project's overview, extracted
/// documents (in discovery order), and issues. Built once per run and never
/// mutated after assembly.
#[derive(Debug, Clone)]
pub struct AggregateRecord {
    pub project_id: String,
    pub project_overview: ProjectOverview,
    pub documents: Vec<ExtractedDocument>,
    pub issues: Vec<IssueRecord>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncation_notice_text() {
        let block = TextBlock::truncation_notice(50);
        assert_eq!(block.kind, BlockKind::TruncationNotice);
        assert_eq!(block.text, "... (truncated, 50 more rows)");
    }

    #[test]
    fn plain_text_preserves_block_order() {
        let doc = CanonicalDocument {
            title: None,
            author: None,
            sections: vec![
                TextBlock::heading("--- Page 1 ---"),
                TextBlock::paragraph("body"),
                TextBlock::blank(),
            ],
        };
        assert_eq!(doc.to_plain_text(), "--- Page 1 ---\nbody\n");
    }

    #[test]
    fn diagnostic_document_has_single_paragraph() {
        let doc = CanonicalDocument::diagnostic("boom");
        assert_eq!(doc.sections.len(), 1);
        assert_eq!(doc.sections[0].kind, BlockKind::Paragraph);
        assert_eq!(doc.sections[0].text, "boom");
    }
}
