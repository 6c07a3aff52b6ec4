//! Content-type to extractor dispatch.
//!
//! A fixed enumeration of extractor variants, each answering for its
//! supported content types and a fallback predicate. The lookup table is
//! built once at startup; collisions between exact registrations are a
//! configuration error surfaced at construction, never at dispatch time.

use std::collections::HashMap;
use std::path::Path;

use crate::error::ConfigurationError;
use crate::models::CanonicalDocument;
use crate::{extractor_docx, extractor_pdf, extractor_pptx, extractor_xlsx};

pub const MIME_PDF: &str = "application/pdf";
pub const MIME_DOCX: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";
pub const MIME_DOC: &str = "application/msword";
pub const MIME_PPTX: &str =
    "application/vnd.openxmlformats-officedocument.presentationml.presentation";
pub const MIME_PPT: &str = "application/vnd.ms-powerpoint";
pub const MIME_XLSX: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";
pub const MIME_XLS: &str = "application/vnd.ms-excel";

/// One extractor capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractorKind {
    Pdf,
    Docx,
    Pptx,
    Xlsx,
}

impl ExtractorKind {
    /// Registration order. Fallback predicates are tried in this order, so
    /// dispatch stays deterministic for content types that match more than
    /// one heuristic.
    pub const ALL: [ExtractorKind; 4] = [
        ExtractorKind::Pdf,
        ExtractorKind::Docx,
        ExtractorKind::Pptx,
        ExtractorKind::Xlsx,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ExtractorKind::Pdf => "pdf",
            ExtractorKind::Docx => "docx",
            ExtractorKind::Pptx => "pptx",
            ExtractorKind::Xlsx => "xlsx",
        }
    }

    /// Content types this extractor claims exactly.
    pub fn supported_content_types(&self) -> &'static [&'static str] {
        match self {
            ExtractorKind::Pdf => &[MIME_PDF],
            ExtractorKind::Docx => &[MIME_DOCX, MIME_DOC],
            ExtractorKind::Pptx => &[MIME_PPTX, MIME_PPT],
            ExtractorKind::Xlsx => &[MIME_XLSX, MIME_XLS],
        }
    }

    /// Substring heuristics for vendor content types outside the exact
    /// table. Known precision gap: a future MIME string containing one of
    /// these keywords dispatches to the matching family. Kept as-is for
    /// compatibility; exact matches always win.
    pub fn matches_fallback(&self, content_type: &str) -> bool {
        let ct = content_type.to_ascii_lowercase();
        match self {
            ExtractorKind::Pdf => ct.ends_with("/pdf"),
            ExtractorKind::Docx => ct.contains("word"),
            ExtractorKind::Pptx => ct.contains("powerpoint"),
            ExtractorKind::Xlsx => ct.contains("excel"),
        }
    }

    /// Extract the file at `path` into the canonical text model.
    ///
    /// Never fails: a nonexistent path yields an empty document and any
    /// internal fault yields a single diagnostic paragraph.
    pub fn extract(&self, path: &Path) -> CanonicalDocument {
        match self {
            ExtractorKind::Pdf => extractor_pdf::extract(path),
            ExtractorKind::Docx => extractor_docx::extract(path),
            ExtractorKind::Pptx => extractor_pptx::extract(path),
            ExtractorKind::Xlsx => extractor_xlsx::extract(path),
        }
    }
}

/// Immutable dispatch table built once at startup.
pub struct DispatchTable {
    exact: HashMap<&'static str, ExtractorKind>,
}

impl DispatchTable {
    pub fn new() -> Result<Self, ConfigurationError> {
        let mut exact = HashMap::new();
        for kind in ExtractorKind::ALL {
            for content_type in kind.supported_content_types() {
                if let Some(previous) = exact.insert(*content_type, kind) {
                    return Err(ConfigurationError(format!(
                        "content type '{}' registered by both {} and {}",
                        content_type,
                        previous.name(),
                        kind.name()
                    )));
                }
            }
        }
        Ok(Self { exact })
    }

    /// Resolve a content type to an extractor: exact match first, then
    /// fallback predicates in registration order. `None` means the caller
    /// must skip the file and log a warning, never abort the run.
    pub fn resolve(&self, content_type: &str) -> Option<ExtractorKind> {
        if let Some(kind) = self.exact.get(content_type) {
            return Some(*kind);
        }
        ExtractorKind::ALL
            .into_iter()
            .find(|kind| kind.matches_fallback(content_type))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_types_resolve_to_their_extractor() {
        let table = DispatchTable::new().unwrap();
        for kind in ExtractorKind::ALL {
            for content_type in kind.supported_content_types() {
                assert_eq!(table.resolve(content_type), Some(kind));
            }
        }
    }

    #[test]
    fn exact_match_wins_over_fallback() {
        let table = DispatchTable::new().unwrap();
        // "application/msword" would also satisfy the docx fallback, but the
        // exact table answers first.
        assert_eq!(table.resolve(MIME_DOC), Some(ExtractorKind::Docx));
        // "application/vnd.ms-excel" contains "excel"; still an exact hit.
        assert_eq!(table.resolve(MIME_XLS), Some(ExtractorKind::Xlsx));
    }

    #[test]
    fn fallback_matches_vendor_strings() {
        let table = DispatchTable::new().unwrap();
        assert_eq!(table.resolve("text/pdf"), Some(ExtractorKind::Pdf));
        assert_eq!(
            table.resolve("application/x-word-legacy"),
            Some(ExtractorKind::Docx)
        );
        assert_eq!(
            table.resolve("Application/X-POWERPOINT"),
            Some(ExtractorKind::Pptx)
        );
        assert_eq!(
            table.resolve("application/x-excel-97"),
            Some(ExtractorKind::Xlsx)
        );
    }

    #[test]
    fn fallback_order_is_registration_order() {
        let table = DispatchTable::new().unwrap();
        // Matches both the docx ("word") and xlsx ("excel") heuristics;
        // docx registers first.
        assert_eq!(
            table.resolve("application/x-word-excel-hybrid"),
            Some(ExtractorKind::Docx)
        );
    }

    #[test]
    fn unknown_type_is_not_found() {
        let table = DispatchTable::new().unwrap();
        assert_eq!(table.resolve("application/octet-stream"), None);
        assert_eq!(table.resolve("image/png"), None);
    }
}
