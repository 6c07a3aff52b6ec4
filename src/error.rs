//! Error taxonomy for the aggregation pipeline.
//!
//! Failure classes map to how the orchestrator reacts: a [`FetchError`] is
//! fatal only for the mandatory overview fetch and recoverable everywhere
//! else; a dispatch miss skips the file; an [`ExtractError`] never crosses
//! the extractor boundary (it is downgraded to a diagnostic block inside the
//! returned document); a [`ConfigurationError`] is surfaced at startup.

use thiserror::Error;

/// A source connector was unreachable, unauthorized, or returned a malformed
/// response.
#[derive(Debug, Error)]
#[error("{service}: {reason}")]
pub struct FetchError {
    /// Which connector failed (e.g. `"knowledge-base"`, `"file-store"`).
    pub service: &'static str,
    pub reason: String,
}

impl FetchError {
    pub fn new(service: &'static str, reason: impl Into<String>) -> Self {
        Self {
            service,
            reason: reason.into(),
        }
    }
}

/// Internal extractor failure.
///
/// Extractors catch this themselves: `extract` returns a document whose sole
/// content is a diagnostic paragraph, so a broken file degrades output
/// quality without breaking the run.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("PDF extraction failed: {0}")]
    Pdf(String),
    #[error("OOXML extraction failed: {0}")]
    Ooxml(String),
}

/// Invalid startup state: duplicate extractor registration or an otherwise
/// unusable configuration. Never deferred to dispatch time.
#[derive(Debug, Error)]
#[error("configuration error: {0}")]
pub struct ConfigurationError(pub String);

/// Top-level failure classes for one run.
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("no extractor for content type '{0}'")]
    DispatchMiss(String),

    #[error(transparent)]
    Extraction(#[from] ExtractError),

    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
}
