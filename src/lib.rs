//! # Docgen
//!
//! A document ingestion and project summarization pipeline.
//!
//! Docgen pulls everything known about a project from three kinds of
//! sources — a knowledge base page, a file store of binary documents, and
//! an issue tracker — extracts the binary documents into a common block
//! model, and synthesizes a single markdown summary.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐   ┌──────────────┐   ┌────────────┐
//! │  Connectors │──▶│  Aggregation │──▶│  Summary   │
//! │ Notion/Drive│   │ Extract+Join │   │ Synthesis  │
//! │ /Jira       │   └──────────────┘   └─────┬──────┘
//! └─────────────┘                            │
//!                            ┌───────────────┤
//!                            ▼               ▼
//!                      ┌──────────┐    ┌──────────┐
//!                      │ Publish  │    │  Local   │
//!                      │ (Notion) │    │  File    │
//!                      └──────────┘    └──────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! docgen sources                      # check connectors and credentials
//! docgen extract report.docx          # extract one file to stdout
//! docgen run --project-id <page-id>   # aggregate and publish a summary
//! docgen run --project-id <page-id> --dry-run --output-dir out/
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Core data types |
//! | [`error`] | Error taxonomy |
//! | [`traits`] | Source connector traits |
//! | [`dispatch`] | Content-type to extractor dispatch |
//! | [`extractor_pdf`] | PDF extraction |
//! | [`extractor_docx`] | Word document extraction |
//! | [`extractor_pptx`] | Presentation extraction |
//! | [`extractor_xlsx`] | Spreadsheet extraction |
//! | [`aggregate`] | Multi-source project aggregation |
//! | [`summarize`] | Summary synthesis |

pub mod aggregate;
pub mod config;
pub mod connector_drive;
pub mod connector_jira;
pub mod connector_notion;
pub mod dispatch;
pub mod error;
pub mod extractor_docx;
pub mod extractor_pdf;
pub mod extractor_pptx;
pub mod extractor_xlsx;
pub mod models;
pub mod ooxml;
pub mod sources;
pub mod summarize;
pub mod traits;
