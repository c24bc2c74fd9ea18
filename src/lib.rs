//! Layout-driven key/value inference for PDF forms
//!
//! This crate provides:
//! - Positioned text extraction using lopdf
//! - Physical inspection: page geometry, ordered lines, repeated boilerplate
//! - Structure inference: key/value columns, key candidates, multi-line values
//! - Read-only record views with exact and regex selectors

pub mod aggregate;
pub mod classify;
pub mod display;
pub mod examine;
pub mod extractor;
pub mod inspect;
pub mod model;
pub mod normalize;
pub mod records;
pub mod repetition;
pub mod zones;

pub use display::{display_view, render_json, render_text, Payload, View};
pub use examine::{examine, Examination, LayoutConfig};
pub use inspect::{inspect_raw, inspect_to_json, inspect_to_text, InspectResult};
pub use model::{
    ColumnAnchors, DocumentRef, FieldSpan, LineRole, RawPage, RawToken, Record, RepeatedLine,
    TextLine, TicketMetadata,
};

use std::path::Path;

/// Inspect a PDF file: identity, page geometry, lines and repeated lines
///
/// The file is read once; the same bytes are hashed and parsed.
pub fn inspect_pdf<P: AsRef<Path>>(path: P) -> Result<InspectResult, InspectError> {
    let path = path.as_ref();
    let bytes = std::fs::read(path)?;
    let document = DocumentRef::from_bytes(path.display().to_string(), &bytes);
    inspect_pdf_mem(document, &bytes)
}

/// Inspect a PDF already held in memory
pub fn inspect_pdf_mem(document: DocumentRef, buffer: &[u8]) -> Result<InspectResult, InspectError> {
    let pages = extractor::extract_pages_mem(buffer)?;
    log::debug!("{}: extracted {} pages", document.path, pages.len());
    Ok(inspect_raw(document, pages))
}

/// Inspect and examine a PDF file in one step
pub fn examine_pdf<P: AsRef<Path>>(
    path: P,
    config: &LayoutConfig,
) -> Result<(InspectResult, Examination), InspectError> {
    let inspection = inspect_pdf(path)?;
    let examination = examine(&inspection, config);
    Ok((inspection, examination))
}

#[derive(Debug, thiserror::Error)]
pub enum InspectError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("PDF parsing error: {0}")]
    Parse(String),
    #[error("invalid selector: {0}")]
    Selector(String),
    #[error("invalid selector regex: {0}")]
    Regex(#[from] regex::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<lopdf::Error> for InspectError {
    fn from(e: lopdf::Error) -> Self {
        InspectError::Parse(e.to_string())
    }
}
