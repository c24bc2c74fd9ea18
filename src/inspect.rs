//! Physical inspection of a document
//!
//! `InspectResult` is the immutable document context the examination
//! stages read from: page geometry, ordered lines and repeated lines.

use crate::model::{Bounds, DocumentRef, PageGeometry, RawPage, RepeatedLine, TextLine};
use crate::normalize::normalize;
use crate::repetition::detect_repeated;
use crate::InspectError;
use serde::Serialize;
use std::collections::HashSet;

/// Measured properties of one document
#[derive(Debug, Clone, Serialize)]
pub struct InspectResult {
    pub document: DocumentRef,
    pub page_count: u32,
    /// At least one non-empty line was found
    pub text_based: bool,
    #[serde(flatten)]
    pub bounds: Bounds,
    pub pages: Vec<PageGeometry>,
    pub lines: Vec<TextLine>,
    pub repeated_lines: Vec<RepeatedLine>,
}

impl InspectResult {
    /// Texts repeated on every page of the document
    ///
    /// These are running headers and footers; they are never keys or
    /// values and take no part in column inference.
    pub fn universal_boilerplate(&self) -> HashSet<&str> {
        self.repeated_lines
            .iter()
            .filter(|r| r.pages.len() == self.page_count as usize)
            .map(|r| r.text.as_str())
            .collect()
    }

    /// Lines that are not universal boilerplate, in reading order
    pub fn structural_lines(&self) -> impl Iterator<Item = &TextLine> + '_ {
        let boilerplate = self.universal_boilerplate();
        self.lines
            .iter()
            .filter(move |line| !boilerplate.contains(line.text.as_str()))
    }
}

/// Build the document context from already-extracted pages
pub fn inspect_raw(document: DocumentRef, pages: Vec<RawPage>) -> InspectResult {
    let normalized = normalize(&pages);
    let repeated_lines = detect_repeated(&normalized.lines);

    InspectResult {
        document,
        page_count: pages.len() as u32,
        text_based: !normalized.lines.is_empty(),
        bounds: normalized.bounds,
        pages: normalized.pages,
        lines: normalized.lines,
        repeated_lines,
    }
}

/// Human-readable inspection summary
pub fn inspect_to_text(result: &InspectResult) -> String {
    let b = &result.bounds;
    let mut out = vec![
        "Inspect summary".to_string(),
        "---------------".to_string(),
        format!("Path:         {}", result.document.path),
        format!("SHA-256:      {}", result.document.sha256),
        format!("Size (bytes): {}", result.document.size_bytes),
        format!("Pages:        {}", result.page_count),
        format!("Text-based:   {}", result.text_based),
        format!("X range:      {} - {}", b.x_min, b.x_max),
        format!("Y range:      {} - {}", b.y_min, b.y_max),
    ];

    if result.repeated_lines.is_empty() {
        out.push("Repeated lines: none".to_string());
    } else {
        out.push("Repeated lines:".to_string());
        for repeated in &result.repeated_lines {
            let pages: Vec<String> = repeated.pages.iter().map(u32::to_string).collect();
            out.push(format!(
                "  - {} (pages {})",
                quoted(&repeated.text),
                pages.join(",")
            ));
        }
    }

    out.join("\n")
}

/// Quote `text` for display: double quotes when it holds `'` but no `"`, else single
fn quoted(text: &str) -> String {
    if text.contains('\'') && !text.contains('"') {
        format!("\"{}\"", text)
    } else {
        format!("'{}'", text.replace('\'', "\\'"))
    }
}

/// Full inspection result as pretty JSON
pub fn inspect_to_json(result: &InspectResult) -> Result<String, InspectError> {
    Ok(serde_json::to_string_pretty(result)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RawToken;

    #[test]
    fn test_text_summary_lists_repeats() {
        let pages = vec![
            RawPage::new(vec![RawToken::new("Confidential", 10.0, 80.0, 5.0, 15.0)]),
            RawPage::new(vec![RawToken::new("Confidential", 10.0, 80.0, 5.0, 15.0)]),
        ];
        let result = inspect_raw(DocumentRef::from_bytes("form.pdf", b"x"), pages);
        let text = inspect_to_text(&result);
        assert!(text.contains("Path:         form.pdf"));
        assert!(text.contains("Pages:        2"));
        assert!(text.contains("  - 'Confidential' (pages 1,2)"));
    }

    #[test]
    fn test_quoted_repeated_text() {
        assert_eq!(quoted("Page footer"), "'Page footer'");
        assert_eq!(quoted("Owner's copy"), "\"Owner's copy\"");
        assert_eq!(quoted("Say \"hi\" it's"), "'Say \"hi\" it\\'s'");
    }

    #[test]
    fn test_structural_lines_skip_universal_boilerplate() {
        let pages = vec![
            RawPage::new(vec![
                RawToken::new("Confidential", 400.0, 460.0, 5.0, 15.0),
                RawToken::new("Status", 20.0, 50.0, 40.0, 50.0),
            ]),
            RawPage::new(vec![RawToken::new("Confidential", 400.0, 460.0, 5.0, 15.0)]),
        ];
        let result = inspect_raw(DocumentRef::from_bytes("form.pdf", b"x"), pages);
        assert!(result.universal_boilerplate().contains("Confidential"));
        let texts: Vec<&str> = result.structural_lines().map(|l| l.text.as_str()).collect();
        assert_eq!(texts, vec!["Status"]);
    }

    #[test]
    fn test_text_summary_no_repeats() {
        let result = inspect_raw(DocumentRef::from_bytes("empty.pdf", b""), vec![]);
        assert!(!result.text_based);
        assert!(inspect_to_text(&result).ends_with("Repeated lines: none"));
    }

    #[test]
    fn test_json_contains_bounds() {
        let result = inspect_raw(DocumentRef::from_bytes("empty.pdf", b""), vec![]);
        let json = inspect_to_json(&result).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["page_count"], 0);
        assert_eq!(value["x_min"], 0.0);
        assert_eq!(value["document"]["path"], "empty.pdf");
    }
}
