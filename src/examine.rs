//! Structure inference over an inspected document
//!
//! Runs zone inference, key classification, value aggregation and record
//! building in order. Each stage reads the document context and the
//! previous stage's output only.

use crate::aggregate::aggregate_values;
use crate::classify::classify_keys;
use crate::inspect::InspectResult;
use crate::model::{ColumnAnchors, LineRole, Record, ResolvedField, TicketMetadata};
use crate::records::{build_records, extract_ticket_metadata};
use crate::zones::infer_zones;
use serde::Serialize;

/// Tunables for layout inference
#[derive(Debug, Clone)]
pub struct LayoutConfig {
    /// Step `x0` values are rounded to before zone inference (default: 1.0)
    pub x_rounding: f32,
    /// Max distance from an anchor for a line to start in that column
    pub column_tolerance: f32,
    /// Max `top` or baseline difference for two lines to share a visual row
    pub row_tolerance: f32,
    /// Key/value delimiter for single-column layouts
    pub delimiter: char,
    pub ticket_type_key: String,
    pub ticket_number_key: String,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            x_rounding: 1.0,
            column_tolerance: 3.0,
            row_tolerance: 3.0,
            delimiter: ':',
            ticket_type_key: "TicketType".to_string(),
            ticket_number_key: "TicketNumber".to_string(),
        }
    }
}

/// Inferred structure of one document
#[derive(Debug, Clone, Serialize)]
pub struct Examination {
    pub anchors: ColumnAnchors,
    /// Key candidates with their resolved values, in reading order
    pub fields: Vec<ResolvedField>,
    pub records: Vec<Record>,
    pub ticket: TicketMetadata,
    /// Final role of each line in `InspectResult::lines`
    pub roles: Vec<LineRole>,
}

/// Infer key/value records from an inspected document
pub fn examine(doc: &InspectResult, config: &LayoutConfig) -> Examination {
    let anchors = infer_zones(doc.structural_lines(), config.x_rounding);
    let classification = classify_keys(doc, anchors, config);
    let (fields, roles) = aggregate_values(&doc.lines, classification, anchors, config);
    let records = build_records(&fields);
    let ticket = extract_ticket_metadata(
        &records,
        &config.ticket_type_key,
        &config.ticket_number_key,
    );

    log::debug!(
        "{}: {} records, ticket {:?}",
        doc.document.path,
        records.len(),
        ticket
    );

    Examination {
        anchors,
        fields,
        records,
        ticket,
        roles,
    }
}

/// One line per key candidate: page, label, bounding box and anchors
pub fn key_candidates_to_text(examination: &Examination) -> String {
    examination
        .fields
        .iter()
        .map(|f| {
            let s = &f.span;
            format!(
                "p{} {:?} bbox=({:.1}, {:.1}, {:.1}, {:.1}) x1={:.1} x2={:.1} lines={}",
                s.page,
                s.text,
                s.bbox.x0,
                s.bbox.top,
                s.bbox.x1,
                s.bbox.bottom,
                s.anchor_x1,
                s.anchor_x2,
                s.source_lines.len()
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inspect::inspect_raw;
    use crate::model::{DocumentRef, RawPage, RawToken};

    #[test]
    fn test_layout_config_default() {
        let config = LayoutConfig::default();
        assert!((config.x_rounding - 1.0).abs() < 0.001);
        assert!((config.column_tolerance - 3.0).abs() < 0.001);
        assert_eq!(config.delimiter, ':');
        assert_eq!(config.ticket_type_key, "TicketType");
    }

    #[test]
    fn test_examine_two_column_ticket() {
        let tok = |t: &str, x0: f32, top: f32| RawToken::new(t, x0, x0 + 40.0, top, top + 10.0);
        let pages = vec![RawPage::new(vec![
            tok("TicketType", 20.0, 50.0),
            tok("Incident", 180.0, 50.0),
            tok("TicketNumber", 20.0, 70.0),
            tok("T-42", 180.0, 70.0),
        ])];
        let doc = inspect_raw(DocumentRef::from_bytes("t.pdf", b""), pages);
        let exam = examine(&doc, &LayoutConfig::default());
        assert_eq!(exam.records.len(), 2);
        assert_eq!(exam.ticket.ticket_type.as_deref(), Some("Incident"));
        assert_eq!(exam.ticket.ticket_number.as_deref(), Some("T-42"));
        assert!(key_candidates_to_text(&exam).starts_with("p1 \"TicketType\""));
    }

    #[test]
    fn test_footer_column_does_not_move_value_anchor() {
        let tok = |t: &str, x0: f32, top: f32| RawToken::new(t, x0, x0 + 40.0, top, top + 10.0);
        let pages = vec![
            RawPage::new(vec![
                tok("Status", 20.0, 50.0),
                tok("Open", 180.0, 50.0),
                tok("Confidential", 400.0, 760.0),
            ]),
            RawPage::new(vec![
                tok("Owner", 20.0, 50.0),
                tok("Alice", 180.0, 50.0),
                tok("Confidential", 400.0, 760.0),
            ]),
        ];
        let doc = inspect_raw(DocumentRef::from_bytes("t.pdf", b""), pages);
        let exam = examine(&doc, &LayoutConfig::default());
        assert_eq!(exam.anchors.anchor_x1, 20.0);
        assert_eq!(exam.anchors.anchor_x2, 180.0);
        let values: Vec<&str> = exam.records.iter().map(|r| r.value.as_str()).collect();
        assert_eq!(values, vec!["Open", "Alice"]);
    }
}
