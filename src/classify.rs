//! Key candidate classification
//!
//! Rules, first match wins:
//! 1. text repeated on every page is boilerplate and never a key or value
//! 2. two-column layout: lines starting in the key column are keys
//! 3. single-column layout: lines containing the delimiter are keys, split
//!    into a label and an inline value fragment

use crate::examine::LayoutConfig;
use crate::inspect::InspectResult;
use crate::model::{BBox, ColumnAnchors, FieldSpan, LineRole, SpanRole, TextLine};

/// Key candidates plus a provisional role for every line
///
/// Lines that are neither keys nor boilerplate start out as
/// `LineRole::Orphan`; value aggregation claims them afterwards.
#[derive(Debug, Clone, Default)]
pub struct Classification {
    pub spans: Vec<FieldSpan>,
    pub roles: Vec<LineRole>,
}

/// Select the key candidates of a document
pub fn classify_keys(
    doc: &InspectResult,
    anchors: ColumnAnchors,
    config: &LayoutConfig,
) -> Classification {
    let boilerplate = doc.universal_boilerplate();

    let mut spans = Vec::new();
    let mut roles = Vec::with_capacity(doc.lines.len());

    for (idx, line) in doc.lines.iter().enumerate() {
        if boilerplate.contains(line.text.as_str()) {
            roles.push(LineRole::Boilerplate);
            continue;
        }

        let candidate = if anchors.is_two_column() {
            ((line.x0 - anchors.anchor_x1).abs() <= config.column_tolerance)
                .then(|| (line.text.clone(), None))
        } else {
            split_delimited(&line.text, config.delimiter)
        };

        match candidate {
            Some((text, inline_value)) => {
                roles.push(LineRole::Key(spans.len()));
                spans.push(key_span(idx, line, text, inline_value, anchors));
            }
            None => roles.push(LineRole::Orphan),
        }
    }

    log::debug!(
        "{} key candidates ({} layout), {} boilerplate texts",
        spans.len(),
        if anchors.is_two_column() {
            "two-column"
        } else {
            "single-column"
        },
        boilerplate.len()
    );

    Classification { spans, roles }
}

/// Split `"Label: value"` at the first delimiter
///
/// Returns `None` when there is no delimiter or the label would be empty.
fn split_delimited(text: &str, delimiter: char) -> Option<(String, Option<String>)> {
    let (label, rest) = text.split_once(delimiter)?;
    let label = label.trim();
    if label.is_empty() {
        return None;
    }
    let rest = rest.trim();
    let inline = (!rest.is_empty()).then(|| rest.to_string());
    Some((label.to_string(), inline))
}

fn key_span(
    line_index: usize,
    line: &TextLine,
    text: String,
    inline_value: Option<String>,
    anchors: ColumnAnchors,
) -> FieldSpan {
    FieldSpan {
        page: line.page_number,
        role: SpanRole::KeyCandidate,
        text,
        bbox: BBox::from(line),
        anchor_x1: anchors.anchor_x1,
        anchor_x2: anchors.anchor_x2,
        line_index,
        inline_value,
        source_lines: Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inspect::inspect_raw;
    use crate::model::{DocumentRef, RawPage, RawToken};

    fn tok(text: &str, x0: f32, top: f32) -> RawToken {
        RawToken::new(text, x0, x0 + 30.0, top, top + 10.0)
    }

    fn doc(pages: Vec<Vec<RawToken>>) -> InspectResult {
        let pages = pages.into_iter().map(RawPage::new).collect();
        inspect_raw(DocumentRef::from_bytes("t.pdf", b""), pages)
    }

    #[test]
    fn test_split_delimited() {
        assert_eq!(
            split_delimited("Time: 10:30", ':'),
            Some(("Time".into(), Some("10:30".into())))
        );
        assert_eq!(split_delimited("Name:", ':'), Some(("Name".into(), None)));
        assert_eq!(split_delimited(": value", ':'), None);
        assert_eq!(split_delimited("No delimiter", ':'), None);
    }

    #[test]
    fn test_two_column_keys_from_key_column() {
        let d = doc(vec![vec![
            tok("Status", 10.0, 100.0),
            tok("Open", 200.0, 100.0),
            tok("Owner", 11.5, 130.0),
        ]]);
        let anchors = ColumnAnchors {
            anchor_x1: 10.0,
            anchor_x2: 200.0,
        };
        let c = classify_keys(&d, anchors, &LayoutConfig::default());
        let keys: Vec<&str> = c.spans.iter().map(|s| s.text.as_str()).collect();
        assert_eq!(keys, vec!["Status", "Owner"]);
        assert_eq!(
            c.roles,
            vec![LineRole::Key(0), LineRole::Orphan, LineRole::Key(1)]
        );
        assert!(c.spans.iter().all(|s| s.role == SpanRole::KeyCandidate));
        assert!(c.spans.iter().all(|s| s.source_lines.is_empty()));
    }

    #[test]
    fn test_single_column_delimiter() {
        let d = doc(vec![vec![tok("Name: Alice", 10.0, 100.0), tok("Notes", 10.0, 120.0)]]);
        let c = classify_keys(&d, ColumnAnchors::single(10.0), &LayoutConfig::default());
        assert_eq!(c.spans.len(), 1);
        assert_eq!(c.spans[0].text, "Name");
        assert_eq!(c.spans[0].inline_value.as_deref(), Some("Alice"));
        assert_eq!(c.roles[1], LineRole::Orphan);
    }

    #[test]
    fn test_universal_boilerplate_excluded() {
        let d = doc(vec![
            vec![tok("Confidential", 10.0, 10.0), tok("Status", 10.0, 100.0)],
            vec![tok("Confidential", 10.0, 10.0)],
        ]);
        let anchors = ColumnAnchors {
            anchor_x1: 10.0,
            anchor_x2: 200.0,
        };
        let c = classify_keys(&d, anchors, &LayoutConfig::default());
        assert_eq!(c.spans.len(), 1);
        assert_eq!(c.spans[0].text, "Status");
        assert_eq!(c.roles[0], LineRole::Boilerplate);
        assert_eq!(c.roles[2], LineRole::Boilerplate);
    }

    #[test]
    fn test_partial_repeats_still_classified() {
        // Repeated on 2 of 3 pages: not universal, still eligible as a key
        let d = doc(vec![
            vec![tok("Owner", 10.0, 10.0)],
            vec![tok("Owner", 10.0, 10.0)],
            vec![tok("Other", 200.0, 10.0)],
        ]);
        let anchors = ColumnAnchors {
            anchor_x1: 10.0,
            anchor_x2: 200.0,
        };
        let c = classify_keys(&d, anchors, &LayoutConfig::default());
        assert_eq!(c.spans.len(), 2);
    }
}
