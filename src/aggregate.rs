//! Value span aggregation
//!
//! Assigns unclaimed lines to the key candidate whose window contains them,
//! in a single sweep over the document.

use crate::classify::Classification;
use crate::examine::LayoutConfig;
use crate::model::{ColumnAnchors, FieldSpan, LineRole, ResolvedField, TextLine};

/// Resolve the value text of every key candidate
///
/// Two-column layouts: a key's window runs from its own `(page, top)` up to,
/// but excluding, the `(page, top)` of the next key. A value line on the
/// next key's visual row belongs to that key even when its top sits a
/// little higher. Lines in the value column inside the window are joined
/// with newlines, in reading order.
///
/// Single-column layouts: the inline fragment, extended by any following
/// non-key lines on the same visual row, joined with spaces.
///
/// Returns the resolved fields and the final role of every line.
pub fn aggregate_values(
    lines: &[TextLine],
    classification: Classification,
    anchors: ColumnAnchors,
    config: &LayoutConfig,
) -> (Vec<ResolvedField>, Vec<LineRole>) {
    let Classification {
        mut spans,
        mut roles,
    } = classification;

    if anchors.is_two_column() {
        sweep_value_column(lines, &mut spans, &mut roles, anchors, config);
    } else {
        sweep_same_row(lines, &mut spans, &mut roles, config);
    }

    let orphans = roles.iter().filter(|r| **r == LineRole::Orphan).count();
    if orphans > 0 {
        log::debug!("{} lines not claimed by any key", orphans);
    }

    let separator = if anchors.is_two_column() { "\n" } else { " " };
    let fields = spans
        .into_iter()
        .map(|span| {
            let value = span
                .inline_value
                .iter()
                .map(String::as_str)
                .chain(span.source_lines.iter().map(|&i| lines[i].text.as_str()))
                .collect::<Vec<_>>()
                .join(separator);
            ResolvedField { span, value }
        })
        .collect();

    (fields, roles)
}

fn sweep_value_column(
    lines: &[TextLine],
    spans: &mut [FieldSpan],
    roles: &mut [LineRole],
    anchors: ColumnAnchors,
    config: &LayoutConfig,
) {
    let value_edge = anchors.anchor_x2 - config.column_tolerance;
    let mut next = 0;

    for (idx, line) in lines.iter().enumerate() {
        if roles[idx] != LineRole::Orphan || line.x0 < value_edge {
            continue;
        }
        let pos = line.position();
        while next < spans.len() && spans[next].position() <= pos {
            next += 1;
        }
        let owner = match spans.get(next) {
            Some(upcoming) if upcoming.shares_row(line, config.row_tolerance) => next,
            // Before the first key: nothing can own it
            _ if next == 0 => continue,
            _ => next - 1,
        };
        spans[owner].source_lines.push(idx);
        roles[idx] = LineRole::Value(owner);
    }
}

fn sweep_same_row(
    lines: &[TextLine],
    spans: &mut [FieldSpan],
    roles: &mut [LineRole],
    config: &LayoutConfig,
) {
    let mut current: Option<usize> = None;

    for (idx, line) in lines.iter().enumerate() {
        match roles[idx] {
            LineRole::Key(k) => current = Some(k),
            LineRole::Orphan => {
                let Some(k) = current else { continue };
                let span = &mut spans[k];
                if span.shares_row(line, config.row_tolerance) {
                    span.source_lines.push(idx);
                    roles[idx] = LineRole::Value(k);
                }
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::classify_keys;
    use crate::inspect::inspect_raw;
    use crate::model::{DocumentRef, RawPage, RawToken};
    use crate::zones::infer_zones;

    fn tok(text: &str, x0: f32, top: f32) -> RawToken {
        RawToken::new(text, x0, x0 + 30.0, top, top + 10.0)
    }

    fn resolve(pages: Vec<Vec<RawToken>>) -> (Vec<ResolvedField>, Vec<LineRole>) {
        let config = LayoutConfig::default();
        let pages = pages.into_iter().map(RawPage::new).collect();
        let doc = inspect_raw(DocumentRef::from_bytes("t.pdf", b""), pages);
        let anchors = infer_zones(doc.structural_lines(), config.x_rounding);
        let classification = classify_keys(&doc, anchors, &config);
        aggregate_values(&doc.lines, classification, anchors, &config)
    }

    #[test]
    fn test_multi_line_value() {
        let (fields, _) = resolve(vec![vec![
            tok("Status", 10.0, 100.0),
            tok("Open", 200.0, 100.0),
            tok("Pending review", 200.0, 112.0),
            tok("Owner", 10.0, 130.0),
            tok("Alice", 200.0, 130.0),
        ]]);
        assert_eq!(fields.len(), 2);
        assert_eq!(fields[0].value, "Open\nPending review");
        assert_eq!(fields[0].span.source_lines, vec![1, 2]);
        assert_eq!(fields[1].value, "Alice");
    }

    #[test]
    fn test_value_spans_page_break() {
        let (fields, _) = resolve(vec![
            vec![tok("Description", 10.0, 700.0), tok("First part", 200.0, 700.0)],
            vec![tok("continued", 200.0, 40.0), tok("Owner", 10.0, 80.0)],
        ]);
        assert_eq!(fields[0].value, "First part\ncontinued");
        assert_eq!(fields[1].value, "");
    }

    #[test]
    fn test_lines_before_first_key_are_orphans() {
        let (fields, roles) = resolve(vec![vec![
            tok("Preamble", 200.0, 50.0),
            tok("Status", 10.0, 100.0),
            tok("Open", 200.0, 100.0),
        ]]);
        assert_eq!(fields[0].value, "Open");
        assert_eq!(roles[0], LineRole::Orphan);
        assert_eq!(roles[2], LineRole::Value(0));
    }

    #[test]
    fn test_taller_value_on_key_row() {
        // 12pt values on the baselines of 9pt labels start above them
        let (fields, roles) = resolve(vec![vec![
            RawToken::new("Status", 20.0, 50.0, 83.0, 92.0),
            RawToken::new("Open", 180.0, 210.0, 80.0, 92.0),
            RawToken::new("Owner", 20.0, 50.0, 103.0, 112.0),
            RawToken::new("Alice", 180.0, 210.0, 100.0, 112.0),
        ]]);
        assert_eq!(fields[0].span.text, "Status");
        assert_eq!(fields[0].value, "Open");
        assert_eq!(fields[1].span.text, "Owner");
        assert_eq!(fields[1].value, "Alice");
        assert!(!roles.contains(&LineRole::Orphan));
    }

    #[test]
    fn test_single_column_same_row_continuation() {
        let (fields, roles) = resolve(vec![vec![
            tok("Name:", 10.0, 100.0),
            tok("Alice", 10.0, 100.0),
            tok("Below", 10.0, 120.0),
        ]]);
        assert_eq!(fields.len(), 1);
        assert_eq!(fields[0].span.text, "Name");
        assert_eq!(fields[0].value, "Alice");
        assert_eq!(roles, vec![LineRole::Key(0), LineRole::Value(0), LineRole::Orphan]);
    }

    #[test]
    fn test_single_column_inline_value_only() {
        let (fields, _) = resolve(vec![vec![
            tok("Name: Alice", 10.0, 100.0),
            tok("Role: Admin", 10.0, 120.0),
        ]]);
        assert_eq!(fields[0].value, "Alice");
        assert_eq!(fields[1].value, "Admin");
    }
}
