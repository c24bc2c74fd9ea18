//! Key/value column inference
//!
//! Forms put labels at one left margin and their values at a second, larger
//! one. The two margins are found by splitting the distinct left edges at
//! their widest gap.

use crate::model::{cmp_f32, ColumnAnchors, TextLine};

/// Infer the key-column and value-column anchors from line left edges
///
/// `x0` values are rounded to `rounding` and deduplicated. The largest gap
/// between neighbours splits them into a low and a high group; the anchors
/// are the minimum of each group. Equal gaps resolve to the leftmost one.
/// With fewer than two distinct edges both anchors collapse to the same
/// value (0.0 for an empty document).
///
/// Callers pass the structural lines only; see
/// [`InspectResult::structural_lines`](crate::inspect::InspectResult::structural_lines).
pub fn infer_zones<'a, I>(lines: I, rounding: f32) -> ColumnAnchors
where
    I: IntoIterator<Item = &'a TextLine>,
{
    let mut edges: Vec<f32> = lines
        .into_iter()
        .map(|l| round_to(l.x0, rounding))
        .collect();
    edges.sort_by(|a, b| cmp_f32(*a, *b));
    edges.dedup();

    let anchors = match edges.as_slice() {
        [] => ColumnAnchors::single(0.0),
        [only] => ColumnAnchors::single(*only),
        _ => {
            let mut split = 1;
            let mut widest = f32::NEG_INFINITY;
            for (i, pair) in edges.windows(2).enumerate() {
                let gap = pair[1] - pair[0];
                // strict comparison keeps the leftmost of equal gaps
                if gap > widest {
                    widest = gap;
                    split = i + 1;
                }
            }
            ColumnAnchors {
                anchor_x1: edges[0],
                anchor_x2: edges[split],
            }
        }
    };

    log::debug!(
        "{} distinct left edges, anchors x1={} x2={}",
        edges.len(),
        anchors.anchor_x1,
        anchors.anchor_x2
    );
    anchors
}

fn round_to(value: f32, step: f32) -> f32 {
    if step > 0.0 {
        (value / step).round() * step
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(x0: f32) -> TextLine {
        TextLine {
            page_number: 1,
            text: "t".into(),
            x0,
            x1: x0 + 20.0,
            top: 0.0,
            bottom: 10.0,
        }
    }

    #[test]
    fn test_two_columns() {
        let lines = vec![at(10.0), at(200.0), at(200.2), at(10.4), at(215.0)];
        let anchors = infer_zones(&lines, 1.0);
        assert_eq!(anchors.anchor_x1, 10.0);
        assert_eq!(anchors.anchor_x2, 200.0);
        assert!(anchors.is_two_column());
    }

    #[test]
    fn test_single_edge_collapses() {
        let anchors = infer_zones(&[at(36.2), at(35.9)], 1.0);
        assert_eq!(anchors, ColumnAnchors::single(36.0));
        assert!(!anchors.is_two_column());
    }

    #[test]
    fn test_empty_document() {
        assert_eq!(infer_zones(&Vec::<TextLine>::new(), 1.0), ColumnAnchors::single(0.0));
    }

    #[test]
    fn test_equal_gaps_pick_leftmost() {
        let anchors = infer_zones(&[at(0.0), at(50.0), at(100.0)], 1.0);
        assert_eq!(anchors.anchor_x1, 0.0);
        assert_eq!(anchors.anchor_x2, 50.0);
    }

    #[test]
    fn test_low_group_minimum_is_key_anchor() {
        // Gaps: 5, 15, 150 -> split before 190
        let anchors = infer_zones(&[at(20.0), at(25.0), at(40.0), at(190.0)], 1.0);
        assert_eq!(anchors.anchor_x1, 20.0);
        assert_eq!(anchors.anchor_x2, 190.0);
    }
}
