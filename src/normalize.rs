//! Token normalization
//!
//! Turns per-page raw tokens into ordered `TextLine`s and computes page and
//! document bounding geometry.

use crate::model::{Bounds, PageGeometry, RawPage, RawToken, TextLine};
use rayon::prelude::*;

/// Output of the normalizer
#[derive(Debug, Clone, Default)]
pub struct Normalized {
    pub pages: Vec<PageGeometry>,
    /// All retained lines, ordered by (page, top, x0)
    pub lines: Vec<TextLine>,
    /// Element-wise min/max over `pages`
    pub bounds: Bounds,
}

/// Normalize every page; page numbers are assigned by position (1-based)
pub fn normalize(pages: &[RawPage]) -> Normalized {
    let per_page: Vec<(PageGeometry, Vec<TextLine>)> = pages
        .par_iter()
        .enumerate()
        .map(|(idx, page)| normalize_page(idx as u32 + 1, page))
        .collect();

    let mut geometries = Vec::with_capacity(per_page.len());
    let mut lines = Vec::new();
    for (geometry, page_lines) in per_page {
        geometries.push(geometry);
        lines.extend(page_lines);
    }

    let bounds = Bounds::union(geometries.iter().map(|g| &g.bounds));

    log::debug!(
        "normalized {} pages into {} lines, bounds {:?}",
        geometries.len(),
        lines.len(),
        bounds
    );

    Normalized {
        pages: geometries,
        lines,
        bounds,
    }
}

/// Normalize one page's tokens
fn normalize_page(page_number: u32, page: &RawPage) -> (PageGeometry, Vec<TextLine>) {
    let mut substituted = 0usize;
    let mut lines: Vec<TextLine> = page
        .tokens
        .iter()
        .filter_map(|token| normalize_token(page_number, token, &mut substituted))
        .collect();

    if substituted > 0 {
        log::warn!(
            "page {}: {} missing or invalid coordinates replaced with 0.0",
            page_number,
            substituted
        );
    }

    lines.sort_by(|a, b| a.reading_order(b));

    let bounds = if lines.is_empty() {
        Bounds::default()
    } else {
        Bounds {
            x_min: lines.iter().map(|l| l.x0).fold(f32::INFINITY, f32::min),
            x_max: lines.iter().map(|l| l.x1).fold(f32::NEG_INFINITY, f32::max),
            y_min: lines.iter().map(|l| l.top).fold(f32::INFINITY, f32::min),
            y_max: lines
                .iter()
                .map(|l| l.bottom)
                .fold(f32::NEG_INFINITY, f32::max),
        }
    };

    let geometry = PageGeometry {
        page_number,
        text_item_count: page.tokens.len(),
        bounds,
    };

    (geometry, lines)
}

/// Strip text and sanitize coordinates; `None` when no text remains
fn normalize_token(page_number: u32, token: &RawToken, substituted: &mut usize) -> Option<TextLine> {
    let text = token.text.as_deref().unwrap_or("").trim();
    if text.is_empty() {
        return None;
    }

    let mut coord = |value: Option<f32>| match value {
        Some(v) if v.is_finite() => v.max(0.0),
        _ => {
            *substituted += 1;
            0.0
        }
    };

    let (a, b) = (coord(token.x0), coord(token.x1));
    let (c, d) = (coord(token.top), coord(token.bottom));

    Some(TextLine {
        page_number,
        text: text.to_string(),
        x0: a.min(b),
        x1: a.max(b),
        top: c.min(d),
        bottom: c.max(d),
    })
}
