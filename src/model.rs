//! Data model shared by the inference stages
//!
//! All values here are created once per run and never mutated after the
//! stage that produces them returns.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::cmp::Ordering;

/// Identity of the source file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentRef {
    pub path: String,
    /// Lowercase hex SHA-256 of the file contents
    pub sha256: String,
    pub size_bytes: u64,
}

impl DocumentRef {
    /// Build the identity from the bytes that were actually loaded
    pub fn from_bytes(path: impl Into<String>, bytes: &[u8]) -> Self {
        Self {
            path: path.into(),
            sha256: sha256_hex(bytes),
            size_bytes: bytes.len() as u64,
        }
    }
}

fn sha256_hex(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    digest.iter().map(|b| format!("{:02x}", b)).collect()
}

/// Axis-aligned extent in page coordinates (origin top-left)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Bounds {
    pub x_min: f32,
    pub x_max: f32,
    pub y_min: f32,
    pub y_max: f32,
}

impl Bounds {
    /// Element-wise min/max over `bounds`; all-zero when empty
    pub fn union<'a>(bounds: impl IntoIterator<Item = &'a Bounds>) -> Bounds {
        let mut iter = bounds.into_iter();
        let Some(first) = iter.next() else {
            return Bounds::default();
        };
        iter.fold(*first, |acc, b| Bounds {
            x_min: acc.x_min.min(b.x_min),
            x_max: acc.x_max.max(b.x_max),
            y_min: acc.y_min.min(b.y_min),
            y_max: acc.y_max.max(b.y_max),
        })
    }
}

/// Bounding extent of one page's text
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageGeometry {
    /// Page number (1-indexed)
    pub page_number: u32,
    /// Raw tokens supplied for the page, before stripping
    pub text_item_count: usize,
    #[serde(flatten)]
    pub bounds: Bounds,
}

/// One positioned line of text
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextLine {
    pub page_number: u32,
    pub text: String,
    pub x0: f32,
    pub x1: f32,
    pub top: f32,
    pub bottom: f32,
}

impl TextLine {
    /// Reading-order position used for span windows
    pub fn position(&self) -> Position {
        Position {
            page: self.page_number,
            top: self.top,
        }
    }

    /// Document order: page, then top, then x0
    pub fn reading_order(&self, other: &TextLine) -> Ordering {
        self.position()
            .cmp(&other.position())
            .then_with(|| cmp_f32(self.x0, other.x0))
    }
}

/// `(page, top)` pair, ordered page-major
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Position {
    pub page: u32,
    pub top: f32,
}

impl Eq for Position {}

impl PartialOrd for Position {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Position {
    fn cmp(&self, other: &Self) -> Ordering {
        self.page
            .cmp(&other.page)
            .then_with(|| cmp_f32(self.top, other.top))
    }
}

pub(crate) fn cmp_f32(a: f32, b: f32) -> Ordering {
    a.partial_cmp(&b).unwrap_or(Ordering::Equal)
}

/// A text string seen verbatim on two or more pages
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RepeatedLine {
    pub text: String,
    /// Distinct page numbers, strictly increasing
    pub pages: Vec<u32>,
}

/// Left edges of the key column and the value column
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ColumnAnchors {
    pub anchor_x1: f32,
    pub anchor_x2: f32,
}

impl ColumnAnchors {
    pub fn single(x: f32) -> Self {
        Self {
            anchor_x1: x,
            anchor_x2: x,
        }
    }

    pub fn is_two_column(&self) -> bool {
        self.anchor_x1 < self.anchor_x2
    }
}

/// Role a field span plays in the layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SpanRole {
    KeyCandidate,
}

/// `(x0, top, x1, bottom)` box of a line
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BBox {
    pub x0: f32,
    pub top: f32,
    pub x1: f32,
    pub bottom: f32,
}

impl From<&TextLine> for BBox {
    fn from(line: &TextLine) -> Self {
        Self {
            x0: line.x0,
            top: line.top,
            x1: line.x1,
            bottom: line.bottom,
        }
    }
}

/// A line classified as a field label
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldSpan {
    pub page: u32,
    pub role: SpanRole,
    /// Key label (delimiter stripped in single-column layouts)
    pub text: String,
    pub bbox: BBox,
    pub anchor_x1: f32,
    pub anchor_x2: f32,
    /// Index of the label line in `InspectResult::lines`
    pub line_index: usize,
    /// Text after the delimiter on the label line itself
    pub inline_value: Option<String>,
    /// Indices of the lines that make up the value
    pub source_lines: Vec<usize>,
}

impl FieldSpan {
    pub fn position(&self) -> Position {
        Position {
            page: self.page,
            top: self.bbox.top,
        }
    }

    /// Whether `line` sits on the label's visual row
    ///
    /// Tops or baselines within `tolerance` count as one row, so a value
    /// set in a larger font than its label still matches.
    pub fn shares_row(&self, line: &TextLine, tolerance: f32) -> bool {
        self.page == line.page_number
            && ((line.top - self.bbox.top).abs() <= tolerance
                || (line.bottom - self.bbox.bottom).abs() <= tolerance)
    }
}

/// A key candidate with its value text resolved
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedField {
    #[serde(flatten)]
    pub span: FieldSpan,
    pub value: String,
}

/// Classification of every line after aggregation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "role", content = "field", rename_all = "snake_case")]
pub enum LineRole {
    /// Label of the field at this index
    Key(usize),
    /// Part of the value of the field at this index
    Value(usize),
    /// Running header or footer present on every page
    Boilerplate,
    /// Not claimed by any field
    Orphan,
}

/// Final key/value pairing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Record {
    pub page: u32,
    pub key: String,
    pub value: String,
}

/// Document-level identity fields pulled from the records
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TicketMetadata {
    #[serde(rename = "type")]
    pub ticket_type: Option<String>,
    #[serde(rename = "number")]
    pub ticket_number: Option<String>,
}

/// A word or line token as supplied by the extraction layer
///
/// Every field is optional; the normalizer substitutes defaults instead
/// of failing.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RawToken {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub x0: Option<f32>,
    #[serde(default)]
    pub x1: Option<f32>,
    #[serde(default)]
    pub top: Option<f32>,
    #[serde(default)]
    pub bottom: Option<f32>,
}

impl RawToken {
    pub fn new(text: &str, x0: f32, x1: f32, top: f32, bottom: f32) -> Self {
        Self {
            text: Some(text.to_string()),
            x0: Some(x0),
            x1: Some(x1),
            top: Some(top),
            bottom: Some(bottom),
        }
    }

    /// Lenient reader for loosely-typed token objects
    ///
    /// Numbers and numeric strings are accepted for coordinates; anything
    /// else is treated as missing.
    pub fn from_json(value: &serde_json::Value) -> Self {
        let number = |key: &str| -> Option<f32> {
            match value.get(key)? {
                serde_json::Value::Number(n) => n.as_f64().map(|f| f as f32),
                serde_json::Value::String(s) => s.trim().parse::<f32>().ok(),
                _ => None,
            }
        };
        let text = match value.get("text") {
            Some(serde_json::Value::String(s)) => Some(s.clone()),
            Some(serde_json::Value::Number(n)) => Some(n.to_string()),
            _ => None,
        };
        Self {
            text,
            x0: number("x0"),
            x1: number("x1"),
            top: number("top"),
            bottom: number("bottom"),
        }
    }
}

/// All tokens of one page, in extraction order
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RawPage {
    #[serde(default)]
    pub tokens: Vec<RawToken>,
}

impl RawPage {
    pub fn new(tokens: Vec<RawToken>) -> Self {
        Self { tokens }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha256_hex() {
        let doc = DocumentRef::from_bytes("a.pdf", b"abc");
        assert_eq!(
            doc.sha256,
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        assert_eq!(doc.size_bytes, 3);
    }

    #[test]
    fn test_bounds_union_empty() {
        assert_eq!(Bounds::union(&Vec::<Bounds>::new()), Bounds::default());
    }

    #[test]
    fn test_position_ordering() {
        let a = Position { page: 1, top: 500.0 };
        let b = Position { page: 2, top: 10.0 };
        assert!(a < b);
        assert!(Position { page: 1, top: 10.0 } < a);
    }

    #[test]
    fn test_raw_token_from_json_lenient() {
        let value = serde_json::json!({
            "text": "Name",
            "x0": "12.5",
            "x1": 40,
            "top": "abc",
        });
        let token = RawToken::from_json(&value);
        assert_eq!(token.text.as_deref(), Some("Name"));
        assert_eq!(token.x0, Some(12.5));
        assert_eq!(token.x1, Some(40.0));
        assert_eq!(token.top, None);
        assert_eq!(token.bottom, None);
    }

    #[test]
    fn test_raw_page_deserialize_missing_fields() {
        let page: RawPage = serde_json::from_str(
            r#"{"tokens": [{"text": "Owner", "x0": null, "top": 20.5}, {}]}"#,
        )
        .unwrap();
        assert_eq!(page.tokens.len(), 2);
        assert_eq!(page.tokens[0].text.as_deref(), Some("Owner"));
        assert_eq!(page.tokens[0].x0, None);
        assert_eq!(page.tokens[0].x1, None);
        assert_eq!(page.tokens[0].top, Some(20.5));
        assert_eq!(page.tokens[1], RawToken::default());

        let empty: RawPage = serde_json::from_str("{}").unwrap();
        assert!(empty.tokens.is_empty());
    }

    #[test]
    fn test_shares_row_by_top_or_baseline() {
        let label = TextLine {
            page_number: 1,
            text: "Status".into(),
            x0: 20.0,
            x1: 50.0,
            top: 83.0,
            bottom: 92.0,
        };
        let span = FieldSpan {
            page: 1,
            role: SpanRole::KeyCandidate,
            text: "Status".into(),
            bbox: BBox::from(&label),
            anchor_x1: 20.0,
            anchor_x2: 180.0,
            line_index: 0,
            inline_value: None,
            source_lines: Vec::new(),
        };
        let at = |page_number: u32, top: f32, bottom: f32| TextLine {
            page_number,
            text: "v".into(),
            x0: 180.0,
            x1: 220.0,
            top,
            bottom,
        };
        // 16pt value on the label's baseline
        assert!(span.shares_row(&at(1, 76.0, 92.0), 3.0));
        assert!(span.shares_row(&at(1, 84.0, 94.0), 3.0));
        assert!(!span.shares_row(&at(1, 96.0, 106.0), 3.0));
        assert!(!span.shares_row(&at(2, 83.0, 92.0), 3.0));
    }
}
