//! Positioned text extraction using lopdf
//!
//! Walks each page's content stream, tracks the text and graphics state,
//! and emits line-granularity tokens in top-left page coordinates.

use crate::model::{RawPage, RawToken};
use crate::InspectError;
use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, ObjectId};
use std::collections::BTreeMap;

/// Baselines closer than this share a row
const ROW_TOLERANCE: f32 = 3.0;
/// Horizontal gap, in multiples of font size, that still joins two items
const MAX_GAP_FACTOR: f32 = 2.0;
/// Average glyph advance, in multiples of font size
const CHAR_WIDTH_FACTOR: f32 = 0.5;
/// US Letter, used when no MediaBox can be found
const DEFAULT_MEDIA_BOX: [f32; 4] = [0.0, 0.0, 612.0, 792.0];

/// A shown text string with its baseline origin (PDF space, bottom-left)
#[derive(Debug, Clone)]
struct TextItem {
    text: String,
    x: f32,
    y: f32,
    font_size: f32,
}

impl TextItem {
    fn width(&self) -> f32 {
        self.text.chars().count() as f32 * self.font_size * CHAR_WIDTH_FACTOR
    }
}

/// Extract tokens for every page of a PDF held in memory
pub fn extract_pages_mem(buffer: &[u8]) -> Result<Vec<RawPage>, InspectError> {
    let doc = Document::load_mem(buffer)?;
    extract_pages_from_doc(&doc)
}

fn extract_pages_from_doc(doc: &Document) -> Result<Vec<RawPage>, InspectError> {
    let pages = doc.get_pages();
    let mut out = Vec::with_capacity(pages.len());

    for (page_num, &page_id) in pages.iter() {
        let media_box = page_media_box(doc, page_id);
        let items = extract_page_text_items(doc, page_id)?;
        let tokens = group_into_tokens(&items, media_box);
        log::debug!(
            "page {}: {} text items, {} tokens",
            page_num,
            items.len(),
            tokens.len()
        );
        out.push(RawPage::new(tokens));
    }

    Ok(out)
}

/// Multiply two 2D transformation matrices
/// Matrix format: [a, b, c, d, e, f] representing:
/// | a  b  0 |
/// | c  d  0 |
/// | e  f  1 |
fn multiply_matrices(m1: &[f32; 6], m2: &[f32; 6]) -> [f32; 6] {
    [
        m1[0] * m2[0] + m1[1] * m2[2],
        m1[0] * m2[1] + m1[1] * m2[3],
        m1[2] * m2[0] + m1[3] * m2[2],
        m1[2] * m2[1] + m1[3] * m2[3],
        m1[4] * m2[0] + m1[5] * m2[2] + m2[4],
        m1[4] * m2[1] + m1[5] * m2[3] + m2[5],
    ]
}

/// Text-showing state for one content stream
struct TextState<'a> {
    doc: &'a Document,
    fonts: BTreeMap<Vec<u8>, &'a Dictionary>,
    ctm: [f32; 6],
    text_matrix: [f32; 6],
    line_matrix: [f32; 6],
    font: String,
    font_size: f32,
    /// Baseline distance used by `T*`, `'` and `"`; set by `TL` and `TD`
    leading: f32,
    items: Vec<TextItem>,
}

impl TextState<'_> {
    fn show(&mut self, text: String) {
        if text.trim().is_empty() {
            return;
        }
        let combined = multiply_matrices(&self.text_matrix, &self.ctm);
        let font_size = effective_font_size(self.font_size, &combined);
        self.items.push(TextItem {
            text,
            x: combined[4],
            y: combined[5],
            font_size,
        });
    }

    fn decode(&self, obj: &Object) -> Option<String> {
        extract_text_from_operand(obj, self.doc, &self.fonts, &self.font)
    }

    /// Move the line matrix by `(tx, ty)` in text space
    fn move_line(&mut self, tx: f32, ty: f32) {
        let lm = self.line_matrix;
        self.line_matrix[4] += tx * lm[0] + ty * lm[2];
        self.line_matrix[5] += tx * lm[1] + ty * lm[3];
        self.text_matrix = self.line_matrix;
    }

    fn next_line(&mut self) {
        self.move_line(0.0, -self.leading);
    }
}

/// Extract shown text items from a single page
fn extract_page_text_items(doc: &Document, page_id: ObjectId) -> Result<Vec<TextItem>, InspectError> {
    let content_data = doc.get_page_content(page_id)?;
    let content = Content::decode(&content_data)?;
    let fonts = doc.get_page_fonts(page_id).unwrap_or_default();
    Ok(collect_text_items(doc, fonts, &content.operations))
}

/// Run a decoded content stream and collect the text it shows
fn collect_text_items<'a>(
    doc: &'a Document,
    fonts: BTreeMap<Vec<u8>, &'a Dictionary>,
    operations: &[Operation],
) -> Vec<TextItem> {
    const IDENTITY: [f32; 6] = [1.0, 0.0, 0.0, 1.0, 0.0, 0.0];
    let mut state = TextState {
        doc,
        fonts,
        ctm: IDENTITY,
        text_matrix: IDENTITY,
        line_matrix: IDENTITY,
        font: String::new(),
        font_size: 12.0,
        leading: 0.0,
        items: Vec::new(),
    };
    let mut ctm_stack: Vec<[f32; 6]> = Vec::new();
    let mut in_text_block = false;

    for op in operations {
        let operands = &op.operands;
        match op.operator.as_str() {
            "q" => ctm_stack.push(state.ctm),
            "Q" => {
                if let Some(saved) = ctm_stack.pop() {
                    state.ctm = saved;
                }
            }
            "cm" if operands.len() >= 6 => {
                let m = matrix_operands(operands);
                state.ctm = multiply_matrices(&m, &state.ctm);
            }
            "BT" => {
                in_text_block = true;
                state.text_matrix = IDENTITY;
                state.line_matrix = IDENTITY;
            }
            "ET" => in_text_block = false,
            "Tf" if operands.len() >= 2 => {
                if let Ok(name) = operands[0].as_name() {
                    state.font = String::from_utf8_lossy(name).to_string();
                }
                if let Some(size) = get_number(&operands[1]) {
                    state.font_size = size;
                }
            }
            "TL" if !operands.is_empty() => {
                if let Some(leading) = get_number(&operands[0]) {
                    state.leading = leading;
                }
            }
            "Td" | "TD" if operands.len() >= 2 => {
                let tx = get_number(&operands[0]).unwrap_or(0.0);
                let ty = get_number(&operands[1]).unwrap_or(0.0);
                if op.operator == "TD" {
                    state.leading = -ty;
                }
                state.move_line(tx, ty);
            }
            "Tm" if operands.len() >= 6 => {
                state.text_matrix = matrix_operands(operands);
                state.line_matrix = state.text_matrix;
            }
            "T*" => state.next_line(),
            "Tj" if in_text_block && !operands.is_empty() => {
                if let Some(text) = state.decode(&operands[0]) {
                    state.show(text);
                }
            }
            "TJ" if in_text_block && !operands.is_empty() => {
                if let Ok(array) = operands[0].as_array() {
                    let text: String = array.iter().filter_map(|o| state.decode(o)).collect();
                    state.show(text);
                }
            }
            "'" if in_text_block && !operands.is_empty() => {
                state.next_line();
                if let Some(text) = state.decode(&operands[0]) {
                    state.show(text);
                }
            }
            // aw ac string: spacing operands do not move the baseline
            "\"" if in_text_block && operands.len() >= 3 => {
                state.next_line();
                if let Some(text) = state.decode(&operands[2]) {
                    state.show(text);
                }
            }
            _ => {}
        }
    }

    state.items
}

fn matrix_operands(operands: &[Object]) -> [f32; 6] {
    let mut m = [1.0f32, 0.0, 0.0, 1.0, 0.0, 0.0];
    for (i, operand) in operands.iter().take(6).enumerate() {
        m[i] = get_number(operand).unwrap_or(if i == 0 || i == 3 { 1.0 } else { 0.0 });
    }
    m
}

/// Helper to get f32 from Object
fn get_number(obj: &Object) -> Option<f32> {
    match obj {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r),
        _ => None,
    }
}

/// Font size after the text matrix and CTM scale
fn effective_font_size(base_size: f32, matrix: &[f32; 6]) -> f32 {
    let scale_x = (matrix[0].powi(2) + matrix[1].powi(2)).sqrt();
    let scale_y = (matrix[2].powi(2) + matrix[3].powi(2)).sqrt();
    base_size * scale_x.max(scale_y)
}

/// Extract text from a text operand, handling encoding
fn extract_text_from_operand(
    obj: &Object,
    doc: &Document,
    fonts: &BTreeMap<Vec<u8>, &Dictionary>,
    current_font: &str,
) -> Option<String> {
    let Object::String(bytes, _) = obj else {
        return None;
    };

    if let Some(font_dict) = fonts.get(current_font.as_bytes()) {
        if let Ok(encoding) = font_dict.get_font_encoding(doc) {
            if let Ok(text) = Document::decode_text(&encoding, bytes) {
                return Some(text);
            }
        }
    }

    // Fallback: UTF-16BE with BOM, then Latin-1
    if bytes.len() >= 2 && bytes[0] == 0xFE && bytes[1] == 0xFF {
        let utf16: Vec<u16> = bytes[2..]
            .chunks_exact(2)
            .map(|chunk| u16::from_be_bytes([chunk[0], chunk[1]]))
            .collect();
        return Some(String::from_utf16_lossy(&utf16));
    }

    Some(bytes.iter().map(|&b| b as char).collect())
}

/// MediaBox of a page, inherited through the page tree
fn page_media_box(doc: &Document, page_id: ObjectId) -> [f32; 4] {
    let mut current = doc.get_dictionary(page_id).ok();
    // Bounded walk; malformed trees can loop
    for _ in 0..32 {
        let Some(dict) = current else { break };
        if let Some(rect) = dict
            .get(b"MediaBox")
            .ok()
            .and_then(|obj| resolve(doc, obj).as_array().ok())
            .and_then(|arr| rect_from_array(doc, arr))
        {
            return rect;
        }
        current = dict
            .get(b"Parent")
            .and_then(Object::as_reference)
            .and_then(|id| doc.get_dictionary(id))
            .ok();
    }
    DEFAULT_MEDIA_BOX
}

fn resolve<'a>(doc: &'a Document, obj: &'a Object) -> &'a Object {
    match obj {
        Object::Reference(id) => doc.get_object(*id).unwrap_or(obj),
        _ => obj,
    }
}

fn rect_from_array(doc: &Document, arr: &[Object]) -> Option<[f32; 4]> {
    if arr.len() < 4 {
        return None;
    }
    let mut rect = [0.0f32; 4];
    for (slot, obj) in rect.iter_mut().zip(arr) {
        *slot = get_number(resolve(doc, obj))?;
    }
    // Normalize so (llx, lly) is the lower-left corner
    Some([
        rect[0].min(rect[2]),
        rect[1].min(rect[3]),
        rect[0].max(rect[2]),
        rect[1].max(rect[3]),
    ])
}

/// Merge text items into line tokens in top-left coordinates
///
/// Consecutive items merge when their baselines are within
/// `ROW_TOLERANCE` and the horizontal gap is at most `MAX_GAP_FACTOR`
/// font sizes, so a label and a distant value on one row stay apart.
fn group_into_tokens(items: &[TextItem], media_box: [f32; 4]) -> Vec<RawToken> {
    let [llx, _, _, ury] = media_box;
    let mut tokens: Vec<RawToken> = Vec::new();
    let mut last: Option<&TextItem> = None;

    for item in items {
        let x0 = item.x - llx;
        let x1 = x0 + item.width();
        let bottom = ury - item.y;
        let top = bottom - item.font_size;

        let joins = match (last, tokens.last()) {
            (Some(prev), Some(token)) => {
                let gap = x0 - token.x1.unwrap_or(x0);
                (prev.y - item.y).abs() < ROW_TOLERANCE
                    && gap >= -item.font_size
                    && gap <= item.font_size * MAX_GAP_FACTOR
            }
            _ => false,
        };

        match tokens.last_mut() {
            Some(token) if joins => {
                let text = token.text.get_or_insert_with(String::new);
                text.push(' ');
                text.push_str(item.text.trim());
                token.x0 = token.x0.map(|v| v.min(x0));
                token.x1 = token.x1.map(|v| v.max(x1));
                token.top = token.top.map(|v| v.min(top));
                token.bottom = token.bottom.map(|v| v.max(bottom));
            }
            _ => tokens.push(RawToken::new(item.text.trim(), x0, x1, top, bottom)),
        }
        last = Some(item);
    }

    tokens
}
