//! Repeated line detection
//!
//! Text that recurs verbatim on more than one page is usually a header,
//! footer or letterhead.

use crate::model::{RepeatedLine, TextLine};
use std::collections::{BTreeSet, HashMap};

/// Find every text that occurs on two or more distinct pages
///
/// Results are in order of first occurrence. Repeats confined to a single
/// page do not count.
pub fn detect_repeated(lines: &[TextLine]) -> Vec<RepeatedLine> {
    let mut order: Vec<&str> = Vec::new();
    let mut pages_by_text: HashMap<&str, BTreeSet<u32>> = HashMap::new();

    for line in lines {
        let text = line.text.as_str();
        pages_by_text
            .entry(text)
            .or_insert_with(|| {
                order.push(text);
                BTreeSet::new()
            })
            .insert(line.page_number);
    }

    let repeated: Vec<RepeatedLine> = order
        .into_iter()
        .filter_map(|text| {
            let pages = &pages_by_text[text];
            (pages.len() >= 2).then(|| RepeatedLine {
                text: text.to_string(),
                pages: pages.iter().copied().collect(),
            })
        })
        .collect();

    log::debug!("{} repeated lines", repeated.len());
    repeated
}
