//! Read-only views over examined records
//!
//! Views can be narrowed with a selector: `/pattern/` is a case-insensitive
//! regex, anything else is an exact key.

use crate::model::{Record, TicketMetadata};
use crate::records::extract_ticket_metadata;
use crate::InspectError;
use regex::{Regex, RegexBuilder};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::str::FromStr;

/// What to display
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Document,
    Keys,
    Records,
}

impl FromStr for View {
    type Err = InspectError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "document" => Ok(View::Document),
            "keys" => Ok(View::Keys),
            "records" => Ok(View::Records),
            other => Err(InspectError::Selector(format!(
                "unknown display object: {}",
                other
            ))),
        }
    }
}

/// Parsed selector argument
#[derive(Debug, Clone)]
pub enum Selector {
    /// `/pattern/`, matched case-insensitively; keeps the original literal
    Regex(Regex, String),
    Exact(String),
}

impl Selector {
    pub fn parse(raw: &str) -> Result<Self, InspectError> {
        if raw.len() >= 2 && raw.starts_with('/') && raw.ends_with('/') {
            let pattern = &raw[1..raw.len() - 1];
            let re = RegexBuilder::new(pattern).case_insensitive(true).build()?;
            Ok(Selector::Regex(re, raw.to_string()))
        } else {
            Ok(Selector::Exact(raw.to_string()))
        }
    }
}

/// Document-level summary
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentSummary {
    pub mode: String,
    pub ticket: TicketMetadata,
    /// Highest page number carrying a record
    pub pages: u32,
    pub record_count: usize,
    pub unique_key_count: usize,
    /// Unique keys in first-seen order
    pub keys: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_counts: Option<Vec<KeyCount>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeyCount {
    pub key: String,
    pub count: usize,
}

/// Result of a display query; serializes to the JSON shape of each view
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Payload {
    Document {
        document: DocumentSummary,
    },
    Keys {
        #[serde(skip_serializing_if = "Option::is_none")]
        selector: Option<String>,
        keys: Vec<String>,
    },
    Records {
        #[serde(skip_serializing_if = "Option::is_none")]
        selector: Option<String>,
        records: Vec<Record>,
    },
    KeyRecords {
        key: String,
        records: Vec<Record>,
    },
}

/// Build the payload for `view` over `records`
pub fn display_view(
    records: &[Record],
    view: View,
    selector: Option<&str>,
    ticket_keys: (&str, &str),
) -> Result<Payload, InspectError> {
    // An empty selector means no selector
    let selector = selector.filter(|s| !s.is_empty());
    match view {
        View::Document => document_payload(records, selector, ticket_keys),
        View::Keys => keys_payload(records, selector),
        View::Records => records_payload(records, selector),
    }
}

fn document_payload(
    records: &[Record],
    selector: Option<&str>,
    (type_key, number_key): (&str, &str),
) -> Result<Payload, InspectError> {
    let mode = selector.unwrap_or("summary");
    if mode != "summary" && mode != "details" {
        return Err(InspectError::Selector(format!(
            "unknown document selector: {}",
            mode
        )));
    }

    let keys_all = trimmed_keys(records);
    let keys = unique_in_order(&keys_all);

    let key_counts = (mode == "details").then(|| {
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for key in &keys_all {
            *counts.entry(key.as_str()).or_default() += 1;
        }
        keys.iter()
            .map(|k| KeyCount {
                key: k.clone(),
                count: counts.get(k.as_str()).copied().unwrap_or(0),
            })
            .collect()
    });

    Ok(Payload::Document {
        document: DocumentSummary {
            mode: mode.to_string(),
            ticket: extract_ticket_metadata(records, type_key, number_key),
            pages: records.iter().map(|r| r.page).max().unwrap_or(0),
            record_count: records.len(),
            unique_key_count: keys.len(),
            keys,
            key_counts,
        },
    })
}

fn keys_payload(records: &[Record], selector: Option<&str>) -> Result<Payload, InspectError> {
    let keys = unique_in_order(&trimmed_keys(records));

    let Some(raw) = selector else {
        return Ok(Payload::Keys {
            selector: None,
            keys,
        });
    };

    match Selector::parse(raw)? {
        Selector::Regex(re, literal) => Ok(Payload::Keys {
            selector: Some(literal),
            keys: keys.into_iter().filter(|k| re.is_match(k)).collect(),
        }),
        Selector::Exact(key) => Ok(exact_key(records, key)),
    }
}

fn records_payload(records: &[Record], selector: Option<&str>) -> Result<Payload, InspectError> {
    let Some(raw) = selector else {
        return Ok(Payload::Records {
            selector: None,
            records: records.to_vec(),
        });
    };

    match Selector::parse(raw)? {
        Selector::Regex(re, literal) => Ok(Payload::Records {
            selector: Some(literal),
            records: records
                .iter()
                .filter(|r| re.is_match(&r.key) || re.is_match(&r.value))
                .cloned()
                .collect(),
        }),
        Selector::Exact(key) => Ok(exact_key(records, key)),
    }
}

fn exact_key(records: &[Record], key: String) -> Payload {
    let records = records.iter().filter(|r| r.key == key).cloned().collect();
    Payload::KeyRecords { key, records }
}

/// Non-blank keys, trimmed, in record order
fn trimmed_keys(records: &[Record]) -> Vec<String> {
    records
        .iter()
        .map(|r| r.key.trim())
        .filter(|k| !k.is_empty())
        .map(str::to_string)
        .collect()
}

fn unique_in_order(items: &[String]) -> Vec<String> {
    let mut seen: HashSet<&String> = HashSet::new();
    items
        .iter()
        .filter(|item| seen.insert(*item))
        .cloned()
        .collect()
}

/// Payload as pretty JSON
pub fn render_json(payload: &Payload) -> Result<String, InspectError> {
    Ok(serde_json::to_string_pretty(payload)?)
}

/// Payload as the human-readable text block
pub fn render_text(payload: &Payload) -> String {
    let mut out = String::new();
    match payload {
        Payload::Document { document } => {
            let unset = |v: &Option<String>| v.clone().unwrap_or_else(|| "(unset)".to_string());
            out.push_str("=== DOCUMENT ===\n");
            out.push_str(&format!(
                "Ticket Type   : {}\n",
                unset(&document.ticket.ticket_type)
            ));
            out.push_str(&format!(
                "Ticket Number : {}\n",
                unset(&document.ticket.ticket_number)
            ));
            out.push_str(&format!("Pages         : {}\n", document.pages));
            out.push_str(&format!("Records       : {}\n", document.record_count));
            out.push_str(&format!("Unique Keys   : {}\n\n", document.unique_key_count));
            match &document.key_counts {
                Some(counts) => {
                    for kc in counts {
                        out.push_str(&format!("- {} ({})\n", kc.key, kc.count));
                    }
                }
                None => {
                    for key in &document.keys {
                        out.push_str(&format!("- {}\n", key));
                    }
                }
            }
        }
        Payload::Keys { keys, .. } => {
            out.push_str("=== KEYS ===\n");
            for key in keys {
                out.push_str(key);
                out.push('\n');
            }
        }
        Payload::Records { records, .. } | Payload::KeyRecords { records, .. } => {
            out.push_str("=== RECORDS ===\n");
            for r in records {
                out.push_str(&format!("\n--- page {} | {} ---\n{}\n", r.page, r.key, r.value));
            }
        }
    }
    out
}
