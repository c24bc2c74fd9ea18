//! Record building and ticket metadata

use crate::model::{Record, ResolvedField, TicketMetadata};

/// One record per resolved field, in classification order
///
/// Repeated labels are kept as separate records.
pub fn build_records(fields: &[ResolvedField]) -> Vec<Record> {
    fields
        .iter()
        .map(|f| Record {
            page: f.span.page,
            key: f.span.text.clone(),
            value: f.value.clone(),
        })
        .collect()
}

/// First-occurrence scan for the ticket type and number
///
/// Values are trimmed; an empty value leaves the field unset and the scan
/// keeps looking. Stops as soon as both fields are found.
pub fn extract_ticket_metadata(
    records: &[Record],
    type_key: &str,
    number_key: &str,
) -> TicketMetadata {
    let mut ticket = TicketMetadata::default();

    for record in records {
        let value = record.value.trim();
        if value.is_empty() {
            continue;
        }
        if ticket.ticket_type.is_none() && record.key == type_key {
            ticket.ticket_type = Some(value.to_string());
        } else if ticket.ticket_number.is_none() && record.key == number_key {
            ticket.ticket_number = Some(value.to_string());
        }

        if ticket.ticket_type.is_some() && ticket.ticket_number.is_some() {
            break;
        }
    }

    ticket
}
