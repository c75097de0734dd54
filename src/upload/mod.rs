//! Connections export parsing and cache merge rules

use std::collections::HashMap;

use csv::ReaderBuilder;
use tracing::info;

use crate::errors::ConnRagError;
use crate::models::ContactRecord;
use crate::models::PROFILE_URL_PREFIX;
use crate::Result;

/// Preamble lines before the header row in the export format.
const PREAMBLE_LINES: usize = 3;

const REQUIRED_COLUMNS: [&str; 5] = ["First Name", "Last Name", "URL", "Company", "Position"];

/// Parse a connections CSV export into unenriched contact records.
///
/// The export carries a fixed-size notes preamble before the header row,
/// which is skipped unconditionally. Rows without both names or without a
/// well-formed profile URL are dropped silently; a missing required column
/// is a validation error.
pub fn parse_connections_csv(content: &str) -> Result<Vec<ContactRecord>> {
    let body = skip_preamble(content, PREAMBLE_LINES);

    let mut reader = ReaderBuilder::new()
        .flexible(true)
        .from_reader(body.as_bytes());

    let headers = reader
        .headers()
        .map_err(|e| ConnRagError::Validation(format!("Unreadable CSV header: {e}")))?
        .clone();

    let missing: Vec<&str> = REQUIRED_COLUMNS
        .iter()
        .filter(|col| !headers.iter().any(|h| h == **col))
        .copied()
        .collect();
    if !missing.is_empty() {
        return Err(ConnRagError::Validation(format!(
            "Missing required columns: {missing:?}"
        )));
    }

    let column = |name: &str| headers.iter().position(|h| h == name);
    let first_name_idx = column("First Name");
    let last_name_idx = column("Last Name");
    let url_idx = column("URL");
    let email_idx = column("Email Address");
    let company_idx = column("Company");
    let position_idx = column("Position");
    let connected_on_idx = column("Connected On");

    let mut connections = Vec::new();
    for record in reader.records() {
        let record = record?;
        let field = |idx: Option<usize>| {
            idx.and_then(|i| record.get(i)).unwrap_or("").trim().to_string()
        };

        let contact = ContactRecord::basic(
            field(first_name_idx),
            field(last_name_idx),
            field(url_idx),
            field(email_idx),
            field(company_idx),
            field(position_idx),
            field(connected_on_idx),
        );

        if !contact.first_name.is_empty()
            && !contact.last_name.is_empty()
            && contact.url.starts_with(PROFILE_URL_PREFIX)
        {
            connections.push(contact);
        }
    }

    info!("Parsed {} connections from upload", connections.len());
    Ok(connections)
}

fn skip_preamble(content: &str, lines: usize) -> &str {
    let mut rest = content;
    for _ in 0..lines {
        match rest.split_once('\n') {
            Some((_, tail)) => rest = tail,
            None => return "",
        }
    }
    rest
}

/// Merge freshly uploaded basic records into the URL-keyed cache.
///
/// Known contacts get their names, email and connection date refreshed;
/// company and position only overwrite when the new value is non-empty.
/// Enrichment fields and the enriched flag are never touched. Unknown
/// contacts enter the cache unenriched.
pub fn merge_basic(cache: &mut HashMap<String, ContactRecord>, connections: &[ContactRecord]) {
    for connection in connections {
        match cache.get_mut(&connection.url) {
            Some(cached) => {
                cached.first_name = connection.first_name.clone();
                cached.last_name = connection.last_name.clone();
                cached.email = connection.email.clone();
                cached.connected_on = connection.connected_on.clone();
                if !connection.company.is_empty() {
                    cached.company = connection.company.clone();
                }
                if !connection.position.is_empty() {
                    cached.position = connection.position.clone();
                }
            }
            None => {
                cache.insert(connection.url.clone(), connection.clone());
            }
        }
    }
}

/// Connections from an upload that still need an enrichment pass: absent
/// from the cache, or present but never enriched.
#[must_use]
pub fn identify_unenriched(
    cache: &HashMap<String, ContactRecord>,
    connections: &[ContactRecord],
) -> Vec<ContactRecord> {
    connections
        .iter()
        .filter(|c| cache.get(&c.url).map_or(true, |cached| !cached.enriched))
        .cloned()
        .collect()
}
