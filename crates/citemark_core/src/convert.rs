/*
SPDX-License-Identifier: MPL-2.0
SPDX-FileCopyrightText: © 2023-2026 Bruce D'Arcus
*/

//! Numeric to hex citation conversion.
//!
//! Runs over code-protected text in five phases: discovery, consolidation by
//! numeric label, definition text extraction, identifier resolution against
//! the registry, and label-by-label replacement.

use std::collections::HashSet;

use indexmap::IndexMap;
use tracing::debug;
use uuid::Uuid;

use crate::error::EngineError;
use crate::markers::{definition_text, rewrite, Markers, Occurrence};
use crate::protect::Placeholders;
use crate::registry::{CitationUpdate, Registry};
use crate::source::SourceDetails;

/// Upper bound on random draws before giving up on a free identifier.
pub const MAX_MINT_ATTEMPTS: usize = 10_000;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Conversion {
    pub text: String,
    pub numeric_found: usize,
    pub hex_found: usize,
    pub citations_converted: usize,
    pub duplicate_definitions_removed: usize,
    /// Numeric label to the hex id it was rewritten to.
    pub labels: IndexMap<String, String>,
}

/// Rewrite caret-less `[N]` markers to `[^N]`.
pub fn normalize_carets(markers: &Markers, text: &str) -> (String, usize) {
    let found = markers.bare_numeric(text);
    if found.is_empty() {
        return (text.to_string(), 0);
    }
    let normalized = rewrite(text, &found, |o| format!("[^{}]", o.label));
    (normalized, found.len())
}

struct LabelGroup {
    occurrences: Vec<Occurrence>,
    text: Option<String>,
}

/// Convert every numeric citation in `text` to a hex citation.
///
/// `text` is code-protected; definition text is read with `placeholders`
/// restored so the registry sees the real code. `missing_text` is the
/// placeholder definition text and never counts as a real source for
/// deduplication.
pub fn convert_numeric(
    markers: &Markers,
    registry: &mut Registry,
    text: &str,
    placeholders: &Placeholders,
    missing_text: &str,
) -> Result<Conversion, EngineError> {
    // Discovery. An all-digit label that is already a registered id is hex.
    let numeric: Vec<Occurrence> = markers
        .numeric(text)
        .into_iter()
        .filter(|o| !(markers.is_hex_id(&o.label) && registry.contains(&o.label)))
        .collect();
    let existing_hex = markers.hex(text);
    let mut taken: HashSet<String> = existing_hex.iter().map(|o| o.label.clone()).collect();

    let mut conversion = Conversion {
        numeric_found: numeric.len(),
        hex_found: existing_hex.len(),
        ..Default::default()
    };
    debug!(
        numeric = conversion.numeric_found,
        hex = conversion.hex_found,
        "discovered citations"
    );

    // Consolidation.
    let mut groups: IndexMap<String, LabelGroup> = IndexMap::new();
    for occurrence in numeric {
        groups
            .entry(occurrence.label.clone())
            .or_insert_with(|| LabelGroup {
                occurrences: Vec::new(),
                text: None,
            })
            .occurrences
            .push(occurrence);
    }

    // Text extraction.
    for group in groups.values_mut() {
        group.text = group
            .occurrences
            .iter()
            .filter(|o| o.definition)
            .find_map(|o| definition_text(text, o))
            .map(|t| placeholders.restore_fragment(&t))
            .filter(|t| t != missing_text);
    }

    // Identifier resolution.
    for (label, group) in &groups {
        let reused = group
            .text
            .as_deref()
            .and_then(|t| registry.find_by_text(t))
            .map(|record| record.hex_id.clone());

        let hex_id = match reused {
            Some(hex_id) => {
                debug!(label = %label, hex_id = %hex_id, "reusing registered citation");
                hex_id
            }
            None => {
                let hex_id = mint_id(markers.hex_length(), |candidate| {
                    registry.contains(candidate) || taken.contains(candidate)
                })?;
                let update = match &group.text {
                    Some(t) => SourceDetails::from_definition(t).into_update(t),
                    None => CitationUpdate::default(),
                };
                registry.upsert(&hex_id, update);
                debug!(label = %label, hex_id = %hex_id, "minted citation id");
                hex_id
            }
        };
        taken.insert(hex_id.clone());
        conversion.labels.insert(label.clone(), hex_id);
    }

    // Replacement, one label at a time.
    let mut current = text.to_string();
    for (label, hex_id) in &conversion.labels {
        let targets: Vec<Occurrence> = markers
            .numeric(&current)
            .into_iter()
            .filter(|o| &o.label == label)
            .collect();
        if targets.is_empty() {
            continue;
        }
        current = rewrite(&current, &targets, |_| format!("[^{}]", hex_id));
        conversion.citations_converted += 1;
    }

    let converted: HashSet<&str> = conversion.labels.values().map(String::as_str).collect();
    let (deduplicated, removed) = drop_duplicate_definitions(markers, &current, placeholders, &converted);
    conversion.text = deduplicated;
    conversion.duplicate_definitions_removed = removed;

    Ok(conversion)
}

/// Remove repeated, identical definition lines for the given ids. Two
/// numeric labels with the same source text end up sharing one id.
fn drop_duplicate_definitions(
    markers: &Markers,
    text: &str,
    placeholders: &Placeholders,
    ids: &HashSet<&str>,
) -> (String, usize) {
    let mut seen: HashSet<String> = HashSet::new();
    let mut out = String::with_capacity(text.len());
    let mut removed = 0;

    for line in text.split_inclusive('\n') {
        let content = line.trim_end_matches(['\n', '\r']);
        let is_target = markers
            .hex(content)
            .first()
            .is_some_and(|o| o.definition && ids.contains(o.label.as_str()));
        if is_target && !seen.insert(placeholders.restore_fragment(content.trim_end())) {
            removed += 1;
            continue;
        }
        out.push_str(line);
    }

    if removed > 0 {
        debug!(removed, "dropped duplicate footnote definitions");
    }
    (out, removed)
}

/// Draw random ids until one is free. Ids are lowercase hex with at least one
/// letter, so they can never be mistaken for a numeric label later.
pub fn mint_id<F>(length: usize, is_taken: F) -> Result<String, EngineError>
where
    F: Fn(&str) -> bool,
{
    for _ in 0..MAX_MINT_ATTEMPTS {
        let mut candidate = String::with_capacity(length);
        while candidate.len() < length {
            candidate.push_str(&Uuid::new_v4().simple().to_string());
        }
        candidate.truncate(length);

        if candidate.bytes().any(|b| b.is_ascii_alphabetic()) && !is_taken(&candidate) {
            return Ok(candidate);
        }
    }

    Err(EngineError::IdSpaceExhausted {
        length,
        attempts: MAX_MINT_ATTEMPTS,
    })
}
