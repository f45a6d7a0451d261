/*
SPDX-License-Identifier: MPL-2.0
SPDX-FileCopyrightText: © 2023-2026 Bruce D'Arcus
*/

//! Footnote completion: every hex reference gets a definition, and documents
//! with definitions get a footnotes section.

use std::collections::HashSet;

use indexmap::IndexSet;
use tracing::debug;

use crate::markers::Markers;
use crate::registry::Registry;

/// Append a definition for each hex reference that has none.
///
/// The registry's source text is used when known, `missing_text` otherwise.
/// Returns the new text and the number of definitions added.
pub fn complete_footnotes(
    markers: &Markers,
    registry: &Registry,
    text: &str,
    missing_text: &str,
) -> (String, usize) {
    let occurrences = markers.hex(text);
    let defined: HashSet<&str> = occurrences
        .iter()
        .filter(|o| o.definition)
        .map(|o| o.label.as_str())
        .collect();
    let missing: IndexSet<&str> = occurrences
        .iter()
        .filter(|o| !o.definition && !defined.contains(o.label.as_str()))
        .map(|o| o.label.as_str())
        .collect();

    if missing.is_empty() {
        return (text.to_string(), 0);
    }

    let body = text.trim_end_matches(['\n', '\r']);
    let mut out = String::with_capacity(text.len() + missing.len() * 40);
    out.push_str(body);
    if !body.is_empty() {
        let last_line = body.rsplit('\n').next().unwrap_or_default();
        out.push_str(if markers.is_definition_line(last_line) {
            "\n"
        } else {
            "\n\n"
        });
    }

    for hex_id in &missing {
        let source = registry
            .get(hex_id)
            .and_then(|r| r.source_text.as_deref())
            .filter(|t| !t.trim().is_empty())
            .unwrap_or(missing_text);
        out.push_str(&format!("[^{}]: {}\n", hex_id, source));
    }

    debug!(added = missing.len(), "synthesized footnote definitions");
    (out, missing.len())
}

/// Insert `separator` and `header` before the first footnote definition when
/// the document cites something, defines something, and has no header yet.
pub fn ensure_footnote_section(
    markers: &Markers,
    text: &str,
    header: &str,
    separator: &str,
) -> (String, bool) {
    if markers.hex(text).is_empty() {
        return (text.to_string(), false);
    }
    if text.lines().any(|line| line.trim() == header.trim()) {
        return (text.to_string(), false);
    }

    let mut offset = 0;
    let mut first_definition = None;
    for line in text.split_inclusive('\n') {
        if markers.is_definition_line(line) {
            first_definition = Some(offset);
            break;
        }
        offset += line.len();
    }
    let Some(position) = first_definition else {
        return (text.to_string(), false);
    };

    let before = &text[..position];
    let after = &text[position..];
    let separator = separator.trim();
    let has_separator = !separator.is_empty()
        && before
            .lines()
            .rev()
            .find(|line| !line.trim().is_empty())
            .is_some_and(|line| line.trim() == separator);

    let mut out = String::with_capacity(text.len() + header.len() + separator.len() + 6);
    out.push_str(before);
    if !before.is_empty() && !before.ends_with("\n\n") {
        out.push('\n');
    }
    if !separator.is_empty() && !has_separator {
        out.push_str(separator);
        out.push_str("\n\n");
    }
    out.push_str(header.trim());
    out.push_str("\n\n");
    out.push_str(after);

    debug!(position, "inserted footnotes section");
    (out, true)
}
