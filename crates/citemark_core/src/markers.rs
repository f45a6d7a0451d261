/*
SPDX-License-Identifier: MPL-2.0
SPDX-FileCopyrightText: © 2023-2026 Bruce D'Arcus
*/

//! Citation marker patterns.
//!
//! The `regex` crate has no lookaround, so the Markdown link exclusions
//! (`[text](url)`, `[text][ref]`) are checked on the bytes around each match.

use std::collections::HashSet;

use indexmap::IndexMap;
use regex::Regex;

/// One citation marker found in a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Occurrence {
    pub start: usize,
    pub end: usize,
    pub label: String,
    /// The marker opens a `[^label]: text` definition line.
    pub definition: bool,
}

/// Compiled marker patterns for one identifier length.
#[derive(Debug, Clone)]
pub struct Markers {
    hex_length: usize,
    bare_numeric: Regex,
    numeric: Regex,
    hex: Regex,
    any_definition: Regex,
    link_label: Regex,
}

impl Markers {
    pub fn new(hex_length: usize) -> Result<Self, regex::Error> {
        Ok(Self {
            hex_length,
            bare_numeric: Regex::new(r"\[([0-9]+)\]")?,
            numeric: Regex::new(r"\[\^([0-9]+)\]")?,
            hex: Regex::new(&format!(r"\[\^([0-9a-f]{{{}}})\]", hex_length))?,
            any_definition: Regex::new(r"^\[\^[^\]\s]+\]:")?,
            link_label: Regex::new(r"\]\[([0-9]+)\]")?,
        })
    }

    pub fn hex_length(&self) -> usize {
        self.hex_length
    }

    pub fn is_hex_id(&self, candidate: &str) -> bool {
        candidate.len() == self.hex_length
            && candidate
                .bytes()
                .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
    }

    /// `[^N]` markers, references and definitions alike.
    pub fn numeric(&self, text: &str) -> Vec<Occurrence> {
        self.caret_markers(&self.numeric, text)
    }

    /// `[^hex]` markers of the configured length.
    pub fn hex(&self, text: &str) -> Vec<Occurrence> {
        self.caret_markers(&self.hex, text)
    }

    fn caret_markers(&self, pattern: &Regex, text: &str) -> Vec<Occurrence> {
        let bytes = text.as_bytes();
        pattern
            .captures_iter(text)
            .filter_map(|cap| {
                let whole = cap.get(0)?;
                let label = cap.get(1)?;
                let (start, end) = (whole.start(), whole.end());
                if escaped(bytes, start) {
                    return None;
                }
                match (bytes.get(end).copied(), bytes.get(end + 1).copied()) {
                    (Some(b'('), _) => return None,
                    (Some(b'['), next) if next != Some(b'^') => return None,
                    _ => {}
                }
                Some(Occurrence {
                    start,
                    end,
                    label: label.as_str().to_string(),
                    definition: at_line_start(bytes, start) && bytes.get(end) == Some(&b':'),
                })
            })
            .collect()
    }

    /// Caret-less `[N]` markers that are not Markdown links or link
    /// reference definitions.
    pub fn bare_numeric(&self, text: &str) -> Vec<Occurrence> {
        let bytes = text.as_bytes();
        let link_labels: HashSet<&str> = self
            .link_label
            .captures_iter(text)
            .filter_map(|cap| cap.get(1).map(|m| m.as_str()))
            .collect();

        self.bare_numeric
            .captures_iter(text)
            .filter_map(|cap| {
                let whole = cap.get(0)?;
                let label = cap.get(1)?.as_str();
                let (start, end) = (whole.start(), whole.end());
                if escaped(bytes, start) {
                    return None;
                }
                if start > 0 && matches!(bytes[start - 1], b']' | b'!') {
                    return None;
                }
                if matches!(bytes.get(end).copied(), Some(b'(') | Some(b'[')) {
                    return None;
                }
                let definition = at_line_start(bytes, start) && bytes.get(end) == Some(&b':');
                if definition && link_labels.contains(label) {
                    return None;
                }
                Some(Occurrence {
                    start,
                    end,
                    label: label.to_string(),
                    definition,
                })
            })
            .collect()
    }

    /// Whether `line` is a footnote definition for any label.
    pub fn is_definition_line(&self, line: &str) -> bool {
        self.any_definition.is_match(line)
    }

    /// Definition text per hex id, first definition wins. Ids whose
    /// definition line has no text map to `None`.
    pub fn hex_definitions(&self, text: &str) -> IndexMap<String, Option<String>> {
        let mut definitions = IndexMap::new();
        for occurrence in self.hex(text).into_iter().filter(|o| o.definition) {
            let body = definition_text(text, &occurrence);
            definitions.entry(occurrence.label).or_insert(body);
        }
        definitions
    }
}

/// The text after `[^label]:` on a definition line, trimmed.
pub fn definition_text(text: &str, occurrence: &Occurrence) -> Option<String> {
    let rest = text.get(occurrence.end + 1..)?;
    let line = rest.split('\n').next().unwrap_or_default().trim();
    (!line.is_empty()).then(|| line.to_string())
}

/// Rebuild `text` with each occurrence span replaced by `replacement(occurrence)`.
pub fn rewrite<F>(text: &str, occurrences: &[Occurrence], mut replacement: F) -> String
where
    F: FnMut(&Occurrence) -> String,
{
    let mut out = String::with_capacity(text.len() + occurrences.len() * 8);
    let mut last = 0;
    for occurrence in occurrences {
        out.push_str(&text[last..occurrence.start]);
        out.push_str(&replacement(occurrence));
        last = occurrence.end;
    }
    out.push_str(&text[last..]);
    out
}

fn at_line_start(bytes: &[u8], start: usize) -> bool {
    start == 0 || bytes[start - 1] == b'\n'
}

fn escaped(bytes: &[u8], start: usize) -> bool {
    start > 0 && bytes[start - 1] == b'\\'
}
