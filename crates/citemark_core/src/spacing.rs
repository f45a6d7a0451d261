/*
SPDX-License-Identifier: MPL-2.0
SPDX-FileCopyrightText: © 2023-2026 Bruce D'Arcus
*/

//! Spacing around inline citation markers.

use crate::markers::{Markers, Occurrence};

const SPACES: [char; 2] = [' ', '\t'];

/// Characters a marker may touch without a space in between.
const CLOSING_PUNCTUATION: &[char] = &[
    '.', ',', ';', ':', '!', '?', ')', ']', '}', '"', '\'', '\u{2019}', '\u{201D}', '\u{00BB}',
    '\u{2026}',
];

/// Give every hex marker on a prose line one space on each side.
///
/// Footnote definition lines are left alone. A marker at the start of a line
/// keeps the line's indentation, and a marker followed by punctuation or the
/// end of the line gets no trailing space.
pub fn normalize_spacing(markers: &Markers, text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 16);

    for line in text.split_inclusive('\n') {
        let (content, ending) = split_line_ending(line);
        if markers.is_definition_line(content) {
            out.push_str(line);
            continue;
        }
        let occurrences = markers.hex(content);
        if occurrences.is_empty() {
            out.push_str(line);
            continue;
        }
        out.push_str(&normalize_line(content, &occurrences));
        out.push_str(ending);
    }

    out
}

fn split_line_ending(line: &str) -> (&str, &str) {
    let content = line
        .strip_suffix("\r\n")
        .or_else(|| line.strip_suffix('\n'))
        .unwrap_or(line);
    (content, &line[content.len()..])
}

fn normalize_line(line: &str, occurrences: &[Occurrence]) -> String {
    let mut out = String::with_capacity(line.len() + occurrences.len() * 2);
    let mut cursor = 0;

    for (i, occurrence) in occurrences.iter().enumerate() {
        push_segment(&mut out, &line[cursor..occurrence.start], i > 0, true);
        out.push_str(&line[occurrence.start..occurrence.end]);
        cursor = occurrence.end;
    }
    push_segment(&mut out, &line[cursor..], true, false);

    out
}

/// Emit the text between two boundaries, each either a marker or a line edge.
fn push_segment(out: &mut String, segment: &str, after_marker: bool, before_marker: bool) {
    let blank = segment.trim_matches(SPACES).is_empty();

    match (after_marker, before_marker) {
        (true, true) if blank => out.push(' '),
        (true, true) => {
            push_after_marker(out, segment.trim_end_matches(SPACES));
            out.push(' ');
        }
        (false, true) if blank => out.push_str(segment),
        (false, true) => {
            out.push_str(segment.trim_end_matches(SPACES));
            out.push(' ');
        }
        (true, false) if blank => out.push_str(segment),
        (true, false) => push_after_marker(out, segment),
        (false, false) => out.push_str(segment),
    }
}

fn push_after_marker(out: &mut String, segment: &str) {
    let rest = segment.trim_start_matches(SPACES);
    if rest.len() == segment.len() && rest.starts_with(CLOSING_PUNCTUATION) {
        out.push_str(rest);
    } else {
        out.push(' ');
        out.push_str(rest);
    }
}
