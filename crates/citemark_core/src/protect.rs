/*
SPDX-License-Identifier: MPL-2.0
SPDX-FileCopyrightText: © 2023-2026 Bruce D'Arcus
*/

//! Code-span protection.
//!
//! Code samples are cut out of the document and replaced with placeholder
//! tokens before any citation rewriting happens, then put back verbatim.
//! Extraction order is fenced blocks, indented blocks, inline spans; each
//! match is replaced at its exact byte offsets, so identical code blocks get
//! distinct placeholders.

use tracing::{debug, warn};

const SENTINEL_OPEN: char = '\u{E000}';
const SENTINEL_CLOSE: char = '\u{E001}';

/// One extracted code span.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placeholder {
    pub token: String,
    pub original: String,
}

/// Extraction records for one document, in extraction order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Placeholders {
    entries: Vec<Placeholder>,
}

impl Placeholders {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Placeholder> {
        self.entries.iter()
    }

    /// Put every original back, newest extraction first.
    ///
    /// Tokens absent from `text` are skipped; a collapsed duplicate
    /// definition can take its placeholder with it.
    pub fn restore(&self, text: &str) -> String {
        let mut restored = text.to_string();
        for entry in self.entries.iter().rev() {
            match restored.find(&entry.token) {
                Some(pos) => restored.replace_range(pos..pos + entry.token.len(), &entry.original),
                None => debug!(token = %entry.token.escape_default(), "code placeholder not in text"),
            }
        }
        restored
    }

    /// Restore the tokens present in `fragment`, a slice of the protected
    /// text such as one definition line.
    pub fn restore_fragment(&self, fragment: &str) -> String {
        if !fragment.contains(SENTINEL_OPEN) {
            return fragment.to_string();
        }
        let mut restored = fragment.to_string();
        for entry in self.entries.iter().rev() {
            if let Some(pos) = restored.find(&entry.token) {
                restored.replace_range(pos..pos + entry.token.len(), &entry.original);
            }
        }
        restored
    }
}

/// Cuts code out of Markdown text.
#[derive(Debug, Clone, Copy)]
pub struct CodeProtector {
    pub indented: bool,
}

impl Default for CodeProtector {
    fn default() -> Self {
        Self { indented: true }
    }
}

impl CodeProtector {
    pub fn new(indented: bool) -> Self {
        Self { indented }
    }

    pub fn extract(&self, text: &str) -> (String, Placeholders) {
        let mut ctx = Extraction::new(text);

        let spans = fenced_blocks(text);
        let mut protected = ctx.replace(text, &spans);

        if self.indented {
            let spans = indented_blocks(&protected);
            protected = ctx.replace(&protected, &spans);
        }

        let spans = inline_spans(&protected);
        protected = ctx.replace(&protected, &spans);

        (protected, ctx.placeholders)
    }
}

struct Extraction {
    prefix: String,
    placeholders: Placeholders,
}

impl Extraction {
    /// Pick a token prefix that does not occur anywhere in `text`.
    fn new(text: &str) -> Self {
        let mut opener = String::from(SENTINEL_OPEN);
        let prefix = loop {
            let candidate = format!("{}CODE", opener);
            if !text.contains(&candidate) {
                break candidate;
            }
            opener.push(SENTINEL_OPEN);
        };
        Self {
            prefix,
            placeholders: Placeholders::default(),
        }
    }

    /// Replace each `(start, end)` span of `text`; spans are sorted and disjoint.
    fn replace(&mut self, text: &str, spans: &[(usize, usize)]) -> String {
        let mut out = String::with_capacity(text.len());
        let mut last = 0;
        for &(start, end) in spans {
            out.push_str(&text[last..start]);
            let token = format!(
                "{}{}{}",
                self.prefix,
                self.placeholders.entries.len(),
                SENTINEL_CLOSE
            );
            out.push_str(&token);
            self.placeholders.entries.push(Placeholder {
                token,
                original: text[start..end].to_string(),
            });
            last = end;
        }
        out.push_str(&text[last..]);
        out
    }
}

/// `(start, content_end, full_end)` for each line; `content_end` excludes the newline.
fn lines_with_offsets(text: &str) -> Vec<(usize, usize, usize)> {
    let mut lines = Vec::new();
    let mut start = 0;
    for line in text.split_inclusive('\n') {
        let full_end = start + line.len();
        let content_end = if line.ends_with('\n') {
            full_end - 1
        } else {
            full_end
        };
        lines.push((start, content_end, full_end));
        start = full_end;
    }
    lines
}

/// Strip up to three leading spaces, as Markdown allows before a fence.
fn strip_fence_indent(line: &str) -> &str {
    let spaces = line.bytes().take(3).take_while(|&b| b == b' ').count();
    &line[spaces..]
}

fn fence_opening(line: &str) -> Option<(u8, usize)> {
    let rest = strip_fence_indent(line);
    let fence_char = *rest.as_bytes().first()?;
    if fence_char != b'`' && fence_char != b'~' {
        return None;
    }
    let len = rest.bytes().take_while(|&b| b == fence_char).count();
    if len < 3 {
        return None;
    }
    // A backtick fence's info string may not contain backticks.
    if fence_char == b'`' && rest[len..].contains('`') {
        return None;
    }
    Some((fence_char, len))
}

fn is_fence_closing(line: &str, fence_char: u8, open_len: usize) -> bool {
    let rest = strip_fence_indent(line);
    let len = rest.bytes().take_while(|&b| b == fence_char).count();
    len >= open_len && rest[len..].trim().is_empty()
}

fn fenced_blocks(text: &str) -> Vec<(usize, usize)> {
    let lines = lines_with_offsets(text);
    let mut spans = Vec::new();
    let mut i = 0;

    while i < lines.len() {
        let (start, content_end, _) = lines[i];
        let Some((fence_char, open_len)) = fence_opening(&text[start..content_end]) else {
            i += 1;
            continue;
        };

        let closing = (i + 1..lines.len()).find(|&j| {
            let (s, e, _) = lines[j];
            is_fence_closing(&text[s..e], fence_char, open_len)
        });

        match closing {
            Some(j) => {
                spans.push((start, lines[j].1));
                i = j + 1;
            }
            None => {
                warn!(offset = start, "unclosed code fence, protecting to end of document");
                let end = text.trim_end_matches('\n').len().max(content_end);
                spans.push((start, end));
                break;
            }
        }
    }

    spans
}

fn is_blank(line: &str) -> bool {
    line.trim().is_empty()
}

fn is_indented(line: &str) -> bool {
    !is_blank(line) && (line.starts_with("    ") || line.starts_with('\t'))
}

/// List items and footnote definitions own the indented lines that follow them.
fn opens_container(line: &str) -> bool {
    let trimmed = line.trim_start();
    if trimmed.starts_with("[^") && trimmed.contains("]:") {
        return true;
    }
    if ["- ", "* ", "+ "].iter().any(|marker| trimmed.starts_with(marker)) {
        return true;
    }
    let digits = trimmed.bytes().take_while(u8::is_ascii_digit).count();
    digits > 0
        && matches!(trimmed.as_bytes().get(digits).copied(), Some(b'.') | Some(b')'))
        && matches!(trimmed.as_bytes().get(digits + 1).copied(), Some(b' ') | None)
}

fn indented_blocks(text: &str) -> Vec<(usize, usize)> {
    let lines = lines_with_offsets(text);
    let content: Vec<&str> = lines.iter().map(|&(s, e, _)| &text[s..e]).collect();
    let mut spans = Vec::new();
    let mut in_container = false;
    let mut previous_blank = true;
    let mut i = 0;

    while i < lines.len() {
        let line = content[i];

        if is_blank(line) {
            previous_blank = true;
            i += 1;
            continue;
        }

        if is_indented(line) && previous_blank && !in_container {
            let mut last = i;
            let mut j = i + 1;
            while j < lines.len() {
                let next = content[j];
                if is_indented(next) {
                    last = j;
                } else if !is_blank(next) {
                    break;
                }
                j += 1;
            }
            spans.push((lines[i].0, lines[last].1));
            i = last + 1;
            previous_blank = false;
            continue;
        }

        if opens_container(line) {
            in_container = true;
        } else if !is_indented(line) {
            in_container = false;
        }
        previous_blank = false;
        i += 1;
    }

    spans
}

fn inline_spans(text: &str) -> Vec<(usize, usize)> {
    let bytes = text.as_bytes();
    let mut spans = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] != b'`' {
            i += 1;
            continue;
        }
        let run = bytes[i..].iter().take_while(|&&b| b == b'`').count();
        if i > 0 && bytes[i - 1] == b'\\' {
            i += run;
            continue;
        }

        match closing_run(bytes, i + run, run) {
            Some(end) => {
                spans.push((i, end));
                i = end;
            }
            None => i += run,
        }
    }

    spans
}

/// End offset of the first backtick run of exactly `run` length at or after
/// `from`, without crossing a blank line.
fn closing_run(bytes: &[u8], from: usize, run: usize) -> Option<usize> {
    let mut j = from;
    while j < bytes.len() {
        match bytes[j] {
            b'`' => {
                let len = bytes[j..].iter().take_while(|&&b| b == b'`').count();
                if len == run {
                    return Some(j + len);
                }
                j += len;
            }
            b'\n' => {
                let next_line = bytes[j + 1..].split(|&b| b == b'\n').next().unwrap_or(&[]);
                if next_line.iter().all(u8::is_ascii_whitespace) {
                    return None;
                }
                j += 1;
            }
            _ => j += 1,
        }
    }
    None
}
