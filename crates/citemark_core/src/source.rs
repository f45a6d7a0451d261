/*
SPDX-License-Identifier: MPL-2.0
SPDX-FileCopyrightText: © 2023-2026 Bruce D'Arcus
*/

//! Bibliographic hints pulled out of footnote definition text.

use crate::registry::CitationUpdate;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceDetails {
    pub url: Option<String>,
    pub title: Option<String>,
}

impl SourceDetails {
    /// Read a `[title](url)` link, or failing that the first bare URL.
    pub fn from_definition(text: &str) -> Self {
        if let Some((title, url)) = markdown_link(text) {
            return Self {
                url: Some(url.to_string()),
                title: (!title.trim().is_empty()).then(|| title.trim().to_string()),
            };
        }

        Self {
            url: bare_url(text).map(String::from),
            title: None,
        }
    }

    pub fn into_update(self, text: &str) -> CitationUpdate {
        CitationUpdate {
            source_text: Some(text.to_string()),
            source_url: self.url,
            source_title: self.title,
            source_author: None,
        }
    }
}

fn markdown_link(text: &str) -> Option<(&str, &str)> {
    let mut search_from = 0;
    while let Some(rel) = text[search_from..].find("](") {
        let close = search_from + rel;
        let open = text[..close].rfind('[');
        let url_start = close + 2;
        let url_end = text[url_start..].find(')').map(|i| url_start + i);

        if let (Some(open), Some(url_end)) = (open, url_end) {
            // Skip footnote markers such as `[^a1b2c3](...)`.
            let title = &text[open + 1..close];
            let url = text[url_start..url_end].trim();
            let url = url.split_whitespace().next().unwrap_or_default();
            if !title.starts_with('^') && is_url(url) {
                return Some((title, url));
            }
        }
        search_from = close + 2;
    }
    None
}

fn bare_url(text: &str) -> Option<&str> {
    let start = ["https://", "http://"]
        .iter()
        .filter_map(|scheme| text.find(scheme))
        .min()?;
    let rest = &text[start..];
    let end = rest
        .find(|c: char| c.is_whitespace() || c == '>' || c == '"')
        .unwrap_or(rest.len());
    let url = rest[..end].trim_end_matches(['.', ',', ';', ':', ')', '\'']);
    is_url(url).then_some(url)
}

fn is_url(candidate: &str) -> bool {
    ["https://", "http://"]
        .iter()
        .any(|scheme| candidate.len() > scheme.len() && candidate.starts_with(scheme))
}
