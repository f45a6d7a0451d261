/*
SPDX-License-Identifier: MPL-2.0
SPDX-FileCopyrightText: © 2023-2026 Bruce D'Arcus
*/

//! Splitting YAML frontmatter from the Markdown body.
//!
//! Only the body is handed to the citation engine; the frontmatter is
//! reattached byte for byte.

/// A document split into its optional frontmatter block and its body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Document<'a> {
    /// The frontmatter including both `---` fences and the final newline.
    pub front_matter: Option<&'a str>,
    pub body: &'a str,
}

impl<'a> Document<'a> {
    pub fn parse(text: &'a str) -> Self {
        match front_matter_len(text) {
            Some(len) => Self {
                front_matter: Some(&text[..len]),
                body: &text[len..],
            },
            None => Self {
                front_matter: None,
                body: text,
            },
        }
    }

    /// Reassemble with a new body.
    pub fn with_body(&self, body: &str) -> String {
        match self.front_matter {
            Some(front) => format!("{}{}", front, body),
            None => body.to_string(),
        }
    }
}

/// Byte length of a leading frontmatter block whose content is a YAML
/// mapping (or empty). A document that merely opens with a `---` rule has none.
fn front_matter_len(text: &str) -> Option<usize> {
    let first = text.split_inclusive('\n').next()?;
    if first.trim_end() != "---" || !first.ends_with('\n') {
        return None;
    }

    let mut offset = first.len();
    for line in text[first.len()..].split_inclusive('\n') {
        let end = offset + line.len();
        let trimmed = line.trim_end();
        if trimmed == "---" || trimmed == "..." {
            let yaml = &text[first.len()..offset];
            return is_mapping(yaml).then_some(end);
        }
        offset = end;
    }
    None
}

fn is_mapping(yaml: &str) -> bool {
    if yaml.trim().is_empty() {
        return true;
    }
    matches!(
        serde_yaml::from_str::<serde_yaml::Value>(yaml),
        Ok(serde_yaml::Value::Mapping(_))
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_splits_front_matter() {
        let text = "---\ntitle: Notes\ntags: [1, 2]\n---\nBody [1].\n";
        let doc = Document::parse(text);
        assert_eq!(doc.front_matter, Some("---\ntitle: Notes\ntags: [1, 2]\n---\n"));
        assert_eq!(doc.body, "Body [1].\n");
        assert_eq!(doc.with_body(doc.body), text);
    }

    #[test]
    fn test_no_front_matter() {
        let text = "# Title\n\nBody.\n";
        let doc = Document::parse(text);
        assert_eq!(doc.front_matter, None);
        assert_eq!(doc.body, text);
    }

    #[test]
    fn test_leading_rule_is_not_front_matter() {
        let text = "---\nJust a paragraph between rules.\n---\nMore.\n";
        assert_eq!(Document::parse(text).front_matter, None);
    }

    #[test]
    fn test_unclosed_front_matter() {
        let text = "---\ntitle: x\nno closing fence\n";
        assert_eq!(Document::parse(text).front_matter, None);
    }

    #[test]
    fn test_empty_front_matter_and_crlf() {
        let doc = Document::parse("---\r\n---\r\nBody\r\n");
        assert_eq!(doc.front_matter, Some("---\r\n---\r\n"));
        assert_eq!(doc.body, "Body\r\n");
    }
}
