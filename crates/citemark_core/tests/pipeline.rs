/*
SPDX-License-Identifier: MPL-2.0
SPDX-FileCopyrightText: © 2023-2026 Bruce D'Arcus
*/

mod common;
use common::*;

use citemark_core::{CitationEngine, CitationUpdate, EngineConfig, Registry};

// --- Conversion ---

#[test]
fn test_converts_numeric_citations() {
    let mut registry = Registry::in_memory();
    let text = "See [^1] and [^2].\n\n[^1]: First source.\n[^2]: Second source.";
    let outcome = engine().process(&mut registry, text, "doc.md").unwrap();

    assert!(outcome.changed);
    assert_eq!(outcome.stats.citations_converted, 2);

    let ids = hex_ids(&outcome.text);
    assert_eq!(ids.len(), 2);
    assert_ne!(ids[0], ids[1]);
    assert!(outcome.text.starts_with(&format!("See [^{}] and [^{}].", ids[0], ids[1])));
    assert!(outcome.text.contains(&format!("[^{}]: First source.", ids[0])));
    assert!(outcome.text.contains(&format!("[^{}]: Second source.", ids[1])));
    assert!(!outcome.text.contains("[^1]"));
    assert!(!outcome.text.contains("[^2]"));
}

#[test]
fn test_full_output_shape() {
    let mut registry = Registry::in_memory();
    let text = "Intro.[^1] More[^2]text.\n\n[^1]: One.\n[^2]: Two.\n";
    let outcome = engine().process(&mut registry, text, "doc.md").unwrap();
    let ids = hex_ids(&outcome.text);

    assert_eq!(
        outcome.text,
        format!(
            "Intro. [^{a}] More [^{b}] text.\n\n***\n\n# Footnotes\n\n[^{a}]: One.\n[^{b}]: Two.\n",
            a = ids[0],
            b = ids[1]
        )
    );
}

// --- Idempotence ---

#[test]
fn test_second_run_is_noop() {
    let engine = engine();
    let mut registry = Registry::in_memory();
    let text = "Alpha[^1], beta [2] and `[^3]` code.\n\n```\n[^4]\n```\n\n[^1]: A.\n[2]: B.\n";
    let (first, first_changed, second, second_changed) = run_twice(&engine, &mut registry, text);

    assert!(first_changed);
    assert!(!second_changed);
    assert_eq!(first, second);
}

#[test]
fn test_already_normalized_document_is_unchanged() {
    let mut registry = Registry::in_memory();
    let text = "Claim [^a1b2c3].\n\n***\n\n# Footnotes\n\n[^a1b2c3]: Source.\n";
    let outcome = engine().process(&mut registry, text, "doc.md").unwrap();
    assert!(!outcome.changed);
    assert_eq!(outcome.text, text);
    assert_eq!(registry.get("a1b2c3").unwrap().source_text.as_deref(), Some("Source."));
}

// --- Dedup ---

#[test]
fn test_same_source_in_two_documents_shares_id() {
    let engine = engine();
    let mut registry = Registry::in_memory();

    let a = engine
        .process(&mut registry, "A cites [^1].\n\n[^1]: Shared source.\n", "a.md")
        .unwrap();
    let b = engine
        .process(&mut registry, "B cites [^5].\n\n[^5]: Shared source.\n", "b.md")
        .unwrap();

    let id_a = hex_ids(&a.text);
    let id_b = hex_ids(&b.text);
    assert_eq!(id_a, id_b);

    let files: Vec<&String> = registry.files_for(&id_a[0]).unwrap().iter().collect();
    assert_eq!(files, vec!["a.md", "b.md"]);
    assert_eq!(registry.len(), 1);
}

#[test]
fn test_different_text_gets_new_id() {
    let engine = engine();
    let mut registry = Registry::in_memory();
    let a = engine
        .process(&mut registry, "[^1]\n\n[^1]: Source.\n", "a.md")
        .unwrap();
    let b = engine
        .process(&mut registry, "[^1]\n\n[^1]: Source. \u{00A0}x\n", "b.md")
        .unwrap();
    assert_ne!(hex_ids(&a.text), hex_ids(&b.text));
}

// --- Code safety ---

#[test]
fn test_citation_inside_fence_untouched() {
    let mut registry = Registry::in_memory();
    let text = "```markdown\nSee [^1].\n\n[^1]: Example.\n```\n";
    let outcome = engine().process(&mut registry, text, "doc.md").unwrap();

    assert!(!outcome.changed);
    assert_eq!(outcome.text, text);
    assert_eq!(outcome.stats.citations_converted, 0);
    assert!(registry.is_empty());
}

#[test]
fn test_inline_and_fenced_code_restored_verbatim() {
    let mut registry = Registry::in_memory();
    let text = "Use `[^1]` or `[2]` then cite [^1].\n\n```\nfoo[^a1b2c3]bar\n```\n\n[^1]: Real.\n";
    let outcome = engine().process(&mut registry, text, "doc.md").unwrap();

    assert!(outcome.text.starts_with("Use `[^1]` or `[2]` then cite [^"));
    assert!(outcome.text.contains("```\nfoo[^a1b2c3]bar\n```"));
    assert!(registry.get("a1b2c3").is_none());
    assert_eq!(registry.len(), 1);
}

// --- Completion ---

#[test]
fn test_synthesizes_missing_definition() {
    let mut registry = Registry::in_memory();
    let outcome = engine()
        .process(&mut registry, "See [^a1b2c3].", "doc.md")
        .unwrap();

    assert!(outcome.text.contains("[^a1b2c3]: Citation text needed."));
    assert_eq!(outcome.stats.footnotes_added, 1);
    assert!(registry.get("a1b2c3").unwrap().files.contains("doc.md"));
}

#[test]
fn test_definition_with_inline_code_recorded_verbatim() {
    let mut registry = Registry::in_memory();
    let outcome = engine()
        .process(&mut registry, "A [^1]\n\n[^1]: See `foo` docs.\n", "a.md")
        .unwrap();

    let record = registry.find_by_text("See `foo` docs.").unwrap();
    assert_eq!(hex_ids(&outcome.text), vec![record.hex_id.clone()]);
    assert!(!outcome.text.contains('\u{E000}'));
}

#[test]
fn test_inline_code_definitions_dedup_across_documents() {
    let engine = engine();
    let mut registry = Registry::in_memory();

    let a = engine
        .process(&mut registry, "A [^1]\n\n[^1]: Uses `foo`.\n", "a.md")
        .unwrap();
    let b = engine
        .process(
            &mut registry,
            "Some `bar` first. B [^4]\n\n[^4]: Uses `foo`.\n",
            "b.md",
        )
        .unwrap();

    assert_eq!(hex_ids(&a.text), hex_ids(&b.text));
    assert_eq!(registry.len(), 1);
}

#[test]
fn test_completion_from_registry_keeps_code() {
    let engine = engine();
    let mut registry = Registry::in_memory();
    let a = engine
        .process(&mut registry, "A [^1]\n\n[^1]: Uses `foo`.\n", "a.md")
        .unwrap();
    let id = hex_ids(&a.text).remove(0);

    let c = engine
        .process(&mut registry, &format!("C [^{id}].\n"), "c.md")
        .unwrap();
    assert!(c.text.contains(&format!("[^{id}]: Uses `foo`.")));
    assert!(!c.text.contains('\u{E000}'));
}

#[test]
fn test_completion_uses_registry_text() {
    let mut registry = Registry::in_memory();
    registry.upsert("a1b2c3", CitationUpdate::with_text("Recorded elsewhere."));
    let outcome = engine()
        .process(&mut registry, "See [^a1b2c3].", "doc.md")
        .unwrap();
    assert!(outcome.text.contains("[^a1b2c3]: Recorded elsewhere."));
}

#[test]
fn test_custom_missing_text() {
    let engine = CitationEngine::new(EngineConfig {
        missing_citation_text: "TODO: cite".to_string(),
        ..Default::default()
    })
    .unwrap();
    let mut registry = Registry::in_memory();
    let outcome = engine.process(&mut registry, "See [^a1b2c3].", "doc.md").unwrap();
    assert!(outcome.text.contains("[^a1b2c3]: TODO: cite"));
}

// --- Section insertion ---

#[test]
fn test_section_inserted_before_first_definition() {
    let mut registry = Registry::in_memory();
    let text = "Body [^a1b2c3].\n\nMore body.\n\n[^a1b2c3]: Source.\n\nAppendix paragraph.\n";
    let outcome = engine().process(&mut registry, text, "doc.md").unwrap();

    assert!(outcome.stats.footnote_section_added);
    assert_eq!(
        outcome.text,
        "Body [^a1b2c3].\n\nMore body.\n\n***\n\n# Footnotes\n\n[^a1b2c3]: Source.\n\nAppendix paragraph.\n"
    );
}

#[test]
fn test_no_citations_no_section() {
    let mut registry = Registry::in_memory();
    let text = "# Notes\n\nNothing cited here.\n";
    let outcome = engine().process(&mut registry, text, "doc.md").unwrap();
    assert!(!outcome.changed);
    assert!(!outcome.text.contains("# Footnotes"));
    assert!(!outcome.stats.footnote_section_added);
}

#[test]
fn test_custom_header_and_separator() {
    let engine = CitationEngine::new(EngineConfig {
        footnotes_section_header: "## References".to_string(),
        footnotes_section_separator: "---".to_string(),
        ..Default::default()
    })
    .unwrap();
    let mut registry = Registry::in_memory();
    let outcome = engine
        .process(&mut registry, "X [^a1b2c3]\n\n[^a1b2c3]: Y\n", "doc.md")
        .unwrap();
    assert_eq!(
        outcome.text,
        "X [^a1b2c3]\n\n---\n\n## References\n\n[^a1b2c3]: Y\n"
    );
}

// --- Spacing ---

#[test]
fn test_spacing_around_marker() {
    let mut registry = Registry::in_memory();
    let outcome = engine()
        .process(
            &mut registry,
            "word[^a1b2c3]word\n\n# Footnotes\n\n[^a1b2c3]: text\n",
            "doc.md",
        )
        .unwrap();
    assert!(outcome.text.starts_with("word [^a1b2c3] word\n"));
    assert!(outcome.text.ends_with("[^a1b2c3]: text\n"));
}

// --- Links ---

#[test]
fn test_markdown_links_are_not_citations() {
    let mut registry = Registry::in_memory();
    let text = "See [1](https://example.org) and [the site][2].\n\n[2]: https://example.org/two\n";
    let outcome = engine().process(&mut registry, text, "doc.md").unwrap();
    assert!(!outcome.changed);
    assert!(registry.is_empty());
}

// --- Identifier length ---

#[test]
fn test_configured_hex_length() {
    let engine = CitationEngine::new(EngineConfig {
        hex_length: 8,
        ..Default::default()
    })
    .unwrap();
    let mut registry = Registry::in_memory();
    let outcome = engine
        .process(&mut registry, "A [^1]\n\n[^1]: Eight.\n", "doc.md")
        .unwrap();
    let record = registry.find_by_text("Eight.").unwrap();
    assert_eq!(record.hex_id.len(), 8);
    assert!(outcome.text.contains(&format!("[^{}]: Eight.", record.hex_id)));
}
