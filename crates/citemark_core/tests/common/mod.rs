/*
SPDX-License-Identifier: MPL-2.0
SPDX-FileCopyrightText: © 2023-2026 Bruce D'Arcus
*/

#![allow(dead_code)]

use std::path::Path;

use citemark_core::{CitationEngine, EngineConfig, Registry};
use regex::Regex;

// --- Helper Functions for Test Setup ---

/// Engine with default settings and an in-memory registry.
pub fn engine() -> CitationEngine {
    CitationEngine::new(EngineConfig::default()).unwrap()
}

/// Engine whose registry lives in `dir`.
pub fn engine_in(dir: &Path) -> CitationEngine {
    CitationEngine::new(config_in(dir)).unwrap()
}

pub fn config_in(dir: &Path) -> EngineConfig {
    EngineConfig {
        registry_path: dir.join("citations.json"),
        ..Default::default()
    }
}

/// Every distinct hex id cited in `text`, in order of appearance.
pub fn hex_ids(text: &str) -> Vec<String> {
    let pattern = Regex::new(r"\[\^([0-9a-f]{6})\]").unwrap();
    let mut ids: Vec<String> = Vec::new();
    for cap in pattern.captures_iter(text) {
        let id = cap[1].to_string();
        if !ids.contains(&id) {
            ids.push(id);
        }
    }
    ids
}

/// Run the pipeline twice and return both outcomes' texts and change flags.
pub fn run_twice(
    engine: &CitationEngine,
    registry: &mut Registry,
    text: &str,
) -> (String, bool, String, bool) {
    let first = engine.process(registry, text, "doc.md").unwrap();
    let second = engine.process(registry, &first.text, "doc.md").unwrap();
    (first.text, first.changed, second.text, second.changed)
}
