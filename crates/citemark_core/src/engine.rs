/*
SPDX-License-Identifier: MPL-2.0
SPDX-FileCopyrightText: © 2023-2026 Bruce D'Arcus
*/

//! Per-document orchestration of the citation pipeline.

use indexmap::IndexSet;
use serde::Serialize;
use tracing::{debug, info};

use crate::complete::{complete_footnotes, ensure_footnote_section};
use crate::config::EngineConfig;
use crate::convert::{convert_numeric, normalize_carets};
use crate::error::{EngineError, ProcessError};
use crate::markers::Markers;
use crate::protect::{CodeProtector, Placeholders};
use crate::registry::{CitationUpdate, Registry};
use crate::source::SourceDetails;
use crate::spacing::normalize_spacing;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessStats {
    pub citations_converted: usize,
    pub footnotes_added: usize,
    pub footnote_section_added: bool,
    pub numeric_found: usize,
    pub hex_found: usize,
    pub caret_normalized: usize,
    pub duplicate_definitions_removed: usize,
}

/// The result of running the pipeline over one document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessOutcome {
    pub document: String,
    #[serde(skip)]
    pub text: String,
    pub changed: bool,
    pub stats: ProcessStats,
}

/// The citation pipeline, configured once and reused across documents.
#[derive(Debug, Clone)]
pub struct CitationEngine {
    config: EngineConfig,
    markers: Markers,
    protector: CodeProtector,
}

impl CitationEngine {
    pub fn new(config: EngineConfig) -> Result<Self, EngineError> {
        config.validate()?;
        let markers = Markers::new(config.hex_length)?;
        let protector = CodeProtector::new(config.protect_indented_code);
        Ok(Self {
            config,
            markers,
            protector,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Run every phase over `text`, mutating `registry` in memory only.
    ///
    /// `document` is the stable identifier recorded in each citation's file
    /// list.
    pub fn process(
        &self,
        registry: &mut Registry,
        text: &str,
        document: &str,
    ) -> Result<ProcessOutcome, EngineError> {
        let missing = self.config.missing_citation_text.as_str();

        let (protected, placeholders) = self.protector.extract(text);
        debug!(document, spans = placeholders.len(), "protected code spans");

        let (normalized, caret_normalized) = normalize_carets(&self.markers, &protected);
        let conversion = convert_numeric(&self.markers, registry, &normalized, &placeholders, missing)?;
        let (completed, footnotes_added) =
            complete_footnotes(&self.markers, registry, &conversion.text, missing);
        let (sectioned, footnote_section_added) = ensure_footnote_section(
            &self.markers,
            &completed,
            &self.config.footnotes_section_header,
            &self.config.footnotes_section_separator,
        );
        let spaced = normalize_spacing(&self.markers, &sectioned);

        // Ids come from the masked text so samples that show citations are
        // not recorded; definition text is recorded with its code restored.
        self.record_citations(registry, &spaced, &placeholders, document);

        let output = placeholders.restore(&spaced);
        let changed = output != text;
        let stats = ProcessStats {
            citations_converted: conversion.citations_converted,
            footnotes_added,
            footnote_section_added,
            numeric_found: conversion.numeric_found,
            hex_found: conversion.hex_found,
            caret_normalized,
            duplicate_definitions_removed: conversion.duplicate_definitions_removed,
        };

        if changed {
            info!(
                document,
                converted = stats.citations_converted,
                added = stats.footnotes_added,
                section = stats.footnote_section_added,
                "citations updated"
            );
        } else {
            debug!(document, "citations already normalized");
        }

        Ok(ProcessOutcome {
            document: document.to_string(),
            text: output,
            changed,
            stats,
        })
    }

    /// Load the registry, process `text`, and save the registry.
    pub fn process_document(
        &self,
        text: &str,
        document: &str,
    ) -> Result<ProcessOutcome, ProcessError> {
        let mut registry = Registry::load(&self.config.registry_path);
        let outcome = self.process(&mut registry, text, document)?;

        match registry.save() {
            Ok(()) => Ok(outcome),
            Err(source) => Err(ProcessError::RegistrySave {
                outcome: Box::new(outcome),
                registry: Box::new(registry),
                source,
            }),
        }
    }

    fn record_citations(
        &self,
        registry: &mut Registry,
        text: &str,
        placeholders: &Placeholders,
        document: &str,
    ) {
        let definitions = self.markers.hex_definitions(text);
        let ids: IndexSet<String> = self
            .markers
            .hex(text)
            .into_iter()
            .map(|o| o.label)
            .collect();

        for hex_id in &ids {
            let definition = definitions
                .get(hex_id)
                .and_then(Option::as_deref)
                .map(|t| placeholders.restore_fragment(t))
                .filter(|t| *t != self.config.missing_citation_text);
            let update = match definition.as_deref() {
                Some(t) => SourceDetails::from_definition(t).into_update(t),
                None => CitationUpdate::default(),
            };
            registry.upsert(hex_id, update);
            registry.record_file_reference(hex_id, document);
        }
        debug!(document, citations = ids.len(), "recorded citations in registry");
    }
}

/// Process one document against the registry named in `config`.
///
/// Loads the registry, runs the pipeline, and saves the registry before
/// returning. See [`ProcessError::RegistrySave`] for the partial-failure case.
pub fn process_citations(
    text: &str,
    document: &str,
    config: &EngineConfig,
) -> Result<ProcessOutcome, ProcessError> {
    CitationEngine::new(config.clone())?.process_document(text, document)
}
