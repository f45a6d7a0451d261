/*
SPDX-License-Identifier: MPL-2.0
SPDX-FileCopyrightText: © 2023-2026 Bruce D'Arcus
*/

//! Citemark Core
//!
//! Normalizes footnote citations in Markdown documents to fixed-length hex
//! markers and keeps a registry of every citation seen across a corpus, so
//! the same source text resolves to the same identifier in every document.
//!
//! The pipeline for one document is: protect code spans, add carets to
//! `[N]` markers, convert `[^N]` to `[^hex]`, synthesize missing
//! definitions, insert a footnotes section, normalize spacing, restore code.
//!
//! # Example
//!
//! ```rust
//! use citemark_core::{CitationEngine, EngineConfig, Registry};
//!
//! let engine = CitationEngine::new(EngineConfig::default()).unwrap();
//! let mut registry = Registry::in_memory();
//!
//! let outcome = engine
//!     .process(&mut registry, "A claim.[^1]\n\n[^1]: Kuhn 1962.\n", "notes/a.md")
//!     .unwrap();
//!
//! let record = registry.find_by_text("Kuhn 1962.").unwrap();
//! assert!(outcome.changed);
//! assert!(outcome.text.contains(&format!("[^{}]: Kuhn 1962.", record.hex_id)));
//! assert!(record.files.contains("notes/a.md"));
//! ```

pub mod complete;
pub mod config;
pub mod convert;
pub mod engine;
pub mod error;
pub mod markers;
pub mod protect;
pub mod registry;
pub mod source;
pub mod spacing;

pub use config::{Config, EngineConfig};
pub use engine::{process_citations, CitationEngine, ProcessOutcome, ProcessStats};
pub use error::{ConfigError, EngineError, ProcessError, RegistryError};
pub use protect::{CodeProtector, Placeholders};
pub use registry::{CitationRecord, CitationUpdate, Registry};
