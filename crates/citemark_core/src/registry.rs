/*
SPDX-License-Identifier: MPL-2.0
SPDX-FileCopyrightText: © 2023-2026 Bruce D'Arcus
*/

//! Persistent store of known citations, keyed by hex identifier.
//!
//! The registry is a JSON object mapping each identifier to its
//! [`CitationRecord`]. It is loaded once per document pass, mutated in memory
//! by the engine, and written back with [`Registry::save`].

use std::collections::HashMap;
use std::ffi::OsString;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::{debug, warn};

use crate::error::RegistryError;

/// One unique citation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CitationRecord {
    /// Filled from the map key on load when absent from the record itself.
    #[serde(default)]
    pub hex_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_author: Option<String>,
    pub date_created: DateTime<Utc>,
    pub date_updated: DateTime<Utc>,
    #[serde(default)]
    pub files: IndexSet<String>,
}

impl CitationRecord {
    fn new(hex_id: &str, now: DateTime<Utc>) -> Self {
        Self {
            hex_id: hex_id.to_string(),
            source_text: None,
            source_url: None,
            source_title: None,
            source_author: None,
            date_created: now,
            date_updated: now,
            files: IndexSet::new(),
        }
    }

    /// Shallow merge: every field present in `update` replaces the stored one.
    fn merge(&mut self, update: CitationUpdate) -> bool {
        let mut changed = false;
        for (slot, value) in [
            (&mut self.source_text, update.source_text),
            (&mut self.source_url, update.source_url),
            (&mut self.source_title, update.source_title),
            (&mut self.source_author, update.source_author),
        ] {
            if let Some(value) = value {
                if slot.as_deref() != Some(value.as_str()) {
                    *slot = Some(value);
                    changed = true;
                }
            }
        }
        changed
    }
}

/// Partial record fields for [`Registry::upsert`]. `None` leaves a field as is.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CitationUpdate {
    pub source_text: Option<String>,
    pub source_url: Option<String>,
    pub source_title: Option<String>,
    pub source_author: Option<String>,
}

impl CitationUpdate {
    pub fn with_text(text: impl Into<String>) -> Self {
        Self {
            source_text: Some(text.into()),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Registry {
    path: Option<PathBuf>,
    records: IndexMap<String, CitationRecord>,
    by_text: HashMap<String, String>,
}

impl Registry {
    /// An empty registry with no backing file.
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Load the registry stored at `path`.
    ///
    /// A missing or empty file yields an empty registry. A corrupt file
    /// (bad JSON or bad UTF-8) is logged, copied aside to `<path>.corrupt`,
    /// and also yields an empty registry, as does an unreadable one. This
    /// never fails.
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let records = match fs::read(&path) {
            Ok(content) if content.iter().all(u8::is_ascii_whitespace) => IndexMap::new(),
            Ok(content) => match Self::parse(&content) {
                Ok(records) => records,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "citation registry is corrupt, starting empty");
                    quarantine(&path);
                    IndexMap::new()
                }
            },
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %path.display(), "no citation registry yet, starting empty");
                IndexMap::new()
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "citation registry is unreadable, starting empty");
                IndexMap::new()
            }
        };

        let mut registry = Self {
            path: Some(path),
            records,
            by_text: HashMap::new(),
        };
        registry.rebuild_text_index();
        debug!(records = registry.len(), "loaded citation registry");
        registry
    }

    fn parse(content: &[u8]) -> Result<IndexMap<String, CitationRecord>, serde_json::Error> {
        let mut records: IndexMap<String, CitationRecord> = serde_json::from_slice(content)?;
        for (key, record) in records.iter_mut() {
            if record.hex_id != *key {
                if !record.hex_id.is_empty() {
                    warn!(key = %key, hex_id = %record.hex_id, "registry record id does not match its key, using the key");
                }
                record.hex_id = key.clone();
            }
        }
        Ok(records)
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Write the registry to its backing file.
    pub fn save(&self) -> Result<(), RegistryError> {
        let path = self.path.as_deref().ok_or(RegistryError::NotBacked)?;
        self.save_to(path)
    }

    /// Write the registry to `path` via a temporary file in the same
    /// directory, so a crash never leaves a truncated store behind.
    pub fn save_to(&self, path: &Path) -> Result<(), RegistryError> {
        let parent = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let io_err = |source| RegistryError::Io {
            path: path.to_path_buf(),
            source,
        };

        fs::create_dir_all(parent).map_err(io_err)?;
        let mut json = serde_json::to_string_pretty(&self.records)?;
        json.push('\n');

        let mut tmp = NamedTempFile::new_in(parent).map_err(io_err)?;
        // Keep the mode of an existing store; temp files start private.
        if let Ok(metadata) = fs::metadata(path) {
            tmp.as_file()
                .set_permissions(metadata.permissions())
                .map_err(io_err)?;
        }
        tmp.write_all(json.as_bytes()).map_err(io_err)?;
        tmp.as_file().sync_all().map_err(io_err)?;
        tmp.persist(path).map_err(|e| RegistryError::Persist {
            path: path.to_path_buf(),
            source: e.error,
        })?;

        debug!(path = %path.display(), records = self.len(), "saved citation registry");
        Ok(())
    }

    pub fn get(&self, hex_id: &str) -> Option<&CitationRecord> {
        self.records.get(hex_id)
    }

    pub fn contains(&self, hex_id: &str) -> bool {
        self.records.contains_key(hex_id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CitationRecord> {
        self.records.values()
    }

    /// Insert a record or merge `update` into the existing one.
    ///
    /// Returns whether anything changed. `dateUpdated` moves only on change.
    pub fn upsert(&mut self, hex_id: &str, update: CitationUpdate) -> bool {
        let now = Utc::now();

        let Some(record) = self.records.get_mut(hex_id) else {
            let mut record = CitationRecord::new(hex_id, now);
            record.merge(update);
            if let Some(text) = &record.source_text {
                self.by_text
                    .entry(text.clone())
                    .or_insert_with(|| hex_id.to_string());
            }
            self.records.insert(hex_id.to_string(), record);
            return true;
        };

        let text_changed = update
            .source_text
            .as_ref()
            .is_some_and(|text| record.source_text.as_ref() != Some(text));
        let changed = record.merge(update);
        if changed {
            record.date_updated = now;
        }
        if text_changed {
            self.rebuild_text_index();
        }
        changed
    }

    /// Note that `document` references `hex_id`. Unknown ids are ignored.
    pub fn record_file_reference(&mut self, hex_id: &str, document: &str) -> bool {
        let Some(record) = self.records.get_mut(hex_id) else {
            debug!(hex_id, document, "file reference for unknown citation ignored");
            return false;
        };
        let added = record.files.insert(document.to_string());
        if added {
            record.date_updated = Utc::now();
        }
        added
    }

    /// The first record whose source text equals `text` exactly.
    pub fn find_by_text(&self, text: &str) -> Option<&CitationRecord> {
        self.by_text.get(text).and_then(|id| self.records.get(id))
    }

    pub fn files_for(&self, hex_id: &str) -> Option<&IndexSet<String>> {
        self.records.get(hex_id).map(|r| &r.files)
    }

    pub fn records_for_document<'a>(
        &'a self,
        document: &'a str,
    ) -> impl Iterator<Item = &'a CitationRecord> + 'a {
        self.records
            .values()
            .filter(move |r| r.files.contains(document))
    }

    fn rebuild_text_index(&mut self) {
        self.by_text.clear();
        for (id, record) in &self.records {
            if let Some(text) = &record.source_text {
                self.by_text
                    .entry(text.clone())
                    .or_insert_with(|| id.clone());
            }
        }
    }
}

fn quarantine(path: &Path) {
    let mut target = OsString::from(path.as_os_str());
    target.push(".corrupt");
    let target = PathBuf::from(target);
    match fs::copy(path, &target) {
        Ok(_) => warn!(backup = %target.display(), "copied corrupt citation registry aside"),
        Err(e) => warn!(error = %e, "could not copy corrupt citation registry aside"),
    }
}
