/*
SPDX-License-Identifier: MPL-2.0
SPDX-FileCopyrightText: © 2023-2026 Bruce D'Arcus
*/

use std::path::PathBuf;

use thiserror::Error;

use crate::engine::ProcessOutcome;
use crate::registry::Registry;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config file {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("registry I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("registry serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("failed to move registry into place at {path:?}: {source}")]
    Persist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("registry has no backing file")]
    NotBacked,
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("failed to compile citation pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("no free {length}-digit citation identifier after {attempts} attempts")]
    IdSpaceExhausted { length: usize, attempts: usize },
}

/// Failure of a full load/process/save pass over one document.
#[derive(Debug, Error)]
pub enum ProcessError {
    #[error(transparent)]
    Engine(#[from] EngineError),

    /// The document was rewritten but the registry could not be persisted.
    ///
    /// `outcome` holds the finished text and `registry` the pending state, so
    /// the caller can write the document and retry [`Registry::save`].
    #[error("document processed but registry was not saved: {source}")]
    RegistrySave {
        outcome: Box<ProcessOutcome>,
        registry: Box<Registry>,
        #[source]
        source: RegistryError,
    },
}
