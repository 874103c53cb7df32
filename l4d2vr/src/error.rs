use std::{io, num::ParseFloatError, num::ParseIntError, path::PathBuf};

use thiserror::Error;

/// Failures while bringing up the VR session. These are fatal: the engine
/// never reaches the frame loop.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("VR runtime initialization failed: {0}")]
    RuntimeInit(String),

    #[error("Compositor initialization failed")]
    CompositorUnavailable,

    #[error("Unable to load action manifest {path:?}: {reason}")]
    ActionManifest { path: PathBuf, reason: String },

    #[error("Unable to resolve action '{0}'")]
    UnknownAction(String),

    #[error("Overlay creation failed: {0}")]
    Overlay(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Unable to read config file {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Config file contains no entries")]
    Empty,

    #[error("Unable to watch config directory: {0}")]
    Watch(#[from] notify::Error),
}

/// Parse failure for a single config field; the field falls back to its default
#[derive(Debug, Error, Clone, PartialEq)]
pub enum FieldError {
    #[error("expected 'true' or 'false', found '{0}'")]
    InvalidBool(String),

    #[error("invalid number: {0}")]
    InvalidFloat(#[from] ParseFloatError),

    #[error("invalid integer: {0}")]
    InvalidInt(#[from] ParseIntError),
}
