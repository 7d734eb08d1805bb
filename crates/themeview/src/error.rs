//! Error types for theme resolution and rendering.
//!
//! This module provides [`ThemeError`], the single error type returned by every
//! fallible operation in the crate. Errors are never logged or recovered from
//! inside the crate; they propagate to the host application, which decides how
//! to report them (for a web host, typically as a 500 response).

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while configuring a registry or rendering a template.
#[derive(Debug, Error)]
pub enum ThemeError {
    /// The installation is broken: the base path does not exist, or the
    /// default theme's default layout is missing.
    ///
    /// This is not a per-request condition and usually means the deployment
    /// itself needs fixing.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A requested template (or the source of a share) does not exist.
    #[error("template not found: {template} ({})", path.display())]
    NotFound {
        /// The name the caller asked for.
        template: String,
        /// The last path that was checked.
        path: PathBuf,
    },

    /// Data of the wrong shape was supplied, or a template name is unusable.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A template body failed to compile or evaluate.
    #[error("template error: {0}")]
    Template(#[from] minijinja::Error),

    /// Reading a template or config file failed.
    #[error("I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The output sink rejected the rendered page.
    #[error("failed to write rendered output: {0}")]
    Output(#[source] std::io::Error),
}

impl ThemeError {
    pub(crate) fn not_found(template: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        ThemeError::NotFound {
            template: template.into(),
            path: path.into(),
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ThemeError::Io {
            path: path.into(),
            source,
        }
    }

    /// Returns true for [`ThemeError::NotFound`].
    pub fn is_not_found(&self) -> bool {
        matches!(self, ThemeError::NotFound { .. })
    }

    /// Returns true for [`ThemeError::Configuration`].
    pub fn is_configuration(&self) -> bool {
        matches!(self, ThemeError::Configuration(_))
    }
}

impl From<serde_json::Error> for ThemeError {
    fn from(err: serde_json::Error) -> Self {
        ThemeError::InvalidInput(format!("data is not serializable: {}", err))
    }
}

impl From<serde_yaml::Error> for ThemeError {
    fn from(err: serde_yaml::Error) -> Self {
        ThemeError::Configuration(format!("invalid registry config: {}", err))
    }
}

/// Result type for theme operations.
pub type Result<T> = std::result::Result<T, ThemeError>;
