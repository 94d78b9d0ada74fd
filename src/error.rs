//! Error types for awplus.
//!
//! The module layer reports [`ModuleError`]; this module wraps it together with the
//! I/O and parsing failures of the command-line surface.

use crate::modules::ModuleError;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for awplus operations.
pub type Result<T> = std::result::Result<T, Error>;

/// The main error type for awplus.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Module Errors
    // ========================================================================
    /// Module not found.
    #[error("Module '{0}' not found")]
    ModuleNotFound(String),

    /// A resource module rejected its input or failed to apply it.
    #[error("Module '{module}' failed: {source}")]
    Module {
        /// Module name
        module: String,
        /// Underlying module error
        #[source]
        source: ModuleError,
    },

    // ========================================================================
    // Input Errors
    // ========================================================================
    /// Error loading a desired-configuration file.
    #[error("Failed to load desired configuration from '{path}': {message}")]
    WantLoad {
        /// Path to the file
        path: PathBuf,
        /// Error message
        message: String,
    },

    /// Facts path given on the command line does not exist.
    #[error("Facts not found: {0}")]
    FactsNotFound(PathBuf),
}

impl Error {
    /// Wrap a module error with the name of the module that raised it.
    pub fn module(module: impl Into<String>, source: ModuleError) -> Self {
        match source {
            ModuleError::NotFound(name) => Self::ModuleNotFound(name),
            source => Self::Module {
                module: module.into(),
                source,
            },
        }
    }

    pub fn want_load(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::WantLoad {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Whether the error was raised before any command was computed
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Error::Module {
                source: ModuleError::InvalidParameter(_)
                    | ModuleError::MissingParameter(_)
                    | ModuleError::Validation { .. }
                    | ModuleError::DuplicateKey { .. },
                ..
            }
        )
    }

    /// Process exit code for this error
    pub fn exit_code(&self) -> i32 {
        1
    }
}
