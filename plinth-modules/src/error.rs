//! Module system error types

use crate::call_site::ImportTrace;
use std::path::PathBuf;
use thiserror::Error;

/// Type alias for module system results
pub type Result<T> = std::result::Result<T, ModuleError>;

/// Errors that can occur in the module system
#[derive(Error, Debug)]
pub enum ModuleError {
    /// No search location holds a file for the requested name
    #[error("Module not found: {name}{trace}")]
    ModuleNotFound {
        /// Name as requested by the importer
        name: String,
        /// Imports in progress when the lookup failed
        trace: ImportTrace,
    },

    /// The module was located but could not be executed
    #[error("Failed to load module {name} from {}{trace}", .path.display())]
    LoadFailed {
        /// Canonical name of the module
        name: String,
        /// File the module resolved to
        path: PathBuf,
        /// Imports in progress when loading failed
        trace: ImportTrace,
        /// What went wrong while executing the module
        #[source]
        source: Box<ModuleError>,
    },

    /// Module name is invalid
    #[error("Invalid module name: {name:?}")]
    InvalidModuleName {
        /// The invalid module name
        name: String,
    },

    /// I/O error occurred while reading a module
    #[error("IO error reading module {}: {error}", .path.display())]
    IoError {
        /// Path to the module that failed to read
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        error: std::io::Error,
    },

    /// The module file is not a valid manifest
    #[error("Invalid module manifest {}: {error}", .path.display())]
    ManifestError {
        /// Path to the manifest
        path: PathBuf,
        /// The underlying TOML error
        #[source]
        error: toml::de::Error,
    },

    /// The manifest names an implementation nobody registered
    #[error("No implementation registered under {key:?} for module {module}")]
    UnknownImplementation {
        /// Registry key taken from the manifest
        key: String,
        /// Canonical module name
        module: String,
    },

    /// The module is recorded but its activation has not finished yet
    #[error("Module {name} is still loading (circular import)")]
    StillLoading {
        /// Canonical module name
        name: String,
    },

    /// An earlier attempt to execute the module failed
    #[error("Module {name} failed to load earlier")]
    FailedEarlier {
        /// Canonical module name
        name: String,
    },

    /// Requested export was not found in the module
    #[error("Export not found: {name} in module {module}")]
    ExportNotFound {
        /// Name of the missing export
        name: String,
        /// Module that was expected to contain the export
        module: String,
    },

    /// A module operation failed
    #[error("{module}::{export} failed: {message}")]
    Call {
        /// Module that owns the export
        module: String,
        /// The export that was called
        export: String,
        /// Error message
        message: String,
    },
}

impl ModuleError {
    /// Whether this error already describes a failed import and should
    /// propagate unchanged through enclosing loads.
    pub fn is_import_failure(&self) -> bool {
        matches!(
            self,
            ModuleError::ModuleNotFound { .. }
                | ModuleError::LoadFailed { .. }
                | ModuleError::InvalidModuleName { .. }
        )
    }
}
