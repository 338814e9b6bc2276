//! On-disk module files

use crate::{ModuleError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Contents of a module file.
///
/// ```toml
/// implementation = "log"
/// imports = ["term"]
/// ```
///
/// Every field is optional; an empty file is a valid module that activates
/// the implementation registered under its canonical name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ModuleManifest {
    /// Registry key of the compiled implementation
    pub implementation: Option<String>,

    /// Modules imported while this module executes, in order
    pub imports: Vec<String>,

    pub description: Option<String>,
}

impl ModuleManifest {
    /// Parse manifest text read from `path`
    pub fn parse(path: &Path, text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|error| ModuleError::ManifestError {
            path: path.to_path_buf(),
            error,
        })
    }

    /// Read and parse the manifest at `path`
    pub fn read(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|error| ModuleError::IoError {
            path: path.to_path_buf(),
            error,
        })?;
        Self::parse(path, &text)
    }

    /// Registry key to activate for a module registered as `canonical_name`
    pub fn implementation_key<'a>(&'a self, canonical_name: &'a str) -> &'a str {
        self.implementation.as_deref().unwrap_or(canonical_name)
    }
}
