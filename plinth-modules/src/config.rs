//! Search layout configuration

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Where modules live on disk.
///
/// Deserializes from the `[modules]` table of the CLI configuration file;
/// every field has a default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleConfig {
    /// Directory searched before everything else, used by tests to inject stubs
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test_dir: Option<PathBuf>,

    /// Framework core library
    #[serde(default = "default_core_dir")]
    pub core_dir: PathBuf,

    /// Root of the top-level project
    #[serde(default = "default_project_root")]
    pub project_root: PathBuf,

    /// Directory holding the project's scripts, `<project_root>/bin` if unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scripts_dir: Option<PathBuf>,

    #[serde(default = "default_plugins_dir_name")]
    pub plugins_dir_name: String,

    #[serde(default = "default_lib_dir_name")]
    pub lib_dir_name: String,

    #[serde(default = "default_bin_dir_name")]
    pub bin_dir_name: String,
}

impl Default for ModuleConfig {
    fn default() -> Self {
        Self {
            test_dir: None,
            core_dir: default_core_dir(),
            project_root: default_project_root(),
            scripts_dir: None,
            plugins_dir_name: default_plugins_dir_name(),
            lib_dir_name: default_lib_dir_name(),
            bin_dir_name: default_bin_dir_name(),
        }
    }
}

fn default_core_dir() -> PathBuf { PathBuf::from("core") }
fn default_project_root() -> PathBuf { PathBuf::from(".") }
fn default_plugins_dir_name() -> String { "plugins".to_string() }
fn default_lib_dir_name() -> String { "lib".to_string() }
fn default_bin_dir_name() -> String { "bin".to_string() }

impl ModuleConfig {
    /// Create a configuration for the given core directory and project root
    pub fn new(core_dir: impl Into<PathBuf>, project_root: impl Into<PathBuf>) -> Self {
        Self {
            core_dir: core_dir.into(),
            project_root: project_root.into(),
            ..Default::default()
        }
    }

    /// Set the test-injection directory
    pub fn with_test_dir(mut self, test_dir: impl Into<PathBuf>) -> Self {
        self.test_dir = Some(test_dir.into());
        self
    }

    /// The project context of the top-level project
    pub fn project_context(&self) -> ProjectContext {
        let scripts_dir = self
            .scripts_dir
            .clone()
            .unwrap_or_else(|| self.project_root.join(&self.bin_dir_name));
        ProjectContext {
            project_root: self.project_root.clone(),
            scripts_dir,
        }
    }

    /// Context for a plugin installed at `install_root`
    pub fn plugin_context(&self, install_root: &Path) -> ProjectContext {
        ProjectContext {
            project_root: install_root.to_path_buf(),
            scripts_dir: install_root.join(&self.bin_dir_name),
        }
    }

    /// Libraries private to the project: `<scripts_dir>/lib`
    pub fn internal_lib_dir(&self, context: &ProjectContext) -> PathBuf {
        context.scripts_dir.join(&self.lib_dir_name)
    }

    /// Libraries the project publishes: `<project_root>/lib`
    pub fn exported_lib_dir(&self, context: &ProjectContext) -> PathBuf {
        context.project_root.join(&self.lib_dir_name)
    }
}

/// The project that relative lookups are resolved against.
///
/// While a plugin module executes, this points at the plugin's own
/// installation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectContext {
    pub project_root: PathBuf,
    pub scripts_dir: PathBuf,
}
