//! Configuration handling for the Plinth CLI

use anyhow::{Context, Result};
use plinth_modules::ModuleConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Contents of the CLI configuration file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Search layout, the `[modules]` table
    #[serde(default)]
    pub modules: ModuleConfig,

    /// Logging, the `[log]` table
    #[serde(default)]
    pub log: LogConfig,
}

/// Logging settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// `tracing_subscriber::EnvFilter` directives, overridden by `RUST_LOG`
    #[serde(default = "default_filter")]
    pub filter: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: default_filter(),
        }
    }
}

fn default_filter() -> String { "info".to_string() }

/// Values given on the command line, applied over the file
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    /// `--core-dir`
    pub core_dir: Option<PathBuf>,
    /// `--project-root`
    pub project_root: Option<PathBuf>,
    /// `--test-lib` or `PLINTH_TEST_LIB`
    pub test_lib: Option<PathBuf>,
}

impl Config {
    /// Replace file values with the ones given on the command line
    pub fn apply(&mut self, overrides: Overrides) {
        if let Some(core_dir) = overrides.core_dir {
            self.modules.core_dir = core_dir;
        }
        if let Some(project_root) = overrides.project_root {
            self.modules.project_root = project_root;
        }
        if let Some(test_lib) = overrides.test_lib {
            self.modules.test_dir = Some(test_lib);
        }
    }
}

/// Load configuration from file or use defaults
pub fn load_config(path: Option<PathBuf>) -> Result<Config> {
    if let Some(path) = path {
        read_config(&path)
    } else if let Some(home) = dirs::home_dir() {
        let default_path = home.join(".plinth").join("config.toml");
        if default_path.exists() {
            read_config(&default_path)
        } else {
            Ok(Config::default())
        }
    } else {
        Ok(Config::default())
    }
}

fn read_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    let config: Config = toml::from_str(&content)
        .with_context(|| format!("parsing config {}", path.display()))?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_load_explicit_config() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        fs::write(
            &path,
            r#"
            [modules]
            core_dir = "/opt/plinth/core"
            plugins_dir_name = "extensions"

            [log]
            filter = "plinth_modules=debug"
            "#,
        )
        .unwrap();

        let config = load_config(Some(path)).unwrap();
        assert_eq!(config.modules.core_dir, PathBuf::from("/opt/plinth/core"));
        assert_eq!(config.modules.plugins_dir_name, "extensions");
        assert_eq!(config.modules.lib_dir_name, "lib");
        assert_eq!(config.log.filter, "plinth_modules=debug");
    }

    #[test]
    fn test_missing_explicit_config_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        assert!(load_config(Some(temp_dir.path().join("absent.toml"))).is_err());
    }

    #[test]
    fn test_overrides() {
        let mut config = Config::default();
        config.apply(Overrides {
            core_dir: Some(PathBuf::from("/fw/core")),
            project_root: None,
            test_lib: Some(PathBuf::from("/tmp/stubs")),
        });

        assert_eq!(config.modules.core_dir, PathBuf::from("/fw/core"));
        assert_eq!(config.modules.project_root, PathBuf::from("."));
        assert_eq!(config.modules.test_dir, Some(PathBuf::from("/tmp/stubs")));
    }
}
