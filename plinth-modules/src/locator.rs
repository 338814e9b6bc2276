//! Module path resolution

use crate::config::{ModuleConfig, ProjectContext};
use crate::plugin;
use crate::{ModuleError, Result};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{trace, warn};

/// Which layer of the search order a candidate belongs to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocationKind {
    TestOverride,
    Core,
    ProjectInternal,
    ProjectExported,
    /// A plugin installation root, innermost first
    Plugin { root: PathBuf },
}

impl fmt::Display for LocationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LocationKind::TestOverride => write!(f, "test"),
            LocationKind::Core => write!(f, "core"),
            LocationKind::ProjectInternal => write!(f, "project"),
            LocationKind::ProjectExported => write!(f, "exported"),
            LocationKind::Plugin { root } => write!(f, "plugin ({})", root.display()),
        }
    }
}

/// A candidate file for a module name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchLocation {
    pub kind: LocationKind,
    pub path: PathBuf,
}

/// Finds the file backing a module name
pub struct PathLocator<'a> {
    config: &'a ModuleConfig,
    context: &'a ProjectContext,
}

impl<'a> PathLocator<'a> {
    pub fn new(config: &'a ModuleConfig, context: &'a ProjectContext) -> Self {
        Self { config, context }
    }

    /// Every candidate path for `name`, in precedence order
    pub fn search_locations(&self, name: &str) -> Vec<SearchLocation> {
        let mut locations = Vec::new();

        if let Some(test_dir) = &self.config.test_dir {
            locations.push(SearchLocation {
                kind: LocationKind::TestOverride,
                path: test_dir.join(name),
            });
        }

        locations.push(SearchLocation {
            kind: LocationKind::Core,
            path: self.config.core_dir.join(name),
        });
        locations.push(SearchLocation {
            kind: LocationKind::ProjectInternal,
            path: self.config.internal_lib_dir(self.context).join(name),
        });
        locations.push(SearchLocation {
            kind: LocationKind::ProjectExported,
            path: self.config.exported_lib_dir(self.context).join(name),
        });

        // `<plugin>/<module>` lives at `plugins/<plugin>/lib/<module>`
        if let Some((plugin_name, module)) = name.split_once('/') {
            let relative = Path::new(&self.config.plugins_dir_name)
                .join(plugin_name)
                .join(&self.config.lib_dir_name)
                .join(module);

            for root in plugin::installation_chain(&self.context.project_root, self.config) {
                locations.push(SearchLocation {
                    path: root.join(&relative),
                    kind: LocationKind::Plugin { root },
                });
            }
        }

        locations
    }

    /// Resolve `name` to the first existing file
    pub fn locate(&self, name: &str) -> Option<SearchLocation> {
        self.search_locations(name).into_iter().find(|location| {
            let found = location.path.is_file();
            trace!(module = name, path = ?location.path, found, "probing {}", location.kind);
            found
        })
    }
}

/// Reject names that could escape the search directories
pub fn validate_module_name(name: &str) -> Result<()> {
    let invalid = || ModuleError::InvalidModuleName {
        name: name.to_string(),
    };

    if name.is_empty() || name.starts_with('/') || name.ends_with('/') {
        return Err(invalid());
    }

    if name.contains("..") || name.contains("./") || name.contains("/.") || name.contains("//") {
        warn!("Rejected module name with directory traversal: {}", name);
        return Err(invalid());
    }

    if name.contains('\0') || name.contains('\\') {
        warn!("Rejected module name with forbidden characters: {:?}", name);
        return Err(invalid());
    }

    if Path::new(name).is_absolute() {
        warn!("Rejected absolute module name: {}", name);
        return Err(invalid());
    }

    Ok(())
}
