//! Plugin path rewriting
//!
//! Modules shipped by plugins live in a flat namespace keyed by
//! `<plugin>/<module>`. A file located under a plugins directory is
//! registered under that canonical name, and while it executes, relative
//! lookups resolve against the plugin's own installation.

use crate::config::{ModuleConfig, ProjectContext};
use crate::locator::LocationKind;
use std::ffi::OsStr;
use std::path::{Component, Path, PathBuf};

/// Identity of a module file that lives inside a plugin installation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginIdentity {
    /// `<plugin>/<module-relative-path>` with the leading `bin` and `lib` segments removed
    pub canonical_name: String,

    /// Name of the plugin that ships the module
    pub plugin: String,

    /// Context to apply while the module executes
    pub context: ProjectContext,
}

/// Derive the plugin identity of a located module file, or `None` if it is
/// not inside a plugin installation.
///
/// Only files under `<root>/plugins/` count, where `root` is the project
/// root or an installation it is nested in; test and core files never do.
/// The innermost installation wins, so `<root>/plugins/b/plugins/c/lib/x`
/// belongs to plugin `c`.
pub fn rewrite(path: &Path, kind: &LocationKind, config: &ModuleConfig) -> Option<PluginIdentity> {
    if matches!(kind, LocationKind::TestOverride | LocationKind::Core) {
        return None;
    }

    // The innermost root holding the file decides; its own scripts are not plugins
    let root = installation_chain(&config.project_root, config)
        .into_iter()
        .find(|root| path.starts_with(root))?;
    let mut install_root = root.join(&config.plugins_dir_name);
    let relative = path.strip_prefix(&install_root).ok()?;

    let mut rest: Vec<&OsStr> = relative
        .components()
        .map(|c| match c {
            Component::Normal(s) => Some(s),
            _ => None,
        })
        .collect::<Option<_>>()?;

    let plugins = OsStr::new(&config.plugins_dir_name);
    // `<plugin>/plugins/<nested>/...` descends into the nested installation
    while rest.len() > 3 && rest[1] == plugins {
        install_root = install_root.join(rest[0]).join(plugins);
        rest.drain(..2);
    }

    let (plugin, mut segments) = rest.split_first()?;
    install_root = install_root.join(plugin);

    // `bin/lib/<module>` or `lib/<module>`; deeper `bin`/`lib` are part of the name
    if segments.first() == Some(&OsStr::new(&config.bin_dir_name)) {
        segments = &segments[1..];
    }
    if segments.first() == Some(&OsStr::new(&config.lib_dir_name)) {
        segments = &segments[1..];
    }
    if segments.is_empty() {
        return None;
    }

    let plugin = plugin.to_string_lossy().into_owned();
    let module: Vec<_> = segments.iter().map(|s| s.to_string_lossy()).collect();

    Some(PluginIdentity {
        canonical_name: format!("{}/{}", plugin, module.join("/")),
        plugin,
        context: config.plugin_context(&install_root),
    })
}

/// The installation that `root` is nested in, if `root` is itself a plugin
/// (`X/plugins/<name>` yields `X`).
pub fn enclosing_installation(root: &Path, config: &ModuleConfig) -> Option<PathBuf> {
    let parent = root.parent()?;
    if parent.file_name()? == OsStr::new(&config.plugins_dir_name) {
        parent.parent().map(Path::to_path_buf)
    } else {
        None
    }
}

/// Plugin installation roots to search, innermost first
pub fn installation_chain(root: &Path, config: &ModuleConfig) -> Vec<PathBuf> {
    let mut chain = vec![root.to_path_buf()];
    let mut current = root.to_path_buf();
    while let Some(outer) = enclosing_installation(&current, config) {
        chain.push(outer.clone());
        current = outer;
    }
    chain
}
