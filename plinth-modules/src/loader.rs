//! Module loading
//!
//! [`ModuleLoader`] turns module names into activated modules: it locates
//! the file, derives the name the module is registered under, records the
//! import in the ledger and then executes the module. Recording happens
//! before execution, so an import cycle ends at the first module that is
//! requested a second time.

use crate::call_site::{CallSite, ImportTrace, TraceFrame};
use crate::config::{ModuleConfig, ProjectContext};
use crate::ledger::ImportLedger;
use crate::locator::{validate_module_name, PathLocator, SearchLocation};
use crate::manifest::ModuleManifest;
use crate::plugin;
use crate::registry::{Module, ModuleRegistry};
use crate::{ModuleError, Result};
use rustc_hash::{FxHashMap, FxHashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, trace, warn};

/// Module loader responsible for finding and loading modules
pub struct ModuleLoader {
    config: ModuleConfig,
    context: ProjectContext,
    registry: ModuleRegistry,
    ledger: ImportLedger,
    modules: FxHashMap<String, Arc<dyn Module>>,
    /// Recorded modules whose execution failed
    failed: FxHashSet<String>,
    /// Imports currently executing, outermost first
    loading: Vec<TraceFrame>,
}

impl ModuleLoader {
    /// Create a new module loader with the given configuration and implementations
    pub fn new(config: ModuleConfig, registry: ModuleRegistry) -> Self {
        let context = config.project_context();
        Self {
            config,
            context,
            registry,
            ledger: ImportLedger::new(),
            modules: FxHashMap::default(),
            failed: FxHashSet::default(),
            loading: Vec::new(),
        }
    }

    /// Import every name in order. Stops at the first fatal error; imports
    /// completed before it stay loaded.
    pub fn import_all<S: AsRef<str>>(&mut self, names: &[S], caller: CallSite) -> Result<()> {
        for name in names {
            self.load(name.as_ref(), &caller)?;
        }
        Ok(())
    }

    /// Import a single module
    pub fn import(&mut self, name: &str, caller: CallSite) -> Result<()> {
        self.load(name, &caller).map(|_| ())
    }

    /// Import a module and return its handle
    pub fn require(&mut self, name: &str, caller: CallSite) -> Result<Arc<dyn Module>> {
        let canonical = self.load(name, &caller)?;
        self.modules
            .get(&canonical)
            .cloned()
            .ok_or(ModuleError::StillLoading { name: canonical })
    }

    /// Resolve `name` to a file without loading it
    pub fn locate(&self, name: &str) -> Result<PathBuf> {
        validate_module_name(name)?;
        PathLocator::new(&self.config, &self.context)
            .locate(name)
            .map(|location| location.path)
            .ok_or_else(|| ModuleError::ModuleNotFound {
                name: name.to_string(),
                trace: self.trace_for(name, None, CallSite::descriptor("locate")),
            })
    }

    /// Candidate files for `name` in precedence order
    pub fn search_locations(&self, name: &str) -> Result<Vec<SearchLocation>> {
        validate_module_name(name)?;
        Ok(PathLocator::new(&self.config, &self.context).search_locations(name))
    }

    /// Handle of an activated module
    pub fn module(&self, name: &str) -> Option<Arc<dyn Module>> {
        self.modules.get(name).cloned()
    }

    /// Whether `name` is recorded but its execution failed
    pub fn has_failed(&self, name: &str) -> bool {
        self.failed.contains(name)
    }

    /// Whether `name` is recorded but still executing
    pub fn is_loading(&self, name: &str) -> bool {
        self.loading.iter().any(|frame| frame.name == name)
    }

    pub fn ledger(&self) -> &ImportLedger {
        &self.ledger
    }

    /// Project context lookups currently resolve against
    pub fn context(&self) -> &ProjectContext {
        &self.context
    }

    pub fn config(&self) -> &ModuleConfig {
        &self.config
    }

    pub fn registry(&self) -> &ModuleRegistry {
        &self.registry
    }

    /// Load `name` and return the canonical name it is registered under
    fn load(&mut self, name: &str, caller: &CallSite) -> Result<String> {
        validate_module_name(name)?;

        let SearchLocation { kind, path } = PathLocator::new(&self.config, &self.context)
            .locate(name)
            .ok_or_else(|| ModuleError::ModuleNotFound {
                name: name.to_string(),
                trace: self.trace_for(name, None, caller.clone()),
            })?;

        let identity = plugin::rewrite(&path, &kind, &self.config);
        let canonical = identity
            .as_ref()
            .map_or_else(|| name.to_string(), |id| id.canonical_name.clone());

        match self.ledger.lookup(&canonical).map(|entry| entry.file == path) {
            Some(true) if self.failed.contains(&canonical) => {
                return Err(ModuleError::LoadFailed {
                    trace: self.trace_for(&canonical, Some(path.clone()), caller.clone()),
                    source: Box::new(ModuleError::FailedEarlier {
                        name: canonical.clone(),
                    }),
                    name: canonical,
                    path,
                });
            }
            Some(true) => {
                trace!(module = %canonical, "already imported");
                return Ok(canonical);
            }
            Some(false) => {
                if let Some(collision) = self.ledger.record_collision(&canonical, &path, caller.clone()) {
                    warn!(
                        module = %collision.name,
                        first_file = %collision.first_file.display(),
                        first_caller = %collision.first_caller,
                        new_file = %collision.new_file.display(),
                        new_caller = %collision.new_caller,
                        "module name collision, keeping the first loaded module"
                    );
                }
                return Ok(canonical);
            }
            None => {}
        }

        self.ledger.record(canonical.clone(), path.clone(), caller.clone());
        self.loading.push(TraceFrame {
            name: canonical.clone(),
            file: Some(path.clone()),
            caller: caller.clone(),
        });
        debug!(module = %canonical, path = %path.display(), caller = %caller, "loading module");

        // A plugin module sees its own installation as the project
        let saved_context = identity.map(|id| std::mem::replace(&mut self.context, id.context));
        let result = self.execute(&canonical, &path);
        if let Some(context) = saved_context {
            self.context = context;
        }

        let result = result.map_err(|error| self.load_failure(&canonical, &path, error));
        self.loading.pop();
        if result.is_err() {
            self.failed.insert(canonical.clone());
        }

        self.modules.insert(canonical.clone(), result?);
        info!(module = %canonical, "loaded module");
        Ok(canonical)
    }

    /// Run the module file: its declared imports, then its implementation
    fn execute(&mut self, canonical: &str, path: &Path) -> Result<Arc<dyn Module>> {
        let manifest = ModuleManifest::read(path)?;

        let site = CallSite::new(path.display().to_string(), 0, canonical);
        for dependency in &manifest.imports {
            self.load(dependency, &site)?;
        }

        let key = manifest.implementation_key(canonical);
        let factory = self
            .registry
            .get(key)
            .ok_or_else(|| ModuleError::UnknownImplementation {
                key: key.to_string(),
                module: canonical.to_string(),
            })?;

        let mut scope = ImportScope {
            loader: self,
            module: canonical,
            file: path,
        };
        factory.activate(&mut scope)
    }

    fn load_failure(&self, canonical: &str, path: &Path, error: ModuleError) -> ModuleError {
        if error.is_import_failure() {
            return error;
        }
        ModuleError::LoadFailed {
            name: canonical.to_string(),
            path: path.to_path_buf(),
            trace: ImportTrace::new(self.loading.clone()),
            source: Box::new(error),
        }
    }

    fn trace_for(&self, name: &str, file: Option<PathBuf>, caller: CallSite) -> ImportTrace {
        let mut frames = self.loading.clone();
        frames.push(TraceFrame {
            name: name.to_string(),
            file,
            caller,
        });
        ImportTrace::new(frames)
    }
}

/// Access to the loader from inside a module's activation.
///
/// Imports made here resolve in the executing module's context, so a plugin
/// module finds its own libraries first.
pub struct ImportScope<'a> {
    loader: &'a mut ModuleLoader,
    module: &'a str,
    file: &'a Path,
}

impl ImportScope<'_> {
    /// Canonical name of the module being activated
    pub fn module_name(&self) -> &str {
        self.module
    }

    /// File of the module being activated
    pub fn file(&self) -> &Path {
        self.file
    }

    pub fn context(&self) -> &ProjectContext {
        self.loader.context()
    }

    pub fn import(&mut self, name: &str, caller: CallSite) -> Result<()> {
        self.loader.import(name, caller)
    }

    pub fn import_all<S: AsRef<str>>(&mut self, names: &[S], caller: CallSite) -> Result<()> {
        self.loader.import_all(names, caller)
    }

    /// Import a module and return its handle. Fails with `StillLoading`
    /// when the request closes an import cycle.
    pub fn require(&mut self, name: &str, caller: CallSite) -> Result<Arc<dyn Module>> {
        self.loader.require(name, caller)
    }

    pub fn module(&self, name: &str) -> Option<Arc<dyn Module>> {
        self.loader.module(name)
    }

    pub fn ledger(&self) -> &ImportLedger {
        self.loader.ledger()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::NativeModule;
    use crate::call_site;
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;

    fn create_module_file(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, content).unwrap();
        path
    }

    fn registry_with(keys: &[&str]) -> ModuleRegistry {
        let mut registry = ModuleRegistry::new();
        for key in keys {
            let key = key.to_string();
            registry.register_fn(key.clone(), move |scope| {
                let reply = key.clone();
                Ok(NativeModule::new(scope.module_name())
                    .export("id", move |_| Ok(json!(reply.clone())))
                    .into_module())
            });
        }
        registry
    }

    #[test]
    fn test_load_simple_module() {
        let temp_dir = TempDir::new().unwrap();
        let core = temp_dir.path().join("core");
        let file = create_module_file(&core, "log", "");

        let config = ModuleConfig::new(&core, temp_dir.path().join("proj"));
        let mut loader = ModuleLoader::new(config, registry_with(&["log"]));

        let module = loader.require("log", call_site!()).unwrap();
        assert_eq!(module.call("id", &[]).unwrap(), json!("log"));
        assert_eq!(loader.ledger().lookup("log").unwrap().file, file);
    }

    #[test]
    fn test_module_not_found() {
        let temp_dir = TempDir::new().unwrap();
        let config = ModuleConfig::new(temp_dir.path().join("core"), temp_dir.path());
        let mut loader = ModuleLoader::new(config, ModuleRegistry::new());

        let result = loader.import("nonexistent", call_site!());
        assert!(matches!(result, Err(ModuleError::ModuleNotFound { .. })));
        assert!(loader.ledger().is_empty());
    }

    #[test]
    fn test_reject_invalid_names() {
        let temp_dir = TempDir::new().unwrap();
        let config = ModuleConfig::new(temp_dir.path().join("core"), temp_dir.path());
        let mut loader = ModuleLoader::new(config, ModuleRegistry::new());

        for name in ["", "../escape", "/etc/passwd", "evil\0module"] {
            let result = loader.import(name, call_site!());
            assert!(
                matches!(result, Err(ModuleError::InvalidModuleName { .. })),
                "Should reject module name: {:?}",
                name
            );
        }
        assert!(loader.ledger().is_empty());
    }

    #[test]
    fn test_unknown_implementation_is_load_failure() {
        let temp_dir = TempDir::new().unwrap();
        let core = temp_dir.path().join("core");
        create_module_file(&core, "log", "implementation = \"missing\"");

        let config = ModuleConfig::new(&core, temp_dir.path().join("proj"));
        let mut loader = ModuleLoader::new(config, registry_with(&["log"]));

        match loader.import("log", call_site!()) {
            Err(ModuleError::LoadFailed { name, source, .. }) => {
                assert_eq!(name, "log");
                assert!(matches!(*source, ModuleError::UnknownImplementation { .. }));
            }
            other => panic!("expected LoadFailed, got {:?}", other.err()),
        }

        // Pre-registered entry stays, no handle is published
        assert!(loader.ledger().contains("log"));
        assert!(loader.module("log").is_none());
        assert!(!loader.is_loading("log"));
        assert!(loader.has_failed("log"));

        // Asking again reports the failure instead of a loaded module
        match loader.import("log", call_site!()) {
            Err(ModuleError::LoadFailed { name, source, .. }) => {
                assert_eq!(name, "log");
                assert!(matches!(*source, ModuleError::FailedEarlier { .. }));
            }
            other => panic!("expected LoadFailed, got {:?}", other.err()),
        }
        assert!(matches!(
            loader.require("log", call_site!()),
            Err(ModuleError::LoadFailed { .. })
        ));
        assert_eq!(loader.ledger().len(), 1);
    }

    #[test]
    fn test_bad_manifest_is_load_failure() {
        let temp_dir = TempDir::new().unwrap();
        let core = temp_dir.path().join("core");
        create_module_file(&core, "log", "imports = [");

        let config = ModuleConfig::new(&core, temp_dir.path().join("proj"));
        let mut loader = ModuleLoader::new(config, registry_with(&["log"]));

        match loader.import("log", call_site!()) {
            Err(ModuleError::LoadFailed { source, .. }) => {
                assert!(matches!(*source, ModuleError::ManifestError { .. }));
            }
            other => panic!("expected LoadFailed, got {:?}", other.err()),
        }
    }

    #[test]
    fn test_nested_missing_module_keeps_trace() {
        let temp_dir = TempDir::new().unwrap();
        let core = temp_dir.path().join("core");
        create_module_file(&core, "app", "imports = [\"ghost\"]");

        let config = ModuleConfig::new(&core, temp_dir.path().join("proj"));
        let mut loader = ModuleLoader::new(config, registry_with(&["app"]));

        match loader.import("app", CallSite::descriptor("cli")) {
            Err(ModuleError::ModuleNotFound { name, trace }) => {
                assert_eq!(name, "ghost");
                let names: Vec<_> = trace.frames().iter().map(|f| f.name.as_str()).collect();
                assert_eq!(names, vec!["app", "ghost"]);
                assert_eq!(trace.frames()[0].caller, CallSite::descriptor("cli"));
            }
            other => panic!("expected ModuleNotFound, got {:?}", other.err()),
        }
        assert!(!loader.ledger().contains("ghost"));
    }

    #[test]
    fn test_context_restored_after_failure() {
        let temp_dir = TempDir::new().unwrap();
        let proj = temp_dir.path().join("proj");
        create_module_file(&proj, "plugins/p/lib/broken", "imports = [\"ghost\"]");

        let config = ModuleConfig::new(temp_dir.path().join("core"), &proj);
        let mut loader = ModuleLoader::new(config.clone(), registry_with(&["p/broken"]));

        assert!(loader.import("p/broken", call_site!()).is_err());
        assert_eq!(loader.context(), &config.project_context());
    }

    #[test]
    fn test_core_under_plugins_component_is_not_a_plugin() {
        let temp_dir = TempDir::new().unwrap();
        let core = temp_dir.path().join("plugins/fw/core");
        let proj = temp_dir.path().join("proj");
        let log = create_module_file(&core, "log", "imports = [\"util\"]");
        let util = create_module_file(&proj, "bin/lib/util", "");

        let config = ModuleConfig::new(&core, &proj);
        let mut loader = ModuleLoader::new(config, registry_with(&["log", "util"]));

        loader.import("log", call_site!()).unwrap();

        let entries: Vec<_> = loader
            .ledger()
            .iter()
            .map(|e| (e.name.clone(), e.file.clone()))
            .collect();
        assert_eq!(entries, vec![("log".to_string(), log), ("util".to_string(), util)]);
    }

    #[test]
    fn test_plugin_module_named_lib_keeps_plugin_context() {
        let temp_dir = TempDir::new().unwrap();
        let proj = temp_dir.path().join("proj");
        create_module_file(&proj, "plugins/p/lib/lib", "imports = [\"util\"]");
        let own = create_module_file(&proj, "plugins/p/bin/lib/util", "");
        create_module_file(&proj, "bin/lib/util", "");

        let config = ModuleConfig::new(temp_dir.path().join("core"), &proj);
        let mut loader = ModuleLoader::new(config, registry_with(&["p/lib", "p/util"]));

        loader.import("p/lib", call_site!()).unwrap();

        let names: Vec<_> = loader.ledger().iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["p/lib", "p/util"]);
        assert_eq!(loader.ledger().lookup("p/util").unwrap().file, own);
        assert!(loader.ledger().collisions().is_empty());
    }
}
