//! Loader shared between threads

use crate::call_site::CallSite;
use crate::ledger::ImportLedger;
use crate::loader::ModuleLoader;
use crate::registry::Module;
use crate::Result;
use parking_lot::Mutex;
use std::sync::Arc;

/// A [`ModuleLoader`] behind one lock.
///
/// The lock is held for a whole import request, nested imports included,
/// so the check-then-record step of one request never interleaves with
/// another.
#[derive(Clone)]
pub struct SharedLoader {
    inner: Arc<Mutex<ModuleLoader>>,
}

impl SharedLoader {
    pub fn new(loader: ModuleLoader) -> Self {
        Self {
            inner: Arc::new(Mutex::new(loader)),
        }
    }

    pub fn import_all<S: AsRef<str>>(&self, names: &[S], caller: CallSite) -> Result<()> {
        self.inner.lock().import_all(names, caller)
    }

    pub fn require(&self, name: &str, caller: CallSite) -> Result<Arc<dyn Module>> {
        self.inner.lock().require(name, caller)
    }

    pub fn module(&self, name: &str) -> Option<Arc<dyn Module>> {
        self.inner.lock().module(name)
    }

    /// Copy of the ledger as it is now
    pub fn ledger(&self) -> ImportLedger {
        self.inner.lock().ledger().clone()
    }

    /// Run `f` with exclusive access to the loader
    pub fn with<R>(&self, f: impl FnOnce(&mut ModuleLoader) -> R) -> R {
        f(&mut self.inner.lock())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{ModuleRegistry, NativeModule};
    use crate::ModuleConfig;
    use std::fs;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;
    use tempfile::TempDir;

    #[test]
    fn test_concurrent_imports_activate_once() {
        let temp_dir = TempDir::new().unwrap();
        let core = temp_dir.path().join("core");
        fs::create_dir_all(&core).unwrap();
        fs::write(core.join("log"), "").unwrap();

        let activations = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&activations);
        let mut registry = ModuleRegistry::new();
        registry.register_fn("log", move |scope| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(NativeModule::new(scope.module_name()).into_module())
        });

        let config = ModuleConfig::new(&core, temp_dir.path());
        let shared = SharedLoader::new(ModuleLoader::new(config, registry));

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let shared = shared.clone();
                thread::spawn(move || {
                    shared
                        .import_all(&["log"], CallSite::descriptor(format!("worker-{}", i)))
                        .unwrap();
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(activations.load(Ordering::SeqCst), 1);
        assert_eq!(shared.ledger().len(), 1);
        assert!(shared.module("log").is_some());
        assert_eq!(shared.with(|loader| loader.ledger().len()), 1);
    }

    #[test]
    fn test_failed_load_fails_every_caller() {
        let temp_dir = TempDir::new().unwrap();
        let core = temp_dir.path().join("core");
        fs::create_dir_all(&core).unwrap();
        fs::write(core.join("log"), "implementation = \"missing\"").unwrap();

        let config = ModuleConfig::new(&core, temp_dir.path());
        let shared = SharedLoader::new(ModuleLoader::new(config, ModuleRegistry::new()));

        let handles: Vec<_> = (0..4)
            .map(|i| {
                let shared = shared.clone();
                thread::spawn(move || {
                    shared.import_all(&["log"], CallSite::descriptor(format!("worker-{}", i)))
                })
            })
            .collect();
        for handle in handles {
            let result = handle.join().unwrap();
            assert!(matches!(result, Err(crate::ModuleError::LoadFailed { .. })));
        }

        assert_eq!(shared.ledger().len(), 1);
        assert!(shared.module("log").is_none());
    }
}
