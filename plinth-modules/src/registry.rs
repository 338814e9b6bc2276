//! Compiled module implementations
//!
//! A module file only says *which* implementation to activate. The
//! implementations themselves are registered up front in a
//! [`ModuleRegistry`], and activation hands back an `Arc<dyn Module>`.

use crate::loader::ImportScope;
use crate::{ModuleError, Result};
use rustc_hash::FxHashMap;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// An activated module
pub trait Module: Send + Sync {
    /// Canonical name the module was loaded under
    fn name(&self) -> &str;

    /// Names of the operations this module exposes, sorted
    fn exports(&self) -> Vec<String>;

    /// Invoke an exported operation
    fn call(&self, export: &str, args: &[Value]) -> Result<Value>;
}

/// Produces a module when its file is loaded.
///
/// Activation runs after the module has been recorded in the ledger, so
/// imports made through `scope` that lead back to this module are no-ops.
pub trait ModuleFactory: Send + Sync {
    fn activate(&self, scope: &mut ImportScope<'_>) -> Result<Arc<dyn Module>>;
}

impl<F> ModuleFactory for F
where
    F: Fn(&mut ImportScope<'_>) -> Result<Arc<dyn Module>> + Send + Sync,
{
    fn activate(&self, scope: &mut ImportScope<'_>) -> Result<Arc<dyn Module>> {
        self(scope)
    }
}

/// Registry of module implementations keyed by implementation name
#[derive(Clone, Default)]
pub struct ModuleRegistry {
    factories: FxHashMap<String, Arc<dyn ModuleFactory>>,
}

impl ModuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `factory` under `key`, replacing any previous registration
    pub fn register(&mut self, key: impl Into<String>, factory: impl ModuleFactory + 'static) -> &mut Self {
        self.factories.insert(key.into(), Arc::new(factory));
        self
    }

    /// Register a closure as the factory for `key`
    pub fn register_fn<F>(&mut self, key: impl Into<String>, activate: F) -> &mut Self
    where
        F: Fn(&mut ImportScope<'_>) -> Result<Arc<dyn Module>> + Send + Sync + 'static,
    {
        self.factories.insert(key.into(), Arc::new(activate));
        self
    }

    pub fn get(&self, key: &str) -> Option<Arc<dyn ModuleFactory>> {
        self.factories.get(key).cloned()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.factories.contains_key(key)
    }

    /// Registered keys, sorted
    pub fn keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        keys.sort_unstable();
        keys
    }
}

impl fmt::Debug for ModuleRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleRegistry").field("keys", &self.keys()).finish()
    }
}

type NativeFn = Arc<dyn Fn(&[Value]) -> Result<Value> + Send + Sync>;

/// A module built from plain functions
#[derive(Clone)]
pub struct NativeModule {
    name: String,
    functions: FxHashMap<String, NativeFn>,
}

impl NativeModule {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            functions: FxHashMap::default(),
        }
    }

    /// Add an exported operation
    pub fn export<F>(mut self, name: impl Into<String>, function: F) -> Self
    where
        F: Fn(&[Value]) -> Result<Value> + Send + Sync + 'static,
    {
        self.functions.insert(name.into(), Arc::new(function));
        self
    }

    pub fn into_module(self) -> Arc<dyn Module> {
        Arc::new(self)
    }
}

impl Module for NativeModule {
    fn name(&self) -> &str {
        &self.name
    }

    fn exports(&self) -> Vec<String> {
        let mut exports: Vec<String> = self.functions.keys().cloned().collect();
        exports.sort_unstable();
        exports
    }

    fn call(&self, export: &str, args: &[Value]) -> Result<Value> {
        let function = self.functions.get(export).ok_or_else(|| ModuleError::ExportNotFound {
            name: export.to_string(),
            module: self.name.clone(),
        })?;
        function(args)
    }
}

impl fmt::Debug for NativeModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeModule")
            .field("name", &self.name)
            .field("exports", &self.exports())
            .finish()
    }
}
