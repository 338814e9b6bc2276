//! Plinth module system
//!
//! Resolves short module names to files across layered search locations,
//! loads each module once per loader and reports name collisions:
//! - Path lookup across test, core, project and plugin libraries
//! - Canonical `<plugin>/<module>` names for plugin modules
//! - An append-only import ledger with collision history
//! - Activation of compiled module implementations

pub mod call_site;
pub mod config;
pub mod error;
pub mod ledger;
pub mod loader;
pub mod locator;
pub mod manifest;
pub mod plugin;
pub mod registry;
pub mod shared;

pub use call_site::{CallSite, ImportTrace, TraceFrame};
pub use config::{ModuleConfig, ProjectContext};
pub use error::{ModuleError, Result};
pub use ledger::{Collision, ImportLedger, LedgerEntry};
pub use loader::{ImportScope, ModuleLoader};
pub use locator::{LocationKind, PathLocator, SearchLocation};
pub use manifest::ModuleManifest;
pub use plugin::PluginIdentity;
pub use registry::{Module, ModuleFactory, ModuleRegistry, NativeModule};
pub use shared::SharedLoader;
