//! Import ledger

use crate::call_site::CallSite;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// A module that has been imported
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    /// Name the module is known by (canonical for plugin modules)
    pub name: String,

    /// File it resolved to
    pub file: PathBuf,

    /// Who imported it first
    pub caller: CallSite,
}

/// Two different files claiming the same module name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Collision {
    pub name: String,
    pub first_file: PathBuf,
    pub first_caller: CallSite,
    pub new_file: PathBuf,
    pub new_caller: CallSite,
}

/// Append-only record of imports, in import order.
///
/// Holds at most one entry per name. Collisions never replace an entry;
/// they are kept in a separate history.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ImportLedger {
    entries: Vec<LedgerEntry>,

    #[serde(skip)]
    index: FxHashMap<String, usize>,

    collisions: Vec<Collision>,
}

impl ImportLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Entry recorded for `name`
    pub fn lookup(&self, name: &str) -> Option<&LedgerEntry> {
        self.index.get(name).map(|&idx| &self.entries[idx])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Record an import. Returns `false` and leaves the ledger untouched if
    /// `name` is already recorded.
    pub fn record(&mut self, name: impl Into<String>, file: impl Into<PathBuf>, caller: CallSite) -> bool {
        let name = name.into();
        if self.index.contains_key(&name) {
            return false;
        }

        self.index.insert(name.clone(), self.entries.len());
        self.entries.push(LedgerEntry {
            name,
            file: file.into(),
            caller,
        });
        true
    }

    /// Record that `name` resolved to `new_file` while another file is
    /// already recorded. Returns `None` if `name` is not recorded or the
    /// file is the same.
    pub fn record_collision(&mut self, name: &str, new_file: &Path, new_caller: CallSite) -> Option<&Collision> {
        let first = self.lookup(name)?;
        if first.file == new_file {
            return None;
        }

        let collision = Collision {
            name: name.to_string(),
            first_file: first.file.clone(),
            first_caller: first.caller.clone(),
            new_file: new_file.to_path_buf(),
            new_caller,
        };
        self.collisions.push(collision);
        self.collisions.last()
    }

    /// All entries in import order
    pub fn entries(&self) -> &[LedgerEntry] {
        &self.entries
    }

    /// Collision history in detection order
    pub fn collisions(&self) -> &[Collision] {
        &self.collisions
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &LedgerEntry> {
        self.entries.iter()
    }
}
