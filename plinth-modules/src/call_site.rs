//! Call-site tokens and import traces

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Identifies the code that requested an import.
///
/// Callers construct one explicitly, usually with [`call_site!`](crate::call_site!),
/// instead of the loader walking the call stack.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CallSite {
    /// Source file of the importer
    pub file: String,

    /// Line of the import request, 0 when unknown
    pub line: u32,

    /// Enclosing routine or module path
    pub routine: String,
}

impl CallSite {
    /// Create a call site from its parts
    pub fn new(file: impl Into<String>, line: u32, routine: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            line,
            routine: routine.into(),
        }
    }

    /// A call site known only by a short descriptor, e.g. `"cli"`
    pub fn descriptor(descriptor: impl Into<String>) -> Self {
        Self::new(descriptor, 0, "")
    }
}

impl fmt::Display for CallSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.routine.is_empty(), self.line) {
            (true, 0) => write!(f, "{}", self.file),
            (true, line) => write!(f, "{}:{}", self.file, line),
            (false, 0) => write!(f, "{} ({})", self.routine, self.file),
            (false, line) => write!(f, "{} ({}:{})", self.routine, self.file, line),
        }
    }
}

/// Build a [`CallSite`] for the current source location.
///
/// ```
/// let site = plinth_modules::call_site!();
/// assert!(site.line > 0);
/// ```
#[macro_export]
macro_rules! call_site {
    () => {
        $crate::CallSite::new(file!(), line!(), module_path!())
    };
    ($routine:expr) => {
        $crate::CallSite::new(file!(), line!(), $routine)
    };
}

/// One import in progress
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceFrame {
    /// Module name
    pub name: String,

    /// Resolved file, if resolution got that far
    pub file: Option<PathBuf>,

    /// Who asked for it
    pub caller: CallSite,
}

/// Stack of imports that led to a failure, outermost first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportTrace {
    frames: Vec<TraceFrame>,
}

impl ImportTrace {
    /// Create a trace from frames ordered outermost first
    pub fn new(frames: Vec<TraceFrame>) -> Self {
        Self { frames }
    }

    /// Frames, outermost first
    pub fn frames(&self) -> &[TraceFrame] {
        &self.frames
    }

    /// The innermost frame, i.e. the import that failed
    pub fn innermost(&self) -> Option<&TraceFrame> {
        self.frames.last()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

// Printed innermost first, like a stack trace.
impl fmt::Display for ImportTrace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for frame in self.frames.iter().rev() {
            match &frame.file {
                Some(file) => write!(
                    f,
                    "\n    at {} ({}) imported from {}",
                    frame.name,
                    file.display(),
                    frame.caller
                )?,
                None => write!(f, "\n    at {} imported from {}", frame.name, frame.caller)?,
            }
        }
        Ok(())
    }
}
