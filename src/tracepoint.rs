//! Kernel tracepoint identifiers
//!
//! A tracepoint is named by the directory it lives in under
//! `<tracefs>/events/`:
//!
//! ```text
//! /sys/kernel/tracing/events/
//! ├── sched/                  ← group
//! │   ├── sched_switch/       ← name
//! │   └── sched_wakeup/
//! └── mali/
//!     └── mali_job_slots/
//! ```
//!
//! On the wire (manifest files, `set_event` read-back) the pair is written
//! as `group/name`.

use serde::{Serialize, Serializer};
use std::fmt;

/// One kernel event, identified by `(group, name)`.
///
/// Equality and ordering compare `group` first, then `name`, byte-wise.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Tracepoint {
    group: String,
    name: String,
}

impl Tracepoint {
    /// Build an identifier from already-split parts.
    ///
    /// Returns `None` if either part is empty.
    pub fn new(group: impl Into<String>, name: impl Into<String>) -> Option<Self> {
        let group = group.into();
        let name = name.into();
        if group.is_empty() || name.is_empty() {
            return None;
        }
        Some(Self { group, name })
    }

    /// Split a `group/name` string on its first `/`.
    ///
    /// Returns `None` when there is no `/` or either side is empty. Unlike
    /// the manifest parser this does not reject extra slashes: anything
    /// after the first one belongs to the name.
    pub fn from_path(path: &str) -> Option<Self> {
        let (group, name) = path.split_once('/')?;
        Self::new(group, name)
    }

    /// Event group, the directory under `events/`
    pub fn group(&self) -> &str {
        &self.group
    }

    /// Event name within its group
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for Tracepoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.group, self.name)
    }
}

/// Serialized in its `group/name` form
impl Serialize for Tracepoint {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
