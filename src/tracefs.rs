//! Kernel tracing filesystem (tracefs)
//!
//! ```text
//! /sys/kernel/tracing/            ← root (older kernels: /sys/kernel/debug/tracing/)
//! ├── trace                       ← ring buffer; used to recognise a mount
//! ├── set_event                   ← one "group:name" line per enabled event
//! └── events/
//!     ├── enable                  ← "0" disables every tracepoint
//!     └── <group>/<name>/enable
//! ```
//!
//! Discovery only needs two operations: write a control file and read back
//! which events are enabled. `Tracefs` is the seam that lets tests replace
//! the real filesystem.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use nix::unistd::{access, AccessFlags};
use tracing::{debug, warn};

/// Standard tracefs mount points, in preference order
pub const TRACEFS_MOUNT_POINTS: &[&str] = &["/sys/kernel/tracing/", "/sys/kernel/debug/tracing/"];

/// Capability interface over a mounted tracefs
pub trait Tracefs {
    /// Mount point of this tracefs instance
    fn root(&self) -> &Path;

    /// Write `contents` to the control file at `path`. Returns `false` on
    /// failure.
    fn write_file(&self, path: &Path, contents: &str) -> bool;

    /// Events currently enabled, each as `group/name`, in kernel order
    fn read_enabled_events(&self) -> Vec<String>;

    /// Global enable control, `<root>/events/enable`
    fn events_enable_path(&self) -> PathBuf {
        self.root().join("events/enable")
    }

    /// Disable every tracepoint by writing `"0"` to the global control.
    fn disable_all_events(&self) -> bool {
        self.write_file(&self.events_enable_path(), "0")
    }
}

/// tracefs mounted at a directory on the local system
#[derive(Debug, Clone)]
pub struct TracefsDir {
    root: PathBuf,
}

impl TracefsDir {
    /// Use the tracefs mounted at `root` without checking it.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Find the tracefs mount, trying `TRACEFS_MOUNT_POINTS` in order.
    ///
    /// A candidate is accepted when its `trace` file is readable by this
    /// process.
    pub fn locate() -> Option<Self> {
        TRACEFS_MOUNT_POINTS
            .iter()
            .map(Path::new)
            .find(|root| is_tracefs_root(root))
            .map(|root| {
                debug!(root = %root.display(), "Found tracefs mount");
                Self::new(root)
            })
    }
}

/// Whether `root` looks like an accessible tracefs mount
pub fn is_tracefs_root(root: &Path) -> bool {
    access(&root.join("trace"), AccessFlags::R_OK).is_ok()
}

impl Tracefs for TracefsDir {
    fn root(&self) -> &Path {
        &self.root
    }

    fn write_file(&self, path: &Path, contents: &str) -> bool {
        // Control files already exist; never create one by accident
        let result = OpenOptions::new()
            .write(true)
            .open(path)
            .and_then(|mut file| file.write_all(contents.as_bytes()));

        match result {
            Ok(()) => true,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "tracefs write failed");
                false
            }
        }
    }

    fn read_enabled_events(&self) -> Vec<String> {
        let path = self.root.join("set_event");
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "tracefs read failed");
                return Vec::new();
            }
        };

        content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(|line| line.replacen(':', "/", 1))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn fake_tracefs() -> (TempDir, TracefsDir) {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("events")).unwrap();
        fs::write(dir.path().join("events/enable"), "1").unwrap();
        fs::write(dir.path().join("trace"), "").unwrap();
        let tracefs = TracefsDir::new(dir.path());
        (dir, tracefs)
    }

    #[test]
    fn test_events_enable_path() {
        let tracefs = TracefsDir::new("/root/");
        assert_eq!(tracefs.events_enable_path(), Path::new("/root/events/enable"));
    }

    #[test]
    fn test_disable_all_events_writes_zero() {
        let (dir, tracefs) = fake_tracefs();
        assert!(tracefs.disable_all_events());
        let content = fs::read_to_string(dir.path().join("events/enable")).unwrap();
        assert_eq!(content, "0");
    }

    #[test]
    fn test_write_missing_file_fails_without_creating() {
        let (dir, tracefs) = fake_tracefs();
        let missing = dir.path().join("events/nope/enable");
        assert!(!tracefs.write_file(&missing, "1"));
        assert!(!missing.exists());
    }

    #[test]
    fn test_read_enabled_events_converts_separator() {
        let (dir, tracefs) = fake_tracefs();
        fs::write(
            dir.path().join("set_event"),
            "sched:sched_switch\n\nmali:mali_job_slots\n",
        )
        .unwrap();

        assert_eq!(
            tracefs.read_enabled_events(),
            vec!["sched/sched_switch".to_string(), "mali/mali_job_slots".to_string()]
        );
    }

    #[test]
    fn test_read_enabled_events_missing_file() {
        let (_dir, tracefs) = fake_tracefs();
        assert!(tracefs.read_enabled_events().is_empty());
    }

    #[test]
    fn test_is_tracefs_root() {
        let (dir, _tracefs) = fake_tracefs();
        assert!(is_tracefs_root(dir.path()));
        assert!(!is_tracefs_root(&dir.path().join("events")));
    }
}
