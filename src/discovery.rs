//! Vendor category discovery at trace-session setup
//!
//! Picks one of the two discovery mechanisms:
//!
//! ```text
//! manifest file exists?
//! ├── yes → parse it
//! │         ├── ok    → categories from the manifest
//! │         └── error → empty result + error text
//! │                     (or HAL probing when `fallback_to_hal` is set)
//! └── no  → probe the HAL through tracefs (when both are available)
//! ```
//!
//! A broken manifest never contributes partial categories, and nothing here
//! panics: the worst outcome is an empty map.

use std::path::PathBuf;
use std::time::Instant;

use serde::Serialize;
use tracing::{debug, error, info, info_span};
use uuid::Uuid;

use crate::categories::CategoryMap;
use crate::hal::AtraceHal;
use crate::manifest;
use crate::metrics::{self, DISCOVERY_DURATION, MANIFEST_ERRORS};
use crate::probe;
use crate::tracefs::{Tracefs, TracefsDir};

/// Where vendors install the static category manifest
pub const DEFAULT_MANIFEST_PATH: &str = "/vendor/etc/atrace/atrace_categories.txt";

/// Configuration for a discovery run
#[derive(Debug, Clone)]
pub struct DiscoveryConfig {
    /// Static manifest; HAL probing is used when it does not exist
    pub manifest_path: PathBuf,
    /// tracefs mount point (None = look in the standard locations)
    pub tracefs_root: Option<PathBuf>,
    /// Probe the HAL when the manifest exists but fails to parse
    pub fallback_to_hal: bool,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            manifest_path: PathBuf::from(DEFAULT_MANIFEST_PATH),
            tracefs_root: None,
            fallback_to_hal: false,
        }
    }
}

impl DiscoveryConfig {
    /// Open the configured tracefs, or locate one if no root is set.
    pub fn open_tracefs(&self) -> Option<TracefsDir> {
        match &self.tracefs_root {
            Some(root) => Some(TracefsDir::new(root)),
            None => TracefsDir::locate(),
        }
    }
}

/// Which mechanism produced the categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DiscoverySource {
    Manifest,
    Hal,
    /// Neither a manifest nor a usable HAL was available
    None,
}

impl DiscoverySource {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiscoverySource::Manifest => "manifest",
            DiscoverySource::Hal => "hal",
            DiscoverySource::None => "none",
        }
    }
}

/// Outcome of a discovery run
#[derive(Debug, Clone, Serialize)]
pub struct Discovery {
    /// Time-sortable id tagging this run's logs
    pub run_id: String,
    pub source: DiscoverySource,
    pub categories: CategoryMap,
    /// Set when the manifest existed but was rejected
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manifest_error: Option<String>,
}

/// Discover vendor categories using the manifest or, failing that, the HAL.
pub fn discover(
    config: &DiscoveryConfig,
    hal: Option<&dyn AtraceHal>,
    tracefs: Option<&dyn Tracefs>,
) -> Discovery {
    let run_id = Uuid::now_v7().to_string();
    let span = info_span!("vendor_discovery", run_id = %run_id);
    let _enter = span.enter();
    let started = Instant::now();

    let mut discovery = Discovery {
        run_id,
        source: DiscoverySource::None,
        categories: CategoryMap::new(),
        manifest_error: None,
    };

    let manifest_path = &config.manifest_path;
    if manifest_path.exists() {
        match manifest::parse(manifest_path) {
            Ok(categories) => {
                discovery.source = DiscoverySource::Manifest;
                discovery.categories = categories;
            }
            Err(e) => {
                error!(
                    path = %manifest_path.display(),
                    error = %e,
                    "Cannot load vendor categories"
                );
                MANIFEST_ERRORS.with_label_values(&[e.kind()]).inc();
                discovery.source = DiscoverySource::Manifest;
                discovery.manifest_error = Some(e.to_string());

                if config.fallback_to_hal {
                    probe_into(hal, tracefs, &mut discovery);
                }
            }
        }
    } else {
        debug!(path = %manifest_path.display(), "No vendor manifest");
        probe_into(hal, tracefs, &mut discovery);
    }

    if discovery.source != DiscoverySource::None {
        metrics::record_discovered(
            discovery.source.as_str(),
            discovery.categories.len(),
            discovery.categories.tracepoint_count(),
        );
    }
    DISCOVERY_DURATION.set(started.elapsed().as_secs_f64());

    info!(
        source = discovery.source.as_str(),
        categories = discovery.categories.len(),
        tracepoints = discovery.categories.tracepoint_count(),
        "Vendor category discovery complete"
    );
    discovery
}

fn probe_into(
    hal: Option<&dyn AtraceHal>,
    tracefs: Option<&dyn Tracefs>,
    discovery: &mut Discovery,
) {
    match (hal, tracefs) {
        (Some(hal), Some(tracefs)) => {
            discovery.categories = probe::probe(hal, tracefs);
            discovery.source = DiscoverySource::Hal;
        }
        (None, _) => info!("No atrace HAL binding; skipping vendor category probe"),
        (_, None) => info!("No tracefs mount; skipping vendor category probe"),
    }
}
