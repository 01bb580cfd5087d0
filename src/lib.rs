//! vendor-tracepoints - discover the kernel tracepoints behind vendor atrace categories
//!
//! Vendors group kernel tracepoints into named categories ("gfx",
//! "memory", ...). Before a trace session can enable a category it has to
//! know which `group/name` tracepoints it stands for. There are two ways to
//! find out:
//!
//! - parse the static manifest the vendor installs (`manifest`)
//! - probe the vendor atrace HAL one category at a time while watching
//!   tracefs (`probe`)
//!
//! Both produce a `CategoryMap`; `discovery::discover` chooses between them.
//!
//! # Modules
//!
//! - `tracepoint` - `group/name` identifier
//! - `categories` - ordered category → tracepoints map
//! - `manifest` - static manifest parser
//! - `hal` - atrace HAL capability trait
//! - `tracefs` - tracefs capability trait and the real mount
//! - `probe` - HAL probing sequence
//! - `discovery` - session-setup entry point and configuration
//! - `metrics` - Prometheus metrics for discovery
//! - `tracing` - logging and OTLP initialization
//!
//! # Quick Start
//!
//! ```ignore
//! use vendor_tracepoints::{discover, DiscoveryConfig};
//!
//! let config = DiscoveryConfig::default();
//! let tracefs = config.open_tracefs();
//! let discovery = discover(&config, Some(&hal), tracefs.as_ref().map(|t| t as _));
//!
//! let events = discovery.categories.resolve(&["gfx"]).tracepoints;
//! ```

pub mod categories;
pub mod discovery;
pub mod hal;
pub mod manifest;
pub mod metrics;
pub mod probe;
pub mod tracefs;
pub mod tracepoint;
pub mod tracing;

// Re-export commonly used types at crate root for convenience
pub use categories::{CategoryMap, Resolved};
pub use discovery::{discover, Discovery, DiscoveryConfig, DiscoverySource};
pub use hal::AtraceHal;
pub use manifest::ManifestError;
pub use tracefs::{Tracefs, TracefsDir};
pub use tracepoint::Tracepoint;
