//! Vendor category discovery by probing the atrace HAL
//!
//! The HAL knows category names but not which tracepoints back them. We
//! find out by enabling one category at a time from a clean tracefs
//! baseline and reading back what the kernel turned on:
//!
//! ```text
//! for category in hal.list_categories():
//!   1. ResetBefore           tracefs  events/enable ← "0"
//!   2. EnableCategory        hal      enable_categories([category])
//!   3. ReadEnabledEvents     tracefs  set_event → [group/name, ...]
//!   4. DisableAllCategories  hal      disable_all_categories()
//!   5. ResetAfter            tracefs  events/enable ← "0"
//! ```
//!
//! Steps 4 and 5 run from guard destructors, so they still happen when a
//! cycle bails out early or unwinds. tracefs is global kernel state: the
//! caller must make sure nothing else touches it while probing.
//!
//! # Failure policy
//!
//! | Step fails            | Effect                                        |
//! |-----------------------|-----------------------------------------------|
//! | ResetBefore           | abort, return categories probed so far        |
//! | EnableCategory        | skip this category (steps 4 and 5 still run)  |
//! | ReadEnabledEvents     | malformed entries are skipped                 |
//! | DisableAllCategories  | warn and continue                             |
//! | ResetAfter            | warn and continue (next ResetBefore rechecks) |

use std::path::PathBuf;

use tracing::{debug, error, info, warn};

use crate::categories::CategoryMap;
use crate::hal::AtraceHal;
use crate::metrics::PROBE_FAILURES;
use crate::tracefs::Tracefs;
use crate::tracepoint::Tracepoint;

/// One step of a probe cycle, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeStep {
    ResetBefore,
    EnableCategory,
    ReadEnabledEvents,
    DisableAllCategories,
    ResetAfter,
}

impl ProbeStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProbeStep::ResetBefore => "reset_before",
            ProbeStep::EnableCategory => "enable_category",
            ProbeStep::ReadEnabledEvents => "read_enabled_events",
            ProbeStep::DisableAllCategories => "disable_all_categories",
            ProbeStep::ResetAfter => "reset_after",
        }
    }
}

/// Why a single probe cycle stopped early
#[derive(Debug)]
pub enum ProbeError {
    /// tracefs could not be reset to the disabled baseline
    ResetFailed { path: PathBuf },
    /// The HAL refused to enable the category
    EnableFailed { category: String },
}

impl std::fmt::Display for ProbeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProbeError::ResetFailed { path } => {
                write!(f, "Failed to disable tracepoints via {}", path.display())
            }
            ProbeError::EnableFailed { category } => {
                write!(f, "HAL failed to enable category {}", category)
            }
        }
    }
}

impl std::error::Error for ProbeError {}

fn step_failed(step: ProbeStep, category: &str) {
    warn!(step = step.as_str(), category, "Probe step failed");
    PROBE_FAILURES.with_label_values(&[step.as_str()]).inc();
}

/// Holds tracefs at the all-disabled baseline for the lifetime of a cycle.
///
/// `engage` is step 1, `Drop` is step 5.
struct EventsDisabled<'a> {
    tracefs: &'a dyn Tracefs,
    category: &'a str,
}

impl<'a> EventsDisabled<'a> {
    fn engage(tracefs: &'a dyn Tracefs, category: &'a str) -> Result<Self, ProbeError> {
        if !tracefs.disable_all_events() {
            step_failed(ProbeStep::ResetBefore, category);
            return Err(ProbeError::ResetFailed {
                path: tracefs.events_enable_path(),
            });
        }
        Ok(Self { tracefs, category })
    }
}

impl Drop for EventsDisabled<'_> {
    fn drop(&mut self) {
        if !self.tracefs.disable_all_events() {
            step_failed(ProbeStep::ResetAfter, self.category);
        }
    }
}

/// One HAL category enabled; `Drop` is step 4.
struct HalCategoryEnabled<'a> {
    hal: &'a dyn AtraceHal,
    category: &'a str,
}

impl<'a> HalCategoryEnabled<'a> {
    fn engage(hal: &'a dyn AtraceHal, category: &'a str) -> Result<Self, ProbeError> {
        // Armed before enabling: a failed enable may still have switched
        // part of the category on.
        let guard = Self { hal, category };
        if !hal.enable_categories(&[category.to_string()]) {
            step_failed(ProbeStep::EnableCategory, category);
            return Err(ProbeError::EnableFailed {
                category: category.to_string(),
            });
        }
        Ok(guard)
    }
}

impl Drop for HalCategoryEnabled<'_> {
    fn drop(&mut self) {
        if !self.hal.disable_all_categories() {
            step_failed(ProbeStep::DisableAllCategories, self.category);
        }
    }
}

/// Run one probe cycle for `category`, appending what it enabled to `out`.
///
/// Returns the number of tracepoints recorded. A category that enables no
/// events is still recorded, with an empty list.
pub fn probe_category(
    hal: &dyn AtraceHal,
    tracefs: &dyn Tracefs,
    category: &str,
    out: &mut CategoryMap,
) -> Result<usize, ProbeError> {
    let baseline = EventsDisabled::engage(tracefs, category)?;
    let enabled = HalCategoryEnabled::engage(hal, category)?;
    let events = tracefs.read_enabled_events();
    drop(enabled);
    drop(baseline);

    let tracepoints = out.entry(category);
    let before = tracepoints.len();
    for event in &events {
        match Tracepoint::from_path(event) {
            Some(tp) => tracepoints.push(tp),
            None => {
                warn!(category, event = %event, "Ignoring malformed enabled event");
                PROBE_FAILURES
                    .with_label_values(&[ProbeStep::ReadEnabledEvents.as_str()])
                    .inc();
            }
        }
    }
    Ok(tracepoints.len() - before)
}

/// Discover the tracepoints behind every HAL category.
///
/// Categories appear in the order `list_categories` reports them; a name
/// reported twice is probed twice and its events appended.
pub fn probe(hal: &dyn AtraceHal, tracefs: &dyn Tracefs) -> CategoryMap {
    let categories = hal.list_categories();
    info!(
        categories = categories.len(),
        tracefs = %tracefs.root().display(),
        "Probing vendor atrace categories"
    );

    let mut out = CategoryMap::new();
    for category in &categories {
        match probe_category(hal, tracefs, category, &mut out) {
            Ok(count) => debug!(category = %category, tracepoints = count, "Probed category"),
            Err(ProbeError::EnableFailed { .. }) => {
                debug!(category = %category, "Skipping category");
            }
            Err(e @ ProbeError::ResetFailed { .. }) => {
                error!(error = %e, category = %category, "Aborting vendor category probe");
                break;
            }
        }
    }
    out
}
