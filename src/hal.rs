//! Vendor atrace HAL binding
//!
//! The HAL can switch vendor categories on and off at the kernel level but
//! cannot say which tracepoints a category maps to. The prober recovers
//! that by watching tracefs while toggling one category at a time.
//!
//! The binding itself is vendor-provided; this crate only consumes it
//! through `AtraceHal`, so tests can substitute a fake.

/// Capability interface over the vendor atrace HAL
pub trait AtraceHal {
    /// Category names the vendor supports, in HAL order
    fn list_categories(&self) -> Vec<String>;

    /// Enable exactly the given categories. Returns `false` on failure.
    fn enable_categories(&self, categories: &[String]) -> bool;

    /// Disable every vendor category. Returns `false` on failure.
    fn disable_all_categories(&self) -> bool;
}
