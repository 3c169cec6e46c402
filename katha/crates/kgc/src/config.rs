//! Configuration Module - GC Tuning Parameters
//!
//! Collection cadence is controlled by a byte threshold: allocation
//! past the threshold arms the collector, and after every cycle the
//! threshold is recomputed from the surviving heap.

/// Tuning parameters for the Katha collector.
///
/// # Examples
///
/// ```
/// use kgc::GcConfig;
///
/// // Defaults
/// let config = GcConfig::default();
///
/// // Stress configuration for shaking out missing roots
/// let config = GcConfig {
///     stress: true,
///     ..Default::default()
/// };
/// ```
#[derive(Clone, Copy, Debug)]
pub struct GcConfig {
    /// Allocation threshold that arms the first collection, in bytes.
    ///
    /// Default: 1 MiB.
    pub initial_threshold: usize,

    /// After a collection the next threshold becomes
    /// `max(live_bytes * growth_factor, min_threshold)`.
    ///
    /// Default: 2.0.
    pub growth_factor: f64,

    /// Lower bound for the recomputed threshold, so tiny heaps do
    /// not collect on every other allocation.
    ///
    /// Default: 1 MiB.
    pub min_threshold: usize,

    /// Collect at every safepoint regardless of the threshold.
    /// Debug aid: exposes values that were never reachable from a
    /// registered root.
    ///
    /// Default: false.
    pub stress: bool,
}

impl Default for GcConfig {
    fn default() -> Self {
        Self {
            initial_threshold: 1024 * 1024,
            growth_factor: 2.0,
            min_threshold: 1024 * 1024,
            stress: false,
        }
    }
}
