//! Collection statistics.

use std::fmt;

/// Counters accumulated across collection cycles.
#[derive(Clone, Copy, Debug, Default)]
pub struct GcStats {
    /// Completed mark-sweep cycles.
    pub cycles: u64,
    /// Objects freed over all cycles.
    pub objects_freed: u64,
    /// Environment frames freed over all cycles.
    pub envs_freed: u64,
    /// Approximate live bytes after the last cycle.
    pub live_bytes: usize,
}

impl fmt::Display for GcStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "cycles: {}, objects freed: {}, envs freed: {}, live: {} bytes",
            self.cycles, self.objects_freed, self.envs_freed, self.live_bytes
        )
    }
}
