//! Entitlement configuration.

/// Configuration for entitlement evaluation.
///
/// Passed in at construction rather than read from a module constant,
/// so evaluators with different settings can coexist (and be tested)
/// in one process.
#[derive(Debug, Clone)]
pub struct EntitlementConfig {
    /// Days of continued access after `current_period_end` for a
    /// past-due subscription (default: 3).
    pub grace_period_days: i64,
}

impl Default for EntitlementConfig {
    fn default() -> Self {
        Self {
            grace_period_days: 3,
        }
    }
}
