//! Configuration for the Ordering Gate

use serde::{Deserialize, Serialize};

/// Ordering gate configuration
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrderingGateConfig {
    /// Initial token value. `true` lets the first proposal through without
    /// a commit; `false` waits for an external first unlock.
    pub start_unlocked: bool,
    /// Buffered proposal count at which growth is reported with `warn!`.
    /// The buffer itself stays unbounded.
    pub buffer_warn_threshold: usize,
}

impl Default for OrderingGateConfig {
    fn default() -> Self {
        Self {
            start_unlocked: true,
            buffer_warn_threshold: 100,
        }
    }
}
