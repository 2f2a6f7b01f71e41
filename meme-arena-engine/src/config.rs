//! Configuration types for the `ArenaService`.
use crate::daily::DailySelectionPolicy;

/// Default upper bound on a meme's media size: 50 MiB.
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 50 * 1024 * 1024;

/// Default number of vote events buffered per live subscriber.
pub const DEFAULT_EVENT_CHANNEL_CAPACITY: usize = 256;

/// Configuration for the `ArenaService`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Largest accepted media size, in bytes.
    pub max_upload_bytes: u64,
    /// What the item of the day does when its cached meme has been deleted.
    pub daily_selection_policy: DailySelectionPolicy,
    /// Capacity of the vote event broadcast channel.
    pub event_channel_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            daily_selection_policy: DailySelectionPolicy::default(),
            event_channel_capacity: DEFAULT_EVENT_CHANNEL_CAPACITY,
        }
    }
}
