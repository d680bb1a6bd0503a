//! Cache configuration.

use std::num::NonZeroUsize;
use std::time::Duration;

use crate::config::CacheSettings;

const DEFAULT_TTL: Duration = Duration::from_secs(10);
const DEFAULT_MAX_ENTRIES: usize = 1000;

/// Tuning knobs for the listing cache.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Uniform lifetime applied to every entry.
    pub ttl: Duration,
    /// Maximum number of entries held at once.
    pub max_entries: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: DEFAULT_TTL,
            max_entries: DEFAULT_MAX_ENTRIES,
        }
    }
}

impl From<&CacheSettings> for CacheConfig {
    fn from(settings: &CacheSettings) -> Self {
        Self {
            ttl: settings.ttl,
            max_entries: settings.max_entries.get(),
        }
    }
}

impl CacheConfig {
    /// Returns the entry bound as NonZeroUsize, clamping to 1 if zero.
    pub fn max_entries_non_zero(&self) -> NonZeroUsize {
        NonZeroUsize::new(self.max_entries).unwrap_or(NonZeroUsize::MIN)
    }
}
