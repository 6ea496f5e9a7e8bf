//! `[watch]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [watch]
//! poll = true          # Polling works on filesystems without change notifications
//! interval_ms = 100    # Poll interval
//! debounce_ms = 200    # Quiet period before a batch of changes is processed
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::{ConfigDiagnostics, FieldPath};

/// File watcher settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchConfig {
    pub poll: bool,
    pub interval_ms: u64,
    pub debounce_ms: u64,
}

impl WatchConfig {
    pub const INTERVAL_MS: FieldPath = FieldPath::new("watch.interval_ms");

    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub(crate) fn validate(&self, diag: &mut ConfigDiagnostics) {
        if self.poll && self.interval_ms == 0 {
            diag.error(Self::INTERVAL_MS, "poll interval must be positive");
        }
    }
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            poll: true,
            interval_ms: 100,
            debounce_ms: 200,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use crate::config::test_parse_config;

    #[test]
    fn test_watch_defaults() {
        let config = test_parse_config("");
        assert!(config.watch.poll);
        assert_eq!(config.watch.interval(), Duration::from_millis(100));
    }

    #[test]
    fn test_watch_native() {
        let config = test_parse_config("[watch]\npoll = false\ndebounce_ms = 50");
        assert!(!config.watch.poll);
        assert_eq!(config.watch.debounce(), Duration::from_millis(50));
    }
}
