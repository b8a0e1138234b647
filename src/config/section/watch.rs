//! `[watch]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [watch]
//! enable = true                                   # Reload pages on change
//! extensions = ["html", "htm", "css", "js", "mjs"] # Changes that trigger a reload
//! debounce = 100                                  # Quiet period in ms
//! poll = false                                    # Poll instead of native events
//! poll_interval = 500                             # Poll period in ms
//! ```
//!
//! Set `poll = true` on network mounts and in containers where native
//! notifications are not delivered.

use std::time::Duration;

use serde::Deserialize;

use crate::actor::fs::WatchBackend;

/// File watcher settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WatchConfig {
    /// Watch the served root and inject the reload snippet.
    pub enable: bool,

    /// Extensions (without dot) whose changes trigger a reload.
    pub extensions: Vec<String>,

    /// Debounce window in milliseconds.
    pub debounce: u64,

    /// Use the polling backend.
    pub poll: bool,

    /// Polling period in milliseconds.
    pub poll_interval: u64,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            enable: true,
            extensions: ["html", "htm", "css", "js", "mjs"]
                .into_iter()
                .map(String::from)
                .collect(),
            debounce: 100,
            poll: false,
            poll_interval: 500,
        }
    }
}

impl WatchConfig {
    pub fn backend(&self) -> WatchBackend {
        if self.poll {
            WatchBackend::Poll(Duration::from_millis(self.poll_interval))
        } else {
            WatchBackend::Native
        }
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce)
    }

    pub(in crate::config) fn validate(&self, problems: &mut Vec<String>) {
        if !self.enable {
            return;
        }
        if self.extensions.iter().all(|ext| ext.trim_start_matches('.').is_empty()) {
            problems.push("watch.extensions must name at least one extension".to_string());
        }
        if self.poll && self.poll_interval == 0 {
            problems.push("watch.poll_interval must be greater than 0".to_string());
        }
    }
}
