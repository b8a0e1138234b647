//! `[serve]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [serve]
//! interface = "127.0.0.1"     # Network interface (127.0.0.1 = localhost only)
//! port = 3000                 # First port to try; the next 9 are fallbacks
//! root = "public"             # Directory to serve, relative to this file
//! index = "index.html"        # Document served for `/` and directories
//! workers = 4                 # Request worker threads
//! heartbeat = 15              # Seconds between keep-alives (prunes closed tabs)
//! ```
//!
//! Use `interface = "0.0.0.0"` to make the server accessible from LAN.

use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

/// Development server settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServeConfig {
    /// Network interface to bind.
    /// - `127.0.0.1` (default): localhost only
    /// - `0.0.0.0`: all interfaces (LAN accessible)
    pub interface: IpAddr,

    /// HTTP port number.
    pub port: u16,

    /// Served root. Absolute after loading.
    pub root: PathBuf,

    /// Index document name (a file name, not a path).
    pub index: String,

    /// Size of the request worker pool.
    pub workers: usize,

    /// Heartbeat period in seconds. Closed streams are dropped by the
    /// heartbeat, so it cannot be turned off.
    pub heartbeat: u64,
}

impl Default for ServeConfig {
    fn default() -> Self {
        Self {
            interface: IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1)),
            port: 3000,
            root: PathBuf::from("public"),
            index: "index.html".to_string(),
            workers: 4,
            heartbeat: 15,
        }
    }
}

impl ServeConfig {
    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_secs(self.heartbeat)
    }

    pub(in crate::config) fn validate(&self, problems: &mut Vec<String>) {
        if !self.root.is_dir() {
            problems.push(format!(
                "serve.root `{}` is not an existing directory",
                self.root.display()
            ));
        }
        if self.index.is_empty()
            || self.index.contains(['/', '\\'])
            || self.index == "."
            || self.index == ".."
        {
            problems.push(format!("serve.index `{}` must be a plain file name", self.index));
        }
        if self.workers == 0 {
            problems.push("serve.workers must be at least 1".to_string());
        }
        if self.heartbeat == 0 {
            problems.push("serve.heartbeat must be at least 1 second".to_string());
        }
    }
}
