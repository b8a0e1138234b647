//! Actor Message Definitions
//!
//! ```text
//! FsActor --Reload--> ReloadActor
//! Coordinator --Shutdown--> ReloadActor
//! ```

use std::path::PathBuf;

/// Messages to Reload Actor
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReloadMsg {
    /// Relevant files changed; every subscriber reloads.
    Reload {
        /// Changed paths, relative to the served root where possible
        changes: Vec<PathBuf>,
    },
    /// Close every stream and stop.
    Shutdown,
}
