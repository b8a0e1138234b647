//! Actor Coordinator - Wires up the Live Reload Actor System
//!
//! The Coordinator is a thin orchestrator that:
//! - Creates the reload channel
//! - Starts the file watcher up front, so a failed watch aborts startup
//! - Runs the actors until the shutdown signal arrives

mod runtime;

use std::path::Path;
use std::time::Duration;

use crossbeam::channel::Receiver;
use tokio::sync::mpsc;

use super::fs::{FsActor, WatchError};
use super::messages::ReloadMsg;
use super::reload::ReloadActor;
use crate::config::WatchConfig;
use crate::reload::Broadcaster;

const CHANNEL_BUFFER: usize = 32;

/// Coordinator - wires up and runs the actor system.
pub struct Coordinator {
    reload_tx: mpsc::Sender<ReloadMsg>,
    reload: ReloadActor,
    fs: Option<FsActor>,
    shutdown_rx: Option<Receiver<()>>,
}

impl Coordinator {
    /// Actors that keep `broadcaster` alive; heartbeats every `heartbeat` if set.
    pub fn new(broadcaster: Broadcaster, heartbeat: Option<Duration>) -> Self {
        let (reload_tx, reload_rx) = mpsc::channel(CHANNEL_BUFFER);
        Self {
            reload_tx,
            reload: ReloadActor::new(reload_rx, broadcaster, heartbeat),
            fs: None,
            shutdown_rx: None,
        }
    }

    /// Start watching `root`. The watcher runs from this point on.
    pub fn watch(mut self, root: &Path, config: &WatchConfig) -> Result<Self, WatchError> {
        let fs = FsActor::new(
            root,
            config.backend(),
            &config.extensions,
            config.debounce(),
            self.reload_tx.clone(),
        )?;
        self.fs = Some(fs);
        Ok(self)
    }

    pub fn is_watching(&self) -> bool {
        self.fs.is_some()
    }

    /// Set shutdown signal receiver.
    pub fn with_shutdown_signal(mut self, rx: Receiver<()>) -> Self {
        self.shutdown_rx = Some(rx);
        self
    }

    /// Run the actor system.
    pub async fn run(self) {
        crate::debug!("actor"; "start");
        runtime::run_actors(self.fs, self.reload, self.reload_tx, self.shutdown_rx).await;
        crate::debug!("actor"; "stopped");
    }
}
