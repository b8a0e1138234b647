//! Reload Actor - drives the broadcaster
//!
//! This actor is responsible for:
//! - Turning `ReloadMsg::Reload` into a `reload` frame for every subscriber
//! - Sending periodic heartbeats so closed streams are pruned
//! - Closing every stream on shutdown
//!
//! ```text
//! FsActor --[Reload]--> ReloadActor --[frame]--> Broadcaster --> browsers
//! ```

use std::path::PathBuf;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{Interval, MissedTickBehavior};

use super::messages::ReloadMsg;
use crate::reload::Broadcaster;

/// Reload Actor - owns the write side of the subscriber set
pub struct ReloadActor {
    rx: mpsc::Receiver<ReloadMsg>,
    broadcaster: Broadcaster,
    /// `None` disables heartbeats
    heartbeat: Option<Duration>,
}

impl ReloadActor {
    pub fn new(
        rx: mpsc::Receiver<ReloadMsg>,
        broadcaster: Broadcaster,
        heartbeat: Option<Duration>,
    ) -> Self {
        Self {
            rx,
            broadcaster,
            heartbeat: heartbeat.filter(|period| !period.is_zero()),
        }
    }

    /// Run until `Shutdown` arrives or every sender is gone.
    pub async fn run(self) {
        let Self {
            mut rx,
            broadcaster,
            heartbeat,
        } = self;

        let mut ticker = heartbeat.map(|period| {
            let mut interval = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            interval
        });

        loop {
            tokio::select! {
                msg = rx.recv() => match msg {
                    Some(ReloadMsg::Reload { changes }) => reload(&broadcaster, &changes),
                    Some(ReloadMsg::Shutdown) | None => break,
                },
                _ = tick(&mut ticker) => {
                    let delivery = broadcaster.heartbeat();
                    if delivery.dropped > 0 {
                        crate::debug!("reload"; "heartbeat pruned {} clients", delivery.dropped);
                    }
                }
            }
        }

        let closed = broadcaster.close_all();
        crate::debug!("reload"; "closed {} streams", closed);
    }
}

fn reload(broadcaster: &Broadcaster, changes: &[PathBuf]) {
    let delivery = broadcaster.notify_reload();
    let clients = match delivery.delivered {
        1 => "1 client".to_string(),
        n => format!("{n} clients"),
    };
    crate::logger::status_success(&format!("{} → reloaded {}", describe(changes), clients));
}

/// Short summary of a batch: the file name, or a count.
fn describe(changes: &[PathBuf]) -> String {
    match changes {
        [] => "change".to_string(),
        [one] => one.display().to_string(),
        many => format!("{} files", many.len()),
    }
}

/// Wait for the next heartbeat, or forever when heartbeats are off.
async fn tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending().await,
    }
}
