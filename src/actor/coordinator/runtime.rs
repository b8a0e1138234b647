use std::time::Duration;

use crossbeam::channel::{Receiver, TryRecvError};
use tokio::sync::mpsc;

use crate::actor::fs::FsActor;
use crate::actor::messages::ReloadMsg;
use crate::actor::reload::ReloadActor;

/// How long the reload actor gets to close its streams.
const SHUTDOWN_GRACE: Duration = Duration::from_millis(500);

/// Run all actors concurrently until shutdown.
pub(super) async fn run_actors(
    fs: Option<FsActor>,
    reload: ReloadActor,
    reload_tx: mpsc::Sender<ReloadMsg>,
    shutdown_rx: Option<Receiver<()>>,
) {
    let reload_handle = tokio::spawn(reload.run());
    let fs_handle = fs.map(|fs| tokio::spawn(fs.run()));

    let Some(rx) = shutdown_rx else {
        // Without a signal the system lives as long as the watcher feeds it.
        drop(reload_tx);
        let _ = reload_handle.await;
        return;
    };

    loop {
        match rx.try_recv() {
            Ok(()) | Err(TryRecvError::Disconnected) => {
                crate::debug!("actor"; "shutdown signal received");
                break;
            }
            Err(TryRecvError::Empty) => {}
        }
        if reload_handle.is_finished() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }

    if let Some(handle) = fs_handle {
        handle.abort();
    }

    crate::debug!("actor"; "sending shutdown to reload");
    let _ = reload_tx.send(ReloadMsg::Shutdown).await;
    let _ = tokio::time::timeout(SHUTDOWN_GRACE, reload_handle).await;
}
