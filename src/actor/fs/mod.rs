//! FileSystem Actor
//!
//! Watches the served root and sends one reload message per debounced batch
//! of relevant changes. Implements the "Watcher-First" pattern: the watcher
//! is running before the server accepts its first request.
//!
//! Architecture:
//! ```text
//! Watcher → Debouncer (pure timing) → Classifier (extensions) → ReloadMsg
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::Watcher;
use tokio::sync::mpsc;

use super::messages::ReloadMsg;

// Native / polling watcher construction.
mod backend;
// Relevance filtering (raw changes -> reload-worthy changes).
mod classifier;
// Pure timing and deduplication.
mod debouncer;
// Shared fs event types.
mod types;


pub use backend::{WatchBackend, WatchError, watch};

use classifier::EventClassifier;
use debouncer::Debouncer;
use types::DebouncedEvents;

/// FileSystem Actor - watches for file changes
pub struct FsActor {
    root: PathBuf,
    /// Channel to receive notify events (sync -> async bridge)
    notify_rx: std::sync::mpsc::Receiver<notify::Result<notify::Event>>,
    /// Watcher handle (must be kept alive)
    watcher: Box<dyn Watcher + Send>,
    /// Channel to send messages to ReloadActor
    reload_tx: mpsc::Sender<ReloadMsg>,
    debouncer: Debouncer,
    classifier: EventClassifier,
}

impl FsActor {
    /// Create a new FsActor with the watcher already running.
    ///
    /// Events buffer in the notify channel until [`FsActor::run`] is polled.
    pub fn new<S: AsRef<str>>(
        root: &Path,
        backend: WatchBackend,
        extensions: &[S],
        debounce: Duration,
        reload_tx: mpsc::Sender<ReloadMsg>,
    ) -> Result<Self, WatchError> {
        let (notify_tx, notify_rx) = std::sync::mpsc::channel();
        let watcher = watch(root, backend, move |res: notify::Result<notify::Event>| {
            let _ = notify_tx.send(res);
        })?;

        crate::debug!("watch"; "{} watcher on {}", backend.label(), root.display());

        Ok(Self {
            root: root.to_path_buf(),
            notify_rx,
            watcher,
            reload_tx,
            debouncer: Debouncer::new(debounce),
            classifier: EventClassifier::new(extensions),
        })
    }

    /// Run the actor event loop until the reload actor goes away.
    pub async fn run(self) {
        let Self {
            root,
            notify_rx,
            watcher,
            reload_tx,
            mut debouncer,
            classifier,
        } = self;

        let (async_tx, mut async_rx) = mpsc::channel::<notify::Event>(64);

        // notify delivers on its own thread; bridge into the runtime.
        std::thread::spawn(move || {
            while let Ok(result) = notify_rx.recv() {
                match result {
                    Ok(event) => {
                        if async_tx.blocking_send(event).is_err() {
                            break;
                        }
                    }
                    Err(e) => crate::log!("watch"; "notify error: {}", e),
                }
            }
        });

        loop {
            tokio::select! {
                biased;
                Some(event) = async_rx.recv() => debouncer.add_event(&event),
                _ = tokio::time::sleep(debouncer.sleep_duration()) => {
                    if process_changes(&mut debouncer, &classifier, &root, &reload_tx).await.is_err() {
                        break;
                    }
                }
            }
        }

        drop(watcher);
    }
}

/// Process debounced file changes
///
/// Returns `Err(())` if the reload actor shut down
async fn process_changes(
    debouncer: &mut Debouncer,
    classifier: &EventClassifier,
    root: &Path,
    reload_tx: &mpsc::Sender<ReloadMsg>,
) -> Result<(), ()> {
    let Some(raw_events) = debouncer.take_if_ready() else {
        return Ok(());
    };

    let Some(events) = classifier.classify(raw_events) else {
        return Ok(());
    };

    log_events(&events);

    let changes = events.relative_paths(root);
    reload_tx
        .send(ReloadMsg::Reload { changes })
        .await
        .map_err(|_| ())
}

fn log_events(events: &DebouncedEvents) {
    for (path, kind) in &events.0 {
        crate::debug!("watch"; "{}: {}", kind.label(), path.display());
    }
}
