//! Watch backends behind a single `watch(root, on_event)` entry point.

use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::{EventHandler, RecursiveMode, Watcher};
use thiserror::Error;

/// How file changes are observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchBackend {
    /// Kernel notifications (inotify, FSEvents/kqueue, ReadDirectoryChangesW)
    Native,
    /// Periodic rescans, for network mounts and containers
    Poll(Duration),
}

impl WatchBackend {
    pub fn label(self) -> &'static str {
        match self {
            Self::Native => "native",
            Self::Poll(_) => "poll",
        }
    }
}

#[derive(Debug, Error)]
pub enum WatchError {
    #[error("watch root `{}` is not a directory", .0.display())]
    MissingRoot(PathBuf),

    #[error("failed to start {backend} watcher: {source}")]
    Backend {
        backend: &'static str,
        #[source]
        source: notify::Error,
    },

    #[error("failed to watch `{}`: {source}", path.display())]
    Watch {
        path: PathBuf,
        #[source]
        source: notify::Error,
    },
}

/// Start watching `root` recursively, calling `on_event` for every event.
///
/// The returned watcher stops when dropped.
pub fn watch<F>(
    root: &Path,
    backend: WatchBackend,
    on_event: F,
) -> Result<Box<dyn Watcher + Send>, WatchError>
where
    F: EventHandler,
{
    if !root.is_dir() {
        return Err(WatchError::MissingRoot(root.to_path_buf()));
    }

    let backend_err = |source| WatchError::Backend {
        backend: backend.label(),
        source,
    };

    let mut watcher: Box<dyn Watcher + Send> = match backend {
        WatchBackend::Native => Box::new(notify::recommended_watcher(on_event).map_err(backend_err)?),
        WatchBackend::Poll(interval) => {
            let config = notify::Config::default().with_poll_interval(interval);
            Box::new(notify::PollWatcher::new(on_event, config).map_err(backend_err)?)
        }
    };

    watcher
        .watch(root, RecursiveMode::Recursive)
        .map_err(|source| WatchError::Watch {
            path: root.to_path_buf(),
            source,
        })?;

    Ok(watcher)
}
