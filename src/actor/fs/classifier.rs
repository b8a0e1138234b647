use std::path::PathBuf;

use rustc_hash::{FxHashMap, FxHashSet};

use super::types::{ChangeKind, DebouncedEvents};

/// Turns a raw debounced batch into the changes worth a reload.
///
/// Pipeline: correct_by_existence → filter_relevant
pub(super) struct EventClassifier {
    /// Lowercase extensions without the leading dot
    extensions: FxHashSet<String>,
}

impl EventClassifier {
    pub(super) fn new<S: AsRef<str>>(extensions: &[S]) -> Self {
        let extensions = extensions
            .iter()
            .map(|ext| ext.as_ref().trim_start_matches('.').to_ascii_lowercase())
            .collect();
        Self { extensions }
    }

    /// Main classification pipeline. `None` when nothing relevant changed.
    pub(super) fn classify(&self, raw: FxHashMap<PathBuf, ChangeKind>) -> Option<DebouncedEvents> {
        let mut changes = raw;

        Self::correct_by_existence(&mut changes);
        self.filter_relevant(&mut changes);

        if changes.is_empty() {
            return None;
        }
        let mut events: Vec<_> = changes.into_iter().collect();
        events.sort_by(|a, b| a.0.cmp(&b.0));
        Some(DebouncedEvents(events))
    }

    pub(super) fn is_relevant(&self, path: &std::path::Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| self.extensions.contains(&ext.to_ascii_lowercase()))
    }

    /// Reconcile event kinds with actual filesystem state.
    ///
    /// The watcher may report stale events (e.g., Created for a file that's already
    /// been deleted, or Removed for a file that still exists after an atomic save).
    fn correct_by_existence(changes: &mut FxHashMap<PathBuf, ChangeKind>) {
        let paths: Vec<_> = changes.keys().cloned().collect();
        for path in paths {
            let kind = changes[&path];
            let exists = path.exists();
            match kind {
                ChangeKind::Created if !exists => {
                    crate::debug!("watch"; "discard created (gone): {}", path.display());
                    changes.remove(&path);
                }
                ChangeKind::Modified if !exists => {
                    crate::debug!("watch"; "upgrade modified->removed: {}", path.display());
                    changes.insert(path, ChangeKind::Removed);
                }
                ChangeKind::Removed if exists => {
                    crate::debug!("watch"; "downgrade removed->modified: {}", path.display());
                    changes.insert(path, ChangeKind::Modified);
                }
                _ => {}
            }
        }
    }

    /// Keep files with a watched extension. Directories never count.
    fn filter_relevant(&self, changes: &mut FxHashMap<PathBuf, ChangeKind>) {
        changes.retain(|path, kind| {
            if !self.is_relevant(path) {
                return false;
            }
            match kind {
                ChangeKind::Created | ChangeKind::Modified => path.is_file(),
                ChangeKind::Removed => true,
            }
        });
    }
}
