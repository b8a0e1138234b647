use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use rustc_hash::FxHashMap;

use super::types::ChangeKind;

/// Pure debouncer: only handles timing and event deduplication.
pub(super) struct Debouncer {
    /// Path → ChangeKind (dedup is free via HashMap key uniqueness)
    pub(super) changes: FxHashMap<PathBuf, ChangeKind>,
    pub(super) last_event: Option<Instant>,
    window: Duration,
}

impl Debouncer {
    pub(super) fn new(window: Duration) -> Self {
        Self {
            changes: FxHashMap::default(),
            last_event: None,
            window,
        }
    }

    /// Add a notify event, applying dedup rules:
    /// - Remove + Create/Modify → Create/Modify (file was restored)
    /// - Modify + Remove → Remove (file was deleted)
    /// - Create + Remove → nothing (file never really existed)
    /// - otherwise the first event wins
    ///
    /// A rename counts as removing its source and creating its target.
    pub(super) fn add_event(&mut self, event: &notify::Event) {
        if change_kind(event.kind, 0).is_none() {
            return;
        }
        crate::debug!("watch"; "raw notify: {:?} {:?}", event.kind, event.paths);

        for (index, path) in event.paths.iter().enumerate() {
            let Some(kind) = change_kind(event.kind, index) else {
                continue;
            };
            if is_temp_file(path) {
                continue;
            }
            self.record(path, kind);
        }

        if self.changes.is_empty() {
            self.last_event = None;
        }
    }

    fn record(&mut self, path: &Path, kind: ChangeKind) {
        if let Some(&existing) = self.changes.get(path) {
            match (existing, kind) {
                (ChangeKind::Removed, ChangeKind::Created | ChangeKind::Modified) => {
                    crate::debug!("watch"; "restore {}->{}: {}", existing.label(), kind.label(), path.display());
                    self.changes.insert(path.to_path_buf(), kind);
                }
                (ChangeKind::Modified, ChangeKind::Removed) => {
                    crate::debug!("watch"; "upgrade modified->removed: {}", path.display());
                    self.changes.insert(path.to_path_buf(), ChangeKind::Removed);
                }
                (ChangeKind::Created, ChangeKind::Removed) => {
                    crate::debug!("watch"; "discard created+removed: {}", path.display());
                    self.changes.remove(path);
                }
                _ => return,
            }
        } else {
            self.changes.insert(path.to_path_buf(), kind);
        }
        self.last_event = Some(Instant::now());
    }

    /// Take raw events once the window has passed without new events.
    pub(super) fn take_if_ready(&mut self) -> Option<FxHashMap<PathBuf, ChangeKind>> {
        if self.changes.is_empty() {
            // Everything in the window cancelled out.
            self.last_event = None;
            return None;
        }
        if !self.is_ready() {
            return None;
        }

        self.last_event = None;
        Some(std::mem::take(&mut self.changes))
    }

    pub(super) fn is_ready(&self) -> bool {
        let Some(last_event) = self.last_event else {
            return false;
        };

        last_event.elapsed() >= self.window && !self.changes.is_empty()
    }

    /// Precise sleep duration until next possible ready time.
    pub(super) fn sleep_duration(&self) -> Duration {
        let Some(last_event) = self.last_event else {
            return Duration::from_secs(86400);
        };

        self.window
            .saturating_sub(last_event.elapsed())
            .max(Duration::from_millis(1))
    }
}

/// Change recorded for the `index`-th path of an event, `None` for noise.
fn change_kind(kind: notify::EventKind, index: usize) -> Option<ChangeKind> {
    use notify::EventKind;
    use notify::event::{MetadataKind, ModifyKind, RenameMode};

    match kind {
        EventKind::Create(_) => Some(ChangeKind::Created),
        EventKind::Remove(_) => Some(ChangeKind::Removed),
        EventKind::Modify(ModifyKind::Name(RenameMode::From)) => Some(ChangeKind::Removed),
        EventKind::Modify(ModifyKind::Name(RenameMode::To)) => Some(ChangeKind::Created),
        // paths are [from, to]
        EventKind::Modify(ModifyKind::Name(RenameMode::Both)) if index == 0 => {
            Some(ChangeKind::Removed)
        }
        EventKind::Modify(ModifyKind::Name(RenameMode::Both)) => Some(ChangeKind::Created),
        // The polling backend reports content edits as a new mtime.
        EventKind::Modify(ModifyKind::Metadata(MetadataKind::WriteTime)) => {
            Some(ChangeKind::Modified)
        }
        // atime/chmod/chown noise
        EventKind::Modify(ModifyKind::Metadata(_)) => None,
        // Direction unknown; existence is checked when the batch is classified.
        EventKind::Modify(_) => Some(ChangeKind::Modified),
        _ => None,
    }
}

/// Check if path is a temp/backup file (editor artifacts).
pub(super) fn is_temp_file(path: &Path) -> bool {
    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");

    matches!(ext, "bck" | "bak" | "backup" | "swp" | "swo" | "swx" | "tmp")
        || name.ends_with('~')
        || name.starts_with('.')
        || name.starts_with('#')
}
