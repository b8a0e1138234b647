use std::path::{Path, PathBuf};

/// What happened to a file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum ChangeKind {
    Created,
    Modified,
    Removed,
}

impl ChangeKind {
    pub(super) fn label(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Modified => "modified",
            Self::Removed => "removed",
        }
    }
}

/// Relevant changes from one debounced batch, sorted by path.
#[derive(Debug)]
pub(super) struct DebouncedEvents(pub(super) Vec<(PathBuf, ChangeKind)>);

impl DebouncedEvents {
    /// Changed paths, made relative to `root` when they live under it.
    pub(super) fn relative_paths(&self, root: &Path) -> Vec<PathBuf> {
        self.0
            .iter()
            .map(|(path, _)| path.strip_prefix(root).unwrap_or(path).to_path_buf())
            .collect()
    }
}
