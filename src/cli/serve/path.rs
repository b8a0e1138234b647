//! URL to filesystem path resolution.
//!
//! Every path handed out by [`ServedRoot`] is a canonical regular file under
//! the canonical root. Traversal is rejected twice: lexically (a `..` that
//! climbs above the root) and after canonicalization (a symlink that points
//! outside).

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use percent_encoding::percent_decode_str;
use thiserror::Error;

use crate::utils::mime;

#[derive(Debug, Error)]
pub enum ResolveError {
    /// Missing, outside the root, or not a regular file.
    #[error("not found: {0}")]
    NotFound(String),

    /// The file exists but could not be read.
    #[error("failed to read `{}`: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// A file ready to be served.
#[derive(Debug)]
pub struct ResolvedFile {
    pub path: PathBuf,
    pub content_type: &'static str,
    pub body: Vec<u8>,
}

/// The directory tree exposed by the server.
#[derive(Debug, Clone)]
pub struct ServedRoot {
    root: PathBuf,
    index: String,
}

impl ServedRoot {
    /// Canonicalize `root` and remember the index document name.
    pub fn new(root: &Path, index: impl Into<String>) -> io::Result<Self> {
        let root = root.canonicalize()?;
        if !root.is_dir() {
            return Err(io::Error::new(
                io::ErrorKind::NotADirectory,
                format!("`{}` is not a directory", root.display()),
            ));
        }
        Ok(Self {
            root,
            index: index.into(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.root
    }

    /// Resolve a request path and read the file.
    pub fn resolve(&self, url: &str) -> Result<ResolvedFile, ResolveError> {
        let path = self.locate(url)?;
        let body = fs::read(&path).map_err(|source| ResolveError::Io {
            path: path.clone(),
            source,
        })?;
        Ok(ResolvedFile {
            content_type: mime::from_path(&path),
            path,
            body,
        })
    }

    /// Resolve a request path to a file without reading it.
    pub fn locate(&self, url: &str) -> Result<PathBuf, ResolveError> {
        let not_found = || ResolveError::NotFound(url.to_string());

        let relative = normalize_url(url).ok_or_else(not_found)?;
        let target = self.confine(&self.root.join(relative), url)?;

        let meta = metadata(&target, url)?;
        if meta.is_file() {
            return Ok(target);
        }
        if !meta.is_dir() {
            return Err(not_found());
        }

        let index = self.confine(&target.join(&self.index), url)?;
        if metadata(&index, url)?.is_file() {
            Ok(index)
        } else {
            Err(not_found())
        }
    }

    /// Canonicalize `path` and require it to stay under the root.
    fn confine(&self, path: &Path, url: &str) -> Result<PathBuf, ResolveError> {
        let canonical = path.canonicalize().map_err(|e| classify(e, path, url))?;
        if canonical.starts_with(&self.root) {
            Ok(canonical)
        } else {
            crate::debug!("serve"; "rejected {} (outside root)", url);
            Err(ResolveError::NotFound(url.to_string()))
        }
    }
}

fn metadata(path: &Path, url: &str) -> Result<fs::Metadata, ResolveError> {
    fs::metadata(path).map_err(|e| classify(e, path, url))
}

/// Absent paths are `NotFound`; anything else is a real I/O failure.
fn classify(error: io::Error, path: &Path, url: &str) -> ResolveError {
    match error.kind() {
        io::ErrorKind::NotFound | io::ErrorKind::NotADirectory => {
            ResolveError::NotFound(url.to_string())
        }
        _ => ResolveError::Io {
            path: path.to_path_buf(),
            source: error,
        },
    }
}

/// Turn a request path into a relative filesystem path.
///
/// Strips query and fragment, percent-decodes, then applies `.` and `..`
/// lexically. Returns `None` when the path climbs above the root or cannot
/// name a file.
fn normalize_url(url: &str) -> Option<PathBuf> {
    let end = url.find(['?', '#']).unwrap_or(url.len());
    let decoded = percent_decode_str(&url[..end]).decode_utf8().ok()?;

    let mut segments: Vec<&str> = Vec::new();
    for segment in decoded.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop()?;
            }
            s if s.contains(['\\', '\0']) => return None,
            s => segments.push(s),
        }
    }

    Some(segments.iter().collect())
}
