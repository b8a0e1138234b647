//! Configuration error types.

use owo_colors::OwoColorize;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Configuration-related errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error when reading `{}`", .0.display())]
    Io(PathBuf, #[source] std::io::Error),

    #[error("failed to parse `{}`", .0.display())]
    Toml(PathBuf, #[source] toml::de::Error),

    #[error("config file `{}` not found", .0.display())]
    NotFound(PathBuf),

    // No #[from]: the problems are the whole message
    #[error("{0}")]
    Invalid(ConfigDiagnostics),
}

/// Every problem found while validating, reported together.
#[derive(Debug, Clone, Default)]
pub struct ConfigDiagnostics(Vec<String>);

impl ConfigDiagnostics {
    pub fn new(problems: Vec<String>) -> Self {
        Self(problems)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// `Ok` when nothing was reported.
    pub fn into_result(self) -> Result<(), ConfigError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Invalid(self))
        }
    }
}

impl fmt::Display for ConfigDiagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid configuration:")?;
        for problem in &self.0 {
            write!(f, "\n  {} {}", "→".red(), problem)?;
        }
        Ok(())
    }
}
