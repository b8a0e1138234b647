//! Server configuration management for `liveserve.toml`.
//!
//! # Module Structure
//!
//! ```text
//! config/
//! ├── section/       # Configuration section definitions
//! │   ├── serve      # [serve]
//! │   └── watch      # [watch]
//! ├── types/         # Utility types
//! │   ├── error      # ConfigError
//! │   └── handle     # Global config handle
//! └── mod.rs         # ServerConfig (this file)
//! ```
//!
//! Precedence, lowest first: built-in defaults, `liveserve.toml`, CLI flags.

pub mod section;
pub mod types;
mod util;

use util::{find_config_file, resolve_against};

pub use section::{ServeConfig, WatchConfig};
pub use types::{ConfigError, cfg, init_config};

use crate::{cli::Cli, log};
use anyhow::{Context, Result};
use serde::Deserialize;
use std::{
    fs,
    path::{Path, PathBuf},
};

/// Default config file name, searched upward from the working directory.
pub const CONFIG_FILE: &str = "liveserve.toml";

// ============================================================================
// root configuration
// ============================================================================

/// Root configuration structure representing liveserve.toml
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServerConfig {
    /// Absolute path to the config file, if one was loaded (internal use only)
    #[serde(skip)]
    pub config_path: Option<PathBuf>,

    /// Development server settings
    #[serde(default)]
    pub serve: ServeConfig,

    /// File watcher settings
    #[serde(default)]
    pub watch: WatchConfig,
}

impl ServerConfig {
    /// Load configuration from CLI arguments.
    ///
    /// Relative paths in the file resolve against the file's directory;
    /// relative paths on the command line resolve against the working
    /// directory.
    pub fn load(cli: &Cli) -> Result<Self> {
        let cwd = std::env::current_dir().context("Failed to get current working directory")?;
        Self::load_from(cli, &cwd)
    }

    fn load_from(cli: &Cli, cwd: &Path) -> Result<Self> {
        let config_path = Self::resolve_config_path(cli, cwd)?;

        let mut config = match &config_path {
            Some(path) => Self::from_path(path)?,
            None => Self::default(),
        };

        let base = config_path
            .as_deref()
            .and_then(Path::parent)
            .unwrap_or(cwd)
            .to_path_buf();
        config.normalize_paths(&base);
        config.apply_cli(cli, cwd);
        config.config_path = config_path;

        config.validate()?;
        Ok(config)
    }

    /// An explicit `--config` must exist; otherwise search upward.
    fn resolve_config_path(cli: &Cli, cwd: &Path) -> Result<Option<PathBuf>> {
        match &cli.config {
            Some(path) => {
                let path = resolve_against(cwd, path);
                if path.is_file() {
                    Ok(Some(path))
                } else {
                    Err(ConfigError::NotFound(path).into())
                }
            }
            None => Ok(find_config_file(cwd, CONFIG_FILE)),
        }
    }

    /// Load configuration from file path with unknown field detection.
    fn from_path(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;

        let (config, ignored) = Self::parse_with_ignored(&content)
            .map_err(|err| ConfigError::Toml(path.to_path_buf(), err))?;

        if !ignored.is_empty() {
            Self::print_unknown_fields_warning(&ignored, path);
        }

        crate::debug!("config"; "loaded {}", path.display());
        Ok(config)
    }

    /// Parse TOML content, collecting any unknown fields.
    fn parse_with_ignored(content: &str) -> Result<(Self, Vec<String>), toml::de::Error> {
        let mut ignored = Vec::new();
        let deserializer = toml::Deserializer::new(content);
        let config = serde_ignored::deserialize(deserializer, |path: serde_ignored::Path| {
            ignored.push(path.to_string());
        })?;
        Ok((config, ignored))
    }

    /// Print warning about unknown fields.
    fn print_unknown_fields_warning(fields: &[String], path: &Path) {
        let display_path = path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_else(|| path.to_string_lossy());
        log!("warning"; "unknown fields in {} (ignored): {}", display_path, fields.join(", "));
    }

    // ========================================================================
    // cli configuration updates
    // ========================================================================

    /// Apply command-line overrides.
    fn apply_cli(&mut self, cli: &Cli, cwd: &Path) {
        Self::update_option(&mut self.serve.interface, cli.interface.as_ref());
        Self::update_option(&mut self.serve.port, cli.port.as_ref());
        Self::update_option(&mut self.watch.enable, cli.watch.as_ref());

        if let Some(root) = &cli.root {
            self.serve.root = resolve_against(cwd, root);
        }
        if cli.poll {
            self.watch.poll = true;
        }
    }

    /// Update config option if CLI value is provided.
    fn update_option<T: Clone>(config_option: &mut T, cli_option: Option<&T>) {
        if let Some(option) = cli_option {
            *config_option = option.clone();
        }
    }

    /// Resolve file-relative paths against the config file's directory.
    fn normalize_paths(&mut self, base: &Path) {
        self.serve.root = resolve_against(base, &self.serve.root);
    }

    // ========================================================================
    // validation
    // ========================================================================

    /// Validate the final configuration, reporting every problem at once.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut problems = Vec::new();
        self.serve.validate(&mut problems);
        self.watch.validate(&mut problems);
        types::ConfigDiagnostics::new(problems).into_result()
    }
}

// ============================================================================
// Test Helpers (available to all modules via `use crate::config::test_*`)
// ============================================================================

/// Parse config text.
/// Panics if there are unknown fields (to catch config typos in tests).
#[cfg(test)]
pub fn test_parse_config(content: &str) -> ServerConfig {
    let (parsed, ignored) = ServerConfig::parse_with_ignored(content).unwrap();
    assert!(
        ignored.is_empty(),
        "test config has unknown fields: {:?}",
        ignored
    );
    parsed
}

// ============================================================================
// tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use tempfile::TempDir;

    fn cli(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("liveserve").chain(args.iter().copied())).unwrap()
    }

    fn project() -> (TempDir, PathBuf) {
        let dir = TempDir::new().unwrap();
        let base = dir.path().canonicalize().unwrap();
        fs::create_dir(base.join("public")).unwrap();
        (dir, base)
    }

    #[test]
    fn test_unknown_fields_collected() {
        let (config, ignored) =
            ServerConfig::parse_with_ignored("[serve]\nport = 4000\nprot = 1\n[extra]\nx = 1")
                .unwrap();
        assert_eq!(config.serve.port, 4000);
        assert_eq!(ignored.len(), 2, "{ignored:?}");
        assert!(ignored.iter().any(|f| f == "serve.prot"));
    }

    #[test]
    fn test_invalid_toml() {
        assert!(ServerConfig::parse_with_ignored("[serve\nport = 1").is_err());
        assert!(ServerConfig::parse_with_ignored("[serve]\nport = \"x\"").is_err());
    }

    #[test]
    fn test_load_defaults_without_file() {
        let (_dir, base) = project();
        let config = ServerConfig::load_from(&cli(&[]), &base).unwrap();

        assert_eq!(config.config_path, None);
        assert_eq!(config.serve.root, base.join("public"));
        assert_eq!(config.serve.port, 3000);
    }

    #[test]
    fn test_load_file_paths_relative_to_file() {
        let (_dir, base) = project();
        fs::create_dir_all(base.join("site/dist")).unwrap();
        fs::write(
            base.join("site/liveserve.toml"),
            "[serve]\nroot = \"dist\"\nport = 4000",
        )
        .unwrap();

        let config =
            ServerConfig::load_from(&cli(&["-C", "site/liveserve.toml"]), &base).unwrap();

        assert_eq!(config.config_path, Some(base.join("site/liveserve.toml")));
        assert_eq!(config.serve.root, base.join("site/dist"));
        assert_eq!(config.serve.port, 4000);
    }

    #[test]
    fn test_load_searches_upward() {
        let (_dir, base) = project();
        fs::write(base.join(CONFIG_FILE), "[serve]\nport = 4100").unwrap();
        let nested = base.join("public");

        let config = ServerConfig::load_from(&cli(&[]), &nested).unwrap();
        assert_eq!(config.serve.port, 4100);
        assert_eq!(config.serve.root, base.join("public"));
    }

    #[test]
    fn test_cli_overrides_file() {
        let (_dir, base) = project();
        fs::create_dir(base.join("other")).unwrap();
        fs::write(
            base.join(CONFIG_FILE),
            "[serve]\nport = 4000\n[watch]\nenable = true",
        )
        .unwrap();

        let config = ServerConfig::load_from(
            &cli(&["other", "-p", "5000", "-i", "0.0.0.0", "-w=false", "--poll"]),
            &base,
        )
        .unwrap();

        assert_eq!(config.serve.port, 5000);
        assert_eq!(config.serve.interface.to_string(), "0.0.0.0");
        assert_eq!(config.serve.root, base.join("other"));
        assert!(!config.watch.enable);
        assert!(config.watch.poll);
    }

    #[test]
    fn test_explicit_config_must_exist() {
        let (_dir, base) = project();
        let err = ServerConfig::load_from(&cli(&["-C", "nope.toml"]), &base).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ConfigError>(),
            Some(ConfigError::NotFound(_))
        ));
    }

    #[test]
    fn test_missing_root_rejected() {
        let (_dir, base) = project();
        let err = ServerConfig::load_from(&cli(&["missing"]), &base).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ConfigError>(),
            Some(ConfigError::Invalid(_))
        ));
        assert!(err.to_string().contains("serve.root"));
    }

    #[test]
    fn test_parse_error_names_file() {
        let (_dir, base) = project();
        fs::write(base.join(CONFIG_FILE), "[serve\n").unwrap();

        let err = ServerConfig::load_from(&cli(&[]), &base).unwrap_err();
        assert!(err.to_string().contains(CONFIG_FILE));
    }
}
