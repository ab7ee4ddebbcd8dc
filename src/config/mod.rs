//! Project configuration management for `kiln.toml`.
//!
//! # Module Structure
//!
//! ```text
//! config/
//! ├── section/       # Configuration section definitions
//! │   ├── watch      # [watch]
//! │   └── worker     # [worker]
//! ├── types/         # Utility types
//! │   ├── error      # ConfigError
//! │   └── handle     # Global config handle
//! └── mod.rs         # ProjectConfig (this file)
//! ```
//!
//! # Sections
//!
//! | Section    | Purpose                                          |
//! |------------|--------------------------------------------------|
//! | `[worker]` | Compiler worker command, target, resolve-only    |
//! | `[watch]`  | Project roots, file extensions, debounce window  |

pub mod section;
pub mod types;
mod util;

use util::find_config_file;

pub use section::{WatchConfig, WorkerConfig};
pub use types::{ConfigError, cfg, init_config, reload_config};

use crate::{
    cli::{Cli, Commands},
    log,
    protocol::CompileFlags,
    utils::path::normalize_path,
};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

// ============================================================================
// root configuration
// ============================================================================

/// Root configuration structure representing kiln.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// CLI arguments reference (internal use only)
    #[serde(skip)]
    pub cli: Option<&'static Cli>,

    /// Absolute path to the config file (internal use only)
    #[serde(skip)]
    pub config_path: PathBuf,

    /// Project root directory - parent of config file (internal use only)
    #[serde(skip)]
    pub root: PathBuf,

    /// Compiler worker settings
    #[serde(default)]
    pub worker: WorkerConfig,

    /// Watched roots and file selection
    #[serde(default)]
    pub watch: WatchConfig,
}

impl ProjectConfig {
    /// Load configuration from CLI arguments.
    ///
    /// Searches upward from cwd for the config file. Without one, defaults are
    /// used and the project root is the current directory.
    pub fn load(cli: &'static Cli) -> Result<Self> {
        let cwd = std::env::current_dir().context("Failed to get current working directory")?;

        let (mut config, config_path) = match find_config_file(&cli.config) {
            Some(path) => (Self::from_path(&path)?, path),
            None => {
                crate::debug!("config"; "{} not found, using defaults", cli.config.display());
                (Self::default(), cwd.join(&cli.config))
            }
        };

        let root = config_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| cwd.clone());

        config.cli = Some(cli);
        config.config_path = normalize_path(&config_path);
        config.set_root(&normalize_path(&root));
        config.normalize_paths();
        config.apply_cli(cli, &cwd);
        config.validate()?;

        Ok(config)
    }

    /// Load configuration from file path with unknown field detection.
    fn from_path(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;

        let (config, ignored) = Self::parse_with_ignored(&content)?;
        if !ignored.is_empty() {
            Self::print_unknown_fields_warning(&ignored, path);
        }

        Ok(config)
    }

    /// Parse TOML content, collecting any unknown fields.
    pub fn parse_with_ignored(content: &str) -> Result<(Self, Vec<String>), ConfigError> {
        let mut ignored = Vec::new();
        let deserializer = toml::Deserializer::new(content);
        let config = serde_ignored::deserialize(deserializer, |path: serde_ignored::Path| {
            ignored.push(path.to_string());
        })?;
        Ok((config, ignored))
    }

    fn print_unknown_fields_warning(fields: &[String], path: &Path) {
        let display_path = path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_else(|| path.to_string_lossy());
        log!("warning"; "unknown fields in {} (ignored): {}", display_path, fields.join(", "));
    }

    /// Get the root directory path
    pub fn get_root(&self) -> &Path {
        &self.root
    }

    /// Set the root directory path
    pub fn set_root(&mut self, path: &Path) {
        self.root = path.to_path_buf();
    }

    /// Get path relative to the project root
    pub fn root_relative(&self, path: impl AsRef<Path>) -> PathBuf {
        path.as_ref()
            .strip_prefix(&self.root)
            .map(Path::to_path_buf)
            .unwrap_or_else(|_| path.as_ref().to_path_buf())
    }

    /// Absolute, normalized watch roots.
    pub fn roots(&self) -> Vec<PathBuf> {
        self.watch.roots.clone()
    }

    pub fn compile_flags(&self) -> CompileFlags {
        self.worker.compile_flags()
    }

    // ========================================================================
    // cli configuration updates
    // ========================================================================

    /// Apply CLI overrides. Roots given on the command line are relative to
    /// cwd, not to the project root.
    fn apply_cli(&mut self, cli: &Cli, cwd: &Path) {
        crate::logger::set_verbose(cli.verbose);

        if let Some(worker) = &cli.worker {
            self.worker.command = split_worker_command(worker);
        }
        Self::update_option(&mut self.worker.target, cli.target.as_ref());

        let roots = match &cli.command {
            Commands::Watch { roots } | Commands::Check { roots } | Commands::Hover { roots, .. } => {
                roots
            }
        };
        if !roots.is_empty() {
            self.watch.roots = roots.iter().map(|r| normalize_path(&cwd.join(r))).collect();
        }
    }

    /// Update config option if CLI value is provided.
    fn update_option<T: Clone>(config_option: &mut T, cli_option: Option<&T>) {
        if let Some(option) = cli_option {
            *config_option = option.clone();
        }
    }

    /// Resolve config-relative roots against the project root.
    fn normalize_paths(&mut self) {
        let root = self.root.clone();
        self.watch.roots = self
            .watch
            .roots
            .iter()
            .map(|p| normalize_path(&root.join(p)))
            .collect();
    }

    // ========================================================================
    // validation
    // ========================================================================

    /// Validate configuration, reporting the first problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.worker.validate()?;
        self.watch.validate()?;
        Ok(())
    }
}

/// Split a `--worker` command line on whitespace. Quotes are not
/// interpreted.
fn split_worker_command(command: &str) -> Vec<String> {
    command.split_whitespace().map(str::to_string).collect()
}

// ============================================================================
// Test Helpers (available to all modules via `use crate::config::test_*`)
// ============================================================================

/// Parse config content.
/// Panics if there are unknown fields (to catch config typos in tests).
#[cfg(test)]
pub fn test_parse_config(content: &str) -> ProjectConfig {
    let (parsed, ignored) = ProjectConfig::parse_with_ignored(content).unwrap();
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

    #[test]
    fn test_from_str_invalid_toml() {
        let result = ProjectConfig::parse_with_ignored("[worker\ncommand = [\"skewc\"]");
        assert!(matches!(result, Err(ConfigError::Toml(_))));
    }

    #[test]
    fn test_project_config_default() {
        let config = ProjectConfig::default();

        assert!(config.cli.is_none());
        assert_eq!(config.config_path, PathBuf::new());
        assert!(config.worker.command.is_empty());
        assert_eq!(config.worker.target, "js");
        assert_eq!(config.watch.roots, vec![PathBuf::from(".")]);
        assert_eq!(config.watch.debounce_ms, 300);
    }

    #[test]
    fn test_full_config() {
        let config = test_parse_config(
            "[worker]\ncommand = [\"skewc\", \"--worker\"]\ntarget = \"c#\"\nstop_after_resolve = false\n\
             [watch]\nroots = [\"src\", \"lib\"]\nextensions = [\"sk\"]\ndebounce_ms = 50",
        );

        assert_eq!(config.worker.command, vec!["skewc", "--worker"]);
        assert_eq!(
            config.compile_flags(),
            CompileFlags {
                target: "c#".into(),
                stop_after_resolve: false,
            }
        );
        assert_eq!(
            config.watch.roots,
            vec![PathBuf::from("src"), PathBuf::from("lib")]
        );
        assert_eq!(config.watch.extensions, vec!["sk"]);
        assert_eq!(config.watch.debounce_ms, 50);
    }

    #[test]
    fn test_normalize_roots_against_root() {
        let mut config = test_parse_config("[watch]\nroots = [\"src\"]");
        config.set_root(Path::new("/nonexistent/project"));
        config.normalize_paths();

        assert_eq!(
            config.roots(),
            vec![PathBuf::from("/nonexistent/project/src")]
        );
    }

    #[test]
    fn test_root_relative() {
        let mut config = ProjectConfig::default();
        config.set_root(Path::new("/p"));
        assert_eq!(
            config.root_relative("/p/src/main.sk"),
            PathBuf::from("src/main.sk")
        );
        assert_eq!(config.root_relative("/q/x.sk"), PathBuf::from("/q/x.sk"));
    }

    #[test]
    fn test_validate_requires_worker_command() {
        let config = test_parse_config("");
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));

        let config = test_parse_config("[worker]\ncommand = [\"skewc\"]");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_split_worker_command_ignores_quotes() {
        assert_eq!(
            split_worker_command("  skewc   --worker "),
            vec!["skewc", "--worker"]
        );
        assert_eq!(
            split_worker_command("skewc --out \"a b\""),
            vec!["skewc", "--out", "\"a", "b\""]
        );
    }

    #[test]
    fn test_unknown_fields_detected() {
        let content = "[worker]\ncommand = [\"skewc\"]\n[unknown_section]\nfield = \"value\"";
        let (config, ignored) = ProjectConfig::parse_with_ignored(content).unwrap();

        assert_eq!(config.worker.command, vec!["skewc"]);
        assert!(ignored.iter().any(|f| f.contains("unknown_section")));
    }
}
