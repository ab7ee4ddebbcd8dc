//! `[watch]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [watch]
//! roots = ["src", "lib"]   # Project folders, relative to kiln.toml
//! extensions = ["sk"]      # Files sent to the compiler (empty = all)
//! debounce_ms = 300        # Quiet period before re-walking after a change
//! ```
//!
//! Roots must not nest: a file under two roots is compiled twice.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::ConfigError;

/// Watched roots and file selection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchConfig {
    /// Project root directories.
    pub roots: Vec<PathBuf>,

    /// File extensions (without dot) to compile. Empty accepts every file.
    pub extensions: Vec<String>,

    /// Debounce window for change events, in milliseconds.
    pub debounce_ms: u64,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            roots: vec![PathBuf::from(".")],
            extensions: Vec::new(),
            debounce_ms: 300,
        }
    }
}

impl WatchConfig {
    /// Whether a walked file should be sent to the compiler.
    pub fn accepts(&self, path: &Path) -> bool {
        if self.extensions.is_empty() {
            return true;
        }
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| self.extensions.iter().any(|e| e == ext))
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub(in crate::config) fn validate(&self) -> Result<(), ConfigError> {
        if self.roots.is_empty() {
            return Err(ConfigError::Validation(
                "[watch] roots must list at least one directory".into(),
            ));
        }
        if let Some(ext) = self.extensions.iter().find(|e| e.is_empty() || e.contains('.')) {
            return Err(ConfigError::Validation(format!(
                "[watch] extensions: `{ext}` must be a bare extension like \"sk\""
            )));
        }
        Ok(())
    }
}
