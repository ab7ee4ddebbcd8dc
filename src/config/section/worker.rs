//! `[worker]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [worker]
//! command = ["skewc", "--worker"]   # Program + arguments
//! target = "js"                     # Compile target
//! stop_after_resolve = true         # Diagnostics only, skip code generation
//! ```
//!
//! The worker speaks line-delimited JSON on stdin/stdout and handles one
//! request at a time.

use serde::{Deserialize, Serialize};

use crate::config::ConfigError;
use crate::protocol::CompileFlags;

/// Compiler worker settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerConfig {
    /// Worker program followed by its arguments.
    pub command: Vec<String>,

    /// Compile target passed with every compile request.
    pub target: String,

    /// Stop after name resolution (faster, diagnostics only).
    pub stop_after_resolve: bool,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        let flags = CompileFlags::default();
        Self {
            command: Vec::new(),
            target: flags.target,
            stop_after_resolve: flags.stop_after_resolve,
        }
    }
}

impl WorkerConfig {
    pub fn program(&self) -> Option<&str> {
        self.command.first().map(String::as_str)
    }

    pub fn args(&self) -> &[String] {
        self.command.get(1..).unwrap_or_default()
    }

    pub fn compile_flags(&self) -> CompileFlags {
        CompileFlags {
            target: self.target.clone(),
            stop_after_resolve: self.stop_after_resolve,
        }
    }

    pub(in crate::config) fn validate(&self) -> Result<(), ConfigError> {
        match self.program() {
            Some(program) if !program.trim().is_empty() => {}
            _ => {
                return Err(ConfigError::Validation(
                    "[worker] command is empty; set it in kiln.toml or pass --worker".into(),
                ));
            }
        }
        if self.target.trim().is_empty() {
            return Err(ConfigError::Validation("[worker] target is empty".into()));
        }
        Ok(())
    }
}
