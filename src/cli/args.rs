//! Command-line interface definitions.

use clap::{ColorChoice, Parser, Subcommand};
use std::path::PathBuf;

use crate::core::Location;

/// Kiln - keeps a compiler worker fed from a watched source tree
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Control colored output (auto, always, never)
    #[arg(long, global = true, default_value = "auto")]
    pub color: ColorChoice,

    /// Config file path (default: kiln.toml)
    #[arg(short = 'C', long, global = true, default_value = "kiln.toml", value_hint = clap::ValueHint::FilePath)]
    pub config: PathBuf,

    /// Enable verbose output for debugging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Worker command line, overrides `[worker] command` (e.g. "skewc --worker")
    ///
    /// Split on whitespace with no shell quoting: an argument containing
    /// spaces must be set through `[worker] command` in kiln.toml instead.
    #[arg(long, global = true, value_hint = clap::ValueHint::CommandString)]
    pub worker: Option<String>,

    /// Compile target, overrides `[worker] target`
    #[arg(long, global = true)]
    pub target: Option<String>,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Watch project roots and recompile on every change
    #[command(visible_alias = "w")]
    Watch {
        /// Project roots (relative to current directory). Defaults to `[watch] roots`
        #[arg(value_name = "ROOT", value_hint = clap::ValueHint::DirPath)]
        roots: Vec<PathBuf>,
    },

    /// Compile once and report diagnostics; fails if any error is reported
    #[command(visible_alias = "c")]
    Check {
        /// Project roots (relative to current directory). Defaults to `[watch] roots`
        #[arg(value_name = "ROOT", value_hint = clap::ValueHint::DirPath)]
        roots: Vec<PathBuf>,
    },

    /// Compile once, then show the tooltip at a source location
    #[command(visible_alias = "h")]
    Hover {
        /// Location as `path:line:column` (1-based)
        #[arg(value_name = "PATH:LINE:COL")]
        location: Location,

        /// Project roots (relative to current directory). Defaults to `[watch] roots`
        #[arg(short, long = "root", value_name = "ROOT", value_hint = clap::ValueHint::DirPath)]
        roots: Vec<PathBuf>,
    },
}
