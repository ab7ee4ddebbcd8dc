//! Actor Message Definitions
//!
//! Message types for inter-actor communication.
//!
//! ```text
//! WatchActor --Compile--> WorkerActor --Compiled/Tooltip--> UiActor
//!                             ^
//! InputActor --Tooltip--------+
//!     |
//!     +------Rebuild--> WatchActor
//! ```

use std::path::PathBuf;

use crate::protocol::{CompileResult, RequestId, TooltipResult};

// =============================================================================
// WorkerActor Messages
// =============================================================================

/// Messages to Worker Actor
#[derive(Debug)]
pub enum WorkerMsg {
    /// Compile the given file set (replaces any queued compile)
    Compile { files: Vec<PathBuf> },
    /// Query the tooltip at a 0-based position
    Tooltip {
        source: String,
        line: u32,
        column: u32,
    },
}

// =============================================================================
// UiActor Messages
// =============================================================================

/// Messages to UI Actor
#[derive(Debug)]
pub enum UiMsg {
    /// Latest compile finished
    Compiled(CompileResult),
    /// A tooltip query was issued; older tooltip results are stale from now on
    TooltipRequested { id: RequestId },
    /// Tooltip query finished
    Tooltip(TooltipResult),
}

// =============================================================================
// WatchActor Messages
// =============================================================================

/// Commands to Watch Actor
#[derive(Debug)]
pub enum WatchMsg {
    /// Re-walk every root now, bypassing the debounce window
    Rebuild,
}

/// Events raised by filesystem subscriptions and the root tracker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchEvent {
    /// Something changed under a watched root
    Changed(Vec<PathBuf>),
    /// The root set changed (emitted once per update)
    RootsChanged,
    /// The config file was written
    ConfigChanged,
}
