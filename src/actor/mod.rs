//! Actor System for Watch Mode
//!
//! Message-passing concurrency on a single control thread:
//!
//! ```text
//! WatchActor --> WorkerActor --> UiActor
//! (walk)         (coordinator)   (render)
//!                    ^
//! InputActor --------+
//! (stdin)
//! ```
//!
//! # Module Structure
//!
//! - `messages` - Message types for inter-actor communication
//! - `watch` - Root tracking, debouncing and directory walks
//! - `worker` - Compiler worker process behind the request coordinator
//! - `ui` - Diagnostics and tooltip rendering
//! - `input` - Editor commands read from stdin
//! - `system` - Wires up and runs actors

pub mod input;
pub mod messages;
pub mod system;
pub mod ui;
pub mod watch;
pub mod worker;

pub use system::ActorSystem;
