//! Command-line interface module.

mod args;
pub mod check;
pub mod hover;
mod session;
pub mod watch;

pub use args::{Cli, Commands};
