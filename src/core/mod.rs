//! Core types - pure abstractions shared across the codebase.

mod location;
mod state;

pub use location::Location;
pub use state::{setup_shutdown_handler, shutdown_token};
