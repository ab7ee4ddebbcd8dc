//! Utility modules.

pub mod hash;
pub mod path;
pub mod plural;
