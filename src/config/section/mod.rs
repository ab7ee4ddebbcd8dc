//! Configuration section definitions.
//!
//! Each module corresponds to a section in `kiln.toml`:
//!
//! | Module   | TOML Section | Purpose                                |
//! |----------|--------------|----------------------------------------|
//! | `watch`  | `[watch]`    | Project roots, extensions, debounce    |
//! | `worker` | `[worker]`   | Worker command and compile flags       |

mod watch;
mod worker;

pub use watch::WatchConfig;
pub use worker::WorkerConfig;
