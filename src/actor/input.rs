//! Input Actor
//!
//! Stands in for editor events in watch mode. Reads one command per line
//! from stdin:
//!
//! ```text
//! hover src/main.sk:12:5    # tooltip query, 1-based position
//! rebuild                   # re-walk and recompile now
//! ```

use std::path::{Path, PathBuf};

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use super::messages::{WatchMsg, WorkerMsg};
use crate::core::Location;
use crate::utils::path::resolve_path;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Hover(Location),
    Rebuild,
}

/// Parse one input line. Blank lines yield `None`.
pub fn parse_command(line: &str) -> Result<Option<Command>, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }

    let (word, rest) = line
        .split_once(char::is_whitespace)
        .map_or((line, ""), |(w, r)| (w, r.trim()));

    match word {
        "hover" | "h" => rest
            .parse::<Location>()
            .map(|loc| Some(Command::Hover(loc)))
            .map_err(|e| e.to_string()),
        "rebuild" | "r" if rest.is_empty() => Ok(Some(Command::Rebuild)),
        _ => Err(format!(
            "unknown command `{line}` (expected `hover PATH:LINE:COL` or `rebuild`)"
        )),
    }
}

/// Tooltip query for a user-typed location.
///
/// The source is resolved the same way walked files are named, so it matches
/// an input of the last compile.
pub fn tooltip_msg(location: &Location, root: &Path) -> WorkerMsg {
    let (line, column) = location.zero_based();
    WorkerMsg::Tooltip {
        source: resolve_path(&location.path, root)
            .to_string_lossy()
            .into_owned(),
        line,
        column,
    }
}

/// Input Actor - forwards stdin commands
pub struct InputActor {
    worker_tx: mpsc::UnboundedSender<WorkerMsg>,
    watch_tx: mpsc::UnboundedSender<WatchMsg>,
    root: PathBuf,
}

impl InputActor {
    pub fn new(
        worker_tx: mpsc::UnboundedSender<WorkerMsg>,
        watch_tx: mpsc::UnboundedSender<WatchMsg>,
        root: PathBuf,
    ) -> Self {
        Self {
            worker_tx,
            watch_tx,
            root,
        }
    }

    /// Run until stdin closes, shutdown, or the receiving actors are gone.
    pub async fn run(self, shutdown: CancellationToken) {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();

        loop {
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                line = lines.next_line() => match line {
                    Ok(Some(line)) => {
                        if !self.on_line(&line) {
                            break;
                        }
                    }
                    Ok(None) => {
                        crate::debug!("input"; "stdin closed");
                        break;
                    }
                    Err(e) => {
                        crate::debug!("input"; "stdin error: {}", e);
                        break;
                    }
                },
            }
        }
    }

    /// Returns false once the target actor is gone.
    fn on_line(&self, line: &str) -> bool {
        match parse_command(line) {
            Ok(None) => true,
            Ok(Some(Command::Rebuild)) => self.watch_tx.send(WatchMsg::Rebuild).is_ok(),
            Ok(Some(Command::Hover(location))) => self
                .worker_tx
                .send(tooltip_msg(&location, &self.root))
                .is_ok(),
            Err(e) => {
                crate::log!("input"; "{}", e);
                true
            }
        }
    }
}
