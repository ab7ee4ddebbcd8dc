//! Directory Walker - cancellable concurrent enumeration
//!
//! Every directory listing and every entry stat is its own task; nothing
//! waits for its siblings. A driver task counts outstanding operations and
//! delivers the file list once the count drops to zero:
//!
//! ```text
//!            list(root) ──> [a, b, C]
//!                            │  │  └─ stat ─> dir ──> list(C) ──> [c] ── stat ─> file
//!                            │  └──── stat ─> file
//!                            └─────── stat ─> file
//!
//! outstanding: 1 → 3 → 2 → 1 → 1 → 1 → 0  ⇒  files = {a, b, c}
//! ```
//!
//! Cancellation is cooperative: operations already issued still finish, but
//! their results are dropped and the walk never yields files.

use std::path::{Path, PathBuf};

use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;

use crate::protocol::DirectoryAccessError;

/// Entry names starting with this marker are skipped.
const HIDDEN_MARKER: char = '.';

// =============================================================================
// Public API
// =============================================================================

/// Cancels one walk. Cloning shares the same walk.
#[derive(Debug, Clone)]
pub struct WalkHandle {
    token: CancellationToken,
}

impl WalkHandle {
    /// Stop the walk. Idempotent.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

/// A walk in progress.
///
/// `files` resolves with every regular file found, or with an error if the
/// walk was cancelled (its sender is dropped without sending).
#[derive(Debug)]
pub struct Walk {
    pub handle: WalkHandle,
    pub files: oneshot::Receiver<Vec<PathBuf>>,
}

/// Start walking `roots` on the current runtime.
///
/// Roots are assumed not to nest; a file under two roots is reported twice.
pub fn walk(roots: impl IntoIterator<Item = PathBuf>) -> Walk {
    let token = CancellationToken::new();
    let (files_tx, files_rx) = oneshot::channel();
    let roots: Vec<PathBuf> = roots.into_iter().collect();

    tokio::spawn(drive(roots, token.clone(), files_tx));

    Walk {
        handle: WalkHandle { token },
        files: files_rx,
    }
}

// =============================================================================
// Driver
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EntryKind {
    File,
    Dir,
    Other,
}

enum OpResult {
    Listed(Vec<PathBuf>),
    Stated(PathBuf, EntryKind),
    Failed(DirectoryAccessError),
}

/// Issues operations and tracks how many are still outstanding.
struct Ops {
    token: CancellationToken,
    tx: mpsc::UnboundedSender<OpResult>,
    outstanding: usize,
}

impl Ops {
    fn list(&mut self, dir: PathBuf) {
        self.outstanding += 1;
        let token = self.token.clone();
        let tx = self.tx.clone();
        tokio::spawn(async move {
            if token.is_cancelled() {
                return;
            }
            let result = match list_dir(&dir).await {
                Ok(entries) => OpResult::Listed(entries),
                Err(source) => OpResult::Failed(DirectoryAccessError::List { path: dir, source }),
            };
            if !token.is_cancelled() {
                let _ = tx.send(result);
            }
        });
    }

    fn stat(&mut self, path: PathBuf) {
        self.outstanding += 1;
        let token = self.token.clone();
        let tx = self.tx.clone();
        tokio::spawn(async move {
            if token.is_cancelled() {
                return;
            }
            let result = match entry_kind(&path).await {
                Ok(kind) => OpResult::Stated(path, kind),
                Err(source) => OpResult::Failed(DirectoryAccessError::Stat { path, source }),
            };
            if !token.is_cancelled() {
                let _ = tx.send(result);
            }
        });
    }
}

async fn drive(
    roots: Vec<PathBuf>,
    token: CancellationToken,
    files_tx: oneshot::Sender<Vec<PathBuf>>,
) {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut ops = Ops {
        token: token.clone(),
        tx,
        outstanding: 0,
    };
    let mut files = Vec::new();

    for root in roots {
        ops.list(root);
    }

    while ops.outstanding > 0 {
        let result = tokio::select! {
            biased;
            _ = token.cancelled() => return,
            Some(result) = rx.recv() => result,
        };
        ops.outstanding -= 1;

        match result {
            OpResult::Listed(entries) => {
                for entry in entries {
                    if !is_hidden(&entry) {
                        ops.stat(entry);
                    }
                }
            }
            OpResult::Stated(path, EntryKind::File) => files.push(path),
            OpResult::Stated(path, EntryKind::Dir) => ops.list(path),
            OpResult::Stated(_, EntryKind::Other) => {}
            OpResult::Failed(e) => crate::debug!("walk"; "skip: {}", describe(&e)),
        }
    }

    if token.is_cancelled() {
        return;
    }
    crate::debug!("walk"; "found {} files", files.len());
    let _ = files_tx.send(files);
}

async fn list_dir(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut entries = Vec::new();
    let mut read_dir = tokio::fs::read_dir(dir).await?;
    while let Some(entry) = read_dir.next_entry().await? {
        entries.push(entry.path());
    }
    Ok(entries)
}

/// Symlinks are followed to files only: a linked directory may point back
/// at one of its ancestors.
async fn entry_kind(path: &Path) -> std::io::Result<EntryKind> {
    let meta = tokio::fs::symlink_metadata(path).await?;
    if meta.file_type().is_symlink() {
        let target = tokio::fs::metadata(path).await?;
        return Ok(if target.is_file() {
            EntryKind::File
        } else {
            EntryKind::Other
        });
    }

    Ok(if meta.is_file() {
        EntryKind::File
    } else if meta.is_dir() {
        EntryKind::Dir
    } else {
        EntryKind::Other
    })
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.starts_with(HIDDEN_MARKER))
}

fn describe(e: &DirectoryAccessError) -> String {
    match std::error::Error::source(e) {
        Some(source) => format!("{e}: {source}"),
        None => e.to_string(),
    }
}

// =============================================================================
// Tests
// =============================================================================
