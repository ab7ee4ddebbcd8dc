//! Root-set change detection.
//!
//! The tracker keeps one recursive subscription per project root. Updating
//! the root set diffs it against the previous one, tears down removed roots,
//! attaches added ones, and raises `RootsChanged` once if anything moved.

use std::path::{Path, PathBuf};

use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use rustc_hash::FxHashSet;
use tokio::sync::mpsc;

use crate::actor::messages::WatchEvent;

/// Recursive filesystem subscriptions, one per root.
pub trait WatchBackend {
    fn watch(&mut self, root: &Path) -> notify::Result<()>;
    fn unwatch(&mut self, root: &Path) -> notify::Result<()>;
}

impl WatchBackend for RecommendedWatcher {
    fn watch(&mut self, root: &Path) -> notify::Result<()> {
        Watcher::watch(self, root, RecursiveMode::Recursive)
    }

    fn unwatch(&mut self, root: &Path) -> notify::Result<()> {
        Watcher::unwatch(self, root)
    }
}

/// Symmetric difference between two root sets, sorted for stable logs.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RootsDiff {
    pub added: Vec<PathBuf>,
    pub removed: Vec<PathBuf>,
}

impl RootsDiff {
    pub fn between(old: &FxHashSet<PathBuf>, new: &FxHashSet<PathBuf>) -> Self {
        let mut added: Vec<_> = new.difference(old).cloned().collect();
        let mut removed: Vec<_> = old.difference(new).cloned().collect();
        added.sort();
        removed.sort();
        Self { added, removed }
    }

    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

pub struct DirectoryTracker<B> {
    backend: B,
    /// Roots the project asks for
    desired: FxHashSet<PathBuf>,
    /// Roots with a live subscription (missing directories are not attached)
    attached: FxHashSet<PathBuf>,
    events: mpsc::UnboundedSender<WatchEvent>,
}

impl<B: WatchBackend> DirectoryTracker<B> {
    pub fn new(backend: B, events: mpsc::UnboundedSender<WatchEvent>) -> Self {
        Self {
            backend,
            desired: FxHashSet::default(),
            attached: FxHashSet::default(),
            events,
        }
    }

    /// Replace the root set.
    pub fn update(&mut self, roots: impl IntoIterator<Item = PathBuf>) -> RootsDiff {
        let new: FxHashSet<PathBuf> = roots.into_iter().collect();
        let diff = RootsDiff::between(&self.desired, &new);

        for root in &diff.removed {
            if self.attached.remove(root)
                && let Err(e) = self.backend.unwatch(root)
            {
                crate::debug!("watch"; "unwatch {}: {}", root.display(), e);
            }
            crate::debug!("watch"; "root removed: {}", root.display());
        }
        for root in &diff.added {
            self.attach(root);
            crate::debug!("watch"; "root added: {}", root.display());
        }
        self.desired = new;

        if !diff.is_empty() {
            let _ = self.events.send(WatchEvent::RootsChanged);
        }
        diff
    }

    /// Re-attach roots that were missing or removed and recreated.
    ///
    /// Returns true if any root was (re)attached.
    pub fn maintain(&mut self) -> bool {
        // Drop stale handles for roots that no longer exist.
        self.attached.retain(|path| path.exists());

        let missing: Vec<PathBuf> = self
            .desired
            .iter()
            .filter(|root| !self.attached.contains(*root) && root.exists())
            .cloned()
            .collect();

        let mut reattached = false;
        for root in missing {
            if self.attach(&root) {
                crate::debug!("watch"; "re-attached watch: {}", root.display());
                reattached = true;
            }
        }
        reattached
    }

    /// Current roots, sorted.
    pub fn roots(&self) -> Vec<PathBuf> {
        let mut roots: Vec<_> = self.desired.iter().cloned().collect();
        roots.sort();
        roots
    }

    /// Whether some root still waits for its directory to appear.
    pub fn has_missing(&self) -> bool {
        self.desired.len() > self.attached.len()
    }

    pub fn is_attached(&self, root: &Path) -> bool {
        self.attached.contains(root)
    }

    fn attach(&mut self, root: &Path) -> bool {
        if !root.exists() {
            crate::debug!("watch"; "root not found yet: {}", root.display());
            return false;
        }
        match self.backend.watch(root) {
            Ok(()) => {
                self.attached.insert(root.to_path_buf());
                true
            }
            Err(e) => {
                crate::log!("watch"; "cannot watch {}: {}", root.display(), e);
                false
            }
        }
    }
}
