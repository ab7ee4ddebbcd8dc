//! Watch Actor
//!
//! Owns build invalidation: which roots are subscribed, which walk is active,
//! and when the next walk starts.
//!
//! ```text
//! notify ──Changed──> Debouncer ──quiet──┐
//! tracker ──RootsChanged─────────────────┼──> WalkState::start ──files──> WorkerMsg::Compile
//! input ──Rebuild────────────────────────┘
//! ```
//!
//! A new walk always cancels the active one: the root set or the tree may
//! have changed underneath it, so its result would be stale.

// Pure timing and deduplication.
mod debouncer;
// Root-set diffing and subscriptions.
mod tracker;

use tracker::DirectoryTracker;

use std::future::pending;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use notify::{EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use super::messages::{WatchEvent, WatchMsg, WorkerMsg};
use crate::config::{ProjectConfig, cfg, reload_config};
use crate::walk::{Walk, walk};
use debouncer::Debouncer;

/// How often missing roots are probed while nothing else is pending.
const MAINTAIN_INTERVAL: Duration = Duration::from_secs(1);

// =============================================================================
// WalkState
// =============================================================================

/// The active walk, if any. At most one walk is logically active.
#[derive(Default)]
pub struct WalkState {
    active: Option<Walk>,
}

impl WalkState {
    /// Start walking `roots`, cancelling and discarding the previous walk.
    pub fn start(&mut self, roots: Vec<PathBuf>) {
        self.cancel();
        self.active = Some(walk(roots));
    }

    pub fn cancel(&mut self) {
        if let Some(old) = self.active.take() {
            old.handle.cancel();
            crate::debug!("walk"; "cancelled active walk");
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    /// Files of the active walk once it completes. Never resolves when idle.
    ///
    /// Cancel-safe: dropping the future keeps the walk active.
    pub async fn finished(&mut self) -> Vec<PathBuf> {
        let Some(active) = self.active.as_mut() else {
            return pending().await;
        };
        let result = (&mut active.files).await;
        self.active = None;
        match result {
            Ok(files) => files,
            Err(_) => pending().await,
        }
    }
}

impl Drop for WalkState {
    fn drop(&mut self) {
        self.cancel();
    }
}

// =============================================================================
// WatchActor
// =============================================================================

/// Watch Actor - turns filesystem churn into compile requests
pub struct WatchActor {
    rx: mpsc::UnboundedReceiver<WatchMsg>,
    worker_tx: mpsc::UnboundedSender<WorkerMsg>,
    events_rx: mpsc::UnboundedReceiver<WatchEvent>,
    tracker: DirectoryTracker<RecommendedWatcher>,
    /// Watches the config file's directory (must be kept alive)
    _config_watcher: Option<RecommendedWatcher>,
    debouncer: Debouncer,
    walk: WalkState,
    config: Arc<ProjectConfig>,
}

impl WatchActor {
    /// Subscribe to every root. The first `RootsChanged` this raises starts
    /// the initial walk as soon as the actor runs.
    pub fn new(
        config: Arc<ProjectConfig>,
        rx: mpsc::UnboundedReceiver<WatchMsg>,
        worker_tx: mpsc::UnboundedSender<WorkerMsg>,
    ) -> Result<Self> {
        let (events_tx, events_rx) = mpsc::unbounded_channel();

        let watcher = notify::recommended_watcher(forward_changes(events_tx.clone()))
            .context("failed to create file watcher")?;
        let mut tracker = DirectoryTracker::new(watcher, events_tx.clone());
        tracker.update(config.roots());

        let config_watcher = watch_config_file(&config.config_path, events_tx);

        Ok(Self {
            rx,
            worker_tx,
            events_rx,
            tracker,
            _config_watcher: config_watcher,
            debouncer: Debouncer::new(config.watch.debounce()),
            walk: WalkState::default(),
            config,
        })
    }

    /// Run the actor event loop until shutdown or the worker actor stops.
    pub async fn run(mut self, shutdown: CancellationToken) {
        loop {
            let sleep = self.sleep_duration();
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                Some(event) = self.events_rx.recv() => self.on_event(event),
                Some(msg) = self.rx.recv() => match msg {
                    WatchMsg::Rebuild => self.start_walk("rebuild requested"),
                },
                files = self.walk.finished() => {
                    if !self.on_walk_done(files) {
                        crate::debug!("watch"; "worker actor gone, stopping");
                        break;
                    }
                }
                _ = tokio::time::sleep(sleep) => self.on_tick(),
            }
        }
    }

    fn on_event(&mut self, event: WatchEvent) {
        match event {
            WatchEvent::Changed(paths) => {
                let roots = self.tracker.roots();
                let total = paths.len();
                let visible: Vec<PathBuf> = paths
                    .into_iter()
                    .filter(|p| !is_hidden_under(p, &roots))
                    .collect();
                // Events without paths (rescans) still count as a change.
                if total > 0 && visible.is_empty() {
                    return;
                }
                self.debouncer.add(visible);
            }
            WatchEvent::RootsChanged => self.start_walk("roots changed"),
            WatchEvent::ConfigChanged => self.reload(),
        }
    }

    fn on_tick(&mut self) {
        if self.tracker.maintain() {
            self.start_walk("root appeared");
            return;
        }
        if let Some(changed) = self.debouncer.take_if_ready() {
            crate::debug_do! {
                for path in &changed {
                    crate::debug!("watch"; "changed: {}", path.display());
                }
            }
            self.start_walk("files changed");
        }
    }

    fn sleep_duration(&self) -> Duration {
        let debounce = self.debouncer.sleep_duration();
        if self.tracker.has_missing() {
            debounce.min(MAINTAIN_INTERVAL)
        } else {
            debounce
        }
    }

    fn start_walk(&mut self, reason: &str) {
        let roots = self.tracker.roots();
        crate::debug!("walk"; "start ({}): {} root(s)", reason, roots.len());
        // The new walk covers everything queued so far.
        self.debouncer.clear();
        self.walk.start(roots);
    }

    /// Forward the walk's files as a compile. Returns false if the worker
    /// actor is gone.
    fn on_walk_done(&mut self, files: Vec<PathBuf>) -> bool {
        let total = files.len();
        let files: Vec<PathBuf> = files
            .into_iter()
            .filter(|f| self.config.watch.accepts(f))
            .collect();
        crate::debug!("walk"; "finished: {} of {} files selected", files.len(), total);

        // An empty set is still compiled so stale diagnostics get cleared.
        self.worker_tx.send(WorkerMsg::Compile { files }).is_ok()
    }

    fn reload(&mut self) {
        match reload_config() {
            Ok(false) => crate::debug!("watch"; "config unchanged"),
            Ok(true) => {
                let new = cfg();
                crate::log!("watch"; "config reloaded");

                if new.worker.command != self.config.worker.command
                    || new.compile_flags() != self.config.compile_flags()
                {
                    crate::log!("watch"; "worker settings take effect after restart");
                }

                let extensions_changed = new.watch.extensions != self.config.watch.extensions;
                self.debouncer.set_window(new.watch.debounce());
                self.config = new;

                let diff = self.tracker.update(self.config.roots());
                if diff.is_empty() && extensions_changed {
                    self.start_walk("extensions changed");
                }
            }
            Err(e) => crate::log!("error"; "config reload failed: {:#}", e),
        }
    }
}

// =============================================================================
// Subscriptions
// =============================================================================

/// notify handler for root subscriptions.
fn forward_changes(
    tx: mpsc::UnboundedSender<WatchEvent>,
) -> impl FnMut(notify::Result<notify::Event>) + Send + 'static {
    move |res| match res {
        // Reads of compile inputs show up as access events.
        Ok(event) if matches!(event.kind, EventKind::Access(_)) => {}
        Ok(event) => {
            let _ = tx.send(WatchEvent::Changed(event.paths));
        }
        Err(e) => crate::log!("watch"; "notify error: {}", e),
    }
}

/// Watch the directory holding the config file; editors often replace the
/// file on save, which would drop a watch on the file itself.
fn watch_config_file(
    config_path: &Path,
    tx: mpsc::UnboundedSender<WatchEvent>,
) -> Option<RecommendedWatcher> {
    let dir = config_path.parent()?;
    let name = config_path.file_name()?.to_os_string();
    if !config_path.exists() {
        return None;
    }

    let handler = move |res: notify::Result<notify::Event>| {
        let Ok(event) = res else { return };
        if matches!(event.kind, EventKind::Access(_)) {
            return;
        }
        if event.paths.iter().any(|p| p.file_name() == Some(name.as_os_str())) {
            let _ = tx.send(WatchEvent::ConfigChanged);
        }
    };

    let mut watcher = match notify::recommended_watcher(handler) {
        Ok(watcher) => watcher,
        Err(e) => {
            crate::log!("watch"; "cannot watch config: {}", e);
            return None;
        }
    };
    if let Err(e) = Watcher::watch(&mut watcher, dir, RecursiveMode::NonRecursive) {
        crate::log!("watch"; "cannot watch config: {}", e);
        return None;
    }
    Some(watcher)
}

/// Whether `path` sits below a hidden entry of the root containing it.
fn is_hidden_under(path: &Path, roots: &[PathBuf]) -> bool {
    let Some(rel) = roots.iter().find_map(|root| path.strip_prefix(root).ok()) else {
        return false;
    };
    rel.components().any(|c| {
        c.as_os_str()
            .to_str()
            .is_some_and(|name| name.starts_with('.'))
    })
}

// =============================================================================
// Tests
// =============================================================================
