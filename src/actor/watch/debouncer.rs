use std::path::PathBuf;
use std::time::{Duration, Instant};

use rustc_hash::FxHashSet;

/// Idle sleep when nothing is pending.
const IDLE: Duration = Duration::from_secs(86400);

/// Pure debouncer: only handles timing and path deduplication.
///
/// Every change restarts the quiet window; once the window passes without
/// further changes, the batch is taken and a single re-walk follows.
pub(super) struct Debouncer {
    window: Duration,
    pub(super) changed: FxHashSet<PathBuf>,
    pub(super) last_event: Option<Instant>,
}

impl Debouncer {
    pub(super) fn new(window: Duration) -> Self {
        Self {
            window,
            changed: FxHashSet::default(),
            last_event: None,
        }
    }

    pub(super) fn add(&mut self, paths: impl IntoIterator<Item = PathBuf>) {
        self.changed.extend(paths);
        self.last_event = Some(Instant::now());
    }

    pub(super) fn set_window(&mut self, window: Duration) {
        self.window = window;
    }

    /// Take the changed paths if the quiet window has elapsed.
    pub(super) fn take_if_ready(&mut self) -> Option<Vec<PathBuf>> {
        if !self.is_ready() {
            return None;
        }
        self.last_event = None;
        Some(std::mem::take(&mut self.changed).into_iter().collect())
    }

    /// Drop pending changes (a walk covering them has already started).
    pub(super) fn clear(&mut self) {
        self.changed.clear();
        self.last_event = None;
    }

    pub(super) fn is_ready(&self) -> bool {
        self.last_event
            .is_some_and(|last| last.elapsed() >= self.window)
    }

    /// Precise sleep duration until next possible ready time.
    pub(super) fn sleep_duration(&self) -> Duration {
        let Some(last_event) = self.last_event else {
            return IDLE;
        };
        self.window
            .saturating_sub(last_event.elapsed())
            .max(Duration::from_millis(1))
    }
}
