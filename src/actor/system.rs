//! Actor System - wires up watch mode
//!
//! The system is a thin orchestrator that:
//! - Creates communication channels
//! - Spawns the worker process and the watchers
//! - Runs the actors until Ctrl+C or a fatal worker error

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use super::input::InputActor;
use super::messages::{UiMsg, WatchMsg, WorkerMsg};
use super::ui::UiActor;
use super::watch::WatchActor;
use super::worker::WorkerActor;
use crate::config::ProjectConfig;

/// Actor System - wires up and runs the watch-mode actors.
pub struct ActorSystem {
    config: Arc<ProjectConfig>,
    shutdown: CancellationToken,
    read_stdin: bool,
}

impl ActorSystem {
    /// Create from Arc<ProjectConfig>.
    pub fn with_config(config: Arc<ProjectConfig>) -> Self {
        Self {
            config,
            shutdown: crate::core::shutdown_token(),
            read_stdin: true,
        }
    }

    /// Use a dedicated shutdown token instead of the process-wide one.
    pub fn with_shutdown(mut self, token: CancellationToken) -> Self {
        self.shutdown = token;
        self
    }

    /// Disable the stdin command reader.
    pub fn without_input(mut self) -> Self {
        self.read_stdin = false;
        self
    }

    /// Run the actor system.
    ///
    /// Returns `Ok` on shutdown; a worker failure is returned as an error
    /// after every other actor has been stopped.
    pub async fn run(self) -> Result<()> {
        let (worker_tx, worker_rx) = mpsc::unbounded_channel::<WorkerMsg>();
        let (ui_tx, ui_rx) = mpsc::unbounded_channel::<UiMsg>();
        let (watch_tx, watch_rx) = mpsc::unbounded_channel::<WatchMsg>();

        // Worker first: a bad worker command should fail before watching starts.
        let worker = WorkerActor::spawn(&self.config, worker_rx, ui_tx)
            .context("failed to start compiler worker")?;
        let watch = WatchActor::new(Arc::clone(&self.config), watch_rx, worker_tx.clone())?;
        let ui = UiActor::new(ui_rx, self.config.get_root().to_path_buf());

        crate::log!("watch"; "watching {}", describe_roots(&self.config));

        let mut worker_handle = tokio::spawn(worker.run(self.shutdown.clone()));
        let watch_handle = tokio::spawn(watch.run(self.shutdown.clone()));
        let ui_handle = tokio::spawn(ui.run());
        let input_handle = self.read_stdin.then(|| {
            let input = InputActor::new(
                worker_tx.clone(),
                watch_tx.clone(),
                self.config.get_root().to_path_buf(),
            );
            tokio::spawn(input.run(self.shutdown.clone()))
        });
        drop(worker_tx);

        crate::debug!("actor"; "start");
        let result = tokio::select! {
            _ = self.shutdown.cancelled() => Ok(()),
            joined = &mut worker_handle => match joined {
                Ok(Ok(())) => Ok(()),
                Ok(Err(e)) => Err(anyhow::Error::new(e).context("compiler worker failed")),
                Err(e) => Err(anyhow::Error::new(e).context("worker actor panicked")),
            },
        };

        // Stop everything else; the UI drains once its senders are gone.
        self.shutdown.cancel();
        let _ = watch_handle.await;
        if let Some(handle) = input_handle {
            handle.abort();
        }
        if !worker_handle.is_finished() {
            let _ = worker_handle.await;
        }
        drop(watch_tx);
        let _ = ui_handle.await;

        crate::debug!("actor"; "stopped");
        result
    }
}

fn describe_roots(config: &ProjectConfig) -> String {
    config
        .roots()
        .iter()
        .map(|root| {
            let rel = config.root_relative(root);
            if rel.as_os_str().is_empty() {
                ".".to_string()
            } else {
                rel.display().to_string()
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}
