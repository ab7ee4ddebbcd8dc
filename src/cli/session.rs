//! One-shot worker session shared by `check` and `hover`.

use std::path::PathBuf;

use anyhow::{Context, Result, anyhow, bail};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::actor::messages::{UiMsg, WorkerMsg};
use crate::actor::worker::WorkerActor;
use crate::config::ProjectConfig;
use crate::protocol::{CompileLog, WorkerError};
use crate::walk::{Walk, walk};

/// A worker actor driven directly instead of through the UI actor.
pub(super) struct WorkerSession {
    worker_tx: mpsc::UnboundedSender<WorkerMsg>,
    ui_rx: mpsc::UnboundedReceiver<UiMsg>,
    handle: JoinHandle<Result<(), WorkerError>>,
    shutdown: CancellationToken,
}

impl WorkerSession {
    pub(super) fn start(config: &ProjectConfig) -> Result<Self> {
        let (worker_tx, worker_rx) = mpsc::unbounded_channel();
        let (ui_tx, ui_rx) = mpsc::unbounded_channel();
        let shutdown = crate::core::shutdown_token().child_token();

        let worker = WorkerActor::spawn(config, worker_rx, ui_tx)
            .context("failed to start compiler worker")?;
        let handle = tokio::spawn(worker.run(shutdown.clone()));

        Ok(Self {
            worker_tx,
            ui_rx,
            handle,
            shutdown,
        })
    }

    pub(super) fn send(&self, msg: WorkerMsg) -> Result<()> {
        self.worker_tx
            .send(msg)
            .map_err(|_| anyhow!("compiler worker stopped"))
    }

    /// Next worker result. Fails once the worker stops (error or Ctrl+C);
    /// do not call again after an error.
    pub(super) async fn next(&mut self) -> Result<UiMsg> {
        tokio::select! {
            biased;
            Some(msg) = self.ui_rx.recv() => Ok(msg),
            joined = &mut self.handle => match joined {
                Ok(Ok(())) => bail!("interrupted"),
                Ok(Err(e)) => Err(e).context("compiler worker failed"),
                Err(e) => Err(e).context("worker actor panicked"),
            },
        }
    }

    /// Wait for the next compile result.
    pub(super) async fn compiled(&mut self) -> Result<CompileLog> {
        loop {
            match self.next().await? {
                UiMsg::Compiled(result) => return Ok(result.log),
                other => crate::debug!("worker"; "ignored {:?}", other),
            }
        }
    }

    /// Stop the worker and wait for it to exit.
    pub(super) async fn finish(self) {
        self.shutdown.cancel();
        let _ = self.handle.await;
    }
}

/// Walk every root once and keep the files the project compiles, sorted.
pub(super) async fn walk_project(config: &ProjectConfig) -> Result<Vec<PathBuf>> {
    let Walk { handle, files } = walk(config.roots());
    let shutdown = crate::core::shutdown_token();

    let files = tokio::select! {
        files = files => files.context("walk cancelled")?,
        _ = shutdown.cancelled() => {
            handle.cancel();
            bail!("interrupted");
        }
    };

    let mut files: Vec<PathBuf> = files
        .into_iter()
        .filter(|f| config.watch.accepts(f))
        .collect();
    files.sort();
    Ok(files)
}
