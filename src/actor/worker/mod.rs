//! Worker Actor
//!
//! Owns the compiler worker process and the request coordinator in front of
//! it. The coordinator decides what to send; the actor does the I/O:
//!
//! ```text
//! WorkerMsg ──> RequestCoordinator ──> LineOutbox ──flush──> stdin
//!                      ^
//! stdout ──line────────┘──(delivered)──> UiSink ──> UiMsg
//! ```
//!
//! Any worker failure ends the actor with the error; there is no restart.

mod process;

pub use process::WorkerProcess;

use std::collections::VecDeque;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use super::messages::{UiMsg, WorkerMsg};
use crate::config::ProjectConfig;
use crate::coordinator::{RequestCoordinator, ResponseHandler, Transport};
use crate::protocol::{CompileResult, Request, TooltipResult, WorkerError, encode_request};

/// Transport that encodes requests into lines for the actor to flush.
///
/// Compile inputs are read here, when the request actually goes out, so a
/// coalesced request never touches the disk.
#[derive(Debug, Default)]
pub struct LineOutbox {
    lines: VecDeque<String>,
}

impl LineOutbox {
    pub fn pop(&mut self) -> Option<String> {
        self.lines.pop_front()
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }
}

impl Transport for LineOutbox {
    fn send(&mut self, request: &Request) -> Result<(), WorkerError> {
        self.lines.push_back(encode_request(request)?);
        Ok(())
    }
}

/// Forwards delivered responses to the UI actor.
struct UiSink<'a> {
    tx: &'a mpsc::UnboundedSender<UiMsg>,
}

impl ResponseHandler for UiSink<'_> {
    fn on_compile(&mut self, result: CompileResult) {
        let _ = self.tx.send(UiMsg::Compiled(result));
    }

    fn on_tooltip_query(&mut self, result: TooltipResult) {
        let _ = self.tx.send(UiMsg::Tooltip(result));
    }
}

/// Worker Actor - the only writer to the worker channel
pub struct WorkerActor {
    rx: mpsc::UnboundedReceiver<WorkerMsg>,
    ui_tx: mpsc::UnboundedSender<UiMsg>,
    process: WorkerProcess,
    coordinator: RequestCoordinator<LineOutbox>,
}

impl WorkerActor {
    /// Spawn the configured worker process.
    pub fn spawn(
        config: &ProjectConfig,
        rx: mpsc::UnboundedReceiver<WorkerMsg>,
        ui_tx: mpsc::UnboundedSender<UiMsg>,
    ) -> Result<Self, WorkerError> {
        let program = config
            .worker
            .program()
            .ok_or_else(|| WorkerError::ProcessFailure("no worker command configured".into()))?;
        let process = WorkerProcess::spawn(program, config.worker.args(), config.get_root())?;

        Ok(Self {
            rx,
            ui_tx,
            process,
            coordinator: RequestCoordinator::new(LineOutbox::default(), config.compile_flags()),
        })
    }

    /// Run until shutdown, until every sender is gone, or until the worker
    /// fails. The process is killed on the way out.
    pub async fn run(mut self, shutdown: CancellationToken) -> Result<(), WorkerError> {
        let result = self.run_loop(&shutdown).await;
        self.process.kill().await;
        if let Err(e) = &result {
            crate::debug!("worker"; "stopped: {}", e);
        }
        result
    }

    async fn run_loop(&mut self, shutdown: &CancellationToken) -> Result<(), WorkerError> {
        loop {
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => return Ok(()),
                line = self.process.next_line() => self.on_line(&line?)?,
                msg = self.rx.recv() => match msg {
                    Some(msg) => self.on_msg(msg)?,
                    None => return Ok(()),
                },
            }
            self.flush().await?;
        }
    }

    fn on_line(&mut self, line: &str) -> Result<(), WorkerError> {
        if line.trim().is_empty() {
            return Ok(());
        }
        let mut sink = UiSink { tx: &self.ui_tx };
        self.coordinator.on_response_line(line, &mut sink)?;
        Ok(())
    }

    fn on_msg(&mut self, msg: WorkerMsg) -> Result<(), WorkerError> {
        match msg {
            WorkerMsg::Compile { files } => {
                let count = files.len();
                let id = self.coordinator.request_compile(files)?;
                crate::debug!("worker"; "compile #{} requested ({} files)", id, count);
            }
            WorkerMsg::Tooltip {
                source,
                line,
                column,
            } => {
                let id = self.coordinator.request_tooltip(source, line, column)?;
                let _ = self.ui_tx.send(UiMsg::TooltipRequested { id });
            }
        }
        Ok(())
    }

    /// Write every queued request line to the worker.
    async fn flush(&mut self) -> Result<(), WorkerError> {
        while let Some(line) = self.coordinator.transport_mut().pop() {
            self.process.write_line(&line).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use std::time::Duration;

    use super::*;
    use crate::protocol::CompileFlags;

    #[test]
    fn test_outbox_queues_encoded_lines() {
        let mut coordinator = RequestCoordinator::new(LineOutbox::default(), CompileFlags::default());

        coordinator.request_compile(vec![PathBuf::from("/nonexistent/a.sk")]).unwrap();
        coordinator.request_tooltip("/p/a.sk", 0, 0).unwrap();

        // Second request is pending, not sent
        assert_eq!(coordinator.transport().len(), 1);
        let line = coordinator.transport_mut().pop().unwrap();
        assert!(line.starts_with("{\"type\":\"compile\",\"id\":1"), "{line}");
        assert!(!line.contains('\n'));
        assert!(coordinator.transport_mut().pop().is_none());
    }

    /// Answers compile with no diagnostics and tooltips with a fixed text.
    #[cfg(unix)]
    const FAKE_WORKER: &str = r#"
while read -r line; do
  id=$(printf '%s' "$line" | sed -E 's/^\{"type":"[a-z-]+","id":([0-9]+).*/\1/')
  case "$line" in
    *'"type":"compile"'*)
      printf '{"type":"compile","id":%s,"log":{"diagnostics":[]}}\n' "$id" ;;
    *'"type":"tooltip-query"'*)
      printf '{"type":"tooltip-query","id":%s,"range":null,"tooltip":"def main()"}\n' "$id" ;;
  esac
done
"#;

    #[cfg(unix)]
    fn spawn_actor(
        script: &str,
    ) -> (
        mpsc::UnboundedSender<WorkerMsg>,
        mpsc::UnboundedReceiver<UiMsg>,
        tokio::task::JoinHandle<Result<(), WorkerError>>,
        CancellationToken,
    ) {
        let mut config = ProjectConfig::default();
        config.set_root(&std::env::current_dir().unwrap());
        config.worker.command = vec!["sh".into(), "-c".into(), script.into()];

        let (worker_tx, worker_rx) = mpsc::unbounded_channel();
        let (ui_tx, ui_rx) = mpsc::unbounded_channel();
        let actor = WorkerActor::spawn(&config, worker_rx, ui_tx).unwrap();
        let shutdown = CancellationToken::new();
        let handle = tokio::spawn(actor.run(shutdown.clone()));
        (worker_tx, ui_rx, handle, shutdown)
    }

    #[cfg(unix)]
    async fn next_ui(rx: &mut mpsc::UnboundedReceiver<UiMsg>) -> UiMsg {
        tokio::time::timeout(Duration::from_secs(10), rx.recv())
            .await
            .expect("no ui message")
            .expect("worker actor stopped")
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_compile_round_trip() {
        let (worker_tx, mut ui_rx, handle, shutdown) = spawn_actor(FAKE_WORKER);

        worker_tx.send(WorkerMsg::Compile { files: Vec::new() }).unwrap();
        match next_ui(&mut ui_rx).await {
            UiMsg::Compiled(result) => {
                assert_eq!(result.id, 1);
                assert!(result.log.diagnostics.is_empty());
            }
            other => panic!("unexpected: {other:?}"),
        }

        shutdown.cancel();
        assert!(handle.await.unwrap().is_ok());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_tooltip_round_trip() {
        let (worker_tx, mut ui_rx, handle, shutdown) = spawn_actor(FAKE_WORKER);

        worker_tx
            .send(WorkerMsg::Tooltip {
                source: "/p/main.sk".into(),
                line: 2,
                column: 4,
            })
            .unwrap();

        assert!(matches!(
            next_ui(&mut ui_rx).await,
            UiMsg::TooltipRequested { id: 1 }
        ));
        match next_ui(&mut ui_rx).await {
            UiMsg::Tooltip(result) => {
                assert_eq!(result.id, 1);
                assert_eq!(result.tooltip.as_deref(), Some("def main()"));
            }
            other => panic!("unexpected: {other:?}"),
        }

        shutdown.cancel();
        assert!(handle.await.unwrap().is_ok());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_malformed_output_is_fatal() {
        let (worker_tx, _ui_rx, handle, _shutdown) =
            spawn_actor("read -r line; echo 'not json'; sleep 5");

        worker_tx.send(WorkerMsg::Compile { files: Vec::new() }).unwrap();
        let result = tokio::time::timeout(Duration::from_secs(10), handle)
            .await
            .unwrap()
            .unwrap();
        assert!(matches!(result, Err(WorkerError::MalformedMessage { .. })));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_worker_exit_is_fatal() {
        let (_worker_tx, _ui_rx, handle, _shutdown) = spawn_actor("exit 3");

        let result = tokio::time::timeout(Duration::from_secs(10), handle)
            .await
            .unwrap()
            .unwrap();
        assert!(matches!(result, Err(WorkerError::ProcessFailure(_))));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_actor_stops_when_senders_gone() {
        let (worker_tx, _ui_rx, handle, _shutdown) = spawn_actor(FAKE_WORKER);
        drop(worker_tx);

        let result = tokio::time::timeout(Duration::from_secs(10), handle)
            .await
            .unwrap()
            .unwrap();
        assert!(result.is_ok());
    }
}
