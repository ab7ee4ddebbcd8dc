//! Compiler worker child process.
//!
//! Line-delimited JSON over stdin/stdout. The worker must never write to
//! stderr or exit on its own: either one is a `ProcessFailure`.

use std::path::Path;
use std::process::Stdio;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::process::{Child, ChildStderr, ChildStdin, ChildStdout, Command};

use crate::protocol::WorkerError;

pub struct WorkerProcess {
    child: Child,
    stdin: ChildStdin,
    stdout: Lines<BufReader<ChildStdout>>,
    stderr: Lines<BufReader<ChildStderr>>,
}

impl WorkerProcess {
    /// Spawn `program args..` in `cwd` with piped stdio.
    pub fn spawn(program: &str, args: &[String], cwd: &Path) -> Result<Self, WorkerError> {
        let mut child = Command::new(program)
            .args(args)
            .current_dir(cwd)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| WorkerError::Spawn {
                program: program.to_string(),
                source,
            })?;

        let missing = |stream: &str| WorkerError::ProcessFailure(format!("no {stream} pipe"));
        let stdin = child.stdin.take().ok_or_else(|| missing("stdin"))?;
        let stdout = child.stdout.take().ok_or_else(|| missing("stdout"))?;
        let stderr = child.stderr.take().ok_or_else(|| missing("stderr"))?;

        crate::debug!("worker"; "spawned {} (pid {:?})", program, child.id());

        Ok(Self {
            child,
            stdin,
            stdout: BufReader::new(stdout).lines(),
            stderr: BufReader::new(stderr).lines(),
        })
    }

    /// Write one request line.
    pub async fn write_line(&mut self, line: &str) -> Result<(), WorkerError> {
        self.stdin.write_all(line.as_bytes()).await?;
        self.stdin.write_all(b"\n").await?;
        self.stdin.flush().await?;
        Ok(())
    }

    /// Next stdout line. Stderr output, stdout EOF and process exit are
    /// failures.
    ///
    /// Cancel-safe: no line is lost if the future is dropped.
    pub async fn next_line(&mut self) -> Result<String, WorkerError> {
        tokio::select! {
            line = self.stdout.next_line() => match line? {
                Some(line) => Ok(line),
                None => Err(WorkerError::ProcessFailure("worker closed stdout".into())),
            },
            line = self.stderr.next_line() => match line? {
                Some(line) => Err(WorkerError::ProcessFailure(format!("worker stderr: {line}"))),
                None => Err(WorkerError::ProcessFailure("worker closed stderr".into())),
            },
            status = self.child.wait() => {
                let status = status?;
                Err(WorkerError::ProcessFailure(format!("worker exited ({status})")))
            }
        }
    }

    /// Kill the worker and reap it.
    pub async fn kill(&mut self) {
        if let Err(e) = self.child.kill().await {
            crate::debug!("worker"; "kill failed: {}", e);
        }
    }
}
