//! `kiln check`: compile once and report every diagnostic.

use anyhow::{Result, bail};

use super::session::{WorkerSession, walk_project};
use crate::actor::messages::WorkerMsg;
use crate::actor::ui::{format_diagnostic, summarize};
use crate::config::ProjectConfig;
use crate::utils::plural::plural_count;

/// Fails when the worker reports at least one error.
pub async fn check(config: &ProjectConfig) -> Result<()> {
    // Start the worker while the walk runs.
    let mut session = WorkerSession::start(config)?;
    let files = walk_project(config).await?;

    crate::log!("check"; "compiling {}", plural_count(files.len(), "file"));
    session.send(WorkerMsg::Compile { files })?;
    let log = session.compiled().await?;
    session.finish().await;

    for diagnostic in &log.diagnostics {
        println!("{}", format_diagnostic(diagnostic, config.get_root()));
    }

    let summary = summarize(&log);
    if log.errors().next().is_some() {
        bail!("check failed: {}", summary);
    }
    crate::log!("check"; "{}", summary);
    Ok(())
}
