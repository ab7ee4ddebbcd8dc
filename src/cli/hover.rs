//! `kiln hover`: compile once, then query the tooltip at a location.

use std::path::Path;

use anyhow::Result;

use super::session::{WorkerSession, walk_project};
use crate::actor::input::tooltip_msg;
use crate::actor::messages::{UiMsg, WorkerMsg};
use crate::actor::ui::{TooltipGate, format_tooltip, summarize};
use crate::config::ProjectConfig;
use crate::core::Location;
use crate::utils::path::resolve_path;

pub async fn hover(config: &ProjectConfig, location: &Location) -> Result<()> {
    let root = config.get_root();
    let source = resolve_path(&location.path, root);

    let mut session = WorkerSession::start(config)?;
    let files = walk_project(config).await?;
    if !files.contains(&source) {
        crate::log!("hover"; "{} is not part of the project", display(&source, root));
    }

    // The compile must finish first: a queued tooltip would supersede it.
    session.send(WorkerMsg::Compile { files })?;
    let log = session.compiled().await?;
    crate::debug!("hover"; "compiled: {}", summarize(&log));

    session.send(tooltip_msg(location, root))?;
    let mut gate = TooltipGate::default();
    let result = loop {
        match session.next().await? {
            UiMsg::TooltipRequested { id } => gate.issued(id),
            UiMsg::Tooltip(result) if gate.accepts(result.id) => break result,
            other => crate::debug!("hover"; "ignored {:?}", other),
        }
    };
    session.finish().await;

    println!("{}", format_tooltip(&result, root));
    Ok(())
}

fn display(path: &Path, root: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .display()
        .to_string()
}
