//! UI Actor
//!
//! Renders the latest diagnostics as a single overwriting status block and
//! prints tooltips. A tooltip is shown only if it answers the most recently
//! issued query.

use std::path::{Path, PathBuf};

use tokio::sync::mpsc;

use super::messages::UiMsg;
use crate::logger::{status_error, status_success, status_warning};
use crate::protocol::{CompileLog, Diagnostic, RequestId, TooltipResult};
use crate::utils::plural::plural_count;

/// Tracks the latest issued tooltip query.
#[derive(Debug, Default)]
pub struct TooltipGate {
    latest: Option<RequestId>,
}

impl TooltipGate {
    pub fn issued(&mut self, id: RequestId) {
        self.latest = Some(id);
    }

    /// Whether a result with this id may be shown.
    pub fn accepts(&self, id: RequestId) -> bool {
        self.latest == Some(id)
    }
}

/// UI Actor - renders worker results
pub struct UiActor {
    rx: mpsc::UnboundedReceiver<UiMsg>,
    root: PathBuf,
    tooltips: TooltipGate,
}

impl UiActor {
    pub fn new(rx: mpsc::UnboundedReceiver<UiMsg>, root: PathBuf) -> Self {
        Self {
            rx,
            root,
            tooltips: TooltipGate::default(),
        }
    }

    /// Run until every sender is gone.
    pub async fn run(mut self) {
        while let Some(msg) = self.rx.recv().await {
            self.handle(msg);
        }
    }

    fn handle(&mut self, msg: UiMsg) {
        match msg {
            UiMsg::Compiled(result) => {
                crate::debug!("ui"; "compile #{} finished", result.id);
                render_compile(&result.log, &self.root);
            }
            UiMsg::TooltipRequested { id } => self.tooltips.issued(id),
            UiMsg::Tooltip(result) => {
                if !self.tooltips.accepts(result.id) {
                    crate::debug!("ui"; "drop stale tooltip #{}", result.id);
                    return;
                }
                crate::log!("hover"; "{}", format_tooltip(&result, &self.root));
            }
        }
    }
}

// =============================================================================
// Rendering
// =============================================================================

/// Replace the status block with the diagnostics of `log`.
pub fn render_compile(log: &CompileLog, root: &Path) {
    let summary = summarize(log);
    let detail = format_diagnostics(log, root);

    if log.errors().next().is_some() {
        status_error(&summary, &detail);
    } else if log.warnings().next().is_some() {
        status_warning(&format!("{summary}\n{detail}"));
    } else {
        status_success(&summary);
    }
}

/// One-line summary: `no problems`, `1 error`, `2 errors, 1 warning`.
pub fn summarize(log: &CompileLog) -> String {
    let errors = log.errors().count();
    let warnings = log.warnings().count();

    match (errors, warnings) {
        (0, 0) => "no problems".to_string(),
        (e, 0) => plural_count(e, "error"),
        (0, w) => plural_count(w, "warning"),
        (e, w) => format!("{}, {}", plural_count(e, "error"), plural_count(w, "warning")),
    }
}

pub fn format_diagnostics(log: &CompileLog, root: &Path) -> String {
    log.diagnostics
        .iter()
        .map(|d| format_diagnostic(d, root))
        .collect::<Vec<_>>()
        .join("\n")
}

/// `src/main.sk:3:5: error: text`, with 1-based positions.
pub fn format_diagnostic(diagnostic: &Diagnostic, root: &Path) -> String {
    let start = diagnostic.range.start;
    format!(
        "{}:{}:{}: {}: {}",
        display_source(&diagnostic.range.source, root),
        start.line + 1,
        start.column + 1,
        diagnostic.kind.label(),
        diagnostic.text
    )
}

pub fn format_tooltip(result: &TooltipResult, root: &Path) -> String {
    let Some(tooltip) = &result.tooltip else {
        return "no tooltip".to_string();
    };
    match &result.range {
        Some(range) => format!(
            "{}:{}:{}: {}",
            display_source(&range.source, root),
            range.start.line + 1,
            range.start.column + 1,
            tooltip
        ),
        None => tooltip.clone(),
    }
}

/// Source names are the absolute paths sent to the worker; show them
/// relative to the project root when possible.
fn display_source(source: &str, root: &Path) -> String {
    Path::new(source)
        .strip_prefix(root)
        .map(|p| p.display().to_string())
        .unwrap_or_else(|_| source.to_string())
}
