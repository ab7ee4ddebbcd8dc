//! `kiln watch`: recompile on every change until Ctrl+C.

use std::io::IsTerminal;
use std::sync::Arc;

use anyhow::Result;

use crate::actor::ActorSystem;
use crate::config::ProjectConfig;

pub async fn watch(config: Arc<ProjectConfig>) -> Result<()> {
    if std::io::stdin().is_terminal() {
        crate::log!("watch"; "commands: `hover PATH:LINE:COL`, `rebuild`");
    }
    ActorSystem::with_config(config).run().await
}
