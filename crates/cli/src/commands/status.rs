//! Status command handler.

use crate::context::AppContext;
use clap::Args;
use docchat_core::AppResult;

/// Show session and collection status
#[derive(Args, Debug)]
pub struct StatusCommand {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl StatusCommand {
    pub async fn execute(&self, ctx: &AppContext) -> AppResult<()> {
        tracing::info!("Executing status command");

        let session = ctx.load_session()?;
        let info = ctx.orchestrator.collection_info(&session)?;
        let history_len = session.history().len();

        if self.json {
            let output = serde_json::json!({
                "state": session.state().as_str(),
                "source": session.source_name(),
                "collection": info,
                "historyTurns": history_len / 2,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        } else {
            println!("Session: {}", session.state().as_str());
            match (session.source_name(), info) {
                (Some(source), Some(info)) => {
                    println!("  Document: {}", source);
                    println!("  Collection: {} ({})", info.name, info.state.as_str());
                    println!("  Chunks: {}", info.chunk_count);
                    println!("  Dimension: {}", info.dimension);
                }
                _ => println!("  No document ingested"),
            }
            println!("  Chat turns: {}", history_len / 2);
        }

        Ok(())
    }
}
