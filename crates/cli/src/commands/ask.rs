//! Ask command handler.

use crate::context::AppContext;
use clap::Args;
use docchat_core::AppResult;

/// Ask one question against the ingested document
#[derive(Args, Debug)]
pub struct AskCommand {
    /// Question text
    pub question: String,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl AskCommand {
    pub async fn execute(&self, ctx: &AppContext) -> AppResult<()> {
        tracing::info!("Executing ask command");

        let session = ctx.load_session()?;
        let answer = ctx.orchestrator.ask(&session, &self.question).await?;
        ctx.store.save(&session)?;

        if self.json {
            let output = serde_json::json!({
                "question": self.question,
                "answer": answer,
                "grounded": session.source_name(),
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        } else {
            println!("{}", answer);
        }

        Ok(())
    }
}
