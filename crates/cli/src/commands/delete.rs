//! Delete command handler.

use crate::context::AppContext;
use clap::Args;
use docchat_core::AppResult;

/// Delete the session's collection
#[derive(Args, Debug)]
pub struct DeleteCommand {}

impl DeleteCommand {
    pub async fn execute(&self, ctx: &AppContext) -> AppResult<()> {
        tracing::info!("Executing delete command");

        let mut session = ctx.load_session()?;
        let had_document = session.source_name().map(|s| s.to_string());

        ctx.orchestrator.delete(&mut session).await?;
        ctx.store.save(&session)?;

        match had_document {
            Some(source) => println!("Deleted collection for '{}'", source),
            None => println!("Nothing to delete"),
        }

        Ok(())
    }
}
