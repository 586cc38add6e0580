//! Models command handler.

use crate::context::AppContext;
use clap::Args;
use docchat_core::AppResult;

/// List models installed on the provider
#[derive(Args, Debug)]
pub struct ModelsCommand {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl ModelsCommand {
    pub async fn execute(&self, ctx: &AppContext) -> AppResult<()> {
        tracing::info!("Executing models command");

        let models = ctx.catalog.models(ctx.llm.as_ref()).await?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&models)?);
        } else if models.is_empty() {
            println!("No models installed. Try: ollama pull llama3.2");
        } else {
            for model in &models {
                let marker = if *model == ctx.config.model { "*" } else { " " };
                println!("{} {}", marker, model);
            }
        }

        Ok(())
    }
}
