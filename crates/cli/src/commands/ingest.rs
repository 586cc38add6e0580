//! Ingest command handler.

use crate::context::AppContext;
use clap::Args;
use docchat_core::AppResult;
use docchat_extract::ExtractorRegistry;
use docchat_rag::Document;
use std::path::PathBuf;

/// Ingest a document into the session
#[derive(Args, Debug)]
pub struct IngestCommand {
    /// File to ingest (txt, md, html)
    pub file: PathBuf,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl IngestCommand {
    pub async fn execute(&self, ctx: &AppContext) -> AppResult<()> {
        tracing::info!("Executing ingest command for {:?}", self.file);

        let registry = ExtractorRegistry::with_defaults();
        let extracted = registry.extract_file(&self.file)?;

        let document = Document::new(extracted.source_name, extracted.text);
        let source_name = document.source_name.clone();

        let mut session = ctx.load_session()?;
        let stats = ctx.orchestrator.ingest(&mut session, document).await?;
        ctx.store.save(&session)?;

        if self.json {
            let output = serde_json::json!({
                "source": source_name,
                "collection": stats.collection,
                "chunkCount": stats.chunk_count,
                "charsProcessed": stats.chars_processed,
                "durationSecs": stats.duration_secs,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        } else {
            println!(
                "Ingested {} ({} chunks, {} chars) in {:.2}s",
                source_name, stats.chunk_count, stats.chars_processed, stats.duration_secs
            );
        }

        Ok(())
    }
}
