//! Process-level wiring.
//!
//! Builds the orchestrator and its collaborators from configuration once
//! per invocation; commands only ever see this context.

use docchat_core::{AppConfig, AppResult};
use docchat_llm::{create_client, LlmClient, ModelCatalog};
use docchat_prompt::PromptLibrary;
use docchat_rag::{
    create_provider, ChunkConfig, OrchestratorConfig, Session, SessionOrchestrator, SessionStore,
    VectorIndex,
};
use std::sync::Arc;

/// Everything a command needs, wired once.
pub struct AppContext {
    pub config: AppConfig,
    pub orchestrator: SessionOrchestrator,
    pub store: SessionStore,
    pub llm: Arc<dyn LlmClient>,
    pub catalog: ModelCatalog,
}

impl AppContext {
    /// Validate configuration and wire up the component graph.
    pub fn build(config: AppConfig) -> AppResult<Self> {
        config.validate()?;
        config.ensure_data_dir()?;

        let index = Arc::new(VectorIndex::new(config.collections_dir())?);

        // The "mock" provider swaps embeddings only; chat always talks to
        // the local model server.
        let embedder = create_provider(
            &config.provider,
            &config.endpoint,
            &config.embedding_model,
            config.embedding_dimensions,
        )?;

        let llm = create_client("ollama", Some(&config.endpoint))?;

        let mut library = PromptLibrary::builtin();
        library.load_overrides(&config.prompts_dir())?;

        let orchestrator_config = OrchestratorConfig {
            chat_model: config.model.clone(),
            chunking: ChunkConfig::new(config.chunk_size, config.chunk_overlap)?,
            query_variants: config.query_variants,
            k_per_variant: config.k_per_variant,
            top_k: config.top_k,
        };

        let orchestrator = SessionOrchestrator::new(
            index,
            embedder,
            Arc::clone(&llm),
            library,
            orchestrator_config,
        );

        let store = SessionStore::new(config.session_path());

        Ok(Self {
            config,
            orchestrator,
            store,
            llm,
            catalog: ModelCatalog::new(),
        })
    }

    /// Load the persisted session for this data directory.
    pub fn load_session(&self) -> AppResult<Session> {
        self.store.load(self.orchestrator.index())
    }
}
