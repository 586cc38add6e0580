//! Full session flow: ingest → expand → retrieve → synthesize → delete.

use crate::chunker::ChunkConfig;
use crate::embeddings::providers::MockProvider;
use crate::embeddings::EmbeddingProvider;
use crate::index::VectorIndex;
use crate::session::{OrchestratorConfig, Session, SessionOrchestrator, SessionState};
use crate::tests::support::MockLlm;
use crate::types::Document;
use docchat_core::AppError;
use docchat_prompt::PromptLibrary;
use std::sync::Arc;
use tempfile::TempDir;

const DIM: usize = 256;

/// Three-topic text sized to split into exactly three chunks with
/// `chunk_size = 100`, `chunk_overlap = 20` (step 80, length in
/// (180, 260]).
fn three_chunk_document() -> Document {
    let text = "The warranty covers all repairs for two full years after purchase. \
                Shipping within the country usually takes five business days. \
                Returns are accepted for thirty days when items stay unused.";
    assert!(text.len() > 180 && text.len() <= 260);
    Document::new("doc-a.txt", text)
}

fn orchestrator_with(
    index: Arc<VectorIndex>,
    llm: Arc<MockLlm>,
) -> SessionOrchestrator {
    SessionOrchestrator::new(
        index,
        Arc::new(MockProvider::new(DIM)),
        llm,
        PromptLibrary::builtin(),
        OrchestratorConfig {
            chat_model: "test-model".to_string(),
            chunking: ChunkConfig::new(100, 20).unwrap(),
            query_variants: 2,
            k_per_variant: 3,
            top_k: 4,
        },
    )
}

#[tokio::test]
async fn test_full_session_flow() {
    let temp = TempDir::new().unwrap();
    let index = Arc::new(VectorIndex::new(temp.path().join("collections")).unwrap());

    // First completion answers the expansion prompt, second the synthesis
    let llm = Arc::new(MockLlm::with_responses(vec![
        "How long does the warranty last?\nWhat period does the warranty cover?",
        "The warranty lasts two years.",
    ]));

    let orchestrator = orchestrator_with(Arc::clone(&index), Arc::clone(&llm));
    let mut session = Session::empty();

    // Ingest: exactly three chunks land in a content-named collection
    let document = three_chunk_document();
    let collection_name = document.collection_name();
    let document_text = document.raw_text.clone();

    let stats = orchestrator.ingest(&mut session, document).await.unwrap();
    assert_eq!(stats.chunk_count, 3);
    assert_eq!(stats.collection, collection_name);
    assert_eq!(session.state(), SessionState::Ready);

    // Ask: expansion yields two extra variants, retrieval merges and
    // dedupes across all three, synthesis sees only chunk text + question
    let question = "How many years of warranty do I get?";
    let answer = orchestrator.ask(&session, question).await.unwrap();
    assert_eq!(answer, "The warranty lasts two years.");

    let requests = llm.requests();
    assert_eq!(requests.len(), 2);

    let expansion_prompt = &requests[0].prompt;
    assert!(expansion_prompt.contains("2 different versions"));
    assert!(expansion_prompt.contains(question));

    let synthesis_prompt = &requests[1].prompt;
    assert!(synthesis_prompt.contains("based ONLY on the following context"));
    assert!(synthesis_prompt.ends_with(&format!("Question: {}", question)));

    // Every context line in the prompt is literal document text
    let context_section = synthesis_prompt
        .split("Answer the question based ONLY on the following context:")
        .nth(1)
        .unwrap()
        .split("Question:")
        .next()
        .unwrap();
    for part in context_section.split("\n\n---\n\n") {
        let part = part.trim();
        if !part.is_empty() {
            assert!(
                document_text.contains(part),
                "context snippet not from the document: {:?}",
                part
            );
        }
    }

    // History records the successful turn
    let history = session.history();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].content, question);

    // Delete: the collection becomes unqueryable and unknown
    let stale_handle = session.collection().unwrap().clone();
    orchestrator.delete(&mut session).await.unwrap();
    assert_eq!(session.state(), SessionState::Empty);

    let probe = MockProvider::new(DIM).embed("anything").await.unwrap();
    assert!(matches!(
        index.query(&stale_handle, &probe, 5),
        Err(AppError::NotFound(_))
    ));
    assert!(matches!(
        index.open_collection(&collection_name),
        Err(AppError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_expansion_failure_still_answers() {
    let temp = TempDir::new().unwrap();
    let index = Arc::new(VectorIndex::new(temp.path().join("collections")).unwrap());

    // The mock drains its queue: expansion errors are simulated by
    // feeding the synthesis answer first and counting requests after.
    let llm = Arc::new(MockLlm::with_responses(vec![
        // Expansion returns something unusable (blank lines only)
        "\n\n",
        "Grounded answer from single-variant retrieval.",
    ]));

    let orchestrator = orchestrator_with(Arc::clone(&index), Arc::clone(&llm));
    let mut session = Session::empty();

    orchestrator
        .ingest(&mut session, three_chunk_document())
        .await
        .unwrap();

    let answer = orchestrator
        .ask(&session, "What about returns?")
        .await
        .unwrap();
    assert_eq!(answer, "Grounded answer from single-variant retrieval.");
}
