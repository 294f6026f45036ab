//! End-to-end answering behavior with deterministic collaborators.

mod common;

use std::sync::Arc;

use common::{FAKE_PDF, KeywordEmbedder, RecordingModel, StaticExtractor, keyword_vector};
use pdfchat_rag::{
    AnsweringEngine, DocumentChunk, DocumentIndex, DocumentIndexer, Grounding, RagError,
    UNGROUNDED_NOTICE,
};

struct Fixture {
    embedder: Arc<KeywordEmbedder>,
    model: Arc<RecordingModel>,
    engine: AnsweringEngine,
}

fn fixture(model: RecordingModel) -> Fixture {
    let embedder = Arc::new(KeywordEmbedder::default());
    let model = Arc::new(model);
    let engine = AnsweringEngine::builder()
        .embedding_provider(embedder.clone())
        .language_model(model.clone())
        .build()
        .unwrap();
    Fixture { embedder, model, engine }
}

async fn index_pages(embedder: Arc<KeywordEmbedder>, pages: &[&str], model: &str) -> DocumentIndex {
    let indexer = DocumentIndexer::builder()
        .extractor(Arc::new(StaticExtractor::new(pages.iter().copied())))
        .embedding_provider(embedder)
        .build()
        .unwrap();
    indexer.build_index(FAKE_PDF, model).await.unwrap()
}

#[tokio::test]
async fn answers_from_the_document_when_text_matches() {
    let f = fixture(RecordingModel::replying("The sky is blue."));
    let index = index_pages(f.embedder.clone(), &["The sky is blue."], "llama2").await;
    assert_eq!(index.len(), 1);

    let result = f.engine.answer("What color is the sky?", &index, "llama2").await.unwrap();

    assert_eq!(result.grounding, Grounding::Grounded);
    assert_eq!(result.answer, "The sky is blue.");
    assert_eq!(result.disclosure(), None);
    assert_eq!(result.evidence.len(), 1);
    assert_eq!(result.evidence[0].chunk.text, "The sky is blue.");

    let requests = f.model.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].model, "llama2");
    assert!(requests[0].prompt.contains("The sky is blue."));
    assert!(requests[0].prompt.contains("Question: What color is the sky?"));
    assert_eq!(requests[0].options.temperature, Some(0.7));
    assert_eq!(requests[0].options.context_window, Some(2048));
    assert!(f.embedder.seen_models().iter().all(|m| m == "llama2"));
}

#[tokio::test]
async fn falls_back_to_general_knowledge_for_a_document_without_text() {
    let f = fixture(RecordingModel::replying("Paris."));
    let index = index_pages(f.embedder.clone(), &["", "  \n "], "mistral").await;
    assert!(index.is_empty());

    let result = f.engine.answer("What is the capital of France?", &index, "mistral").await.unwrap();

    assert_eq!(result.grounding, Grounding::Ungrounded);
    assert_eq!(result.answer, "Paris.");
    assert_eq!(result.disclosure(), Some(UNGROUNDED_NOTICE));
    assert!(result.evidence.is_empty());
    assert_eq!(f.embedder.call_count(), 0);

    let requests = f.model.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].prompt, "What is the capital of France?");
    assert_eq!(requests[0].options.temperature, Some(0.7));
}

#[tokio::test]
async fn whitespace_only_evidence_is_not_grounding() {
    let f = fixture(RecordingModel::replying("I am not sure."));
    let mut index = DocumentIndex::new("gemma");
    index.insert(DocumentChunk::new("   ", 0, 0), keyword_vector("blank")).unwrap();
    index.insert(DocumentChunk::new("\n\t", 0, 1), keyword_vector("also blank")).unwrap();

    let result = f.engine.answer("Anything here?", &index, "gemma").await.unwrap();

    assert!(!result.is_grounded());
    assert!(result.evidence.is_empty());
    assert_eq!(f.embedder.call_count(), 1);
    assert_eq!(f.model.requests()[0].prompt, "Anything here?");
}

#[tokio::test]
async fn retrieves_at_most_two_chunks_nearest_first() {
    let f = fixture(RecordingModel::replying("Very deep."));
    let mut index = DocumentIndex::new("llama2");
    let texts = [
        "Apples grow on trees in orchards.",
        "The ocean is deep and salty.",
        "Rust compiles to native code.",
        "Bread needs flour and yeast.",
        "Mountains rise above clouds.",
    ];
    for (position, text) in texts.iter().enumerate() {
        index.insert(DocumentChunk::new(*text, 0, position), keyword_vector(text)).unwrap();
    }

    let result = f.engine.answer("How deep is the ocean?", &index, "llama2").await.unwrap();

    assert!(result.is_grounded());
    assert_eq!(result.evidence.len(), 2);
    assert_eq!(result.evidence[0].chunk.text, "The ocean is deep and salty.");
    assert!(result.evidence[0].score >= result.evidence[1].score);
}

#[tokio::test]
async fn generation_failure_is_an_inference_error() {
    let f = fixture(RecordingModel::failing());
    let index = index_pages(f.embedder.clone(), &["The sky is blue."], "llama3").await;

    let err = f.engine.answer("What color is the sky?", &index, "llama3").await.unwrap_err();

    assert!(matches!(err, RagError::InferenceBackendError { ref model, .. } if model == "llama3"));
    assert!(err.is_backend_error());
}

#[tokio::test]
async fn query_embedding_failure_skips_generation() {
    let embedder = Arc::new(KeywordEmbedder::default());
    let index = index_pages(embedder, &["The sky is blue."], "llama2").await;

    let model = Arc::new(RecordingModel::replying("unused"));
    let engine = AnsweringEngine::builder()
        .embedding_provider(Arc::new(KeywordEmbedder::failing()))
        .language_model(model.clone())
        .build()
        .unwrap();

    let err = engine.answer("What color is the sky?", &index, "llama2").await.unwrap_err();

    assert!(matches!(err, RagError::EmbeddingBackendError { .. }));
    assert!(model.requests().is_empty());
}

#[test]
fn engine_requires_both_collaborators() {
    let err = AnsweringEngine::builder()
        .embedding_provider(Arc::new(KeywordEmbedder::default()))
        .build()
        .err()
        .unwrap();
    assert!(matches!(err, RagError::ConfigError(_)));
}
