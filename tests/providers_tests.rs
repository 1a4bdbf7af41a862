//! HTTP-client tests for the Ollama and iFixit providers against a mock server.

use fixrag::{
    EmbeddingProvider, FixragError, GenerateOptions, IFixitClient, LanguageModel,
    OllamaEmbedder, OllamaGenerator,
};
use httpmock::prelude::*;
use serde_json::json;

#[tokio::test]
async fn embedder_returns_vector_on_success() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/api/embeddings")
                .json_body_partial(r#"{"model": "all-minilm"}"#);
            then.status(200).json_body(json!({"embedding": [0.1, 0.2, 0.3]}));
        })
        .await;

    let embedder = OllamaEmbedder::new().with_base_url(server.base_url());
    let embedding = embedder.embed("hello world").await.unwrap();
    assert_eq!(embedding, vec![0.1, 0.2, 0.3]);
    mock.assert_async().await;
}

#[tokio::test]
async fn embedder_maps_rate_limiting_distinctly() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/api/embeddings");
            then.status(429).body("slow down");
        })
        .await;

    let embedder = OllamaEmbedder::new().with_base_url(server.base_url());
    let err = embedder.embed("hello").await.unwrap_err();
    assert!(matches!(err, FixragError::RateLimited { .. }));
}

#[tokio::test]
async fn embedder_maps_client_errors_to_invalid_input() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/api/embeddings");
            then.status(400).body("model does not support embeddings");
        })
        .await;

    let embedder = OllamaEmbedder::new().with_base_url(server.base_url());
    let err = embedder.embed("hello").await.unwrap_err();
    assert!(matches!(err, FixragError::InvalidEmbeddingInput { .. }));
}

#[tokio::test]
async fn embedder_maps_server_errors_to_unavailable() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/api/embeddings");
            then.status(500).body("internal error");
        })
        .await;

    let embedder = OllamaEmbedder::new().with_base_url(server.base_url());
    let err = embedder.embed("hello").await.unwrap_err();
    assert!(matches!(err, FixragError::EmbeddingUnavailable { .. }));
}

#[tokio::test]
async fn embedder_maps_connection_refused_to_unavailable() {
    // Nothing listens on port 1.
    let embedder = OllamaEmbedder::new().with_base_url("http://127.0.0.1:1");
    let err = embedder.embed("hello").await.unwrap_err();
    assert!(matches!(err, FixragError::EmbeddingUnavailable { .. }));
}

#[tokio::test]
async fn generator_returns_response_text() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/api/generate")
                .json_body_partial(r#"{"stream": false, "options": {"num_predict": 128}}"#);
            then.status(200).json_body(json!({"response": "Lift the battery out."}));
        })
        .await;

    let generator = OllamaGenerator::new()
        .with_base_url(server.base_url())
        .with_model("tinyllama");
    let options = GenerateOptions { max_tokens: Some(128), stop: Vec::new(), temperature: None };
    let text = generator.generate("How do I remove the battery?", &options).await.unwrap();
    assert_eq!(text, "Lift the battery out.");
    assert_eq!(generator.model_id(), "tinyllama");
    mock.assert_async().await;
}

#[tokio::test]
async fn generator_maps_api_errors_to_generation_failed() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/api/generate");
            then.status(500).body("model not loaded");
        })
        .await;

    let generator = OllamaGenerator::new().with_base_url(server.base_url());
    let err = generator.generate("prompt", &GenerateOptions::default()).await.unwrap_err();
    assert!(matches!(err, FixragError::GenerationFailed { .. }));
}

#[tokio::test]
async fn ifixit_search_parses_guide_hits() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET).path("/search/iPhone");
            then.status(200).json_body(json!({
                "results": [
                    {"guideid": 100, "title": "iPhone Battery Replacement"},
                    {"title": "iPhone (device page, no guide)"},
                ]
            }));
        })
        .await;

    let client = IFixitClient::new(None).unwrap().with_base_url(server.base_url());
    let hits = client.search_devices("iPhone").await.unwrap();
    assert_eq!(hits.len(), 2);
    assert_eq!(hits[0].guideid, Some(100));
    assert_eq!(hits[1].guideid, None);
    mock.assert_async().await;
}

#[tokio::test]
async fn ifixit_guide_fetch_normalizes_to_document() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/guides/100");
            then.status(200).json_body(json!({
                "guideid": 100,
                "title": "Battery Replacement",
                "device": "iPhone 13",
                "type": "replacement",
                "difficulty": "Moderate",
                "steps": [
                    {"title": "Open", "lines": [{"text": "Remove the back cover."}]}
                ]
            }));
        })
        .await;

    let client = IFixitClient::new(None).unwrap().with_base_url(server.base_url());
    let guide = client.get_guide(100).await.unwrap();
    let document = guide.to_document();
    assert_eq!(document.id, "guide-100");
    assert!(document.text.contains("Step 1: Open"));
    assert_eq!(document.metadata.get("device").map(String::as_str), Some("iPhone 13"));
}

#[tokio::test]
async fn ifixit_http_errors_surface_as_guide_source() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/guides/404");
            then.status(404).body("not found");
        })
        .await;

    let client = IFixitClient::new(None).unwrap().with_base_url(server.base_url());
    let err = client.get_guide(404).await.unwrap_err();
    assert!(matches!(err, FixragError::GuideSource(_)));
}
