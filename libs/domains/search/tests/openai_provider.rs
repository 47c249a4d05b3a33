//! OpenAI provider against a local fake of the REST API

use axum::{Json, Router, http::HeaderMap, http::StatusCode, routing::post};
use domain_search::{
    ChatCompletionProvider, ChatMessage, ChatRequest, EmbeddingProvider, OpenAIConfig,
    OpenAIProvider, SearchError,
};
use serde_json::{Value, json};
use std::time::{Duration, Instant};
use tokio::net::TcpListener;

async fn embeddings(headers: HeaderMap, Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    if headers.get("authorization").and_then(|v| v.to_str().ok()) != Some("Bearer sk-test") {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "error": { "message": "bad key" } })),
        );
    }

    let input = body["input"].as_array().cloned().unwrap_or_default();
    if input.iter().any(|t| t.as_str() == Some("empty please")) {
        return (StatusCode::OK, Json(json!({ "object": "list", "data": [] })));
    }

    // Reverse order on purpose; clients must sort by index
    let data: Vec<Value> = input
        .iter()
        .enumerate()
        .rev()
        .map(|(i, t)| {
            let len = t.as_str().map(str::len).unwrap_or(0) as f32;
            json!({ "object": "embedding", "index": i, "embedding": [len, 1.0] })
        })
        .collect();

    (
        StatusCode::OK,
        Json(json!({ "object": "list", "model": body["model"], "data": data })),
    )
}

async fn chat(Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    let model = body["model"].as_str().unwrap_or_default();
    if model == "broken-model" {
        return (StatusCode::OK, Json(json!({ "choices": [] })));
    }
    if model == "stalled-model" {
        tokio::time::sleep(Duration::from_secs(10)).await;
    }

    let reply = format!(
        "[\"{}\", \"{}\"]",
        body["messages"][0]["role"].as_str().unwrap_or_default(),
        body["max_tokens"]
    );
    (
        StatusCode::OK,
        Json(json!({ "choices": [{ "index": 0, "message": { "role": "assistant", "content": reply } }] })),
    )
}

async fn spawn_fake_api() -> String {
    let app = Router::new()
        .route("/v1/embeddings", post(embeddings))
        .route("/v1/chat/completions", post(chat));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{}/v1", addr)
}

async fn provider(api_key: &str) -> OpenAIProvider {
    let base_url = spawn_fake_api().await;
    OpenAIProvider::new(OpenAIConfig::new(api_key.to_string()).with_base_url(base_url)).unwrap()
}

#[tokio::test]
async fn test_embed_batch_preserves_input_order() {
    let provider = provider("sk-test").await;

    let vectors = provider
        .embed_batch(&["a".to_string(), "abc".to_string()])
        .await
        .unwrap();

    assert_eq!(vectors, vec![vec![1.0, 1.0], vec![3.0, 1.0]]);
}

#[tokio::test]
async fn test_empty_data_passes_through() {
    let provider = provider("sk-test").await;

    let vectors = provider
        .embed_batch(&["empty please".to_string()])
        .await
        .unwrap();
    assert!(vectors.is_empty());
}

#[tokio::test]
async fn test_http_error_becomes_request_failed() {
    let provider = provider("sk-wrong").await;

    let result = provider.embed_batch(&["a".to_string()]).await;
    match result {
        Err(SearchError::EmbeddingRequestFailed(message)) => assert!(message.contains("401")),
        other => panic!("expected EmbeddingRequestFailed, got {:?}", other),
    }
}

#[tokio::test]
async fn test_chat_completion_returns_first_choice() {
    let provider = provider("sk-test").await;

    let reply = provider
        .complete(ChatRequest {
            messages: vec![ChatMessage::system("rank"), ChatMessage::user("boots")],
            temperature: 0.3,
            max_tokens: 500,
        })
        .await
        .unwrap();

    assert_eq!(reply, "[\"system\", \"500\"]");
}

#[tokio::test]
async fn test_chat_without_choices_is_rerank_failure() {
    let base_url = spawn_fake_api().await;
    let mut config = OpenAIConfig::new("sk-test".to_string()).with_base_url(base_url);
    config.chat_model = "broken-model".to_string();
    let provider = OpenAIProvider::new(config).unwrap();

    let result = provider
        .complete(ChatRequest {
            messages: vec![ChatMessage::user("boots")],
            temperature: 0.3,
            max_tokens: 10,
        })
        .await;
    assert!(matches!(result, Err(SearchError::RerankFailed(_))));
}

#[tokio::test]
async fn test_configured_timeout_bounds_requests() {
    let base_url = spawn_fake_api().await;
    let mut config = OpenAIConfig::new("sk-test".to_string()).with_base_url(base_url);
    config.chat_model = "stalled-model".to_string();
    config.request_timeout = Duration::from_millis(200);
    let provider = OpenAIProvider::new(config).unwrap();

    let started = Instant::now();
    let result = provider
        .complete(ChatRequest {
            messages: vec![ChatMessage::user("boots")],
            temperature: 0.3,
            max_tokens: 10,
        })
        .await;

    assert!(matches!(result, Err(SearchError::RerankFailed(_))));
    assert!(started.elapsed() < Duration::from_secs(5));
}
