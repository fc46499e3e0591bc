use askdocs::chat::{ChatMessage, ChatModel, OpenAIChat};
use askdocs::config::{ApiKey, ChatConfig, EmbeddingConfig, OpenAiConfig};
use askdocs::embedding::{Embedder, OpenAIEmbedder};
use askdocs::openai::OpenAiClient;
use askdocs::Error;
use serde_json::{json, Value};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

fn client_for(server: &MockServer) -> OpenAiClient {
    let config = OpenAiConfig {
        base_url: format!("{}/v1", server.uri()),
        timeout_secs: Some(10),
        ..OpenAiConfig::default()
    };
    OpenAiClient::new(&config, ApiKey::new("sk-test")).unwrap()
}

fn embedding_body(vectors: &[(usize, Vec<f32>)]) -> Value {
    let data: Vec<Value> = vectors
        .iter()
        .map(|(index, v)| json!({"object": "embedding", "index": index, "embedding": v}))
        .collect();
    json!({"object": "list", "data": data})
}

/// Answers each embeddings request with one vector per input, `[len(text)]`,
/// listed in reverse order.
struct LengthEmbeddings;

impl Respond for LengthEmbeddings {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let body: Value = request.body_json().unwrap();
        let inputs = body["input"].as_array().unwrap();
        let vectors: Vec<(usize, Vec<f32>)> = inputs
            .iter()
            .enumerate()
            .rev()
            .map(|(i, t)| (i, vec![t.as_str().unwrap().len() as f32]))
            .collect();
        ResponseTemplate::new(200).set_body_json(embedding_body(&vectors))
    }
}

#[tokio::test]
async fn test_rate_limited_request_is_retried() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/embeddings"))
        .respond_with(ResponseTemplate::new(429).set_body_json(
            json!({"error": {"message": "Rate limit reached", "type": "requests"}}),
        ))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/embeddings"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(embedding_body(&[(0, vec![0.5, 0.5])])),
        )
        .expect(1)
        .mount(&server)
        .await;

    let embedder = OpenAIEmbedder::new(
        client_for(&server),
        &EmbeddingConfig {
            max_retries: 1,
            ..EmbeddingConfig::default()
        },
    );
    let vectors = embedder.embed(&["hello".to_string()]).await.unwrap();

    assert_eq!(vectors, vec![vec![0.5, 0.5]]);
}

#[tokio::test]
async fn test_client_error_fails_without_retry() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/embeddings"))
        .respond_with(ResponseTemplate::new(400).set_body_json(
            json!({"error": {"message": "Invalid input: empty string", "type": "invalid_request_error"}}),
        ))
        .expect(1)
        .mount(&server)
        .await;

    let embedder = OpenAIEmbedder::new(
        client_for(&server),
        &EmbeddingConfig {
            max_retries: 3,
            ..EmbeddingConfig::default()
        },
    );
    let err = embedder.embed(&[String::new()]).await.unwrap_err();

    match err {
        Error::Service { service, message } => {
            assert_eq!(service, "embeddings");
            assert!(message.contains("400"), "message: {}", message);
            assert!(
                message.contains("Invalid input: empty string"),
                "message: {}",
                message
            );
        }
        other => panic!("expected service error, got {}", other),
    }
    assert_eq!(server.received_requests().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_embeddings_batched_and_kept_in_input_order() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/embeddings"))
        .and(header("authorization", "Bearer sk-test"))
        .respond_with(LengthEmbeddings)
        .expect(2)
        .mount(&server)
        .await;

    let embedder = OpenAIEmbedder::new(
        client_for(&server),
        &EmbeddingConfig {
            batch_size: 2,
            ..EmbeddingConfig::default()
        },
    );
    let texts = vec!["a".to_string(), "bb".to_string(), "ccc".to_string()];
    let vectors = embedder.embed(&texts).await.unwrap();

    assert_eq!(vectors, vec![vec![1.0], vec![2.0], vec![3.0]]);

    let requests = server.received_requests().await.unwrap();
    let batches: Vec<usize> = requests
        .iter()
        .map(|r| r.body_json::<Value>().unwrap()["input"].as_array().unwrap().len())
        .collect();
    assert_eq!(batches, vec![2, 1]);
    let model = requests[0].body_json::<Value>().unwrap()["model"].clone();
    assert_eq!(model, json!("text-embedding-ada-002"));
}

#[tokio::test]
async fn test_chat_completion_returns_first_choice() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", "Bearer sk-test"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "chatcmpl-1",
            "object": "chat.completion",
            "choices": [
                {"index": 0, "message": {"role": "assistant", "content": "Cargo builds crates."}, "finish_reason": "stop"},
                {"index": 1, "message": {"role": "assistant", "content": "ignored"}, "finish_reason": "stop"}
            ],
            "usage": {"prompt_tokens": 10, "completion_tokens": 4, "total_tokens": 14}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let chat = OpenAIChat::new(client_for(&server), &ChatConfig::default());
    let answer = chat
        .complete(&[
            ChatMessage::system("context"),
            ChatMessage::user("what builds crates?"),
        ])
        .await
        .unwrap();

    assert_eq!(answer, "Cargo builds crates.");

    let requests = server.received_requests().await.unwrap();
    let body: Value = requests[0].body_json().unwrap();
    assert_eq!(body["model"], json!("gpt-3.5-turbo"));
    assert_eq!(body["messages"][1]["content"], json!("what builds crates?"));
}
