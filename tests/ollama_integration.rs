mod common;

use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use askcsv::config::OllamaConfig;
use askcsv::providers::{Message, OllamaProvider, Provider};

fn provider(server: &MockServer) -> OllamaProvider {
    let cfg = OllamaConfig {
        host: server.uri(),
    };
    OllamaProvider::new(&cfg, "llama3.2:3b").unwrap()
}

#[tokio::test]
async fn test_ollama_complete_reports_eval_counts() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .and(body_partial_json(json!({"model": "llama3.2:3b", "stream": false})))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(common::ollama_answer("Austin", 310, 4)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let response = provider(&server)
        .complete(&[Message::user("Which city has the most listings?")], &[])
        .await
        .unwrap();

    assert_eq!(response.message.content.as_deref(), Some("Austin"));
    let usage = response.usage.expect("usage should be reported");
    assert_eq!(usage.prompt_tokens, 310);
    assert_eq!(usage.completion_tokens, 4);
}

#[tokio::test]
async fn test_ollama_tool_call_arguments_become_json_string() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(ResponseTemplate::new(200).set_body_json(common::ollama_tool_call(
            "value_counts",
            json!({"column": "city"}),
        )))
        .mount(&server)
        .await;

    let response = provider(&server)
        .complete(&[Message::user("Count listings per city")], &[])
        .await
        .unwrap();

    let calls = response.message.tool_calls.expect("tool calls expected");
    assert_eq!(calls[0].function.name, "value_counts");
    assert!(calls[0].id.starts_with("call_"));
    let args: serde_json::Value = serde_json::from_str(&calls[0].function.arguments).unwrap();
    assert_eq!(args, json!({"column": "city"}));
}

#[tokio::test]
async fn test_ollama_list_models_includes_size() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/tags"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "models": [
                {"name": "llama3.2:3b", "size": 2019393189u64},
                {"name": "llama3.3:70b", "size": 42520413916u64}
            ]
        })))
        .mount(&server)
        .await;

    let models = provider(&server).list_models().await.unwrap();
    assert_eq!(models.len(), 2);
    assert_eq!(models[0].name, "llama3.2:3b");
    assert_eq!(models[0].size_bytes, Some(2019393189));
}

#[tokio::test]
async fn test_ollama_error_status_is_reported() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(ResponseTemplate::new(404).set_body_string("model not found"))
        .mount(&server)
        .await;

    let err = provider(&server)
        .complete(&[Message::user("hi")], &[])
        .await
        .unwrap_err();
    assert!(err.to_string().contains("model not found"));
}
