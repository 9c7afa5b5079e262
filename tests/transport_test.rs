//! HTTP-level tests for the reqwest transport and both wire shapes.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use charla::providers::{ChatTuning, HeaderStrategy, build_request, normalize};
use charla::{
    Availability, Catalog, CharlaError, DispatchEngine, Message, Provider, RandomPicker,
    ReqwestTransport, Transport,
};

fn messages() -> Vec<Message> {
    vec![Message::system("Eres útil."), Message::user("Hola")]
}

/// A local address nothing listens on.
fn closed_port_uri() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}")
}

fn chat_provider(server: &MockServer) -> Provider {
    Provider::chat_completions(
        "openai",
        format!("{}/v1/chat/completions", server.uri()),
        "gpt-4.1-mini",
        "OPENAI_API_KEY",
    )
    .with_tuning(ChatTuning::openai())
}

// ============================================================================
// Chat-completions
// ============================================================================

#[tokio::test]
async fn chat_completion_round_trip() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("Authorization", "Bearer sk-test"))
        .and(header("Content-Type", "application/json"))
        .and(body_partial_json(json!({
            "model": "gpt-4.1-mini",
            "max_tokens": 800,
            "temperature": 0.8,
            "presence_penalty": 0.2,
            "frequency_penalty": 0.2,
            "messages": [
                {"role": "system", "content": "Eres útil."},
                {"role": "user", "content": "Hola"}
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"message": {"role": "assistant", "content": "¡Hola! ¿Qué más?"}}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let provider = chat_provider(&server);
    let request = build_request(&provider, "sk-test", &messages()).unwrap();
    let response = ReqwestTransport::new().unwrap().send(&request).await.unwrap();

    assert_eq!(response.status, 200);
    assert_eq!(normalize(&provider.shape, &response).unwrap(), "¡Hola! ¿Qué más?");
}

#[tokio::test]
async fn openrouter_attribution_headers_are_sent() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(header("Authorization", "Bearer sk-or"))
        .and(header("HTTP-Referer", "https://alexa-chatgpt.com"))
        .and(header("X-Title", "Alexa ChatGPT Skill"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"message": {"content": "ok"}}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let provider = Provider::chat_completions("openrouter", server.uri(), "m", "OPENROUTER_API_KEY")
        .with_headers(HeaderStrategy::openrouter());
    let request = build_request(&provider, "sk-or", &messages()).unwrap();
    let response = ReqwestTransport::new().unwrap().send(&request).await.unwrap();

    assert_eq!(response.status, 200);
}

#[tokio::test]
async fn server_error_is_returned_as_response() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(503)
                .set_body_json(json!({"error": {"message": "overloaded"}})),
        )
        .mount(&server)
        .await;

    let provider = chat_provider(&server);
    let request = build_request(&provider, "sk-test", &messages()).unwrap();
    let response = ReqwestTransport::new().unwrap().send(&request).await.unwrap();
    assert_eq!(response.status, 503);

    let err = normalize(&provider.shape, &response).unwrap_err();
    assert!(err.is_connection_class());
    assert!(err.to_string().contains("overloaded"));
}

#[tokio::test]
async fn slow_provider_times_out() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
        .mount(&server)
        .await;

    let provider = chat_provider(&server).with_timeout(Duration::from_millis(50));
    let request = build_request(&provider, "sk-test", &messages()).unwrap();
    let err = ReqwestTransport::new().unwrap().send(&request).await.unwrap_err();

    assert!(matches!(err, CharlaError::Timeout), "got {err:?}");
    assert!(err.is_connection_class());
}

#[tokio::test]
async fn unreachable_host_is_connection_class() {
    let provider = Provider::chat_completions("x", closed_port_uri(), "m", "KEY");
    let request = build_request(&provider, "k", &messages()).unwrap();
    let err = ReqwestTransport::new().unwrap().send(&request).await.unwrap_err();

    assert!(err.is_connection_class(), "got {err:?}");
}

// ============================================================================
// Generative-content
// ============================================================================

#[tokio::test]
async fn generative_content_round_trip() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/models/gemini-2.0-flash:generateContent"))
        .and(query_param("key", "g-secret"))
        .and(body_partial_json(json!({
            "contents": [
                {"role": "user", "parts": [{"text": "Eres útil."}]},
                {"role": "user", "parts": [{"text": "Hola"}]}
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{"content": {"parts": [{"text": "Hola"}, {"text": "amigo"}]}}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let provider = Provider::generative_content(
        "gemini_20",
        format!("{}/models/gemini-2.0-flash:generateContent", server.uri()),
        "gemini-2.0-flash",
        "GEMINI_API_KEY",
    );
    let request = build_request(&provider, "g-secret", &messages()).unwrap();
    let response = ReqwestTransport::new().unwrap().send(&request).await.unwrap();

    assert_eq!(normalize(&provider.shape, &response).unwrap(), "Hola amigo");
}

#[tokio::test]
async fn transport_errors_do_not_leak_query_credential() {
    let uri = closed_port_uri();
    let provider = Provider::generative_content("g", format!("{uri}/gen"), "m", "GEMINI_API_KEY");
    let request = build_request(&provider, "g-very-secret", &messages()).unwrap();
    let err = ReqwestTransport::new().unwrap().send(&request).await.unwrap_err();

    assert!(!err.to_string().contains("g-very-secret"));
}

// ============================================================================
// Engine over real HTTP
// ============================================================================

#[tokio::test]
async fn engine_falls_back_over_http() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/down"))
        .respond_with(ResponseTemplate::new(502).set_body_string("Bad Gateway"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/up"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"message": {"content": "<think>hmm</think>Bogotá"}}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let catalog = Catalog::new(vec![
        Provider::chat_completions("down", format!("{}/down", server.uri()), "m", "KEY"),
        Provider::chat_completions("up", format!("{}/up", server.uri()), "m", "KEY"),
    ]);
    let creds = HashMap::from([("KEY".to_string(), "secret".to_string())]);
    let availability = Arc::new(Availability::resolve(&catalog, &creds).unwrap());
    let engine = DispatchEngine::builder(availability)
        .picker(Arc::new(RandomPicker))
        .build()
        .unwrap();

    let mut session = engine.new_session().with_current_provider("down");
    let turn = engine.respond(&mut session, "¿Capital de Colombia?").await;

    assert_eq!(turn.text, "Bogotá");
    assert_eq!(turn.attempts, 2);
    assert_eq!(session.current_provider(), Some("up"));
}
