mod common;

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::body::to_bytes;
use axum::Router;
use common::resume_passages;
use common::FakeGenerator;
use common::FakeIndex;
use common::Fakes;
use http::Method;
use http::Request;
use http::StatusCode;
use personarag::api::app;
use personarag::api::AppState;
use personarag::conversation::ConversationLoop;
use personarag::conversation::SessionManager;
use serde_json::json;
use serde_json::Value;
use tower::ServiceExt;

fn router(fakes: &Fakes) -> Router {
    app(AppState {
        sessions: Arc::new(SessionManager::default()),
        conversation: Arc::new(ConversationLoop::new(
            Arc::new(fakes.service(5)),
            Duration::from_secs(5),
            false,
        )),
    })
}

async fn send(
    router: &Router,
    method: Method,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, String) {
    let request = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => request
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => request.body(Body::empty()).unwrap(),
    };

    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
}

async fn send_json(
    router: &Router,
    method: Method,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let (status, body) = send(router, method, uri, body).await;
    (status, serde_json::from_str(&body).unwrap())
}

async fn create_session(router: &Router) -> String {
    let (status, body) = send_json(router, Method::POST, "/api/sessions", None).await;
    assert_eq!(status, StatusCode::OK);
    body["data"]["session_id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_chat_page() {
    let fakes = Fakes::new(FakeIndex::default(), FakeGenerator::replying("unused"));
    let (status, body) = send(&router(&fakes), Method::GET, "/", None).await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("<title>Dominic RAG LLM</title>"));
    assert!(body.contains("Ask me anything..."));
}

#[tokio::test]
async fn test_health() {
    let fakes = Fakes::new(FakeIndex::default(), FakeGenerator::replying("unused"));
    let (status, body) = send_json(&router(&fakes), Method::GET, "/api/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["status"], "healthy");
}

#[tokio::test]
async fn test_session_lifecycle() {
    let fakes = Fakes::new(
        FakeIndex::with_passages(resume_passages()),
        FakeGenerator::replying("Mostly event-sourced systems."),
    );
    let router = router(&fakes);
    let id = create_session(&router).await;

    let uri = format!("/api/sessions/{id}");
    let (status, body) = send_json(&router, Method::GET, &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["state"], "awaiting_input");
    assert_eq!(body["data"]["messages"], json!([]));

    let (status, body) = send_json(
        &router,
        Method::POST,
        &format!("/api/sessions/{id}/messages"),
        Some(json!({ "content": "What have you built?" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["reply"]["role"], "assistant");
    assert_eq!(body["data"]["reply"]["content"], "Mostly event-sourced systems.");
    let messages = body["data"]["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0]["role"], "user");
    assert_eq!(messages[0]["content"], "What have you built?");

    let (status, _) = send_json(&router, Method::DELETE, &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, body) = send_json(&router, Method::GET, &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_unknown_session_is_404() {
    let fakes = Fakes::new(FakeIndex::default(), FakeGenerator::replying("unused"));
    let router = router(&fakes);

    let (status, _) = send_json(
        &router,
        Method::POST,
        "/api/sessions/missing/messages",
        Some(json!({ "content": "hello" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send_json(&router, Method::POST, "/api/sessions/missing/cancel", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_empty_message_is_400() {
    let fakes = Fakes::new(FakeIndex::default(), FakeGenerator::replying("unused"));
    let router = router(&fakes);
    let id = create_session(&router).await;

    let (status, body) = send_json(
        &router,
        Method::POST,
        &format!("/api/sessions/{id}/messages"),
        Some(json!({ "content": "   " })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    let (_, body) = send_json(&router, Method::GET, &format!("/api/sessions/{id}"), None).await;
    assert_eq!(body["data"]["messages"], json!([]));
}

#[tokio::test]
async fn test_busy_session_is_409() {
    let fakes = Fakes::new(
        FakeIndex {
            passages: resume_passages(),
            delay: Some(Duration::from_millis(300)),
            ..FakeIndex::default()
        },
        FakeGenerator::replying("done"),
    );
    let router = router(&fakes);
    let id = create_session(&router).await;

    let first = {
        let router = router.clone();
        let uri = format!("/api/sessions/{id}/messages");
        tokio::spawn(async move {
            send_json(&router, Method::POST, &uri, Some(json!({ "content": "first" }))).await
        })
    };
    tokio::time::sleep(Duration::from_millis(50)).await;

    let (status, _) = send_json(
        &router,
        Method::POST,
        &format!("/api/sessions/{id}/messages"),
        Some(json!({ "content": "second" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = first.await.unwrap();
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["messages"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_upstream_failure_is_502_with_notice() {
    let fakes = Fakes::new(
        FakeIndex {
            fail: true,
            ..FakeIndex::default()
        },
        FakeGenerator::replying("unused"),
    );
    let router = router(&fakes);
    let id = create_session(&router).await;

    let (status, body) = send_json(
        &router,
        Method::POST,
        &format!("/api/sessions/{id}/messages"),
        Some(json!({ "content": "hello" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["success"], false);

    let (_, body) = send_json(&router, Method::GET, &format!("/api/sessions/{id}"), None).await;
    let messages = body["data"]["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[1]["role"], "assistant");
}

#[tokio::test]
async fn test_stream_endpoint_emits_turn_events() {
    let fakes = Fakes::new(
        FakeIndex::with_passages(resume_passages()),
        FakeGenerator::replying("Streaming works."),
    );
    let router = router(&fakes);
    let id = create_session(&router).await;

    let (status, body) = send(
        &router,
        Method::POST,
        &format!("/api/sessions/{id}/messages/stream"),
        Some(json!({ "content": "hello" })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let events: Vec<&str> = body
        .lines()
        .filter_map(|line| line.strip_prefix("event:"))
        .map(str::trim)
        .collect();
    assert_eq!(events, vec!["user", "assistant", "done"]);
    assert!(body.contains("Streaming works."));
}

#[tokio::test]
async fn test_cancel_without_running_turn() {
    let fakes = Fakes::new(FakeIndex::default(), FakeGenerator::replying("unused"));
    let router = router(&fakes);
    let id = create_session(&router).await;

    let (status, body) =
        send_json(&router, Method::POST, &format!("/api/sessions/{id}/cancel"), None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["cancelled"], false);
}
