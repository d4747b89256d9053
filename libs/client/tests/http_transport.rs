use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use awsteam_client::{
    CONDITIONAL_CHECK_FAILED, ClientConfig, ClientError, GraphTransport, HttpGraphTransport,
    ProviderConfig,
};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use axum::{Form, Json, Router};
use serde_json::{Value, json};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

#[derive(Clone, Default)]
struct Recorder {
    token_calls: Arc<AtomicUsize>,
    token_forms: Arc<Mutex<Vec<HashMap<String, String>>>>,
    graph_headers: Arc<Mutex<Vec<String>>>,
    graph_bodies: Arc<Mutex<Vec<Value>>>,
}

async fn spawn_backend(graph_reply: (StatusCode, Value)) -> Option<(SocketAddr, Recorder)> {
    let listener = match TcpListener::bind("127.0.0.1:0").await {
        Ok(listener) => listener,
        Err(err) => {
            eprintln!("skipping http transport test: {err}");
            return None;
        }
    };
    let recorder = Recorder::default();

    let app = Router::new()
        .route(
            "/oauth2/token",
            post({
                let recorder = recorder.clone();
                move |Form(form): Form<HashMap<String, String>>| {
                    let recorder = recorder.clone();
                    async move {
                        recorder.token_calls.fetch_add(1, Ordering::SeqCst);
                        recorder.token_forms.lock().unwrap().push(form);
                        Json(json!({
                            "access_token": "token-123",
                            "expires_in": 3600,
                            "token_type": "Bearer"
                        }))
                    }
                }
            }),
        )
        .route(
            "/graphql",
            post({
                let recorder = recorder.clone();
                move |headers: HeaderMap, Json(body): Json<Value>| {
                    let recorder = recorder.clone();
                    let (status, reply) = graph_reply.clone();
                    async move {
                        let auth = headers
                            .get("authorization")
                            .and_then(|value| value.to_str().ok())
                            .unwrap_or_default()
                            .to_string();
                        recorder.graph_headers.lock().unwrap().push(auth);
                        recorder.graph_bodies.lock().unwrap().push(body);
                        (status, Json(reply))
                    }
                }
            }),
        );

    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        if let Err(err) = axum::serve(listener, app.into_make_service()).await {
            eprintln!("mock backend error: {err}");
        }
    });
    Some((addr, recorder))
}

fn transport_for(addr: SocketAddr) -> HttpGraphTransport {
    let config = ClientConfig::resolve_with(
        &ProviderConfig {
            client_id: Some("client-abc".into()),
            client_secret: Some("secret-xyz".into()),
            graph_endpoint: Some(format!("http://{addr}/graphql")),
            token_endpoint: Some(format!("http://{addr}/oauth2/token")),
        },
        |_| None,
    )
    .unwrap();
    HttpGraphTransport::new(config).unwrap()
}

#[tokio::test]
#[tracing_test::traced_test]
async fn exchanges_token_once_and_sends_bearer() {
    let reply = json!({ "data": { "getSettings": { "id": "settings", "duration": "9" } } });
    let Some((addr, recorder)) = spawn_backend((StatusCode::OK, reply)).await else {
        return;
    };
    let transport = transport_for(addr);

    let document = "query GetSettings($id: ID!) { getSettings(id: $id) { id duration } }";
    let first = transport
        .execute(document, json!({ "id": "settings" }))
        .await
        .unwrap();
    transport
        .execute(document, json!({ "id": "settings" }))
        .await
        .unwrap();

    let data: Value = serde_json::from_slice(&first).unwrap();
    assert_eq!(data["getSettings"]["duration"], "9");

    assert_eq!(recorder.token_calls.load(Ordering::SeqCst), 1);
    let form = recorder.token_forms.lock().unwrap()[0].clone();
    assert_eq!(form["grant_type"], "client_credentials");
    assert_eq!(form["client_id"], "client-abc");
    assert_eq!(form["client_secret"], "secret-xyz");

    let headers = recorder.graph_headers.lock().unwrap().clone();
    assert_eq!(headers, vec!["Bearer token-123", "Bearer token-123"]);
    let bodies = recorder.graph_bodies.lock().unwrap().clone();
    assert_eq!(bodies[0]["query"], document);
    assert_eq!(bodies[0]["variables"]["id"], "settings");

    assert!(logs_contain("GetSettings"));
    assert!(!logs_contain("secret-xyz"));
}

#[tokio::test]
async fn graph_errors_surface_as_client_errors() {
    let reply = json!({
        "data": { "createSettings": null },
        "errors": [{
            "message": "The conditional request failed",
            "errorType": "DynamoDB:ConditionalCheckFailedException",
            "path": ["createSettings"]
        }]
    });
    let Some((addr, _recorder)) = spawn_backend((StatusCode::OK, reply)).await else {
        return;
    };
    let transport = transport_for(addr);

    let err = transport
        .execute("mutation CreateSettings { x }", json!({}))
        .await
        .unwrap_err();
    assert!(err.has_error_class(CONDITIONAL_CHECK_FAILED));
    assert!(err.to_string().contains("conditional request failed"));
}

#[tokio::test]
async fn non_success_status_is_reported_with_body() {
    let reply = json!({ "message": "Unauthorized" });
    let Some((addr, _recorder)) = spawn_backend((StatusCode::UNAUTHORIZED, reply)).await else {
        return;
    };
    let transport = transport_for(addr);

    let err = transport
        .execute("query GetAccounts { getAccounts { id name } }", json!({}))
        .await
        .unwrap_err();
    match err {
        ClientError::Status { status, body } => {
            assert_eq!(status, 401);
            assert!(body.contains("Unauthorized"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn truncated_token_response_surfaces_the_read_failure() {
    let listener = match TcpListener::bind("127.0.0.1:0").await {
        Ok(listener) => listener,
        Err(err) => {
            eprintln!("skipping http transport test: {err}");
            return;
        }
    };
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        if let Ok((mut socket, _)) = listener.accept().await {
            let mut buf = vec![0u8; 8192];
            let _ = socket.read(&mut buf).await;
            let _ = socket
                .write_all(b"HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: 128\r\n\r\n{\"access_")
                .await;
            let _ = socket.shutdown().await;
        }
    });
    let transport = transport_for(addr);

    let err = transport
        .execute("query GetAccounts { getAccounts { id name } }", json!({}))
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::Http(_)), "unexpected error: {err}");
}
