//! Client behaviour against a live HTTP server.

use std::net::SocketAddr;

use api_client::{ApiClient, ClientError, CredentialPolicy, EndpointDefinition};
use axum::Json;
use axum::Router;
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use reqwest::Method;

async fn login() -> impl IntoResponse {
    ([(header::SET_COOKIE, "session=abc123; Path=/")], "ok")
}

async fn whoami(headers: HeaderMap) -> Json<serde_json::Value> {
    let cookie = headers
        .get(header::COOKIE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    Json(serde_json::json!({ "cookie": cookie }))
}

async fn broken() -> impl IntoResponse {
    (StatusCode::INTERNAL_SERVER_ERROR, "nope")
}

async fn start_server() -> SocketAddr {
    let app = Router::new()
        .route("/api/users/auth", post(login))
        .route("/api/users/me", get(whoami))
        .route("/api/broken", get(broken));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

fn client(addr: SocketAddr, credentials: CredentialPolicy) -> ApiClient {
    ApiClient::builder()
        .base_url(format!("http://{addr}"))
        .credentials(credentials)
        .tag_type("User")
        .build()
        .unwrap()
        .register(
            "login",
            EndpointDefinition::mutation(Method::POST, "/api/users/auth").invalidates("User"),
        )
        .unwrap()
        .register(
            "me",
            EndpointDefinition::query("/api/users/me").provides("User"),
        )
        .unwrap()
        .register("broken", EndpointDefinition::query("/api/broken"))
        .unwrap()
}

#[tokio::test]
async fn include_policy_sends_cookies_back() {
    let addr = start_server().await;
    let client = client(addr, CredentialPolicy::Include);

    let login = client.prepare("login", &[]).unwrap();
    let response = client.execute(login).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let me: serde_json::Value = client.query("me", &[]).await.unwrap();
    assert_eq!(me["cookie"], "session=abc123");
}

#[tokio::test]
async fn omit_policy_never_sends_cookies() {
    let addr = start_server().await;
    let client = client(addr, CredentialPolicy::Omit);

    let login = client.prepare("login", &[]).unwrap();
    client.execute(login).await.unwrap();

    let me: serde_json::Value = client.query("me", &[]).await.unwrap();
    assert!(me["cookie"].is_null());
}

#[tokio::test]
async fn query_maps_error_status() {
    let addr = start_server().await;
    let client = client(addr, CredentialPolicy::Include);

    let result: Result<serde_json::Value, _> = client.query("broken", &[]).await;
    match result {
        Err(ClientError::Status { status, url }) => {
            assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
            assert!(url.ends_with("/api/broken"));
        }
        other => panic!("expected status error, got {other:?}"),
    }
}
