//! CLI tests against a mock API server.
//!
//! Each test runs the built binary with an isolated credential store in a
//! temporary directory.

use std::path::{Path, PathBuf};
use std::process::Output;

use serde_json::{Value, json};
use tempfile::TempDir;
use tokio::process::Command;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Run the CLI binary against `base_url` with the store at `store`.
async fn run_cli(args: &[&str], base_url: &str, store: &Path) -> Output {
    Command::new(env!("CARGO_BIN_EXE_authfetch"))
        .args(args)
        .env("AUTHFETCH_BASE_URL", base_url)
        .env("AUTHFETCH_STORE", store)
        .env_remove("RUST_LOG")
        .output()
        .await
        .expect("Failed to execute CLI")
}

/// Run the CLI and expect success, returning stdout.
async fn run_cli_success(args: &[&str], base_url: &str, store: &Path) -> String {
    let output = run_cli(args, base_url, store).await;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        panic!("CLI command failed: {:?}\nstderr: {}", args, stderr);
    }
    String::from_utf8_lossy(&output.stdout).to_string()
}

fn store_path(dir: &TempDir) -> PathBuf {
    dir.path().join("credentials.json")
}

fn write_credential(store: &Path, access: &str, refresh: &str) {
    let slots = json!({ "auth_token": access, "refresh_token": refresh });
    std::fs::write(store, serde_json::to_string(&slots).unwrap()).unwrap();
}

fn read_slots(store: &Path) -> Value {
    serde_json::from_str(&std::fs::read_to_string(store).unwrap()).unwrap()
}

#[tokio::test]
async fn test_status_without_session() {
    let dir = TempDir::new().unwrap();
    let stdout = run_cli_success(&["status"], "http://localhost:9", &store_path(&dir)).await;
    assert_eq!(stdout.trim(), "unauthenticated");
}

#[tokio::test]
async fn test_login_persists_credential() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .and(body_json(json!({ "phone": "13800000000", "password": "secret123" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": {
                "accessToken": "access-1",
                "refreshToken": "refresh-1",
                "expiresIn": 3600
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let store = store_path(&dir);

    run_cli_success(
        &["login", "--phone", "13800000000", "--password", "secret123"],
        &server.uri(),
        &store,
    )
    .await;

    let slots = read_slots(&store);
    assert_eq!(slots["auth_token"], "access-1");
    assert_eq!(slots["refresh_token"], "refresh-1");

    let stdout = run_cli_success(&["status"], &server.uri(), &store).await;
    assert_eq!(stdout.trim(), "authenticated");
}

#[tokio::test]
async fn test_logout_clears_store() {
    let dir = TempDir::new().unwrap();
    let store = store_path(&dir);
    write_credential(&store, "access-1", "refresh-1");

    run_cli_success(&["logout"], "http://localhost:9", &store).await;

    let slots = read_slots(&store);
    assert!(slots.get("auth_token").is_none());
    assert!(slots.get("refresh_token").is_none());
}

#[tokio::test]
async fn test_request_refreshes_expired_session() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/users/7"))
        .and(header("authorization", "Bearer old-access"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/users/7"))
        .and(header("authorization", "Bearer new-access"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "7" })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/auth/token/refresh"))
        .and(body_json(json!({ "refreshToken": "old-refresh" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": { "accessToken": "new-access", "refreshToken": "new-refresh" }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let store = store_path(&dir);
    write_credential(&store, "old-access", "old-refresh");

    let stdout = run_cli_success(
        &["request", "get", "/users/{id}", "--path", "id=7"],
        &server.uri(),
        &store,
    )
    .await;

    let envelope: Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(envelope, json!({ "success": true, "data": { "id": "7" } }));

    let slots = read_slots(&store);
    assert_eq!(slots["auth_token"], "new-access");
    assert_eq!(slots["refresh_token"], "new-refresh");
}

#[tokio::test]
async fn test_request_failure_exits_nonzero() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(
            ResponseTemplate::new(404).set_body_json(json!({ "message": "user not found" })),
        )
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let output = run_cli(&["request", "GET", "/missing"], &server.uri(), &store_path(&dir)).await;

    assert!(!output.status.success());
    let envelope: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(envelope["success"], false);
    assert_eq!(envelope["errorCode"], 404);
    assert_eq!(envelope["errorMessage"], "user not found");
}

#[tokio::test]
async fn test_request_with_unresolved_placeholder_fails() {
    let server = MockServer::start().await;

    let dir = TempDir::new().unwrap();
    let output = run_cli(&["request", "GET", "/users/{id}"], &server.uri(), &store_path(&dir)).await;

    assert!(!output.status.success());
    assert!(output.stdout.is_empty());
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_refresh_failure_ends_session() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/token/refresh"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let store = store_path(&dir);
    write_credential(&store, "old-access", "old-refresh");

    let output = run_cli(&["refresh"], &server.uri(), &store).await;
    assert!(!output.status.success());

    let stdout = run_cli_success(&["status"], &server.uri(), &store).await;
    assert_eq!(stdout.trim(), "unauthenticated");
}
