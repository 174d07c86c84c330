use std::sync::Arc;

use cairn_tools::{
    AutoApprove, AutoDecline, HttpSaveBackend, SaveBackend, SaveError, SaveRequest, ToolExecutor,
    ToolRegistry, Workspace, WorkspaceChange,
};
use mockito::Matcher;
use serde_json::json;

fn registry(endpoint: String, approve: bool) -> (ToolRegistry, Workspace) {
    let workspace = Workspace::new();
    let registry = ToolRegistry::new(workspace.clone())
        .with_save_backend(Arc::new(HttpSaveBackend::new(endpoint)));
    let registry = if approve {
        registry.with_confirm(Arc::new(AutoApprove))
    } else {
        registry.with_confirm(Arc::new(AutoDecline))
    };
    (registry, workspace)
}

#[tokio::test]
async fn test_confirmed_save_returns_backend_result_verbatim() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/save")
        .match_body(Matcher::Json(json!({"path": "notes.md", "content": "# Notes"})))
        .with_status(200)
        .with_body(r#"{"ok":true,"sha":"abc123","url":"https://example.test/notes.md"}"#)
        .create_async()
        .await;

    let (registry, workspace) = registry(format!("{}/save", server.url()), true);
    let result = registry
        .execute("save_document", json!({"path": "notes.md", "content": "# Notes"}))
        .await;

    mock.assert_async().await;
    assert_eq!(
        result,
        json!({"ok": true, "sha": "abc123", "url": "https://example.test/notes.md"})
    );
    assert_eq!(
        workspace.journal().await,
        vec![WorkspaceChange::Saved { path: "notes.md".to_string() }]
    );
}

#[tokio::test]
async fn test_declined_save_has_no_side_effect() {
    let mut server = mockito::Server::new_async().await;
    let mock = server.mock("POST", "/save").expect(0).create_async().await;

    let (registry, workspace) = registry(format!("{}/save", server.url()), false);
    let result = registry
        .execute("save_document", json!({"path": "notes.md", "content": "x"}))
        .await;

    mock.assert_async().await;
    assert_eq!(result, json!({"ok": false, "reason": "cancelled"}));
    assert!(workspace.journal().await.is_empty());
}

#[tokio::test]
async fn test_backend_error_body_is_passed_through() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/save")
        .with_status(409)
        .with_body(r#"{"error":"conflict: file changed upstream"}"#)
        .create_async()
        .await;

    let backend = HttpSaveBackend::new(format!("{}/save", server.url()));
    let request = SaveRequest {
        path: "a.md".to_string(),
        content: "x".to_string(),
        message: Some("update".to_string()),
    };

    let result = backend.save(&request).await.unwrap();
    assert_eq!(result, json!({"error": "conflict: file changed upstream"}));
}

#[tokio::test]
async fn test_non_json_response_is_a_decode_error() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/save")
        .with_status(502)
        .with_body("<html>Bad Gateway</html>")
        .create_async()
        .await;

    let backend = HttpSaveBackend::new(format!("{}/save", server.url()));
    let request = SaveRequest {
        path: "a.md".to_string(),
        content: "x".to_string(),
        message: None,
    };

    assert!(matches!(backend.save(&request).await, Err(SaveError::Decode(_))));
}

#[tokio::test]
async fn test_transport_failure_becomes_error_result() {
    let (registry, _) = registry("http://127.0.0.1:9/save".to_string(), true);
    let result = registry
        .execute("save_document", json!({"path": "a.md", "content": "x"}))
        .await;

    assert!(result["error"].as_str().unwrap().starts_with("save request failed"));
}
