use cairn_llm::{ContentBlock, ToolResult, Turn};
use cairn_persist::{FileSessionStore, PersistError, SessionSnapshot, SessionStore};
use serde_json::{json, Value};

fn history() -> Vec<Turn> {
    vec![
        Turn::user("ping please"),
        Turn::assistant(vec![ContentBlock::tool("t1", "ping", json!({}))]),
        Turn::tool_results(vec![ToolResult::new("t1", r#"{"ok":true,"_duration_ms":0}"#)]),
        Turn::assistant(vec![ContentBlock::text("done")]),
    ]
}

#[tokio::test]
async fn test_missing_file_loads_as_none() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileSessionStore::new(dir.path().join("session.json"));

    assert!(store.load().await.unwrap().is_none());
    store.clear().await.unwrap();
}

#[tokio::test]
async fn test_save_then_load_restores_history() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileSessionStore::new(dir.path().join("nested/session.json"));

    let snapshot = SessionSnapshot::new(history());
    store.save(&snapshot).await.unwrap();

    let loaded = store.load().await.unwrap().unwrap();
    assert_eq!(loaded, snapshot);
    assert_eq!(loaded.into_validated_messages().unwrap(), history());
    assert!(!dir.path().join("nested/session.json.tmp").exists());
}

#[tokio::test]
async fn test_file_uses_saved_at_key() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.json");
    let store = FileSessionStore::new(&path);

    store.save(&SessionSnapshot::new(vec![Turn::user("hi")])).await.unwrap();

    let raw: Value = serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
    assert!(raw.get("savedAt").is_some());
    assert_eq!(raw["messages"], json!([{"role": "user", "content": "hi"}]));
}

#[tokio::test]
async fn test_clear_removes_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.json");
    let store = FileSessionStore::new(&path);

    store.save(&SessionSnapshot::new(history())).await.unwrap();
    store.clear().await.unwrap();

    assert!(!path.exists());
    assert!(store.load().await.unwrap().is_none());
}

#[tokio::test]
async fn test_corrupt_file_is_a_serialization_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.json");
    std::fs::write(&path, b"{\"messages\": [").unwrap();

    let store = FileSessionStore::new(&path);
    assert!(matches!(store.load().await, Err(PersistError::Serialization(_))));
}

#[test]
fn test_broken_pairing_is_rejected_on_hydrate() {
    let mut turns = history();
    turns.remove(2);

    let snapshot = SessionSnapshot::new(turns);
    assert!(matches!(
        snapshot.into_validated_messages(),
        Err(PersistError::InvalidHistory(_))
    ));
}
