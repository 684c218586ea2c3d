use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};
use hcchat::config::GenerationConfig;
use hcchat::providers::{GenerationClient, OllamaClient};
use hcchat::storage::SqliteStorage;

#[allow(dead_code)]
pub fn create_temp_storage() -> (SqliteStorage, TempDir) {
    let tmp = TempDir::new().expect("failed to create tempdir");
    let db_path = tmp.path().join("sessions.db");
    let storage =
        SqliteStorage::new_with_path(db_path).expect("failed to create sqlite storage with path");
    (storage, tmp)
}

#[allow(dead_code)]
pub fn reopen_storage(dir: &TempDir) -> SqliteStorage {
    SqliteStorage::new_with_path(dir.path().join("sessions.db")).expect("failed to reopen storage")
}

#[allow(dead_code)]
pub fn temp_config_file(contents: &str) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().expect("failed to create tempdir");
    let config_path = temp_dir.path().join("config.yaml");
    fs::write(&config_path, contents).expect("failed to write config file");
    (temp_dir, config_path)
}

/// Generation client pointed at a mock server
#[allow(dead_code)]
pub fn client_for(host: &str) -> Arc<dyn GenerationClient> {
    let config = GenerationConfig {
        host: host.to_string(),
        model: "test-model".to_string(),
        timeout_seconds: Some(5),
    };
    Arc::new(OllamaClient::new(config).expect("failed to build client"))
}

/// Answer every generate request with `reply`
#[allow(dead_code)]
pub async fn mount_reply(server: &MockServer, reply: &str) {
    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "model": "test-model",
            "response": reply,
            "done": true
        })))
        .mount(server)
        .await;
}
