//! Integration tests for the layered configuration

use std::sync::Mutex;
use structsync::config::ConfigLoader;
use tempfile::TempDir;

// Tests in this module mutate process environment.
static ENV_MUTEX: Mutex<()> = Mutex::new(());

fn write_workspace_config(root: &std::path::Path, name: &str, body: &str) {
    let dir = root.join("config");
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join(name), body).unwrap();
}

#[test]
fn test_workspace_config_is_loaded() {
    let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    let temp = TempDir::new().unwrap();
    write_workspace_config(
        temp.path(),
        "config.toml",
        r#"
[backend]
base_url = "https://plan.example.org"
project_id = 7
api_token = "secret"

[logging]
level = "warn"
"#,
    );

    let config = ConfigLoader::load(temp.path()).unwrap();
    assert_eq!(config.backend.base_url, "https://plan.example.org");
    assert_eq!(config.backend.project_id, Some(7));
    assert_eq!(config.backend.api_token.as_deref(), Some("secret"));
    assert_eq!(config.backend.request_timeout_secs, 120);
    assert_eq!(config.logging.level, "warn");
    assert!(config.validate().is_ok());
}

#[test]
fn test_environment_overrides_workspace_file() {
    let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    let temp = TempDir::new().unwrap();
    write_workspace_config(temp.path(), "config.toml", "[backend]\nproject_id = 7\n");

    std::env::set_var("STRUCTSYNC__BACKEND__PROJECT_ID", "99");
    std::env::set_var("STRUCTSYNC__BACKEND__BASE_URL", "http://env-host:9000");
    let config = ConfigLoader::load(temp.path());
    std::env::remove_var("STRUCTSYNC__BACKEND__PROJECT_ID");
    std::env::remove_var("STRUCTSYNC__BACKEND__BASE_URL");

    let config = config.unwrap();
    assert_eq!(config.backend.project_id, Some(99));
    assert_eq!(config.backend.base_url, "http://env-host:9000");
}

#[test]
fn test_invalid_values_are_reported_together() {
    let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    let temp = TempDir::new().unwrap();
    let file = temp.path().join("bad.toml");
    std::fs::write(
        &file,
        "[backend]\nbase_url = \"ftp://plan\"\n\n[logging]\noutput = \"syslog\"\n",
    )
    .unwrap();

    let config = ConfigLoader::load_from_file(&file).unwrap();
    let issues = config.validate().unwrap_err();
    assert_eq!(issues.len(), 2);
}

#[test]
fn test_global_config_path_is_namespaced() {
    if let Some(path) = ConfigLoader::global_config_path() {
        assert!(path.ends_with("config.toml"));
        assert!(path.to_string_lossy().contains("structsync"));
    }
}
