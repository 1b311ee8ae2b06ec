use std::io::Write;
use std::net::TcpListener;
use std::path::Path;
use std::time::Duration;

use reqwest::Client;
use tempfile::NamedTempFile;
use tokio::process::Command;
use tokio::time::{sleep, timeout};

/// Credentials read from the environment as fallbacks; cleared so the
/// developer's shell cannot leak into the spawned server.
const CREDENTIAL_VARS: [&str; 4] = ["YOUTUBE_API_KEY", "STEAM_API_KEY", "OPENAI_API_KEY", "JWT_SECRET"];

/// Find an available port
fn get_available_port() -> u16 {
    TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port()
}

/// Create a minimal valid config
fn minimal_config(port: u16) -> String {
    format!(
        r#"
[auth]
method = "none"

[server]
host = "127.0.0.1"
port = {}
"#,
        port
    )
}

fn write_config(content: &str) -> NamedTempFile {
    let mut temp_file = NamedTempFile::new().unwrap();
    temp_file.write_all(content.as_bytes()).unwrap();
    temp_file.flush().unwrap();
    temp_file
}

fn server_command(config_path: &Path) -> Command {
    let mut command = Command::new(env!("CARGO_BIN_EXE_tutorial-finder"));
    command
        .env("TUTORIAL_FINDER_CONFIG", config_path)
        .env("RUST_LOG", "error") // Quiet logs during tests
        .kill_on_drop(true);
    for var in CREDENTIAL_VARS {
        command.env_remove(var);
    }
    command
}

/// Run the binary to completion and report whether it exited successfully.
async fn run_to_exit(config_path: &Path) -> bool {
    timeout(Duration::from_secs(5), server_command(config_path).output())
        .await
        .expect("Command timed out")
        .expect("Failed to execute command")
        .status
        .success()
}

/// Wait for server to be ready
async fn wait_for_server(port: u16, max_attempts: u32) -> bool {
    let client = Client::new();
    for _ in 0..max_attempts {
        if client
            .get(format!("http://127.0.0.1:{}/api/health", port))
            .send()
            .await
            .is_ok()
        {
            return true;
        }
        sleep(Duration::from_millis(50)).await;
    }
    false
}

#[tokio::test]
async fn test_health_endpoint() {
    let port = get_available_port();
    let config = write_config(&minimal_config(port));

    let mut server = server_command(config.path())
        .spawn()
        .expect("Failed to spawn server");

    assert!(
        wait_for_server(port, 40).await,
        "Server did not start in time"
    );

    let response = Client::new()
        .get(format!("http://127.0.0.1:{}/api/health", port))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let json: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(json["status"], "ok");

    server.kill().await.ok();
}

#[tokio::test]
async fn test_config_endpoint_returns_sanitized() {
    let port = get_available_port();
    let config = write_config(&minimal_config(port));

    let mut server = server_command(config.path())
        .spawn()
        .expect("Failed to spawn server");

    assert!(
        wait_for_server(port, 40).await,
        "Server did not start in time"
    );

    let response = Client::new()
        .get(format!("http://127.0.0.1:{}/api/config", port))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let json: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(json["auth"]["method"], "none");
    assert_eq!(json["server"]["port"], port);
    assert_eq!(json["providers"]["youtube"]["api_key_configured"], false);
    assert_eq!(json["generator"]["api_key_configured"], false);

    server.kill().await.ok();
}

#[tokio::test]
async fn test_search_without_keys_reports_source_errors() {
    let port = get_available_port();
    let config = write_config(&minimal_config(port));

    let mut server = server_command(config.path())
        .spawn()
        .expect("Failed to spawn server");

    assert!(
        wait_for_server(port, 40).await,
        "Server did not start in time"
    );

    let response = Client::new()
        .get(format!("http://127.0.0.1:{}/api/search?q=malenia", port))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), reqwest::StatusCode::OK);

    let json: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(json["totalResults"], 0);
    assert_eq!(json["errors"].as_array().map(Vec::len), Some(2));

    server.kill().await.ok();
}

#[tokio::test]
async fn test_missing_config_file_exits_with_error() {
    assert!(!run_to_exit(Path::new("/nonexistent/config.toml")).await);
}

#[tokio::test]
async fn test_missing_auth_section_exits_with_error() {
    let config = write_config(
        r#"
[server]
port = 8080
"#,
    );

    assert!(!run_to_exit(config.path()).await);
}

#[tokio::test]
async fn test_jwt_without_secret_exits_with_error() {
    let config = write_config(
        r#"
[auth]
method = "jwt"

[server]
port = 8080
"#,
    );

    assert!(!run_to_exit(config.path()).await);
}
