//! Integration tests for the Coffer server.
//!
//! These tests run the real `coffer-server` binary, either in test mode or
//! against a shell script standing in for the Proton Pass CLI.

// Allow unwrap() in tests - panics are acceptable for test assertions
#![allow(clippy::disallowed_methods)]

use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use reqwest::{Client, StatusCode, Url};
use serde::Deserialize;
use tempfile::TempDir;

// ============================================================================
// API Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct SecretResponse {
    pub value: String,
}

#[derive(Debug, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Status, content type and body of a response.
#[derive(Debug)]
pub struct RawResponse {
    pub status: StatusCode,
    pub content_type: Option<String>,
    pub body: String,
}

// ============================================================================
// Test Server
// ============================================================================

/// How the spawned server should talk to the credential store.
pub enum Backend<'a> {
    /// `--test-mode`: fixtures only.
    TestMode,
    /// A fake `pass-cli` at `program`, logging in as `identity`.
    Script {
        program: &'a Path,
        identity: Option<&'a str>,
        lookup_timeout_secs: u64,
        not_found_exit_code: Option<i32>,
    },
}

fn server_command(port: u16, bundle: &Path, backend: &Backend<'_>) -> Result<Command> {
    let server_binary = find_server_binary()?;

    let mut cmd = Command::new(&server_binary);
    cmd.env_remove("COFFER_TEST_MODE")
        .env_remove("COFFER_IDENTITY")
        .arg("--host")
        .arg("127.0.0.1")
        .arg("--port")
        .arg(port.to_string())
        .arg("--bundle")
        .arg(bundle)
        .stdout(Stdio::null())
        .stderr(Stdio::null());

    match backend {
        Backend::TestMode => {
            cmd.arg("--test-mode");
        },
        Backend::Script {
            program,
            identity,
            lookup_timeout_secs,
            not_found_exit_code,
        } => {
            cmd.env_remove("COFFER_PASS_CLI_NOT_FOUND_CODE")
                .arg("--pass-cli")
                .arg(program)
                .arg("--lookup-timeout-secs")
                .arg(lookup_timeout_secs.to_string());
            if let Some(identity) = identity {
                cmd.arg("--identity").arg(identity);
            }
            if let Some(code) = not_found_exit_code {
                cmd.arg("--pass-cli-not-found-code").arg(code.to_string());
            }
        },
    }

    Ok(cmd)
}

/// A test server instance that manages its own bundle directory and process.
pub struct TestServer {
    process: Child,
    pub base_url: String,
    pub port: u16,
    pub bundle_path: PathBuf,
    _data_dir: TempDir,
}

impl TestServer {
    /// Start a test-mode server on the specified port.
    pub async fn start(port: u16) -> Result<Self> {
        Self::start_with(port, Backend::TestMode).await
    }

    /// Start a server with the given backend on the specified port.
    pub async fn start_with(port: u16, backend: Backend<'_>) -> Result<Self> {
        let data_dir = TempDir::new().context("Failed to create temp dir")?;
        let bundle_path = data_dir.path().join("config.js");

        let process = server_command(port, &bundle_path, &backend)?
            .spawn()
            .context("Failed to start server")?;

        let server = Self {
            process,
            base_url: format!("http://127.0.0.1:{}", port),
            port,
            bundle_path,
            _data_dir: data_dir,
        };

        // Wait for server to be ready
        server.wait_for_ready().await?;

        Ok(server)
    }

    /// Wait for the server to answer any HTTP request.
    async fn wait_for_ready(&self) -> Result<()> {
        let client = Client::new();
        let url = format!("{}/ready-check", self.base_url);

        for _ in 0..50 {
            match client.get(&url).send().await {
                Ok(_) => return Ok(()),
                Err(_) => tokio::time::sleep(Duration::from_millis(100)).await,
            }
        }

        bail!("Server failed to start within 5 seconds")
    }

    /// Get a configured HTTP client for this server.
    pub fn client(&self) -> CofferClient {
        CofferClient::new(&self.base_url)
    }

    /// Write the configuration bundle the server will serve.
    pub fn write_bundle(&self, contents: &[u8]) -> Result<()> {
        std::fs::write(&self.bundle_path, contents).context("Failed to write bundle")
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        let _ = self.process.kill();
        let _ = self.process.wait();
    }
}

/// Start a server expected to abort during startup and return its exit status.
pub async fn start_expecting_exit(port: u16, backend: Backend<'_>) -> Result<ExitStatus> {
    let data_dir = TempDir::new().context("Failed to create temp dir")?;
    let mut process = server_command(port, &data_dir.path().join("config.js"), &backend)?
        .spawn()
        .context("Failed to start server")?;

    for _ in 0..50 {
        if let Some(status) = process.try_wait()? {
            return Ok(status);
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }

    let _ = process.kill();
    let _ = process.wait();
    bail!("Server did not exit within 5 seconds")
}

/// Find the server binary in the target directory.
fn find_server_binary() -> Result<PathBuf> {
    let manifest_dir = std::env::var("CARGO_MANIFEST_DIR").unwrap_or_else(|_| ".".to_string());

    // Try debug build first, then release
    let candidates = [
        Path::new(&manifest_dir).join("../../target/debug/coffer-server"),
        Path::new(&manifest_dir).join("../../target/debug/coffer-server.exe"),
        Path::new(&manifest_dir).join("../../target/release/coffer-server"),
        Path::new(&manifest_dir).join("../../target/release/coffer-server.exe"),
    ];

    for candidate in &candidates {
        if candidate.exists() {
            return Ok(candidate.canonicalize()?);
        }
    }

    bail!(
        "Could not find coffer-server binary. Run 'cargo build -p coffer-server' first. Searched in: {:?}",
        candidates
    )
}

/// Write an executable shell script named `pass-cli` into `dir`.
#[cfg(unix)]
pub fn write_fake_pass_cli(dir: &Path, body: &str) -> Result<PathBuf> {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join("pass-cli");
    std::fs::write(&path, format!("#!/bin/sh\n{}\n", body))?;
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755))?;
    Ok(path)
}

/// Fake tool: accepts one identity and knows a handful of items.
pub const FAKE_PASS_CLI: &str = r#"
case "$1" in
  login)
    [ "$2" = "ops@example.com" ] || { echo "invalid credentials" >&2; exit 1; }
    ;;
  item)
    case "$3" in
      db) echo '{"content":{"password":"p4ss","text":"ignored"}}' ;;
      note) echo '{"content":{"text":"remember me"}}' ;;
      bare) echo '{"content":{}}' ;;
      garbled) echo 'not json at all' ;;
      slow) sleep 5; echo '{"content":{"password":"late"}}' ;;
      *) echo "item $3 not found" >&2; exit 2 ;;
    esac
    ;;
  *) exit 64 ;;
esac
"#;

// ============================================================================
// Test Client
// ============================================================================

/// HTTP client for testing the Coffer API.
pub struct CofferClient {
    client: Client,
    base_url: String,
}

impl CofferClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(10))
                .build()
                .expect("Failed to create HTTP client"),
            base_url: base_url.to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn raw_get(&self, path: &str) -> Result<RawResponse> {
        let resp = self.client.get(self.url(path)).send().await?;
        let status = resp.status();
        let content_type = resp
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(String::from);
        let body = resp.text().await?;
        Ok(RawResponse {
            status,
            content_type,
            body,
        })
    }

    pub async fn secret_get(&self, name: &str) -> Result<SecretResponse> {
        let mut url = Url::parse(&self.base_url)?;
        url.path_segments_mut()
            .map_err(|_| anyhow::anyhow!("Base URL cannot carry a path"))?
            .pop_if_empty()
            .extend(["api", "secrets", name]);

        let resp = self.client.get(url).send().await?;
        if !resp.status().is_success() {
            let error: ErrorResponse = resp.json().await?;
            bail!("Get secret failed: {}", error.error);
        }
        Ok(resp.json().await?)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU16, Ordering};

    // Port counter to avoid conflicts between parallel tests
    static PORT_COUNTER: AtomicU16 = AtomicU16::new(18300);

    fn next_port() -> u16 {
        PORT_COUNTER.fetch_add(1, Ordering::SeqCst)
    }

    #[tokio::test]
    async fn test_known_secret_in_test_mode() {
        let server = TestServer::start(next_port()).await.unwrap();

        let resp = server.client().raw_get("/api/secrets/openrouter-api-key").await.unwrap();

        assert_eq!(resp.status, StatusCode::OK);
        assert_eq!(resp.body, r#"{"value":"test-api-key-12345"}"#);
    }

    #[tokio::test]
    async fn test_unknown_secret_in_test_mode() {
        let server = TestServer::start(next_port()).await.unwrap();

        let resp = server.client().raw_get("/api/secrets/unknown-key").await.unwrap();

        assert_eq!(resp.status, StatusCode::OK);
        assert_eq!(resp.body, r#"{"value":""}"#);
    }

    #[tokio::test]
    async fn test_empty_secret_name() {
        let server = TestServer::start(next_port()).await.unwrap();

        let resp = server.client().raw_get("/api/secrets/").await.unwrap();

        assert_eq!(resp.status, StatusCode::BAD_REQUEST);
        assert_eq!(resp.body, r#"{"error":"Secret name is required"}"#);
    }

    #[tokio::test]
    async fn test_unknown_path() {
        let server = TestServer::start(next_port()).await.unwrap();

        let resp = server.client().raw_get("/nonexistent").await.unwrap();

        assert_eq!(resp.status, StatusCode::NOT_FOUND);
        assert_eq!(resp.body, "Not Found");
    }

    #[tokio::test]
    async fn test_repeated_lookups_are_identical() {
        let server = TestServer::start(next_port()).await.unwrap();
        let client = server.client();

        let first = client.raw_get("/api/secrets/openrouter-api-key").await.unwrap();
        let second = client.raw_get("/api/secrets/openrouter-api-key").await.unwrap();

        assert_eq!(first.status, second.status);
        assert_eq!(first.body, second.body);
    }

    #[tokio::test]
    async fn test_bundle_served() {
        let server = TestServer::start(next_port()).await.unwrap();
        let bundle = b"(() => { window.extensionConfig = { provider: 'openrouter' }; })();\n";
        server.write_bundle(bundle).unwrap();

        let resp = server.client().raw_get("/config.js").await.unwrap();

        assert_eq!(resp.status, StatusCode::OK);
        assert_eq!(resp.content_type.as_deref(), Some("application/javascript"));
        assert_eq!(resp.body.as_bytes(), bundle);
    }

    #[tokio::test]
    async fn test_name_with_slash_is_one_segment() {
        let server = TestServer::start(next_port()).await.unwrap();

        let secret = server.client().secret_get("team/openrouter-api-key").await.unwrap();
        assert_eq!(secret.value, "");

        let secret = server.client().secret_get("openrouter-api-key").await.unwrap();
        assert_eq!(secret.value, "test-api-key-12345");
    }

    #[tokio::test]
    async fn test_invalid_utf8_name_is_json_error() {
        let server = TestServer::start(next_port()).await.unwrap();

        let resp = server.client().raw_get("/api/secrets/%FF").await.unwrap();

        assert_eq!(resp.status, StatusCode::BAD_REQUEST);
        assert_eq!(resp.content_type.as_deref(), Some("application/json"));
        assert_eq!(resp.body, r#"{"error":"Secret name is not valid UTF-8"}"#);
    }

    #[cfg(unix)]
    mod live {
        use super::*;

        async fn start_live(tmp: &TempDir, lookup_timeout_secs: u64) -> TestServer {
            start_live_with(tmp, lookup_timeout_secs, None).await
        }

        async fn start_live_with(
            tmp: &TempDir,
            lookup_timeout_secs: u64,
            not_found_exit_code: Option<i32>,
        ) -> TestServer {
            let program = write_fake_pass_cli(tmp.path(), FAKE_PASS_CLI).unwrap();
            TestServer::start_with(
                next_port(),
                Backend::Script {
                    program: &program,
                    identity: Some("ops@example.com"),
                    lookup_timeout_secs,
                    not_found_exit_code,
                },
            )
            .await
            .unwrap()
        }

        #[tokio::test]
        async fn test_password_lookup() {
            let tmp = TempDir::new().unwrap();
            let server = start_live(&tmp, 10).await;

            let secret = server.client().secret_get("db").await.unwrap();
            assert_eq!(secret.value, "p4ss");
        }

        #[tokio::test]
        async fn test_text_lookup() {
            let tmp = TempDir::new().unwrap();
            let server = start_live(&tmp, 10).await;

            let secret = server.client().secret_get("note").await.unwrap();
            assert_eq!(secret.value, "remember me");
        }

        #[tokio::test]
        async fn test_record_without_fields() {
            let tmp = TempDir::new().unwrap();
            let server = start_live(&tmp, 10).await;

            let resp = server.client().raw_get("/api/secrets/bare").await.unwrap();

            assert_eq!(resp.status, StatusCode::INTERNAL_SERVER_ERROR);
            assert_eq!(resp.body, r#"{"error":"Secret 'bare' not found in Proton Pass"}"#);
        }

        #[tokio::test]
        async fn test_tool_failure_does_not_leak_output() {
            let tmp = TempDir::new().unwrap();
            let server = start_live(&tmp, 10).await;
            let client = server.client();

            let resp = client.raw_get("/api/secrets/missing").await.unwrap();
            assert_eq!(resp.status, StatusCode::INTERNAL_SERVER_ERROR);
            let error: ErrorResponse = serde_json::from_str(&resp.body).unwrap();
            assert_eq!(
                error.error,
                "Failed to read secret 'missing' from Proton Pass: pass-cli exited with status 2"
            );
            assert!(!error.error.contains("item missing not found"));

            let resp = client.raw_get("/api/secrets/garbled").await.unwrap();
            assert_eq!(resp.status, StatusCode::INTERNAL_SERVER_ERROR);
            let error: ErrorResponse = serde_json::from_str(&resp.body).unwrap();
            assert!(!error.error.contains("not json"));

            // The server keeps serving after per-request failures.
            let secret = client.secret_get("db").await.unwrap();
            assert_eq!(secret.value, "p4ss");
        }

        #[tokio::test]
        async fn test_configured_not_found_code_is_missing_secret() {
            let tmp = TempDir::new().unwrap();
            let server = start_live_with(&tmp, 10, Some(2)).await;
            let client = server.client();

            let resp = client.raw_get("/api/secrets/missing").await.unwrap();
            assert_eq!(resp.status, StatusCode::INTERNAL_SERVER_ERROR);
            assert_eq!(resp.body, r#"{"error":"Secret 'missing' not found in Proton Pass"}"#);

            // Other failures are still reported as tool errors.
            let resp = client.raw_get("/api/secrets/garbled").await.unwrap();
            let error: ErrorResponse = serde_json::from_str(&resp.body).unwrap();
            assert!(error.error.starts_with("Failed to read secret 'garbled'"), "{}", error.error);
        }

        #[tokio::test]
        async fn test_lookup_timeout() {
            let tmp = TempDir::new().unwrap();
            let server = start_live(&tmp, 1).await;

            let resp = server.client().raw_get("/api/secrets/slow").await.unwrap();

            assert_eq!(resp.status, StatusCode::INTERNAL_SERVER_ERROR);
            let error: ErrorResponse = serde_json::from_str(&resp.body).unwrap();
            assert!(error.error.contains("timed out"), "{}", error.error);
        }

        #[tokio::test]
        async fn test_failed_login_is_fatal() {
            let tmp = TempDir::new().unwrap();
            let program = write_fake_pass_cli(tmp.path(), FAKE_PASS_CLI).unwrap();
            let port = next_port();

            let status = start_expecting_exit(
                port,
                Backend::Script {
                    program: &program,
                    identity: Some("intruder@example.com"),
                    lookup_timeout_secs: 10,
                    not_found_exit_code: None,
                },
            )
            .await
            .unwrap();

            assert!(!status.success());
            let connect = CofferClient::new(&format!("http://127.0.0.1:{}", port))
                .raw_get("/api/secrets/db")
                .await;
            assert!(connect.is_err(), "nothing should be listening");
        }

        #[tokio::test]
        async fn test_missing_identity_is_fatal() {
            let tmp = TempDir::new().unwrap();
            let program = write_fake_pass_cli(tmp.path(), FAKE_PASS_CLI).unwrap();

            let status = start_expecting_exit(
                next_port(),
                Backend::Script {
                    program: &program,
                    identity: None,
                    lookup_timeout_secs: 10,
                    not_found_exit_code: None,
                },
            )
            .await
            .unwrap();

            assert!(!status.success());
        }
    }
}
