//! Coffer CLI - Command line interface.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use reqwest::{header, Client, Response, Url};
use serde::Deserialize;

/// Same budget the extension's bundle gives each secret request.
const SECRET_TIMEOUT: Duration = Duration::from_secs(5);

const BUNDLE_TIMEOUT: Duration = Duration::from_secs(30);

// ============================================================================
// CLI Structure
// ============================================================================

#[derive(Parser)]
#[command(name = "coffer")]
#[command(about = "Coffer CLI - Fetch secrets and the configuration bundle from a running broker")]
#[command(version)]
struct Cli {
    /// Coffer server address
    #[arg(long, default_value = "http://127.0.0.1:3000", env = "COFFER_ADDR")]
    addr: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Secret lookups
    Secret {
        #[command(subcommand)]
        command: SecretCommands,
    },
    /// Download the configuration bundle
    Bundle {
        /// Write to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum SecretCommands {
    /// Get a secret value
    Get {
        /// Secret name
        name: String,
    },
}

// ============================================================================
// API Types
// ============================================================================

#[derive(Debug, Deserialize)]
struct SecretResponse {
    value: String,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: String,
}

// ============================================================================
// HTTP Client
// ============================================================================

struct CofferClient {
    client: Client,
    base_url: String,
}

impl CofferClient {
    fn new(base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(BUNDLE_TIMEOUT)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Builds `/api/secrets/{name}` with `name` encoded as a single segment.
    fn secret_url(&self, name: &str) -> Result<Url> {
        let mut url = Url::parse(&self.base_url)
            .with_context(|| format!("Invalid server address: {}", self.base_url))?;
        url.path_segments_mut()
            .map_err(|_| anyhow::anyhow!("Server address cannot carry a path: {}", self.base_url))?
            .pop_if_empty()
            .extend(["api", "secrets", name]);
        Ok(url)
    }

    async fn secret_get(&self, name: &str) -> Result<String> {
        let resp = self
            .client
            .get(self.secret_url(name)?)
            .timeout(SECRET_TIMEOUT)
            .send()
            .await
            .context("Failed to connect to server")?;

        let resp = error_for_status(resp, "Get secret failed").await?;
        let secret: SecretResponse = resp.json().await.context("Failed to parse response")?;
        Ok(secret.value)
    }

    async fn bundle(&self) -> Result<Vec<u8>> {
        let resp = self
            .client
            .get(self.url("/config.js"))
            .send()
            .await
            .context("Failed to connect to server")?;

        let resp = error_for_status(resp, "Bundle download failed").await?;

        let content_type = resp
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        if !content_type.starts_with("application/javascript") {
            bail!("Unexpected bundle content type: {:?}", content_type);
        }

        Ok(resp.bytes().await.context("Failed to read bundle")?.to_vec())
    }
}

/// Turns a non-success response into an error carrying the server's message.
async fn error_for_status(resp: Response, action: &str) -> Result<Response> {
    if resp.status().is_success() {
        return Ok(resp);
    }

    let status = resp.status();
    let error: ErrorResponse = resp.json().await.unwrap_or(ErrorResponse {
        error: status.canonical_reason().unwrap_or("Unknown error").into(),
    });
    bail!("{} ({}): {}", action, status.as_u16(), error.error)
}

// ============================================================================
// Command Handlers
// ============================================================================

async fn cmd_secret_get(client: &CofferClient, name: &str) -> Result<()> {
    if name.is_empty() {
        bail!("Secret name cannot be empty");
    }

    let value = client.secret_get(name).await?;
    println!("{}", value);
    Ok(())
}

async fn cmd_bundle(client: &CofferClient, output: Option<&Path>) -> Result<()> {
    let bytes = client.bundle().await?;

    match output {
        Some(path) => {
            tokio::fs::write(path, &bytes)
                .await
                .with_context(|| format!("Failed to write {}", path.display()))?;
            eprintln!("Wrote {} bytes to {}", bytes.len(), path.display());
        },
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(&bytes)?;
            stdout.flush()?;
        },
    }

    Ok(())
}

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let client = CofferClient::new(&cli.addr)?;

    match cli.command {
        Commands::Secret { command } => match command {
            SecretCommands::Get { name } => cmd_secret_get(&client, &name).await,
        },
        Commands::Bundle { output } => cmd_bundle(&client, output.as_deref()).await,
    }
}
