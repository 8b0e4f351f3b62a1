//! Command-line and environment configuration.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use coffer_gateway::RunMode;

#[derive(Debug, Parser)]
#[command(name = "coffer-server")]
#[command(about = "Coffer - local secret broker and configuration bundle server")]
#[command(version)]
pub struct Cli {
    /// Bind host (keep on loopback; requests are not authenticated)
    #[arg(long, default_value = "127.0.0.1", env = "COFFER_HOST")]
    pub host: String,

    /// Bind port
    #[arg(long, default_value_t = 3000, env = "COFFER_PORT")]
    pub port: u16,

    /// Identity used to log into Proton Pass
    #[arg(long, env = "COFFER_IDENTITY")]
    pub identity: Option<String>,

    /// Enable test mode (no login, fixed secret fixtures)
    #[arg(long, env = "COFFER_TEST_MODE")]
    pub test_mode: bool,

    /// Path of the prebuilt configuration bundle
    #[arg(long, default_value = "dist/config.js", env = "COFFER_BUNDLE_PATH")]
    pub bundle: PathBuf,

    /// Proton Pass CLI executable
    #[arg(long, default_value = "pass-cli", env = "COFFER_PASS_CLI")]
    pub pass_cli: PathBuf,

    /// Exit code the Proton Pass CLI uses for a missing item
    #[arg(long, env = "COFFER_PASS_CLI_NOT_FOUND_CODE")]
    pub pass_cli_not_found_code: Option<i32>,

    /// Seconds before a credential tool invocation is killed
    #[arg(long, default_value_t = 10, env = "COFFER_LOOKUP_TIMEOUT_SECS")]
    pub lookup_timeout_secs: u64,
}

impl Cli {
    /// Resolves host and port into a socket address.
    pub fn bind_addr(&self) -> Result<SocketAddr> {
        let ip = self
            .host
            .parse()
            .with_context(|| format!("Invalid bind host: {}", self.host))?;
        Ok(SocketAddr::new(ip, self.port))
    }

    pub fn run_mode(&self) -> RunMode {
        RunMode::from_test_flag(self.test_mode)
    }

    pub fn lookup_timeout(&self) -> Duration {
        Duration::from_secs(self.lookup_timeout_secs)
    }
}
