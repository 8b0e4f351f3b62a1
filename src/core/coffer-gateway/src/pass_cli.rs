//! Proton Pass CLI backend.
//!
//! Every call spawns the `pass-cli` binary once. Nothing is cached, so
//! repeated lookups always see the current state of the vault.
//!
//! ## Lookup outcomes
//!
//! - exit 0 with a JSON record: the record
//! - exit 0 with JSON `null`: no record
//! - exit with the configured not-found code: no record
//! - any other non-zero exit: [`BackendError::ExitStatus`]

use std::path::PathBuf;
use std::process::{Output, Stdio};
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::{BackendError, CredentialBackend, CredentialRecord, SecretName};

/// Default program name looked up on `PATH`.
pub const DEFAULT_PROGRAM: &str = "pass-cli";

/// Default bound on a single invocation.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Credential backend driving the Proton Pass command-line tool.
#[derive(Debug, Clone)]
pub struct PassCli {
    program: PathBuf,
    timeout: Duration,
    not_found_exit_code: Option<i32>,
}

impl Default for PassCli {
    fn default() -> Self {
        Self::new(DEFAULT_PROGRAM, DEFAULT_TIMEOUT)
    }
}

impl PassCli {
    /// Creates a backend invoking `program`, killing it after `timeout`.
    pub fn new(program: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            timeout,
            not_found_exit_code: None,
        }
    }

    /// Treats a lookup exiting with `code` as a missing record rather than
    /// a tool failure.
    pub fn with_not_found_exit_code(mut self, code: Option<i32>) -> Self {
        self.not_found_exit_code = code;
        self
    }

    fn is_not_found(&self, code: Option<i32>) -> bool {
        code.is_some() && code == self.not_found_exit_code
    }

    /// Returns the configured program.
    pub fn program(&self) -> &std::path::Path {
        &self.program
    }

    /// Logs into the credential store as `identity`.
    pub async fn login(&self, identity: &str) -> Result<(), BackendError> {
        self.run(&["login", identity]).await.map(|_| ())
    }

    /// Short program name for messages; never the full path.
    fn program_name(&self) -> String {
        self.program
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.program.display().to_string())
    }

    /// Runs the tool with `args`, failing on spawn errors, timeouts and
    /// non-zero exits.
    async fn run(&self, args: &[&str]) -> Result<Output, BackendError> {
        let program = self.program_name();
        debug!(program = %program, subcommand = args.first().copied().unwrap_or(""), "Invoking credential tool");

        let child = Command::new(&self.program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output();

        let output = match tokio::time::timeout(self.timeout, child).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                return Err(BackendError::Spawn {
                    program,
                    reason: e.to_string(),
                })
            },
            Err(_) => {
                return Err(BackendError::Timeout {
                    program,
                    timeout: self.timeout,
                })
            },
        };

        if !output.status.success() {
            // stderr carries diagnostics only; stdout may hold secret material.
            warn!(
                program = %program,
                code = ?output.status.code(),
                stderr = %String::from_utf8_lossy(&output.stderr).trim(),
                "Credential tool failed"
            );
            return Err(BackendError::ExitStatus {
                program,
                code: output.status.code(),
            });
        }

        Ok(output)
    }
}

/// Parses the tool's JSON output. A literal `null` means "no record".
pub(crate) fn parse_record(
    program: &str,
    stdout: &[u8],
) -> Result<Option<CredentialRecord>, BackendError> {
    serde_json::from_slice(stdout).map_err(|_| BackendError::MalformedOutput {
        program: program.to_string(),
    })
}

#[async_trait]
impl CredentialBackend for PassCli {
    async fn lookup(&self, name: &SecretName) -> Result<Option<CredentialRecord>, BackendError> {
        match self
            .run(&["item", "view", name.as_str(), "--output", "json"])
            .await
        {
            Ok(output) => parse_record(&self.program_name(), &output.stdout),
            Err(BackendError::ExitStatus { code, .. }) if self.is_not_found(code) => {
                debug!(secret = %name, "Credential tool reported no such item");
                Ok(None)
            },
            Err(e) => Err(e),
        }
    }

    fn name(&self) -> &'static str {
        "proton-pass-cli"
    }
}
