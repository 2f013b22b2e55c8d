//! Execution bridge: hands a script and its variables to an external runner.
//!
//! The runner itself (browser driving, MCP wiring) is opaque; this module
//! only spawns it and reports a structured outcome. Failures are values,
//! never errors.

use crate::extract::Variables;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, instrument, warn};

/// Default wall-clock limit for one execution (5 minutes)
pub const DEFAULT_EXECUTION_TIMEOUT: Duration = Duration::from_secs(300);

/// Why an execution failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionErrorKind {
    /// Runner exceeded its time limit
    Timeout,
    /// Runner could not be started
    Spawn,
    /// Runner exited unsuccessfully
    ExitStatus,
}

/// Result of one execution
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionOutcome {
    /// Whether the runner exited successfully
    pub success: bool,
    /// Captured standard output
    pub output: String,
    /// Captured standard error or failure description
    pub error: String,
    /// Script that was executed
    pub script: String,
    /// Failure category, absent on success
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ExecutionErrorKind>,
    /// Process exit code when one was observed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i32>,
}

impl ExecutionOutcome {
    /// Failed outcome without process output
    pub fn failed(script: impl Into<String>, kind: ExecutionErrorKind, error: impl Into<String>) -> Self {
        Self {
            success: false,
            output: String::new(),
            error: error.into(),
            script: script.into(),
            error_kind: Some(kind),
            exit_code: None,
        }
    }
}

/// Runs an automation script with variables
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ExecutionBridge: Send + Sync {
    /// Execute `script_path` with `variables`; never fails, see [`ExecutionOutcome`]
    async fn execute(&self, script_path: &str, variables: &Variables) -> ExecutionOutcome;
}

/// Command line used by [`CommandBridge`]
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    /// Runner executable
    pub program: String,
    /// Arguments placed before the script path
    pub args: Vec<String>,
    /// Wall-clock limit per execution
    pub timeout: Duration,
    /// Working directory for the runner
    pub working_dir: Option<PathBuf>,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            program: "node".to_string(),
            args: vec!["mdc_executor.js".to_string()],
            timeout: DEFAULT_EXECUTION_TIMEOUT,
            working_dir: None,
        }
    }
}

/// Spawns `<program> <args...> <script> [--context <json>]`
#[derive(Debug, Clone, Default)]
pub struct CommandBridge {
    config: BridgeConfig,
}

impl CommandBridge {
    /// Create a bridge
    pub fn new(config: BridgeConfig) -> Self {
        Self { config }
    }

    /// Bridge configuration
    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    /// Full argument list for one execution
    pub fn command_args(&self, script_path: &str, variables: &Variables) -> Vec<String> {
        let mut args = self.config.args.clone();
        args.push(script_path.to_string());
        if !variables.is_empty() {
            // BTreeMap serialization cannot fail
            let context = serde_json::to_string(variables).unwrap_or_default();
            args.push("--context".to_string());
            args.push(context);
        }
        args
    }
}

#[async_trait]
impl ExecutionBridge for CommandBridge {
    #[instrument(skip(self, variables), fields(program = %self.config.program))]
    async fn execute(&self, script_path: &str, variables: &Variables) -> ExecutionOutcome {
        let mut cmd = Command::new(&self.config.program);
        cmd.args(self.command_args(script_path, variables))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = &self.config.working_dir {
            cmd.current_dir(dir);
        }

        let child = match cmd.spawn() {
            Ok(child) => child,
            Err(e) => {
                warn!(error = %e, "Failed to start runner");
                return ExecutionOutcome::failed(script_path, ExecutionErrorKind::Spawn, e.to_string());
            }
        };

        let secs = self.config.timeout.as_secs();
        let output = match tokio::time::timeout(self.config.timeout, child.wait_with_output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                return ExecutionOutcome::failed(script_path, ExecutionErrorKind::Spawn, e.to_string());
            }
            Err(_) => {
                warn!(timeout_secs = secs, "Execution timed out");
                return ExecutionOutcome::failed(
                    script_path,
                    ExecutionErrorKind::Timeout,
                    format!("Execution timeout ({secs}s)"),
                );
            }
        };

        let success = output.status.success();
        debug!(success, code = ?output.status.code(), "Runner finished");

        ExecutionOutcome {
            success,
            output: String::from_utf8_lossy(&output.stdout).to_string(),
            error: String::from_utf8_lossy(&output.stderr).to_string(),
            script: script_path.to_string(),
            error_kind: (!success).then_some(ExecutionErrorKind::ExitStatus),
            exit_code: output.status.code(),
        }
    }
}
