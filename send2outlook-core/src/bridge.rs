//! Bridge to the external mail client.
//!
//! [`MailBridge::dispatch`] builds the compose script, hands it to the
//! scripting runner on a background task and returns immediately. Runner
//! failures are reported through the [`Notifier`] and never returned to the
//! caller; only a missing async runtime is.

use std::process::Stdio;
use std::sync::Arc;

use async_trait::async_trait;
use log::{debug, info, warn};
use serde::Serialize;
use tokio::task::JoinHandle;

use crate::config::MailClientConfig;
use crate::error::{Error, Result};
use crate::script::{ComposedMessage, shell_command_line};
use crate::settings::Settings;

/// Runs a single-line shell command and returns its standard output.
#[async_trait]
pub trait ScriptRunner: Send + Sync {
    async fn run(&self, command_line: &str) -> Result<String>;
}

/// Runs commands through `<shell> -c`.
#[derive(Debug, Clone)]
pub struct ShellRunner {
    shell: String,
}

impl ShellRunner {
    pub fn new(shell: impl Into<String>) -> Self {
        Self {
            shell: shell.into(),
        }
    }
}

#[async_trait]
impl ScriptRunner for ShellRunner {
    async fn run(&self, command_line: &str) -> Result<String> {
        let output = tokio::process::Command::new(&self.shell)
            .arg("-c")
            .arg(command_line)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| Error::Dispatch(format!("failed to spawn {}: {e}", self.shell)))?;

        if output.status.success() {
            return Ok(String::from_utf8_lossy(&output.stdout).trim().to_string());
        }

        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        if stderr.is_empty() {
            Err(Error::Dispatch(format!("command failed ({})", output.status)))
        } else {
            Err(Error::Dispatch(format!(
                "command failed ({}): {stderr}",
                output.status
            )))
        }
    }
}

/// Shows a short-lived message to the user.
pub trait Notifier: Send + Sync {
    fn notify(&self, message: &str);
}

/// How a dispatched compose request ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum DispatchOutcome {
    /// The runner exited cleanly; the compose window should be open.
    Opened { stdout: String },
    /// The runner could not be started or reported an error.
    Failed { error: String },
}

impl DispatchOutcome {
    pub fn is_failed(&self) -> bool {
        matches!(self, DispatchOutcome::Failed { .. })
    }
}

/// Handle to a dispatch running in the background.
pub type DispatchHandle = JoinHandle<DispatchOutcome>;

/// Everything needed to open one compose window.
#[derive(Debug, Clone, Serialize)]
pub struct PreparedDispatch {
    pub message: ComposedMessage,
    pub script: String,
    pub command_line: String,
}

/// Drives the mail client's scripting interface.
#[derive(Clone)]
pub struct MailBridge {
    application: String,
    runner_program: String,
    runner: Arc<dyn ScriptRunner>,
    notifier: Arc<dyn Notifier>,
}

impl MailBridge {
    pub fn new(
        config: &MailClientConfig,
        runner: Arc<dyn ScriptRunner>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            application: config.application.clone(),
            runner_program: config.runner.clone(),
            runner,
            notifier,
        }
    }

    /// Build the message, script and command line without running anything.
    pub fn prepare(&self, subject: &str, html_body: &str, settings: &Settings) -> PreparedDispatch {
        let message = ComposedMessage::new(subject, html_body, settings);
        let script = message.to_script(&self.application);
        let command_line = shell_command_line(&self.runner_program, &script);
        PreparedDispatch {
            message,
            script,
            command_line,
        }
    }

    /// Start opening a pre-filled compose window.
    ///
    /// Fails without spawning anything when called outside a tokio runtime.
    /// The returned handle may be dropped; the runner keeps going either way.
    pub fn dispatch(
        &self,
        subject: &str,
        html_body: &str,
        settings: &Settings,
    ) -> Result<DispatchHandle> {
        let runtime = tokio::runtime::Handle::try_current().map_err(|e| {
            Error::Dispatch(format!("cannot run {}: {e}", self.runner_program))
        })?;
        let prepared = self.prepare(subject, html_body, settings);
        info!(
            "opening \"{}\" in {} ({} to, {} cc)",
            prepared.message.subject,
            self.application,
            prepared.message.recipients.len(),
            prepared.message.cc_recipients.len()
        );
        debug!("script:\n{}", prepared.script);

        let runner = Arc::clone(&self.runner);
        let notifier = Arc::clone(&self.notifier);
        Ok(runtime.spawn(async move {
            match runner.run(&prepared.command_line).await {
                Ok(stdout) => {
                    debug!("runner output: {stdout}");
                    DispatchOutcome::Opened { stdout }
                }
                Err(e) => {
                    warn!("mail client dispatch failed: {e}");
                    notifier.notify(&format!("Error: {e}"));
                    DispatchOutcome::Failed {
                        error: e.to_string(),
                    }
                }
            }
        }))
    }
}

impl std::fmt::Debug for MailBridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MailBridge")
            .field("application", &self.application)
            .field("runner_program", &self.runner_program)
            .finish_non_exhaustive()
    }
}
