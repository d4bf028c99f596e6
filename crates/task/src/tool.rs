//! External tool invocations

use crate::execution::Execution;
use crate::task::Action;
use async_trait::async_trait;
use modsmith_core::{Error, Result};
use std::fmt::Display;
use std::sync::Arc;
use tracing::debug;

/// A named tool plus its argument list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolInvocation {
    name: String,
    args: Vec<String>,
}

impl ToolInvocation {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            args: Vec::new(),
        }
    }

    #[must_use]
    pub fn arg(mut self, arg: impl Display) -> Self {
        self.args.push(arg.to_string());
        self
    }

    #[must_use]
    pub fn args<I>(mut self, args: I) -> Self
    where
        I: IntoIterator,
        I::Item: Display,
    {
        self.args.extend(args.into_iter().map(|arg| arg.to_string()));
        self
    }

    #[must_use]
    pub fn arg_if(self, condition: bool, arg: impl Display) -> Self {
        if condition {
            self.arg(arg)
        } else {
            self
        }
    }

    /// Append an option and its value
    #[must_use]
    pub fn arg_pair(self, key: impl Display, value: impl Display) -> Self {
        self.arg(key).arg(value)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn arguments(&self) -> &[String] {
        &self.args
    }

    /// `Run <tool>` followed by at most two arguments
    pub fn display_name(&self) -> String {
        match self.args.as_slice() {
            [] => format!("Run {}", self.name),
            [a] => format!("Run {} {a}", self.name),
            [a, b] => format!("Run {} {a} {b}", self.name),
            [a, b, ..] => format!(
                "Run {} {a} {b} ... ({} arguments)",
                self.name,
                self.args.len()
            ),
        }
    }
}

/// Captured result of one tool run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolOutput {
    pub code: i32,
    pub stdout: String,
    pub stderr: String,
}

/// Runs tool invocations.
///
/// Production code spawns processes; tests plug in scripted runners.
#[async_trait]
pub trait ToolRunner: Send + Sync {
    async fn run(&self, invocation: &ToolInvocation) -> Result<ToolOutput>;
}

/// Spawns the tool as a child process
#[derive(Debug, Clone, Default)]
pub struct SystemToolRunner;

#[async_trait]
impl ToolRunner for SystemToolRunner {
    async fn run(&self, invocation: &ToolInvocation) -> Result<ToolOutput> {
        debug!(tool = %invocation.name(), args = ?invocation.arguments(), "spawning tool");
        let output = tokio::process::Command::new(invocation.name())
            .args(invocation.arguments())
            .stdin(std::process::Stdio::null())
            .output()
            .await
            .map_err(|e| {
                Error::command_execution(
                    invocation.name(),
                    invocation.arguments().to_vec(),
                    format!("failed to execute command: {e}"),
                    None,
                )
            })?;

        Ok(ToolOutput {
            // Terminated by a signal
            code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

/// Action running a single tool invocation, failing on a non-zero exit code
pub struct RunTool {
    invocation: ToolInvocation,
    runner: Arc<dyn ToolRunner>,
}

impl RunTool {
    pub fn new(invocation: ToolInvocation, runner: Arc<dyn ToolRunner>) -> Self {
        Self { invocation, runner }
    }
}

#[async_trait]
impl Action for RunTool {
    async fn execute(&self, execution: &mut Execution) -> Result<()> {
        let output = self.runner.run(&self.invocation).await?;
        execution.write_out(&output.stdout);
        execution.write_err(&output.stderr);

        if output.code != 0 {
            let stderr = output.stderr.trim();
            let message = if stderr.is_empty() {
                format!("run of {} failed", self.invocation.name())
            } else {
                stderr.to_string()
            };
            return Err(Error::command_execution(
                self.invocation.name(),
                self.invocation.arguments().to_vec(),
                message,
                Some(output.code),
            ));
        }
        Ok(())
    }
}
