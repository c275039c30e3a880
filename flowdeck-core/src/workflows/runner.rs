use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, warn};

use super::types::{CommandRunner, LaunchRequest};
use crate::error::{Error, Result};

pub const TITLE_ENV: &str = "FLOWDECK_TITLE";

/// Runs launch requests through the platform shell with the caller's
/// terminal attached.
#[derive(Debug, Clone)]
pub struct ShellRunner {
    wait_for_exit: bool,
}

impl ShellRunner {
    pub fn new(wait_for_exit: bool) -> Self {
        Self { wait_for_exit }
    }
}

#[async_trait]
impl CommandRunner for ShellRunner {
    async fn run(&self, request: LaunchRequest) -> Result<()> {
        let shell = if cfg!(windows) { "cmd.exe" } else { "/bin/sh" };
        let shell_flag = if cfg!(windows) { "/C" } else { "-c" };

        let mut cmd = Command::new(shell);
        cmd.arg(shell_flag)
            .arg(&request.command)
            .current_dir(&request.working_dir)
            .env(TITLE_ENV, &request.title)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());

        let mut child = cmd.spawn().map_err(|err| {
            Error::Launch(format!("failed to start '{}': {err}", request.title))
        })?;

        if self.wait_for_exit {
            match child.wait().await {
                Ok(status) => {
                    debug!(title = %request.title, exit_code = ?status.code(), "workflow exited")
                }
                Err(err) => warn!(title = %request.title, "failed waiting for workflow: {err}"),
            }
        } else {
            let title = request.title;
            tokio::spawn(async move {
                if let Ok(status) = child.wait().await {
                    debug!(title = %title, exit_code = ?status.code(), "workflow exited");
                }
            });
        }

        Ok(())
    }
}
