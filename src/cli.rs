//! Command execution for CLI-based backends.
//!
//! Every backend invocation goes through [`run_command`], which enforces a
//! hard time limit and kills the child process when the limit elapses.

use crate::{BrokerError, Result};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

/// Executes a command and returns stdout as a string.
///
/// # Arguments
///
/// - `program`: Command to execute (e.g., "op")
/// - `args`: Command arguments, passed directly without a shell
/// - `timeout`: Upper bound on the command's run time
///
/// # Errors
///
/// - [`BrokerError::BackendNotInstalled`] if the program cannot be found
/// - [`BrokerError::Timeout`] if the limit elapses; the child is killed
/// - [`BrokerError::CommandFailed`] if the exit code is non-zero, carrying stderr
/// - [`BrokerError::Other`] if stdout is not valid UTF-8
pub async fn run_command(program: &str, args: &[&str], timeout: Duration) -> Result<String> {
    let mut cmd = Command::new(program);
    cmd.args(args);
    cmd.stdin(Stdio::null());
    cmd.stdout(Stdio::piped());
    cmd.stderr(Stdio::piped());
    cmd.kill_on_drop(true);

    let child = cmd.spawn().map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            BrokerError::BackendNotInstalled(format!("{} command not found", program))
        } else {
            BrokerError::Io(e)
        }
    })?;

    // Dropping the pending future on timeout drops the child, which kills it.
    let output = match tokio::time::timeout(timeout, child.wait_with_output()).await {
        Ok(output) => output?,
        Err(_) => {
            return Err(BrokerError::Timeout {
                program: program.to_string(),
                timeout,
            })
        }
    };

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(BrokerError::CommandFailed(format!(
            "{} failed with exit code {}: {}",
            program,
            output.status.code().unwrap_or(-1),
            stderr.trim()
        )));
    }

    String::from_utf8(output.stdout).map_err(|e| {
        BrokerError::Other(anyhow::anyhow!("Invalid UTF-8 in command output: {}", e))
    })
}
