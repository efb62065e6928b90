//! Typed external command execution.
//!
//! Every subprocess the pipeline issues goes through here, so failure is
//! always an explicit [`OrchestrationError::CommandFailed`] carrying the
//! command line and exit code, never a truthiness check on captured output.
//! On Windows the platform profile requests `cmd /C` wrapping; elsewhere
//! commands are spawned directly.

use std::path::Path;
use std::process::Stdio;

use tokio::process::Command;
use tracing::{debug, info};

use crate::error::{OrchestrationError, Result};
use crate::platform::PlatformProfile;

/// Builds a command, applying the profile's shell wrapping when required.
pub fn command(profile: &PlatformProfile, program: &str, args: &[&str]) -> Command {
    if profile.shell_wrap {
        let mut cmd = Command::new("cmd");
        cmd.arg("/C").arg(program).args(args);
        cmd
    } else {
        let mut cmd = Command::new(program);
        cmd.args(args);
        cmd
    }
}

/// Renders the command line for diagnostics.
pub fn render(program: &str, args: &[&str]) -> String {
    let mut line = program.to_string();
    for arg in args {
        line.push(' ');
        line.push_str(arg);
    }
    line
}

/// Runs a command with inherited stdio, blocking until it exits.
/// Nonzero exit or a spawn failure is a [`OrchestrationError::CommandFailed`].
pub async fn run(profile: &PlatformProfile, program: &str, args: &[&str]) -> Result<()> {
    let line = render(program, args);
    info!(command = %line, "running");

    let status = command(profile, program, args)
        .status()
        .await
        .map_err(|err| OrchestrationError::spawn_failed(line.clone(), &err))?;

    if status.success() {
        Ok(())
    } else {
        Err(OrchestrationError::command_exited(line, status.code()))
    }
}

/// Runs a command from the given working directory.
pub async fn run_in(
    profile: &PlatformProfile,
    cwd: &Path,
    program: &str,
    args: &[&str],
) -> Result<()> {
    let line = render(program, args);
    info!(command = %line, cwd = %cwd.display(), "running");

    let status = command(profile, program, args)
        .current_dir(cwd)
        .status()
        .await
        .map_err(|err| OrchestrationError::spawn_failed(line.clone(), &err))?;

    if status.success() {
        Ok(())
    } else {
        Err(OrchestrationError::command_exited(line, status.code()))
    }
}

/// Runs a command and captures its stdout, whitespace-trimmed.
pub async fn capture(
    profile: &PlatformProfile,
    program: &str,
    args: &[&str],
) -> Result<String> {
    let line = render(program, args);
    debug!(command = %line, "capturing");

    let output = command(profile, program, args)
        .stdin(Stdio::null())
        .stderr(Stdio::null())
        .output()
        .await
        .map_err(|err| OrchestrationError::spawn_failed(line.clone(), &err))?;

    if output.status.success() {
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    } else {
        Err(OrchestrationError::command_exited(line, output.status.code()))
    }
}
