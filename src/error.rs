//! Error taxonomy for the orchestration pipeline.
//!
//! Every stage fails fast: the first error aborts the run. `main` maps the
//! variant to a process exit code, reserving 2 for an external command that
//! exited nonzero so callers can tell a build/migration failure apart from a
//! precondition failure.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum OrchestrationError {
    /// A required tool is absent after probing (and, where applicable, one
    /// install attempt).
    #[error("required tool `{0}` not found on PATH")]
    MissingTool(String),

    /// A spawned external command exited nonzero or could not be spawned.
    #[error("command `{command}` failed{}", failure_detail(.code, .spawn_error))]
    CommandFailed {
        command: String,
        code: Option<i32>,
        /// Why the spawn itself failed (e.g. not found vs. permission
        /// denied), when the command never ran at all.
        spawn_error: Option<String>,
    },

    /// Expected build output was not found at staging time.
    #[error("artifact missing at {} (was the build run?)", path.display())]
    ArtifactMissing { path: PathBuf },

    /// Host OS is not in the supported set.
    #[error("unsupported host platform `{0}`")]
    UnsupportedPlatform(String),

    /// Auto-install of an auxiliary dependency failed.
    #[error("failed to install {what}: {reason}")]
    InstallFailed { what: String, reason: String },

    /// Filesystem fault while staging.
    #[error("i/o error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl OrchestrationError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn command_exited(command: impl Into<String>, code: Option<i32>) -> Self {
        Self::CommandFailed {
            command: command.into(),
            code,
            spawn_error: None,
        }
    }

    pub fn spawn_failed(command: impl Into<String>, source: &std::io::Error) -> Self {
        Self::CommandFailed {
            command: command.into(),
            code: None,
            spawn_error: Some(source.to_string()),
        }
    }

    /// Process exit code for this failure. External command failures exit
    /// with 2; everything else with 1.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::CommandFailed { .. } => 2,
            _ => 1,
        }
    }
}

fn failure_detail(code: &Option<i32>, spawn_error: &Option<String>) -> String {
    match (code, spawn_error) {
        (Some(code), _) => format!(" with exit code {}", code),
        (None, Some(reason)) => format!(" to spawn: {}", reason),
        (None, None) => " before exiting".to_string(),
    }
}

pub type Result<T> = std::result::Result<T, OrchestrationError>;
