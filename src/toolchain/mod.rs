//! Host toolchain discovery.
//!
//! Each required executable is located with the platform's lookup command
//! (`which` or `where`). Absence is data: [`locate`] returns `None`, and only
//! the pipeline decides whether a missing tool is fatal or triggers an
//! install attempt.

use std::path::PathBuf;

use tracing::{debug, info};

use crate::exec;
use crate::platform::PlatformProfile;

pub const BUILD_TOOL: &str = "cargo";
pub const MIGRATION_CLI: &str = "sqlx";
pub const DB_CLIENT: &str = "psql";
pub const CACHE_SERVER: &str = "redis-server";
pub const OBJECT_STORE: &str = "minio";

/// Probe result for a single tool.
#[derive(Debug, Clone)]
pub struct ToolPath {
    pub name: String,
    pub path: Option<PathBuf>,
}

/// Locates `tool` on PATH via the profile's lookup command.
///
/// Returns the resolved path verbatim apart from whitespace trimming, or
/// `None` when the lookup command exits nonzero or prints nothing. `where`
/// may report several matches; the first line wins.
pub async fn locate(tool: &str, profile: &PlatformProfile) -> Option<PathBuf> {
    let stdout = exec::capture(profile, profile.lookup_command, &[tool])
        .await
        .ok()?;

    let first = stdout.lines().next().map(str::trim).unwrap_or("");
    if first.is_empty() {
        debug!(tool, "not found on PATH");
        None
    } else {
        debug!(tool, path = first, "found on PATH");
        Some(PathBuf::from(first))
    }
}

/// Probes a tool and logs the outcome the way the rest of the pipeline
/// reports stage results.
pub async fn probe(tool: &str, profile: &PlatformProfile) -> ToolPath {
    let path = locate(tool, profile).await;
    match &path {
        Some(path) => info!(tool, path = %path.display(), "probe"),
        None => info!(tool, "probe: not found"),
    }
    ToolPath {
        name: tool.to_string(),
        path,
    }
}

/// Fully resolved toolchain, produced by the pipeline once every required
/// tool has been found (or installed and re-probed).
#[derive(Debug, Clone)]
pub struct Toolchain {
    pub cargo: PathBuf,
    pub sqlx: PathBuf,
    pub psql: PathBuf,
    pub redis_server: PathBuf,
    pub minio: PathBuf,
}
