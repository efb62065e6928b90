//! Migration and compile steps.
//!
//! Both issue exactly one external command and treat any nonzero exit as
//! fatal for the whole run. [`BuildConfig`] is the single selector of the
//! `debug`/`release` output subtree; the stager reads the same value, so the
//! compile mode and the staged artifacts can never disagree.

use std::path::Path;

use crate::error::Result;
use crate::exec;
use crate::platform::PlatformProfile;

/// Immutable build mode, created once from the parsed CLI flags.
#[derive(Debug, Clone, Copy)]
pub struct BuildConfig {
    pub is_debug: bool,
}

impl BuildConfig {
    /// Name of the cargo output subtree this mode compiles into.
    pub fn target_subtree(&self) -> &'static str {
        if self.is_debug {
            "debug"
        } else {
            "release"
        }
    }
}

/// Arguments passed to the build tool for the selected mode.
pub fn compile_args(config: BuildConfig) -> &'static [&'static str] {
    if config.is_debug {
        &["build", "-q"]
    } else {
        &["build", "-q", "--release"]
    }
}

/// Runs `sqlx migrate run` from the repository root, where the migration
/// definitions live.
pub async fn run_migrations(profile: &PlatformProfile, sqlx: &Path, repo_root: &Path) -> Result<()> {
    let sqlx = sqlx.to_string_lossy();
    exec::run_in(profile, repo_root, &sqlx, &["migrate", "run"]).await
}

/// Compiles the workspace in the mode selected by `config`.
pub async fn compile(profile: &PlatformProfile, cargo: &Path, config: BuildConfig) -> Result<()> {
    let cargo = cargo.to_string_lossy();
    exec::run(profile, &cargo, compile_args(config)).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_mode_selects_debug_everywhere() {
        let config = BuildConfig { is_debug: true };
        assert_eq!(compile_args(config), &["build", "-q"]);
        assert_eq!(config.target_subtree(), "debug");
    }

    #[test]
    fn test_release_mode_selects_release_everywhere() {
        let config = BuildConfig { is_debug: false };
        assert_eq!(compile_args(config), &["build", "-q", "--release"]);
        assert_eq!(config.target_subtree(), "release");
    }

    #[test]
    fn test_release_flag_matches_subtree() {
        // The flag that adds --release must be the same one that switches
        // the subtree the stager reads from.
        for is_debug in [true, false] {
            let config = BuildConfig { is_debug };
            let has_release_flag = compile_args(config).contains(&"--release");
            assert_eq!(has_release_flag, config.target_subtree() == "release");
        }
    }
}
