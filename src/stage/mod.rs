//! Staging of build artifacts and configuration into the deployment
//! directory.
//!
//! The manifest names what gets deployed: the two service binaries and the
//! native tracking library, all read from the cargo output subtree selected
//! by [`BuildConfig`]. Staging is idempotent: re-running on an already-staged
//! directory overwrites in place and never fails on pre-existing files or
//! directories.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::build::BuildConfig;
use crate::error::{OrchestrationError, Result};
use crate::platform::PlatformProfile;

/// One deployable file: where it sits under the cargo output subtree and
/// what it is called in the deployment directory.
#[derive(Debug, Clone)]
pub struct ArtifactEntry {
    pub source_name: String,
    pub dest_name: String,
}

/// Ordered list of deployable artifacts.
#[derive(Debug, Clone)]
pub struct ArtifactManifest {
    pub entries: Vec<ArtifactEntry>,
}

impl ArtifactManifest {
    /// Builds the manifest for the host platform. Fails with
    /// [`OrchestrationError::UnsupportedPlatform`] before any file is
    /// touched when no native-library name resolves.
    pub fn resolve(profile: &PlatformProfile) -> Result<Self> {
        let native_lib = profile.require_native_lib()?;
        let suffix = profile.exe_suffix();

        let mut entries = Vec::new();
        for bin in ["sopt", "sopt_proxy"] {
            let name = format!("{}{}", bin, suffix);
            entries.push(ArtifactEntry {
                source_name: name.clone(),
                dest_name: name,
            });
        }
        entries.push(ArtifactEntry {
            source_name: native_lib.to_string(),
            dest_name: native_lib.to_string(),
        });

        Ok(Self { entries })
    }
}

/// How artifacts are transferred into the deployment directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageMode {
    /// Copy the files (the default; preserves executable bits).
    Copy,
    /// Symlink back to the build output, used by deployment flows that want
    /// to re-run builds without re-staging.
    Link,
}

/// Stages artifacts, configuration, and the environment file into `dest`.
///
/// `repo_root` is the checkout the build ran in; it must contain the cargo
/// `target/` subtree, the `config/` directory, and the `.env` file. Each
/// step is independently fatal.
pub fn stage(
    manifest: &ArtifactManifest,
    config: BuildConfig,
    repo_root: &Path,
    dest: &Path,
    mode: StageMode,
) -> Result<()> {
    fs::create_dir_all(dest).map_err(|err| OrchestrationError::io(dest, err))?;

    let source_root = repo_root.join("target").join(config.target_subtree());
    for entry in &manifest.entries {
        let source = source_root.join(&entry.source_name);
        let target = dest.join(&entry.dest_name);
        transfer(&source, &target, mode)?;
    }

    merge_tree(&repo_root.join("config"), &dest.join("config"))?;

    let env_source = repo_root.join(".env");
    let env_target = dest.join(".env");
    fs::copy(&env_source, &env_target)
        .map_err(|err| OrchestrationError::io(&env_source, err))?;

    info!(dest = %dest.display(), "staging complete");
    Ok(())
}

fn transfer(source: &Path, target: &Path, mode: StageMode) -> Result<()> {
    if !source.exists() {
        return Err(OrchestrationError::ArtifactMissing {
            path: source.to_path_buf(),
        });
    }

    match mode {
        StageMode::Copy => {
            // A leftover symlink from a previous Link staging would be
            // followed here, truncating the build output it points at.
            // Remove it so the copy lands in a fresh regular file.
            let existing_link = target
                .symlink_metadata()
                .map(|meta| meta.file_type().is_symlink())
                .unwrap_or(false);
            if existing_link {
                fs::remove_file(target).map_err(|err| OrchestrationError::io(target, err))?;
            }
            // fs::copy carries permission bits, so executables stay
            // executable.
            fs::copy(source, target).map_err(|err| OrchestrationError::io(source, err))?;
            debug!(source = %source.display(), target = %target.display(), "copied");
        }
        StageMode::Link => {
            // Links point at the absolute build output so they stay valid
            // from inside the deployment directory. An existing link or file
            // is replaced, keeping re-staging idempotent.
            let absolute = source
                .canonicalize()
                .map_err(|err| OrchestrationError::io(source, err))?;
            if target.symlink_metadata().is_ok() {
                fs::remove_file(target).map_err(|err| OrchestrationError::io(target, err))?;
            }
            symlink(&absolute, target)?;
            debug!(source = %absolute.display(), target = %target.display(), "linked");
        }
    }
    Ok(())
}

#[cfg(unix)]
fn symlink(source: &Path, target: &Path) -> Result<()> {
    std::os::unix::fs::symlink(source, target)
        .map_err(|err| OrchestrationError::io(target, err))
}

#[cfg(windows)]
fn symlink(source: &Path, target: &Path) -> Result<()> {
    std::os::windows::fs::symlink_file(source, target)
        .map_err(|err| OrchestrationError::io(target, err))
}

/// Recursively merges `source` into `dest`, overwriting files that already
/// exist at the same relative path. Pre-existing directories are not an
/// error, so the merge can run any number of times.
fn merge_tree(source: &Path, dest: &Path) -> Result<()> {
    if !source.is_dir() {
        return Err(OrchestrationError::io(
            source,
            std::io::Error::new(std::io::ErrorKind::NotFound, "configuration tree missing"),
        ));
    }
    fs::create_dir_all(dest).map_err(|err| OrchestrationError::io(dest, err))?;

    let entries = fs::read_dir(source).map_err(|err| OrchestrationError::io(source, err))?;
    for entry in entries {
        let entry = entry.map_err(|err| OrchestrationError::io(source, err))?;
        let from = entry.path();
        let to = dest.join(entry.file_name());
        if from.is_dir() {
            merge_tree(&from, &to)?;
        } else {
            fs::copy(&from, &to).map_err(|err| OrchestrationError::io(&from, err))?;
        }
    }
    Ok(())
}
