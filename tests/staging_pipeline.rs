//! Staging integration tests
//!
//! These exercise the manifest-to-deployment-directory flow against a fake
//! checkout: artifact selection per build mode, config tree merging, and
//! idempotent re-staging.

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use soptctl::build::BuildConfig;
use soptctl::platform::PlatformProfile;
use soptctl::stage::{stage, ArtifactManifest, StageMode};

/// Lays out a checkout with build output for both modes, so tests can stage
/// either subtree and tell the results apart by content.
fn create_checkout() -> TempDir {
    let dir = TempDir::new().unwrap();
    let root = dir.path();

    for subtree in ["debug", "release"] {
        let out = root.join("target").join(subtree);
        fs::create_dir_all(&out).unwrap();
        for name in ["sopt", "sopt_proxy", "libredistracker.so"] {
            fs::write(out.join(name), format!("{} from {}", name, subtree)).unwrap();
        }
    }

    fs::create_dir_all(root.join("config")).unwrap();
    fs::write(root.join("config/redis.conf"), "port 6379\n").unwrap();
    fs::write(root.join(".env"), "DATABASE_URL=postgres://localhost/sopt\n").unwrap();

    dir
}

fn linux_manifest() -> ArtifactManifest {
    ArtifactManifest::resolve(&PlatformProfile::from_os("linux")).unwrap()
}

fn deployed_file(dest: &Path, name: &str) -> String {
    fs::read_to_string(dest.join(name)).unwrap()
}

#[test]
fn stages_release_artifacts_by_default_mode() {
    let checkout = create_checkout();
    let dest = checkout.path().join("bin");

    stage(
        &linux_manifest(),
        BuildConfig { is_debug: false },
        checkout.path(),
        &dest,
        StageMode::Copy,
    )
    .unwrap();

    assert_eq!(deployed_file(&dest, "sopt"), "sopt from release");
    assert_eq!(deployed_file(&dest, "sopt_proxy"), "sopt_proxy from release");
    assert_eq!(
        deployed_file(&dest, "libredistracker.so"),
        "libredistracker.so from release"
    );
    assert_eq!(deployed_file(&dest, "config/redis.conf"), "port 6379\n");
    assert_eq!(
        deployed_file(&dest, ".env"),
        "DATABASE_URL=postgres://localhost/sopt\n"
    );
}

#[test]
fn debug_mode_stages_the_debug_subtree() {
    let checkout = create_checkout();
    let dest = checkout.path().join("bin");

    stage(
        &linux_manifest(),
        BuildConfig { is_debug: true },
        checkout.path(),
        &dest,
        StageMode::Copy,
    )
    .unwrap();

    assert_eq!(deployed_file(&dest, "sopt"), "sopt from debug");
}

#[test]
fn restaging_an_existing_deployment_succeeds_and_picks_up_changes() {
    let checkout = create_checkout();
    let dest = checkout.path().join("bin");
    let config = BuildConfig { is_debug: false };

    stage(&linux_manifest(), config, checkout.path(), &dest, StageMode::Copy).unwrap();

    // Rebuild output and config both change between runs.
    fs::write(
        checkout.path().join("target/release/sopt"),
        "sopt rebuilt",
    )
    .unwrap();
    fs::write(checkout.path().join("config/redis.conf"), "port 6380\n").unwrap();

    stage(&linux_manifest(), config, checkout.path(), &dest, StageMode::Copy).unwrap();

    assert_eq!(deployed_file(&dest, "sopt"), "sopt rebuilt");
    assert_eq!(deployed_file(&dest, "config/redis.conf"), "port 6380\n");
}

#[test]
fn staging_twice_leaves_the_same_file_set() {
    let checkout = create_checkout();
    let dest = checkout.path().join("bin");
    let config = BuildConfig { is_debug: false };

    stage(&linux_manifest(), config, checkout.path(), &dest, StageMode::Copy).unwrap();
    let first = list_tree(&dest);
    stage(&linux_manifest(), config, checkout.path(), &dest, StageMode::Copy).unwrap();
    let second = list_tree(&dest);

    assert_eq!(first, second);
}

#[cfg(unix)]
#[test]
fn switching_from_link_to_copy_staging_preserves_build_artifacts() {
    let checkout = create_checkout();
    let dest = checkout.path().join("bin");
    let config = BuildConfig { is_debug: false };

    stage(&linux_manifest(), config, checkout.path(), &dest, StageMode::Link).unwrap();
    stage(&linux_manifest(), config, checkout.path(), &dest, StageMode::Copy).unwrap();

    // Copying over the leftover symlinks must not write through them into
    // the build output.
    assert_eq!(
        fs::read_to_string(checkout.path().join("target/release/sopt")).unwrap(),
        "sopt from release"
    );
    assert_eq!(deployed_file(&dest, "sopt"), "sopt from release");
    assert!(!fs::symlink_metadata(dest.join("sopt"))
        .unwrap()
        .file_type()
        .is_symlink());
}

#[test]
fn missing_build_output_fails_with_artifact_error() {
    let checkout = create_checkout();
    fs::remove_file(checkout.path().join("target/release/libredistracker.so")).unwrap();
    let dest = checkout.path().join("bin");

    let err = stage(
        &linux_manifest(),
        BuildConfig { is_debug: false },
        checkout.path(),
        &dest,
        StageMode::Copy,
    )
    .unwrap_err();

    assert!(err.to_string().contains("was the build run?"));
    assert_eq!(err.exit_code(), 1);
}

#[test]
fn unsupported_platform_fails_before_touching_the_checkout() {
    let profile = PlatformProfile::from_os("freebsd");
    let err = ArtifactManifest::resolve(&profile).unwrap_err();
    assert!(err.to_string().contains("unsupported host platform"));
}

fn list_tree(root: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();
    let mut stack = vec![root.to_path_buf()];
    while let Some(dir) = stack.pop() {
        for entry in fs::read_dir(&dir).unwrap() {
            let path = entry.unwrap().path();
            if path.is_dir() {
                stack.push(path);
            } else {
                files.push(path);
            }
        }
    }
    files.sort();
    files
}
