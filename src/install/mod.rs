//! Self-installation of the two auxiliary tools the pipeline can provide on
//! its own: the sqlx migration CLI (via `cargo install`) and the MinIO
//! object-storage server (direct download).

use std::path::{Path, PathBuf};

use anyhow::Context;
use tracing::{debug, info};

use crate::error::{OrchestrationError, Result};
use crate::exec;
use crate::platform::PlatformProfile;

/// Installs the sqlx migration CLI through the build tool's package-install
/// subcommand. A nonzero exit from `cargo install` surfaces as
/// [`OrchestrationError::InstallFailed`].
pub async fn install_migration_cli(profile: &PlatformProfile, cargo: &Path) -> Result<()> {
    info!("sqlx not found, installing sqlx-cli");
    let cargo = cargo.to_string_lossy();
    exec::run(profile, &cargo, &["install", "sqlx-cli"])
        .await
        .map_err(|err| OrchestrationError::InstallFailed {
            what: "sqlx-cli".to_string(),
            reason: err.to_string(),
        })
}

/// Ensures the object-storage server binary exists in `dir`, downloading the
/// platform-specific MinIO release when it does not. Idempotent: an existing
/// binary short-circuits before any network activity. On POSIX the
/// downloaded file is marked executable.
pub async fn ensure_object_store(profile: &PlatformProfile, dir: &Path) -> Result<PathBuf> {
    let target = dir.join(profile.object_store_binary);
    if target.exists() {
        debug!(path = %target.display(), "object-storage binary already present");
        return Ok(target);
    }

    info!(url = profile.object_store_url, "downloading object-storage server");
    download(profile.object_store_url, &target)
        .await
        .map_err(|err| OrchestrationError::InstallFailed {
            what: profile.object_store_binary.to_string(),
            reason: format!("{:#}", err),
        })?;

    #[cfg(unix)]
    set_executable(&target)?;

    info!(path = %target.display(), "object-storage server installed");
    Ok(target)
}

/// Streams the body to disk chunk by chunk; MinIO releases are around a
/// hundred megabytes, too large to buffer whole.
async fn download(url: &str, target: &Path) -> anyhow::Result<()> {
    use tokio::io::AsyncWriteExt;

    let mut response = reqwest::get(url)
        .await
        .context("request failed")?
        .error_for_status()
        .context("server rejected the download")?;

    let mut file = tokio::fs::File::create(target)
        .await
        .with_context(|| format!("creating {}", target.display()))?;
    while let Some(chunk) = response.chunk().await.context("download interrupted")? {
        file.write_all(&chunk)
            .await
            .with_context(|| format!("writing {}", target.display()))?;
    }
    file.flush()
        .await
        .with_context(|| format!("flushing {}", target.display()))?;
    Ok(())
}

#[cfg(unix)]
fn set_executable(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755))
        .map_err(|err| OrchestrationError::io(path, err))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_ensure_object_store_skips_existing_binary() {
        let dir = TempDir::new().unwrap();
        let profile = PlatformProfile::resolve();
        let existing = dir.path().join(profile.object_store_binary);
        std::fs::write(&existing, b"not really minio").unwrap();

        // A network fetch would fail in the test environment; an existing
        // binary must short-circuit before one is attempted.
        let path = ensure_object_store(&profile, dir.path()).await.unwrap();

        assert_eq!(path, existing);
        assert_eq!(std::fs::read(&existing).unwrap(), b"not really minio");
    }

    #[tokio::test]
    async fn test_download_streams_body_to_file() {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        // Big enough to arrive as more than one chunk.
        let body = vec![b'm'; 256 * 1024];
        let served = body.clone();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = [0u8; 1024];
            let _ = socket.read(&mut request).await;
            let header = format!(
                "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                served.len()
            );
            socket.write_all(header.as_bytes()).await.unwrap();
            socket.write_all(&served).await.unwrap();
            socket.shutdown().await.unwrap();
        });

        let dir = TempDir::new().unwrap();
        let target = dir.path().join("minio");
        download(&format!("http://{}/minio", addr), &target)
            .await
            .unwrap();

        assert_eq!(std::fs::read(&target).unwrap(), body);
    }

    #[cfg(unix)]
    #[test]
    fn test_set_executable() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let file = dir.path().join("minio");
        std::fs::write(&file, b"").unwrap();
        set_executable(&file).unwrap();

        let mode = std::fs::metadata(&file).unwrap().permissions().mode();
        assert_eq!(mode & 0o111, 0o111);
    }
}
