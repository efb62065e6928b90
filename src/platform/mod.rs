//! Host platform facts, resolved once at startup.
//!
//! Every OS-specific name the pipeline needs lives in one [`PlatformProfile`]
//! value threaded through the downstream components, instead of each call
//! site re-testing the OS string. An unrecognized OS produces a valid
//! profile tagged [`Os::Unsupported`]; construction never fails. The failure
//! happens later, at the first point a platform-specific name is actually
//! required.

use crate::error::{OrchestrationError, Result};

const MINIO_URL_LINUX: &str = "https://dl.min.io/server/minio/release/linux-amd64/minio";
const MINIO_URL_DARWIN: &str = "https://dl.min.io/server/minio/release/darwin-amd64/minio";
const MINIO_URL_WINDOWS: &str =
    "https://dl.min.io/server/minio/release/windows-amd64/minio.exe";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Os {
    Linux,
    Darwin,
    Windows,
    Unsupported,
}

/// OS-specific facts consumed by the probe, installer, stager, and launcher.
#[derive(Debug, Clone)]
pub struct PlatformProfile {
    pub os: Os,
    /// Raw OS identifier, kept for diagnostics.
    pub os_id: String,
    /// File name of the compiled tracking library, `None` when unsupported.
    pub native_lib_name: Option<&'static str>,
    /// `which` on POSIX, `where` on Windows.
    pub lookup_command: &'static str,
    /// Whether subprocesses must go through `cmd /C`.
    pub shell_wrap: bool,
    /// Expected file name of the object-storage server binary.
    pub object_store_binary: &'static str,
    pub object_store_url: &'static str,
}

impl PlatformProfile {
    /// Resolves the profile for the current host. Inspects the OS exactly
    /// once; callers thread the returned value everywhere else.
    pub fn resolve() -> Self {
        Self::from_os(std::env::consts::OS)
    }

    /// Profile for an explicit OS identifier (as in `std::env::consts::OS`).
    pub fn from_os(os: &str) -> Self {
        match os {
            "linux" => Self {
                os: Os::Linux,
                os_id: os.to_string(),
                native_lib_name: Some("libredistracker.so"),
                lookup_command: "which",
                shell_wrap: false,
                object_store_binary: "minio",
                object_store_url: MINIO_URL_LINUX,
            },
            "macos" => Self {
                os: Os::Darwin,
                os_id: os.to_string(),
                native_lib_name: Some("libredistracker.dylib"),
                lookup_command: "which",
                shell_wrap: false,
                object_store_binary: "minio",
                object_store_url: MINIO_URL_DARWIN,
            },
            "windows" => Self {
                os: Os::Windows,
                os_id: os.to_string(),
                native_lib_name: Some("redistracker.dll"),
                lookup_command: "where",
                shell_wrap: true,
                object_store_binary: "minio.exe",
                object_store_url: MINIO_URL_WINDOWS,
            },
            other => Self {
                os: Os::Unsupported,
                os_id: other.to_string(),
                native_lib_name: None,
                lookup_command: "which",
                shell_wrap: false,
                object_store_binary: "minio",
                object_store_url: MINIO_URL_LINUX,
            },
        }
    }

    pub fn is_supported(&self) -> bool {
        self.os != Os::Unsupported
    }

    /// Suffix appended to executable artifact names (`.exe` on Windows).
    pub fn exe_suffix(&self) -> &'static str {
        match self.os {
            Os::Windows => ".exe",
            _ => "",
        }
    }

    /// The native library file name, or [`OrchestrationError::UnsupportedPlatform`]
    /// when the host has none.
    pub fn require_native_lib(&self) -> Result<&'static str> {
        self.native_lib_name
            .ok_or_else(|| OrchestrationError::UnsupportedPlatform(self.os_id.clone()))
    }
}
