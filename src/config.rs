//! Deployment settings read from the environment.
//!
//! The orchestrator itself is configured through `SOPTCTL_*` variables with
//! working defaults; it never parses the staged `.env` file, which belongs
//! to the services and is copied verbatim.
//!
//! - `SOPTCTL_MINIO_ROOT_USER` - object-storage root user (default: "sopt")
//! - `SOPTCTL_MINIO_ROOT_PASSWORD` - object-storage root password
//!   (default: "sopt-secret")
//! - `SOPTCTL_MINIO_DATA_DIR` - data directory passed to `minio server`,
//!   relative to the deployment dir (default: "data")
//! - `SOPTCTL_MINIO_CONSOLE_ADDR` - MinIO console listen address
//!   (default: ":9001")

use std::env;

use thiserror::Error;

const DEFAULT_MINIO_ROOT_USER: &str = "sopt";
const DEFAULT_MINIO_ROOT_PASSWORD: &str = "sopt-secret";
const DEFAULT_MINIO_DATA_DIR: &str = "data";
const DEFAULT_MINIO_CONSOLE_ADDR: &str = ":9001";

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Settings the launcher hands to the spawned services. Root credentials are
/// placed in the MinIO child's environment only; the orchestrator's own
/// environment is never mutated.
#[derive(Debug, Clone)]
pub struct DeployConfig {
    pub minio_root_user: String,
    pub minio_root_password: String,
    pub minio_data_dir: String,
    pub minio_console_addr: String,
}

impl DeployConfig {
    pub fn from_env() -> Self {
        Self {
            minio_root_user: env_or("SOPTCTL_MINIO_ROOT_USER", DEFAULT_MINIO_ROOT_USER),
            minio_root_password: env_or(
                "SOPTCTL_MINIO_ROOT_PASSWORD",
                DEFAULT_MINIO_ROOT_PASSWORD,
            ),
            minio_data_dir: env_or("SOPTCTL_MINIO_DATA_DIR", DEFAULT_MINIO_DATA_DIR),
            minio_console_addr: env_or("SOPTCTL_MINIO_CONSOLE_ADDR", DEFAULT_MINIO_CONSOLE_ADDR),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.minio_root_user.is_empty() || self.minio_root_password.is_empty() {
            return Err(ConfigError::Invalid(
                "MinIO root credentials must not be empty".to_string(),
            ));
        }
        if !self.minio_console_addr.contains(':') {
            return Err(ConfigError::Invalid(format!(
                "console address '{}' has no port",
                self.minio_console_addr
            )));
        }
        Ok(())
    }
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}
