//! soptctl - build-and-deploy orchestrator for the SOPT tracker stack
//!
//! One invocation verifies the host toolchain, self-installs the sqlx CLI
//! and the MinIO server when missing, runs database migrations, compiles the
//! workspace, stages artifacts into a deployment directory, and starts the
//! service stack in dependency order.
//!
//! # Pipeline
//!
//! CLI parse, then [`platform::PlatformProfile`] resolution, the
//! [`toolchain`] probe, conditional [`install`], [`build`] (migrate, then
//! compile), [`stage`], and finally [`launch`]. Every stage is fatal on
//! failure; there is no resumption from a partial stage.
//!
//! # Key pieces
//!
//! - [`platform`]: OS facts resolved once and threaded everywhere
//! - [`exec`]: typed external command execution
//! - [`toolchain`]: probe results where absence is data, not an error
//! - [`stage`]: idempotent artifact and configuration staging
//! - [`launch`]: ordered detached service bootstrap with typed handles

// Public modules
pub mod build;
pub mod cli;
pub mod config;
pub mod error;
pub mod exec;
pub mod install;
pub mod launch;
pub mod pipeline;
pub mod platform;
pub mod stage;
pub mod toolchain;

// Re-export key types for convenient access
pub use build::BuildConfig;
pub use config::{ConfigError, DeployConfig};
pub use error::OrchestrationError;
pub use pipeline::Orchestrator;
pub use platform::{Os, PlatformProfile};
pub use stage::{ArtifactManifest, StageMode};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
