//! The orchestration pipeline.
//!
//! Stages run strictly in order, each fatal on failure: platform resolution,
//! toolchain probe (with conditional self-install), migrations, compile,
//! staging, launch. Data flows forward only; no stage reaches back into an
//! earlier one.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::info;

use crate::build::{self, BuildConfig};
use crate::cli::CliArgs;
use crate::config::DeployConfig;
use crate::error::{OrchestrationError, Result};
use crate::install;
use crate::launch;
use crate::platform::PlatformProfile;
use crate::stage::{self, ArtifactManifest, StageMode};
use crate::toolchain::{self, Toolchain};

/// Source of tools for the probe stage: locating them on the host and
/// installing the two installable ones. The host implementation shells out;
/// the trait is the seam that lets the probe/install/re-probe policy be
/// exercised without touching the host.
#[async_trait]
pub trait ToolProvider {
    async fn locate(&self, tool: &str) -> Option<PathBuf>;
    async fn install_migration_cli(&self, cargo: &Path) -> Result<()>;
    /// Installs the object-storage server and returns its path.
    async fn install_object_store(&self) -> Result<PathBuf>;
}

/// The real host: lookup-command probes and actual installs.
pub struct HostToolProvider {
    profile: PlatformProfile,
}

impl HostToolProvider {
    pub fn new(profile: PlatformProfile) -> Self {
        Self { profile }
    }
}

#[async_trait]
impl ToolProvider for HostToolProvider {
    async fn locate(&self, tool: &str) -> Option<PathBuf> {
        toolchain::probe(tool, &self.profile).await.path
    }

    async fn install_migration_cli(&self, cargo: &Path) -> Result<()> {
        install::install_migration_cli(&self.profile, cargo).await
    }

    async fn install_object_store(&self) -> Result<PathBuf> {
        let downloaded = install::ensure_object_store(&self.profile, Path::new(".")).await?;
        downloaded
            .canonicalize()
            .map_err(|err| OrchestrationError::io(&downloaded, err))
    }
}

pub struct Orchestrator {
    profile: PlatformProfile,
    build_config: BuildConfig,
    deploy: DeployConfig,
    dest: PathBuf,
    mode: StageMode,
    launch_services: bool,
}

impl Orchestrator {
    pub fn from_args(args: &CliArgs) -> Self {
        Self::new(args, PlatformProfile::resolve())
    }

    pub fn new(args: &CliArgs, profile: PlatformProfile) -> Self {
        Self {
            profile,
            build_config: BuildConfig {
                is_debug: args.debug,
            },
            deploy: DeployConfig::from_env(),
            dest: args.dest.clone(),
            mode: if args.link {
                StageMode::Link
            } else {
                StageMode::Copy
            },
            launch_services: !args.no_launch,
        }
    }

    /// Runs the whole pipeline from the current directory (the SOPT
    /// checkout).
    pub async fn run(&self) -> Result<()> {
        let host = HostToolProvider::new(self.profile.clone());
        self.run_with(&host).await
    }

    async fn run_with(&self, tools: &dyn ToolProvider) -> Result<()> {
        if !self.profile.is_supported() {
            return Err(OrchestrationError::UnsupportedPlatform(
                self.profile.os_id.clone(),
            ));
        }
        self.deploy
            .validate()
            .map_err(|err| OrchestrationError::InstallFailed {
                what: "deploy configuration".to_string(),
                reason: err.to_string(),
            })?;

        let chain = self.resolve_toolchain(tools).await?;

        build::run_migrations(&self.profile, &chain.sqlx, Path::new(".")).await?;
        build::compile(&self.profile, &chain.cargo, self.build_config).await?;

        let manifest = ArtifactManifest::resolve(&self.profile)?;
        stage::stage(
            &manifest,
            self.build_config,
            Path::new("."),
            &self.dest,
            self.mode,
        )?;

        if !self.launch_services {
            info!("staging done, launch skipped");
            return Ok(());
        }

        let dest = self
            .dest
            .canonicalize()
            .map_err(|err| OrchestrationError::io(&self.dest, err))?;
        let plans = launch::launch_plan(
            &dest,
            &self.profile,
            &self.deploy,
            &chain.minio,
            &chain.redis_server,
        );
        let services = launch::start_all(plans).await?;
        launch::run_until_interrupted(services).await;
        Ok(())
    }

    /// Probes every required tool, self-installing the two installable ones.
    ///
    /// `cargo`, `psql`, and `redis-server` are fatal when absent. `sqlx` gets
    /// one `cargo install sqlx-cli` attempt followed by a re-probe; `minio`
    /// falls back to a download into the working directory.
    async fn resolve_toolchain(&self, tools: &dyn ToolProvider) -> Result<Toolchain> {
        let cargo = require(tools, toolchain::BUILD_TOOL).await?;
        let psql = require(tools, toolchain::DB_CLIENT).await?;
        let redis_server = require(tools, toolchain::CACHE_SERVER).await?;

        let sqlx = match tools.locate(toolchain::MIGRATION_CLI).await {
            Some(path) => path,
            None => {
                tools.install_migration_cli(&cargo).await?;
                require(tools, toolchain::MIGRATION_CLI).await?
            }
        };

        let minio = match tools.locate(toolchain::OBJECT_STORE).await {
            Some(path) => path,
            None => tools.install_object_store().await?,
        };

        Ok(Toolchain {
            cargo,
            sqlx,
            psql,
            redis_server,
            minio,
        })
    }
}

async fn require(tools: &dyn ToolProvider, tool: &str) -> Result<PathBuf> {
    tools
        .locate(tool)
        .await
        .ok_or_else(|| OrchestrationError::MissingTool(tool.to_string()))
}
