//! Service bootstrap in dependency order.
//!
//! Object storage comes up first (it backs persistent data), then the cache
//! server (ephemeral state), then the primary service, then the proxy that
//! fronts it. The strict sequence replaces retry/backoff in the dependents.
//! Children run detached from the deployment directory and are never waited
//! on; the orchestrator keeps a typed handle per service so interrupt-driven
//! teardown has something concrete to kill.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use tokio::process::{Child, Command};
use tracing::{info, warn};

use crate::config::DeployConfig;
use crate::error::{OrchestrationError, Result};
use crate::platform::PlatformProfile;

/// Everything needed to spawn one service: resolved ahead of time so the
/// launch order is inspectable before a single process starts.
#[derive(Debug, Clone)]
pub struct ServicePlan {
    pub name: &'static str,
    pub program: PathBuf,
    pub args: Vec<String>,
    /// Variables set in the child's environment only.
    pub envs: Vec<(&'static str, String)>,
    pub cwd: PathBuf,
}

impl ServicePlan {
    pub fn command_line(&self) -> String {
        let mut line = self.program.display().to_string();
        for arg in &self.args {
            line.push(' ');
            line.push_str(arg);
        }
        line
    }
}

/// A launched service and its live process handle.
#[derive(Debug)]
pub struct ServiceProcess {
    pub name: &'static str,
    pub command_line: String,
    child: Child,
}

impl ServiceProcess {
    pub async fn kill(&mut self) {
        if let Err(err) = self.child.kill().await {
            warn!(service = self.name, error = %err, "failed to kill service");
        }
    }
}

/// Builds the ordered launch sequence for the staged stack in `dest`.
///
/// `dest` must be absolute: it becomes each child's working directory, and
/// the service binaries are addressed inside it. `object_store` and
/// `cache_server` are the probed (or installed) executables.
pub fn launch_plan(
    dest: &Path,
    profile: &PlatformProfile,
    deploy: &DeployConfig,
    object_store: &Path,
    cache_server: &Path,
) -> Vec<ServicePlan> {
    let suffix = profile.exe_suffix();
    vec![
        ServicePlan {
            name: "minio",
            program: object_store.to_path_buf(),
            args: vec![
                "server".to_string(),
                deploy.minio_data_dir.clone(),
                "--console-address".to_string(),
                deploy.minio_console_addr.clone(),
            ],
            envs: vec![
                ("MINIO_ROOT_USER", deploy.minio_root_user.clone()),
                ("MINIO_ROOT_PASSWORD", deploy.minio_root_password.clone()),
            ],
            cwd: dest.to_path_buf(),
        },
        ServicePlan {
            name: "redis-server",
            program: cache_server.to_path_buf(),
            args: vec!["./config/redis.conf".to_string()],
            envs: vec![],
            cwd: dest.to_path_buf(),
        },
        ServicePlan {
            name: "sopt",
            program: dest.join(format!("sopt{}", suffix)),
            args: vec![],
            envs: vec![],
            cwd: dest.to_path_buf(),
        },
        ServicePlan {
            name: "sopt_proxy",
            program: dest.join(format!("sopt_proxy{}", suffix)),
            args: vec![],
            envs: vec![],
            cwd: dest.to_path_buf(),
        },
    ]
}

/// Spawns every planned service, strictly in plan order. A spawn failure
/// aborts the launch; already-started services are torn down before the
/// error is returned.
pub async fn start_all(plans: Vec<ServicePlan>) -> Result<Vec<ServiceProcess>> {
    let mut services = Vec::with_capacity(plans.len());

    for plan in plans {
        let line = plan.command_line();
        info!(service = plan.name, command = %line, "starting");

        let mut command = Command::new(&plan.program);
        command
            .args(&plan.args)
            .current_dir(&plan.cwd)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(false);
        for (key, value) in &plan.envs {
            command.env(key, value);
        }

        match command.spawn() {
            Ok(child) => services.push(ServiceProcess {
                name: plan.name,
                command_line: line,
                child,
            }),
            Err(err) => {
                shutdown(&mut services).await;
                return Err(OrchestrationError::spawn_failed(line, &err));
            }
        }
    }

    Ok(services)
}

/// Best-effort teardown: kills every retained handle in reverse launch
/// order. No drain, no timeout.
pub async fn shutdown(services: &mut [ServiceProcess]) {
    for service in services.iter_mut().rev() {
        info!(service = service.name, "stopping");
        service.kill().await;
    }
}

/// Parks until an interrupt arrives, then tears the stack down.
pub async fn run_until_interrupted(mut services: Vec<ServiceProcess>) {
    info!("service stack is up; press Ctrl-C to stop");
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "interrupt handler failed, stopping services");
    } else {
        info!("interrupt received");
    }
    shutdown(&mut services).await;
}
