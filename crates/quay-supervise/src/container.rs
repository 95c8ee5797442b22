//! Container strategy

use crate::runner::run_checked;
use crate::{
    best_effort, CommandRunner, LaunchPlan, LogStream, Supervisor, SuperviseError, SuperviseResult,
};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info};

/// Mount point of the node config directory inside the container
pub const CONTAINER_CONFIG_DIR: &str = "/etc/quayside/config";
/// Mount point of the node data directory inside the container
pub const CONTAINER_DATA_DIR: &str = "/var/quayside/data";

/// Runs a node as a detached container named deterministically from the
/// organization MSP id and node slug, with the config and data
/// directories bind-mounted and the descriptor's ports published.
pub struct ContainerSupervisor {
    plan: LaunchPlan,
    runner: Arc<dyn CommandRunner>,
}

impl ContainerSupervisor {
    /// Supervisor bound to one node's launch plan
    pub fn new(plan: LaunchPlan, runner: Arc<dyn CommandRunner>) -> Self {
        Self { plan, runner }
    }

    /// The deterministic container name for this node
    pub fn container_name(&self) -> String {
        self.plan.container_name()
    }

    fn image(&self) -> SuperviseResult<&str> {
        self.plan
            .image
            .as_deref()
            .ok_or_else(|| SuperviseError::control("start", "launch plan carries no image"))
    }

    fn run_args(&self, name: &str, image: &str) -> Vec<String> {
        let mut args = vec![
            "run".to_string(),
            "-d".to_string(),
            "--name".to_string(),
            name.to_string(),
            "--restart".to_string(),
            "unless-stopped".to_string(),
            "-v".to_string(),
            format!("{}:{}", self.plan.config_dir.display(), CONTAINER_CONFIG_DIR),
            "-v".to_string(),
            format!("{}:{}", self.plan.data_dir.display(), CONTAINER_DATA_DIR),
        ];
        for port in &self.plan.ports {
            args.push("-p".to_string());
            args.push(format!("{port}:{port}"));
        }
        for (key, value) in &self.plan.env {
            args.push("-e".to_string());
            args.push(format!("{key}={value}"));
        }
        args.push(image.to_string());
        args.extend(self.plan.args.iter().cloned());
        args
    }
}

#[async_trait]
impl Supervisor for ContainerSupervisor {
    async fn start(&self) -> SuperviseResult<()> {
        let name = self.container_name();
        let image = self.image()?;

        // Clear any previous incarnation so the run below always
        // targets the same logical container name.
        best_effort(
            "remove previous container",
            run_checked(
                &*self.runner,
                "docker",
                &["rm".to_string(), "-f".to_string(), name.clone()],
            )
            .await,
        );

        let args = self.run_args(&name, image);
        debug!(container = name, image, "starting container");
        run_checked(&*self.runner, "docker", &args).await?;
        info!(container = name, "container started");
        Ok(())
    }

    async fn stop(&self) -> SuperviseResult<()> {
        let name = self.container_name();
        // The stop call defines success; removal afterwards is
        // best-effort.
        run_checked(
            &*self.runner,
            "docker",
            &["stop".to_string(), name.clone()],
        )
        .await?;
        best_effort(
            "remove container",
            run_checked(
                &*self.runner,
                "docker",
                &["rm".to_string(), "-f".to_string(), name.clone()],
            )
            .await,
        );
        info!(container = name, "container stopped");
        Ok(())
    }

    async fn tail_logs(&self, tail: usize, follow: bool) -> SuperviseResult<LogStream> {
        let name = self.container_name();
        // A container that was never created has no log stream.
        if run_checked(
            &*self.runner,
            "docker",
            &["inspect".to_string(), name.clone()],
        )
        .await
        .is_err()
        {
            return Err(SuperviseError::LogsUnavailable);
        }

        let mut args = vec!["logs".to_string(), "--tail".to_string(), tail.to_string()];
        if follow {
            args.push("--follow".to_string());
        }
        args.push(name);

        let runner = Arc::clone(&self.runner);
        Ok(LogStream::spawn(move |tx, stop| async move {
            let _ = runner.stream_lines("docker", args, tx, stop).await;
        }))
    }
}
