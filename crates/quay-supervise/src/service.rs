//! Host-service strategy (systemd / launchd)

use crate::logs::tail_file;
use crate::runner::run_checked;
use crate::{
    best_effort, CommandRunner, LaunchPlan, LogStream, Supervisor, SuperviseError, SuperviseResult,
};
use async_trait::async_trait;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// Service-manager dialect of the host OS
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServicePlatform {
    /// systemd-style init (Linux)
    Systemd,
    /// launchd (macOS)
    Launchd,
}

impl ServicePlatform {
    /// Pick the dialect for the host OS
    pub fn detect() -> Self {
        if cfg!(target_os = "macos") {
            Self::Launchd
        } else {
            Self::Systemd
        }
    }

    /// Well-known service-definition directory for this platform
    pub fn default_unit_dir(&self) -> PathBuf {
        match self {
            Self::Systemd => PathBuf::from("/etc/systemd/system"),
            Self::Launchd => {
                let home = std::env::var("HOME").unwrap_or_else(|_| "/".to_string());
                Path::new(&home).join("Library/LaunchAgents")
            }
        }
    }

    fn unit_file_name(&self, unit: &str) -> String {
        match self {
            Self::Systemd => format!("{unit}.service"),
            Self::Launchd => format!("io.quayside.{unit}.plist"),
        }
    }

    fn label(&self, unit: &str) -> String {
        format!("io.quayside.{unit}")
    }
}

/// Runs a node as a host-managed service: renders the platform's unit
/// definition, writes it to the well-known location and drives the
/// platform's service-control command.
pub struct ServiceSupervisor {
    plan: LaunchPlan,
    platform: ServicePlatform,
    unit_dir: PathBuf,
    runner: Arc<dyn CommandRunner>,
}

impl ServiceSupervisor {
    /// Supervisor for the detected host platform
    pub fn new(plan: LaunchPlan, runner: Arc<dyn CommandRunner>) -> Self {
        let platform = ServicePlatform::detect();
        let unit_dir = platform.default_unit_dir();
        Self::with_platform(plan, runner, platform, unit_dir)
    }

    /// Supervisor with an explicit platform and unit directory
    pub fn with_platform(
        plan: LaunchPlan,
        runner: Arc<dyn CommandRunner>,
        platform: ServicePlatform,
        unit_dir: PathBuf,
    ) -> Self {
        Self {
            plan,
            platform,
            unit_dir,
            runner,
        }
    }

    /// Path of the rendered unit file
    pub fn unit_file(&self) -> PathBuf {
        self.unit_dir
            .join(self.platform.unit_file_name(&self.plan.unit_name()))
    }

    fn binary(&self) -> SuperviseResult<&Path> {
        self.plan
            .binary
            .as_deref()
            .ok_or_else(|| SuperviseError::control("start", "launch plan carries no binary path"))
    }

    /// Render the unit definition for the configured platform
    pub fn render_unit(&self) -> SuperviseResult<String> {
        let binary = self.binary()?;
        Ok(match self.platform {
            ServicePlatform::Systemd => self.render_systemd(binary),
            ServicePlatform::Launchd => self.render_launchd(binary),
        })
    }

    fn render_systemd(&self, binary: &Path) -> String {
        let mut exec = binary.display().to_string();
        for arg in &self.plan.args {
            let _ = write!(exec, " {arg}");
        }
        let mut unit = String::new();
        let _ = writeln!(unit, "[Unit]");
        let _ = writeln!(
            unit,
            "Description=Quayside {} {}",
            self.plan.kind, self.plan.slug
        );
        let _ = writeln!(unit, "After=network.target");
        let _ = writeln!(unit);
        let _ = writeln!(unit, "[Service]");
        let _ = writeln!(unit, "Type=simple");
        let _ = writeln!(unit, "ExecStart={exec}");
        let _ = writeln!(unit, "WorkingDirectory={}", self.plan.data_dir.display());
        for (key, value) in &self.plan.env {
            let _ = writeln!(unit, "Environment=\"{key}={value}\"");
        }
        let _ = writeln!(unit, "Restart=on-failure");
        let _ = writeln!(unit, "RestartSec=5");
        let _ = writeln!(unit, "LimitNOFILE=65536");
        let _ = writeln!(unit, "StandardOutput=append:{}", self.plan.log_file.display());
        let _ = writeln!(unit, "StandardError=append:{}", self.plan.log_file.display());
        let _ = writeln!(unit);
        let _ = writeln!(unit, "[Install]");
        let _ = writeln!(unit, "WantedBy=multi-user.target");
        unit
    }

    fn render_launchd(&self, binary: &Path) -> String {
        let label = self.platform.label(&self.plan.unit_name());
        let mut args = String::new();
        let _ = writeln!(args, "        <string>{}</string>", binary.display());
        for arg in &self.plan.args {
            let _ = writeln!(args, "        <string>{arg}</string>");
        }
        let mut env = String::new();
        for (key, value) in &self.plan.env {
            let _ = writeln!(env, "        <key>{key}</key>");
            let _ = writeln!(env, "        <string>{value}</string>");
        }
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE plist PUBLIC "-//Apple//DTD PLIST 1.0//EN" "http://www.apple.com/DTDs/PropertyList-1.0.dtd">
<plist version="1.0">
<dict>
    <key>Label</key>
    <string>{label}</string>
    <key>ProgramArguments</key>
    <array>
{args}    </array>
    <key>EnvironmentVariables</key>
    <dict>
{env}    </dict>
    <key>WorkingDirectory</key>
    <string>{workdir}</string>
    <key>RunAtLoad</key>
    <true/>
    <key>KeepAlive</key>
    <true/>
    <key>StandardOutPath</key>
    <string>{log}</string>
    <key>StandardErrorPath</key>
    <string>{log}</string>
</dict>
</plist>
"#,
            label = label,
            args = args,
            env = env,
            workdir = self.plan.data_dir.display(),
            log = self.plan.log_file.display(),
        )
    }

    async fn write_unit_file(&self) -> SuperviseResult<PathBuf> {
        let rendered = self.render_unit()?;
        let path = self.unit_file();
        tokio::fs::create_dir_all(&self.unit_dir)
            .await
            .map_err(|e| SuperviseError::Io {
                path: self.unit_dir.clone(),
                source: e,
            })?;
        tokio::fs::write(&path, rendered)
            .await
            .map_err(|e| SuperviseError::Io {
                path: path.clone(),
                source: e,
            })?;
        Ok(path)
    }

    fn systemctl_args(subcommand: &str, unit: &str) -> Vec<String> {
        vec![subcommand.to_string(), format!("{unit}.service")]
    }
}

#[async_trait]
impl Supervisor for ServiceSupervisor {
    async fn start(&self) -> SuperviseResult<()> {
        let unit = self.plan.unit_name();
        let path = self.write_unit_file().await?;
        debug!(unit, path = %path.display(), "wrote service unit");

        match self.platform {
            ServicePlatform::Systemd => {
                run_checked(&*self.runner, "systemctl", &["daemon-reload".to_string()]).await?;
                run_checked(
                    &*self.runner,
                    "systemctl",
                    &Self::systemctl_args("enable", &unit),
                )
                .await?;
                // restart covers both a fresh start and the renewal
                // restart of an already-running unit.
                run_checked(
                    &*self.runner,
                    "systemctl",
                    &Self::systemctl_args("restart", &unit),
                )
                .await?;
            }
            ServicePlatform::Launchd => {
                best_effort(
                    "launchctl unload",
                    run_checked(
                        &*self.runner,
                        "launchctl",
                        &["unload".to_string(), path.display().to_string()],
                    )
                    .await,
                );
                run_checked(
                    &*self.runner,
                    "launchctl",
                    &["load".to_string(), "-w".to_string(), path.display().to_string()],
                )
                .await?;
            }
        }
        info!(unit, "service started");
        Ok(())
    }

    async fn stop(&self) -> SuperviseResult<()> {
        let unit = self.plan.unit_name();
        let path = self.unit_file();

        match self.platform {
            ServicePlatform::Systemd => {
                // The stop call defines success; everything after is
                // best-effort teardown of the unit definition.
                run_checked(
                    &*self.runner,
                    "systemctl",
                    &Self::systemctl_args("stop", &unit),
                )
                .await?;
                best_effort(
                    "systemctl disable",
                    run_checked(
                        &*self.runner,
                        "systemctl",
                        &Self::systemctl_args("disable", &unit),
                    )
                    .await,
                );
                best_effort(
                    "remove unit file",
                    tokio::fs::remove_file(&path).await,
                );
                best_effort(
                    "systemctl daemon-reload",
                    run_checked(&*self.runner, "systemctl", &["daemon-reload".to_string()]).await,
                );
            }
            ServicePlatform::Launchd => {
                run_checked(
                    &*self.runner,
                    "launchctl",
                    &["unload".to_string(), path.display().to_string()],
                )
                .await?;
                best_effort("remove plist", tokio::fs::remove_file(&path).await);
            }
        }
        info!(unit, "service stopped");
        Ok(())
    }

    async fn tail_logs(&self, tail: usize, follow: bool) -> SuperviseResult<LogStream> {
        let path = self.plan.log_file.clone();
        if !path.exists() {
            return Err(SuperviseError::LogsUnavailable);
        }
        Ok(LogStream::spawn(move |tx, stop| {
            tail_file(path, tail, follow, tx, stop)
        }))
    }
}
