//! Toolchain export driver
//!
//! Runs the configured patch compiler as a child process. Output is piped
//! for the monitor; the artifact is built in a staging directory and only
//! installed into the output directory once the run succeeds, asking the
//! user before replacing anything already there.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};

use async_trait::async_trait;
use tracing::{debug, info};

use super::{ExportError, ExportJob, Exporter, SpawnedExport};
use crate::config::ExporterConfig;
use crate::export::{ChildOutputStream, MonitorHandle};

/// Export driver around an external patch compiler
pub struct ToolchainExporter {
    /// Binary name or path of the compiler
    command: String,
    /// Arguments placed before the per-job ones
    extra_args: Vec<String>,
}

impl ToolchainExporter {
    pub fn new(command: impl Into<String>, extra_args: Vec<String>) -> Self {
        Self {
            command: command.into(),
            extra_args,
        }
    }

    pub fn from_config(config: &ExporterConfig) -> Self {
        Self::new(config.toolchain.clone(), config.extra_args.clone())
    }

    fn resolve_command(&self) -> Result<PathBuf, ExportError> {
        which::which(&self.command).map_err(|_| ExportError::ToolchainMissing(self.command.clone()))
    }
}

#[async_trait]
impl Exporter for ToolchainExporter {
    fn id(&self) -> &str {
        "toolchain"
    }

    fn health_check(&self) -> Result<bool, ExportError> {
        Ok(which::which(&self.command).is_ok())
    }

    fn spawn(&self, job: &ExportJob) -> Result<SpawnedExport, ExportError> {
        if !job.patch.exists() {
            return Err(ExportError::PatchNotFound(job.patch.clone()));
        }

        let command = self.resolve_command()?;

        let build_dir = job.output_dir.join(format!(".patchlab-build-{}", job.id));
        fs::create_dir_all(&build_dir)?;

        let mut cmd = Command::new(command);
        cmd.args(&self.extra_args);
        cmd.arg(&job.patch);
        cmd.arg("-o").arg(&build_dir);
        cmd.arg("-n").arg(&job.artifact_name);
        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());

        debug!("launching export toolchain: {:?}", cmd);

        let mut child = cmd.spawn().map_err(ExportError::Spawn)?;

        let stdout = child.stdout.take().ok_or_else(|| {
            ExportError::Spawn(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "toolchain stdout was not captured",
            ))
        })?;
        let stderr = child.stderr.take();
        let stream = ChildOutputStream::new(stdout, stderr)?;

        info!(job = %job.id, "export toolchain started");

        Ok(SpawnedExport {
            stream,
            child,
            build_dir,
        })
    }

    async fn supervise(
        &self,
        child: Child,
        build_dir: PathBuf,
        job: ExportJob,
        handle: MonitorHandle,
    ) -> Result<bool, ExportError> {
        tokio::task::spawn_blocking(move || supervise_blocking(child, build_dir, job, handle))
            .await
            .expect("export supervisor task panicked")
    }
}

fn supervise_blocking(
    mut child: Child,
    build_dir: PathBuf,
    job: ExportJob,
    handle: MonitorHandle,
) -> Result<bool, ExportError> {
    let status = child.wait()?;

    if !status.success() {
        handle.post_log(format!("\ntoolchain exited with {status}\n"));
        let _ = fs::remove_dir_all(&build_dir);
        return Ok(false);
    }

    let built = build_dir.join(&job.artifact_name);
    if !built.exists() {
        handle.post_log("\ntoolchain reported success but produced no artifact\n");
        let _ = fs::remove_dir_all(&build_dir);
        return Ok(false);
    }

    let dest = job.output_dir.join(&job.artifact_name);
    if dest.exists() {
        handle.request_user_input(format!("Overwrite existing artifact {}?", dest.display()));
    }

    install_artifact(&built, &dest)?;
    let _ = fs::remove_dir_all(&build_dir);

    handle.post_log(format!("\nartifact installed at {}\n", dest.display()));
    info!(job = %job.id, "artifact installed");

    Ok(true)
}

fn install_artifact(built: &Path, dest: &Path) -> io::Result<()> {
    if fs::rename(built, dest).is_ok() {
        return Ok(());
    }

    // rename fails across filesystems
    fs::copy(built, dest)?;
    fs::remove_file(built)?;
    Ok(())
}
