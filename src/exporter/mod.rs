//! Export drivers
//! An exporter turns a patch into a deployable artifact by running an
//! external toolchain. The monitor watches the process output; the
//! exporter supervises the process and decides the outcome.

pub mod toolchain;

pub use toolchain::ToolchainExporter;

use std::path::PathBuf;
use std::process::Child;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::export::{ChildOutputStream, MonitorHandle};

/// One export request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportJob {
    /// Job ID
    pub id: String,
    /// The patch file to export
    pub patch: PathBuf,
    /// Where the finished artifact lands
    pub output_dir: PathBuf,
    /// File name of the finished artifact
    pub artifact_name: String,
}

impl ExportJob {
    pub fn new(
        patch: impl Into<PathBuf>,
        output_dir: impl Into<PathBuf>,
        artifact_name: impl Into<String>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            patch: patch.into(),
            output_dir: output_dir.into(),
            artifact_name: artifact_name.into(),
        }
    }
}

/// Errors that can occur while driving an export
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("patch file not found: {}", .0.display())]
    PatchNotFound(PathBuf),

    #[error("export toolchain not found: {0}")]
    ToolchainMissing(String),

    #[error("failed to launch toolchain: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("io error during export: {0}")]
    Io(#[from] std::io::Error),
}

/// A freshly spawned toolchain run
///
/// The stream goes to the monitor; the child and its staging directory
/// stay with the driver for supervision.
pub struct SpawnedExport {
    pub stream: ChildOutputStream,
    pub child: Child,
    pub build_dir: PathBuf,
}

/// Export driver trait for different artifact backends
#[async_trait]
pub trait Exporter: Send + Sync {
    /// Short identifier for logs and activity records
    fn id(&self) -> &str;

    /// Check that the driver's toolchain is available
    fn health_check(&self) -> Result<bool, ExportError>;

    /// Launch the toolchain for a job with its output piped
    fn spawn(&self, job: &ExportJob) -> Result<SpawnedExport, ExportError>;

    /// Supervise a spawned run to completion on a blocking worker and
    /// install the artifact. May ask the user questions through `handle`.
    /// Returns whether the export succeeded; the caller records that via
    /// the monitor's `finish`.
    async fn supervise(
        &self,
        child: Child,
        build_dir: PathBuf,
        job: ExportJob,
        handle: MonitorHandle,
    ) -> Result<bool, ExportError>;
}
