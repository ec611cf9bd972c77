// Tests for the toolchain export driver
//
// These drive real child processes through the monitor, using a small
// shell script as a stand-in for the patch compiler.

#![cfg(unix)]

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use patchlab::export::{ExportMonitor, ExportState};
use patchlab::exporter::{ExportError, ExportJob, Exporter, SpawnedExport, ToolchainExporter};
use tempfile::TempDir;

// The driver passes: <patch> -o <build_dir> -n <artifact_name>
const SUCCESS_SCRIPT: &str = "#!/bin/sh\n\
echo \"compiling $1\"\n\
printf 'artifact' > \"$3/$5\"\n\
echo \"done\"\n";

const FAILURE_SCRIPT: &str = "#!/bin/sh\n\
echo \"boom\" >&2\n\
exit 1\n";

const NO_ARTIFACT_SCRIPT: &str = "#!/bin/sh\n\
echo \"pretending to compile\"\n";

fn write_fake_toolchain(dir: &Path, script: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join("fake-toolchain");
    fs::write(&path, script).unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    path
}

fn setup(script: &str) -> (TempDir, Arc<ToolchainExporter>, ExportJob) {
    let temp_dir = TempDir::new().unwrap();

    let patch = temp_dir.path().join("osc.pd");
    fs::write(&patch, "#N canvas 0 0 450 300;\n").unwrap();

    let out_dir = temp_dir.path().join("out");
    fs::create_dir_all(&out_dir).unwrap();

    let toolchain = write_fake_toolchain(temp_dir.path(), script);
    let exporter = Arc::new(ToolchainExporter::new(
        toolchain.to_string_lossy().to_string(),
        Vec::new(),
    ));
    let job = ExportJob::new(patch, out_dir, "osc.bin");

    (temp_dir, exporter, job)
}

/// Run one export session to completion the way the CLI does: monitor the
/// process, auto-confirm prompts, let the driver decide the outcome.
async fn run_session(
    exporter: Arc<ToolchainExporter>,
    job: ExportJob,
    monitor: &mut ExportMonitor,
) -> Result<bool, ExportError> {
    let SpawnedExport {
        stream,
        child,
        build_dir,
    } = exporter.spawn(&job)?;

    monitor.begin_monitoring(Box::new(stream));

    let handle = monitor.handle();
    let driver_job = job.clone();
    let driver = tokio::spawn(async move {
        exporter.supervise(child, build_dir, driver_job, handle).await
    });

    let deadline = Instant::now() + Duration::from_secs(10);
    let success = loop {
        assert!(Instant::now() < deadline, "export session timed out");
        monitor.pump_events_timeout(Duration::from_millis(10));

        if monitor.pending_prompt().is_some() {
            monitor.confirm_user_input();
        }

        if driver.is_finished() {
            break driver.await.unwrap()?;
        }
    };

    monitor.finish(success);
    Ok(success)
}

#[tokio::test(flavor = "multi_thread")]
async fn test_export_success_installs_artifact() {
    let (_temp, exporter, job) = setup(SUCCESS_SCRIPT);
    let mut monitor = ExportMonitor::with_poll_interval(Duration::from_millis(10));

    let success = run_session(Arc::clone(&exporter), job.clone(), &mut monitor)
        .await
        .unwrap();

    assert!(success);
    assert_eq!(monitor.state(), ExportState::Success);

    let artifact = job.output_dir.join("osc.bin");
    assert_eq!(fs::read_to_string(artifact).unwrap(), "artifact");

    let log = monitor.log().concat();
    assert!(log.contains("compiling"), "log was: {log:?}");
    assert!(log.contains("artifact installed"), "log was: {log:?}");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_export_failure_reports_exit_status() {
    let (_temp, exporter, job) = setup(FAILURE_SCRIPT);
    let mut monitor = ExportMonitor::with_poll_interval(Duration::from_millis(10));

    let success = run_session(exporter, job.clone(), &mut monitor).await.unwrap();

    assert!(!success);
    assert_eq!(monitor.state(), ExportState::Failure);
    assert!(!job.output_dir.join("osc.bin").exists());

    let log = monitor.log().concat();
    // stderr is part of the session log
    assert!(log.contains("boom"), "log was: {log:?}");
    assert!(log.contains("toolchain exited with"), "log was: {log:?}");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_export_without_artifact_fails() {
    let (_temp, exporter, job) = setup(NO_ARTIFACT_SCRIPT);
    let mut monitor = ExportMonitor::with_poll_interval(Duration::from_millis(10));

    let success = run_session(exporter, job, &mut monitor).await.unwrap();

    assert!(!success);
    let log = monitor.log().concat();
    assert!(log.contains("produced no artifact"), "log was: {log:?}");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_overwrite_asks_before_replacing_artifact() {
    let (_temp, exporter, job) = setup(SUCCESS_SCRIPT);

    // An artifact from a previous run is already in place
    fs::write(job.output_dir.join("osc.bin"), "old artifact").unwrap();

    let SpawnedExport {
        stream,
        child,
        build_dir,
    } = exporter.spawn(&job).unwrap();

    let mut monitor = ExportMonitor::with_poll_interval(Duration::from_millis(10));
    monitor.begin_monitoring(Box::new(stream));

    let handle = monitor.handle();
    let driver_job = job.clone();
    let driver_exporter = Arc::clone(&exporter);
    let driver = tokio::spawn(async move {
        driver_exporter
            .supervise(child, build_dir, driver_job, handle)
            .await
    });

    let deadline = Instant::now() + Duration::from_secs(10);
    let mut prompt_seen = None;
    let success = loop {
        assert!(Instant::now() < deadline, "export session timed out");
        monitor.pump_events_timeout(Duration::from_millis(10));

        if let Some(prompt) = monitor.pending_prompt() {
            prompt_seen = Some(prompt.to_string());
            monitor.confirm_user_input();
        }

        if driver.is_finished() {
            break driver.await.unwrap().unwrap();
        }
    };
    monitor.finish(success);

    assert!(success);
    let prompt = prompt_seen.expect("driver asked before overwriting");
    assert!(prompt.contains("Overwrite"), "prompt was: {prompt}");

    let artifact = job.output_dir.join("osc.bin");
    assert_eq!(fs::read_to_string(artifact).unwrap(), "artifact");
}

#[tokio::test]
async fn test_missing_toolchain_is_reported() {
    let temp_dir = TempDir::new().unwrap();
    let patch = temp_dir.path().join("osc.pd");
    fs::write(&patch, "#N canvas;\n").unwrap();

    let exporter = ToolchainExporter::new("patchlab-no-such-toolchain", Vec::new());
    assert!(!exporter.health_check().unwrap());

    let job = ExportJob::new(patch, temp_dir.path(), "osc.bin");
    let err = exporter.spawn(&job).err().expect("spawn should fail");
    match err {
        ExportError::ToolchainMissing(name) => assert_eq!(name, "patchlab-no-such-toolchain"),
        other => panic!("expected ToolchainMissing, got {other}"),
    }
}

#[tokio::test]
async fn test_missing_patch_is_reported() {
    let temp_dir = TempDir::new().unwrap();
    let toolchain = write_fake_toolchain(temp_dir.path(), SUCCESS_SCRIPT);
    let exporter = ToolchainExporter::new(toolchain.to_string_lossy().to_string(), Vec::new());

    let job = ExportJob::new(temp_dir.path().join("gone.pd"), temp_dir.path(), "gone.bin");
    let err = exporter.spawn(&job).err().expect("spawn should fail");
    match err {
        ExportError::PatchNotFound(path) => assert!(path.ends_with("gone.pd")),
        other => panic!("expected PatchNotFound, got {other}"),
    }
}
