//! CLI commands

use std::io::{self, BufRead, Write as _};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::info;

use crate::canvas::overlays::{EditorMode, OverlayKind};
use crate::config::Config;
use crate::export::{ExportActivity, ExportMonitor};
use crate::exporter::{ExportJob, Exporter, SpawnedExport, ToolchainExporter};

#[derive(Parser)]
#[command(name = "patchlab")]
#[command(about = "Export supervision and canvas overlay services for a visual patching editor", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path (default: ~/.patchlab/config.yml)
    #[arg(long)]
    config: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Export a patch with the configured toolchain
    Export {
        /// The patch file to export
        patch: String,

        /// Where the finished artifact lands
        #[arg(long, default_value = ".")]
        output: String,

        /// Artifact file name (default: the patch stem plus .bin)
        #[arg(long)]
        name: Option<String>,

        /// Confirm every question without asking
        #[arg(long)]
        yes: bool,

        /// Print the final session record as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show or change canvas overlay settings
    Overlays {
        #[command(subcommand)]
        action: OverlayAction,
    },

    /// Check that the export toolchain is available
    Doctor,
}

#[derive(Subcommand)]
enum OverlayAction {
    /// Print the overlay settings tree
    Show {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Set one overlay toggle in one editor mode
    Set {
        /// Editor mode (edit, lock, run, alt)
        mode: String,

        /// Overlay (origin, border, index, direction)
        overlay: String,

        /// on or off
        state: String,
    },
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    let config_path = cli.config.clone();
    let config = Config::load(config_path.as_deref())?;

    // Create a multi-threaded runtime for CLI operations
    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    rt.block_on(async {
        match cli.command {
            Commands::Export {
                patch,
                output,
                name,
                yes,
                json,
            } => run_export(&config, patch, output, name, yes, json).await,

            Commands::Overlays { action } => run_overlays(config, config_path.as_deref(), action),

            Commands::Doctor => run_doctor(&config),
        }
    })
}

async fn run_export(
    config: &Config,
    patch: String,
    output: String,
    name: Option<String>,
    yes: bool,
    json: bool,
) -> Result<()> {
    let exporter = Arc::new(ToolchainExporter::from_config(&config.exporter));

    let patch = PathBuf::from(patch);
    let artifact_name = name.unwrap_or_else(|| {
        let stem = patch
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("patch");
        format!("{stem}.bin")
    });
    let job = ExportJob::new(patch, output, artifact_name);

    info!(job = %job.id, "starting export");

    let SpawnedExport {
        stream,
        child,
        build_dir,
    } = exporter.spawn(&job)?;

    let mut monitor =
        ExportMonitor::with_poll_interval(Duration::from_millis(config.exporter.poll_interval_ms));
    monitor.begin_monitoring(Box::new(stream));

    let handle = monitor.handle();
    let driver_exporter = Arc::clone(&exporter);
    let driver_job = job.clone();
    let driver = tokio::spawn(async move {
        driver_exporter
            .supervise(child, build_dir, driver_job, handle)
            .await
    });

    let mut printed = 0;
    let success = loop {
        monitor.pump_events_timeout(Duration::from_millis(50));

        for chunk in &monitor.log()[printed..] {
            print!("{chunk}");
        }
        printed = monitor.log().len();
        io::stdout().flush()?;

        if let Some(prompt) = monitor.pending_prompt().map(str::to_owned) {
            if yes {
                println!("{prompt} [auto-confirmed]");
            } else {
                print!("{prompt} [press Enter to continue] ");
                io::stdout().flush()?;
                let mut line = String::new();
                io::stdin().lock().read_line(&mut line)?;
            }
            monitor.confirm_user_input();
        }

        if driver.is_finished() {
            break driver.await??;
        }
    };

    monitor.finish(success);

    // Trailing output the poller picked up before it stopped
    for chunk in &monitor.log()[printed..] {
        print!("{chunk}");
    }
    io::stdout().flush()?;

    let activity = ExportActivity::new(job.id.as_str(), exporter.id())
        .with_state(monitor.state())
        .with_chunks_logged(monitor.log().len());

    if json {
        println!("{}", serde_json::to_string_pretty(&activity)?);
    }

    if success {
        println!("\nExport successful");
        Ok(())
    } else {
        println!("\nExport failed");
        anyhow::bail!("export failed")
    }
}

fn run_overlays(mut config: Config, config_path: Option<&str>, action: OverlayAction) -> Result<()> {
    match action {
        OverlayAction::Show { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(&config.overlays)?);
            } else {
                for mode in EditorMode::ALL {
                    let shown = config.overlays.shown_in(mode);
                    let shown = if shown.is_empty() {
                        "-".to_string()
                    } else {
                        shown
                            .iter()
                            .map(|kind| kind.label())
                            .collect::<Vec<_>>()
                            .join(", ")
                    };
                    println!("{:<5} {}", mode.as_str(), shown);
                }
            }
            Ok(())
        }

        OverlayAction::Set {
            mode,
            overlay,
            state,
        } => {
            let mode = EditorMode::from_str(&mode)?;
            let kind = OverlayKind::from_str(&overlay)?;
            let on = match state.to_lowercase().as_str() {
                "on" => true,
                "off" => false,
                other => anyhow::bail!("expected on or off, got: {}", other),
            };

            config.overlays.set(mode, kind, on)?;
            config.save(config_path)?;

            println!(
                "{} overlay {} in {} mode",
                kind.label(),
                if on { "shown" } else { "hidden" },
                mode.as_str()
            );
            Ok(())
        }
    }
}

fn run_doctor(config: &Config) -> Result<()> {
    let exporter = ToolchainExporter::from_config(&config.exporter);

    if exporter.health_check()? {
        let path = which::which(&config.exporter.toolchain)?;
        println!("toolchain ok: {}", path.display());
        Ok(())
    } else {
        println!("toolchain missing: {}", config.exporter.toolchain);
        anyhow::bail!("export toolchain not found")
    }
}
