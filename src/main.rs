//! CLI entry point for imcapp.
//!
//! Headless demo surface over the capture core, wired against the mock
//! capture device:
//! - `capture`: run one or more capture jobs and print the realized paths
//! - `next-path`: print the path the next capture would be written to
//! - `gen-samples`: generate a prefixed sample-id range, optionally as CSV
//!
//! The real camera and the interactive surface live outside this crate; the
//! binary exists to exercise the orchestration end to end.

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use imcapp::hardware::mock::MockCamera;
use imcapp::CaptureDevice;
use imcapp::settings::{self, FileSettings, SettingsStore};
use imcapp::{CaptureJob, EventBus, JobOutcome, JobRunner, NamingSubject, SampleList};
use std::path::PathBuf;
use std::sync::Arc;

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[derive(Parser)]
#[command(name = "imcapp")]
#[command(about = "Lab image-capture orchestration (mock camera demo)", long_about = None)]
struct Cli {
    /// Settings file (defaults to the per-user config location)
    #[arg(long, global = true)]
    settings: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct NamingArgs {
    /// Operator initials (2-3 letters)
    #[arg(long)]
    initials: Option<String>,

    /// Experiment number
    #[arg(long)]
    experiment: Option<u32>,

    /// Batch letter
    #[arg(long)]
    batch: Option<String>,

    /// Root directory for captured images
    #[arg(long)]
    root: Option<PathBuf>,

    /// Sample identifier to use as the base filename
    #[arg(long)]
    sample: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run capture jobs against the mock camera
    Capture {
        #[command(flatten)]
        naming: NamingArgs,

        /// Run an autofocus cycle before each shot
        #[arg(long)]
        autofocus: bool,

        /// Number of consecutive shots
        #[arg(long, default_value = "1")]
        count: u32,

        /// Persist the naming fields as the new defaults
        #[arg(long)]
        save_defaults: bool,
    },

    /// Print the next allocated capture path without capturing
    NextPath {
        #[command(flatten)]
        naming: NamingArgs,
    },

    /// Generate a sample-id range, printed or written as CSV
    GenSamples {
        /// Identifier prefix (e.g. "3A")
        #[arg(long)]
        prefix: String,

        #[arg(long, default_value = "1")]
        low: u32,

        #[arg(long, default_value = "99")]
        high: u32,

        /// Write the list to this CSV file instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let settings_path = match cli.settings {
        Some(path) => path,
        None => FileSettings::default_path()?,
    };
    let mut store = FileSettings::open(&settings_path)?;
    settings::seed_defaults(&mut store);

    match cli.command {
        Commands::Capture {
            naming,
            autofocus,
            count,
            save_defaults,
        } => run_capture(store, naming, autofocus, count, save_defaults).await,
        Commands::NextPath { naming } => {
            apply_naming_args(&mut store, &naming);
            let template = settings::template_from_settings(&store)?;
            let mut subject = NamingSubject::new(template, EventBus::default())?;
            if let Some(sample) = naming.sample {
                subject.select_subject(&sample)?;
            }
            println!("{}", subject.current().path.display());
            Ok(())
        }
        Commands::GenSamples {
            prefix,
            low,
            high,
            out,
        } => {
            let mut list = SampleList::new();
            list.extend_from_range(&prefix, low, high);
            match out {
                Some(path) => list.export_csv(&path)?,
                None => {
                    for id in list.items() {
                        println!("{id}");
                    }
                }
            }
            Ok(())
        }
    }
}

fn apply_naming_args(store: &mut dyn SettingsStore, naming: &NamingArgs) {
    if let Some(initials) = &naming.initials {
        store.set(settings::keys::INITIALS, &initials.to_uppercase());
    }
    if let Some(experiment) = naming.experiment {
        store.set(settings::keys::EXP_ID, &experiment.to_string());
    }
    if let Some(batch) = &naming.batch {
        store.set(settings::keys::BATCH_ID, &batch.to_uppercase());
    }
    if let Some(root) = &naming.root {
        store.set(settings::keys::SAVE_DIR, &root.to_string_lossy());
    }
}

async fn run_capture(
    mut store: FileSettings,
    naming: NamingArgs,
    autofocus: bool,
    count: u32,
    save_defaults: bool,
) -> Result<()> {
    apply_naming_args(&mut store, &naming);
    let template = settings::template_from_settings(&store)?;

    if save_defaults {
        settings::save_template_defaults(&mut store, &template);
        store.save()?;
    }

    let bus = EventBus::default();
    let mut subject = NamingSubject::new(template, bus.clone())?;
    if let Some(sample) = naming.sample {
        subject.select_subject(&sample)?;
    }

    let camera = Arc::new(MockCamera::new());
    let (width, height) = settings::resolution_from_settings(&store);
    camera
        .configure(width, height)
        .await
        .map_err(imcapp::ImcapError::Capture)?;
    camera.start().await.map_err(imcapp::ImcapError::Capture)?;

    let runner = JobRunner::new(camera, bus);

    for shot in 1..=count {
        // Directory creation is the submitter's duty; allocation never
        // touches the filesystem.
        std::fs::create_dir_all(&subject.current().directory)?;

        let job = CaptureJob::new(subject.current().clone(), autofocus);
        let ticket = runner.submit(job)?;
        match ticket.wait().await {
            JobOutcome::Completed(path) => {
                println!("shot {shot}/{count}: {}", path.display());
                subject.reallocate()?;
            }
            JobOutcome::Failed(err) => {
                return Err(imcapp::ImcapError::Capture(err).into());
            }
            JobOutcome::Abandoned => break,
        }
    }

    Ok(())
}
