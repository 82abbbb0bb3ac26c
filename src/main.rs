use anyhow::{Context, Result};
use chrono::Local;
use std::fs;
use std::path::{Path, PathBuf};
use tumor_scan::config::{self, AppConfig};
use tumor_scan::detector::Detector;
use tumor_scan::display::ViewerSurface;
use tumor_scan::narrator::Narrator;
use tumor_scan::report::ReportLog;
use tumor_scan::session::{self, Session};
use tumor_scan::speech::EspeakEngine;
use tumor_scan::{batch, cli, frame_source};

/// Creates a timestamped output directory and returns its path
fn create_output_dir(root: &Path) -> Result<PathBuf> {
    let timestamp = Local::now().format("%Y%m%d_%H%M%S").to_string();
    let output_dir = root.join(timestamp);
    fs::create_dir_all(&output_dir)
        .with_context(|| format!("Failed to create {}", output_dir.display()))?;
    Ok(output_dir)
}

fn start_narrator(config: &AppConfig) -> Result<Narrator> {
    let engine = EspeakEngine::new(&config.narrator.program, config.narrator.voice_index)
        .context("Failed to initialize speech synthesis")?;
    Ok(Narrator::spawn(engine, config.narrator.delay, config.narrator.queue_capacity))
}

async fn run_live(config: &AppConfig) -> Result<()> {
    let detector = Detector::new(config.detector.clone()).context("Failed to set up the detector")?;
    let narrator = start_narrator(config)?;
    let source = frame_source::open_source(&config.session)?;
    let report = ReportLog::new(&config.session.report_path);

    let surface = Box::new(ViewerSurface::new());
    let mut session = Session::new(source, surface, detector, narrator, report);
    let outcome = session.run();
    session.shutdown().await?;

    let termination = outcome?;
    log::info!("Session ended: {:?}", termination);
    Ok(())
}

async fn run_stills(config: &AppConfig, input: &Path) -> Result<()> {
    let detector = Detector::new(config.detector.clone()).context("Failed to set up the detector")?;
    let narrator = start_narrator(config)?;
    let mut report = ReportLog::new(&config.session.report_path);

    let output_dir = create_output_dir(&config.session.output_dir)?;
    println!("Created output directory: {}", output_dir.display());

    let outcome =
        batch::analyze_stills(input, &output_dir, &detector, &narrator, &mut report).await;
    session::finish_report(narrator.drain().await, &report)?;

    let written = outcome?;
    println!("Annotated {} frame(s) into {}", written.len(), output_dir.display());
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: cli::Args = argh::from_env();
    let config = config::build_config(&args)?;
    log::debug!("{:?}", config);

    match config.session.still.clone() {
        Some(input) => run_stills(&config, &input).await,
        None => run_live(&config).await,
    }
}
