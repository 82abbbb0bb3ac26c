use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use crate::detector::Detector;
use crate::frame_source::image_paths;
use crate::narrator::Narrator;
use crate::progress::AnalysisProgress;
use crate::report::ReportLog;

/// Analyzes every image under `input` without the live feed and writes
/// annotated copies to `output_dir`. Waits for the narrator between frames
/// so each detected frame gets narrated and reported. Returns the written paths.
pub async fn analyze_stills(
    input: &Path,
    output_dir: &Path,
    detector: &Detector,
    narrator: &Narrator,
    report: &mut ReportLog,
) -> Result<Vec<PathBuf>> {
    let paths = image_paths(input)?;
    if paths.is_empty() {
        anyhow::bail!("no images found in {}", input.display());
    }

    let mut progress = AnalysisProgress::new(paths.len() as u64);
    let mut written = Vec::with_capacity(paths.len());

    for path in &paths {
        let frame = image::open(path)
            .with_context(|| format!("Failed to decode {}", path.display()))?
            .to_rgb8();

        narrator.wait_idle().await;
        let analysis = detector.process(&frame, narrator, report);

        let output = output_dir.join(annotated_name(path));
        analysis
            .annotated
            .save(&output)
            .with_context(|| format!("Failed to save {}", output.display()))?;
        log::debug!(
            "{} -> {} ({} regions)",
            path.display(),
            output.display(),
            analysis.regions.len()
        );

        progress.update_frame(analysis.detected());
        written.push(output);
    }

    progress.finish();
    Ok(written)
}

fn annotated_name(path: &Path) -> String {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "frame".to_string());
    format!("{}_analyzed.png", stem)
}
