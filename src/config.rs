use anyhow::{Result, bail};
use std::path::PathBuf;
use std::time::Duration;
use crate::cli::Args;

/// Thresholds and drawing parameters of the detection pipeline
#[derive(Debug, Clone)]
pub struct DetectorConfig {
    /// Separable Gaussian taps, applied along both axes
    pub blur_kernel: [f32; 5],
    pub threshold: u8,
    /// L-infinity radius of the closing element (2 => 5x5 square)
    pub close_radius: u8,
    pub canny_low: f32,
    pub canny_high: f32,
    pub min_area: f64,
    pub min_side: u32,
    /// Maximum bounding box extent as a fraction of the frame
    pub max_extent: f64,
    /// Minimum contour area / convex hull area
    pub min_solidity: f64,
    pub cm_per_pixel: f64,
    pub overlay_alpha: f32,
    /// Caption font; `None` uses the bundled DejaVu Sans
    pub font_path: Option<PathBuf>,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            blur_kernel: [0.0625, 0.25, 0.375, 0.25, 0.0625],
            threshold: 150,
            close_radius: 2,
            canny_low: 50.0,
            canny_high: 150.0,
            min_area: 1000.0,
            min_side: 20,
            max_extent: 0.9,
            min_solidity: 0.5,
            cm_per_pixel: 0.0264,
            overlay_alpha: 0.4,
            font_path: None,
        }
    }
}

/// Speech narration settings
#[derive(Debug, Clone)]
pub struct NarratorConfig {
    pub program: String,
    pub voice_index: usize,
    pub delay: Duration,
    pub queue_capacity: usize,
}

impl Default for NarratorConfig {
    fn default() -> Self {
        Self {
            program: "espeak-ng".to_string(),
            voice_index: 1,
            delay: Duration::from_millis(1200),
            queue_capacity: 4,
        }
    }
}

/// Where frames come from and where results go
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub source: String,
    pub width: u32,
    pub height: u32,
    pub report_path: PathBuf,
    pub still: Option<PathBuf>,
    pub output_dir: PathBuf,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub detector: DetectorConfig,
    pub narrator: NarratorConfig,
    pub session: SessionConfig,
}

/// Builds the application configuration from command line arguments
pub fn build_config(args: &Args) -> Result<AppConfig> {
    if args.width == 0 || args.height == 0 {
        bail!("capture size must be non-zero, got {}x{}", args.width, args.height);
    }
    let delay = match Duration::try_from_secs_f32(args.narration_delay) {
        Ok(delay) => delay,
        Err(err) => bail!("invalid narration delay {}: {}", args.narration_delay, err),
    };
    // also rejects NaN
    if !(args.min_area >= 0.0) {
        bail!("minimum area must be a non-negative number");
    }

    let detector = DetectorConfig {
        threshold: args.threshold,
        min_area: args.min_area,
        font_path: args.font.as_ref().map(PathBuf::from),
        ..DetectorConfig::default()
    };

    let narrator = NarratorConfig {
        program: args.speech_program.clone(),
        voice_index: args.voice_index,
        delay,
        ..NarratorConfig::default()
    };

    let session = SessionConfig {
        source: args.source.clone(),
        width: args.width,
        height: args.height,
        report_path: PathBuf::from(&args.report),
        still: args.still.as_ref().map(PathBuf::from),
        output_dir: PathBuf::from(&args.output_dir),
    };

    Ok(AppConfig { detector, narrator, session })
}
