use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use crate::region::{CandidateRegion, Quadrant};

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One narrated detection
#[derive(Debug, Clone, PartialEq)]
pub struct DetectionRecord {
    pub time: DateTime<Local>,
    pub region: Quadrant,
    pub width_cm: f64,
    pub height_cm: f64,
}

impl DetectionRecord {
    pub fn from_region(region: &CandidateRegion, time: DateTime<Local>) -> Self {
        Self {
            time,
            region: region.quadrant,
            width_cm: region.width_cm,
            height_cm: region.height_cm,
        }
    }

    fn write_entry(&self, out: &mut impl Write) -> std::io::Result<()> {
        writeln!(out, "Time: {}", self.time.format(TIMESTAMP_FORMAT))?;
        writeln!(out, "Region: {}", self.region)?;
        writeln!(out, "Width: {:.1} cm", self.width_cm)?;
        writeln!(out, "Height: {:.1} cm", self.height_cm)?;
        writeln!(out)
    }
}

/// In-memory detection log, appended to a text file once per session
pub struct ReportLog {
    path: PathBuf,
    entries: Vec<DetectionRecord>,
}

impl ReportLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            entries: Vec::new(),
        }
    }

    pub fn record(&mut self, entry: DetectionRecord) {
        log::debug!("Recorded detection in {} region", entry.region);
        self.entries.push(entry);
    }

    pub fn entries(&self) -> &[DetectionRecord] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Appends the report to the file. Returns false, touching nothing, when
    /// no detections were recorded.
    pub fn flush(&self) -> Result<bool> {
        if self.entries.is_empty() {
            log::info!("No detections, no report generated");
            return Ok(false);
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("Failed to open report {}", self.path.display()))?;

        let mut body = Vec::new();
        writeln!(body, "Tumor Detection Report")?;
        writeln!(body, "======================")?;
        writeln!(body)?;
        for entry in &self.entries {
            entry.write_entry(&mut body)?;
        }

        file.write_all(&body)
            .with_context(|| format!("Failed to write report {}", self.path.display()))?;

        println!("Report saved as '{}'", self.path.display());
        Ok(true)
    }
}
