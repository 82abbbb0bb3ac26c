use indicatif::{ProgressBar, ProgressStyle};
use std::time::Instant;

/// Progress tracker for batch frame analysis
pub struct AnalysisProgress {
    progress_bar: ProgressBar,
    start_time: Instant,
    total_frames: u64,
    processed_frames: u64,
    detections: u64,
}

impl AnalysisProgress {
    pub fn new(total_frames: u64) -> Self {
        let progress_bar = ProgressBar::new(total_frames);
        let style = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} frames | {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-");
        progress_bar.set_style(style);
        progress_bar.set_message("Analyzing");

        Self {
            progress_bar,
            start_time: Instant::now(),
            total_frames,
            processed_frames: 0,
            detections: 0,
        }
    }

    /// Advances by one analyzed frame
    pub fn update_frame(&mut self, detected: bool) {
        self.processed_frames += 1;
        if detected {
            self.detections += 1;
        }
        self.progress_bar.inc(1);
        self.progress_bar.set_message(self.progress_message());
    }

    fn progress_message(&self) -> String {
        format!("{} with detections", self.detections)
    }

    pub fn finish(&self) {
        let elapsed = self.start_time.elapsed();
        self.progress_bar.finish_with_message(format!(
            "Completed! {}/{} frames with detections in {}",
            self.detections,
            self.total_frames,
            format_duration(elapsed.as_secs_f64())
        ));
    }

    pub fn processed_frames(&self) -> u64 {
        self.processed_frames
    }

    pub fn detections(&self) -> u64 {
        self.detections
    }
}

/// Formats a duration in seconds to m:ss or h:mm:ss
fn format_duration(seconds: f64) -> String {
    let total_seconds = seconds as u64;
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let secs = total_seconds % 60;

    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, secs)
    } else {
        format!("{}:{:02}", minutes, secs)
    }
}
