use anyhow::Result;
use image::RgbImage;
use crate::detector::Detector;
use crate::display::{KeyPress, Surface};
use crate::frame_source::FrameSource;
use crate::narrator::Narrator;
use crate::report::ReportLog;

/// Why the live loop stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    QuitKey,
    WindowClosed,
    SourceFailed,
}

/// Everything a capture session owns, torn down together by `shutdown`
pub struct Session {
    source: Box<dyn FrameSource>,
    surface: Box<dyn Surface>,
    detector: Detector,
    narrator: Narrator,
    report: ReportLog,
    captures: usize,
}

impl Session {
    pub fn new(
        source: Box<dyn FrameSource>,
        surface: Box<dyn Surface>,
        detector: Detector,
        narrator: Narrator,
        report: ReportLog,
    ) -> Self {
        Self {
            source,
            surface,
            detector,
            narrator,
            report,
            captures: 0,
        }
    }

    /// Live loop: show frames, analyze on `c`, stop on `q`, a closed window or a failed read
    pub fn run(&mut self) -> Result<Termination> {
        log::info!("Live feed from {}. Press C to capture, Q to quit.", self.source.describe());
        loop {
            let frame = match self.source.next_frame() {
                Ok(frame) => frame,
                Err(err) => {
                    println!("Failed to capture frame");
                    log::error!("{:#}", err);
                    return Ok(Termination::SourceFailed);
                }
            };

            if !self.surface.show_live(&frame)? {
                return Ok(Termination::WindowClosed);
            }

            match self.surface.poll_key() {
                Some(KeyPress::Capture) => self.capture(frame)?,
                Some(KeyPress::Quit) => return Ok(Termination::QuitKey),
                Some(KeyPress::Other) | None => {}
            }
        }
    }

    /// Freezes `frame`, analyzes it and blocks on the analysis view
    fn capture(&mut self, frozen: RgbImage) -> Result<()> {
        self.captures += 1;
        let analysis = self.detector.process(&frozen, &self.narrator, &mut self.report);
        log::info!(
            "Capture {}: {} region(s), {} report entr{}",
            self.captures,
            analysis.regions.len(),
            self.report.len(),
            if self.report.len() == 1 { "y" } else { "ies" }
        );
        self.surface.show_analysis(&analysis.annotated)
    }

    pub fn captures(&self) -> usize {
        self.captures
    }

    /// Releases the camera, closes windows, waits for narration and writes the report
    pub async fn shutdown(self) -> Result<bool> {
        let Session {
            source,
            mut surface,
            narrator,
            report,
            ..
        } = self;

        drop(source);
        surface.close();
        finish_report(narrator.drain().await, &report)
    }
}

/// Flushes `report` whatever the narrator's drain returned, then surfaces the
/// drain error ahead of the flush result
pub fn finish_report(drained: Result<()>, report: &ReportLog) -> Result<bool> {
    let saved = report.flush();
    drained?;
    saved
}
