use anyhow::Result;
use chrono::Local;
use image::{GrayImage, RgbImage};
use imageproc::point::Point;
use crate::config::DetectorConfig;
use crate::narrator::Narrator;
use crate::overlay::{self, Captioner};
use crate::pipeline;
use crate::region::{CandidateRegion, RegionFilter};
use crate::report::{DetectionRecord, ReportLog, TIMESTAMP_FORMAT};

pub const DETECTED_CAPTION: &str = "Tumor Detected";
pub const CLEAR_CAPTION: &str = "No Tumor Detected";

/// Result of analyzing one frozen frame
pub struct Analysis {
    pub annotated: RgbImage,
    /// Surviving regions, in contour scan order
    pub regions: Vec<CandidateRegion>,
    /// Contour outlines matching `regions`, used for the mask
    outlines: Vec<Vec<Point<i32>>>,
}

impl Analysis {
    pub fn detected(&self) -> bool {
        !self.regions.is_empty()
    }
}

/// Fixed filter pipeline plus geometric region heuristics
pub struct Detector {
    config: DetectorConfig,
    filter: RegionFilter,
    captioner: Captioner,
}

impl Detector {
    /// Fails when a configured caption font cannot be loaded
    pub fn new(config: DetectorConfig) -> Result<Self> {
        let captioner = match config.font_path.as_deref() {
            Some(path) => Captioner::load(path)?,
            None => Captioner::bundled()?,
        };

        let filter = RegionFilter {
            min_area: config.min_area,
            min_side: config.min_side,
            max_extent: config.max_extent,
            min_solidity: config.min_solidity,
        };

        Ok(Self { config, filter, captioner })
    }

    /// Finds candidate regions in `frame` and returns an annotated copy
    pub fn analyze(&self, frame: &RgbImage) -> Analysis {
        let (width, height) = frame.dimensions();
        let mut regions = Vec::new();
        let mut outlines = Vec::new();

        for shape in pipeline::extract_shapes(frame, &self.config) {
            let verdict =
                self.filter.check(shape.area, shape.hull_area, &shape.bbox, width, height);
            if let Err(reason) = verdict {
                log::trace!("Contour at {:?} rejected: {:?}", shape.bbox, reason);
                continue;
            }
            log::debug!(
                "Contour at {:?} accepted: area {:.0}, solidity {:.2}",
                shape.bbox,
                shape.area,
                shape.area / shape.hull_area
            );
            regions.push(CandidateRegion::new(
                shape.bbox,
                shape.area,
                shape.hull_area,
                width,
                height,
                self.config.cm_per_pixel,
            ));
            outlines.push(shape.points);
        }

        let mut analysis = Analysis {
            annotated: frame.clone(),
            regions,
            outlines,
        };
        self.annotate(&mut analysis);
        analysis
    }

    fn annotate(&self, analysis: &mut Analysis) {
        let (width, height) = analysis.annotated.dimensions();
        let mut mask = GrayImage::new(width, height);

        for (region, outline) in analysis.regions.iter().zip(&analysis.outlines) {
            overlay::fill_contour(&mut mask, outline);
            overlay::draw_box(&mut analysis.annotated, &region.bbox, overlay::BOX_GREEN, 2);
        }
        overlay::blend_mask(
            &mut analysis.annotated,
            &mask,
            overlay::OVERLAY_RED,
            self.config.overlay_alpha,
        );

        let (caption, color) = if analysis.detected() {
            (DETECTED_CAPTION, overlay::DETECTED_RED)
        } else {
            (CLEAR_CAPTION, overlay::CLEAR_BLUE)
        };
        self.captioner.draw(&mut analysis.annotated, caption, 10, 30, 28.0, color);

        let timestamp = Local::now().format(TIMESTAMP_FORMAT).to_string();
        self.captioner
            .draw(&mut analysis.annotated, &timestamp, 10, 450, 16.0, overlay::TIMESTAMP_GRAY);
    }

    /// Analyzes `frame`, narrates the first region the narrator accepts and
    /// records only that one. Regions that lose the narration race are drawn
    /// but not reported.
    pub fn process(
        &self,
        frame: &RgbImage,
        narrator: &Narrator,
        report: &mut ReportLog,
    ) -> Analysis {
        let analysis = self.analyze(frame);
        announce_first(&analysis.regions, narrator, report);
        analysis
    }
}

/// Narration trigger policy: at most one record per analysis call
pub fn announce_first(
    regions: &[CandidateRegion],
    narrator: &Narrator,
    report: &mut ReportLog,
) -> Option<DetectionRecord> {
    for region in regions {
        if narrator.try_speak(region.summary()) {
            let record = DetectionRecord::from_region(region, Local::now());
            report.record(record.clone());
            return Some(record);
        }
    }
    if !regions.is_empty() {
        log::info!("Narrator busy, {} region(s) marked without a report entry", regions.len());
    }
    None
}
