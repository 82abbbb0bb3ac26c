use std::fmt;

/// Axis-aligned bounding box in pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundingBox {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl BoundingBox {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }
}

/// Frame quadrant a region's bounding box origin falls into
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quadrant {
    UpperLeft,
    UpperRight,
    LowerLeft,
    LowerRight,
}

impl Quadrant {
    /// Classifies a box origin against the frame midpoints.
    /// Intervals are half-open: a coordinate equal to the midpoint belongs to the right/lower half.
    pub fn classify(x: u32, y: u32, frame_width: u32, frame_height: u32) -> Self {
        let left = x < frame_width / 2;
        let upper = y < frame_height / 2;
        match (left, upper) {
            (true, true) => Quadrant::UpperLeft,
            (false, true) => Quadrant::UpperRight,
            (true, false) => Quadrant::LowerLeft,
            (false, false) => Quadrant::LowerRight,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Quadrant::UpperLeft => "upper-left",
            Quadrant::UpperRight => "upper-right",
            Quadrant::LowerLeft => "lower-left",
            Quadrant::LowerRight => "lower-right",
        }
    }
}

impl fmt::Display for Quadrant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Why a contour was not marked as a detection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    TooSmall,
    TooNarrow,
    SpansFrame,
    EmptyHull,
    NotConvex,
}

/// Geometric acceptance rules applied to every extracted contour, in order
#[derive(Debug, Clone)]
pub struct RegionFilter {
    pub min_area: f64,
    pub min_side: u32,
    pub max_extent: f64,
    pub min_solidity: f64,
}

impl RegionFilter {
    pub fn check(
        &self,
        area: f64,
        hull_area: f64,
        bbox: &BoundingBox,
        frame_width: u32,
        frame_height: u32,
    ) -> Result<(), Rejection> {
        if area < self.min_area {
            return Err(Rejection::TooSmall);
        }
        if bbox.width < self.min_side || bbox.height < self.min_side {
            return Err(Rejection::TooNarrow);
        }
        if bbox.width as f64 > self.max_extent * frame_width as f64
            || bbox.height as f64 > self.max_extent * frame_height as f64
        {
            return Err(Rejection::SpansFrame);
        }
        if hull_area <= 0.0 {
            return Err(Rejection::EmptyHull);
        }
        if area / hull_area < self.min_solidity {
            return Err(Rejection::NotConvex);
        }
        Ok(())
    }
}

/// Rounds to one decimal place, halves away from zero
pub fn round_to_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Converts a pixel length to centimeters with a fixed scale
pub fn pixels_to_cm(pixels: u32, cm_per_pixel: f64) -> f64 {
    round_to_tenth(pixels as f64 * cm_per_pixel)
}

/// A contour that passed every filter
#[derive(Debug, Clone)]
pub struct CandidateRegion {
    pub bbox: BoundingBox,
    pub area: f64,
    pub hull_area: f64,
    pub quadrant: Quadrant,
    pub width_cm: f64,
    pub height_cm: f64,
}

impl CandidateRegion {
    pub fn new(
        bbox: BoundingBox,
        area: f64,
        hull_area: f64,
        frame_width: u32,
        frame_height: u32,
        cm_per_pixel: f64,
    ) -> Self {
        Self {
            bbox,
            area,
            hull_area,
            quadrant: Quadrant::classify(bbox.x, bbox.y, frame_width, frame_height),
            width_cm: pixels_to_cm(bbox.width, cm_per_pixel),
            height_cm: pixels_to_cm(bbox.height, cm_per_pixel),
        }
    }

    pub fn solidity(&self) -> f64 {
        self.area / self.hull_area
    }

    /// Spoken description of the region
    pub fn summary(&self) -> String {
        format!(
            "A potentially abnormal region has been identified in the {} section \
             of the scanned frame. The region spans approximately {:.1} centimeters \
             in width and {:.1} centimeters in height. Further clinical analysis is \
             recommended to confirm the findings.",
            self.quadrant, self.width_cm, self.height_cm
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filter() -> RegionFilter {
        RegionFilter {
            min_area: 1000.0,
            min_side: 20,
            max_extent: 0.9,
            min_solidity: 0.5,
        }
    }

    #[test]
    fn test_quadrant_half_open_midpoints() {
        assert_eq!(Quadrant::classify(319, 239, 640, 480), Quadrant::UpperLeft);
        assert_eq!(Quadrant::classify(320, 239, 640, 480), Quadrant::UpperRight);
        assert_eq!(Quadrant::classify(319, 240, 640, 480), Quadrant::LowerLeft);
        assert_eq!(Quadrant::classify(320, 240, 640, 480), Quadrant::LowerRight);
        assert_eq!(Quadrant::classify(0, 0, 640, 480), Quadrant::UpperLeft);
        assert_eq!(Quadrant::classify(321, 0, 640, 480), Quadrant::UpperRight);
        assert_eq!(Quadrant::classify(0, 241, 640, 480), Quadrant::LowerLeft);
        assert_eq!(Quadrant::classify(639, 479, 640, 480), Quadrant::LowerRight);
    }

    #[test]
    fn test_quadrant_labels() {
        assert_eq!(Quadrant::UpperLeft.to_string(), "upper-left");
        assert_eq!(Quadrant::UpperRight.to_string(), "upper-right");
        assert_eq!(Quadrant::LowerLeft.to_string(), "lower-left");
        assert_eq!(Quadrant::LowerRight.to_string(), "lower-right");
    }

    #[test]
    fn test_centimeter_rounding() {
        assert_eq!(pixels_to_cm(100, 0.0264), 2.6); // 2.64
        assert_eq!(pixels_to_cm(55, 0.0264), 1.5); // 1.452
        assert_eq!(pixels_to_cm(54, 0.0264), 1.4); // 1.4256
        assert_eq!(pixels_to_cm(1, 0.0264), 0.0); // 0.0264
        assert_eq!(pixels_to_cm(2, 0.0264), 0.1); // 0.0528
    }

    #[test]
    fn test_round_to_tenth_at_half_boundaries() {
        assert_eq!(round_to_tenth(2.45), 2.5);
        assert_eq!(round_to_tenth(0.05), 0.1);
        assert_eq!(round_to_tenth(2.449), 2.4);
        assert_eq!(round_to_tenth(2.451), 2.5);
    }

    #[test]
    fn test_filter_rejects_small_area() {
        let bbox = BoundingBox::new(10, 10, 40, 40);
        assert_eq!(filter().check(999.9, 1000.0, &bbox, 640, 480), Err(Rejection::TooSmall));
        assert!(filter().check(1000.0, 1000.0, &bbox, 640, 480).is_ok());
    }

    #[test]
    fn test_filter_rejects_narrow_boxes() {
        let narrow = BoundingBox::new(10, 10, 19, 200);
        let short = BoundingBox::new(10, 10, 200, 19);
        assert_eq!(filter().check(3000.0, 3000.0, &narrow, 640, 480), Err(Rejection::TooNarrow));
        assert_eq!(filter().check(3000.0, 3000.0, &short, 640, 480), Err(Rejection::TooNarrow));
        let minimal = BoundingBox::new(10, 10, 20, 20);
        assert!(filter().check(1000.0, 1000.0, &minimal, 640, 480).is_ok());
    }

    #[test]
    fn test_filter_rejects_frame_spanning_boxes() {
        // 0.9 * 640 = 576, 0.9 * 480 = 432
        let wide = BoundingBox::new(0, 0, 577, 100);
        let tall = BoundingBox::new(0, 0, 100, 433);
        assert_eq!(filter().check(5000.0, 5000.0, &wide, 640, 480), Err(Rejection::SpansFrame));
        assert_eq!(filter().check(5000.0, 5000.0, &tall, 640, 480), Err(Rejection::SpansFrame));
        let limit = BoundingBox::new(0, 0, 576, 432);
        assert!(filter().check(5000.0, 5000.0, &limit, 640, 480).is_ok());
    }

    #[test]
    fn test_filter_solidity() {
        let bbox = BoundingBox::new(10, 10, 100, 100);
        assert_eq!(filter().check(2000.0, 0.0, &bbox, 640, 480), Err(Rejection::EmptyHull));
        assert_eq!(filter().check(2000.0, 4001.0, &bbox, 640, 480), Err(Rejection::NotConvex));
        assert!(filter().check(2000.0, 4000.0, &bbox, 640, 480).is_ok());
    }

    #[test]
    fn test_candidate_region_summary() {
        let bbox = BoundingBox::new(400, 300, 100, 55);
        let region = CandidateRegion::new(bbox, 5000.0, 5200.0, 640, 480, 0.0264);
        assert_eq!(region.quadrant, Quadrant::LowerRight);
        assert_eq!(region.width_cm, 2.6);
        assert_eq!(region.height_cm, 1.5);
        let summary = region.summary();
        assert!(summary.contains("lower-right section"));
        assert!(summary.contains("2.6 centimeters in width"));
        assert!(summary.contains("1.5 centimeters in height"));
    }
}
