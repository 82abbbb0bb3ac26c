use image::{GrayImage, RgbImage, imageops};
use imageproc::contours::{BorderType, find_contours};
use imageproc::contrast::{ThresholdType, threshold};
use imageproc::distance_transform::Norm;
use imageproc::edges::canny;
use imageproc::filter::separable_filter_equal;
use imageproc::geometry::{contour_area, convex_hull};
use imageproc::morphology::close;
use imageproc::point::Point;
use crate::config::DetectorConfig;
use crate::region::BoundingBox;

/// An outer contour with the measurements the region filter needs
#[derive(Debug, Clone)]
pub struct ContourShape {
    pub points: Vec<Point<i32>>,
    pub bbox: BoundingBox,
    pub area: f64,
    pub hull_area: f64,
}

/// Runs grayscale -> blur -> threshold -> close -> canny and returns the edge map
pub fn edge_map(frame: &RgbImage, config: &DetectorConfig) -> GrayImage {
    let gray = imageops::grayscale(frame);
    let blurred = blur(&gray, config);
    let binary = threshold(&blurred, config.threshold, ThresholdType::Binary);
    let closed = close(&binary, Norm::LInf, config.close_radius);
    canny(&closed, config.canny_low, config.canny_high)
}

/// 5x5 Gaussian smoothing, applied as two 5-tap passes
pub fn blur(gray: &GrayImage, config: &DetectorConfig) -> GrayImage {
    separable_filter_equal(gray, &config.blur_kernel)
}

/// Extracts outermost contours of an edge map, in scan order
pub fn external_contours(edges: &GrayImage) -> Vec<ContourShape> {
    find_contours::<i32>(edges)
        .into_iter()
        .filter(|contour| contour.border_type == BorderType::Outer && contour.parent.is_none())
        .filter_map(|contour| measure(contour.points))
        .collect()
}

/// Full pipeline from a color frame to measured external contours
pub fn extract_shapes(frame: &RgbImage, config: &DetectorConfig) -> Vec<ContourShape> {
    external_contours(&edge_map(frame, config))
}

fn measure(points: Vec<Point<i32>>) -> Option<ContourShape> {
    let bbox = bounding_box(&points)?;
    let area = contour_area(&points).abs();
    let hull = convex_hull(points.as_slice());
    let hull_area = if hull.len() < 3 { 0.0 } else { contour_area(&hull).abs() };
    Some(ContourShape { points, bbox, area, hull_area })
}

/// Inclusive pixel extent of a point set
pub fn bounding_box(points: &[Point<i32>]) -> Option<BoundingBox> {
    let first = points.first()?;
    let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);
    for p in points {
        min_x = min_x.min(p.x);
        min_y = min_y.min(p.y);
        max_x = max_x.max(p.x);
        max_y = max_y.max(p.y);
    }
    Some(BoundingBox::new(
        min_x.max(0) as u32,
        min_y.max(0) as u32,
        (max_x - min_x + 1) as u32,
        (max_y - min_y + 1) as u32,
    ))
}
