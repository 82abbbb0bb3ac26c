use ab_glyph::{FontArc, PxScale};
use anyhow::{Context, Result};
use image::{GrayImage, Luma, Rgb, RgbImage};
use imageproc::drawing::{draw_hollow_rect_mut, draw_polygon_mut, draw_text_mut};
use imageproc::point::Point;
use imageproc::rect::Rect;
use std::fs;
use std::path::Path;
use crate::region::BoundingBox;

pub const MASK_ON: Luma<u8> = Luma([255]);
pub const OVERLAY_RED: Rgb<u8> = Rgb([255, 0, 0]);
pub const BOX_GREEN: Rgb<u8> = Rgb([0, 255, 0]);
pub const DETECTED_RED: Rgb<u8> = Rgb([255, 0, 0]);
pub const CLEAR_BLUE: Rgb<u8> = Rgb([0, 0, 255]);
pub const TIMESTAMP_GRAY: Rgb<u8> = Rgb([200, 200, 200]);

/// Fills the interior of a closed contour into a mask
pub fn fill_contour(mask: &mut GrayImage, points: &[Point<i32>]) {
    let mut polygon = points.to_vec();
    // draw_polygon_mut panics on an explicitly closed polygon
    while polygon.len() > 1 && polygon.first() == polygon.last() {
        polygon.pop();
    }
    if polygon.len() < 3 {
        return;
    }
    draw_polygon_mut(mask, &polygon, MASK_ON);
}

/// Draws a rectangle outline `thickness` pixels wide, growing inwards
pub fn draw_box(frame: &mut RgbImage, bbox: &BoundingBox, color: Rgb<u8>, thickness: u32) {
    for inset in 0..thickness {
        let width = bbox.width.saturating_sub(2 * inset);
        let height = bbox.height.saturating_sub(2 * inset);
        if width == 0 || height == 0 {
            break;
        }
        let rect = Rect::at((bbox.x + inset) as i32, (bbox.y + inset) as i32)
            .of_size(width, height);
        draw_hollow_rect_mut(frame, rect, color);
    }
}

/// Blends `color` into every frame pixel where the mask is set
pub fn blend_mask(frame: &mut RgbImage, mask: &GrayImage, color: Rgb<u8>, alpha: f32) {
    for (x, y, pixel) in frame.enumerate_pixels_mut() {
        if mask.get_pixel(x, y)[0] != MASK_ON[0] {
            continue;
        }
        for channel in 0..3 {
            let mixed = alpha * color[channel] as f32 + (1.0 - alpha) * pixel[channel] as f32;
            pixel[channel] = mixed.round().clamp(0.0, 255.0) as u8;
        }
    }
}

static BUNDLED_FONT: &[u8] = include_bytes!("../assets/fonts/DejaVuSans.ttf");

/// Burns text captions into frames using a TrueType font
pub struct Captioner {
    font: FontArc,
}

impl Captioner {
    /// DejaVu Sans, compiled into the binary
    pub fn bundled() -> Result<Self> {
        let font = FontArc::try_from_slice(BUNDLED_FONT).context("Failed to parse bundled font")?;
        Ok(Self { font })
    }

    pub fn load(path: &Path) -> Result<Self> {
        let bytes = fs::read(path)
            .with_context(|| format!("Failed to read font {}", path.display()))?;
        let font = FontArc::try_from_vec(bytes)
            .with_context(|| format!("Failed to parse font {}", path.display()))?;
        Ok(Self { font })
    }

    /// Draws `text` with its baseline at `baseline_y`, kept inside the frame
    pub fn draw(
        &self,
        frame: &mut RgbImage,
        text: &str,
        x: i32,
        baseline_y: i32,
        size: f32,
        color: Rgb<u8>,
    ) {
        let max_baseline = frame.height() as i32 - 4;
        let baseline = baseline_y.min(max_baseline).max(size as i32);
        let top = baseline - size as i32;
        draw_text_mut(frame, color, x, top, PxScale::from(size), &self.font, text);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blend_only_touches_masked_pixels() {
        let mut frame = RgbImage::from_pixel(4, 4, Rgb([100, 100, 100]));
        let mut mask = GrayImage::new(4, 4);
        mask.put_pixel(1, 1, MASK_ON);

        blend_mask(&mut frame, &mask, OVERLAY_RED, 0.4);

        // 0.4 * 255 + 0.6 * 100 = 162
        assert_eq!(*frame.get_pixel(1, 1), Rgb([162, 60, 60]));
        assert_eq!(*frame.get_pixel(0, 0), Rgb([100, 100, 100]));
        assert_eq!(*frame.get_pixel(3, 3), Rgb([100, 100, 100]));
    }

    #[test]
    fn test_fill_contour_accepts_closed_polygons() {
        let mut mask = GrayImage::new(20, 20);
        let square = vec![
            Point::new(2, 2),
            Point::new(12, 2),
            Point::new(12, 12),
            Point::new(2, 12),
            Point::new(2, 2),
        ];
        fill_contour(&mut mask, &square);
        assert_eq!(mask.get_pixel(7, 7)[0], 255);
        assert_eq!(mask.get_pixel(15, 15)[0], 0);
    }

    #[test]
    fn test_fill_contour_ignores_degenerate_input() {
        let mut mask = GrayImage::new(10, 10);
        fill_contour(&mut mask, &[Point::new(1, 1), Point::new(5, 5)]);
        assert!(mask.pixels().all(|p| p[0] == 0));
    }

    #[test]
    fn test_draw_box_thickness() {
        let mut frame = RgbImage::new(50, 50);
        draw_box(&mut frame, &BoundingBox::new(10, 10, 20, 20), BOX_GREEN, 2);
        assert_eq!(*frame.get_pixel(10, 10), BOX_GREEN);
        assert_eq!(*frame.get_pixel(11, 11), BOX_GREEN);
        assert_eq!(*frame.get_pixel(12, 12), Rgb([0, 0, 0]));
        assert_eq!(*frame.get_pixel(29, 29), BOX_GREEN);
        assert_eq!(*frame.get_pixel(20, 20), Rgb([0, 0, 0]));
    }

    #[test]
    fn test_bundled_captioner_draws_text() {
        let captioner = Captioner::bundled().unwrap();
        let mut frame = RgbImage::new(200, 60);
        captioner.draw(&mut frame, "Tumor Detected", 10, 40, 28.0, DETECTED_RED);
        assert!(frame.pixels().any(|p| p[0] > 128 && p[1] == 0));
    }

    #[test]
    fn test_missing_font_file_is_an_error() {
        assert!(Captioner::load(Path::new("/nonexistent/font.ttf")).is_err());
    }
}
