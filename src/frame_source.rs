use anyhow::{Context, Result, bail};
use image::{Rgb, RgbImage};
use imageproc::drawing::draw_filled_circle_mut;
use std::fs;
use std::path::{Path, PathBuf};
use crate::config::SessionConfig;

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp"];

/// Produces frames on demand. An error ends the session.
pub trait FrameSource {
    fn next_frame(&mut self) -> Result<RgbImage>;

    fn describe(&self) -> String;
}

/// Opens the source named by `config.source`
pub fn open_source(config: &SessionConfig) -> Result<Box<dyn FrameSource>> {
    let source = config.source.as_str();
    if let Some(name) = source.strip_prefix("stub://") {
        return Ok(Box::new(SyntheticSource::new(name, config.width, config.height)));
    }

    let path = Path::new(source);
    if source.starts_with("/dev/video") {
        return open_camera(path, config);
    }
    if path.exists() {
        return Ok(Box::new(ImageReplaySource::open(path)?));
    }
    bail!("unknown frame source: {}", source)
}

#[cfg(feature = "camera-v4l2")]
fn open_camera(path: &Path, config: &SessionConfig) -> Result<Box<dyn FrameSource>> {
    let mut camera = crate::camera::V4l2Camera::new(path, config.width, config.height);
    camera.connect()?;
    Ok(Box::new(camera))
}

#[cfg(not(feature = "camera-v4l2"))]
fn open_camera(path: &Path, _config: &SessionConfig) -> Result<Box<dyn FrameSource>> {
    bail!(
        "cannot open {}: built without camera support (enable the camera-v4l2 feature)",
        path.display()
    )
}

/// Sorted image files of a directory, or the file itself
pub fn image_paths(path: &Path) -> Result<Vec<PathBuf>> {
    if path.is_file() {
        return Ok(vec![path.to_path_buf()]);
    }
    let mut paths = Vec::new();
    for entry in fs::read_dir(path).with_context(|| format!("Failed to read {}", path.display()))? {
        let entry_path = entry?.path();
        let is_image = entry_path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()));
        if is_image {
            paths.push(entry_path);
        }
    }
    paths.sort();
    Ok(paths)
}

/// Plays back image files in path order, then reports the feed as ended
pub struct ImageReplaySource {
    paths: Vec<PathBuf>,
    next: usize,
}

impl ImageReplaySource {
    pub fn open(path: &Path) -> Result<Self> {
        let paths = image_paths(path)?;
        if paths.is_empty() {
            bail!("no images found in {}", path.display());
        }
        Ok(Self { paths, next: 0 })
    }
}

impl FrameSource for ImageReplaySource {
    fn next_frame(&mut self) -> Result<RgbImage> {
        let Some(path) = self.paths.get(self.next) else {
            bail!("image sequence exhausted after {} frames", self.paths.len());
        };
        self.next += 1;
        let frame = image::open(path)
            .with_context(|| format!("Failed to decode {}", path.display()))?
            .to_rgb8();
        Ok(frame)
    }

    fn describe(&self) -> String {
        format!("{} image(s)", self.paths.len())
    }
}

/// Generated frames for demos and tests: a dark field with a bright disc
/// that moves to the next quadrant every `frames_per_position` frames.
pub struct SyntheticSource {
    name: String,
    width: u32,
    height: u32,
    frame_count: u64,
    frames_per_position: u64,
    /// Number of frames to produce before failing, if limited
    limit: Option<u64>,
}

impl SyntheticSource {
    pub fn new(name: &str, width: u32, height: u32) -> Self {
        Self {
            name: name.to_string(),
            width,
            height,
            frame_count: 0,
            frames_per_position: 30,
            limit: None,
        }
    }

    pub fn with_limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    fn disc_center(&self) -> (i32, i32) {
        let quadrant = (self.frame_count / self.frames_per_position) % 4;
        let (w, h) = (self.width as i32, self.height as i32);
        match quadrant {
            0 => (w / 4, h / 4),
            1 => (3 * w / 4, h / 4),
            2 => (w / 4, 3 * h / 4),
            _ => (3 * w / 4, 3 * h / 4),
        }
    }
}

impl FrameSource for SyntheticSource {
    fn next_frame(&mut self) -> Result<RgbImage> {
        if self.limit.is_some_and(|limit| self.frame_count >= limit) {
            bail!("synthetic source {} stopped after {} frames", self.name, self.frame_count);
        }
        let mut frame = RgbImage::from_pixel(self.width, self.height, Rgb([25, 20, 20]));
        let radius = (self.width.min(self.height) / 10).max(1) as i32;
        draw_filled_circle_mut(&mut frame, self.disc_center(), radius, Rgb([235, 225, 225]));
        self.frame_count += 1;
        Ok(frame)
    }

    fn describe(&self) -> String {
        format!("stub://{} ({}x{})", self.name, self.width, self.height)
    }
}

/// Converts packed YUYV 4:2:2 (BT.601) to RGB
pub fn yuyv_to_rgb(data: &[u8], width: u32, height: u32) -> Result<RgbImage> {
    let expected = (width * height * 2) as usize;
    if data.len() < expected {
        bail!("YUYV buffer too short: {} bytes for {}x{}", data.len(), width, height);
    }

    let mut rgb = Vec::with_capacity((width * height * 3) as usize);
    for chunk in data[..expected].chunks_exact(4) {
        let (y0, y1) = (chunk[0] as f32, chunk[2] as f32);
        let (u, v) = (chunk[1] as f32 - 128.0, chunk[3] as f32 - 128.0);
        for y in [y0, y1] {
            rgb.push((y + 1.402 * v).round().clamp(0.0, 255.0) as u8);
            rgb.push((y - 0.344_136 * u - 0.714_136 * v).round().clamp(0.0, 255.0) as u8);
            rgb.push((y + 1.772 * u).round().clamp(0.0, 255.0) as u8);
        }
    }

    RgbImage::from_raw(width, height, rgb).context("YUYV frame size mismatch")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stub_config(source: &str) -> SessionConfig {
        SessionConfig {
            source: source.to_string(),
            width: 640,
            height: 480,
            report_path: PathBuf::from("report.txt"),
            still: None,
            output_dir: PathBuf::from("./runs"),
        }
    }

    #[test]
    fn test_synthetic_source_produces_frames() {
        let mut source = open_source(&stub_config("stub://test")).unwrap();
        let frame = source.next_frame().unwrap();
        assert_eq!(frame.dimensions(), (640, 480));
        // disc starts in the upper-left quadrant
        assert_eq!(frame.get_pixel(160, 120)[0], 235);
        assert_eq!(frame.get_pixel(480, 360)[0], 25);
    }

    #[test]
    fn test_synthetic_source_limit() {
        let mut source = SyntheticSource::new("limited", 64, 48).with_limit(2);
        assert!(source.next_frame().is_ok());
        assert!(source.next_frame().is_ok());
        assert!(source.next_frame().is_err());
    }

    #[test]
    fn test_unknown_source_rejected() {
        assert!(open_source(&stub_config("/no/such/thing.png")).is_err());
    }

    #[test]
    fn test_replay_source_reads_sorted_images_then_ends() {
        let dir = tempfile::tempdir().unwrap();
        RgbImage::from_pixel(8, 8, Rgb([200, 0, 0])).save(dir.path().join("b.png")).unwrap();
        RgbImage::from_pixel(8, 8, Rgb([0, 200, 0])).save(dir.path().join("a.png")).unwrap();
        fs::write(dir.path().join("notes.txt"), "not an image").unwrap();

        let mut source = ImageReplaySource::open(dir.path()).unwrap();
        assert_eq!(source.next_frame().unwrap().get_pixel(0, 0), &Rgb([0, 200, 0]));
        assert_eq!(source.next_frame().unwrap().get_pixel(0, 0), &Rgb([200, 0, 0]));
        assert!(source.next_frame().is_err());
    }

    #[test]
    fn test_yuyv_gray_and_short_buffer() {
        // Y=128, U=V=128 is mid gray
        let data = [128u8, 128, 128, 128];
        let rgb = yuyv_to_rgb(&data, 2, 1).unwrap();
        assert_eq!(rgb.get_pixel(0, 0), &Rgb([128, 128, 128]));
        assert_eq!(rgb.get_pixel(1, 0), &Rgb([128, 128, 128]));

        assert!(yuyv_to_rgb(&data[..2], 2, 1).is_err());
    }
}
