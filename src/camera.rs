//! V4L2 camera capture.
//!
//! Opens a local device node (`/dev/video0` is device index 0), asks for
//! packed RGB and falls back to YUYV, which is converted on capture.

use anyhow::{Context, Result, bail};
use image::RgbImage;
use ouroboros::self_referencing;
use std::path::{Path, PathBuf};
use crate::frame_source::{FrameSource, yuyv_to_rgb};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PixelLayout {
    Rgb,
    Yuyv,
}

#[self_referencing]
struct CameraStream {
    device: v4l::Device,
    #[borrows(mut device)]
    #[covariant]
    stream: v4l::prelude::MmapStream<'this, v4l::Device>,
}

pub struct V4l2Camera {
    path: PathBuf,
    width: u32,
    height: u32,
    layout: PixelLayout,
    state: Option<CameraStream>,
    frames_captured: u64,
}

impl V4l2Camera {
    pub fn new(path: &Path, width: u32, height: u32) -> Self {
        Self {
            path: path.to_path_buf(),
            width,
            height,
            layout: PixelLayout::Rgb,
            state: None,
            frames_captured: 0,
        }
    }

    /// Opens the device and starts a memory-mapped capture stream
    pub fn connect(&mut self) -> Result<()> {
        use v4l::buffer::Type;
        use v4l::video::Capture;

        let device = v4l::Device::with_path(&self.path)
            .with_context(|| format!("Failed to open camera {}", self.path.display()))?;

        let mut format = device.format().context("Failed to read camera format")?;
        format.width = self.width;
        format.height = self.height;
        format.fourcc = v4l::FourCC::new(b"RGB3");
        let mut format = device.set_format(&format).context("Failed to set camera format")?;

        if format.fourcc != v4l::FourCC::new(b"RGB3") {
            format.fourcc = v4l::FourCC::new(b"YUYV");
            format = device.set_format(&format).context("Failed to set camera format")?;
        }
        self.layout = if format.fourcc == v4l::FourCC::new(b"RGB3") {
            PixelLayout::Rgb
        } else if format.fourcc == v4l::FourCC::new(b"YUYV") {
            PixelLayout::Yuyv
        } else {
            bail!(
                "camera {} offers neither RGB3 nor YUYV (got {})",
                self.path.display(),
                format.fourcc
            );
        };
        self.width = format.width;
        self.height = format.height;

        let state = CameraStreamTryBuilder {
            device,
            stream_builder: |device| {
                v4l::prelude::MmapStream::with_buffers(device, Type::VideoCapture, 4)
                    .map_err(|err| anyhow::Error::new(err).context("Failed to start camera stream"))
            },
        }
        .try_build()?;
        self.state = Some(state);

        log::info!(
            "Camera {} connected ({}x{}, {:?})",
            self.path.display(),
            self.width,
            self.height,
            self.layout
        );
        Ok(())
    }
}

impl FrameSource for V4l2Camera {
    fn next_frame(&mut self) -> Result<RgbImage> {
        use v4l::io::traits::CaptureStream;

        let state = self.state.as_mut().context("camera not connected")?;
        let (width, height, layout) = (self.width, self.height, self.layout);
        let frame = state.with_stream_mut(|stream| -> Result<RgbImage> {
            let (buf, _meta) = stream.next().context("Failed to capture camera frame")?;
            match layout {
                PixelLayout::Rgb => RgbImage::from_raw(width, height, buf.to_vec())
                    .context("camera frame size mismatch"),
                PixelLayout::Yuyv => yuyv_to_rgb(buf, width, height),
            }
        })?;

        self.frames_captured += 1;
        Ok(frame)
    }

    fn describe(&self) -> String {
        format!("{} ({}x{})", self.path.display(), self.width, self.height)
    }
}

impl Drop for V4l2Camera {
    fn drop(&mut self) {
        if self.state.take().is_some() {
            log::info!(
                "Camera {} released after {} frames",
                self.path.display(),
                self.frames_captured
            );
        }
    }
}
