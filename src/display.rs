use anyhow::Result;
use image::RgbImage;
use usls::{Image, Key, Viewer};

/// Keys the session reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyPress {
    Capture,
    Quit,
    Other,
}

impl From<Key> for KeyPress {
    fn from(key: Key) -> Self {
        match key {
            Key::C => KeyPress::Capture,
            Key::Q => KeyPress::Quit,
            _ => KeyPress::Other,
        }
    }
}

/// Display and keyboard surface driven by the session loop
pub trait Surface {
    /// Shows a live frame. Returns false once the live window was closed.
    fn show_live(&mut self, frame: &RgbImage) -> Result<bool>;

    /// Polls the keyboard, waiting at most a millisecond
    fn poll_key(&mut self) -> Option<KeyPress>;

    /// Shows an analyzed frame in its own window. Blocks until a key is
    /// pressed or the window is closed.
    fn show_analysis(&mut self, frame: &RgbImage) -> Result<()>;

    /// Closes every window
    fn close(&mut self);
}

/// Windows backed by `usls::Viewer`: one live feed, one per analysis
pub struct ViewerSurface {
    live: Option<Viewer<'static>>,
}

impl ViewerSurface {
    pub fn new() -> Self {
        Self {
            live: Some(Viewer::default()),
        }
    }
}

impl Default for ViewerSurface {
    fn default() -> Self {
        Self::new()
    }
}

impl Surface for ViewerSurface {
    fn show_live(&mut self, frame: &RgbImage) -> Result<bool> {
        let Some(viewer) = self.live.as_mut() else {
            return Ok(false);
        };
        if viewer.is_window_exist() && !viewer.is_window_open() {
            return Ok(false);
        }
        viewer.imshow(&Image::from(frame.clone()))?;
        Ok(true)
    }

    fn poll_key(&mut self) -> Option<KeyPress> {
        let viewer = self.live.as_mut()?;
        viewer.wait_key(1).map(KeyPress::from)
    }

    fn show_analysis(&mut self, frame: &RgbImage) -> Result<()> {
        // dropping the viewer closes its window
        let mut viewer = Viewer::default();
        viewer.imshow(&Image::from(frame.clone()))?;
        loop {
            if viewer.wait_key(30).is_some() {
                break;
            }
            if viewer.is_window_exist() && !viewer.is_window_open() {
                break;
            }
        }
        Ok(())
    }

    fn close(&mut self) {
        self.live = None;
    }
}
