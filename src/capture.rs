//! Screen capture frame source.
//!
//! Shell-side collaborator, deliberately thin: the core pipeline only sees
//! the [`FrameSource`] trait. Frames are decimated by pixel stride to the
//! configured sample grid, since palette reduction does not need every pixel
//! of a 4K display.

use tracing::warn;

use crate::pipeline::{Frame, FrameSource};
use crate::quantizer::Color;

/// Captures the primary monitor on demand.
pub struct ScreenSource {
    monitor: xcap::Monitor,
    sample_width: u32,
    sample_height: u32,
}

impl ScreenSource {
    /// Pick the primary monitor, falling back to the first one found.
    pub fn new(sample_width: u32, sample_height: u32) -> Result<Self, String> {
        let monitors =
            xcap::Monitor::all().map_err(|e| format!("failed to enumerate monitors: {e}"))?;
        let monitor = monitors
            .into_iter()
            .find(|m| m.is_primary())
            .or_else(|| xcap::Monitor::all().ok()?.into_iter().next())
            .ok_or_else(|| "no monitors found".to_string())?;
        Ok(Self {
            monitor,
            sample_width: sample_width.max(1),
            sample_height: sample_height.max(1),
        })
    }

    fn capture(&self) -> Result<Frame, String> {
        let image = self
            .monitor
            .capture_image()
            .map_err(|e| format!("screen capture failed: {e}"))?;

        let (width, height) = (image.width(), image.height());
        if width == 0 || height == 0 {
            return Ok(Frame::empty());
        }
        let raw = image.as_raw(); // RGBA, row-major

        let step_x = (width / self.sample_width).max(1);
        let step_y = (height / self.sample_height).max(1);
        let cols = width.div_ceil(step_x);
        let rows = height.div_ceil(step_y);

        let mut pixels = Vec::with_capacity((cols * rows) as usize);
        let mut y = 0;
        while y < height {
            let mut x = 0;
            while x < width {
                let offset = ((y * width + x) * 4) as usize;
                pixels.push(Color::new(
                    raw[offset],
                    raw[offset + 1],
                    raw[offset + 2],
                    255,
                ));
                x += step_x;
            }
            y += step_y;
        }

        Ok(Frame::new(cols, rows, pixels))
    }
}

impl FrameSource for ScreenSource {
    /// A capture failure skips the tick (empty frame) rather than ending the
    /// stream; the next tick tries again.
    fn next_frame(&mut self) -> Option<Frame> {
        match self.capture() {
            Ok(frame) => Some(frame),
            Err(e) => {
                warn!("{e}");
                Some(Frame::empty())
            }
        }
    }
}
