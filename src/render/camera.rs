//! The virtual camera that pans and zooms over recorded frames.

use image::imageops::{self, FilterType};
use tracing::warn;

use crate::capture::Frame;

/// Virtual viewport with exponentially smoothed position and zoom.
///
/// One camera instance is owned by each render job; state changes only
/// through [`set_target`](Camera::set_target) and
/// [`update`](Camera::update). Convergence toward the target is
/// geometric: the residual error after `n` updates is
/// `error * (1 - smoothing)^n`.
pub struct Camera {
    frame_width: f64,
    frame_height: f64,
    smoothing: f64,
    x: f64,
    y: f64,
    zoom: f64,
    target_x: f64,
    target_y: f64,
    target_zoom: f64,
}

impl Camera {
    /// A camera centered on a frame of the given size, at 1.0 zoom.
    pub fn new(frame_width: u32, frame_height: u32, smoothing: f64) -> Self {
        let cx = frame_width as f64 / 2.0;
        let cy = frame_height as f64 / 2.0;
        Self {
            frame_width: frame_width as f64,
            frame_height: frame_height as f64,
            smoothing,
            x: cx,
            y: cy,
            zoom: 1.0,
            target_x: cx,
            target_y: cy,
            target_zoom: 1.0,
        }
    }

    pub fn x(&self) -> f64 {
        self.x
    }

    pub fn y(&self) -> f64 {
        self.y
    }

    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    /// Set the target the camera drifts toward. The position is clamped
    /// to the frame bounds and zoom to `[1.0, inf)`.
    pub fn set_target(&mut self, x: f64, y: f64, zoom: f64) {
        self.target_x = x.clamp(0.0, self.frame_width);
        self.target_y = y.clamp(0.0, self.frame_height);
        self.target_zoom = zoom.max(1.0);
    }

    /// Advance one step toward the target. Called once per rendered
    /// frame, so motion depends on frame cadence, not wall clock.
    pub fn update(&mut self) {
        self.x += (self.target_x - self.x) * self.smoothing;
        self.y += (self.target_y - self.y) * self.smoothing;
        self.zoom += (self.target_zoom - self.zoom) * self.smoothing;
    }

    /// Crop the frame around the camera position, scaled by the current
    /// zoom, and resample back to the full frame size.
    ///
    /// The crop window is clamped to lie entirely within the frame. A
    /// degenerate window (zero area after rounding) falls back to the
    /// unmodified frame.
    pub fn process_frame(&self, frame: &Frame) -> Frame {
        let (w, h) = frame.dimensions();

        let crop_w = ((w as f64 / self.zoom) as u32).min(w);
        let crop_h = ((h as f64 / self.zoom) as u32).min(h);

        if crop_w == 0 || crop_h == 0 {
            warn!(zoom = self.zoom, "degenerate crop window, passing frame through");
            return frame.clone();
        }
        if crop_w == w && crop_h == h {
            // Identity transform; skip the resample.
            return frame.clone();
        }

        let crop_x = (self.x - crop_w as f64 / 2.0).clamp(0.0, (w - crop_w) as f64) as u32;
        let crop_y = (self.y - crop_h as f64 / 2.0).clamp(0.0, (h - crop_h) as f64) as u32;

        let cropped = imageops::crop_imm(frame, crop_x, crop_y, crop_w, crop_h).to_image();
        imageops::resize(&cropped, w, h, FilterType::Lanczos3)
    }

    #[cfg(test)]
    pub(crate) fn crop_window(&self, w: u32, h: u32) -> (u32, u32, u32, u32) {
        let crop_w = ((w as f64 / self.zoom) as u32).min(w);
        let crop_h = ((h as f64 / self.zoom) as u32).min(h);
        let crop_x = (self.x - crop_w as f64 / 2.0).clamp(0.0, (w - crop_w) as f64) as u32;
        let crop_y = (self.y - crop_h as f64 / 2.0).clamp(0.0, (h - crop_h) as f64) as u32;
        (crop_x, crop_y, crop_w, crop_h)
    }
}
