//! Drives the camera across a full frame sequence.

use anyhow::Result;
use tracing::{debug, info};

use crate::capture::{Frame, VideoSink};
use crate::config::RenderConfig;
use crate::data::InputEvent;

use super::camera::Camera;
use super::planner::ZoomPlanner;

/// Renders the final frame sequence from raw frames, planned zoom
/// intervals, and the recorded pointer timeline.
///
/// Inside a zoom interval the camera targets the most recent pointer
/// position at the configured zoom level; outside it drifts back to the
/// frame center at 1.0.
pub struct Renderer {
    config: RenderConfig,
    frame_rate: f64,
}

impl Renderer {
    pub fn new(config: RenderConfig, frame_rate: f64) -> Self {
        Self { config, frame_rate }
    }

    /// Lazy per-frame pipeline over `frames`. Frames are transformed in
    /// order as the job is consumed.
    pub fn job<'a>(
        &'a self,
        frames: &'a [Frame],
        planner: &'a ZoomPlanner,
        events: &'a [InputEvent],
    ) -> RenderJob<'a> {
        let (width, height) = frames
            .first()
            .map(|f| f.dimensions())
            .unwrap_or((0, 0));
        RenderJob {
            frames: frames.iter(),
            index: 0,
            total: frames.len(),
            camera: Camera::new(width, height, self.config.smoothing),
            planner,
            events,
            config: &self.config,
            frame_rate: self.frame_rate,
            width,
            height,
        }
    }

    /// Render the full sequence into memory.
    pub fn render(
        &self,
        frames: &[Frame],
        planner: &ZoomPlanner,
        events: &[InputEvent],
    ) -> Vec<Frame> {
        self.render_with_progress(frames, planner, events, |_, _| {})
    }

    /// Render the full sequence, reporting `(frames_done, total)` at a
    /// bounded interval. Progress indices are monotonically increasing;
    /// how they are displayed is the caller's business.
    pub fn render_with_progress(
        &self,
        frames: &[Frame],
        planner: &ZoomPlanner,
        events: &[InputEvent],
        mut progress: impl FnMut(usize, usize),
    ) -> Vec<Frame> {
        let total = frames.len();
        info!(
            total,
            zoom_points = planner.len(),
            "rendering frame sequence"
        );

        let mut output = Vec::with_capacity(total);
        for (done, frame) in self.job(frames, planner, events).enumerate() {
            output.push(frame);
            if (done + 1) % self.config.progress_interval.max(1) == 0 || done + 1 == total {
                progress(done + 1, total);
            }
        }

        debug!(total, "render complete");
        output
    }

    /// Render the full sequence straight into a video sink, finalizing
    /// it on success.
    pub fn render_to_sink(
        &self,
        frames: &[Frame],
        planner: &ZoomPlanner,
        events: &[InputEvent],
        sink: &mut dyn VideoSink,
        mut progress: impl FnMut(usize, usize),
    ) -> Result<()> {
        let total = frames.len();
        for (done, frame) in self.job(frames, planner, events).enumerate() {
            sink.write(&frame)?;
            if (done + 1) % self.config.progress_interval.max(1) == 0 || done + 1 == total {
                progress(done + 1, total);
            }
        }
        sink.finalize()
    }
}

/// Ephemeral lazily evaluated render pipeline; one output frame per
/// input frame, in order.
pub struct RenderJob<'a> {
    frames: std::slice::Iter<'a, Frame>,
    index: usize,
    total: usize,
    camera: Camera,
    planner: &'a ZoomPlanner,
    events: &'a [InputEvent],
    config: &'a RenderConfig,
    frame_rate: f64,
    width: u32,
    height: u32,
}

impl RenderJob<'_> {
    /// `(frames_produced, total)`.
    pub fn progress(&self) -> (usize, usize) {
        (self.index, self.total)
    }
}

impl Iterator for RenderJob<'_> {
    type Item = Frame;

    fn next(&mut self) -> Option<Self::Item> {
        let frame = self.frames.next()?;
        let t = self.index as f64 / self.frame_rate;

        let (x, y, zoom) = zoom_target(
            t,
            self.planner,
            self.events,
            self.width,
            self.height,
            self.config,
        );
        self.camera.set_target(x, y, zoom);
        self.camera.update();

        self.index += 1;
        Some(self.camera.process_frame(frame))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.frames.size_hint()
    }
}

/// Camera target for time `t`: the most recent pointer position at the
/// configured zoom level while inside a zoom interval, otherwise the
/// frame center at 1.0.
fn zoom_target(
    t: f64,
    planner: &ZoomPlanner,
    events: &[InputEvent],
    width: u32,
    height: u32,
    config: &RenderConfig,
) -> (f64, f64, f64) {
    let center_x = width as f64 / 2.0;
    let center_y = height as f64 / 2.0;

    let in_zoom = planner
        .points()
        .iter()
        .any(|p| p.time <= t && t < p.time + config.zoom_duration);
    if !in_zoom {
        return (center_x, center_y, 1.0);
    }

    match pointer_at(events, t) {
        Some((x, y)) => (x as f64, y as f64, config.zoom_level),
        None => (center_x, center_y, config.zoom_level),
    }
}

/// Most recent pointer move at or before `t`.
fn pointer_at(events: &[InputEvent], t: f64) -> Option<(i32, i32)> {
    events.iter().rev().find_map(|event| match event {
        InputEvent::Move { time, x, y } if *time <= t => Some((*x, *y)),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn test_config() -> RenderConfig {
        RenderConfig::default()
    }

    fn moves(points: &[(f64, i32, i32)]) -> Vec<InputEvent> {
        points
            .iter()
            .map(|&(time, x, y)| InputEvent::Move { time, x, y })
            .collect()
    }

    #[test]
    fn test_pointer_lookup_takes_most_recent_move() {
        let events = moves(&[(1.0, 10, 10), (2.0, 20, 20), (5.0, 50, 50)]);
        assert_eq!(pointer_at(&events, 3.0), Some((20, 20)));
        assert_eq!(pointer_at(&events, 0.5), None);
        assert_eq!(pointer_at(&events, 5.0), Some((50, 50)));
    }

    #[test]
    fn test_zoom_target_follows_pointer_inside_interval() {
        let mut planner = ZoomPlanner::new();
        planner.add(10.0);
        let events = moves(&[(9.8, 500, 300)]);
        let config = test_config();

        // Inside the interval: pointer position at the zoom level.
        let (x, y, zoom) = zoom_target(10.1, &planner, &events, 1920, 1080, &config);
        assert_eq!((x, y), (500.0, 300.0));
        assert_eq!(zoom, 2.0);

        // Past the interval end: back to center at 1.0.
        let (x, y, zoom) = zoom_target(13.0, &planner, &events, 1920, 1080, &config);
        assert_eq!((x, y), (960.0, 540.0));
        assert_eq!(zoom, 1.0);
    }

    #[test]
    fn test_zoom_target_falls_back_to_center_without_moves() {
        let mut planner = ZoomPlanner::new();
        planner.add(0.0);
        let config = test_config();
        let (x, y, zoom) = zoom_target(0.5, &planner, &[], 640, 480, &config);
        assert_eq!((x, y, zoom), (320.0, 240.0, 2.0));
    }

    #[test]
    fn test_render_produces_one_output_per_input() {
        let frames: Vec<Frame> = (0..12)
            .map(|i| Frame::from_pixel(64, 36, Rgba([i as u8, 0, 0, 255])))
            .collect();
        let mut planner = ZoomPlanner::new();
        planner.add(0.1);
        let events = moves(&[(0.0, 16, 9)]);

        let renderer = Renderer::new(test_config(), 30.0);
        let output = renderer.render(&frames, &planner, &events);
        assert_eq!(output.len(), frames.len());
        for frame in &output {
            assert_eq!(frame.dimensions(), (64, 36));
        }
    }

    #[test]
    fn test_progress_is_monotonic_and_bounded() {
        let frames: Vec<Frame> = (0..17)
            .map(|_| Frame::from_pixel(32, 18, Rgba([0, 0, 0, 255])))
            .collect();
        let planner = ZoomPlanner::new();
        let renderer = Renderer::new(test_config(), 30.0);

        let mut reports = Vec::new();
        renderer.render_with_progress(&frames, &planner, &[], |done, total| {
            reports.push((done, total));
        });

        assert!(!reports.is_empty());
        for pair in reports.windows(2) {
            assert!(pair[1].0 > pair[0].0);
        }
        assert_eq!(reports.last().unwrap(), &(17, 17));
        // Bounded interval: no more reports than frames / interval + final.
        assert!(reports.len() <= 17 / 5 + 1);
    }

    #[test]
    fn test_render_without_zoom_points_is_identity() {
        let frames: Vec<Frame> = (0..3)
            .map(|i| Frame::from_pixel(48, 27, Rgba([i as u8 * 40, 10, 20, 255])))
            .collect();
        let planner = ZoomPlanner::new();
        let renderer = Renderer::new(test_config(), 30.0);
        let output = renderer.render(&frames, &planner, &[]);
        // Camera starts centered at zoom 1.0 and is never given another
        // target, so every frame passes through untouched.
        assert_eq!(output, frames);
    }

    #[test]
    fn test_render_to_sink_writes_and_finalizes() {
        struct CountingSink {
            written: usize,
            finalized: bool,
        }
        impl VideoSink for CountingSink {
            fn write(&mut self, _frame: &Frame) -> Result<()> {
                self.written += 1;
                Ok(())
            }
            fn finalize(&mut self) -> Result<()> {
                self.finalized = true;
                Ok(())
            }
        }

        let frames: Vec<Frame> = (0..4)
            .map(|_| Frame::from_pixel(16, 9, Rgba([1, 2, 3, 255])))
            .collect();
        let planner = ZoomPlanner::new();
        let renderer = Renderer::new(test_config(), 30.0);

        let mut sink = CountingSink {
            written: 0,
            finalized: false,
        };
        renderer
            .render_to_sink(&frames, &planner, &[], &mut sink, |_, _| {})
            .unwrap();
        assert_eq!(sink.written, 4);
        assert!(sink.finalized);
    }
}
