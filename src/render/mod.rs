//! Virtual camera render pipeline.
//!
//! Turns a sparse set of zoom intervals plus the recorded pointer
//! timeline into a smoothly interpolated per-frame crop/zoom transform
//! over the raw frame sequence.

mod camera;
mod planner;
mod renderer;

pub use camera::Camera;
pub use planner::{ZoomOrigin, ZoomPlanner, ZoomPoint};
pub use renderer::{RenderJob, Renderer};
