//! focusreel
//!
//! Records a screen as a frame sequence paired with a timestamped
//! pointer-event log, then renders a "focus" style walkthrough in which a
//! virtual camera pans and zooms toward the recorded pointer position
//! during operator-chosen intervals.
//!
//! The crate owns two cores: the concurrent recording engine
//! ([`capture::RecordingSession`]) and the virtual camera render pipeline
//! ([`render::Renderer`]). Screen capture, input subscription, and
//! container encoding are collaborator traits implemented by the embedding
//! application ([`capture::FrameSource`], [`capture::InputListener`],
//! [`capture::VideoSink`]).

pub mod capture;
pub mod config;
pub mod data;
pub mod error;
pub mod logging;
pub mod render;

pub use capture::{
    DeviceProvider, Frame, FrameSource, InputListener, RecordingSession, SessionState, VideoSink,
};
pub use config::{Config, RecorderConfig, RenderConfig};
pub use data::{EventLog, InputEvent, PointerEvent};
pub use error::{PersistError, SessionError};
pub use render::{Camera, RenderJob, Renderer, ZoomOrigin, ZoomPlanner, ZoomPoint};
