//! Recording engine and collaborator trait seams.
//!
//! The session core is platform-agnostic: the OS screen-capture API, the
//! container encoder, and the input-event subscription are supplied by
//! the embedding application through the traits below. Trait methods
//! return `anyhow::Result` at the seam; the session converts failures
//! into its typed error surface.

mod session;

use std::sync::mpsc;

use anyhow::Result;

use crate::data::PointerEvent;

pub use session::{RecordingSession, SessionState};

/// A captured frame: RGBA pixels at the capture resolution. The channel
/// order handed to a [`VideoSink`] is fixed; converting it for a specific
/// container is the sink's business.
pub type Frame = image::RgbaImage;

/// Yields the most recent captured frame on demand.
///
/// Dropping the source releases the underlying capture device.
pub trait FrameSource: Send {
    /// Capture resolution in pixels.
    fn resolution(&self) -> (u32, u32);

    /// The latest available frame, or `None` if no new frame is ready.
    /// Transient misses are expected and tolerated by the caller.
    fn latest_frame(&mut self) -> Option<Frame>;
}

/// Accepts frames in arrival order and finalizes a playable container.
pub trait VideoSink: Send {
    /// Append one frame to the container.
    fn write(&mut self, frame: &Frame) -> Result<()>;

    /// Flush and close the container so it is playable.
    fn finalize(&mut self) -> Result<()>;
}

/// Delivers asynchronous pointer move/press/release notifications.
pub trait InputListener: Send {
    /// Start delivering notifications to `tx`. Delivery runs on the
    /// listener's own thread until [`unsubscribe`](Self::unsubscribe).
    fn subscribe(&mut self, tx: mpsc::Sender<PointerEvent>) -> Result<()>;

    /// Stop delivering notifications. Idempotent.
    fn unsubscribe(&mut self);
}

/// Opens capture devices for a recording session.
///
/// Acquisition is separated from the session so `start()` can open both
/// handles, release partial acquisitions on failure, and size the sink to
/// the capture resolution.
pub trait DeviceProvider: Send {
    fn open_frame_source(&mut self) -> Result<Box<dyn FrameSource>>;

    fn open_video_sink(&mut self, width: u32, height: u32, fps: u32) -> Result<Box<dyn VideoSink>>;
}
