//! Recording session lifecycle and worker threads.
//!
//! A session owns the capture device and video sink while active and
//! drives two workers: a frame-capture thread that paces itself to the
//! configured frame rate, and an event-logger thread that drains pointer
//! notifications into the event log. Shutdown is two-phase: signal and
//! bounded join first, then an unconditional mutex-guarded release of the
//! sink and source, so resource cleanup never depends on worker
//! cooperation.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc, Condvar, Mutex, MutexGuard, RwLock};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::config::RecorderConfig;
use crate::data::{self, EventLog, InputEvent};
use crate::error::SessionError;

use super::{DeviceProvider, FrameSource, InputListener, VideoSink};

/// Cancellation must be observed within roughly this bound by any
/// blocking wait inside a worker.
const CANCEL_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Pacing sleeps are chopped into chunks of this size so cancellation
/// latency stays bounded.
const SLEEP_CHUNK: Duration = Duration::from_millis(10);

/// Current state of a recording session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    /// No recording in progress; no device handles held.
    #[default]
    Idle,
    /// Workers running, frames and events being collected.
    Recording,
    /// Workers parked on the pause gate; handles still held.
    Paused,
    /// Shutdown in progress.
    Stopping,
}

/// Waitable gate the capture worker parks on while paused.
///
/// Distinct from the cancellation flag: pausing must not tear anything
/// down, and a paused worker must still react to shutdown promptly.
#[derive(Debug, Default)]
struct PauseGate {
    paused: Mutex<bool>,
    unpaused: Condvar,
}

impl PauseGate {
    fn set_paused(&self, value: bool) {
        match self.paused.lock() {
            Ok(mut paused) => *paused = value,
            Err(e) => *e.into_inner() = value,
        }
        self.unpaused.notify_all();
    }

    /// Block while the gate is closed, waking at a bounded interval to
    /// re-check cancellation.
    fn wait_while_paused(&self, cancel: &AtomicBool) {
        let mut paused = match self.paused.lock() {
            Ok(guard) => guard,
            Err(e) => e.into_inner(),
        };
        while *paused && !cancel.load(Ordering::SeqCst) {
            paused = match self.unpaused.wait_timeout(paused, CANCEL_POLL_INTERVAL) {
                Ok((guard, _)) => guard,
                Err(e) => e.into_inner().0,
            };
        }
    }
}

/// Device handles shared between the capture worker and the shutdown
/// path. One mutex serializes "worker writes a frame" against "stop
/// releases the handles"; `None` means already released.
#[derive(Default)]
struct CaptureResources {
    source: Option<Box<dyn FrameSource>>,
    sink: Option<Box<dyn VideoSink>>,
}

fn lock_resources(lock: &Mutex<CaptureResources>) -> MutexGuard<'_, CaptureResources> {
    // A worker that panicked mid-write poisons the mutex; release must
    // proceed regardless.
    lock.lock().unwrap_or_else(|e| e.into_inner())
}

fn current_state(lock: &RwLock<SessionState>) -> SessionState {
    match lock.read() {
        Ok(state) => *state,
        Err(e) => *e.into_inner(),
    }
}

fn set_state(lock: &RwLock<SessionState>, value: SessionState) {
    match lock.write() {
        Ok(mut state) => *state = value,
        Err(e) => *e.into_inner() = value,
    }
}

/// Orchestrates the capture device, video sink, and input listener
/// across two worker threads with start/pause/resume/stop semantics.
///
/// All recording state lives inside the session value; the controller
/// thread calls the four lifecycle operations, workers only read the
/// shared signaling primitives.
pub struct RecordingSession {
    config: RecorderConfig,
    devices: Box<dyn DeviceProvider>,
    listener: Box<dyn InputListener>,

    state: Arc<RwLock<SessionState>>,
    cancel: Arc<AtomicBool>,
    gate: Arc<PauseGate>,
    resources: Arc<Mutex<CaptureResources>>,
    events: Arc<EventLog>,

    workers: Vec<thread::JoinHandle<()>>,
    started_at: Option<Instant>,
}

impl RecordingSession {
    pub fn new(
        config: RecorderConfig,
        devices: Box<dyn DeviceProvider>,
        listener: Box<dyn InputListener>,
    ) -> Self {
        Self {
            config,
            devices,
            listener,
            state: Arc::new(RwLock::new(SessionState::Idle)),
            cancel: Arc::new(AtomicBool::new(false)),
            gate: Arc::new(PauseGate::default()),
            resources: Arc::new(Mutex::new(CaptureResources::default())),
            events: Arc::new(EventLog::new()),
            workers: Vec::new(),
            started_at: None,
        }
    }

    /// Current session state.
    pub fn state(&self) -> SessionState {
        current_state(&self.state)
    }

    /// Elapsed session time, if a recording is active.
    pub fn elapsed(&self) -> Option<Duration> {
        self.started_at.map(|t| t.elapsed())
    }

    /// Copy of the collected input events in arrival order.
    pub fn events(&self) -> Vec<InputEvent> {
        self.events.snapshot()
    }

    /// Acquire devices and start recording. Valid only from `Idle`.
    ///
    /// If the frame source, video sink, or listener subscription fails,
    /// whatever was partially acquired is released and the session stays
    /// `Idle`.
    pub fn start(&mut self) -> Result<(), SessionError> {
        let state = current_state(&self.state);
        if state != SessionState::Idle {
            return Err(SessionError::InvalidStateTransition { op: "start", state });
        }

        let source = match self.devices.open_frame_source() {
            Ok(source) => source,
            Err(e) => return Err(SessionError::ResourceUnavailable(e)),
        };
        let (width, height) = source.resolution();

        let mut sink = match self.devices.open_video_sink(width, height, self.config.fps) {
            Ok(sink) => sink,
            Err(e) => {
                drop(source);
                return Err(SessionError::ResourceUnavailable(e));
            }
        };

        let (tx, rx) = mpsc::channel();
        if let Err(e) = self.listener.subscribe(tx) {
            if let Err(e) = sink.finalize() {
                warn!("error releasing video sink after failed start: {:#}", e);
            }
            drop(sink);
            drop(source);
            return Err(SessionError::ResourceUnavailable(e));
        }

        self.events.clear();
        self.cancel.store(false, Ordering::SeqCst);
        self.gate.set_paused(false);
        {
            let mut res = lock_resources(&self.resources);
            res.source = Some(source);
            res.sink = Some(sink);
        }

        let started = Instant::now();
        self.started_at = Some(started);
        set_state(&self.state, SessionState::Recording);

        let resources = Arc::clone(&self.resources);
        let gate = Arc::clone(&self.gate);
        let cancel = Arc::clone(&self.cancel);
        let fps = self.config.fps;
        let max_misses = self.config.max_consecutive_misses;
        self.workers.push(thread::spawn(move || {
            capture_loop(resources, gate, cancel, fps, max_misses)
        }));

        let state = Arc::clone(&self.state);
        let events = Arc::clone(&self.events);
        let cancel = Arc::clone(&self.cancel);
        self.workers.push(thread::spawn(move || {
            logger_loop(rx, state, events, cancel, started)
        }));

        info!(
            session_id = %self.config.session_id(),
            width,
            height,
            fps = self.config.fps,
            "recording started"
        );
        Ok(())
    }

    /// Close the pause gate. Valid only from `Recording`.
    ///
    /// While paused the capture worker blocks on the gate and the event
    /// logger drops incoming notifications; no resource is released.
    pub fn pause(&mut self) -> Result<(), SessionError> {
        let state = current_state(&self.state);
        if state != SessionState::Recording {
            return Err(SessionError::InvalidStateTransition { op: "pause", state });
        }
        set_state(&self.state, SessionState::Paused);
        self.gate.set_paused(true);
        info!("recording paused");
        Ok(())
    }

    /// Reopen the pause gate. Valid only from `Paused`. Reacquires
    /// nothing.
    pub fn resume(&mut self) -> Result<(), SessionError> {
        let state = current_state(&self.state);
        if state != SessionState::Paused {
            return Err(SessionError::InvalidStateTransition { op: "resume", state });
        }
        set_state(&self.state, SessionState::Recording);
        self.gate.set_paused(false);
        info!("recording resumed");
        Ok(())
    }

    /// Stop recording, release devices, persist the event log, and reset
    /// to `Idle`. Valid only from `Recording` or `Paused`.
    ///
    /// Blocks the caller on bounded worker joins and on the metadata
    /// write. A worker that misses its join timeout is logged and
    /// abandoned; release proceeds regardless.
    pub fn stop(&mut self) -> Result<(), SessionError> {
        let state = current_state(&self.state);
        if state != SessionState::Recording && state != SessionState::Paused {
            return Err(SessionError::InvalidStateTransition { op: "stop", state });
        }
        set_state(&self.state, SessionState::Stopping);
        info!("stopping recording");

        // Phase 1: signal and bounded join.
        self.cancel.store(true, Ordering::SeqCst);
        // A paused capture worker is parked on the gate; open it so the
        // worker observes cancellation instead of blocking forever.
        self.gate.set_paused(false);
        self.listener.unsubscribe();

        let timeout = Duration::from_millis(self.config.join_timeout_ms);
        for handle in self.workers.drain(..) {
            join_with_timeout(handle, timeout);
        }

        // Phase 2: unconditional release, sink before source.
        {
            let mut res = lock_resources(&self.resources);
            if let Some(mut sink) = res.sink.take() {
                if let Err(e) = sink.finalize() {
                    warn!("error finalizing video sink: {:#}", e);
                }
            }
            res.source.take();
        }

        let events = self.events.snapshot();
        let persisted = data::persist_events(&self.config.metadata_path(), &events);

        self.started_at = None;
        set_state(&self.state, SessionState::Idle);

        match persisted {
            Ok(()) => {
                info!("recording stopped; {} input events persisted", events.len());
                Ok(())
            }
            Err(e) => {
                warn!("failed to persist event metadata: {}", e);
                Err(SessionError::PersistenceFailure(e))
            }
        }
    }
}

impl Drop for RecordingSession {
    fn drop(&mut self) {
        if self.state() != SessionState::Idle {
            if let Err(e) = self.stop() {
                warn!("error stopping recording during drop: {}", e);
            }
        }
    }
}

/// Join a worker, warning and abandoning it if it misses the deadline.
fn join_with_timeout(handle: thread::JoinHandle<()>, timeout: Duration) {
    let deadline = Instant::now() + timeout;
    while !handle.is_finished() {
        if Instant::now() >= deadline {
            warn!(
                "worker thread did not finish within {:?}; releasing resources anyway",
                timeout
            );
            return;
        }
        thread::sleep(SLEEP_CHUNK);
    }
    if handle.join().is_err() {
        warn!("worker thread panicked during recording");
    }
}

/// Sleep for `total`, in small chunks, returning early on cancellation.
fn sleep_cancellable(total: Duration, cancel: &AtomicBool) {
    let deadline = Instant::now() + total;
    while !cancel.load(Ordering::SeqCst) {
        let now = Instant::now();
        if now >= deadline {
            break;
        }
        thread::sleep((deadline - now).min(SLEEP_CHUNK));
    }
}

/// Frame-capture worker: pull the latest frame, write it under the
/// resource mutex, pace to the target frame interval using measured loop
/// duration.
fn capture_loop(
    resources: Arc<Mutex<CaptureResources>>,
    gate: Arc<PauseGate>,
    cancel: Arc<AtomicBool>,
    fps: u32,
    max_misses: u32,
) {
    let frame_interval = Duration::from_secs_f64(1.0 / fps.max(1) as f64);
    let mut misses: u32 = 0;
    debug!("capture worker started");

    'capture: while !cancel.load(Ordering::SeqCst) {
        gate.wait_while_paused(&cancel);
        if cancel.load(Ordering::SeqCst) {
            break;
        }

        let loop_start = Instant::now();
        {
            let mut res = lock_resources(&resources);
            let frame = match res.source.as_mut() {
                Some(source) => source.latest_frame(),
                // Shutdown already released the device.
                None => break 'capture,
            };
            match frame {
                Some(frame) => {
                    misses = 0;
                    let Some(sink) = res.sink.as_mut() else {
                        break 'capture;
                    };
                    if let Err(e) = sink.write(&frame) {
                        warn!("frame write failed, capture worker exiting: {:#}", e);
                        break 'capture;
                    }
                }
                None => {
                    // Transient misses are tolerated up to a bound, then
                    // merely logged.
                    misses += 1;
                    if misses >= max_misses {
                        warn!(
                            "capture device produced no frame for {} consecutive polls",
                            misses
                        );
                        misses = 0;
                    }
                }
            }
        }

        if let Some(remaining) = frame_interval.checked_sub(loop_start.elapsed()) {
            sleep_cancellable(remaining, &cancel);
        }
    }

    debug!("capture worker finished");
}

/// Event-logger worker: drain pointer notifications, stamping each with
/// elapsed session time. Notifications arriving while paused are dropped,
/// not time-shifted.
fn logger_loop(
    rx: mpsc::Receiver<crate::data::PointerEvent>,
    state: Arc<RwLock<SessionState>>,
    events: Arc<EventLog>,
    cancel: Arc<AtomicBool>,
    started: Instant,
) {
    debug!("event logger worker started");

    while !cancel.load(Ordering::SeqCst) {
        match rx.recv_timeout(CANCEL_POLL_INTERVAL) {
            Ok(notice) => {
                if current_state(&state) == SessionState::Recording {
                    let time = started.elapsed().as_secs_f64();
                    events.append(notice.into_event(time));
                }
            }
            Err(mpsc::RecvTimeoutError::Timeout) => continue,
            Err(mpsc::RecvTimeoutError::Disconnected) => break,
        }
    }

    debug!("event logger worker finished");
}
