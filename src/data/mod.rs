//! Input event data structures and metadata persistence.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write as _};
use std::path::Path;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::PersistError;

/// A single pointer event, timestamped in seconds since session start.
///
/// One variant per event kind, each carrying exactly its required fields.
/// Serializes to the metadata record format:
/// `{"type": "move" | "click_press" | "click_release", "time": f64,
/// "x": int, "y": int, "button": string|null}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InputEvent {
    Move {
        time: f64,
        x: i32,
        y: i32,
    },
    ClickPress {
        time: f64,
        x: i32,
        y: i32,
        button: Option<String>,
    },
    ClickRelease {
        time: f64,
        x: i32,
        y: i32,
        button: Option<String>,
    },
}

impl InputEvent {
    /// Seconds since session start.
    pub fn time(&self) -> f64 {
        match self {
            InputEvent::Move { time, .. }
            | InputEvent::ClickPress { time, .. }
            | InputEvent::ClickRelease { time, .. } => *time,
        }
    }

    /// Pointer position at the time of the event.
    pub fn position(&self) -> (i32, i32) {
        match self {
            InputEvent::Move { x, y, .. }
            | InputEvent::ClickPress { x, y, .. }
            | InputEvent::ClickRelease { x, y, .. } => (*x, *y),
        }
    }

    pub fn is_move(&self) -> bool {
        matches!(self, InputEvent::Move { .. })
    }

    pub fn is_click_press(&self) -> bool {
        matches!(self, InputEvent::ClickPress { .. })
    }
}

/// A raw pointer notification delivered by an
/// [`crate::capture::InputListener`], not yet timestamped.
#[derive(Debug, Clone)]
pub enum PointerEvent {
    Move { x: i32, y: i32 },
    Press { x: i32, y: i32, button: Option<String> },
    Release { x: i32, y: i32, button: Option<String> },
}

impl PointerEvent {
    /// Stamp the notification with elapsed session time.
    pub fn into_event(self, time: f64) -> InputEvent {
        match self {
            PointerEvent::Move { x, y } => InputEvent::Move { time, x, y },
            PointerEvent::Press { x, y, button } => InputEvent::ClickPress { time, x, y, button },
            PointerEvent::Release { x, y, button } => {
                InputEvent::ClickRelease { time, x, y, button }
            }
        }
    }
}

/// Synchronized append-only buffer of input events.
///
/// The event-logger worker appends while recording; the controller reads
/// and clears only from its own thread. Times are non-decreasing in
/// arrival order because a single worker appends.
#[derive(Debug, Default)]
pub struct EventLog {
    events: Mutex<Vec<InputEvent>>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&self, event: InputEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }

    pub fn len(&self) -> usize {
        self.events.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        if let Ok(mut events) = self.events.lock() {
            events.clear();
        }
    }

    /// Copy of the buffer contents in arrival order.
    pub fn snapshot(&self) -> Vec<InputEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }
}

/// Write the full event log to `path` as a JSON array.
///
/// Written once, in full, at the end of a recording; the log is not
/// streamed incrementally.
pub fn persist_events(path: &Path, events: &[InputEvent]) -> Result<(), PersistError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, events)?;
    writer.flush()?;

    debug!("persisted {} input events to {:?}", events.len(), path);
    Ok(())
}

/// Load a previously persisted event log.
pub fn load_events(path: &Path) -> Result<Vec<InputEvent>, PersistError> {
    let file = File::open(path)?;
    let events = serde_json::from_reader(BufReader::new(file))?;
    Ok(events)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_record_format() {
        let event = InputEvent::ClickPress {
            time: 1.25,
            x: 640,
            y: 360,
            button: Some("left".to_string()),
        };
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["type"], "click_press");
        assert_eq!(value["time"], 1.25);
        assert_eq!(value["x"], 640);
        assert_eq!(value["y"], 360);
        assert_eq!(value["button"], "left");

        let moved = serde_json::to_value(InputEvent::Move {
            time: 0.0,
            x: 1,
            y: 2,
        })
        .unwrap();
        assert_eq!(moved["type"], "move");
        assert!(moved.get("button").is_none());
    }

    #[test]
    fn test_event_log_append_order() {
        let log = EventLog::new();
        log.append(InputEvent::Move {
            time: 0.1,
            x: 10,
            y: 20,
        });
        log.append(InputEvent::ClickPress {
            time: 0.5,
            x: 10,
            y: 20,
            button: None,
        });

        let events = log.snapshot();
        assert_eq!(events.len(), 2);
        assert!(events[0].time() <= events[1].time());

        log.clear();
        assert!(log.is_empty());
    }

    #[test]
    fn test_persist_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events.json");

        let events = vec![
            InputEvent::Move {
                time: 0.0,
                x: 5,
                y: 6,
            },
            InputEvent::ClickRelease {
                time: 2.0,
                x: 5,
                y: 6,
                button: Some("left".to_string()),
            },
        ];

        persist_events(&path, &events).unwrap();
        let loaded = load_events(&path).unwrap();
        assert_eq!(loaded, events);
    }
}
