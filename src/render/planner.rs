//! Zoom-interval planning.

use tracing::debug;

use crate::data::InputEvent;

/// Where a zoom point came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoomOrigin {
    /// Placed by the operator.
    Manual,
    /// Derived from the click timeline.
    Suggested,
}

/// A timestamp marking the start of a fixed-duration camera zoom
/// interval.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoomPoint {
    /// Seconds since clip start.
    pub time: f64,
    pub origin: ZoomOrigin,
}

/// The set of zoom-trigger timestamps, manual and suggested.
///
/// Points are keyed by exact time (duplicates are dropped) and always
/// materialized in ascending order.
#[derive(Debug, Default)]
pub struct ZoomPlanner {
    points: Vec<ZoomPoint>,
}

impl ZoomPlanner {
    pub fn new() -> Self {
        Self::default()
    }

    /// All points, sorted ascending by time.
    pub fn points(&self) -> &[ZoomPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Insert a manual zoom point. Adding an already-present exact time
    /// is a no-op.
    pub fn add(&mut self, time: f64) {
        self.insert(ZoomPoint {
            time,
            origin: ZoomOrigin::Manual,
        });
    }

    /// Derive zoom points from the click timeline.
    ///
    /// Walks click-press events in time order and selects each one at
    /// least `cooldown` seconds after the previously selected click;
    /// selections at or past `clip_duration` are discarded. The selected
    /// set is merged into the existing points. Returns how many points
    /// were newly introduced.
    pub fn suggest(&mut self, events: &[InputEvent], cooldown: f64, clip_duration: f64) -> usize {
        let mut last_selected = -cooldown;
        let mut added = 0;

        for event in events {
            if !event.is_click_press() {
                continue;
            }
            let time = event.time();
            if time < last_selected + cooldown {
                continue;
            }
            last_selected = time;
            if time >= clip_duration {
                continue;
            }
            if self.insert(ZoomPoint {
                time,
                origin: ZoomOrigin::Suggested,
            }) {
                added += 1;
            }
        }

        debug!(added, total = self.points.len(), "suggested zoom points");
        added
    }

    /// Remove all points. Any confirmation step is the caller's concern.
    pub fn clear(&mut self) {
        self.points.clear();
    }

    /// Sorted insert; returns false if the exact time is already present.
    fn insert(&mut self, point: ZoomPoint) -> bool {
        if self.points.iter().any(|p| p.time == point.time) {
            return false;
        }
        let idx = self.points.partition_point(|p| p.time < point.time);
        self.points.insert(idx, point);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn click(time: f64) -> InputEvent {
        InputEvent::ClickPress {
            time,
            x: 0,
            y: 0,
            button: Some("left".to_string()),
        }
    }

    fn times(planner: &ZoomPlanner) -> Vec<f64> {
        planner.points().iter().map(|p| p.time).collect()
    }

    #[test]
    fn test_add_deduplicates_and_sorts() {
        let mut planner = ZoomPlanner::new();
        planner.add(5.0);
        planner.add(1.0);
        planner.add(5.0);
        assert_eq!(times(&planner), vec![1.0, 5.0]);
    }

    #[test]
    fn test_suggest_respects_cooldown() {
        let mut planner = ZoomPlanner::new();
        let events = vec![click(0.0), click(1.0), click(1.2), click(4.0)];
        let added = planner.suggest(&events, 2.5, 60.0);
        assert_eq!(added, 2);
        assert_eq!(times(&planner), vec![0.0, 4.0]);
    }

    #[test]
    fn test_suggested_points_never_closer_than_cooldown() {
        let mut planner = ZoomPlanner::new();
        let events: Vec<_> = (0..50).map(|i| click(i as f64 * 0.37)).collect();
        let cooldown = 1.4;
        planner.suggest(&events, cooldown, 1000.0);

        let ts = times(&planner);
        for pair in ts.windows(2) {
            assert!(pair[1] - pair[0] >= cooldown);
        }
    }

    #[test]
    fn test_suggest_discards_points_past_clip_end() {
        let mut planner = ZoomPlanner::new();
        let events = vec![click(1.0), click(9.0), click(20.0)];
        let added = planner.suggest(&events, 2.5, 10.0);
        assert_eq!(added, 2);
        assert_eq!(times(&planner), vec![1.0, 9.0]);
    }

    #[test]
    fn test_suggest_counts_only_new_points() {
        let mut planner = ZoomPlanner::new();
        planner.add(4.0);
        let events = vec![click(0.0), click(4.0)];
        let added = planner.suggest(&events, 2.5, 60.0);
        assert_eq!(added, 1);
        assert_eq!(times(&planner), vec![0.0, 4.0]);
        assert_eq!(planner.points()[1].origin, ZoomOrigin::Manual);
    }

    #[test]
    fn test_suggest_ignores_non_press_events() {
        let mut planner = ZoomPlanner::new();
        let events = vec![
            InputEvent::Move {
                time: 0.5,
                x: 1,
                y: 1,
            },
            InputEvent::ClickRelease {
                time: 0.9,
                x: 1,
                y: 1,
                button: None,
            },
            click(2.0),
        ];
        assert_eq!(planner.suggest(&events, 2.5, 60.0), 1);
        assert_eq!(times(&planner), vec![2.0]);
    }

    #[test]
    fn test_clear() {
        let mut planner = ZoomPlanner::new();
        planner.add(1.0);
        planner.clear();
        assert!(planner.is_empty());
    }
}
