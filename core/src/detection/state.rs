use crate::sensor_interface::Reading;
use serde::{Deserialize, Serialize};

/// Coarse phase of the single tracked target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DetectionPhase {
    NoTarget,
    Detected,
}

/// Mutable detection state, owned and mutated only by the tick loop.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DetectionState {
    pub(crate) current_reading: Option<Reading>,
    pub(crate) last_detection_time: Option<f64>,
    pub(crate) was_detected_previous_tick: bool,
    /// Last reading that aged out of the persistence window.
    pub(crate) expired_reading: Option<Reading>,
}

impl DetectionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current_reading(&self) -> Option<&Reading> {
        self.current_reading.as_ref()
    }

    pub fn last_detection_time(&self) -> Option<f64> {
        self.last_detection_time
    }

    pub fn was_detected_previous_tick(&self) -> bool {
        self.was_detected_previous_tick
    }

    pub fn expired_reading(&self) -> Option<&Reading> {
        self.expired_reading.as_ref()
    }

    /// True while a reading exists and `now` is inside its persistence window.
    pub fn is_persistently_detected(&self, now: f64, persistence_seconds: f64) -> bool {
        match (self.current_reading, self.last_detection_time) {
            (Some(_), Some(last)) => now - last <= persistence_seconds,
            _ => false,
        }
    }
}

/// Public view of [`DetectionState`] after a tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DetectionSnapshot {
    /// Present only while the target is persistently detected.
    pub reading: Option<Reading>,
    pub is_detected: bool,
    pub last_detection_time: Option<f64>,
    pub evaluated_at: f64,
}

impl DetectionSnapshot {
    pub fn absent(evaluated_at: f64) -> Self {
        Self {
            reading: None,
            is_detected: false,
            last_detection_time: None,
            evaluated_at,
        }
    }

    pub fn phase(&self) -> DetectionPhase {
        if self.is_detected {
            DetectionPhase::Detected
        } else {
            DetectionPhase::NoTarget
        }
    }
}

/// Per-tick event consumed once by the dispatcher.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StateEvent {
    Appeared(Reading),
    StillPresent(Reading),
    Absent,
}

impl StateEvent {
    pub fn is_appearance(&self) -> bool {
        matches!(self, StateEvent::Appeared(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_state_is_not_detected() {
        let state = DetectionState::new();
        assert!(state.current_reading().is_none());
        assert!(!state.was_detected_previous_tick());
        assert!(!state.is_persistently_detected(0.0, 2.0));
    }

    #[test]
    fn snapshot_serializes_for_external_viewers() {
        let snapshot = DetectionSnapshot {
            reading: Some(Reading::new(2.0, 50, 10.0, 0.25)),
            is_detected: true,
            last_detection_time: Some(0.5),
            evaluated_at: 0.5,
        };
        let value = serde_json::to_value(snapshot).unwrap();
        assert_eq!(value["is_detected"], true);
        assert_eq!(value["reading"]["energy"], 50);
        assert_eq!(snapshot.phase(), DetectionPhase::Detected);
        assert_eq!(DetectionSnapshot::absent(1.0).phase(), DetectionPhase::NoTarget);
    }

    #[test]
    fn only_appearance_is_an_edge() {
        let reading = Reading::new(1.0, 7, 0.0, 0.0);
        assert!(StateEvent::Appeared(reading).is_appearance());
        assert!(!StateEvent::StillPresent(reading).is_appearance());
        assert!(!StateEvent::Absent.is_appearance());
    }
}
