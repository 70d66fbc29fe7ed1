use crate::detection::state::{DetectionPhase, DetectionSnapshot, DetectionState, StateEvent};
use crate::ingest::IngestQueue;
use crate::prelude::{DetectionConfig, PresenceResult};
use crate::sensor_interface::{FrameParser, QueuedLine, Reading};
use crate::telemetry::{LogManager, MetricsRecorder};

/// Result of a single tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickOutcome {
    pub snapshot: DetectionSnapshot,
    pub event: StateEvent,
}

/// Debounces the single current target and emits edge events.
///
/// Each tick takes the lines drained since the previous tick, keeps only the
/// newest valid reading, re-evaluates the persistence window against `now`
/// and classifies the result as an appearance, a continuation or absence.
pub struct DetectionStateMachine {
    config: DetectionConfig,
    state: DetectionState,
    metrics: MetricsRecorder,
    logger: LogManager,
}

impl DetectionStateMachine {
    pub fn new(config: DetectionConfig) -> PresenceResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            state: DetectionState::new(),
            metrics: MetricsRecorder::new(),
            logger: LogManager::new("detection"),
        })
    }

    pub fn config(&self) -> &DetectionConfig {
        &self.config
    }

    pub fn state(&self) -> &DetectionState {
        &self.state
    }

    pub fn metrics(&self) -> &MetricsRecorder {
        &self.metrics
    }

    pub fn phase(&self) -> DetectionPhase {
        if self.state.was_detected_previous_tick {
            DetectionPhase::Detected
        } else {
            DetectionPhase::NoTarget
        }
    }

    /// Drains `queue` and ticks with everything it held.
    pub fn tick_from_queue(&mut self, queue: &IngestQueue, now: f64) -> TickOutcome {
        let lines = queue.drain_all();
        self.tick(lines, now)
    }

    pub fn tick<I>(&mut self, lines: I, now: f64) -> TickOutcome
    where
        I: IntoIterator<Item = QueuedLine>,
    {
        self.metrics.record_tick();

        if let Some(latest) = self.latest_reading(lines) {
            self.state.current_reading = Some(latest);
            self.state.last_detection_time = Some(now);
        }

        let detected = self
            .state
            .is_persistently_detected(now, self.config.persistence_duration_seconds);
        if !detected {
            if let Some(expired) = self.state.current_reading.take() {
                self.logger.debug(&format!(
                    "target at {:.2}m aged out after {:.1}s",
                    expired.distance_meters, self.config.persistence_duration_seconds
                ));
                self.state.expired_reading = Some(expired);
            }
        }

        let event = match self.state.current_reading {
            Some(reading) if detected && !self.state.was_detected_previous_tick => {
                self.logger.debug(&format!(
                    "target appeared at {:.2}m, energy {}",
                    reading.distance_meters, reading.energy
                ));
                StateEvent::Appeared(reading)
            }
            Some(reading) if detected => StateEvent::StillPresent(reading),
            _ => StateEvent::Absent,
        };
        self.state.was_detected_previous_tick = detected;

        let snapshot = DetectionSnapshot {
            reading: if detected {
                self.state.current_reading
            } else {
                None
            },
            is_detected: detected,
            last_detection_time: self.state.last_detection_time,
            evaluated_at: now,
        };

        TickOutcome { snapshot, event }
    }

    /// Parses a drained batch, keeping the last valid reading.
    fn latest_reading<I>(&self, lines: I) -> Option<Reading>
    where
        I: IntoIterator<Item = QueuedLine>,
    {
        let mut latest = None;
        for line in lines {
            match FrameParser::parse_queued(&line) {
                Ok(reading) => {
                    self.metrics.record_accepted();
                    latest = Some(reading);
                }
                Err(rejection) if !rejection.is_malformed() => self.metrics.record_no_target(),
                Err(rejection) => {
                    self.metrics.record_malformed();
                    self.logger
                        .trace(&format!("dropped {:?}: {}", line.text, rejection));
                }
            }
        }
        latest
    }
}
