use crate::detection::{DetectionSnapshot, StateEvent, TickOutcome};
use crate::dispatch::sinks::{NotificationSink, RenderFrame, RenderSink, TargetView};
use crate::sensor_interface::Reading;
use crate::telemetry::log::LogManager;
use serde::{Deserialize, Serialize};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread;

pub const DEFAULT_MAX_RANGE_METERS: f32 = 10.0;

/// Settings passed through to the rendering collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    pub max_range_meters: f32,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            max_range_meters: DEFAULT_MAX_RANGE_METERS,
        }
    }
}

/// Spoken/alert text for a newly appeared target.
pub fn alert_message(reading: &Reading) -> String {
    format!(
        "Person detected at {:.1} meters, with energy {}",
        reading.distance_meters, reading.energy
    )
}

/// Fans tick results out to the rendering and notification collaborators.
pub struct Dispatcher {
    config: DispatchConfig,
    renderer: Box<dyn RenderSink>,
    notifier: Arc<dyn NotificationSink>,
    logger: LogManager,
}

impl Dispatcher {
    pub fn new(
        config: DispatchConfig,
        renderer: Box<dyn RenderSink>,
        notifier: Arc<dyn NotificationSink>,
    ) -> Self {
        Self {
            config,
            renderer,
            notifier,
            logger: LogManager::new("dispatch"),
        }
    }

    pub fn dispatch_outcome(&mut self, outcome: &TickOutcome) {
        self.dispatch(&outcome.snapshot, &outcome.event);
    }

    /// Renders every tick; notifies only on appearance.
    ///
    /// Notification runs on a detached thread so a slow or failing sink
    /// never holds up the tick loop. Overlapping notifications are allowed.
    pub fn dispatch(&mut self, snapshot: &DetectionSnapshot, event: &StateEvent) {
        if let StateEvent::Appeared(reading) = event {
            let message = alert_message(reading);
            self.logger
                .record(&format!("triggering alert: '{}'", message));
            self.spawn_notification(message);
        }

        let frame = RenderFrame {
            target: snapshot.reading.as_ref().map(TargetView::from),
            max_range_meters: self.config.max_range_meters,
        };
        self.renderer.render(&frame);
    }

    fn spawn_notification(&self, message: String) {
        let notifier = Arc::clone(&self.notifier);
        let logger = self.logger.clone();
        let spawned = thread::Builder::new()
            .name("presence-notify".into())
            .spawn(move || {
                let outcome = panic::catch_unwind(AssertUnwindSafe(|| notifier.notify(&message)));
                match outcome {
                    Ok(Ok(())) => {}
                    Ok(Err(err)) => logger.warn(&format!(
                        "{} sink failed for '{}': {}",
                        notifier.name(),
                        message,
                        err
                    )),
                    Err(_) => logger.warn(&format!(
                        "{} sink panicked for '{}'",
                        notifier.name(),
                        message
                    )),
                }
            });

        if let Err(err) = spawned {
            self.logger
                .warn(&format!("could not start notification thread: {}", err));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::DetectionStateMachine;
    use crate::ingest::{IngestQueue, LineSource, ReadOutcome, SourceReader};
    use crate::prelude::{
        DetectionConfig, MonotonicClock, NotifyError, ShutdownSignal, SourceError,
    };
    use std::sync::mpsc::{self, Receiver, Sender};
    use std::sync::Mutex;
    use std::time::Duration;

    struct RecordingRenderer {
        frames: Arc<Mutex<Vec<RenderFrame>>>,
    }

    impl RenderSink for RecordingRenderer {
        fn render(&mut self, frame: &RenderFrame) {
            self.frames.lock().unwrap().push(*frame);
        }
    }

    struct ChannelNotifier {
        sender: Mutex<Sender<String>>,
    }

    impl NotificationSink for ChannelNotifier {
        fn notify(&self, message: &str) -> Result<(), NotifyError> {
            self.sender
                .lock()
                .unwrap()
                .send(message.to_string())
                .map_err(|err| NotifyError::Rejected(err.to_string()))
        }
    }

    struct FailingNotifier {
        panic: bool,
        attempts: Mutex<Sender<()>>,
    }

    impl NotificationSink for FailingNotifier {
        fn notify(&self, _message: &str) -> Result<(), NotifyError> {
            let _ = self.attempts.lock().unwrap().send(());
            if self.panic {
                panic!("speech engine crashed");
            }
            Err(NotifyError::Rejected("no audio device".into()))
        }
    }

    fn recording_dispatcher(
        notifier: Arc<dyn NotificationSink>,
    ) -> (Dispatcher, Arc<Mutex<Vec<RenderFrame>>>) {
        let frames = Arc::new(Mutex::new(Vec::new()));
        let renderer = RecordingRenderer {
            frames: Arc::clone(&frames),
        };
        let dispatcher = Dispatcher::new(DispatchConfig::default(), Box::new(renderer), notifier);
        (dispatcher, frames)
    }

    fn channel_notifier() -> (Arc<dyn NotificationSink>, Receiver<String>) {
        let (sender, receiver) = mpsc::channel();
        let notifier = ChannelNotifier {
            sender: Mutex::new(sender),
        };
        (Arc::new(notifier), receiver)
    }

    #[test]
    fn formats_alert_like_the_device_announcer() {
        let reading = Reading::new(2.04, 50, 10.0, 0.0);
        assert_eq!(
            alert_message(&reading),
            "Person detected at 2.0 meters, with energy 50"
        );
    }

    #[test]
    fn notifies_only_on_appearance_and_renders_every_tick() {
        let (notifier, receiver) = channel_notifier();
        let (mut dispatcher, frames) = recording_dispatcher(notifier);
        let reading = Reading::new(3.5, 120, 45.0, 0.0);
        let present = DetectionSnapshot {
            reading: Some(reading),
            is_detected: true,
            last_detection_time: Some(0.0),
            evaluated_at: 0.0,
        };

        dispatcher.dispatch(&present, &StateEvent::Appeared(reading));
        dispatcher.dispatch(&present, &StateEvent::StillPresent(reading));
        dispatcher.dispatch(&DetectionSnapshot::absent(3.0), &StateEvent::Absent);

        let message = receiver.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(message, "Person detected at 3.5 meters, with energy 120");
        assert!(receiver.recv_timeout(Duration::from_millis(100)).is_err());

        let frames = frames.lock().unwrap();
        assert_eq!(frames.len(), 3);
        assert_eq!(frames[0].target, Some(TargetView::from(&reading)));
        assert_eq!(frames[0].max_range_meters, DEFAULT_MAX_RANGE_METERS);
        assert_eq!(frames[2].target, None);
    }

    #[test]
    fn failing_notifiers_do_not_reach_the_tick_path() {
        for panic in [false, true] {
            let (sender, attempts) = mpsc::channel();
            let notifier = Arc::new(FailingNotifier {
                panic,
                attempts: Mutex::new(sender),
            });
            let (mut dispatcher, frames) = recording_dispatcher(notifier);
            let reading = Reading::new(1.0, 5, 0.0, 0.0);
            let snapshot = DetectionSnapshot {
                reading: Some(reading),
                is_detected: true,
                last_detection_time: Some(0.0),
                evaluated_at: 0.0,
            };

            dispatcher.dispatch(&snapshot, &StateEvent::Appeared(reading));
            attempts.recv_timeout(Duration::from_secs(5)).unwrap();
            dispatcher.dispatch(&snapshot, &StateEvent::StillPresent(reading));
            assert_eq!(frames.lock().unwrap().len(), 2);
        }
    }

    struct ReplayLines(Vec<&'static str>);

    impl LineSource for ReplayLines {
        fn read_line(&mut self, _timeout: Duration) -> Result<ReadOutcome, SourceError> {
            if self.0.is_empty() {
                Ok(ReadOutcome::Closed)
            } else {
                Ok(ReadOutcome::Line(self.0.remove(0).as_bytes().to_vec()))
            }
        }
    }

    #[test]
    fn reader_to_dispatcher_pipeline() {
        let queue = IngestQueue::default();
        let reader = SourceReader::new(queue.clone(), MonotonicClock::start());
        let mut source = ReplayLines(vec!["0,0,0,0,0,0,0", "1,2.0,0,50,0,0,10.0", "noise"]);
        reader.run(&mut source, &ShutdownSignal::new()).unwrap();

        let (notifier, receiver) = channel_notifier();
        let (mut dispatcher, frames) = recording_dispatcher(notifier);
        let mut machine = DetectionStateMachine::new(DetectionConfig::default()).unwrap();

        for now in [0.0, 0.5, 2.5] {
            let outcome = machine.tick_from_queue(&queue, now);
            dispatcher.dispatch_outcome(&outcome);
        }

        assert_eq!(
            receiver.recv_timeout(Duration::from_secs(5)).unwrap(),
            "Person detected at 2.0 meters, with energy 50"
        );
        let targets: Vec<bool> = frames
            .lock()
            .unwrap()
            .iter()
            .map(|frame| frame.target.is_some())
            .collect();
        assert_eq!(targets, vec![true, true, false]);
    }
}
