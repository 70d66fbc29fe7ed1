use std::sync::Mutex;

/// Running counters for frames seen by the state machine.
pub struct MetricsRecorder {
    inner: Mutex<Metrics>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Metrics {
    pub accepted: usize,
    pub no_target: usize,
    pub malformed: usize,
    pub ticks: usize,
}

impl MetricsRecorder {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Metrics::default()),
        }
    }

    pub fn record_accepted(&self) {
        self.update(|metrics| metrics.accepted += 1);
    }

    pub fn record_no_target(&self) {
        self.update(|metrics| metrics.no_target += 1);
    }

    pub fn record_malformed(&self) {
        self.update(|metrics| metrics.malformed += 1);
    }

    pub fn record_tick(&self) {
        self.update(|metrics| metrics.ticks += 1);
    }

    pub fn snapshot(&self) -> Metrics {
        match self.inner.lock() {
            Ok(metrics) => *metrics,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }

    fn update(&self, apply: impl FnOnce(&mut Metrics)) {
        let mut metrics = match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        apply(&mut *metrics);
    }
}

impl Default for MetricsRecorder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_accumulate_independently() {
        let recorder = MetricsRecorder::new();
        recorder.record_accepted();
        recorder.record_accepted();
        recorder.record_malformed();
        recorder.record_no_target();
        recorder.record_tick();

        let metrics = recorder.snapshot();
        assert_eq!(metrics.accepted, 2);
        assert_eq!(metrics.malformed, 1);
        assert_eq!(metrics.no_target, 1);
        assert_eq!(metrics.ticks, 1);
    }
}
