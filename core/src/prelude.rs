use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

pub use crate::sensor_interface::{FrameParser, FrameRejection, QueuedLine, Reading};

/// Default persistence window applied after the last valid reading.
pub const DEFAULT_PERSISTENCE_SECONDS: f64 = 2.0;

/// Shared configuration for the detection state machine.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    pub persistence_duration_seconds: f64,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            persistence_duration_seconds: DEFAULT_PERSISTENCE_SECONDS,
        }
    }
}

impl DetectionConfig {
    pub fn validate(&self) -> PresenceResult<()> {
        let window = self.persistence_duration_seconds;
        if !window.is_finite() || window < 0.0 {
            return Err(ConfigError::InvalidValue {
                key: "persistence_duration_seconds",
                reason: format!("expected a finite, non-negative duration, got {}", window),
            }
            .into());
        }
        Ok(())
    }
}

/// Configuration problems detected before the pipeline starts.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("invalid {key}: {reason}")]
    InvalidValue { key: &'static str, reason: String },
}

/// Failures raised by a line source.
#[derive(thiserror::Error, Debug)]
pub enum SourceError {
    /// The source is no longer usable (disconnected, access denied).
    #[error("line source failed: {0}")]
    Fatal(String),
    #[error("line source i/o failure: {0}")]
    Io(#[from] std::io::Error),
}

/// Failures raised inside a notification collaborator.
#[derive(thiserror::Error, Debug)]
pub enum NotifyError {
    #[error("notification rejected: {0}")]
    Rejected(String),
    #[error("notification i/o failure: {0}")]
    Io(#[from] std::io::Error),
}

/// Common error type for the core.
#[derive(thiserror::Error, Debug)]
pub enum PresenceError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Source(#[from] SourceError),
    #[error(transparent)]
    Notify(#[from] NotifyError),
}

pub type PresenceResult<T> = Result<T, PresenceError>;

/// Monotonic clock reporting seconds since its origin.
///
/// Reader and tick loop share one clock so that capture stamps and tick
/// times live on the same axis.
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    pub fn start() -> Self {
        Self {
            origin: Instant::now(),
        }
    }

    pub fn now(&self) -> f64 {
        self.origin.elapsed().as_secs_f64()
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::start()
    }
}

/// Cloneable cancellation flag shared by the reader and the tick loop.
#[derive(Debug, Clone, Default)]
pub struct ShutdownSignal {
    flag: Arc<AtomicBool>,
}

impl ShutdownSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn trigger(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_triggered(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}
