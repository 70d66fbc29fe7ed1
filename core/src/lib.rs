//! Ingestion-to-state core for the mmWave presence monitor.
//!
//! Lines from the sensor are pushed by a [`ingest::SourceReader`] into an
//! [`ingest::IngestQueue`], drained on every tick by the
//! [`detection::DetectionStateMachine`], and the resulting snapshot and edge
//! event are fanned out by the [`dispatch::Dispatcher`].

pub mod detection;
pub mod dispatch;
pub mod ingest;
pub mod prelude;
pub mod sensor_interface;
pub mod telemetry;

pub use detection::{DetectionStateMachine, StateEvent, TickOutcome};
pub use dispatch::Dispatcher;
pub use ingest::{IngestQueue, SourceReader};
pub use prelude::{DetectionConfig, PresenceError, PresenceResult, Reading};
