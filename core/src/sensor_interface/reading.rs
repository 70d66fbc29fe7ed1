use serde::{Deserialize, Serialize};

/// One validated observation reported by the sensor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    pub distance_meters: f32,
    pub energy: u32,
    pub azimuth_degrees: f32,
    /// Capture time in seconds on the process clock.
    pub observed_at: f64,
}

impl Reading {
    pub fn new(
        distance_meters: f32,
        energy: u32,
        azimuth_degrees: f32,
        observed_at: f64,
    ) -> Self {
        Self {
            distance_meters,
            energy,
            azimuth_degrees,
            observed_at,
        }
    }
}

/// Raw line as handed from the reader to the state machine.
#[derive(Debug, Clone, PartialEq)]
pub struct QueuedLine {
    pub text: String,
    pub received_at: f64,
}

impl QueuedLine {
    pub fn new(text: impl Into<String>, received_at: f64) -> Self {
        Self {
            text: text.into(),
            received_at,
        }
    }
}
