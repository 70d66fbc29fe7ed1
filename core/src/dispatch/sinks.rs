use crate::prelude::NotifyError;
use crate::sensor_interface::Reading;
use serde::{Deserialize, Serialize};

/// Target fields a renderer needs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TargetView {
    pub distance_meters: f32,
    pub energy: u32,
    pub azimuth_degrees: f32,
}

impl From<&Reading> for TargetView {
    fn from(reading: &Reading) -> Self {
        Self {
            distance_meters: reading.distance_meters,
            energy: reading.energy,
            azimuth_degrees: reading.azimuth_degrees,
        }
    }
}

/// Per-tick frame handed to the rendering collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RenderFrame {
    /// `None` renders as "absent".
    pub target: Option<TargetView>,
    pub max_range_meters: f32,
}

/// Rendering collaborator, called synchronously on every tick.
pub trait RenderSink: Send {
    fn render(&mut self, frame: &RenderFrame);
}

/// Notification collaborator, called off the tick path on appearance edges.
pub trait NotificationSink: Send + Sync + 'static {
    fn notify(&self, message: &str) -> Result<(), NotifyError>;

    fn name(&self) -> &str {
        "notification"
    }
}
