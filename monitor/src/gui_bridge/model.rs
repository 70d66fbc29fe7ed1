use presencecore::dispatch::TargetView;
use serde::{Deserialize, Serialize};

/// Latest frame as served to external viewers.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct VisualizationModel {
    pub target: Option<TargetView>,
    pub status: String,
    pub max_range_meters: f32,
    /// Simulated range profile; empty while no target is present.
    pub range_profile: Vec<f32>,
    pub frames_rendered: u64,
}
