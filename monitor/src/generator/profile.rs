use crate::sources::Pacer;
use anyhow::bail;
use presencecore::dispatch::TargetView;
use presencecore::ingest::{LineSource, ReadOutcome};
use presencecore::prelude::SourceError;
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Number of bins in the simulated range profile.
pub const RANGE_PROFILE_BINS: usize = 200;
/// Upper bound of the random floor in the simulated range profile.
pub const RANGE_PROFILE_FLOOR: f32 = 50.0;

/// Configuration for generating synthetic sensor frames.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyntheticConfig {
    pub seed: u64,
    pub frame_interval_milliseconds: u64,
    /// Consecutive frames with a target before a dropout.
    pub presence_frames: usize,
    /// Consecutive "no target" frames forming a dropout.
    pub dropout_frames: usize,
    /// Probability that a frame is replaced by line noise.
    pub malformed_ratio: f64,
    pub max_range_meters: f32,
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            frame_interval_milliseconds: 50,
            presence_frames: 80,
            dropout_frames: 60,
            malformed_ratio: 0.02,
            max_range_meters: 10.0,
        }
    }
}

impl SyntheticConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        if !(0.0..=1.0).contains(&self.malformed_ratio) {
            bail!(
                "synthetic malformed_ratio must lie within [0, 1], got {}",
                self.malformed_ratio
            );
        }
        if !self.max_range_meters.is_finite() || self.max_range_meters <= 0.0 {
            bail!(
                "synthetic max_range_meters must be a positive distance, got {}",
                self.max_range_meters
            );
        }
        Ok(())
    }

    fn noise_probability(&self) -> f64 {
        if self.malformed_ratio.is_nan() {
            0.0
        } else {
            self.malformed_ratio.clamp(0.0, 1.0)
        }
    }

    fn cycle_len(&self) -> usize {
        self.presence_frames + self.dropout_frames.max(1)
    }
}

/// Seeded line source with a target that wanders in range and azimuth.
pub struct SyntheticSource {
    config: SyntheticConfig,
    rng: StdRng,
    pacer: Pacer,
    frame_index: usize,
    distance: f32,
    azimuth: f32,
}

impl SyntheticSource {
    pub fn new(config: SyntheticConfig) -> Self {
        let rng = StdRng::seed_from_u64(config.seed);
        let pacer = Pacer::new(Duration::from_millis(config.frame_interval_milliseconds));
        let distance = config.max_range_meters.max(0.5) / 2.0;
        Self {
            config,
            rng,
            pacer,
            frame_index: 0,
            distance,
            azimuth: 0.0,
        }
    }

    /// Produces the next wire line without pacing.
    pub fn next_frame(&mut self) -> String {
        let position = self.frame_index % self.config.cycle_len();
        self.frame_index += 1;

        if self.rng.gen_bool(self.config.noise_probability()) {
            return self.noise_line();
        }
        if position >= self.config.presence_frames {
            return "0,0,0,0,0,0,0".to_string();
        }

        let max_range = self.config.max_range_meters.max(0.5);
        self.distance = (self.distance + self.rng.gen_range(-0.15..0.15)).clamp(0.3, max_range);
        self.azimuth = (self.azimuth + self.rng.gen_range(-4.0..6.0)).rem_euclid(360.0);
        let energy: u32 = self.rng.gen_range(20_000..90_000);
        let speed: f32 = self.rng.gen_range(-1.0..1.0);
        let x = self.distance * self.azimuth.to_radians().sin();
        let y = self.distance * self.azimuth.to_radians().cos();

        format!(
            "1,{:.2},{:.2},{},{:.2},{:.2},{:.1}",
            self.distance, speed, energy, x, y, self.azimuth
        )
    }

    fn noise_line(&mut self) -> String {
        match self.rng.gen_range(0..3) {
            0 => "1,2.5,0,50".to_string(),
            1 => format!("1,{:.2},0,??,0,0,0", self.distance),
            _ => "\u{fffd}\u{fffd}".to_string(),
        }
    }
}

impl LineSource for SyntheticSource {
    fn read_line(&mut self, timeout: Duration) -> Result<ReadOutcome, SourceError> {
        if !self.pacer.wait(timeout) {
            return Ok(ReadOutcome::Timeout);
        }
        let mut line = self.next_frame().into_bytes();
        line.extend_from_slice(b"\r\n");
        Ok(ReadOutcome::Line(line))
    }
}

/// Range profile for display: a random floor with the target energy at the
/// bin nearest the target distance.
pub fn simulated_range_profile<R: Rng>(
    rng: &mut R,
    target: &TargetView,
    max_range_meters: f32,
) -> Vec<f32> {
    let mut profile: Vec<f32> = (0..RANGE_PROFILE_BINS)
        .map(|_| rng.gen::<f32>() * RANGE_PROFILE_FLOOR)
        .collect();
    let step = max_range_meters / (RANGE_PROFILE_BINS - 1) as f32;
    let index = if step > 0.0 {
        ((target.distance_meters / step).round() as usize).min(RANGE_PROFILE_BINS - 1)
    } else {
        0
    };
    profile[index] = target.energy as f32;
    profile
}
