use crate::generator::profile::SyntheticConfig;
use anyhow::{bail, Context};
use presencecore::dispatch::DispatchConfig;
use presencecore::prelude::DetectionConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Where sensor lines come from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// Character device or file already configured by the OS (e.g. a serial TTY).
    Device,
    /// Recorded capture file, replayed line by line.
    Replay,
    /// Seeded generator emitting a wandering target.
    Synthetic,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    pub persistence_duration_seconds: f64,
    pub tick_interval_milliseconds: u64,
    pub max_range_meters: f32,
    pub read_timeout_milliseconds: u64,
    pub queue_capacity: usize,
    pub source: SourceKind,
    pub device_path: Option<PathBuf>,
    pub replay_path: Option<PathBuf>,
    pub replay_interval_milliseconds: u64,
    pub speech_command: Option<String>,
    pub serve_address: SocketAddr,
    pub synthetic: SyntheticConfig,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            persistence_duration_seconds: 2.0,
            tick_interval_milliseconds: 100,
            max_range_meters: 10.0,
            read_timeout_milliseconds: 1000,
            queue_capacity: presencecore::ingest::DEFAULT_QUEUE_CAPACITY,
            source: SourceKind::Synthetic,
            device_path: None,
            replay_path: None,
            replay_interval_milliseconds: 50,
            speech_command: None,
            serve_address: SocketAddr::from(([127, 0, 0, 1], 9000)),
            synthetic: SyntheticConfig::default(),
        }
    }
}

impl MonitorConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path_ref = path.as_ref();
        let contents = fs::read_to_string(path_ref)
            .with_context(|| format!("reading monitor config {}", path_ref.display()))?;
        let config: MonitorConfig = serde_yaml::from_str(&contents)
            .with_context(|| format!("parsing monitor config {}", path_ref.display()))?;
        Ok(config)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        self.to_detection_config()
            .validate()
            .context("validating detection settings")?;
        if self.tick_interval_milliseconds == 0 {
            bail!("tick_interval_milliseconds must be greater than zero");
        }
        if self.read_timeout_milliseconds == 0 {
            bail!("read_timeout_milliseconds must be greater than zero");
        }
        if !self.max_range_meters.is_finite() || self.max_range_meters <= 0.0 {
            bail!(
                "max_range_meters must be a positive distance, got {}",
                self.max_range_meters
            );
        }
        self.synthetic
            .validate()
            .context("validating synthetic source settings")?;
        match self.source {
            SourceKind::Device if self.device_path.is_none() => {
                bail!("source 'device' requires device_path")
            }
            SourceKind::Replay if self.replay_path.is_none() => {
                bail!("source 'replay' requires replay_path")
            }
            _ => Ok(()),
        }
    }

    pub fn to_detection_config(&self) -> DetectionConfig {
        DetectionConfig {
            persistence_duration_seconds: self.persistence_duration_seconds,
        }
    }

    pub fn to_dispatch_config(&self) -> DispatchConfig {
        DispatchConfig {
            max_range_meters: self.max_range_meters,
        }
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_milliseconds)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_milliseconds)
    }

    pub fn replay_interval(&self) -> Duration {
        Duration::from_millis(self.replay_interval_milliseconds)
    }
}
