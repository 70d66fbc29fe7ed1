pub mod device;
pub mod replay;

use crate::generator::profile::SyntheticSource;
use crate::workflow::config::{MonitorConfig, SourceKind};
use anyhow::Context;
use log::info;
use presencecore::ingest::LineSource;
use std::thread;
use std::time::{Duration, Instant};

pub use device::DeviceSource;
pub use replay::ReplaySource;

/// Opens the line source selected by `config`.
pub fn open_source(config: &MonitorConfig) -> anyhow::Result<Box<dyn LineSource>> {
    let source: Box<dyn LineSource> = match config.source {
        SourceKind::Device => {
            let path = config
                .device_path
                .as_ref()
                .context("device source selected without device_path")?;
            Box::new(DeviceSource::open(path)?)
        }
        SourceKind::Replay => {
            let path = config
                .replay_path
                .as_ref()
                .context("replay source selected without replay_path")?;
            let replay = ReplaySource::load(path, config.replay_interval())?;
            info!("replaying {} lines from {}", replay.remaining(), path.display());
            Box::new(replay)
        }
        SourceKind::Synthetic => Box::new(SyntheticSource::new(config.synthetic.clone())),
    };
    Ok(source)
}

/// Spaces out emissions of a self-paced source without blocking past a read timeout.
#[derive(Debug)]
pub(crate) struct Pacer {
    interval: Duration,
    next_due: Option<Instant>,
}

impl Pacer {
    pub(crate) fn new(interval: Duration) -> Self {
        Self {
            interval,
            next_due: None,
        }
    }

    /// Sleeps towards the next slot; returns `false` if `timeout` elapsed first.
    pub(crate) fn wait(&mut self, timeout: Duration) -> bool {
        if self.interval.is_zero() {
            return true;
        }
        let now = Instant::now();
        let due = *self.next_due.get_or_insert(now);
        if due > now {
            let remaining = due - now;
            if remaining > timeout {
                thread::sleep(timeout);
                return false;
            }
            thread::sleep(remaining);
        }
        self.next_due = Some(due.max(now) + self.interval);
        true
    }
}
