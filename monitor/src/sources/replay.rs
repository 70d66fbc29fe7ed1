use crate::sources::Pacer;
use anyhow::Context;
use presencecore::ingest::{LineSource, ReadOutcome};
use presencecore::prelude::SourceError;
use std::collections::VecDeque;
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Replays a recorded capture, one line per `interval`.
pub struct ReplaySource {
    lines: VecDeque<Vec<u8>>,
    pacer: Pacer,
}

impl ReplaySource {
    pub fn load<P: AsRef<Path>>(path: P, interval: Duration) -> anyhow::Result<Self> {
        let path_ref = path.as_ref();
        let contents = fs::read(path_ref)
            .with_context(|| format!("reading replay capture {}", path_ref.display()))?;
        Ok(Self::from_bytes(&contents, interval))
    }

    pub fn from_bytes(contents: &[u8], interval: Duration) -> Self {
        let lines = contents
            .split(|&byte| byte == b'\n')
            .filter(|line| !line.is_empty())
            .map(<[u8]>::to_vec)
            .collect();
        Self {
            lines,
            pacer: Pacer::new(interval),
        }
    }

    pub fn remaining(&self) -> usize {
        self.lines.len()
    }
}

impl LineSource for ReplaySource {
    fn read_line(&mut self, timeout: Duration) -> Result<ReadOutcome, SourceError> {
        if self.lines.is_empty() {
            return Ok(ReadOutcome::Closed);
        }
        if !self.pacer.wait(timeout) {
            return Ok(ReadOutcome::Timeout);
        }
        Ok(self
            .lines
            .pop_front()
            .map_or(ReadOutcome::Closed, ReadOutcome::Line))
    }
}
