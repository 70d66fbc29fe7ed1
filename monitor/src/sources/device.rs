use anyhow::Context;
use presencecore::ingest::{LineSource, ReadOutcome};
use presencecore::prelude::SourceError;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Read};
use std::path::Path;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, SyncSender};
use std::thread;
use std::time::Duration;

const HANDOFF_DEPTH: usize = 256;

type Handoff = io::Result<Option<Vec<u8>>>;

/// Line source over a character device or file.
///
/// A helper thread does the blocking reads so that `read_line` can honour
/// its timeout. Port settings (baud rate, framing) are expected to be set up
/// by whoever owns the device. A device never ends on its own: end of stream
/// means the device went away (e.g. a USB-serial hangup) and is fatal.
pub struct DeviceSource {
    lines: Receiver<Handoff>,
    failure: Option<String>,
}

impl DeviceSource {
    pub fn open<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path_ref = path.as_ref();
        let file = File::open(path_ref)
            .with_context(|| format!("opening sensor device {}", path_ref.display()))?;
        Self::from_reader(file, &path_ref.display().to_string())
    }

    pub fn from_reader<R: Read + Send + 'static>(reader: R, label: &str) -> anyhow::Result<Self> {
        let (sender, lines) = mpsc::sync_channel(HANDOFF_DEPTH);
        thread::Builder::new()
            .name(format!("device-io {}", label))
            .spawn(move || pump(BufReader::new(reader), sender))
            .context("starting device reader thread")?;
        Ok(Self {
            lines,
            failure: None,
        })
    }
}

fn pump<R: BufRead>(mut reader: R, sender: SyncSender<Handoff>) {
    loop {
        let mut line = Vec::new();
        let handoff = match reader.read_until(b'\n', &mut line) {
            Ok(0) => Ok(None),
            Ok(_) => Ok(Some(line)),
            Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
            Err(err) => Err(err),
        };
        let finished = !matches!(handoff, Ok(Some(_)));
        if sender.send(handoff).is_err() || finished {
            return;
        }
    }
}

impl LineSource for DeviceSource {
    fn read_line(&mut self, timeout: Duration) -> Result<ReadOutcome, SourceError> {
        if let Some(failure) = &self.failure {
            return Err(SourceError::Fatal(failure.clone()));
        }
        let failure = match self.lines.recv_timeout(timeout) {
            Ok(Ok(Some(line))) => return Ok(ReadOutcome::Line(line)),
            Err(RecvTimeoutError::Timeout) => return Ok(ReadOutcome::Timeout),
            Ok(Ok(None)) => "device closed".to_string(),
            Err(RecvTimeoutError::Disconnected) => "device reader thread stopped".to_string(),
            Ok(Err(err)) => format!("device read failed: {}", err),
        };
        self.failure = Some(failure.clone());
        Err(SourceError::Fatal(failure))
    }
}
