use crate::ingest::queue::IngestQueue;
use crate::prelude::{MonotonicClock, ShutdownSignal, SourceError};
use crate::sensor_interface::QueuedLine;
use crate::telemetry::log::LogManager;
use std::time::Duration;

/// Default time a single read may block before yielding a timeout.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_millis(1000);

/// Result of one blocking read against a line source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadOutcome {
    Line(Vec<u8>),
    Timeout,
    /// End of a finite source.
    Closed,
}

/// Anything that can hand out newline-delimited records.
///
/// Implementations block for at most `timeout` and report hard failures as
/// [`SourceError`]; reconnecting is left to whoever owns the source.
pub trait LineSource: Send {
    fn read_line(&mut self, timeout: Duration) -> Result<ReadOutcome, SourceError>;
}

impl<S: LineSource + ?Sized> LineSource for Box<S> {
    fn read_line(&mut self, timeout: Duration) -> Result<ReadOutcome, SourceError> {
        (**self).read_line(timeout)
    }
}

/// Why a reader run ended without error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReaderExit {
    SourceClosed,
    Cancelled,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReaderStats {
    pub lines_pushed: usize,
    pub empty_lines: usize,
    pub timeouts: usize,
    pub dropped_on_push: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReaderReport {
    pub exit: ReaderExit,
    pub stats: ReaderStats,
}

/// Pumps lines from a [`LineSource`] into an [`IngestQueue`].
pub struct SourceReader {
    queue: IngestQueue,
    clock: MonotonicClock,
    read_timeout: Duration,
    logger: LogManager,
}

impl SourceReader {
    pub fn new(queue: IngestQueue, clock: MonotonicClock) -> Self {
        Self {
            queue,
            clock,
            read_timeout: DEFAULT_READ_TIMEOUT,
            logger: LogManager::new("reader"),
        }
    }

    pub fn with_read_timeout(mut self, read_timeout: Duration) -> Self {
        self.read_timeout = read_timeout;
        self
    }

    /// Reads until the source closes, fails, or `shutdown` is triggered.
    ///
    /// A fatal source error is returned as-is and never retried here.
    pub fn run<S: LineSource + ?Sized>(
        &self,
        source: &mut S,
        shutdown: &ShutdownSignal,
    ) -> Result<ReaderReport, SourceError> {
        self.logger.record("source reader started");
        let mut stats = ReaderStats::default();

        let exit = loop {
            if shutdown.is_triggered() {
                break ReaderExit::Cancelled;
            }

            match source.read_line(self.read_timeout) {
                Ok(ReadOutcome::Line(bytes)) => {
                    let received_at = self.clock.now();
                    let decoded = String::from_utf8_lossy(&bytes);
                    let text = decoded.trim();
                    if text.is_empty() {
                        stats.empty_lines += 1;
                        continue;
                    }
                    if self.queue.push(QueuedLine::new(text, received_at)) {
                        stats.dropped_on_push += 1;
                        self.logger
                            .warn("ingest queue full, discarded the oldest line");
                    }
                    stats.lines_pushed += 1;
                }
                Ok(ReadOutcome::Timeout) => stats.timeouts += 1,
                Ok(ReadOutcome::Closed) => break ReaderExit::SourceClosed,
                Err(err) => {
                    self.logger.error(&format!("fatal source error: {}", err));
                    return Err(err);
                }
            }
        };

        self.logger.record(&format!(
            "source reader finished ({:?}) after {} lines",
            exit, stats.lines_pushed
        ));
        Ok(ReaderReport { exit, stats })
    }
}
