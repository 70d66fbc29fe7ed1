pub mod queue;
pub mod reader;

pub use queue::{IngestQueue, DEFAULT_QUEUE_CAPACITY};
pub use reader::{
    LineSource, ReadOutcome, ReaderExit, ReaderReport, ReaderStats, SourceReader,
    DEFAULT_READ_TIMEOUT,
};
