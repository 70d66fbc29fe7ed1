pub mod frame;
pub mod reading;

pub use frame::{FrameParser, FrameRejection};
pub use reading::{QueuedLine, Reading};
