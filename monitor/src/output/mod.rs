pub mod console;
pub mod notify;

pub use console::{status_line, ConsoleRenderer, RenderFanout};
pub use notify::{CommandNotifier, LogNotifier};
