pub mod dispatcher;
pub mod sinks;

pub use dispatcher::{alert_message, DispatchConfig, Dispatcher, DEFAULT_MAX_RANGE_METERS};
pub use sinks::{NotificationSink, RenderFrame, RenderSink, TargetView};
