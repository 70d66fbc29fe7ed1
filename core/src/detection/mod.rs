pub mod machine;
pub mod state;

pub use machine::{DetectionStateMachine, TickOutcome};
pub use state::{DetectionPhase, DetectionSnapshot, DetectionState, StateEvent};
