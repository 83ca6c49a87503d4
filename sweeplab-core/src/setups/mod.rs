//! The setup state machine: phases, events, and the engine that owns all
//! concurrently active setup instances.

pub mod events;
pub mod machine;
pub mod phase;

pub use events::{EventSink, NullSink, PhaseChange, RecordingSink, TransitionDetail, TransitionEvent};
pub use machine::{EntrySignal, SetupEngine};
pub use phase::{PhaseState, RemovalReason, Setup, SetupPhase};
