/// State management module
///
/// Lifecycle of the monitor thread. Game state proper lives in `game`.

pub mod process_state;

// Re-export commonly used types
pub use process_state::{ProcessState, ProcessStateMachine, TransitionError};
