/// Messaging module for Event/Command architecture
///
/// - **Events**: Notifications of things that happened (past tense, broadcast)
/// - **Commands**: Requests to the monitor thread (imperative, targeted)
///
/// ## Architecture
///
/// ```text
/// ┌───────────────┐   MonitorCommand   ┌──────────────┐    Event    ┌───────────┐
/// │ MonitorHandle │ ─────────────────> │ Monitor loop │ ──────────> │ Event Bus │
/// │ (hotkeys, UI) │                    │   (thread)   │             │           │
/// └───────────────┘                    └──────────────┘             └───────────┘
///                                                                         │
///                                                                         ▼
///                                                               display, engine, logs
/// ```
///
/// ## Usage
///
/// ```rust,ignore
/// let bus = EventBus::new();
/// let (rx, _id) = bus.subscribe();
///
/// let handle = MonitorLoop::new(&config, assets, bus.clone()).spawn(capture)?;
/// handle.reset_area();
///
/// while let Ok(event) = rx.recv() {
///     match event {
///         Event::ActionCommitted { action, .. } => { /* update display */ }
///         Event::Shutdown => break,
///         _ => {}
///     }
/// }
/// ```

pub mod bus;
pub mod commands;
pub mod events;

// Re-export commonly used types
pub use bus::{EventBus, SubscriberId};
pub use commands::MonitorCommand;
pub use events::Event;
