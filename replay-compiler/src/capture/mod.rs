//! Interaction capture
//!
//! Listens to a capture surface, resolves selectors for event targets and
//! builds the interaction trace. Capture is synchronous and single-writer:
//! one session per surface at a time.

pub mod types;
pub mod selector;
pub mod surface;
pub mod session;
pub mod event_log;

pub use types::{DomEvent, EventFamily, ListenerId};
pub use selector::{ResolvedSelector, SelectorResolver, SelectorSource};
pub use surface::{CaptureSurface, InMemorySurface};
pub use session::{
    start_capture, start_capture_with, stop_capture, CaptureError, RecordingSession, SessionState,
};
pub use event_log::{EventLog, ReplayOptions, TimedEvent};
