//! Session timing
//!
//! Wall-clock timestamps plus a monotonic counter for relative offsets.

pub mod clock;

pub use clock::{Clock, ManualClock, SystemClock};
