//! Interaction records and the immutable trace that holds them

pub mod interaction;
#[allow(clippy::module_inception)]
pub mod trace;

pub use interaction::{
    Click, ControlKey, Coordinates, Interaction, KeyPress, Navigation, Scroll, Submit, TypeText,
    UnknownInteraction, PASSWORD_SENTINEL,
};
pub use trace::{InteractionTrace, TraceError, TraceMetadata, CURRENT_FORMAT_VERSION};
