//! Core types for event capture
//!
//! Native page events as a capture surface delivers them, before they are
//! mapped onto interactions.

use crate::dom::NodeId;
use serde::{Deserialize, Serialize};

/// Native event raised by a page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum DomEvent {
    /// Pointer click on an element
    #[serde(rename_all = "camelCase")]
    Click {
        target: NodeId,
        client_x: f64,
        client_y: f64,
    },
    /// Value of an input changed
    Input { target: NodeId, value: String },
    /// A form was submitted
    Submit { target: NodeId },
    /// Window scrolled to an absolute offset
    #[serde(rename_all = "camelCase")]
    Scroll { scroll_x: f64, scroll_y: f64 },
    /// History changed (push, replace or back/forward)
    HistoryChange { url: String },
    /// Key pressed. `target` is the focused element, if any.
    KeyDown {
        key: String,
        #[serde(default)]
        target: Option<NodeId>,
    },
}

impl DomEvent {
    /// Listener family that receives this event
    pub fn family(&self) -> EventFamily {
        match self {
            DomEvent::Click { .. } => EventFamily::Pointer,
            DomEvent::Input { .. } => EventFamily::Input,
            DomEvent::Submit { .. } => EventFamily::Submit,
            DomEvent::Scroll { .. } => EventFamily::Scroll,
            DomEvent::HistoryChange { .. } => EventFamily::Navigation,
            DomEvent::KeyDown { .. } => EventFamily::Keyboard,
        }
    }
}

/// Groups of events a listener subscribes to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EventFamily {
    Pointer,
    Input,
    Submit,
    Scroll,
    Navigation,
    Keyboard,
}

impl EventFamily {
    /// Every family, in attach order
    pub const ALL: [EventFamily; 6] = [
        EventFamily::Pointer,
        EventFamily::Input,
        EventFamily::Submit,
        EventFamily::Scroll,
        EventFamily::Navigation,
        EventFamily::Keyboard,
    ];
}

/// Handle returned when a listener is attached
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ListenerId(pub u64);
