//! Capture Surfaces
//!
//! A surface is the page a session listens to: it owns the DOM snapshot,
//! the current URL and the attached listeners. At most one session may own a
//! surface at a time.

use super::session::RecordingSession;
use super::types::{DomEvent, EventFamily, ListenerId};
use crate::dom::Document;
use crate::time::Clock;
use crate::trace::Interaction;
use std::collections::BTreeMap;
use tracing::debug;
use uuid::Uuid;

/// Page-like object a recording session attaches to
pub trait CaptureSurface {
    /// Stable identifier, used in logs and errors
    fn surface_id(&self) -> &str;

    /// URL currently loaded
    fn current_url(&self) -> String;

    /// DOM snapshot used for selector resolution
    fn document(&self) -> &Document;

    /// Attach a listener for one event family on behalf of `owner`
    fn add_listener(&mut self, owner: Uuid, family: EventFamily) -> ListenerId;

    /// Detach a listener. Returns false if it was not attached.
    fn remove_listener(&mut self, id: ListenerId) -> bool;

    /// Number of attached listeners
    fn active_listeners(&self) -> usize;

    /// Session currently recording this surface
    fn owner(&self) -> Option<Uuid>;

    fn set_owner(&mut self, owner: Option<Uuid>);
}

#[derive(Debug, Clone, Copy)]
struct Listener {
    owner: Uuid,
    family: EventFamily,
}

/// Surface backed by an in-memory DOM snapshot
#[derive(Debug, Clone)]
pub struct InMemorySurface {
    id: String,
    url: String,
    document: Document,
    listeners: BTreeMap<ListenerId, Listener>,
    next_listener: u64,
    owner: Option<Uuid>,
}

impl InMemorySurface {
    pub fn new(id: impl Into<String>, url: impl Into<String>, document: Document) -> Self {
        Self {
            id: id.into(),
            url: url.into(),
            document,
            listeners: BTreeMap::new(),
            next_listener: 1,
            owner: None,
        }
    }

    /// Mutable access to the DOM, e.g. to add elements between events
    pub fn document_mut(&mut self) -> &mut Document {
        &mut self.document
    }

    /// Change the loaded URL without raising an event
    pub fn set_url(&mut self, url: impl Into<String>) {
        self.url = url.into();
    }

    /// Whether `owner` has a listener attached for `family`
    pub fn is_listening(&self, owner: Uuid, family: EventFamily) -> bool {
        self.listeners
            .values()
            .any(|l| l.owner == owner && l.family == family)
    }

    /// Deliver an event to a session.
    ///
    /// History changes update the surface URL whether or not anyone listens.
    /// The event reaches the session only if it has a listener attached for
    /// the event's family. Returns the interaction that was recorded, if any.
    pub fn dispatch<C: Clock>(
        &mut self,
        session: &mut RecordingSession<C>,
        event: &DomEvent,
    ) -> Option<Interaction> {
        if let DomEvent::HistoryChange { url } = event {
            self.url = url.clone();
        }

        let family = event.family();
        if !self.is_listening(session.id(), family) {
            debug!(surface = %self.id, ?family, "No listener attached, event dropped");
            return None;
        }

        session.handle_event(&*self, event).cloned()
    }
}

impl CaptureSurface for InMemorySurface {
    fn surface_id(&self) -> &str {
        &self.id
    }

    fn current_url(&self) -> String {
        self.url.clone()
    }

    fn document(&self) -> &Document {
        &self.document
    }

    fn add_listener(&mut self, owner: Uuid, family: EventFamily) -> ListenerId {
        let id = ListenerId(self.next_listener);
        self.next_listener += 1;
        self.listeners.insert(id, Listener { owner, family });
        id
    }

    fn remove_listener(&mut self, id: ListenerId) -> bool {
        self.listeners.remove(&id).is_some()
    }

    fn active_listeners(&self) -> usize {
        self.listeners.len()
    }

    fn owner(&self) -> Option<Uuid> {
        self.owner
    }

    fn set_owner(&mut self, owner: Option<Uuid>) {
        self.owner = owner;
    }
}
