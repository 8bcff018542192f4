//! Recording Sessions
//!
//! A session turns native page events into [`Interaction`]s while it owns a
//! capture surface. State moves `Idle -> Recording -> Stopped`; stopping
//! detaches every listener, releases the surface and freezes the buffer into
//! an [`InteractionTrace`].

use super::selector::SelectorResolver;
use super::surface::CaptureSurface;
use super::types::{DomEvent, EventFamily, ListenerId};
use crate::dom::{Document, NodeId};
use crate::time::{Clock, SystemClock};
use crate::trace::{
    Click, ControlKey, Coordinates, Interaction, InteractionTrace, KeyPress, Navigation, Scroll,
    Submit, TypeText,
};
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Default cap on click text snippets, in characters
pub const DEFAULT_TEXT_SNIPPET_MAX_CHARS: usize = 100;

/// Capture failures
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CaptureError {
    #[error("surface '{surface}' is already being recorded")]
    AlreadyRecording { surface: String },

    #[error("session is recording surface '{expected}', not '{found}'")]
    WrongSurface { expected: String, found: String },
}

/// Session lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Recording,
    Stopped,
}

/// Single-writer recorder bound to one surface while recording
#[derive(Debug)]
pub struct RecordingSession<C: Clock = SystemClock> {
    id: Uuid,
    name: String,
    clock: C,
    state: SessionState,
    resolver: SelectorResolver,
    text_snippet_max_chars: usize,
    buffer: Vec<Interaction>,
    listeners: Vec<ListenerId>,
    surface_id: Option<String>,
    origin_ms: u64,
    last_relative_ms: u64,
    last_url: String,
}

impl<C: Clock> RecordingSession<C> {
    /// Create an idle session
    pub fn new(clock: C) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: "recording".to_string(),
            clock,
            state: SessionState::Idle,
            resolver: SelectorResolver::new(),
            text_snippet_max_chars: DEFAULT_TEXT_SNIPPET_MAX_CHARS,
            buffer: Vec::new(),
            listeners: Vec::new(),
            surface_id: None,
            origin_ms: 0,
            last_relative_ms: 0,
            last_url: String::new(),
        }
    }

    /// Name given to the resulting trace
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Cap on click text snippets
    pub fn with_text_snippet_limit(mut self, max_chars: usize) -> Self {
        self.text_snippet_max_chars = max_chars;
        self
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_recording(&self) -> bool {
        self.state == SessionState::Recording
    }

    /// Interactions captured so far
    pub fn buffered(&self) -> &[Interaction] {
        &self.buffer
    }

    /// Claim the surface and begin recording.
    ///
    /// Fails if this session is already recording or if another session owns
    /// the surface. On success the buffer holds exactly one navigation to the
    /// surface's current URL.
    pub fn start<S: CaptureSurface + ?Sized>(&mut self, surface: &mut S) -> Result<(), CaptureError> {
        if self.is_recording() || surface.owner().is_some() {
            warn!(surface = %surface.surface_id(), session = %self.id, "Surface already recording");
            return Err(CaptureError::AlreadyRecording {
                surface: surface.surface_id().to_string(),
            });
        }

        surface.set_owner(Some(self.id));
        self.buffer.clear();
        self.surface_id = Some(surface.surface_id().to_string());
        self.origin_ms = self.clock.now_millis();
        self.last_relative_ms = 0;
        self.last_url = surface.current_url();

        self.buffer.push(Interaction::Navigation(Navigation {
            url: self.last_url.clone(),
            timestamp: self.clock.now_wall(),
            relative_time_ms: 0,
        }));

        self.listeners = EventFamily::ALL
            .iter()
            .map(|family| surface.add_listener(self.id, *family))
            .collect();

        self.state = SessionState::Recording;
        info!(
            surface = %surface.surface_id(),
            session = %self.id,
            url = %self.last_url,
            "Recording started"
        );
        Ok(())
    }

    /// Stop recording and return the frozen trace.
    ///
    /// Calling this on a session that is not recording is a no-op that
    /// returns an empty trace. Stopping against any surface other than the
    /// one being recorded fails and leaves the session recording.
    pub fn stop<S: CaptureSurface + ?Sized>(
        &mut self,
        surface: &mut S,
    ) -> Result<InteractionTrace, CaptureError> {
        if !self.is_recording() {
            debug!(session = %self.id, state = ?self.state, "Stop ignored, session not recording");
            return Ok(InteractionTrace::empty());
        }

        let expected = self.surface_id.clone().unwrap_or_default();
        if expected != surface.surface_id() {
            warn!(
                session = %self.id,
                %expected,
                found = %surface.surface_id(),
                "Stop refused, surface is not the one being recorded"
            );
            return Err(CaptureError::WrongSurface {
                expected,
                found: surface.surface_id().to_string(),
            });
        }

        for listener in self.listeners.drain(..) {
            surface.remove_listener(listener);
        }
        if surface.owner() == Some(self.id) {
            surface.set_owner(None);
        }

        self.state = SessionState::Stopped;
        self.surface_id = None;
        let interactions = std::mem::take(&mut self.buffer);
        info!(session = %self.id, interactions = interactions.len(), "Recording stopped");
        Ok(InteractionTrace::new(self.name.clone(), interactions))
    }

    /// Map one native event onto the buffer.
    ///
    /// Returns the interaction that was appended, or `None` when the event is
    /// filtered out (not recording, same-URL history change, key outside the
    /// allow-list).
    pub fn handle_event<S: CaptureSurface + ?Sized>(
        &mut self,
        surface: &S,
        event: &DomEvent,
    ) -> Option<&Interaction> {
        if !self.is_recording() {
            return None;
        }

        let doc = surface.document();
        let interaction = match event {
            DomEvent::Click { target, client_x, client_y } => {
                let (timestamp, relative_time_ms) = self.stamp();
                Interaction::Click(Click {
                    selector: self.resolver.resolve(doc, *target),
                    element_tag: element_tag(doc, *target),
                    coordinates: Coordinates { x: *client_x, y: *client_y },
                    text_snippet: self.snippet(doc, *target),
                    timestamp,
                    relative_time_ms,
                })
            }
            DomEvent::Input { target, value } => {
                let (timestamp, relative_time_ms) = self.stamp();
                Interaction::Type(TypeText::new(
                    self.resolver.resolve(doc, *target),
                    element_tag(doc, *target),
                    value,
                    &input_kind(doc, *target),
                    timestamp,
                    relative_time_ms,
                ))
            }
            DomEvent::Submit { target } => {
                let (timestamp, relative_time_ms) = self.stamp();
                Interaction::Submit(Submit {
                    selector: self.resolver.resolve(doc, *target),
                    element_tag: element_tag(doc, *target),
                    timestamp,
                    relative_time_ms,
                })
            }
            DomEvent::Scroll { scroll_x, scroll_y } => {
                let (timestamp, relative_time_ms) = self.stamp();
                Interaction::Scroll(Scroll {
                    x: *scroll_x,
                    y: *scroll_y,
                    timestamp,
                    relative_time_ms,
                })
            }
            DomEvent::HistoryChange { url } => {
                if *url == self.last_url {
                    debug!(%url, "History change to same URL ignored");
                    return None;
                }
                self.last_url = url.clone();
                let (timestamp, relative_time_ms) = self.stamp();
                Interaction::Navigation(Navigation {
                    url: url.clone(),
                    timestamp,
                    relative_time_ms,
                })
            }
            DomEvent::KeyDown { key, target } => {
                let key = ControlKey::from_key(key)?;
                let selector = match target {
                    Some(target) => self.resolver.resolve(doc, *target),
                    None => "document".to_string(),
                };
                let (timestamp, relative_time_ms) = self.stamp();
                Interaction::KeyPress(KeyPress {
                    key,
                    selector,
                    timestamp,
                    relative_time_ms,
                })
            }
        };

        debug!(kind = interaction.kind(), relative_ms = interaction.relative_time_ms(), "Captured");
        self.buffer.push(interaction);
        self.buffer.last()
    }

    /// Wall time plus relative time, clamped to be non-decreasing
    fn stamp(&mut self) -> (chrono::DateTime<chrono::Utc>, u64) {
        let elapsed = self.clock.now_millis().saturating_sub(self.origin_ms);
        self.last_relative_ms = self.last_relative_ms.max(elapsed);
        (self.clock.now_wall(), self.last_relative_ms)
    }

    fn snippet(&self, doc: &Document, id: NodeId) -> String {
        doc.text_content(id)
            .trim()
            .chars()
            .take(self.text_snippet_max_chars)
            .collect()
    }
}

impl RecordingSession<SystemClock> {
    /// Idle session on the system clock
    pub fn with_system_clock() -> Self {
        Self::new(SystemClock::new())
    }
}

fn element_tag(doc: &Document, id: NodeId) -> String {
    doc.node(id)
        .filter(|n| n.is_element())
        .map(|n| n.tag_name.clone())
        .unwrap_or_else(|| "document".to_string())
}

/// The control's `type`, defaulting the way browsers report it
fn input_kind(doc: &Document, id: NodeId) -> String {
    match doc.node(id) {
        Some(node) => match node.attr("type") {
            Some(kind) => kind.to_ascii_lowercase(),
            None if node.tag_name == "input" => "text".to_string(),
            None => node.tag_name.clone(),
        },
        None => "text".to_string(),
    }
}

/// Start a session on the system clock
pub fn start_capture<S: CaptureSurface + ?Sized>(
    surface: &mut S,
) -> Result<RecordingSession<SystemClock>, CaptureError> {
    start_capture_with(surface, SystemClock::new())
}

/// Start a session on a caller-provided clock
pub fn start_capture_with<S: CaptureSurface + ?Sized, C: Clock>(
    surface: &mut S,
    clock: C,
) -> Result<RecordingSession<C>, CaptureError> {
    let mut session = RecordingSession::new(clock);
    session.start(surface)?;
    Ok(session)
}

/// Stop a session and take its trace.
///
/// When `surface` is not the surface being recorded, the session is handed
/// back still recording so it can be stopped on the right one.
pub fn stop_capture<S: CaptureSurface + ?Sized, C: Clock>(
    mut session: RecordingSession<C>,
    surface: &mut S,
) -> Result<InteractionTrace, RecordingSession<C>> {
    match session.stop(surface) {
        Ok(trace) => Ok(trace),
        Err(_) => Err(session),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::surface::InMemorySurface;
    use crate::time::ManualClock;
    use crate::trace::PASSWORD_SENTINEL;

    struct Page {
        surface: InMemorySurface,
        search: NodeId,
        password: NodeId,
        button: NodeId,
        form: NodeId,
    }

    fn page() -> Page {
        let mut doc = Document::new();
        let html = doc.append_element(NodeId::DOCUMENT, "html");
        let body = doc.append_element(html, "body");
        let form = doc.append_element(body, "form");
        doc.set_attribute(form, "id", "login");
        let search = doc.append_element(form, "input");
        doc.set_attribute(search, "name", "q");
        let password = doc.append_element(form, "input");
        doc.set_attribute(password, "type", "password")
            .set_attribute(password, "id", "pw");
        let button = doc.append_element(form, "button");
        doc.set_text(button, "Sign in");
        Page {
            surface: InMemorySurface::new("tab-1", "https://a.test/login", doc),
            search,
            password,
            button,
            form,
        }
    }

    #[test]
    fn test_start_records_initial_navigation() {
        let mut p = page();
        let clock = ManualClock::new();
        let session = start_capture_with(&mut p.surface, clock).unwrap();

        assert_eq!(session.state(), SessionState::Recording);
        assert_eq!(session.buffered().len(), 1);
        match &session.buffered()[0] {
            Interaction::Navigation(nav) => {
                assert_eq!(nav.url, "https://a.test/login");
                assert_eq!(nav.relative_time_ms, 0);
            }
            other => panic!("expected navigation, got {:?}", other),
        }
        assert_eq!(p.surface.active_listeners(), EventFamily::ALL.len());
        assert_eq!(p.surface.owner(), Some(session.id()));
    }

    #[test]
    fn test_second_session_is_rejected() {
        let mut p = page();
        let _first = start_capture_with(&mut p.surface, ManualClock::new()).unwrap();
        let second = start_capture_with(&mut p.surface, ManualClock::new());
        assert_eq!(
            second.unwrap_err(),
            CaptureError::AlreadyRecording { surface: "tab-1".to_string() }
        );
    }

    #[test]
    fn test_start_twice_is_rejected() {
        let mut p = page();
        let mut session = RecordingSession::new(ManualClock::new());
        session.start(&mut p.surface).unwrap();
        assert!(session.start(&mut p.surface).is_err());
    }

    #[test]
    fn test_stop_detaches_and_releases() {
        let mut p = page();
        let session = start_capture_with(&mut p.surface, ManualClock::new()).unwrap();
        let trace = stop_capture(session, &mut p.surface).unwrap();

        assert_eq!(trace.len(), 1);
        assert_eq!(p.surface.active_listeners(), 0);
        assert_eq!(p.surface.owner(), None);

        // Surface can be recorded again
        assert!(start_capture_with(&mut p.surface, ManualClock::new()).is_ok());
    }

    #[test]
    fn test_stop_on_other_surface_keeps_recording() {
        let mut p = page();
        let mut other = InMemorySurface::new("tab-2", "https://b.test/", Document::new());
        let mut session = start_capture_with(&mut p.surface, ManualClock::new()).unwrap();

        assert_eq!(
            session.stop(&mut other).unwrap_err(),
            CaptureError::WrongSurface { expected: "tab-1".into(), found: "tab-2".into() }
        );
        assert!(session.is_recording());
        assert_eq!(p.surface.active_listeners(), EventFamily::ALL.len());
        assert_eq!(p.surface.owner(), Some(session.id()));

        let trace = session.stop(&mut p.surface).unwrap();
        assert_eq!(trace.len(), 1);
        assert_eq!(p.surface.active_listeners(), 0);
        assert_eq!(p.surface.owner(), None);
    }

    #[test]
    fn test_stop_capture_hands_session_back_on_other_surface() {
        let mut p = page();
        let mut other = InMemorySurface::new("tab-2", "https://b.test/", Document::new());
        let session = start_capture_with(&mut p.surface, ManualClock::new()).unwrap();

        let session = stop_capture(session, &mut other).unwrap_err();
        assert!(session.is_recording());

        stop_capture(session, &mut p.surface).unwrap();
        assert_eq!(p.surface.active_listeners(), 0);
        assert!(start_capture_with(&mut p.surface, ManualClock::new()).is_ok());
    }

    #[test]
    fn test_stop_when_idle_returns_empty_trace() {
        let mut p = page();
        let mut session = RecordingSession::new(ManualClock::new());
        let trace = session.stop(&mut p.surface).unwrap();
        assert!(trace.is_empty());
        assert_eq!(session.state(), SessionState::Idle);
    }

    #[test]
    fn test_events_map_to_interactions() {
        let mut p = page();
        let clock = ManualClock::new();
        let mut session = start_capture_with(&mut p.surface, clock.clone()).unwrap();

        clock.advance(100);
        p.surface.dispatch(&mut session, &DomEvent::Input { target: p.search, value: "rust".into() });
        clock.advance(100);
        p.surface.dispatch(
            &mut session,
            &DomEvent::Click { target: p.button, client_x: 5.0, client_y: 6.0 },
        );
        clock.advance(100);
        p.surface.dispatch(&mut session, &DomEvent::Submit { target: p.form });
        clock.advance(100);
        p.surface.dispatch(&mut session, &DomEvent::Scroll { scroll_x: 0.0, scroll_y: 240.0 });

        let trace = session.stop(&mut p.surface).unwrap();
        let kinds: Vec<&str> = trace.iter().map(Interaction::kind).collect();
        assert_eq!(kinds, vec!["navigation", "type", "click", "submit", "scroll"]);

        match &trace.interactions()[1] {
            Interaction::Type(t) => {
                assert_eq!(t.selector, "[name=\"q\"]");
                assert_eq!(t.text(), "rust");
                assert_eq!(t.input_kind(), "text");
                assert_eq!(t.relative_time_ms, 100);
            }
            other => panic!("expected type, got {:?}", other),
        }
        match &trace.interactions()[2] {
            Interaction::Click(c) => {
                assert_eq!(c.selector, "button:has-text(\"Sign in\")");
                assert_eq!(c.element_tag, "button");
                assert_eq!(c.text_snippet, "Sign in");
            }
            other => panic!("expected click, got {:?}", other),
        }
        match &trace.interactions()[3] {
            Interaction::Submit(s) => assert_eq!(s.selector, "#login"),
            other => panic!("expected submit, got {:?}", other),
        }
    }

    #[test]
    fn test_password_is_redacted_at_capture() {
        let mut p = page();
        let mut session = start_capture_with(&mut p.surface, ManualClock::new()).unwrap();
        let recorded = p
            .surface
            .dispatch(&mut session, &DomEvent::Input { target: p.password, value: "hunter2".into() })
            .unwrap();

        match recorded {
            Interaction::Type(t) => {
                assert_eq!(t.text(), PASSWORD_SENTINEL);
                assert_eq!(t.input_kind(), "password");
            }
            other => panic!("expected type, got {:?}", other),
        }
    }

    #[test]
    fn test_history_change_only_on_new_url() {
        let mut p = page();
        let mut session = start_capture_with(&mut p.surface, ManualClock::new()).unwrap();

        let same = DomEvent::HistoryChange { url: "https://a.test/login".into() };
        assert!(p.surface.dispatch(&mut session, &same).is_none());

        let next = DomEvent::HistoryChange { url: "https://a.test/home".into() };
        assert!(p.surface.dispatch(&mut session, &next).is_some());
        assert!(p.surface.dispatch(&mut session, &next).is_none());
        assert_eq!(p.surface.current_url(), "https://a.test/home");
    }

    #[test]
    fn test_key_allow_list() {
        let mut p = page();
        let mut session = start_capture_with(&mut p.surface, ManualClock::new()).unwrap();

        let letter = DomEvent::KeyDown { key: "a".into(), target: Some(p.search) };
        assert!(p.surface.dispatch(&mut session, &letter).is_none());

        let enter = DomEvent::KeyDown { key: "Enter".into(), target: Some(p.search) };
        match p.surface.dispatch(&mut session, &enter) {
            Some(Interaction::KeyPress(k)) => {
                assert_eq!(k.key, ControlKey::Enter);
                assert_eq!(k.selector, "[name=\"q\"]");
            }
            other => panic!("expected keypress, got {:?}", other),
        }

        let escape = DomEvent::KeyDown { key: "Escape".into(), target: None };
        match p.surface.dispatch(&mut session, &escape) {
            Some(Interaction::KeyPress(k)) => assert_eq!(k.selector, "document"),
            other => panic!("expected keypress, got {:?}", other),
        }
    }

    #[test]
    fn test_events_after_stop_are_dropped() {
        let mut p = page();
        let mut session = start_capture_with(&mut p.surface, ManualClock::new()).unwrap();
        session.stop(&mut p.surface).unwrap();
        let click = DomEvent::Click { target: p.button, client_x: 0.0, client_y: 0.0 };
        assert!(p.surface.dispatch(&mut session, &click).is_none());
        assert!(session.handle_event(&p.surface, &click).is_none());
    }

    #[test]
    fn test_snippet_is_truncated() {
        let mut p = page();
        p.surface.document_mut().set_text(p.button, &"y".repeat(60));
        let mut session = RecordingSession::new(ManualClock::new()).with_text_snippet_limit(10);
        session.start(&mut p.surface).unwrap();
        let click = DomEvent::Click { target: p.button, client_x: 0.0, client_y: 0.0 };
        match p.surface.dispatch(&mut session, &click) {
            Some(Interaction::Click(c)) => assert_eq!(c.text_snippet.len(), 10),
            other => panic!("expected click, got {:?}", other),
        }
    }

    #[test]
    fn test_relative_time_is_monotonic() {
        let mut p = page();
        let clock = ManualClock::new();
        clock.advance(5_000);
        let mut session = start_capture_with(&mut p.surface, clock.clone()).unwrap();
        for step in [0, 10, 0, 250, 1] {
            clock.advance(step);
            p.surface.dispatch(&mut session, &DomEvent::Scroll { scroll_x: 0.0, scroll_y: step as f64 });
        }
        let trace = session.stop(&mut p.surface).unwrap();
        let times: Vec<u64> = trace.iter().map(Interaction::relative_time_ms).collect();
        assert_eq!(times, vec![0, 0, 10, 10, 260, 261]);
        assert!(trace.validate().is_ok());
    }
}
