//! Integration tests for the capture pipeline
//!
//! DOM events -> surface -> recording session -> frozen trace -> JSON.

use replay_compiler::capture::{
    start_capture, start_capture_with, stop_capture, CaptureError, CaptureSurface, DomEvent, EventLog,
    InMemorySurface, ReplayOptions, SelectorResolver, TimedEvent,
};
use replay_compiler::dom::{Document, NodeId};
use replay_compiler::time::ManualClock;
use replay_compiler::trace::{Interaction, InteractionTrace, PASSWORD_SENTINEL};
use tempfile::TempDir;

struct LoginPage {
    doc: Document,
    user: NodeId,
    pass: NodeId,
    form: NodeId,
    submit: NodeId,
}

/// A login form with a mix of selector hooks
fn login_page() -> LoginPage {
    let mut doc = Document::new();
    let html = doc.append_element(NodeId::DOCUMENT, "html");
    let body = doc.append_element(html, "body");
    let form = doc.append_element(body, "form");
    doc.set_attribute(form, "class", "login-form");

    let user = doc.append_element(form, "input");
    doc.set_attribute(user, "name", "username").set_attribute(user, "type", "text");

    let pass = doc.append_element(form, "input");
    doc.set_attribute(pass, "id", "password").set_attribute(pass, "type", "password");

    let submit = doc.append_element(form, "button");
    doc.set_text(submit, "Sign in");

    LoginPage { doc, user, pass, form, submit }
}

fn assert_trace_invariants(trace: &InteractionTrace) {
    assert!(matches!(trace.interactions().first(), Some(Interaction::Navigation(_))));
    let times: Vec<u64> = trace.iter().map(|i| i.relative_time_ms()).collect();
    assert!(times.windows(2).all(|w| w[0] <= w[1]), "times decrease: {:?}", times);
    assert!(trace.validate().is_ok());
}

#[test]
fn test_full_login_capture() {
    let page = login_page();
    let clock = ManualClock::new();
    let mut surface = InMemorySurface::new("tab", "https://app.test/login", page.doc);
    let mut session = start_capture_with(&mut surface, clock.clone()).unwrap();

    let events = [
        DomEvent::Input { target: page.user, value: "ada".into() },
        DomEvent::Input { target: page.pass, value: "correct horse".into() },
        DomEvent::Click { target: page.submit, client_x: 40.0, client_y: 80.0 },
        DomEvent::Submit { target: page.form },
        DomEvent::HistoryChange { url: "https://app.test/home".into() },
    ];
    for (i, event) in events.iter().enumerate() {
        clock.advance(100 * (i as u64 + 1));
        surface.dispatch(&mut session, event);
    }
    let trace = stop_capture(session, &mut surface).unwrap();

    assert_eq!(trace.len(), 6);
    assert_trace_invariants(&trace);
    let kinds: Vec<&str> = trace.iter().map(|i| i.kind()).collect();
    assert_eq!(kinds, vec!["navigation", "type", "type", "click", "submit", "navigation"]);

    assert_eq!(trace.interactions()[1].selector(), Some("[name=\"username\"]"));
    assert_eq!(trace.interactions()[2].selector(), Some("#password"));
    assert_eq!(trace.interactions()[3].selector(), Some("button:has-text(\"Sign in\")"));
    assert_eq!(trace.interactions()[4].selector(), Some(".login-form"));
    assert_eq!(surface.active_listeners(), 0);
}

#[test]
fn test_password_never_leaks_through_json() {
    let secrets = ["hunter2", "p@ss \"quoted\"", "[PASSWORD]", "ünïcödé-🔑", ""];
    for secret in secrets {
        let page = login_page();
        let mut surface = InMemorySurface::new("tab", "https://app.test/login", page.doc);
        let mut session = start_capture(&mut surface).unwrap();
        surface.dispatch(&mut session, &DomEvent::Input { target: page.pass, value: secret.into() });
        let trace = stop_capture(session, &mut surface).unwrap();

        let json = serde_json::to_string(&trace).unwrap();
        assert!(json.contains(PASSWORD_SENTINEL));
        if !secret.is_empty() && secret != PASSWORD_SENTINEL {
            assert!(!json.contains(secret), "leaked {secret:?}");
        }

        let reloaded: InteractionTrace = serde_json::from_str(&json).unwrap();
        match &reloaded.interactions()[1] {
            Interaction::Type(t) => assert_eq!(t.text(), PASSWORD_SENTINEL),
            other => panic!("expected type, got {:?}", other),
        }
    }
}

#[test]
fn test_id_always_wins() {
    let mut doc = Document::new();
    let body = doc.append_element(NodeId::DOCUMENT, "body");
    let button = doc.append_element(body, "button");
    doc.set_attribute(button, "id", "checkout")
        .set_attribute(button, "data-testid", "buy")
        .set_attribute(button, "name", "go")
        .set_attribute(button, "class", "primary large")
        .set_attribute(button, "aria-label", "Buy now");
    doc.set_text(button, "Buy");
    assert_eq!(SelectorResolver::new().resolve(&doc, button), "#checkout");
}

#[test]
fn test_parentless_element_is_bare_tag() {
    let mut doc = Document::new();
    let orphan = doc.create_detached("SECTION");
    assert_eq!(SelectorResolver::new().resolve(&doc, orphan), "section");
}

#[test]
fn test_second_session_is_rejected_until_first_stops() {
    let page = login_page();
    let mut surface = InMemorySurface::new("tab", "https://app.test/login", page.doc);
    let first = start_capture(&mut surface).unwrap();

    match start_capture(&mut surface) {
        Err(CaptureError::AlreadyRecording { surface: id }) => assert_eq!(id, "tab"),
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("second session must not start"),
    }

    let trace = stop_capture(first, &mut surface).unwrap();
    assert_eq!(trace.len(), 1);
    assert!(surface.owner().is_none());
    assert!(start_capture(&mut surface).is_ok());
}

#[test]
fn test_stop_when_idle_returns_empty_trace() {
    let page = login_page();
    let mut surface = InMemorySurface::new("tab", "https://app.test/login", page.doc);
    let mut session = start_capture(&mut surface).unwrap();
    assert_eq!(session.stop(&mut surface).unwrap().len(), 1);
    assert!(session.stop(&mut surface).unwrap().is_empty());
}

#[test]
fn test_event_log_replay_to_disk() {
    let page = login_page();
    let log = EventLog {
        url: "https://app.test/login".into(),
        started_at: None,
        document: page.doc,
        events: vec![
            TimedEvent { at_ms: 50, event: DomEvent::Input { target: page.user, value: "ada".into() } },
            // Out-of-order timestamp must not move time backwards
            TimedEvent { at_ms: 20, event: DomEvent::Click { target: page.submit, client_x: 0.0, client_y: 0.0 } },
            TimedEvent { at_ms: 90, event: DomEvent::KeyDown { key: "Enter".into(), target: Some(page.user) } },
            TimedEvent { at_ms: 95, event: DomEvent::KeyDown { key: "a".into(), target: Some(page.user) } },
        ],
    };

    let dir = TempDir::new().unwrap();
    let log_path = dir.path().join("events.json");
    log.save(&log_path).unwrap();

    let trace = EventLog::load(&log_path)
        .unwrap()
        .replay(&ReplayOptions { name: "login".into(), ..Default::default() })
        .unwrap();
    assert_eq!(trace.name(), "login");
    assert_eq!(trace.len(), 4);
    assert_trace_invariants(&trace);
    assert_eq!(trace.interactions()[2].relative_time_ms(), 50);

    let trace_path = dir.path().join("trace.json");
    trace.save(&trace_path).unwrap();
    let loaded = InteractionTrace::load(&trace_path).unwrap();
    assert_eq!(loaded.interactions(), trace.interactions());
}
