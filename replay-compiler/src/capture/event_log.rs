//! Event Log Replay
//!
//! A recorded stream of native page events plus the DOM snapshot they refer
//! to. Replaying the log through a session produces the same trace a live
//! capture would have, with timing driven by a manual clock.

use super::session::{CaptureError, RecordingSession, DEFAULT_TEXT_SNIPPET_MAX_CHARS};
use super::surface::InMemorySurface;
use super::types::DomEvent;
use crate::dom::Document;
use crate::time::ManualClock;
use crate::trace::InteractionTrace;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

/// One event and the moment it fired
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimedEvent {
    /// Milliseconds since the log started
    pub at_ms: u64,
    pub event: DomEvent,
}

/// Serialized capture input
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventLog {
    /// URL loaded when recording began
    pub url: String,
    /// Wall time of the first event; the Unix epoch when absent
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
    pub document: Document,
    #[serde(default)]
    pub events: Vec<TimedEvent>,
}

/// Replay settings
#[derive(Debug, Clone)]
pub struct ReplayOptions {
    /// Name given to the resulting trace
    pub name: String,
    pub text_snippet_max_chars: usize,
}

impl Default for ReplayOptions {
    fn default() -> Self {
        Self {
            name: "recording".to_string(),
            text_snippet_max_chars: DEFAULT_TEXT_SNIPPET_MAX_CHARS,
        }
    }
}

impl EventLog {
    pub fn load(path: &Path) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn save(&self, path: &Path) -> crate::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Run every event through a fresh session and return the trace.
    ///
    /// Events are delivered in log order. Out-of-order `atMs` values do not
    /// move the clock backwards.
    pub fn replay(&self, options: &ReplayOptions) -> Result<InteractionTrace, CaptureError> {
        let clock = ManualClock::starting_at(self.started_at.unwrap_or(DateTime::UNIX_EPOCH));
        let mut surface = InMemorySurface::new("event-log", self.url.clone(), self.document.clone());
        let mut session = RecordingSession::new(clock.clone())
            .with_name(options.name.clone())
            .with_text_snippet_limit(options.text_snippet_max_chars);

        session.start(&mut surface)?;
        for timed in &self.events {
            clock.set(timed.at_ms);
            surface.dispatch(&mut session, &timed.event);
        }
        let trace = session.stop(&mut surface)?;

        info!(
            events = self.events.len(),
            interactions = trace.len(),
            "Event log replayed"
        );
        Ok(trace)
    }
}
