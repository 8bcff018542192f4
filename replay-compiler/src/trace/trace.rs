//! Interaction Trace
//!
//! The frozen output of a capture session. A trace is immutable once built:
//! fields are private and only read accessors are exposed, so it can be
//! shared behind an `Arc` between extraction and synthesis.

use super::interaction::Interaction;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;
use uuid::Uuid;

/// Current trace file format version
pub const CURRENT_FORMAT_VERSION: &str = "1.0";

/// Structural problems in a trace loaded from outside the capture engine
#[derive(Debug, Error, PartialEq)]
pub enum TraceError {
    #[error("first interaction must be a navigation, found '{0}'")]
    FirstNotNavigation(String),

    #[error("relativeTimeMs decreases at index {index}: {previous} -> {current}")]
    TimeWentBackwards {
        index: usize,
        previous: u64,
        current: u64,
    },
}

/// Trace metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TraceMetadata {
    /// Unique trace ID
    pub id: Uuid,
    /// Human readable name
    pub name: String,
    /// URL of the initial navigation
    pub start_url: Option<String>,
    /// Timestamp of the first interaction
    pub started_at: Option<DateTime<Utc>>,
    /// Timestamp of the last interaction
    pub ended_at: Option<DateTime<Utc>>,
    /// Number of interactions
    pub interaction_count: usize,
    /// Relative time of the last interaction
    pub duration_ms: u64,
    /// Version of the trace format
    pub format_version: String,
}

impl TraceMetadata {
    fn describe(name: String, interactions: &[Interaction]) -> Self {
        let start_url = interactions.first().and_then(|i| match i {
            Interaction::Navigation(nav) => Some(nav.url.clone()),
            _ => None,
        });
        Self {
            id: Uuid::new_v4(),
            name,
            start_url,
            started_at: interactions.first().map(Interaction::timestamp),
            ended_at: interactions.last().map(Interaction::timestamp),
            interaction_count: interactions.len(),
            duration_ms: interactions.last().map(Interaction::relative_time_ms).unwrap_or(0),
            format_version: CURRENT_FORMAT_VERSION.to_string(),
        }
    }
}

impl Default for TraceMetadata {
    fn default() -> Self {
        Self::describe(String::new(), &[])
    }
}

/// Ordered, immutable list of interactions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InteractionTrace {
    metadata: TraceMetadata,
    interactions: Vec<Interaction>,
}

impl InteractionTrace {
    /// Freeze a list of interactions into a trace
    pub fn new(name: impl Into<String>, interactions: Vec<Interaction>) -> Self {
        Self {
            metadata: TraceMetadata::describe(name.into(), &interactions),
            interactions,
        }
    }

    /// A trace with no interactions
    pub fn empty() -> Self {
        Self::new("untitled", Vec::new())
    }

    pub fn metadata(&self) -> &TraceMetadata {
        &self.metadata
    }

    pub fn name(&self) -> &str {
        &self.metadata.name
    }

    /// Interactions in chronological order
    pub fn interactions(&self) -> &[Interaction] {
        &self.interactions
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Interaction> {
        self.interactions.iter()
    }

    pub fn len(&self) -> usize {
        self.interactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.interactions.is_empty()
    }

    /// Interactions matching a filter
    pub fn interactions_where(&self, filter: impl Fn(&Interaction) -> bool) -> Vec<&Interaction> {
        self.interactions.iter().filter(|i| filter(i)).collect()
    }

    /// Interactions whose kind this build does not recognize
    pub fn unknown_interactions(&self) -> Vec<&Interaction> {
        self.interactions_where(|i| !i.is_known())
    }

    /// Check ordering invariants.
    ///
    /// Captured traces satisfy these by construction; files edited by hand or
    /// written by other producers might not.
    pub fn validate(&self) -> Result<(), TraceError> {
        if let Some(first) = self.interactions.first() {
            if !matches!(first, Interaction::Navigation(_)) {
                return Err(TraceError::FirstNotNavigation(first.kind().to_string()));
            }
        }

        for (index, pair) in self.interactions.windows(2).enumerate() {
            let previous = pair[0].relative_time_ms();
            let current = pair[1].relative_time_ms();
            if current < previous {
                return Err(TraceError::TimeWentBackwards {
                    index: index + 1,
                    previous,
                    current,
                });
            }
        }
        Ok(())
    }

    /// Save as pretty JSON
    pub fn save(&self, path: &Path) -> crate::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Load from a JSON file.
    ///
    /// Warns on a format version mismatch but still attempts to read the file.
    /// Password values are redacted again while deserializing.
    pub fn load(path: &Path) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let trace: InteractionTrace = serde_json::from_str(&content)?;
        if trace.metadata.format_version != CURRENT_FORMAT_VERSION {
            tracing::warn!(
                name = %trace.metadata.name,
                found = %trace.metadata.format_version,
                expected = CURRENT_FORMAT_VERSION,
                "Trace has different format version; some fields may use default values"
            );
        }
        Ok(trace)
    }
}

impl Default for InteractionTrace {
    fn default() -> Self {
        Self::empty()
    }
}

impl<'a> IntoIterator for &'a InteractionTrace {
    type Item = &'a Interaction;
    type IntoIter = std::slice::Iter<'a, Interaction>;

    fn into_iter(self) -> Self::IntoIter {
        self.interactions.iter()
    }
}
