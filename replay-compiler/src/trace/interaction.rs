//! Canonical Interaction Records
//!
//! A closed set of interaction kinds plus an explicit `Unknown` arm for
//! records written by newer producers. Every consumer matches exhaustively.
//!
//! Wire format is JSON with a `type` tag and camelCase fields.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Value stored instead of the text typed into a password field
pub const PASSWORD_SENTINEL: &str = "[PASSWORD]";

/// Input kind that triggers redaction
pub const PASSWORD_INPUT_KIND: &str = "password";

/// Viewport coordinates of a click
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Coordinates {
    pub x: f64,
    pub y: f64,
}

/// Control keys that are recorded. Everything else is keystroke noise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ControlKey {
    Enter,
    Tab,
    Escape,
}

impl ControlKey {
    /// Map a DOM `KeyboardEvent.key` value onto the allow-list
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "Enter" => Some(ControlKey::Enter),
            "Tab" => Some(ControlKey::Tab),
            "Escape" => Some(ControlKey::Escape),
            _ => None,
        }
    }

    /// DOM key name
    pub fn as_str(&self) -> &'static str {
        match self {
            ControlKey::Enter => "Enter",
            ControlKey::Tab => "Tab",
            ControlKey::Escape => "Escape",
        }
    }
}

impl fmt::Display for ControlKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Page navigation (initial load or history change)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Navigation {
    pub url: String,
    pub timestamp: DateTime<Utc>,
    pub relative_time_ms: u64,
}

/// Click on an element
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Click {
    pub selector: String,
    pub element_tag: String,
    pub coordinates: Coordinates,
    #[serde(default)]
    pub text_snippet: String,
    pub timestamp: DateTime<Utc>,
    pub relative_time_ms: u64,
}

/// Text entered into a field.
///
/// The text is private: every construction path, including deserialization,
/// goes through redaction, so a password-kind record only ever holds the
/// sentinel.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeText {
    pub selector: String,
    pub element_tag: String,
    text: String,
    input_kind: String,
    pub timestamp: DateTime<Utc>,
    pub relative_time_ms: u64,
}

/// Wire shape of [`TypeText`] before redaction
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TypeTextRecord {
    selector: String,
    element_tag: String,
    text: String,
    #[serde(default = "default_input_kind")]
    input_kind: String,
    timestamp: DateTime<Utc>,
    relative_time_ms: u64,
}

fn default_input_kind() -> String {
    "text".to_string()
}

impl<'de> Deserialize<'de> for TypeText {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let record = TypeTextRecord::deserialize(deserializer)?;
        Ok(TypeText::new(
            record.selector,
            record.element_tag,
            &record.text,
            &record.input_kind,
            record.timestamp,
            record.relative_time_ms,
        ))
    }
}

impl TypeText {
    /// Create a typed-text record, replacing password values with the sentinel
    pub fn new(
        selector: String,
        element_tag: String,
        value: &str,
        input_kind: &str,
        timestamp: DateTime<Utc>,
        relative_time_ms: u64,
    ) -> Self {
        let input_kind = input_kind.to_ascii_lowercase();
        let text = if input_kind == PASSWORD_INPUT_KIND {
            PASSWORD_SENTINEL.to_string()
        } else {
            value.to_string()
        };
        Self {
            selector,
            element_tag,
            text,
            input_kind,
            timestamp,
            relative_time_ms,
        }
    }

    /// Recorded text, or the sentinel for password fields
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Lowercase `type` attribute of the source input
    pub fn input_kind(&self) -> &str {
        &self.input_kind
    }

    /// Whether the source input was a password field
    pub fn is_password(&self) -> bool {
        self.input_kind == PASSWORD_INPUT_KIND
    }

    /// Whether the text is the redaction sentinel
    pub fn is_redacted(&self) -> bool {
        self.text == PASSWORD_SENTINEL
    }
}

/// Absolute scroll offsets
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scroll {
    pub x: f64,
    pub y: f64,
    pub timestamp: DateTime<Utc>,
    pub relative_time_ms: u64,
}

/// Form submission
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Submit {
    pub selector: String,
    pub element_tag: String,
    pub timestamp: DateTime<Utc>,
    pub relative_time_ms: u64,
}

/// Allow-listed control key
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyPress {
    pub key: ControlKey,
    pub selector: String,
    pub timestamp: DateTime<Utc>,
    pub relative_time_ms: u64,
}

/// Record of a kind this build does not know about
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnknownInteraction {
    /// Original `type` tag
    pub kind: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub relative_time_ms: u64,
    /// The raw record
    #[serde(default)]
    pub data: serde_json::Value,
}

impl UnknownInteraction {
    fn from_value(kind: String, value: serde_json::Value) -> Self {
        let timestamp = value
            .get("timestamp")
            .and_then(|t| serde_json::from_value::<DateTime<Utc>>(t.clone()).ok())
            .unwrap_or(DateTime::UNIX_EPOCH);
        let relative_time_ms = value
            .get("relativeTimeMs")
            .and_then(serde_json::Value::as_u64)
            .unwrap_or(0);
        Self {
            kind,
            timestamp,
            relative_time_ms,
            data: value,
        }
    }
}

/// One recorded step
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Interaction {
    Navigation(Navigation),
    Click(Click),
    Type(TypeText),
    Scroll(Scroll),
    Submit(Submit),
    KeyPress(KeyPress),
    Unknown(UnknownInteraction),
}

impl Interaction {
    /// Wire tag of this interaction (the original tag for unknown records)
    pub fn kind(&self) -> &str {
        match self {
            Interaction::Navigation(_) => "navigation",
            Interaction::Click(_) => "click",
            Interaction::Type(_) => "type",
            Interaction::Scroll(_) => "scroll",
            Interaction::Submit(_) => "submit",
            Interaction::KeyPress(_) => "keypress",
            Interaction::Unknown(u) => &u.kind,
        }
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            Interaction::Navigation(i) => i.timestamp,
            Interaction::Click(i) => i.timestamp,
            Interaction::Type(i) => i.timestamp,
            Interaction::Scroll(i) => i.timestamp,
            Interaction::Submit(i) => i.timestamp,
            Interaction::KeyPress(i) => i.timestamp,
            Interaction::Unknown(i) => i.timestamp,
        }
    }

    pub fn relative_time_ms(&self) -> u64 {
        match self {
            Interaction::Navigation(i) => i.relative_time_ms,
            Interaction::Click(i) => i.relative_time_ms,
            Interaction::Type(i) => i.relative_time_ms,
            Interaction::Scroll(i) => i.relative_time_ms,
            Interaction::Submit(i) => i.relative_time_ms,
            Interaction::KeyPress(i) => i.relative_time_ms,
            Interaction::Unknown(i) => i.relative_time_ms,
        }
    }

    /// Target selector, for kinds that have one
    pub fn selector(&self) -> Option<&str> {
        match self {
            Interaction::Click(i) => Some(&i.selector),
            Interaction::Type(i) => Some(&i.selector),
            Interaction::Submit(i) => Some(&i.selector),
            Interaction::KeyPress(i) => Some(&i.selector),
            Interaction::Navigation(_) | Interaction::Scroll(_) | Interaction::Unknown(_) => None,
        }
    }

    /// Whether this is a known kind
    pub fn is_known(&self) -> bool {
        !matches!(self, Interaction::Unknown(_))
    }
}

impl<'de> Deserialize<'de> for Interaction {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        use serde::de::Error;

        let value = serde_json::Value::deserialize(deserializer)?;
        let kind = value
            .get("type")
            .and_then(serde_json::Value::as_str)
            .ok_or_else(|| D::Error::missing_field("type"))?
            .to_string();

        let parsed = match kind.as_str() {
            "navigation" => serde_json::from_value(value).map(Interaction::Navigation),
            "click" => serde_json::from_value(value).map(Interaction::Click),
            "type" => serde_json::from_value(value).map(Interaction::Type),
            "scroll" => serde_json::from_value(value).map(Interaction::Scroll),
            "submit" => serde_json::from_value(value).map(Interaction::Submit),
            "keypress" => serde_json::from_value(value).map(Interaction::KeyPress),
            "unknown" => serde_json::from_value(value).map(Interaction::Unknown),
            _ => return Ok(Interaction::Unknown(UnknownInteraction::from_value(kind, value))),
        };
        parsed.map_err(D::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts() -> DateTime<Utc> {
        DateTime::UNIX_EPOCH
    }

    #[test]
    fn test_control_key_allow_list() {
        assert_eq!(ControlKey::from_key("Enter"), Some(ControlKey::Enter));
        assert_eq!(ControlKey::from_key("Tab"), Some(ControlKey::Tab));
        assert_eq!(ControlKey::from_key("Escape"), Some(ControlKey::Escape));
        assert_eq!(ControlKey::from_key("a"), None);
        assert_eq!(ControlKey::from_key("Backspace"), None);
    }

    #[test]
    fn test_password_redacted_on_construction() {
        let t = TypeText::new("#pw".into(), "input".into(), "hunter2", "password", ts(), 10);
        assert_eq!(t.text(), PASSWORD_SENTINEL);
        assert!(t.is_redacted());
    }

    #[test]
    fn test_password_kind_is_case_insensitive() {
        let t = TypeText::new("#pw".into(), "input".into(), "secret", "PASSWORD", ts(), 0);
        assert_eq!(t.text(), PASSWORD_SENTINEL);
    }

    #[test]
    fn test_text_input_is_kept() {
        let t = TypeText::new("#q".into(), "input".into(), "[PASSWORD]-like", "search", ts(), 0);
        assert_eq!(t.text(), "[PASSWORD]-like");
        assert!(!t.is_password());
    }

    #[test]
    fn test_wire_format_tags() {
        let nav = Interaction::Navigation(Navigation {
            url: "https://example.com".into(),
            timestamp: ts(),
            relative_time_ms: 0,
        });
        let json = serde_json::to_value(&nav).unwrap();
        assert_eq!(json["type"], "navigation");
        assert_eq!(json["relativeTimeMs"], 0);

        let key = Interaction::KeyPress(KeyPress {
            key: ControlKey::Enter,
            selector: "#q".into(),
            timestamp: ts(),
            relative_time_ms: 5,
        });
        let json = serde_json::to_value(&key).unwrap();
        assert_eq!(json["type"], "keypress");
        assert_eq!(json["key"], "Enter");
    }

    #[test]
    fn test_unknown_kind_is_preserved() {
        let raw = r##"{"type":"hover","selector":"#menu","timestamp":"2024-01-01T00:00:00Z","relativeTimeMs":1200}"##;
        let parsed: Interaction = serde_json::from_str(raw).unwrap();
        match &parsed {
            Interaction::Unknown(u) => {
                assert_eq!(u.kind, "hover");
                assert_eq!(u.relative_time_ms, 1200);
                assert_eq!(u.data["selector"], "#menu");
            }
            other => panic!("expected unknown, got {:?}", other),
        }
        assert_eq!(parsed.kind(), "hover");
        assert!(!parsed.is_known());

        // Survives a second trip
        let json = serde_json::to_string(&parsed).unwrap();
        let again: Interaction = serde_json::from_str(&json).unwrap();
        assert_eq!(again.kind(), "hover");
    }

    #[test]
    fn test_deserialize_redacts_leaked_password() {
        let raw = r##"{"type":"type","selector":"#pw","elementTag":"input","text":"hunter2","inputKind":"password","timestamp":"2024-01-01T00:00:00Z","relativeTimeMs":3}"##;
        let parsed: Interaction = serde_json::from_str(raw).unwrap();
        match parsed {
            Interaction::Type(t) => assert_eq!(t.text(), PASSWORD_SENTINEL),
            other => panic!("expected type, got {:?}", other),
        }
    }

    #[test]
    fn test_type_record_deserialized_directly_is_redacted() {
        let raw = r##"{"selector":"#pw","elementTag":"input","text":"hunter2","inputKind":"Password","timestamp":"2024-01-01T00:00:00Z","relativeTimeMs":3}"##;
        let parsed: TypeText = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.text(), PASSWORD_SENTINEL);
        assert_eq!(parsed.input_kind(), "password");

        let json = serde_json::to_string(&parsed).unwrap();
        assert!(!json.contains("hunter2"));
        assert!(json.contains("\"inputKind\":\"password\""));
    }

    #[test]
    fn test_type_record_defaults_input_kind_to_text() {
        let raw = r##"{"selector":"#q","elementTag":"input","text":"rust","timestamp":"2024-01-01T00:00:00Z","relativeTimeMs":0}"##;
        let parsed: TypeText = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.input_kind(), "text");
        assert_eq!(parsed.text(), "rust");
    }

    #[test]
    fn test_missing_type_tag_is_error() {
        let raw = r#"{"url":"https://example.com"}"#;
        assert!(serde_json::from_str::<Interaction>(raw).is_err());
    }

    #[test]
    fn test_selector_accessor() {
        let click = Interaction::Click(Click {
            selector: "#go".into(),
            element_tag: "button".into(),
            coordinates: Coordinates { x: 1.0, y: 2.0 },
            text_snippet: "Go".into(),
            timestamp: ts(),
            relative_time_ms: 0,
        });
        assert_eq!(click.selector(), Some("#go"));
        let scroll = Interaction::Scroll(Scroll { x: 0.0, y: 10.0, timestamp: ts(), relative_time_ms: 0 });
        assert_eq!(scroll.selector(), None);
    }
}
