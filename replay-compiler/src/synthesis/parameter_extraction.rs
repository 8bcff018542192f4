//! Parameter Extraction
//!
//! Finds the values in a trace that a caller will want to change between
//! runs: query-string values on navigations and text typed into fields.
//! Two run-time knobs (`headless`, `timeoutMs`) are always appended.

use crate::trace::{Interaction, InteractionTrace};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::sync::LazyLock;
use tracing::debug;
use url::Url;

/// Name of the injected headless knob
pub const HEADLESS_PARAM: &str = "headless";

/// Name of the injected timeout knob
pub const TIMEOUT_PARAM: &str = "timeoutMs";

static NAME_FRAGMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"\[name="((?:[^"\\]|\\.)+)"\]"#).expect("valid regex"));

static ID_ATTRIBUTE_FRAGMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"\[id="((?:[^"\\]|\\.)+)"\]"#).expect("valid regex"));

static ID_FRAGMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"#([A-Za-z_][\w-]*)").expect("valid regex"));

/// Turn an arbitrary label into an identifier usable in every target language
pub(crate) fn sanitize_variable_name(name: &str) -> String {
    if name.is_empty() {
        return "unnamed_variable".to_string();
    }

    let sanitized: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect();

    let sanitized = if sanitized.chars().next().map(|c| c.is_ascii_digit()).unwrap_or(false) {
        format!("var_{}", sanitized)
    } else {
        sanitized
    };

    let mut result = String::with_capacity(sanitized.len());
    let mut prev_underscore = false;
    for c in sanitized.chars() {
        if c == '_' {
            if !prev_underscore {
                result.push(c);
            }
            prev_underscore = true;
        } else {
            result.push(c);
            prev_underscore = false;
        }
    }

    let result = result.trim_matches('_').to_string();
    if result.is_empty() {
        "unnamed_variable".to_string()
    } else {
        result
    }
}

/// Value type of a parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterType {
    String,
    Number,
    Boolean,
    Email,
    /// Only used by the injected timeout knob
    Integer,
}

impl ParameterType {
    /// Infer a type from a recorded value: boolean, number, email, string
    pub fn infer(value: &str) -> Self {
        let trimmed = value.trim();
        if trimmed.eq_ignore_ascii_case("true") || trimmed.eq_ignore_ascii_case("false") {
            ParameterType::Boolean
        } else if trimmed.parse::<f64>().map(f64::is_finite).unwrap_or(false) {
            ParameterType::Number
        } else if trimmed.contains('@') {
            ParameterType::Email
        } else {
            ParameterType::String
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ParameterType::String => "string",
            ParameterType::Number => "number",
            ParameterType::Boolean => "boolean",
            ParameterType::Email => "email",
            ParameterType::Integer => "integer",
        }
    }
}

impl fmt::Display for ParameterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a parameter came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParameterSource {
    /// Query string of a navigation
    QueryString,
    /// Text typed into a field
    TypedText,
    /// Injected run-time knob
    Runtime,
}

/// A named run-time input of the generated scripts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Parameter {
    pub name: String,
    #[serde(rename = "type")]
    pub param_type: ParameterType,
    /// Captured value. Absent for sensitive parameters.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub example_value: Option<String>,
    pub required: bool,
    pub sensitive: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_value: Option<serde_json::Value>,
    pub source: ParameterSource,
    /// Index of the originating interaction
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interaction_index: Option<usize>,
}

/// Parameter extraction settings
#[derive(Debug, Clone)]
pub struct ParameterExtractor {
    /// Default of the injected `headless` knob
    pub default_headless: bool,
    /// Default of the injected `timeoutMs` knob
    pub default_timeout_ms: u64,
}

impl ParameterExtractor {
    pub fn new() -> Self {
        Self {
            default_headless: true,
            default_timeout_ms: 30_000,
        }
    }

    /// Extract the ordered, duplicate-free parameter list of a trace
    pub fn extract(&self, trace: &InteractionTrace) -> Vec<Parameter> {
        let mut candidates = Vec::new();

        for (index, interaction) in trace.iter().enumerate() {
            match interaction {
                Interaction::Navigation(nav) => {
                    candidates.extend(self.query_parameters(&nav.url, index));
                }
                Interaction::Type(typed) => {
                    let name = field_name(&typed.selector, index);
                    if typed.is_password() {
                        candidates.push(Parameter {
                            name,
                            param_type: ParameterType::String,
                            example_value: None,
                            required: true,
                            sensitive: true,
                            default_value: None,
                            source: ParameterSource::TypedText,
                            interaction_index: Some(index),
                        });
                    } else if !typed.text().is_empty() && !typed.is_redacted() {
                        candidates.push(Parameter {
                            name,
                            param_type: ParameterType::infer(typed.text()),
                            example_value: Some(typed.text().to_string()),
                            required: true,
                            sensitive: false,
                            default_value: None,
                            source: ParameterSource::TypedText,
                            interaction_index: Some(index),
                        });
                    }
                }
                Interaction::Click(_)
                | Interaction::Scroll(_)
                | Interaction::Submit(_)
                | Interaction::KeyPress(_)
                | Interaction::Unknown(_) => {}
            }
        }

        let mut seen = HashSet::new();
        let mut params: Vec<Parameter> = candidates
            .into_iter()
            .filter(|p| {
                if p.name == HEADLESS_PARAM || p.name == TIMEOUT_PARAM {
                    debug!(name = %p.name, "Recorded parameter shadows a run-time knob, dropped");
                    return false;
                }
                if !seen.insert(p.name.clone()) {
                    debug!(name = %p.name, "Duplicate parameter dropped");
                    return false;
                }
                true
            })
            .collect();

        params.push(Parameter {
            name: HEADLESS_PARAM.to_string(),
            param_type: ParameterType::Boolean,
            example_value: Some(self.default_headless.to_string()),
            required: false,
            sensitive: false,
            default_value: Some(serde_json::Value::Bool(self.default_headless)),
            source: ParameterSource::Runtime,
            interaction_index: None,
        });
        params.push(Parameter {
            name: TIMEOUT_PARAM.to_string(),
            param_type: ParameterType::Integer,
            example_value: Some(self.default_timeout_ms.to_string()),
            required: false,
            sensitive: false,
            default_value: Some(serde_json::Value::from(self.default_timeout_ms)),
            source: ParameterSource::Runtime,
            interaction_index: None,
        });

        debug!(count = params.len(), "Parameters extracted");
        params
    }

    fn query_parameters(&self, url: &str, index: usize) -> Vec<Parameter> {
        let parsed = match Url::parse(url) {
            Ok(parsed) => parsed,
            Err(e) => {
                debug!(%url, error = %e, "Skipping unparsable navigation URL");
                return Vec::new();
            }
        };

        parsed
            .query_pairs()
            .map(|(key, value)| Parameter {
                name: sanitize_variable_name(&key),
                param_type: ParameterType::String,
                example_value: Some(value.into_owned()),
                required: false,
                sensitive: false,
                default_value: None,
                source: ParameterSource::QueryString,
                interaction_index: Some(index),
            })
            .collect()
    }
}

impl Default for ParameterExtractor {
    fn default() -> Self {
        Self::new()
    }
}

/// Parameter name for a field, derived from its selector.
///
/// Prefers `[name="…"]`, then `[id="…"]`, then a `#id` fragment; otherwise
/// `field_<index>`. Password fields rendered by the synthesizer use the same
/// name for their run-time lookup.
pub fn field_name(selector: &str, index: usize) -> String {
    let target = last_compound(selector);
    let raw = NAME_FRAGMENT
        .captures(target)
        .or_else(|| ID_ATTRIBUTE_FRAGMENT.captures(target))
        .or_else(|| ID_FRAGMENT.captures(target))
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().replace("\\\"", "\"").replace("\\\\", "\\"));

    match raw {
        Some(raw) => sanitize_variable_name(&raw),
        None => format!("field_{}", index),
    }
}

/// The compound selector after the last `>` combinator, so an ancestor's
/// id or name never labels a descendant field. Quoted text is skipped.
fn last_compound(selector: &str) -> &str {
    let mut start = 0;
    let mut in_quotes = false;
    let mut escaped = false;
    for (i, c) in selector.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            '"' => in_quotes = !in_quotes,
            '>' if !in_quotes => start = i + 1,
            _ => {}
        }
    }
    selector[start..].trim()
}

/// Extract parameters with default run-time knobs
pub fn extract_parameters(trace: &InteractionTrace) -> Vec<Parameter> {
    ParameterExtractor::new().extract(trace)
}
