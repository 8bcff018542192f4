//! Generated Script Validation
//!
//! Static checks over synthesized source text: every recorded step must be
//! traceable through its `Step N:` marker, the password sentinel must never
//! appear, and personal-looking literals are flagged for review.

use super::targets::Framework;
use regex::Regex;
use serde::Serialize;
use std::sync::OnceLock;
use crate::trace::PASSWORD_SENTINEL;

/// Globally cached regex patterns compiled once on first use.
struct CachedPatterns {
    hardcoded: Vec<(&'static str, Regex)>,
    step_marker: Regex,
}

fn cached_patterns() -> &'static CachedPatterns {
    static PATTERNS: OnceLock<CachedPatterns> = OnceLock::new();
    PATTERNS.get_or_init(|| CachedPatterns {
        hardcoded: vec![
            (
                "email address",
                Regex::new(r"[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}").expect("valid regex"),
            ),
            ("date", Regex::new(r"\b\d{4}-\d{2}-\d{2}\b").expect("valid regex")),
            ("phone number", Regex::new(r"\b\d{3}[-.]\d{3}[-.]\d{4}\b").expect("valid regex")),
        ],
        step_marker: Regex::new(r"(?m)^\s*(?://|#) Step (\d+): ").expect("valid regex"),
    })
}

/// Validation error
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationError {
    pub error_type: ValidationErrorType,
    pub message: String,
    /// Location (if applicable)
    pub location: Option<String>,
}

/// Types of validation errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationErrorType {
    /// A recorded step has no marker in the output
    MissingStep,
    /// Step markers are out of order
    StepOrder,
    /// The password sentinel was emitted as a literal
    LeakedSentinel,
}

/// Validation result
#[derive(Debug, Clone, Serialize)]
pub struct ValidationResult {
    pub passed: bool,
    pub errors: Vec<ValidationError>,
    /// Findings worth a look that do not fail validation
    pub warnings: Vec<String>,
}

impl ValidationResult {
    fn from_findings(errors: Vec<ValidationError>, warnings: Vec<String>) -> Self {
        Self {
            passed: errors.is_empty(),
            errors,
            warnings,
        }
    }
}

/// Script validator
pub struct ScriptValidator {
    hardcoded_patterns: &'static [(&'static str, Regex)],
    step_marker: &'static Regex,
}

impl ScriptValidator {
    /// Create a new validator (patterns are compiled once and cached globally)
    pub fn new() -> Self {
        let patterns = cached_patterns();
        Self {
            hardcoded_patterns: &patterns.hardcoded,
            step_marker: &patterns.step_marker,
        }
    }

    /// Validate one generated script against the number of recorded steps
    pub fn validate(&self, framework: Framework, source: &str, expected_steps: usize) -> ValidationResult {
        let mut errors = Vec::new();
        let mut warnings = Vec::new();

        errors.extend(self.check_step_markers(framework, source, expected_steps));
        errors.extend(self.check_sentinel(framework, source));
        warnings.extend(self.check_hardcoded_literals(framework, source));

        let unsupported = source.matches("unsupported action:").count();
        if unsupported > 0 {
            warnings.push(format!(
                "{}: {} step(s) have no compilation rule and are left as markers",
                framework, unsupported
            ));
        }

        ValidationResult::from_findings(errors, warnings)
    }

    fn check_step_markers(&self, framework: Framework, source: &str, expected: usize) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        let found: Vec<usize> = self
            .step_marker
            .captures_iter(source)
            .filter_map(|c| c[1].parse().ok())
            .collect();

        for n in 1..=expected {
            if !found.contains(&n) {
                errors.push(ValidationError {
                    error_type: ValidationErrorType::MissingStep,
                    message: format!("{}: step {} has no marker", framework, n),
                    location: Some(format!("Step {}", n)),
                });
            }
        }

        if found.windows(2).any(|w| w[1] <= w[0]) {
            errors.push(ValidationError {
                error_type: ValidationErrorType::StepOrder,
                message: format!("{}: step markers are not in recorded order", framework),
                location: None,
            });
        }

        errors
    }

    fn check_sentinel(&self, framework: Framework, source: &str) -> Vec<ValidationError> {
        source
            .lines()
            .enumerate()
            .filter(|(_, line)| line.contains(PASSWORD_SENTINEL))
            .map(|(i, _)| ValidationError {
                error_type: ValidationErrorType::LeakedSentinel,
                message: format!("{}: password sentinel emitted as a literal", framework),
                location: Some(format!("line {}", i + 1)),
            })
            .collect()
    }

    /// Literals that look like personal data, outside comments
    fn check_hardcoded_literals(&self, framework: Framework, source: &str) -> Vec<String> {
        let prefix = framework.comment_prefix();
        let mut warnings = Vec::new();
        for (i, line) in source.lines().enumerate() {
            if line.trim_start().starts_with(prefix) {
                continue;
            }
            for (label, pattern) in self.hardcoded_patterns {
                for m in pattern.find_iter(line) {
                    warnings.push(format!(
                        "{}: hardcoded {} '{}' on line {}; consider a parameter",
                        framework,
                        label,
                        m.as_str(),
                        i + 1
                    ));
                }
            }
        }
        warnings
    }
}

impl Default for ScriptValidator {
    fn default() -> Self {
        Self::new()
    }
}
