//! Security Classification
//!
//! Coarse, advisory summary of what a trace touches. Consumed by the README
//! and OpenAPI builders; never blocks synthesis.

use crate::trace::{Interaction, InteractionTrace};
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecuritySummary {
    /// A password field was filled
    pub requires_auth: bool,
    /// A form was submitted
    pub has_form_submission: bool,
    /// Sensitive values are supplied at run time
    pub sensitive_data: bool,
}

impl SecuritySummary {
    /// Whether any flag is set
    pub fn any(&self) -> bool {
        self.requires_auth || self.has_form_submission || self.sensitive_data
    }
}

/// Classify a trace
pub fn classify_security(trace: &InteractionTrace) -> SecuritySummary {
    let has_password = trace
        .iter()
        .any(|i| matches!(i, Interaction::Type(t) if t.is_password()));
    let has_submit = trace.iter().any(|i| matches!(i, Interaction::Submit(_)));

    let summary = SecuritySummary {
        requires_auth: has_password,
        has_form_submission: has_submit,
        sensitive_data: has_password,
    };
    debug!(?summary, "Security classified");
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trace::{Navigation, Submit, TypeText};
    use chrono::DateTime;

    #[test]
    fn test_plain_trace_has_no_flags() {
        let trace = InteractionTrace::new(
            "plain",
            vec![Interaction::Navigation(Navigation {
                url: "https://a.test/".into(),
                timestamp: DateTime::UNIX_EPOCH,
                relative_time_ms: 0,
            })],
        );
        let summary = classify_security(&trace);
        assert_eq!(summary, SecuritySummary::default());
        assert!(!summary.any());
    }

    #[test]
    fn test_login_trace() {
        let trace = InteractionTrace::new(
            "login",
            vec![
                Interaction::Type(TypeText::new(
                    "#pw".into(),
                    "input".into(),
                    "secret",
                    "password",
                    DateTime::UNIX_EPOCH,
                    0,
                )),
                Interaction::Submit(Submit {
                    selector: "#login".into(),
                    element_tag: "form".into(),
                    timestamp: DateTime::UNIX_EPOCH,
                    relative_time_ms: 0,
                }),
            ],
        );
        let summary = classify_security(&trace);
        assert!(summary.requires_auth);
        assert!(summary.has_form_submission);
        assert!(summary.sensitive_data);

        let json = serde_json::to_value(summary).unwrap();
        assert_eq!(json["requiresAuth"], true);
        assert_eq!(json["hasFormSubmission"], true);
    }
}
