//! Trace Compiler
//!
//! Lowers a trace into a target-independent list of steps. Each interaction
//! becomes exactly one step, in order; nothing is merged or reordered. The
//! per-framework renderers in [`super::targets`] only print this structure.

use crate::synthesis::parameter_extraction::field_name;
use crate::trace::{ControlKey, Interaction, InteractionTrace};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Timing knobs baked into generated scripts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SynthesisOptions {
    /// Bounded wait for a selector before acting on it
    pub selector_timeout_ms: u64,
    /// Pause after a click for client-side re-rendering
    pub click_settle_ms: u64,
    /// Pause after scrolling
    pub scroll_settle_ms: u64,
    /// Default of the `headless` knob
    pub headless: bool,
    /// Default of the `timeoutMs` knob
    pub timeout_ms: u64,
}

impl Default for SynthesisOptions {
    fn default() -> Self {
        Self {
            selector_timeout_ms: 10_000,
            click_settle_ms: 500,
            scroll_settle_ms: 300,
            headless: true,
            timeout_ms: 30_000,
        }
    }
}

/// Value written into a field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FillValue {
    /// Captured text
    Literal(String),
    /// Supplied at run time under this parameter name
    Parameter(String),
}

/// One target-independent statement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Statement {
    /// Load a URL and wait for the network to settle
    Goto { url: String },
    /// Wait for the DOM to be ready
    WaitForLoad,
    WaitForSelector { selector: String, timeout_ms: u64 },
    Click { selector: String },
    Fill { selector: String, value: FillValue },
    ScrollTo { x: f64, y: f64 },
    Sleep { ms: u64 },
    /// Submit the form that is, or contains, the selected element
    Submit { selector: String },
    /// Wait for any navigation triggered by the previous statement
    WaitForNavigation,
    /// Press a key on the focused element
    Press { key: ControlKey },
    /// Visible marker for a kind with no compilation rule
    Unsupported { kind: String },
}

/// Statements for one recorded interaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompiledStep {
    /// 1-based step number
    pub number: usize,
    /// Interaction kind, as it appears in the trace
    pub kind: String,
    pub statements: Vec<Statement>,
}

/// A compiled trace, ready for rendering
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompiledScript {
    pub name: String,
    pub steps: Vec<CompiledStep>,
    pub options: SynthesisOptions,
    /// Parameter names the script reads at run time, in first-use order
    pub runtime_secrets: Vec<String>,
}

impl CompiledScript {
    /// Whether any step has no compilation rule
    pub fn has_unsupported(&self) -> bool {
        self.steps
            .iter()
            .flat_map(|s| &s.statements)
            .any(|s| matches!(s, Statement::Unsupported { .. }))
    }
}

/// Trace to IR compiler
#[derive(Debug, Clone, Default)]
pub struct ScriptCompiler {
    pub options: SynthesisOptions,
}

impl ScriptCompiler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: SynthesisOptions) -> Self {
        Self { options }
    }

    /// Compile every interaction into one step
    pub fn compile(&self, trace: &InteractionTrace) -> CompiledScript {
        let mut runtime_secrets: Vec<String> = Vec::new();
        let steps = trace
            .iter()
            .enumerate()
            .map(|(index, interaction)| {
                let statements = self.compile_interaction(index, interaction, &mut runtime_secrets);
                CompiledStep {
                    number: index + 1,
                    kind: interaction.kind().to_string(),
                    statements,
                }
            })
            .collect::<Vec<_>>();

        debug!(steps = steps.len(), secrets = runtime_secrets.len(), "Trace compiled");
        CompiledScript {
            name: trace.name().to_string(),
            steps,
            options: self.options.clone(),
            runtime_secrets,
        }
    }

    fn compile_interaction(
        &self,
        index: usize,
        interaction: &Interaction,
        runtime_secrets: &mut Vec<String>,
    ) -> Vec<Statement> {
        let wait = |selector: &str| Statement::WaitForSelector {
            selector: selector.to_string(),
            timeout_ms: self.options.selector_timeout_ms,
        };

        match interaction {
            Interaction::Navigation(nav) => vec![
                Statement::Goto { url: nav.url.clone() },
                Statement::WaitForLoad,
            ],
            Interaction::Click(click) => vec![
                wait(&click.selector),
                Statement::Click { selector: click.selector.clone() },
                Statement::Sleep { ms: self.options.click_settle_ms },
            ],
            Interaction::Type(typed) => {
                let value = if typed.is_password() || typed.is_redacted() {
                    let name = field_name(&typed.selector, index);
                    if !runtime_secrets.contains(&name) {
                        runtime_secrets.push(name.clone());
                    }
                    FillValue::Parameter(name)
                } else {
                    FillValue::Literal(typed.text().to_string())
                };
                vec![
                    wait(&typed.selector),
                    Statement::Fill { selector: typed.selector.clone(), value },
                ]
            }
            Interaction::Scroll(scroll) => vec![
                Statement::ScrollTo { x: scroll.x, y: scroll.y },
                Statement::Sleep { ms: self.options.scroll_settle_ms },
            ],
            Interaction::Submit(submit) => vec![
                wait(&submit.selector),
                Statement::Submit { selector: submit.selector.clone() },
                Statement::WaitForNavigation,
            ],
            Interaction::KeyPress(press) => vec![Statement::Press { key: press.key }],
            Interaction::Unknown(unknown) => vec![Statement::Unsupported { kind: unknown.kind.clone() }],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trace::{Click, Coordinates, KeyPress, Navigation, TypeText, UnknownInteraction};
    use chrono::DateTime;

    fn trace() -> InteractionTrace {
        let ts = DateTime::UNIX_EPOCH;
        InteractionTrace::new(
            "login",
            vec![
                Interaction::Navigation(Navigation { url: "https://a.test/".into(), timestamp: ts, relative_time_ms: 0 }),
                Interaction::Type(TypeText::new("#user".into(), "input".into(), "ada", "text", ts, 10)),
                Interaction::Type(TypeText::new("#pass".into(), "input".into(), "s3cret", "password", ts, 20)),
                Interaction::Click(Click {
                    selector: "#go".into(),
                    element_tag: "button".into(),
                    coordinates: Coordinates::default(),
                    text_snippet: "Go".into(),
                    timestamp: ts,
                    relative_time_ms: 30,
                }),
                Interaction::KeyPress(KeyPress { key: ControlKey::Enter, selector: "#pass".into(), timestamp: ts, relative_time_ms: 40 }),
                Interaction::Unknown(UnknownInteraction {
                    kind: "hover".into(),
                    timestamp: ts,
                    relative_time_ms: 50,
                    data: serde_json::Value::Null,
                }),
            ],
        )
    }

    #[test]
    fn test_one_step_per_interaction() {
        let script = ScriptCompiler::new().compile(&trace());
        assert_eq!(script.steps.len(), 6);
        let numbers: Vec<usize> = script.steps.iter().map(|s| s.number).collect();
        assert_eq!(numbers, vec![1, 2, 3, 4, 5, 6]);
        assert_eq!(script.steps[0].kind, "navigation");
        assert_eq!(script.steps[5].kind, "hover");
    }

    #[test]
    fn test_navigation_lowering() {
        let script = ScriptCompiler::new().compile(&trace());
        assert_eq!(
            script.steps[0].statements,
            vec![Statement::Goto { url: "https://a.test/".into() }, Statement::WaitForLoad]
        );
    }

    #[test]
    fn test_password_becomes_runtime_parameter() {
        let script = ScriptCompiler::new().compile(&trace());
        assert_eq!(
            script.steps[2].statements[1],
            Statement::Fill { selector: "#pass".into(), value: FillValue::Parameter("pass".into()) }
        );
        assert_eq!(script.runtime_secrets, vec!["pass".to_string()]);
        assert_eq!(
            script.steps[1].statements[1],
            Statement::Fill { selector: "#user".into(), value: FillValue::Literal("ada".into()) }
        );
    }

    #[test]
    fn test_click_uses_configured_timing() {
        let options = SynthesisOptions { selector_timeout_ms: 2_000, click_settle_ms: 50, ..Default::default() };
        let script = ScriptCompiler::with_options(options).compile(&trace());
        assert_eq!(
            script.steps[3].statements,
            vec![
                Statement::WaitForSelector { selector: "#go".into(), timeout_ms: 2_000 },
                Statement::Click { selector: "#go".into() },
                Statement::Sleep { ms: 50 },
            ]
        );
    }

    #[test]
    fn test_unknown_kind_is_marked() {
        let script = ScriptCompiler::new().compile(&trace());
        assert!(script.has_unsupported());
        assert_eq!(script.steps[5].statements, vec![Statement::Unsupported { kind: "hover".into() }]);
    }

    #[test]
    fn test_empty_trace() {
        let script = ScriptCompiler::new().compile(&InteractionTrace::empty());
        assert!(script.steps.is_empty());
        assert!(!script.has_unsupported());
    }
}
