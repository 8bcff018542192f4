//! Cypress test renderer
//!
//! Text selectors become `cy.contains(tag, text)`. Run-time parameters are
//! read with `Cypress.env()` under their parameter names.

use super::{comment_text, number, quote, text_selector, Framework, SourceWriter, TargetRenderer};
use crate::codegen::script_compiler::{CompiledScript, FillValue, Statement};
use crate::trace::ControlKey;

#[derive(Debug, Clone, Copy, Default)]
pub struct CypressRenderer;

impl CypressRenderer {
    /// Chain start that yields the element, with optional extra options
    fn get(&self, selector: &str, options: Option<String>) -> String {
        let options = options.map(|o| format!(", {}", o)).unwrap_or_default();
        match text_selector(selector) {
            Some((tag, text)) => format!("cy.contains({}, {}{})", quote(&tag), quote(text.trim()), options),
            None => format!("cy.get({}{})", quote(selector), options),
        }
    }

    fn statement(&self, statement: &Statement) -> Vec<String> {
        match statement {
            Statement::Goto { url } => vec![format!("cy.visit({}, {{ timeout }});", quote(url))],
            Statement::WaitForLoad | Statement::WaitForNavigation => {
                vec!["cy.document().its('readyState').should('eq', 'complete');".into()]
            }
            Statement::WaitForSelector { selector, timeout_ms } => vec![format!(
                "{}.should('exist');",
                self.get(selector, Some(format!("{{ timeout: {} }}", timeout_ms)))
            )],
            Statement::Click { selector } => vec![format!("{}.click();", self.get(selector, None))],
            Statement::Fill { selector, value } => match value {
                FillValue::Literal(text) if text.is_empty() => {
                    vec![format!("{}.clear();", self.get(selector, None))]
                }
                FillValue::Literal(text) => vec![format!(
                    "{}.clear().type({}, {{ parseSpecialCharSequences: false }});",
                    self.get(selector, None),
                    quote(text)
                )],
                FillValue::Parameter(name) => vec![format!(
                    "{}.clear().type(Cypress.env({}), {{ log: false }});",
                    self.get(selector, None),
                    quote(name)
                )],
            },
            Statement::ScrollTo { x, y } => vec![format!("cy.scrollTo({}, {});", number(*x), number(*y))],
            Statement::Sleep { ms } => vec![format!("cy.wait({});", ms)],
            Statement::Submit { selector } => vec![format!(
                "{}.then(($el) => ($el[0].form || $el[0]).requestSubmit());",
                self.get(selector, None)
            )],
            Statement::Press { key } => match key {
                ControlKey::Enter => vec!["cy.focused().type('{enter}');".into()],
                ControlKey::Escape => vec!["cy.focused().type('{esc}');".into()],
                ControlKey::Tab => vec!["cy.focused().trigger('keydown', { key: 'Tab' });".into()],
            },
            Statement::Unsupported { kind } => {
                vec![format!("// unsupported action: {}", comment_text(kind))]
            }
        }
    }
}

impl TargetRenderer for CypressRenderer {
    fn framework(&self) -> Framework {
        Framework::Cypress
    }

    fn render(&self, script: &CompiledScript) -> String {
        let mut w = SourceWriter::new("  ");

        w.line(format!("// Cypress replay: {}", comment_text(&script.name)))
            .line("// Generated by replay-compiler. Runtime estimate is approximate.")
            .line(format!("describe({}, () => {{", quote(&script.name)))
            .indent()
            .line("it('replays the recorded interactions', () => {")
            .indent()
            .line(format!(
                "const timeout = Number(Cypress.env('timeoutMs')) || {};",
                script.options.timeout_ms
            ));

        for step in &script.steps {
            w.line(format!("// Step {}: {}", step.number, comment_text(&step.kind)));
            for statement in &step.statements {
                for line in self.statement(statement) {
                    w.line(line);
                }
            }
        }

        w.dedent().line("});").dedent().line("});");
        w.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_selector_uses_contains() {
        let r = CypressRenderer;
        assert_eq!(
            r.statement(&Statement::Click { selector: "a:has-text(\"Docs\")".into() }),
            vec!["cy.contains(\"a\", \"Docs\").click();"]
        );
    }

    #[test]
    fn test_fill_variants() {
        let r = CypressRenderer;
        assert_eq!(
            r.statement(&Statement::Fill { selector: "#q".into(), value: FillValue::Literal("{x}".into()) }),
            vec!["cy.get(\"#q\").clear().type(\"{x}\", { parseSpecialCharSequences: false });"]
        );
        assert_eq!(
            r.statement(&Statement::Fill { selector: "#pw".into(), value: FillValue::Parameter("pw".into()) }),
            vec!["cy.get(\"#pw\").clear().type(Cypress.env(\"pw\"), { log: false });"]
        );
        assert_eq!(
            r.statement(&Statement::Fill { selector: "#q".into(), value: FillValue::Literal(String::new()) }),
            vec!["cy.get(\"#q\").clear();"]
        );
    }

    #[test]
    fn test_wait_for_selector() {
        let r = CypressRenderer;
        assert_eq!(
            r.statement(&Statement::WaitForSelector { selector: "#go".into(), timeout_ms: 10_000 }),
            vec!["cy.get(\"#go\", { timeout: 10000 }).should('exist');"]
        );
    }
}
