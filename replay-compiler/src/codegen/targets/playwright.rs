//! Playwright (Node) renderer

use super::{comment_text, env_var_name, number, quote, Framework, SourceWriter, TargetRenderer};
use crate::codegen::script_compiler::{CompiledScript, FillValue, Statement};

#[derive(Debug, Clone, Copy, Default)]
pub struct PlaywrightRenderer;

impl PlaywrightRenderer {
    fn statement(&self, statement: &Statement) -> Vec<String> {
        match statement {
            Statement::Goto { url } => {
                vec![format!("await page.goto({}, {{ waitUntil: 'networkidle' }});", quote(url))]
            }
            Statement::WaitForLoad => vec!["await page.waitForLoadState('domcontentloaded');".into()],
            Statement::WaitForSelector { selector, timeout_ms } => vec![format!(
                "await page.waitForSelector({}, {{ timeout: {} }});",
                quote(selector),
                timeout_ms
            )],
            Statement::Click { selector } => vec![format!("await page.click({});", quote(selector))],
            Statement::Fill { selector, value } => {
                let value = match value {
                    FillValue::Literal(text) => quote(text),
                    FillValue::Parameter(name) => format!("requireEnv({})", quote(&env_var_name(name))),
                };
                vec![format!("await page.fill({}, {});", quote(selector), value)]
            }
            Statement::ScrollTo { x, y } => vec![format!(
                "await page.evaluate(([x, y]) => window.scrollTo(x, y), [{}, {}]);",
                number(*x),
                number(*y)
            )],
            Statement::Sleep { ms } => vec![format!("await page.waitForTimeout({});", ms)],
            Statement::Submit { selector } => vec![format!(
                "await page.locator({}).evaluate((el) => (el.form || el).requestSubmit());",
                quote(selector)
            )],
            Statement::WaitForNavigation => vec!["await page.waitForLoadState('networkidle');".into()],
            Statement::Press { key } => vec![format!("await page.keyboard.press({});", quote(key.as_str()))],
            Statement::Unsupported { kind } => {
                vec![format!("// unsupported action: {}", comment_text(kind))]
            }
        }
    }
}

impl TargetRenderer for PlaywrightRenderer {
    fn framework(&self) -> Framework {
        Framework::Playwright
    }

    fn render(&self, script: &CompiledScript) -> String {
        let options = &script.options;
        let mut w = SourceWriter::new("  ");

        w.line(format!("// Playwright replay: {}", comment_text(&script.name)))
            .line("// Generated by replay-compiler. Runtime estimate is approximate.")
            .line("const { chromium } = require('playwright');")
            .blank()
            .line(format!(
                "const HEADLESS = process.env.HEADLESS ? process.env.HEADLESS !== 'false' : {};",
                options.headless
            ))
            .line(format!(
                "const TIMEOUT_MS = parseInt(process.env.TIMEOUT_MS || '{}', 10);",
                options.timeout_ms
            ))
            .blank();

        if !script.runtime_secrets.is_empty() {
            w.line("function requireEnv(name) {")
                .indent()
                .line("const value = process.env[name];")
                .line("if (value === undefined) {")
                .indent()
                .line("throw new Error(`Missing required environment variable ${name}`);")
                .dedent()
                .line("}")
                .line("return value;")
                .dedent()
                .line("}")
                .blank();
        }

        w.line("(async () => {")
            .indent()
            .line("const browser = await chromium.launch({ headless: HEADLESS });")
            .line("const context = await browser.newContext();")
            .line("const page = await context.newPage();")
            .line("page.setDefaultTimeout(TIMEOUT_MS);")
            .blank()
            .line("try {")
            .indent();

        for step in &script.steps {
            w.line(format!("// Step {}: {}", step.number, comment_text(&step.kind)));
            for statement in &step.statements {
                for line in self.statement(statement) {
                    w.line(line);
                }
            }
        }

        w.dedent()
            .line("} finally {")
            .indent()
            .line("await browser.close();")
            .dedent()
            .line("}")
            .dedent()
            .line("})().catch((error) => {")
            .indent()
            .line("console.error(error);")
            .line("process.exit(1);")
            .dedent()
            .line("});");

        w.finish()
    }
}
