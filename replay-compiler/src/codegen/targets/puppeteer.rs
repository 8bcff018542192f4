//! Puppeteer (Node) renderer
//!
//! Text selectors become Puppeteer's `::-p-text()` pseudo-element.

use super::{
    comment_text, env_var_name, number, quote, text_selector, Framework, SourceWriter,
    TargetRenderer,
};
use crate::capture::selector::css_string;
use crate::codegen::script_compiler::{CompiledScript, FillValue, Statement};

#[derive(Debug, Clone, Copy, Default)]
pub struct PuppeteerRenderer;

impl PuppeteerRenderer {
    fn selector(&self, selector: &str) -> String {
        match text_selector(selector) {
            Some((tag, text)) => quote(&format!("{}::-p-text({})", tag, css_string(&text))),
            None => quote(selector),
        }
    }

    fn statement(&self, statement: &Statement) -> Vec<String> {
        match statement {
            Statement::Goto { url } => {
                vec![format!("await page.goto({}, {{ waitUntil: 'networkidle0' }});", quote(url))]
            }
            Statement::WaitForLoad => {
                vec!["await page.waitForFunction(() => document.readyState === 'complete');".into()]
            }
            Statement::WaitForSelector { selector, timeout_ms } => vec![format!(
                "await page.waitForSelector({}, {{ timeout: {} }});",
                self.selector(selector),
                timeout_ms
            )],
            Statement::Click { selector } => {
                vec![format!("await page.click({});", self.selector(selector))]
            }
            Statement::Fill { selector, value } => {
                let value = match value {
                    FillValue::Literal(text) => quote(text),
                    FillValue::Parameter(name) => format!("requireEnv({})", quote(&env_var_name(name))),
                };
                vec![format!("await page.locator({}).fill({});", self.selector(selector), value)]
            }
            Statement::ScrollTo { x, y } => vec![format!(
                "await page.evaluate((x, y) => window.scrollTo(x, y), {}, {});",
                number(*x),
                number(*y)
            )],
            Statement::Sleep { ms } => {
                vec![format!("await new Promise((resolve) => setTimeout(resolve, {}));", ms)]
            }
            Statement::Submit { selector } => vec![format!(
                "await page.$eval({}, (el) => (el.form || el).requestSubmit());",
                self.selector(selector)
            )],
            Statement::WaitForNavigation => {
                vec!["await page.waitForNetworkIdle({ timeout: TIMEOUT_MS }).catch(() => {});".into()]
            }
            Statement::Press { key } => vec![format!("await page.keyboard.press({});", quote(key.as_str()))],
            Statement::Unsupported { kind } => {
                vec![format!("// unsupported action: {}", comment_text(kind))]
            }
        }
    }
}

impl TargetRenderer for PuppeteerRenderer {
    fn framework(&self) -> Framework {
        Framework::Puppeteer
    }

    fn render(&self, script: &CompiledScript) -> String {
        let options = &script.options;
        let mut w = SourceWriter::new("  ");

        w.line(format!("// Puppeteer replay: {}", comment_text(&script.name)))
            .line("// Generated by replay-compiler. Runtime estimate is approximate.")
            .line("const puppeteer = require('puppeteer');")
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
            .line("const browser = await puppeteer.launch({ headless: HEADLESS });")
            .line("const page = await browser.newPage();")
            .line("page.setDefaultTimeout(TIMEOUT_MS);")
            .line("page.setDefaultNavigationTimeout(TIMEOUT_MS);")
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_selector_translation() {
        let r = PuppeteerRenderer;
        assert_eq!(
            r.statement(&Statement::Click { selector: "button:has-text(\"Sign in\")".into() }),
            vec!["await page.click(\"button::-p-text(\\\"Sign in\\\")\");"]
        );
        assert_eq!(
            r.statement(&Statement::Click { selector: "#go".into() }),
            vec!["await page.click(\"#go\");"]
        );
    }

    #[test]
    fn test_fill_and_submit() {
        let r = PuppeteerRenderer;
        assert_eq!(
            r.statement(&Statement::Fill {
                selector: "[name=\"q\"]".into(),
                value: FillValue::Literal("rust".into())
            }),
            vec!["await page.locator(\"[name=\\\"q\\\"]\").fill(\"rust\");"]
        );
        assert_eq!(
            r.statement(&Statement::Submit { selector: "#login".into() }),
            vec!["await page.$eval(\"#login\", (el) => (el.form || el).requestSubmit());"]
        );
    }
}
