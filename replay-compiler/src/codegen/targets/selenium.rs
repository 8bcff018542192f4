//! Selenium (Python) renderer
//!
//! Text selectors become XPath lookups on normalized text.

use super::{
    comment_text, env_var_name, number, quote, text_selector, Framework, SourceWriter,
    TargetRenderer,
};
use crate::codegen::script_compiler::{CompiledScript, FillValue, Statement};
use crate::trace::ControlKey;

#[derive(Debug, Clone, Copy, Default)]
pub struct SeleniumRenderer;

/// XPath string literal, using `concat()` when both quote kinds appear
fn xpath_literal(text: &str) -> String {
    if !text.contains('\'') {
        format!("'{}'", text)
    } else if !text.contains('"') {
        format!("\"{}\"", text)
    } else {
        let parts: Vec<String> = text.split('\'').map(|p| format!("'{}'", p)).collect();
        format!("concat({})", parts.join(", \"'\", "))
    }
}

fn seconds(ms: u64) -> String {
    number(ms as f64 / 1000.0)
}

impl SeleniumRenderer {
    /// `By.X, "value"` locator arguments
    fn locator(&self, selector: &str) -> String {
        match text_selector(selector) {
            Some((tag, text)) => format!(
                "By.XPATH, {}",
                quote(&format!("//{}[normalize-space()={}]", tag, xpath_literal(text.trim())))
            ),
            None => format!("By.CSS_SELECTOR, {}", quote(selector)),
        }
    }

    fn statement(&self, statement: &Statement) -> Vec<String> {
        match statement {
            Statement::Goto { url } => vec![format!("driver.get({})", quote(url))],
            Statement::WaitForLoad | Statement::WaitForNavigation => vec!["wait_for_ready(driver)".into()],
            Statement::WaitForSelector { selector, timeout_ms } => vec![format!(
                "WebDriverWait(driver, {}).until(EC.presence_of_element_located(({})))",
                seconds(*timeout_ms),
                self.locator(selector)
            )],
            Statement::Click { selector } => {
                vec![format!("driver.find_element({}).click()", self.locator(selector))]
            }
            Statement::Fill { selector, value } => {
                let value = match value {
                    FillValue::Literal(text) => quote(text),
                    FillValue::Parameter(name) => format!("os.environ[{}]", quote(&env_var_name(name))),
                };
                vec![
                    format!("field = driver.find_element({})", self.locator(selector)),
                    "field.clear()".into(),
                    format!("field.send_keys({})", value),
                ]
            }
            Statement::ScrollTo { x, y } => vec![format!(
                "driver.execute_script(\"window.scrollTo(arguments[0], arguments[1]);\", {}, {})",
                number(*x),
                number(*y)
            )],
            Statement::Sleep { ms } => vec![format!("time.sleep({})", seconds(*ms))],
            Statement::Submit { selector } => {
                vec![format!("driver.find_element({}).submit()", self.locator(selector))]
            }
            Statement::Press { key } => {
                let key = match key {
                    ControlKey::Enter => "Keys.ENTER",
                    ControlKey::Tab => "Keys.TAB",
                    ControlKey::Escape => "Keys.ESCAPE",
                };
                vec![format!("ActionChains(driver).send_keys({}).perform()", key)]
            }
            Statement::Unsupported { kind } => {
                vec![format!("# unsupported action: {}", comment_text(kind))]
            }
        }
    }
}

impl TargetRenderer for SeleniumRenderer {
    fn framework(&self) -> Framework {
        Framework::Selenium
    }

    fn render(&self, script: &CompiledScript) -> String {
        let options = &script.options;
        let mut w = SourceWriter::new("    ");

        w.line(format!("# Selenium replay: {}", comment_text(&script.name)))
            .line("# Generated by replay-compiler. Runtime estimate is approximate.")
            .line("import os")
            .line("import time")
            .blank()
            .line("from selenium import webdriver")
            .line("from selenium.webdriver.common.action_chains import ActionChains")
            .line("from selenium.webdriver.common.by import By")
            .line("from selenium.webdriver.common.keys import Keys")
            .line("from selenium.webdriver.support import expected_conditions as EC")
            .line("from selenium.webdriver.support.ui import WebDriverWait")
            .blank()
            .line(format!(
                "HEADLESS = os.environ.get(\"HEADLESS\", \"{}\").lower() != \"false\"",
                options.headless
            ))
            .line(format!(
                "TIMEOUT_MS = int(os.environ.get(\"TIMEOUT_MS\", \"{}\"))",
                options.timeout_ms
            ))
            .blank()
            .blank()
            .line("def wait_for_ready(driver):")
            .indent()
            .line("WebDriverWait(driver, TIMEOUT_MS / 1000).until(")
            .indent()
            .line("lambda d: d.execute_script(\"return document.readyState\") == \"complete\"")
            .dedent()
            .line(")")
            .dedent()
            .blank()
            .blank()
            .line("def main():")
            .indent()
            .line("options = webdriver.ChromeOptions()")
            .line("if HEADLESS:")
            .indent()
            .line("options.add_argument(\"--headless=new\")")
            .dedent()
            .line("driver = webdriver.Chrome(options=options)")
            .line("driver.set_page_load_timeout(TIMEOUT_MS / 1000)")
            .line("try:")
            .indent();

        if script.steps.is_empty() {
            w.line("pass");
        }
        for step in &script.steps {
            w.line(format!("# Step {}: {}", step.number, comment_text(&step.kind)));
            for statement in &step.statements {
                for line in self.statement(statement) {
                    w.line(line);
                }
            }
        }

        w.dedent()
            .line("finally:")
            .indent()
            .line("driver.quit()")
            .dedent()
            .dedent()
            .blank()
            .blank()
            .line("if __name__ == \"__main__\":")
            .indent()
            .line("main()");

        w.finish()
    }
}
