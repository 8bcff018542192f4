//! Synthesis targets
//!
//! One renderer per automation framework. Renderers print a
//! [`CompiledScript`] without changing its structure: every step gets a
//! `Step N: kind` comment followed by that step's statements.

pub mod playwright;
pub mod puppeteer;
pub mod selenium;
pub mod cypress;

use super::script_compiler::CompiledScript;
use clap::ValueEnum;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;

pub use cypress::CypressRenderer;
pub use playwright::PlaywrightRenderer;
pub use puppeteer::PuppeteerRenderer;
pub use selenium::SeleniumRenderer;

static TEXT_SELECTOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^([a-z][a-z0-9]*):has-text\("((?:[^"\\]|\\.)*)"\)$"#).expect("valid regex")
});

/// Automation framework a script is generated for
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, ValueEnum, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Framework {
    Playwright,
    Puppeteer,
    Selenium,
    Cypress,
}

impl Framework {
    /// Every framework, in output order
    pub const ALL: [Framework; 4] = [
        Framework::Playwright,
        Framework::Puppeteer,
        Framework::Selenium,
        Framework::Cypress,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Framework::Playwright => "playwright",
            Framework::Puppeteer => "puppeteer",
            Framework::Selenium => "selenium",
            Framework::Cypress => "cypress",
        }
    }

    /// File name used when a bundle is written to disk
    pub fn file_name(&self) -> &'static str {
        match self {
            Framework::Playwright => "playwright_script.js",
            Framework::Puppeteer => "puppeteer_script.js",
            Framework::Selenium => "selenium_script.py",
            Framework::Cypress => "cypress_test.cy.js",
        }
    }

    /// Language of the generated source
    pub fn language(&self) -> &'static str {
        match self {
            Framework::Selenium => "python",
            _ => "javascript",
        }
    }

    /// Comment prefix of the generated language
    pub fn comment_prefix(&self) -> &'static str {
        match self {
            Framework::Selenium => "#",
            _ => "//",
        }
    }

    /// Renderer for this framework
    pub fn renderer(&self) -> Box<dyn TargetRenderer + Send + Sync> {
        match self {
            Framework::Playwright => Box::new(PlaywrightRenderer),
            Framework::Puppeteer => Box::new(PuppeteerRenderer),
            Framework::Selenium => Box::new(SeleniumRenderer),
            Framework::Cypress => Box::new(CypressRenderer),
        }
    }
}

impl fmt::Display for Framework {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Framework {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "playwright" | "pw" => Ok(Framework::Playwright),
            "puppeteer" => Ok(Framework::Puppeteer),
            "selenium" => Ok(Framework::Selenium),
            "cypress" | "cy" => Ok(Framework::Cypress),
            _ => Err(format!(
                "Invalid framework: {s}. Use playwright, puppeteer, selenium, or cypress"
            )),
        }
    }
}

/// Prints a compiled script as source text for one framework
pub trait TargetRenderer {
    fn framework(&self) -> Framework;

    fn render(&self, script: &CompiledScript) -> String;
}

/// Double-quoted string literal valid in both JavaScript and Python
pub fn quote(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{2028}' => out.push_str("\\u2028"),
            '\u{2029}' => out.push_str("\\u2029"),
            c if c.is_control() => out.push_str(&format!("\\u{:04x}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Single-line text safe to place after a line comment
pub fn comment_text(value: &str) -> String {
    value
        .chars()
        .map(|c| if c.is_control() || c == '\u{2028}' || c == '\u{2029}' { ' ' } else { c })
        .collect::<String>()
        .replace("*/", "* /")
}

/// Number literal without a trailing `.0` for whole values
pub fn number(value: f64) -> String {
    if !value.is_finite() {
        "0".to_string()
    } else if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}

/// Environment variable that carries a run-time parameter
pub fn env_var_name(parameter: &str) -> String {
    let mut out = String::with_capacity(parameter.len() + 4);
    let mut prev_lower = false;
    for c in parameter.chars() {
        if c.is_ascii_uppercase() && prev_lower {
            out.push('_');
        }
        prev_lower = c.is_ascii_lowercase() || c.is_ascii_digit();
        out.push(if c.is_ascii_alphanumeric() { c.to_ascii_uppercase() } else { '_' });
    }
    out
}

/// `tag:has-text("text")` selectors, split into tag and unescaped text.
///
/// Only Playwright understands `:has-text`; other renderers translate these
/// into their own text lookup. Chained selectors are left alone.
pub fn text_selector(selector: &str) -> Option<(String, String)> {
    let caps = TEXT_SELECTOR.captures(selector)?;
    let tag = caps.get(1)?.as_str().to_string();
    let mut text = String::new();
    let mut chars = caps.get(2)?.as_str().chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some('a') => {
                    text.push('\n');
                    // CSS escapes end with one optional space
                    let rest = chars.as_str();
                    if let Some(stripped) = rest.strip_prefix(' ') {
                        chars = stripped.chars();
                    }
                }
                Some(other) => text.push(other),
                None => {}
            },
            c => text.push(c),
        }
    }
    Some((tag, text))
}

/// Shared line writer with indentation
pub(crate) struct SourceWriter {
    out: String,
    indent: usize,
    unit: &'static str,
}

impl SourceWriter {
    pub(crate) fn new(unit: &'static str) -> Self {
        Self { out: String::new(), indent: 0, unit }
    }

    pub(crate) fn line(&mut self, text: impl AsRef<str>) -> &mut Self {
        let text = text.as_ref();
        if !text.is_empty() {
            for _ in 0..self.indent {
                self.out.push_str(self.unit);
            }
            self.out.push_str(text);
        }
        self.out.push('\n');
        self
    }

    pub(crate) fn blank(&mut self) -> &mut Self {
        self.out.push('\n');
        self
    }

    pub(crate) fn indent(&mut self) -> &mut Self {
        self.indent += 1;
        self
    }

    pub(crate) fn dedent(&mut self) -> &mut Self {
        self.indent = self.indent.saturating_sub(1);
        self
    }

    pub(crate) fn finish(self) -> String {
        self.out
    }
}
