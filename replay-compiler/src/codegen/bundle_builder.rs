//! Documentation and Config Bundle
//!
//! Builds the two non-script synthesis outputs: a README describing how to
//! run the generated scripts and a derived JSON configuration object.

use super::estimate::RuntimeEstimate;
use super::script_compiler::SynthesisOptions;
use super::targets::{env_var_name, Framework};
use crate::synthesis::{Parameter, SecuritySummary};
use crate::trace::{Interaction, InteractionTrace};
use serde::{Deserialize, Serialize};
use std::fmt::Write;

/// Everything the bundle is derived from
#[derive(Debug, Clone, Copy)]
pub struct BundleContext<'a> {
    pub trace: &'a InteractionTrace,
    pub parameters: &'a [Parameter],
    pub security: SecuritySummary,
    pub estimate: RuntimeEstimate,
    pub frameworks: &'a [Framework],
    pub options: &'a SynthesisOptions,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EstimateConfig {
    pub total_ms: u64,
    pub seconds: u64,
    /// Always true: the runtime is a heuristic
    pub is_estimate: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuntimeConfig {
    pub headless: bool,
    pub timeout_ms: u64,
    pub selector_timeout_ms: u64,
    pub click_settle_ms: u64,
    pub scroll_settle_ms: u64,
}

/// Derived configuration object shipped next to the scripts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DerivedConfig {
    pub name: String,
    pub start_url: Option<String>,
    pub frameworks: Vec<Framework>,
    pub step_count: usize,
    pub estimated_runtime: EstimateConfig,
    pub runtime: RuntimeConfig,
    pub parameters: Vec<Parameter>,
    pub security: SecuritySummary,
    /// Step numbers that render as unsupported markers
    pub unsupported_steps: Vec<usize>,
}

/// README and config assembly
pub struct BundleBuilder {
    buffer: String,
}

impl BundleBuilder {
    pub fn new() -> Self {
        Self {
            buffer: String::with_capacity(4096),
        }
    }

    /// Derived configuration for a trace
    pub fn derived_config(&self, ctx: &BundleContext<'_>) -> DerivedConfig {
        DerivedConfig {
            name: ctx.trace.name().to_string(),
            start_url: ctx.trace.metadata().start_url.clone(),
            frameworks: ctx.frameworks.to_vec(),
            step_count: ctx.trace.len(),
            estimated_runtime: EstimateConfig {
                total_ms: ctx.estimate.total_ms,
                seconds: ctx.estimate.seconds,
                is_estimate: true,
            },
            runtime: RuntimeConfig {
                headless: ctx.options.headless,
                timeout_ms: ctx.options.timeout_ms,
                selector_timeout_ms: ctx.options.selector_timeout_ms,
                click_settle_ms: ctx.options.click_settle_ms,
                scroll_settle_ms: ctx.options.scroll_settle_ms,
            },
            parameters: ctx.parameters.to_vec(),
            security: ctx.security,
            unsupported_steps: unsupported_steps(ctx.trace),
        }
    }

    /// README content
    pub fn readme(&mut self, ctx: &BundleContext<'_>) -> String {
        self.buffer.clear();
        // Writing into a String cannot fail
        let _ = self.write_readme(ctx);
        std::mem::take(&mut self.buffer)
    }

    fn write_readme(&mut self, ctx: &BundleContext<'_>) -> std::fmt::Result {
        self.write_overview(ctx)?;
        self.write_files(ctx.frameworks)?;
        self.write_parameters(ctx.parameters)?;
        self.write_security(&ctx.security)?;
        self.write_running(ctx.frameworks, ctx.parameters)?;
        self.write_steps(ctx.trace)?;
        Ok(())
    }

    fn write_overview(&mut self, ctx: &BundleContext<'_>) -> std::fmt::Result {
        writeln!(self.buffer, "# {}", ctx.trace.name())?;
        writeln!(self.buffer)?;
        writeln!(self.buffer, "Replay scripts generated from a recorded browser session.")?;
        writeln!(self.buffer)?;
        if let Some(url) = &ctx.trace.metadata().start_url {
            writeln!(self.buffer, "- Start URL: {}", url)?;
        }
        writeln!(self.buffer, "- Steps: {}", ctx.trace.len())?;
        writeln!(
            self.buffer,
            "- Estimated runtime: {} ({} ms). This is a heuristic, not a measured duration.",
            ctx.estimate, ctx.estimate.total_ms
        )?;
        writeln!(self.buffer)?;
        Ok(())
    }

    fn write_files(&mut self, frameworks: &[Framework]) -> std::fmt::Result {
        writeln!(self.buffer, "## Files")?;
        writeln!(self.buffer)?;
        writeln!(self.buffer, "| Framework | File | Language |")?;
        writeln!(self.buffer, "|---|---|---|")?;
        for framework in frameworks {
            writeln!(
                self.buffer,
                "| {} | `{}` | {} |",
                framework,
                framework.file_name(),
                framework.language()
            )?;
        }
        writeln!(self.buffer, "| - | `config.json` | json |")?;
        writeln!(self.buffer)?;
        Ok(())
    }

    fn write_parameters(&mut self, parameters: &[Parameter]) -> std::fmt::Result {
        writeln!(self.buffer, "## Parameters")?;
        writeln!(self.buffer)?;
        if parameters.is_empty() {
            writeln!(self.buffer, "None.")?;
            writeln!(self.buffer)?;
            return Ok(());
        }

        writeln!(self.buffer, "| Name | Type | Required | Sensitive | Env var | Example |")?;
        writeln!(self.buffer, "|---|---|---|---|---|---|")?;
        for p in parameters {
            let example = match (&p.example_value, p.sensitive) {
                (_, true) => "(supplied at run time)".to_string(),
                (Some(value), false) => md_code(value),
                (None, false) => String::new(),
            };
            writeln!(
                self.buffer,
                "| `{}` | {} | {} | {} | `{}` | {} |",
                p.name,
                p.param_type,
                if p.required { "yes" } else { "no" },
                if p.sensitive { "yes" } else { "no" },
                env_var_name(&p.name),
                example
            )?;
        }
        writeln!(self.buffer)?;
        Ok(())
    }

    fn write_security(&mut self, security: &SecuritySummary) -> std::fmt::Result {
        writeln!(self.buffer, "## Security")?;
        writeln!(self.buffer)?;
        if !security.any() {
            writeln!(self.buffer, "No authentication, form submission or sensitive input was recorded.")?;
            writeln!(self.buffer)?;
            return Ok(());
        }
        if security.requires_auth {
            writeln!(self.buffer, "- The flow signs in. Password fields are read from the environment at run time; no secret is stored in the scripts.")?;
        }
        if security.has_form_submission {
            writeln!(self.buffer, "- The flow submits a form. Replaying it may create or change data on the target site.")?;
        }
        if security.sensitive_data {
            writeln!(self.buffer, "- Sensitive values are involved. Keep the environment used for replay out of logs.")?;
        }
        writeln!(self.buffer)?;
        Ok(())
    }

    fn write_running(&mut self, frameworks: &[Framework], parameters: &[Parameter]) -> std::fmt::Result {
        writeln!(self.buffer, "## Running")?;
        writeln!(self.buffer)?;
        let secrets: Vec<&Parameter> = parameters.iter().filter(|p| p.sensitive).collect();

        for framework in frameworks {
            writeln!(self.buffer, "### {}", framework)?;
            writeln!(self.buffer)?;
            writeln!(self.buffer, "```sh")?;
            let env: String = secrets
                .iter()
                .map(|p| format!("{}=... ", env_var_name(&p.name)))
                .collect();
            match framework {
                Framework::Playwright => {
                    writeln!(self.buffer, "npm install playwright")?;
                    writeln!(self.buffer, "{}HEADLESS=true node {}", env, framework.file_name())?;
                }
                Framework::Puppeteer => {
                    writeln!(self.buffer, "npm install puppeteer")?;
                    writeln!(self.buffer, "{}HEADLESS=true node {}", env, framework.file_name())?;
                }
                Framework::Selenium => {
                    writeln!(self.buffer, "pip install selenium")?;
                    writeln!(self.buffer, "{}HEADLESS=true python {}", env, framework.file_name())?;
                }
                Framework::Cypress => {
                    let cypress_env: Vec<String> =
                        secrets.iter().map(|p| format!("{}=...", p.name)).collect();
                    writeln!(self.buffer, "npm install cypress")?;
                    if cypress_env.is_empty() {
                        writeln!(self.buffer, "npx cypress run --spec {}", framework.file_name())?;
                    } else {
                        writeln!(
                            self.buffer,
                            "npx cypress run --spec {} --env {}",
                            framework.file_name(),
                            cypress_env.join(",")
                        )?;
                    }
                }
            }
            writeln!(self.buffer, "```")?;
            writeln!(self.buffer)?;
        }
        Ok(())
    }

    fn write_steps(&mut self, trace: &InteractionTrace) -> std::fmt::Result {
        writeln!(self.buffer, "## Steps")?;
        writeln!(self.buffer)?;
        for (index, interaction) in trace.iter().enumerate() {
            writeln!(self.buffer, "{}. {}", index + 1, describe(interaction))?;
        }
        if trace.is_empty() {
            writeln!(self.buffer, "No interactions were recorded.")?;
        }
        Ok(())
    }
}

impl Default for BundleBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// One-line human description of an interaction
pub fn describe(interaction: &Interaction) -> String {
    match interaction {
        Interaction::Navigation(nav) => format!("Navigate to {}", nav.url),
        Interaction::Click(click) if !click.text_snippet.is_empty() => format!(
            "Click {} ({})",
            md_code(&click.selector),
            click.text_snippet.chars().take(40).collect::<String>()
        ),
        Interaction::Click(click) => format!("Click {}", md_code(&click.selector)),
        Interaction::Type(typed) if typed.is_password() || typed.is_redacted() => {
            format!("Type a password into {}", md_code(&typed.selector))
        }
        Interaction::Type(typed) => format!("Type {} into {}", md_code(typed.text()), md_code(&typed.selector)),
        Interaction::Scroll(scroll) => format!("Scroll to ({}, {})", scroll.x, scroll.y),
        Interaction::Submit(submit) => format!("Submit {}", md_code(&submit.selector)),
        Interaction::KeyPress(press) => format!("Press {}", press.key),
        Interaction::Unknown(unknown) => format!("Unsupported action: {}", unknown.kind),
    }
}

fn unsupported_steps(trace: &InteractionTrace) -> Vec<usize> {
    trace
        .iter()
        .enumerate()
        .filter(|(_, i)| !i.is_known())
        .map(|(index, _)| index + 1)
        .collect()
}

/// Inline code span that survives backticks and table pipes
fn md_code(value: &str) -> String {
    let value = value.replace('|', "\\|").replace('\n', " ");
    if value.contains('`') {
        format!("`` {} ``", value)
    } else {
        format!("`{}`", value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::estimate::estimate_runtime;
    use crate::synthesis::{classify_security, extract_parameters};
    use crate::trace::{Navigation, Submit, TypeText, UnknownInteraction};
    use chrono::DateTime;

    fn trace() -> InteractionTrace {
        let ts = DateTime::UNIX_EPOCH;
        InteractionTrace::new(
            "Sign in",
            vec![
                Interaction::Navigation(Navigation { url: "https://a.test/login?next=home".into(), timestamp: ts, relative_time_ms: 0 }),
                Interaction::Type(TypeText::new("#email".into(), "input".into(), "ada@a.test", "email", ts, 5)),
                Interaction::Type(TypeText::new("#password".into(), "input".into(), "hunter2", "password", ts, 9)),
                Interaction::Submit(Submit { selector: "#login".into(), element_tag: "form".into(), timestamp: ts, relative_time_ms: 12 }),
                Interaction::Unknown(UnknownInteraction { kind: "drag".into(), timestamp: ts, relative_time_ms: 20, data: serde_json::Value::Null }),
            ],
        )
    }

    fn with_context<T>(f: impl FnOnce(&BundleContext<'_>) -> T) -> T {
        let trace = trace();
        let parameters = extract_parameters(&trace);
        let options = SynthesisOptions::default();
        let ctx = BundleContext {
            trace: &trace,
            parameters: &parameters,
            security: classify_security(&trace),
            estimate: estimate_runtime(&trace),
            frameworks: &Framework::ALL,
            options: &options,
        };
        f(&ctx)
    }

    #[test]
    fn test_readme_sections() {
        let readme = with_context(|ctx| BundleBuilder::new().readme(ctx));
        assert!(readme.starts_with("# Sign in\n"));
        for heading in ["## Files", "## Parameters", "## Security", "## Running", "## Steps"] {
            assert!(readme.contains(heading), "missing {}", heading);
        }
        assert!(readme.contains("`selenium_script.py`"));
        assert!(readme.contains("heuristic"));
        assert!(readme.contains("PASSWORD=... HEADLESS=true node playwright_script.js"));
        assert!(readme.contains("--env password=..."));
        assert!(readme.contains("5. Unsupported action: drag"));
        assert!(!readme.contains("hunter2"));
    }

    #[test]
    fn test_derived_config() {
        let config = with_context(|ctx| BundleBuilder::new().derived_config(ctx));
        assert_eq!(config.name, "Sign in");
        assert_eq!(config.step_count, 5);
        assert!(config.estimated_runtime.is_estimate);
        assert_eq!(config.unsupported_steps, vec![5]);
        assert!(config.security.requires_auth);
        assert_eq!(config.runtime.timeout_ms, 30_000);

        let json = serde_json::to_value(&config).unwrap();
        assert_eq!(json["startUrl"], "https://a.test/login?next=home");
        assert_eq!(json["frameworks"][3], "cypress");
    }

    #[test]
    fn test_md_code() {
        assert_eq!(md_code("#a"), "`#a`");
        assert_eq!(md_code("a`b"), "`` a`b ``");
        assert_eq!(md_code("a|b"), "`a\\|b`");
    }
}
