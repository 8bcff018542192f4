//! Artifact Generator
//!
//! Runs every pass over a frozen trace and gathers the results into one
//! bundle: scripts per framework, parameters, security summary, runtime
//! estimate, derived config, README, OpenAPI contract and validation.

use crate::api::OpenApiBuilder;
use crate::codegen::{
    estimate_runtime, BundleBuilder, BundleContext, DerivedConfig, Framework, RuntimeEstimate, ScriptSynthesizer,
    ScriptValidator, SynthesisOptions, ValidationResult,
};
use crate::enhance::{EnhancementOutcome, EnhancementRequest, EnhancerChain};
use crate::synthesis::{classify_security, Parameter, ParameterExtractor, SecuritySummary};
use crate::trace::InteractionTrace;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

pub const CONFIG_FILE: &str = "config.json";
pub const README_FILE: &str = "README.md";
pub const OPENAPI_FILE: &str = "openapi.json";
pub const PARAMETERS_FILE: &str = "parameters.json";

/// Generation settings
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    /// Frameworks to emit; empty means all
    pub frameworks: Vec<Framework>,
    pub synthesis: SynthesisOptions,
    /// Server URL written into the OpenAPI document
    pub server_url: Option<String>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            frameworks: Framework::ALL.to_vec(),
            synthesis: SynthesisOptions::default(),
            server_url: None,
        }
    }
}

/// Everything generated from one trace
#[derive(Debug, Clone)]
pub struct ArtifactBundle {
    pub name: String,
    pub scripts: BTreeMap<Framework, String>,
    pub parameters: Vec<Parameter>,
    pub security: SecuritySummary,
    pub estimate: RuntimeEstimate,
    pub config: DerivedConfig,
    pub readme: String,
    pub openapi: serde_json::Value,
    pub validation: BTreeMap<Framework, ValidationResult>,
    /// Only populated by [`ArtifactGenerator::generate_enhanced`]
    pub enhancement: BTreeMap<Framework, EnhancementOutcome>,
}

impl ArtifactBundle {
    /// Whether every script passed validation
    pub fn passed(&self) -> bool {
        self.validation.values().all(|v| v.passed)
    }

    /// Write the bundle into `dir`, creating it if needed
    pub fn save_to_dir(&self, dir: &Path) -> crate::Result<Vec<PathBuf>> {
        std::fs::create_dir_all(dir)?;
        let mut written = Vec::with_capacity(self.scripts.len() + 4);

        for (framework, source) in &self.scripts {
            let path = dir.join(framework.file_name());
            std::fs::write(&path, source)?;
            written.push(path);
        }

        let files = [
            (CONFIG_FILE, serde_json::to_string_pretty(&self.config)?),
            (PARAMETERS_FILE, serde_json::to_string_pretty(&self.parameters)?),
            (OPENAPI_FILE, serde_json::to_string_pretty(&self.openapi)?),
            (README_FILE, self.readme.clone()),
        ];
        for (name, content) in files {
            let path = dir.join(name);
            std::fs::write(&path, content)?;
            written.push(path);
        }

        info!(dir = %dir.display(), files = written.len(), "Bundle written");
        Ok(written)
    }
}

/// Orchestrates synthesis, extraction, packaging and validation
pub struct ArtifactGenerator {
    config: GeneratorConfig,
    validator: ScriptValidator,
}

impl ArtifactGenerator {
    pub fn new() -> Self {
        Self::with_config(GeneratorConfig::default())
    }

    pub fn with_config(config: GeneratorConfig) -> Self {
        Self {
            config,
            validator: ScriptValidator::new(),
        }
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    fn frameworks(&self) -> Vec<Framework> {
        if self.config.frameworks.is_empty() {
            Framework::ALL.to_vec()
        } else {
            let mut frameworks = self.config.frameworks.clone();
            frameworks.sort();
            frameworks.dedup();
            frameworks
        }
    }

    /// Generate the basic bundle. Fails only for a structurally invalid trace.
    pub fn generate(&self, trace: &InteractionTrace) -> crate::Result<ArtifactBundle> {
        trace.validate()?;
        let frameworks = self.frameworks();

        let synthesizer = ScriptSynthesizer::with_options(self.config.synthesis.clone());
        let scripts = synthesizer.synthesize(trace, &frameworks);

        let parameters = ParameterExtractor {
            default_headless: self.config.synthesis.headless,
            default_timeout_ms: self.config.synthesis.timeout_ms,
        }
        .extract(trace);
        let security = classify_security(trace);
        let estimate = estimate_runtime(trace);

        let ctx = BundleContext {
            trace,
            parameters: &parameters,
            security,
            estimate,
            frameworks: &frameworks,
            options: &self.config.synthesis,
        };
        let mut builder = BundleBuilder::new();
        let config = builder.derived_config(&ctx);
        let readme = builder.readme(&ctx);

        let mut openapi = OpenApiBuilder::new(trace.name())
            .description(format!("Replays the recorded '{}' browser session", trace.name()))
            .frameworks(&frameworks)
            .estimate(estimate);
        if let Some(url) = &self.config.server_url {
            openapi = openapi.server(url.clone());
        }
        let openapi = openapi.build(&parameters, security);

        let validation = scripts
            .iter()
            .map(|(framework, source)| (*framework, self.validator.validate(*framework, source, trace.len())))
            .collect::<BTreeMap<_, _>>();
        for (framework, result) in &validation {
            for warning in &result.warnings {
                debug!(%framework, warning = %warning, "Validation warning");
            }
        }

        info!(
            name = trace.name(),
            steps = trace.len(),
            frameworks = frameworks.len(),
            parameters = parameters.len(),
            "Bundle generated"
        );

        Ok(ArtifactBundle {
            name: trace.name().to_string(),
            scripts,
            parameters,
            security,
            estimate,
            config,
            readme,
            openapi,
            validation,
            enhancement: BTreeMap::new(),
        })
    }

    /// Generate the bundle, then pass each script through the enhancer chain.
    ///
    /// An enhanced script that fails validation is discarded in favor of the
    /// basic one. Errors surface only under the strict policy.
    pub async fn generate_enhanced(
        &self,
        trace: Arc<InteractionTrace>,
        chain: &EnhancerChain,
    ) -> crate::Result<ArtifactBundle> {
        let mut bundle = self.generate(&trace)?;
        let frameworks: Vec<Framework> = bundle.scripts.keys().copied().collect();

        for framework in frameworks {
            let basic = bundle.scripts[&framework].clone();
            let request = EnhancementRequest::new(basic, framework, Arc::clone(&trace));
            let enhanced = chain.run(&request).await?;

            if !enhanced.is_enhanced() {
                bundle.enhancement.insert(framework, enhanced.outcome);
                continue;
            }

            let result = self.validator.validate(framework, &enhanced.source, trace.len());
            if result.passed {
                bundle.scripts.insert(framework, enhanced.source);
                bundle.validation.insert(framework, result);
                bundle.enhancement.insert(framework, enhanced.outcome);
            } else {
                warn!(%framework, errors = result.errors.len(), "Enhanced script failed validation, keeping basic script");
                bundle.enhancement.insert(
                    framework,
                    EnhancementOutcome::Basic {
                        reason: Some("enhanced script failed validation".to_string()),
                    },
                );
            }
        }

        Ok(bundle)
    }
}

impl Default for ArtifactGenerator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enhance::{EnhanceError, EnhancementPolicy, ScriptEnhancer};
    use crate::trace::{Click, Coordinates, Interaction, Navigation, TypeText};
    use async_trait::async_trait;
    use chrono::DateTime;
    use tempfile::TempDir;

    fn login_trace() -> InteractionTrace {
        let ts = DateTime::UNIX_EPOCH;
        InteractionTrace::new(
            "login",
            vec![
                Interaction::Navigation(Navigation {
                    url: "https://app.test/login?next=home".into(),
                    timestamp: ts,
                    relative_time_ms: 0,
                }),
                Interaction::Type(TypeText::new("#user".into(), "input".into(), "ada", "text", ts, 100)),
                Interaction::Type(TypeText::new("#pass".into(), "input".into(), "hunter2", "password", ts, 200)),
                Interaction::Click(Click {
                    selector: "#login".into(),
                    element_tag: "button".into(),
                    coordinates: Coordinates::default(),
                    text_snippet: "Sign in".into(),
                    timestamp: ts,
                    relative_time_ms: 300,
                }),
            ],
        )
    }

    #[test]
    fn test_generate_bundle() {
        let bundle = ArtifactGenerator::new().generate(&login_trace()).unwrap();
        assert_eq!(bundle.scripts.len(), 4);
        assert!(bundle.passed(), "{:?}", bundle.validation);
        assert!(bundle.security.requires_auth);
        assert_eq!(bundle.config.step_count, 4);
        assert!(bundle.openapi["components"]["securitySchemes"].is_object());
        assert!(bundle.scripts.values().all(|s| !s.contains("hunter2")));
    }

    #[test]
    fn test_framework_subset_is_sorted_and_deduped() {
        let config = GeneratorConfig {
            frameworks: vec![Framework::Cypress, Framework::Playwright, Framework::Cypress],
            ..Default::default()
        };
        let bundle = ArtifactGenerator::with_config(config).generate(&login_trace()).unwrap();
        assert_eq!(bundle.scripts.keys().copied().collect::<Vec<_>>(), vec![Framework::Playwright, Framework::Cypress]);
        assert_eq!(bundle.config.frameworks, vec![Framework::Playwright, Framework::Cypress]);
    }

    #[test]
    fn test_invalid_trace_is_rejected() {
        let trace = InteractionTrace::new(
            "bad",
            vec![Interaction::Click(Click {
                selector: "#x".into(),
                element_tag: "button".into(),
                coordinates: Coordinates::default(),
                text_snippet: String::new(),
                timestamp: DateTime::UNIX_EPOCH,
                relative_time_ms: 0,
            })],
        );
        assert!(ArtifactGenerator::new().generate(&trace).is_err());
    }

    #[test]
    fn test_save_to_dir() {
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("bundle");
        let bundle = ArtifactGenerator::new().generate(&login_trace()).unwrap();
        let written = bundle.save_to_dir(&out).unwrap();
        assert_eq!(written.len(), 8);
        for name in ["playwright_script.js", "selenium_script.py", CONFIG_FILE, README_FILE, OPENAPI_FILE] {
            assert!(out.join(name).exists(), "{name} missing");
        }
        let config: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(out.join(CONFIG_FILE)).unwrap()).unwrap();
        assert_eq!(config["name"], "login");
    }

    struct Rewriter(&'static str);

    #[async_trait]
    impl ScriptEnhancer for Rewriter {
        fn name(&self) -> &str {
            "rewriter"
        }

        async fn enhance(&self, request: &EnhancementRequest) -> Result<String, EnhanceError> {
            Ok(format!("{}\n{}", self.0, request.basic_script))
        }
    }

    struct Garbage;

    #[async_trait]
    impl ScriptEnhancer for Garbage {
        fn name(&self) -> &str {
            "garbage"
        }

        async fn enhance(&self, _request: &EnhancementRequest) -> Result<String, EnhanceError> {
            Ok("console.log('nothing to see');".into())
        }
    }

    struct Down;

    #[async_trait]
    impl ScriptEnhancer for Down {
        fn name(&self) -> &str {
            "down"
        }

        async fn enhance(&self, _request: &EnhancementRequest) -> Result<String, EnhanceError> {
            Err(EnhanceError::Status { provider: "down".into(), status: 503 })
        }
    }

    #[tokio::test]
    async fn test_enhanced_scripts_replace_basic() {
        let chain = EnhancerChain::new().push(Rewriter("// reviewed"));
        let bundle = ArtifactGenerator::new()
            .generate_enhanced(Arc::new(login_trace()), &chain)
            .await
            .unwrap();
        assert!(bundle.scripts[&Framework::Playwright].starts_with("// reviewed"));
        assert!(bundle.enhancement.values().all(|o| matches!(o, EnhancementOutcome::Enhanced { .. })));
    }

    #[tokio::test]
    async fn test_invalid_enhancement_keeps_basic() {
        let basic = ArtifactGenerator::new().generate(&login_trace()).unwrap();
        let chain = EnhancerChain::new().push(Garbage);
        let bundle = ArtifactGenerator::new()
            .generate_enhanced(Arc::new(login_trace()), &chain)
            .await
            .unwrap();
        assert_eq!(bundle.scripts, basic.scripts);
        assert!(bundle.passed());
    }

    #[tokio::test]
    async fn test_provider_failure_policies() {
        let trace = Arc::new(login_trace());

        let lenient = EnhancerChain::new().push(Down);
        let bundle = ArtifactGenerator::new().generate_enhanced(trace.clone(), &lenient).await.unwrap();
        assert_eq!(bundle.scripts.len(), 4);
        assert!(bundle.enhancement.values().all(|o| matches!(o, EnhancementOutcome::Basic { .. })));

        let strict = EnhancerChain::new().with_policy(EnhancementPolicy::Strict).push(Down);
        let err = ArtifactGenerator::new().generate_enhanced(trace, &strict).await.unwrap_err();
        assert!(matches!(err, crate::Error::Enhancement(_)));
    }
}
