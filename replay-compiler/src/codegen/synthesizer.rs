//! Script Synthesis
//!
//! Pure entry point: trace in, source text per framework out. The trace is
//! compiled once and every requested target renders the same IR, so two
//! calls with the same input produce byte-identical output.

use super::bundle_builder::{BundleBuilder, BundleContext, DerivedConfig};
use super::estimate::estimate_runtime;
use super::script_compiler::{CompiledScript, ScriptCompiler, SynthesisOptions};
use super::targets::Framework;
use crate::synthesis::{classify_security, ParameterExtractor};
use crate::trace::InteractionTrace;
use std::collections::BTreeMap;
use tracing::debug;

/// Framework scripts plus documentation for one trace
#[derive(Debug, Clone, Default)]
pub struct ScriptSynthesizer {
    pub options: SynthesisOptions,
}

impl ScriptSynthesizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: SynthesisOptions) -> Self {
        Self { options }
    }

    /// Compile a trace into the shared IR
    pub fn compile(&self, trace: &InteractionTrace) -> CompiledScript {
        ScriptCompiler::with_options(self.options.clone()).compile(trace)
    }

    /// Source text for each requested framework
    pub fn synthesize(&self, trace: &InteractionTrace, targets: &[Framework]) -> BTreeMap<Framework, String> {
        let script = self.compile(trace);
        let outputs: BTreeMap<Framework, String> = targets
            .iter()
            .map(|framework| (*framework, self.render(&script, *framework)))
            .collect();
        debug!(targets = outputs.len(), steps = script.steps.len(), "Synthesis complete");
        outputs
    }

    /// Render an already compiled script
    pub fn render(&self, script: &CompiledScript, framework: Framework) -> String {
        framework.renderer().render(script)
    }

    fn parameter_extractor(&self) -> ParameterExtractor {
        ParameterExtractor {
            default_headless: self.options.headless,
            default_timeout_ms: self.options.timeout_ms,
        }
    }

    /// Derived configuration object
    pub fn derived_config(&self, trace: &InteractionTrace, targets: &[Framework]) -> DerivedConfig {
        let parameters = self.parameter_extractor().extract(trace);
        let ctx = BundleContext {
            trace,
            parameters: &parameters,
            security: classify_security(trace),
            estimate: estimate_runtime(trace),
            frameworks: targets,
            options: &self.options,
        };
        BundleBuilder::new().derived_config(&ctx)
    }

    /// README for the bundle
    pub fn readme(&self, trace: &InteractionTrace, targets: &[Framework]) -> String {
        let parameters = self.parameter_extractor().extract(trace);
        let ctx = BundleContext {
            trace,
            parameters: &parameters,
            security: classify_security(trace),
            estimate: estimate_runtime(trace),
            frameworks: targets,
            options: &self.options,
        };
        BundleBuilder::new().readme(&ctx)
    }
}

/// Synthesize with default options
pub fn synthesize(trace: &InteractionTrace, targets: &[Framework]) -> BTreeMap<Framework, String> {
    ScriptSynthesizer::new().synthesize(trace, targets)
}
