//! Script Synthesis & Validation
//!
//! Compiles a trace into a structured IR and renders it for each supported
//! automation framework, plus the README and config bundle.

pub mod script_compiler;
pub mod targets;
pub mod estimate;
pub mod bundle_builder;
pub mod validation;
pub mod synthesizer;

pub use script_compiler::{CompiledScript, CompiledStep, FillValue, ScriptCompiler, Statement, SynthesisOptions};
pub use targets::{Framework, TargetRenderer};
pub use estimate::{estimate_runtime, RuntimeEstimate};
pub use bundle_builder::{BundleBuilder, BundleContext, DerivedConfig};
pub use validation::{ScriptValidator, ValidationResult};
pub use synthesizer::{synthesize, ScriptSynthesizer};
