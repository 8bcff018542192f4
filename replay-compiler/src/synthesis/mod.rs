//! Parameter Extraction & Security Classification
//!
//! Read-only passes over a frozen trace. Both may run concurrently with
//! script synthesis on the same trace.

pub mod parameter_extraction;
pub mod security;

pub use parameter_extraction::{
    extract_parameters, Parameter, ParameterExtractor, ParameterSource, ParameterType,
};
pub use security::{classify_security, SecuritySummary};
