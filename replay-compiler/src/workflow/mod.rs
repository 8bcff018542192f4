//! Workflow Module
//!
//! Orchestrates the passes over a trace into a bundle of artifacts.

pub mod pipeline;

pub use pipeline::{ArtifactBundle, ArtifactGenerator, GeneratorConfig};
