//! # Replay Compiler
//!
//! Records browser interactions as a canonical trace and compiles that trace
//! into Playwright, Puppeteer, Selenium and Cypress scripts, plus a parameter
//! list, security summary, runtime estimate, README and OpenAPI contract.
//!
//! ## Quick Start
//!
//! ```no_run
//! use replay_compiler::capture::{InMemorySurface, DomEvent};
//! use replay_compiler::dom::Document;
//! use replay_compiler::{start_capture, stop_capture, synthesize, Framework};
//!
//! let mut doc = Document::new();
//! let body = doc.append_element(replay_compiler::dom::NodeId::DOCUMENT, "body");
//! let button = doc.append_element(body, "button");
//! doc.set_attribute(button, "id", "buy");
//!
//! let mut surface = InMemorySurface::new("tab-1", "https://shop.test/", doc);
//! let mut session = start_capture(&mut surface).expect("surface is free");
//! surface.dispatch(&mut session, &DomEvent::Click { target: button, client_x: 10.0, client_y: 20.0 });
//! let trace = stop_capture(session, &mut surface).expect("same surface");
//!
//! let scripts = synthesize(&trace, &Framework::ALL);
//! println!("{}", scripts[&Framework::Playwright]);
//! ```
//!
//! ## Architecture
//!
//! - [`dom`]: Minimal document model the capture engine reads from
//! - [`capture`]: Selector resolution and the recording session state machine
//! - [`trace`]: Interaction records and the frozen trace
//! - [`synthesis`]: Parameter extraction and security classification
//! - [`codegen`]: Statement IR, per-framework renderers, estimate, bundle, validation
//! - [`enhance`]: Optional AI enhancement with fallback to the basic script
//! - [`api`]: OpenAPI contract for running a recording as a service
//! - [`workflow`]: One-call generation of the full artifact bundle
//! - [`app`]: CLI and configuration management
//!
//! ## Pipeline
//!
//! ```text
//! ┌─────────────┐    ┌─────────────┐    ┌─────────────┐
//! │ DOM events  │───▶│  Capture +  │───▶│    Trace    │
//! │  (surface)  │    │  Selectors  │    │  (frozen)   │
//! └─────────────┘    └─────────────┘    └─────────────┘
//!                                              │
//!                        ┌─────────────────────┼─────────────────────┐
//!                        ▼                     ▼                     ▼
//!                 ┌─────────────┐       ┌─────────────┐       ┌─────────────┐
//!                 │ Parameters  │       │  Scripts ×4 │       │  Estimate   │
//!                 │ + Security  │       │ (IR render) │       │             │
//!                 └─────────────┘       └─────────────┘       └─────────────┘
//! ```

pub mod time;
pub mod dom;
pub mod capture;
pub mod trace;
pub mod synthesis;
pub mod codegen;
pub mod enhance;
pub mod api;
pub mod workflow;
pub mod app;

// Re-export commonly used types
pub use capture::{start_capture, stop_capture, CaptureError, CaptureSurface, RecordingSession};
pub use codegen::{estimate_runtime, synthesize, Framework, RuntimeEstimate, ScriptSynthesizer};
pub use enhance::{EnhanceError, EnhancementPolicy, EnhancerChain, ScriptEnhancer};
pub use synthesis::{classify_security, extract_parameters, Parameter, ParameterType, SecuritySummary};
pub use trace::{Interaction, InteractionTrace, TraceError};
pub use workflow::{ArtifactBundle, ArtifactGenerator};

/// Result type alias for the replay compiler
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the replay compiler
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Capture error: {0}")]
    Capture(#[from] CaptureError),

    #[error("Invalid trace: {0}")]
    Trace(#[from] TraceError),

    #[error("Enhancement error: {0}")]
    Enhancement(#[from] EnhanceError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
