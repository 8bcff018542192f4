//! DOM snapshot model
//!
//! The capture engine never touches a live browser; it reads element data
//! from this snapshot when resolving selectors and building interactions.

pub mod document;

pub use document::{Document, DomNode, NodeId, NodeKind};
