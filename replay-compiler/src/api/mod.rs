//! API contracts for packaging a recording as a service

pub mod openapi;

pub use openapi::{parameter_schema, OpenApiBuilder};
