//! OpenAPI Document Builder
//!
//! Turns the parameter list and security summary of a trace into an
//! OpenAPI 3 contract for a service that runs the generated scripts.

use crate::codegen::{Framework, RuntimeEstimate};
use crate::synthesis::{Parameter, ParameterType, SecuritySummary};
use serde_json::{json, Map, Value};
use tracing::debug;

pub const OPENAPI_VERSION: &str = "3.0.3";
const API_KEY_SCHEME: &str = "ApiKeyAuth";

/// JSON schema for one parameter
pub fn parameter_schema(parameter: &Parameter) -> Value {
    let mut schema = match parameter.param_type {
        ParameterType::String => json!({ "type": "string" }),
        ParameterType::Email => json!({ "type": "string", "format": "email" }),
        ParameterType::Number => json!({ "type": "number" }),
        ParameterType::Integer => json!({ "type": "integer", "minimum": 0 }),
        ParameterType::Boolean => json!({ "type": "boolean" }),
    };

    let Value::Object(fields) = &mut schema else {
        return schema;
    };
    if parameter.sensitive {
        fields.insert("format".into(), json!("password"));
        fields.insert("writeOnly".into(), json!(true));
    } else if let Some(example) = &parameter.example_value {
        fields.insert("example".into(), example_value(parameter.param_type, example));
    }
    if let Some(default) = &parameter.default_value {
        fields.insert("default".into(), default.clone());
    }
    schema
}

fn example_value(param_type: ParameterType, raw: &str) -> Value {
    match param_type {
        ParameterType::Number | ParameterType::Integer => raw
            .parse::<f64>()
            .ok()
            .and_then(serde_json::Number::from_f64)
            .map(Value::Number)
            .unwrap_or_else(|| json!(raw)),
        ParameterType::Boolean => raw.parse::<bool>().map(Value::Bool).unwrap_or_else(|_| json!(raw)),
        ParameterType::String | ParameterType::Email => json!(raw),
    }
}

/// OpenAPI document builder
#[derive(Debug, Clone)]
pub struct OpenApiBuilder {
    title: String,
    version: String,
    description: Option<String>,
    server_url: Option<String>,
    frameworks: Vec<Framework>,
    estimate: Option<RuntimeEstimate>,
}

impl OpenApiBuilder {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            version: "1.0.0".to_string(),
            description: None,
            server_url: None,
            frameworks: Framework::ALL.to_vec(),
            estimate: None,
        }
    }

    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn server(mut self, url: impl Into<String>) -> Self {
        self.server_url = Some(url.into());
        self
    }

    /// Frameworks the service can run; an empty list keeps all four
    pub fn frameworks(mut self, frameworks: &[Framework]) -> Self {
        if !frameworks.is_empty() {
            self.frameworks = frameworks.to_vec();
        }
        self
    }

    pub fn estimate(mut self, estimate: RuntimeEstimate) -> Self {
        self.estimate = Some(estimate);
        self
    }

    /// Request body schema of `POST /run`
    pub fn request_schema(&self, parameters: &[Parameter]) -> Value {
        let mut properties = Map::new();
        let mut required = Vec::new();
        for parameter in parameters {
            properties.insert(parameter.name.clone(), parameter_schema(parameter));
            if parameter.required {
                required.push(json!(parameter.name));
            }
        }

        let mut schema = json!({
            "type": "object",
            "properties": properties,
            "additionalProperties": false,
        });
        if !required.is_empty() {
            schema["required"] = Value::Array(required);
        }
        schema
    }

    pub fn build(&self, parameters: &[Parameter], security: SecuritySummary) -> Value {
        let framework_names: Vec<&str> = self.frameworks.iter().map(|f| f.as_str()).collect();
        let default_framework = framework_names.first().copied().unwrap_or("playwright");

        let mut run = json!({
            "operationId": "runRecording",
            "summary": format!("Replay '{}'", self.title),
            "parameters": [{
                "name": "framework",
                "in": "query",
                "required": false,
                "schema": { "type": "string", "enum": framework_names, "default": default_framework },
            }],
            "requestBody": {
                "required": parameters.iter().any(|p| p.required),
                "content": { "application/json": { "schema": { "$ref": "#/components/schemas/RunRequest" } } },
            },
            "responses": {
                "200": {
                    "description": "Recording replayed",
                    "content": { "application/json": { "schema": { "$ref": "#/components/schemas/RunResult" } } },
                },
                "400": { "description": "Invalid parameters" },
                "500": { "description": "Replay failed" },
            },
        });
        if let Some(estimate) = &self.estimate {
            run["x-estimated-runtime-seconds"] = json!(estimate.seconds);
        }
        if security.requires_auth {
            run["security"] = json!([{ API_KEY_SCHEME: [] }]);
        }

        let mut components = json!({
            "schemas": {
                "RunRequest": self.request_schema(parameters),
                "RunResult": {
                    "type": "object",
                    "required": ["success", "framework"],
                    "properties": {
                        "success": { "type": "boolean" },
                        "framework": { "type": "string", "enum": framework_names },
                        "durationMs": { "type": "integer" },
                        "output": { "type": "string" },
                        "error": { "type": "string" },
                    },
                },
            },
        });
        if security.requires_auth {
            components["securitySchemes"] = json!({
                API_KEY_SCHEME: { "type": "apiKey", "in": "header", "name": "X-API-Key" },
            });
        }

        let mut info = json!({ "title": self.title, "version": self.version });
        if let Some(description) = &self.description {
            info["description"] = json!(description);
        }

        let mut doc = json!({
            "openapi": OPENAPI_VERSION,
            "info": info,
            "paths": {
                "/run": { "post": run },
                "/health": {
                    "get": {
                        "operationId": "health",
                        "responses": { "200": { "description": "Service is up" } },
                    },
                },
            },
            "components": components,
        });
        if let Some(url) = &self.server_url {
            doc["servers"] = json!([{ "url": url }]);
        }

        debug!(parameters = parameters.len(), auth = security.requires_auth, "OpenAPI document built");
        doc
    }
}
