//! Post-processing of downstream results into a response envelope.

use serde_json::{Map, Value};

use crate::error::ErrorRecord;
use crate::schema::CapabilitySchema;

/// Placeholder downstream error guidance uses for the recognized attribute
/// list.
const ATTR_PLACEHOLDER: &str = "{attr}";

/// Body key under which downstream results carry telemetry dimensions.
const TELEMETRY_KEY: &str = "telemetryData";

/// A post-processed result, ready for platform serialisation.
///
/// `telemetry` is detached from the body: it is handed to the telemetry
/// collaborator by the platform layer and never returned to the caller.
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseEnvelope {
    pub status: u16,
    pub body: Map<String, Value>,
    pub telemetry: Option<Value>,
}

/// Post-process a downstream result body.
///
/// Rewrites templated error guidance against the schema (feature endpoints
/// only), detaches the telemetry payload, and resolves the response status
/// from the body's `code` (default 200). The `code` entry itself stays in
/// the body.
pub fn finalize(mut body: Map<String, Value>, schema: Option<&CapabilitySchema>) -> ResponseEnvelope {
    if let Some(schema) = schema {
        rewrite_attribute_guidance(&mut body, schema);
    }
    let telemetry = body.remove(TELEMETRY_KEY);
    let status = body
        .get("code")
        .and_then(Value::as_u64)
        .and_then(|code| u16::try_from(code).ok())
        .unwrap_or(200);
    ResponseEnvelope {
        status,
        body,
        telemetry,
    }
}

/// Downstream errors may template the list of queryable attributes into
/// their guidance; substitute the schema's recognized wire names.
fn rewrite_attribute_guidance(body: &mut Map<String, Value>, schema: &CapabilitySchema) {
    if body.get("errorSource").is_none() {
        return;
    }
    let Some(Value::String(description)) = body.get("description") else {
        return;
    };
    if !description.contains(ATTR_PLACEHOLDER) {
        return;
    }
    let rewritten = description.replace(ATTR_PLACEHOLDER, &schema.attribute_list());
    body.insert("description".to_string(), Value::String(rewritten));
}

impl From<ErrorRecord> for ResponseEnvelope {
    fn from(error: ErrorRecord) -> Self {
        Self {
            status: error.code,
            body: error.into_body(),
            telemetry: None,
        }
    }
}
