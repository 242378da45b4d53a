//! Uniform error bodies for the wrapper layer.
//!
//! Every stage routes failures through [`ErrorRecord`]; no other error body
//! shape exists. Downstream-reported errors arrive already shaped and pass
//! through untouched.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::validate::ValidationFailure;

/// `errorSource` tag distinguishing wrapper-raised errors from errors
/// reported by the downstream NGD API.
pub const ERROR_SOURCE: &str = "Catalyst Wrapper";

/// The single error body shape: `{code, description, errorSource}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorRecord {
    pub code: u16,
    pub description: String,
    #[serde(rename = "errorSource")]
    pub source: String,
}

impl ErrorRecord {
    pub fn new(code: u16, description: impl Into<String>) -> Self {
        Self {
            code,
            description: description.into(),
            source: ERROR_SOURCE.to_string(),
        }
    }

    /// 405 for any method other than `GET`.
    pub fn unsupported_method() -> Self {
        Self::new(
            405,
            "The HTTP method requested is not supported. This endpoint only supports 'GET' requests.",
        )
    }

    /// 500 for a trigger event missing its expected structure.
    pub fn malformed_event(detail: impl Into<String>) -> Self {
        Self::new(500, detail)
    }

    /// 400 carrying every collected field error.
    pub fn validation(failure: &ValidationFailure) -> Self {
        Self::new(400, failure.to_string())
    }

    /// 500 for a downstream invocation that failed outright.
    pub fn unhandled(error: &anyhow::Error) -> Self {
        Self::new(500, error.to_string())
    }

    /// Render into the JSON body shape shared with downstream-reported
    /// errors.
    pub fn into_body(self) -> Map<String, Value> {
        let mut body = Map::new();
        body.insert("code".to_string(), Value::from(self.code));
        body.insert("description".to_string(), Value::String(self.description));
        body.insert("errorSource".to_string(), Value::String(self.source));
        body
    }
}
