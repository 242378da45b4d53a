//! Conversion of AWS Lambda trigger events into the canonical request form.

use std::collections::BTreeMap;

use http::header::{HeaderName, HeaderValue};
use http::HeaderMap;
use serde_json::Value;
use thiserror::Error;

use catalyst_ngd_core::CanonicalRequest;

/// Structural problems with an inbound trigger event.
#[derive(Debug, Error)]
pub enum EventError {
    #[error("event is missing the 'http.method' field")]
    MissingMethod,
    #[error("event is missing the 'queryStringParameters' container")]
    MissingQueryParameters,
    #[error("event is missing the 'pathParameters' container")]
    MissingPathParameters,
}

/// Serialise a Lambda trigger event into a [`CanonicalRequest`].
///
/// The event itself is never mutated. A `null` container counts as missing:
/// the platform omits it rather than sending an empty object only when the
/// event is not the HTTP shape this adapter expects.
pub fn canonicalize(event: &Value) -> Result<CanonicalRequest, EventError> {
    let method = event
        .pointer("/http/method")
        .and_then(Value::as_str)
        .ok_or(EventError::MissingMethod)?;

    let context = event.get("requestContext");
    let domain = context
        .and_then(|c| c.get("domainName"))
        .and_then(Value::as_str)
        .unwrap_or_default();
    let path = context
        .and_then(|c| c.get("path"))
        .and_then(Value::as_str)
        .unwrap_or_default();

    let query_params = event
        .get("queryStringParameters")
        .filter(|container| !container.is_null())
        .map(string_map)
        .ok_or(EventError::MissingQueryParameters)?;
    let path_params = event
        .get("pathParameters")
        .filter(|container| !container.is_null())
        .map(string_map)
        .ok_or(EventError::MissingPathParameters)?;
    let headers = header_map(event.get("headers"));

    Ok(CanonicalRequest::new(
        method,
        format!("{domain}{path}"),
        query_params,
        path_params,
        headers,
    ))
}

fn string_map(container: &Value) -> BTreeMap<String, String> {
    let Some(entries) = container.as_object() else {
        return BTreeMap::new();
    };
    entries
        .iter()
        .filter_map(|(key, value)| match value {
            Value::String(value) => Some((key.clone(), value.clone())),
            Value::Null => None,
            other => Some((key.clone(), other.to_string())),
        })
        .collect()
}

fn header_map(container: Option<&Value>) -> HeaderMap {
    let mut headers = HeaderMap::new();
    let Some(entries) = container.and_then(Value::as_object) else {
        return headers;
    };
    for (key, value) in entries {
        let Some(value) = value.as_str() else {
            continue;
        };
        if let (Ok(name), Ok(value)) = (
            HeaderName::from_bytes(key.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            headers.insert(name, value);
        }
    }
    headers
}
