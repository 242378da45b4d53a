//! Serialisation of pipeline envelopes into the Lambda proxy response shape.

use serde_json::{json, Value};

use catalyst_ngd_core::ResponseEnvelope;

/// Serialise a response envelope for the Lambda HTTP integration.
pub fn to_lambda_response(envelope: &ResponseEnvelope) -> Value {
    json!({
        "isBase64Encoded": false,
        "statusCode": envelope.status,
        "headers": {"Content-Type": "application/json"},
        "body": Value::Object(envelope.body.clone()),
    })
}
