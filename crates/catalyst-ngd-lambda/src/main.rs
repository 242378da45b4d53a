//! AWS Lambda trigger for the Catalyst NGD wrapper.
//!
//! One binary serves every wrapper route: the deployment maps each function
//! to a route, and the handler resolves the endpoint variant from the
//! request path. The downstream bindings and schema registry are built once
//! at cold start and shared across invocations.

mod adapter;
mod endpoint;
mod response;
mod tracing_init;

use std::sync::Arc;

use lambda_runtime::{service_fn, Error, LambdaEvent};
use serde_json::Value;
use tracing::{error, info};

use catalyst_ngd_api::NgdApiClient;
use catalyst_ngd_core::{strip_query, ErrorRecord, Pipeline, ResponseEnvelope, SchemaRegistry};

use crate::endpoint::Route;

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_init::init_tracing();

    // The blocking HTTP client must be created and used off the async runtime.
    let client = tokio::task::spawn_blocking(NgdApiClient::from_env).await??;
    info!(base_url = client.base_url(), "NGD wrapper bindings ready");

    let pipeline = Arc::new(Pipeline::new(SchemaRegistry::new(), client.bindings()));

    let handler = service_fn(move |event: LambdaEvent<Value>| {
        let pipeline = Arc::clone(&pipeline);
        async move { Ok::<Value, Error>(handle(pipeline, event).await) }
    });
    lambda_runtime::run(handler).await
}

async fn handle(pipeline: Arc<Pipeline>, event: LambdaEvent<Value>) -> Value {
    let request_id = event.context.request_id.clone();
    let payload = event.payload;

    // The downstream call blocks on HTTP; keep it off the async runtime.
    let result = tokio::task::spawn_blocking(move || process(&pipeline, &payload)).await;
    let envelope = match result {
        Ok(envelope) => envelope,
        Err(join_error) => {
            error!(request_id = %request_id, error = %join_error, "request task failed");
            ErrorRecord::new(500, join_error.to_string()).into()
        }
    };

    if let Some(telemetry) = &envelope.telemetry {
        info!(request_id = %request_id, telemetry = %telemetry, "feature retrieval telemetry");
    }
    info!(request_id = %request_id, status = envelope.status, "request complete");

    response::to_lambda_response(&envelope)
}

/// The outermost wrapper: every structural failure still produces a
/// well-formed response envelope.
fn process(pipeline: &Pipeline, event: &Value) -> ResponseEnvelope {
    let request = match adapter::canonicalize(event) {
        Ok(request) => request,
        Err(event_error) => {
            return ErrorRecord::malformed_event(event_error.to_string()).into()
        }
    };

    match endpoint::resolve(strip_query(&request.url)) {
        Some(Route::Features(endpoint)) => pipeline.handle_features(endpoint, &request),
        Some(Route::LatestCollections) => pipeline.handle_latest_collections(&request),
        None => ErrorRecord::malformed_event(format!(
            "The request path '{}' does not match a wrapper endpoint.",
            strip_query(&request.url)
        ))
        .into(),
    }
}
