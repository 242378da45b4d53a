//! Router and request handlers for the HTTP service.
//!
//! The handlers are thin: serialise the request parts, run the shared
//! pipeline on the blocking pool, emit any detached telemetry, and mirror
//! the envelope back as JSON. Routes are registered method-agnostic so the
//! pipeline's own 405 body is returned for unsupported methods instead of
//! the router's bare 405.

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::{any, get},
    Json, Router,
};
use serde_json::Value;
use tower_http::trace::TraceLayer;
use tracing::info;
use uuid::Uuid;

use catalyst_ngd_core::{
    CanonicalRequest, Endpoint, ErrorRecord, Pipeline, ResponseEnvelope,
};

use crate::adapter;
use crate::health;

/// Shared application state: the pipeline, built once at startup.
#[derive(Clone)]
pub struct AppState {
    pipeline: Arc<Pipeline>,
}

impl AppState {
    pub fn new(pipeline: Pipeline) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
        }
    }

    pub fn pipeline(&self) -> Arc<Pipeline> {
        Arc::clone(&self.pipeline)
    }
}

/// Build the service router over every wrapper route.
pub fn router(state: AppState) -> Router {
    let mut app = Router::new()
        .route("/features/latest-collections", any(latest_collections))
        .route(
            "/features/latest-collections/{collection}",
            any(latest_collections),
        );

    for endpoint in Endpoint::ALL {
        app = app.route(
            &feature_route(endpoint),
            any(
                move |state: State<AppState>,
                      method: Method,
                      uri: Uri,
                      path_params: Path<BTreeMap<String, String>>,
                      query: Query<BTreeMap<String, String>>,
                      headers: HeaderMap| {
                    features(endpoint, state, method, uri, path_params, query, headers)
                },
            ),
        );
    }

    app.route("/health/live", get(health::health_live))
        .route("/health/ready", get(health::health_ready))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Route template for a feature endpoint. Multi-collection variants live
/// under the fixed `multi-collection` segment; the rest capture a single
/// collection from the path.
fn feature_route(endpoint: Endpoint) -> String {
    if endpoint.capabilities().collection {
        format!("/features/multi-collection/{}", endpoint.route_suffix())
    } else {
        format!("/features/{{collection}}/{}", endpoint.route_suffix())
    }
}

async fn features(
    endpoint: Endpoint,
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    Path(path_params): Path<BTreeMap<String, String>>,
    Query(query): Query<BTreeMap<String, String>>,
    headers: HeaderMap,
) -> Response {
    let request_id = request_id(&headers);
    info!(
        request_id = %request_id,
        endpoint = %endpoint,
        path = %uri.path(),
        "handling features request"
    );

    let request = adapter::canonicalize(&method, &uri, query, path_params, headers);
    let envelope = run_features(state.pipeline(), endpoint, request).await;
    respond(&request_id, envelope)
}

async fn latest_collections(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    Path(path_params): Path<BTreeMap<String, String>>,
    Query(query): Query<BTreeMap<String, String>>,
    headers: HeaderMap,
) -> Response {
    let request_id = request_id(&headers);
    info!(request_id = %request_id, path = %uri.path(), "handling latest collections request");

    let request = adapter::canonicalize(&method, &uri, query, path_params, headers);
    let envelope = run_latest_collections(state.pipeline(), request).await;
    respond(&request_id, envelope)
}

/// The pipeline blocks on the downstream HTTP call; keep it off the async
/// runtime.
async fn run_features(
    pipeline: Arc<Pipeline>,
    endpoint: Endpoint,
    request: CanonicalRequest,
) -> ResponseEnvelope {
    tokio::task::spawn_blocking(move || pipeline.handle_features(endpoint, &request))
        .await
        .unwrap_or_else(|join_error| ErrorRecord::new(500, join_error.to_string()).into())
}

async fn run_latest_collections(
    pipeline: Arc<Pipeline>,
    request: CanonicalRequest,
) -> ResponseEnvelope {
    tokio::task::spawn_blocking(move || pipeline.handle_latest_collections(&request))
        .await
        .unwrap_or_else(|join_error| ErrorRecord::new(500, join_error.to_string()).into())
}

/// Mirror the envelope back to the caller, emitting detached telemetry as a
/// structured log event rather than returning it.
fn respond(request_id: &str, envelope: ResponseEnvelope) -> Response {
    if let Some(telemetry) = &envelope.telemetry {
        info!(request_id = %request_id, telemetry = %telemetry, "feature retrieval telemetry");
    }
    let status =
        StatusCode::from_u16(envelope.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(Value::Object(envelope.body))).into_response()
}

/// Correlation ID: honour `X-Request-ID` when the edge supplies one,
/// otherwise generate a time-sortable UUID v7.
fn request_id(headers: &HeaderMap) -> String {
    headers
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::now_v7().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use axum_test::TestServer;
    use serde_json::json;

    use catalyst_ngd_core::{
        CollectionDirectory, CollectionSelector, DownstreamBindings, FeatureRetriever, ParamValue,
        Payload, RetrievalCall, SchemaRegistry,
    };

    struct RecordingRetriever {
        body: Value,
        calls: Mutex<Vec<RetrievalCall>>,
    }

    impl RecordingRetriever {
        fn new(body: Value) -> Arc<Self> {
            Arc::new(Self {
                body,
                calls: Mutex::new(Vec::new()),
            })
        }

        fn last_call(&self) -> RetrievalCall {
            self.calls
                .lock()
                .unwrap()
                .last()
                .cloned()
                .expect("no call recorded")
        }
    }

    impl FeatureRetriever for RecordingRetriever {
        fn retrieve(&self, call: RetrievalCall) -> anyhow::Result<Payload> {
            self.calls.lock().unwrap().push(call);
            Ok(self.body.as_object().unwrap().clone())
        }
    }

    struct RecordingDirectory {
        calls: Mutex<Vec<Option<Vec<String>>>>,
    }

    impl RecordingDirectory {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                calls: Mutex::new(Vec::new()),
            })
        }
    }

    impl CollectionDirectory for RecordingDirectory {
        fn latest_versions(
            &self,
            _params: &BTreeMap<String, ParamValue>,
        ) -> anyhow::Result<Payload> {
            self.calls.lock().unwrap().push(None);
            Ok(json!({"collection-lookup": {}}).as_object().unwrap().clone())
        }

        fn latest_for(
            &self,
            collections: &[String],
            _params: &BTreeMap<String, ParamValue>,
        ) -> anyhow::Result<Payload> {
            self.calls.lock().unwrap().push(Some(collections.to_vec()));
            Ok(json!({"collection": collections[0]}).as_object().unwrap().clone())
        }
    }

    fn server(
        retriever: Arc<RecordingRetriever>,
        directory: Arc<RecordingDirectory>,
    ) -> TestServer {
        let mut bindings = DownstreamBindings::new(directory);
        for endpoint in Endpoint::ALL {
            bindings = bindings.bind(endpoint, Arc::clone(&retriever) as Arc<dyn FeatureRetriever>);
        }
        let state = AppState::new(Pipeline::new(SchemaRegistry::new(), bindings));
        TestServer::new(router(state)).unwrap()
    }

    #[tokio::test]
    async fn forwards_unrecognized_parameters_downstream() {
        let retriever = RecordingRetriever::new(json!({"type": "FeatureCollection"}));
        let server = server(Arc::clone(&retriever), RecordingDirectory::new());

        let response = server
            .get("/features/bld-fts-building-4/items")
            .add_query_param("filter", "x IN ('y')")
            .await;

        assert_eq!(response.status_code(), StatusCode::OK);
        let call = retriever.last_call();
        assert_eq!(
            call.collection,
            CollectionSelector::Single("bld-fts-building-4".to_string())
        );
        assert_eq!(call.query_params.get("filter").unwrap().as_str(), Some("x IN ('y')"));
    }

    #[tokio::test]
    async fn post_gets_the_wrapper_405_body() {
        let server = server(
            RecordingRetriever::new(json!({})),
            RecordingDirectory::new(),
        );

        let response = server.post("/features/bld-fts-building-4/items").await;

        assert_eq!(response.status_code(), StatusCode::METHOD_NOT_ALLOWED);
        let body: Value = response.json();
        assert_eq!(body["errorSource"], "Catalyst Wrapper");
        assert_eq!(body["code"], json!(405));
    }

    #[tokio::test]
    async fn multi_collection_list_reaches_the_retriever() {
        let retriever = RecordingRetriever::new(json!({"type": "FeatureCollection"}));
        let server = server(Arc::clone(&retriever), RecordingDirectory::new());

        let response = server
            .get("/features/multi-collection/items/limit-col")
            .add_query_param("collection", "a,b,c")
            .add_query_param("request-limit", "213")
            .await;

        assert_eq!(response.status_code(), StatusCode::OK);
        let call = retriever.last_call();
        assert_eq!(
            call.collection,
            CollectionSelector::Multi(vec!["a".into(), "b".into(), "c".into()])
        );
        assert_eq!(call.options.request_limit, Some(213));
    }

    #[tokio::test]
    async fn invalid_parameter_is_a_400() {
        let server = server(
            RecordingRetriever::new(json!({})),
            RecordingDirectory::new(),
        );

        let response = server
            .get("/features/multi-collection/items/col")
            .add_query_param("collection", "a,b")
            .add_query_param("use-latest-collection", "True")
            .await;

        assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
        let body: Value = response.json();
        assert_eq!(
            body["description"],
            "The 'use-latest-collection' parameter must be 'true' or 'false'."
        );
    }

    #[tokio::test]
    async fn latest_collections_rejects_unknown_parameters() {
        let directory = RecordingDirectory::new();
        let server = server(RecordingRetriever::new(json!({})), Arc::clone(&directory));

        let response = server
            .get("/features/latest-collections")
            .add_query_param("foo", "1")
            .await;

        assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
        let body: Value = response.json();
        assert_eq!(
            body["description"],
            "The only supported query parameter is 'recent-update-days'."
        );
        assert!(directory.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn latest_collections_path_parameter_selects_single_lookup() {
        let directory = RecordingDirectory::new();
        let server = server(RecordingRetriever::new(json!({})), Arc::clone(&directory));

        let response = server
            .get("/features/latest-collections/lnd-fts-land")
            .await;

        assert_eq!(response.status_code(), StatusCode::OK);
        assert_eq!(
            directory.calls.lock().unwrap().last().unwrap(),
            &Some(vec!["lnd-fts-land".to_string()])
        );
    }

    #[tokio::test]
    async fn telemetry_is_detached_from_the_body() {
        let retriever = RecordingRetriever::new(json!({
            "numberReturned": 3,
            "telemetryData": {"numberOfRequests": 9}
        }));
        let server = server(Arc::clone(&retriever), RecordingDirectory::new());

        let response = server.get("/features/lnd-fts-land-1/items").await;

        assert_eq!(response.status_code(), StatusCode::OK);
        let body: Value = response.json();
        assert_eq!(body["numberReturned"], json!(3));
        assert!(body.get("telemetryData").is_none());
    }

    #[tokio::test]
    async fn downstream_error_status_is_mirrored() {
        let retriever = RecordingRetriever::new(json!({
            "code": 401,
            "description": "Missing or unsupported API key provided.",
            "errorSource": "OS NGD API"
        }));
        let server = server(Arc::clone(&retriever), RecordingDirectory::new());

        let response = server.get("/features/lnd-fts-land-1/items").await;

        assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
        let body: Value = response.json();
        assert_eq!(body["errorSource"], "OS NGD API");
        assert_eq!(body["code"], json!(401));
    }

    #[tokio::test]
    async fn health_probes_respond() {
        let server = server(
            RecordingRetriever::new(json!({})),
            RecordingDirectory::new(),
        );

        let live = server.get("/health/live").await;
        assert_eq!(live.status_code(), StatusCode::OK);

        let ready = server.get("/health/ready").await;
        assert_eq!(ready.status_code(), StatusCode::OK);
        let body: Value = ready.json();
        assert_eq!(body["status"], "ok");
    }
}
