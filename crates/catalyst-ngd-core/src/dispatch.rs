//! Capability dispatch: partitioning validated parameters and invoking the
//! downstream retrieval functions.
//!
//! The downstream NGD API family is outside this crate; it is reached only
//! through the [`FeatureRetriever`] and [`CollectionDirectory`] traits, with
//! concrete bindings injected at startup.

use std::collections::BTreeMap;
use std::sync::Arc;

use http::HeaderMap;
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::ErrorRecord;
use crate::request::{strip_query, CanonicalRequest};
use crate::response::{finalize, ResponseEnvelope};
use crate::schema::{
    CapabilitySchema, Endpoint, SchemaRegistry, COLLECTION, HIERARCHICAL_OUTPUT,
    RECENT_UPDATE_DAYS, REQUEST_LIMIT, USE_LATEST_COLLECTION, WKT,
};
use crate::validate::{validate, ParamValue, ValidatedParams};

/// JSON object payload exchanged with the downstream NGD API family.
pub type Payload = Map<String, Value>;

/// Which collections a retrieval call targets: a single identifier from the
/// request path, or the validated list for multi-collection endpoints.
/// Exactly one form exists per call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CollectionSelector {
    Single(String),
    Multi(Vec<String>),
}

/// Control parameters consumed from the validated mapping rather than
/// forwarded downstream.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RetrievalOptions {
    pub wkt: Option<String>,
    pub use_latest_collection: Option<bool>,
    pub hierarchical_output: Option<bool>,
    pub request_limit: Option<i64>,
}

/// One downstream invocation: the forwarded query parameters, the request
/// headers, and the control parameters.
#[derive(Debug, Clone)]
pub struct RetrievalCall {
    /// Parameters the schema does not declare, passed through verbatim.
    pub query_params: BTreeMap<String, ParamValue>,
    pub headers: HeaderMap,
    pub collection: CollectionSelector,
    pub options: RetrievalOptions,
}

/// Downstream features-retrieval function family.
///
/// The result is opaque to the wrapper: a success payload, or an error
/// payload carrying `description` and `errorSource` (and optionally `code`
/// and `telemetryData`). An `Err` is a failed invocation and surfaces as a
/// 500 wrapper error.
pub trait FeatureRetriever: Send + Sync {
    fn retrieve(&self, call: RetrievalCall) -> anyhow::Result<Payload>;
}

/// Downstream latest-collections lookup family.
pub trait CollectionDirectory: Send + Sync {
    /// Latest versions of every collection.
    fn latest_versions(&self, params: &BTreeMap<String, ParamValue>) -> anyhow::Result<Payload>;

    /// Latest versions for the named collections only.
    fn latest_for(
        &self,
        collections: &[String],
        params: &BTreeMap<String, ParamValue>,
    ) -> anyhow::Result<Payload>;
}

/// Downstream function bindings, fixed at startup.
pub struct DownstreamBindings {
    features: BTreeMap<Endpoint, Arc<dyn FeatureRetriever>>,
    directory: Arc<dyn CollectionDirectory>,
}

impl DownstreamBindings {
    pub fn new(directory: Arc<dyn CollectionDirectory>) -> Self {
        Self {
            features: BTreeMap::new(),
            directory,
        }
    }

    /// Bind a feature endpoint to its retrieval function.
    pub fn bind(mut self, endpoint: Endpoint, retriever: Arc<dyn FeatureRetriever>) -> Self {
        self.features.insert(endpoint, retriever);
        self
    }

    pub fn feature(&self, endpoint: Endpoint) -> Option<&dyn FeatureRetriever> {
        self.features.get(&endpoint).map(Arc::as_ref)
    }

    pub fn directory(&self) -> &dyn CollectionDirectory {
        self.directory.as_ref()
    }
}

/// The platform-neutral pipeline: schema registry plus downstream bindings.
///
/// One instance is built in `main` and shared read-only across invocations;
/// each call allocates only request-scoped state.
pub struct Pipeline {
    registry: SchemaRegistry,
    bindings: DownstreamBindings,
}

impl Pipeline {
    pub fn new(registry: SchemaRegistry, bindings: DownstreamBindings) -> Self {
        Self { registry, bindings }
    }

    pub fn registry(&self) -> &SchemaRegistry {
        &self.registry
    }

    /// Run a feature endpoint request: method check, validation, parameter
    /// partitioning, downstream dispatch, post-processing.
    pub fn handle_features(
        &self,
        endpoint: Endpoint,
        request: &CanonicalRequest,
    ) -> ResponseEnvelope {
        if request.method != "GET" {
            return ErrorRecord::unsupported_method().into();
        }

        let schema = self.registry.features(endpoint);
        let validated = match validate(&request.query_params, schema) {
            Ok(validated) => validated,
            Err(failure) => return ErrorRecord::validation(&failure).into(),
        };

        let call = match build_call(validated, schema, request) {
            Ok(call) => call,
            Err(error) => return error.into(),
        };

        let Some(retriever) = self.bindings.feature(endpoint) else {
            return ErrorRecord::new(
                500,
                format!("No downstream function is bound for the '{endpoint}' endpoint."),
            )
            .into();
        };

        match retriever.retrieve(call) {
            Ok(body) => finalize(body, Some(schema)),
            Err(error) => ErrorRecord::unhandled(&error).into(),
        }
    }

    /// Run a latest-collections request: strict parameter pre-check, then
    /// dispatch to the directory lookup matching the optional path
    /// collection.
    pub fn handle_latest_collections(&self, request: &CanonicalRequest) -> ResponseEnvelope {
        if request.method != "GET" {
            return ErrorRecord::unsupported_method().into();
        }

        // Stricter than schema validation: this endpoint admits one known
        // parameter or none at all.
        let params = &request.query_params;
        if params.len() > 1 || (params.len() == 1 && !params.contains_key(RECENT_UPDATE_DAYS)) {
            return ErrorRecord::new(
                400,
                "The only supported query parameter is 'recent-update-days'.",
            )
            .into();
        }

        let schema = self.registry.latest_collections();
        let validated = match validate(params, schema) {
            Ok(validated) => validated,
            Err(failure) => return ErrorRecord::validation(&failure).into(),
        };

        let collection = request.path_param(COLLECTION);
        log_collections_request(request, &validated.values, collection);

        let result = match collection {
            Some(collection) => self
                .bindings
                .directory()
                .latest_for(&[collection.to_string()], &validated.values),
            None => self.bindings.directory().latest_versions(&validated.values),
        };

        match result {
            Ok(body) => finalize(body, None),
            Err(error) => ErrorRecord::unhandled(&error).into(),
        }
    }
}

/// Partition the validated mapping: declared fields become typed control
/// parameters, everything else is forwarded verbatim. Single-collection
/// endpoints take their collection identifier from the path, never from the
/// query.
fn build_call(
    validated: ValidatedParams,
    schema: &CapabilitySchema,
    request: &CanonicalRequest,
) -> Result<RetrievalCall, ErrorRecord> {
    let ValidatedParams {
        mut values,
        is_multi_collection,
    } = validated;

    let mut options = RetrievalOptions::default();
    let mut collections = None;
    for field in schema.fields() {
        let Some(value) = values.remove(field.wire_name) else {
            continue;
        };
        // Coercion guarantees the kinds line up with the schema.
        match (field.wire_name, value) {
            (WKT, ParamValue::String(wkt)) => options.wkt = Some(wkt),
            (USE_LATEST_COLLECTION, ParamValue::Boolean(flag)) => {
                options.use_latest_collection = Some(flag);
            }
            (HIERARCHICAL_OUTPUT, ParamValue::Boolean(flag)) => {
                options.hierarchical_output = Some(flag);
            }
            (REQUEST_LIMIT, ParamValue::Integer(limit)) => options.request_limit = Some(limit),
            (COLLECTION, ParamValue::List(list)) => collections = Some(list),
            _ => {}
        }
    }

    let collection = if is_multi_collection {
        CollectionSelector::Multi(collections.unwrap_or_default())
    } else {
        match request.path_param(COLLECTION) {
            Some(collection) => CollectionSelector::Single(collection.to_string()),
            None => {
                return Err(ErrorRecord::new(
                    400,
                    "A collection must be supplied in the request path.",
                ))
            }
        }
    };

    Ok(RetrievalCall {
        query_params: values,
        headers: request.headers.clone(),
        collection,
        options,
    })
}

/// Request dimensions for the telemetry collaborator. The `key` credential
/// is never logged.
fn log_collections_request(
    request: &CanonicalRequest,
    params: &BTreeMap<String, ParamValue>,
    collection: Option<&str>,
) {
    let dimensions: BTreeMap<&str, String> = params
        .iter()
        .filter(|(name, _)| name.as_str() != "key")
        .map(|(name, value)| (name.as_str(), value.to_string()))
        .collect();
    debug!(
        path = strip_query(&request.url),
        collection = collection.unwrap_or_default(),
        dimensions = ?dimensions,
        "latest collections request"
    );
}
