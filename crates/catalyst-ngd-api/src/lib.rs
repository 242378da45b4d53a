//! HTTP binding for the downstream NGD API wrapper functions.
//!
//! The core pipeline only knows the retrieval traits; this crate implements
//! them against a remote NGD wrapper deployment reached over HTTP. One
//! blocking `reqwest` client is shared by every endpoint binding.
//!
//! The wrapper never interprets what comes back: whatever JSON object the
//! NGD service returns (success payload or shaped error) is handed to the
//! pipeline's post-processor as-is.

#![deny(warnings)]

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context};
use serde_json::Value;
use tracing::debug;

use catalyst_ngd_core::{
    CollectionDirectory, CollectionSelector, DownstreamBindings, Endpoint, FeatureRetriever,
    ParamValue, Payload, RetrievalCall, RetrievalOptions, COLLECTION, HIERARCHICAL_OUTPUT,
    REQUEST_LIMIT, USE_LATEST_COLLECTION, WKT,
};

/// Environment variable naming the NGD wrapper base URL.
pub const BASE_URL_ENV: &str = "CATALYST_NGD_BASE_URL";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Blocking HTTP client for the NGD wrapper service.
///
/// Cheaply cloneable; all clones share one connection pool.
#[derive(Clone)]
pub struct NgdApiClient {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    http: reqwest::blocking::Client,
    base_url: String,
}

impl NgdApiClient {
    pub fn new(base_url: impl Into<String>) -> anyhow::Result<Self> {
        let http = reqwest::blocking::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("failed to build NGD HTTP client")?;
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self {
            inner: Arc::new(ClientInner { http, base_url }),
        })
    }

    /// Read the base URL from `CATALYST_NGD_BASE_URL`.
    pub fn from_env() -> anyhow::Result<Self> {
        let base_url =
            std::env::var(BASE_URL_ENV).with_context(|| format!("{BASE_URL_ENV} must be set"))?;
        Self::new(base_url)
    }

    pub fn base_url(&self) -> &str {
        &self.inner.base_url
    }

    /// Bind every feature endpoint and the collections directory to this
    /// client.
    pub fn bindings(&self) -> DownstreamBindings {
        let mut bindings = DownstreamBindings::new(Arc::new(self.clone()));
        for endpoint in Endpoint::ALL {
            bindings = bindings.bind(
                endpoint,
                Arc::new(EndpointBinding {
                    client: self.clone(),
                    endpoint,
                }),
            );
        }
        bindings
    }

    fn get(
        &self,
        path: &str,
        query: &[(String, String)],
        headers: &http::HeaderMap,
    ) -> anyhow::Result<Payload> {
        let url = format!("{}/{}", self.inner.base_url, path);
        debug!(url = %url, "forwarding request to the NGD wrapper");
        let response = self
            .inner
            .http
            .get(&url)
            .query(query)
            .headers(headers.clone())
            .send()
            .with_context(|| format!("request to {url} failed"))?;
        let body: Value = response
            .json()
            .with_context(|| format!("response from {url} was not JSON"))?;
        match body {
            Value::Object(map) => Ok(map),
            other => Err(anyhow!("NGD wrapper returned a non-object body: {other}")),
        }
    }
}

/// One feature endpoint bound to the shared client.
struct EndpointBinding {
    client: NgdApiClient,
    endpoint: Endpoint,
}

impl FeatureRetriever for EndpointBinding {
    fn retrieve(&self, call: RetrievalCall) -> anyhow::Result<Payload> {
        let path = feature_path(self.endpoint, &call.collection);
        let query = query_pairs(&call.query_params, &call.options, &call.collection);
        self.client.get(&path, &query, &call.headers)
    }
}

impl CollectionDirectory for NgdApiClient {
    fn latest_versions(&self, params: &BTreeMap<String, ParamValue>) -> anyhow::Result<Payload> {
        self.get(
            "features/latest-collections",
            &param_pairs(params),
            &http::HeaderMap::new(),
        )
    }

    fn latest_for(
        &self,
        collections: &[String],
        params: &BTreeMap<String, ParamValue>,
    ) -> anyhow::Result<Payload> {
        let collection = collections.first().map(String::as_str).unwrap_or_default();
        self.get(
            &format!("features/latest-collections/{collection}"),
            &param_pairs(params),
            &http::HeaderMap::new(),
        )
    }
}

/// Route for a feature endpoint: single-collection identifiers become a path
/// segment, multi-collection fan-out uses the fixed `multi-collection`
/// segment.
fn feature_path(endpoint: Endpoint, collection: &CollectionSelector) -> String {
    let head = match collection {
        CollectionSelector::Single(collection) => collection.as_str(),
        CollectionSelector::Multi(_) => "multi-collection",
    };
    format!("features/{}/{}", head, endpoint.route_suffix())
}

/// Wire query for a retrieval call: forwarded parameters first, then the
/// control parameters under their wire names.
fn query_pairs(
    forwarded: &BTreeMap<String, ParamValue>,
    options: &RetrievalOptions,
    collection: &CollectionSelector,
) -> Vec<(String, String)> {
    let mut pairs = param_pairs(forwarded);
    if let Some(wkt) = &options.wkt {
        pairs.push((WKT.to_string(), wkt.clone()));
    }
    if let Some(flag) = options.use_latest_collection {
        pairs.push((USE_LATEST_COLLECTION.to_string(), flag.to_string()));
    }
    if let Some(flag) = options.hierarchical_output {
        pairs.push((HIERARCHICAL_OUTPUT.to_string(), flag.to_string()));
    }
    if let Some(limit) = options.request_limit {
        pairs.push((REQUEST_LIMIT.to_string(), limit.to_string()));
    }
    if let CollectionSelector::Multi(collections) = collection {
        pairs.push((COLLECTION.to_string(), collections.join(",")));
    }
    pairs
}

fn param_pairs(params: &BTreeMap<String, ParamValue>) -> Vec<(String, String)> {
    params
        .iter()
        .map(|(name, value)| (name.clone(), value.to_string()))
        .collect()
}
