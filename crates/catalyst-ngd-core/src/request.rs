//! Platform-neutral representation of an inbound HTTP request.

use std::collections::BTreeMap;

use http::HeaderMap;

/// An inbound HTTP request, serialised out of whichever trigger event the
/// hosting platform delivered.
///
/// Built once per invocation by a platform adapter and owned by the pipeline
/// for that invocation; never mutated after construction and never shared
/// across requests.
#[derive(Debug, Clone)]
pub struct CanonicalRequest {
    /// HTTP method, upper-case (`GET`, `POST`, ...).
    pub method: String,

    /// Request URL as reported by the platform; may include a query string.
    pub url: String,

    /// Raw query parameters. Values are kept as wire strings; coercion is
    /// the validator's job.
    pub query_params: BTreeMap<String, String>,

    /// Path parameters captured by the platform's route template.
    pub path_params: BTreeMap<String, String>,

    /// Request headers. Downstream credential checks read a `key` header,
    /// so lookup must stay case-insensitive regardless of what casing the
    /// edge platform delivered.
    pub headers: HeaderMap,
}

impl CanonicalRequest {
    pub fn new(
        method: impl Into<String>,
        url: impl Into<String>,
        query_params: BTreeMap<String, String>,
        path_params: BTreeMap<String, String>,
        headers: HeaderMap,
    ) -> Self {
        Self {
            method: method.into(),
            url: url.into(),
            query_params,
            path_params,
            headers,
        }
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|value| value.to_str().ok())
    }

    pub fn path_param(&self, name: &str) -> Option<&str> {
        self.path_params.get(name).map(String::as_str)
    }
}

/// Strip the query string from a URL.
pub fn strip_query(url: &str) -> &str {
    url.split('?').next().unwrap_or(url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::header::{HeaderName, HeaderValue};

    fn request_with_header(name: &str, value: &str) -> CanonicalRequest {
        let mut headers = HeaderMap::new();
        headers.insert(
            HeaderName::from_bytes(name.as_bytes()).unwrap(),
            HeaderValue::from_str(value).unwrap(),
        );
        CanonicalRequest::new(
            "GET",
            "https://api.example.com/catalyst/features/lnd-fts-land-1/items",
            BTreeMap::new(),
            BTreeMap::new(),
            headers,
        )
    }

    #[test]
    fn header_lookup_is_case_insensitive() {
        let request = request_with_header("Key", "abc123");
        assert_eq!(request.header("key"), Some("abc123"));
        assert_eq!(request.header("KEY"), Some("abc123"));
        assert_eq!(request.header("missing"), None);
    }

    #[test]
    fn path_param_lookup() {
        let mut path_params = BTreeMap::new();
        path_params.insert("collection".to_string(), "bld-fts-building-4".to_string());
        let request = CanonicalRequest::new(
            "GET",
            "https://api.example.com/x",
            BTreeMap::new(),
            path_params,
            HeaderMap::new(),
        );
        assert_eq!(request.path_param("collection"), Some("bld-fts-building-4"));
        assert_eq!(request.path_param("other"), None);
    }

    #[test]
    fn strip_query_removes_query_string() {
        assert_eq!(
            strip_query("https://api.example.com/items?wkt=POINT(0 0)"),
            "https://api.example.com/items"
        );
        assert_eq!(
            strip_query("https://api.example.com/items"),
            "https://api.example.com/items"
        );
    }
}
