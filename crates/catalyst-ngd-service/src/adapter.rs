//! Conversion of axum request parts into the canonical request form.

use std::collections::BTreeMap;

use axum::http::{HeaderMap, Method, Uri};

use catalyst_ngd_core::CanonicalRequest;

/// Serialise the extracted request parts into a [`CanonicalRequest`].
///
/// Unlike the Lambda event shape, axum requests are structurally
/// well-formed by construction, so this conversion cannot fail.
pub fn canonicalize(
    method: &Method,
    uri: &Uri,
    query_params: BTreeMap<String, String>,
    path_params: BTreeMap<String, String>,
    headers: HeaderMap,
) -> CanonicalRequest {
    CanonicalRequest::new(
        method.as_str(),
        uri.to_string(),
        query_params,
        path_params,
        headers,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn carries_every_request_part() {
        let uri: Uri = "/features/lnd-fts-land-1/items?wkt=POINT(0%200)"
            .parse()
            .unwrap();
        let mut headers = HeaderMap::new();
        headers.insert("key", "abc123".parse().unwrap());

        let mut query = BTreeMap::new();
        query.insert("wkt".to_string(), "POINT(0 0)".to_string());
        let mut path = BTreeMap::new();
        path.insert("collection".to_string(), "lnd-fts-land-1".to_string());

        let request = canonicalize(&Method::GET, &uri, query, path, headers);
        assert_eq!(request.method, "GET");
        assert!(request.url.contains("/features/lnd-fts-land-1/items"));
        assert_eq!(request.query_params.get("wkt").unwrap(), "POINT(0 0)");
        assert_eq!(request.path_param("collection"), Some("lnd-fts-land-1"));
        assert_eq!(request.header("KEY"), Some("abc123"));
    }
}
