//! Resolution of the invoked route to an endpoint variant.
//!
//! The deployment maps each Lambda function to exactly one route; the shared
//! binary works out which variant it is serving from the request path, so no
//! per-function configuration is needed.

use catalyst_ngd_core::Endpoint;

/// What a request path addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Features(Endpoint),
    LatestCollections,
}

/// Resolve a request path (query string already stripped) to its route.
pub fn resolve(path: &str) -> Option<Route> {
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    match segments.as_slice() {
        [.., "latest-collections"] | [.., "latest-collections", _] => {
            Some(Route::LatestCollections)
        }
        [.., "items"] => Some(Route::Features(Endpoint::Items)),
        [.., "items", tail] => variant(tail).map(Route::Features),
        _ => None,
    }
}

fn variant(tail: &str) -> Option<Endpoint> {
    match tail {
        "limit" => Some(Endpoint::ItemsLimit),
        "geom" => Some(Endpoint::ItemsGeom),
        "col" => Some(Endpoint::ItemsCol),
        "limit-geom" => Some(Endpoint::ItemsLimitGeom),
        "limit-col" => Some(Endpoint::ItemsLimitCol),
        "geom-col" => Some(Endpoint::ItemsGeomCol),
        "limit-geom-col" => Some(Endpoint::ItemsLimitGeomCol),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_every_feature_variant() {
        let cases = [
            ("/catalyst/features/lnd-fts-land-1/items", Endpoint::Items),
            (
                "/catalyst/features/lnd-fts-land-1/items/limit",
                Endpoint::ItemsLimit,
            ),
            (
                "/catalyst/features/lnd-fts-land-1/items/geom",
                Endpoint::ItemsGeom,
            ),
            (
                "/catalyst/features/multi-collection/items/col",
                Endpoint::ItemsCol,
            ),
            (
                "/catalyst/features/lnd-fts-land-1/items/limit-geom",
                Endpoint::ItemsLimitGeom,
            ),
            (
                "/catalyst/features/multi-collection/items/limit-col",
                Endpoint::ItemsLimitCol,
            ),
            (
                "/catalyst/features/multi-collection/items/geom-col",
                Endpoint::ItemsGeomCol,
            ),
            (
                "/catalyst/features/multi-collection/items/limit-geom-col",
                Endpoint::ItemsLimitGeomCol,
            ),
        ];
        for (path, endpoint) in cases {
            assert_eq!(resolve(path), Some(Route::Features(endpoint)), "{path}");
        }
    }

    #[test]
    fn resolves_latest_collections_with_and_without_a_collection() {
        assert_eq!(
            resolve("/catalyst/features/latest-collections"),
            Some(Route::LatestCollections)
        );
        assert_eq!(
            resolve("/catalyst/features/latest-collections/lnd-fts-land"),
            Some(Route::LatestCollections)
        );
    }

    #[test]
    fn resolves_with_a_domain_prefix() {
        assert_eq!(
            resolve("api.example.com/catalyst/features/bld-fts-building/items"),
            Some(Route::Features(Endpoint::Items))
        );
    }

    #[test]
    fn unknown_paths_do_not_resolve() {
        assert_eq!(resolve("/catalyst/features"), None);
        assert_eq!(resolve("/catalyst/features/x/items/unknown"), None);
        assert_eq!(resolve(""), None);
    }
}
