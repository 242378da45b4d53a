//! Capability-fragment schemas for the wrapper's query parameters.
//!
//! Every endpoint variant recognizes a set of query parameters determined by
//! which optional capabilities the route enables. A schema is the ordered
//! union of the fragments it needs:
//!
//! - Base (always): `wkt`, `use-latest-collection`
//! - Hierarchical (with geometry or collection fan-out): `hierarchical-output`
//! - Limit: `request-limit`
//! - Collection: `collection` (required, comma-delimited list on the wire)
//!
//! Capability membership is a closed set of flags on the schema, queried
//! directly by the dispatcher; there is no type hierarchy to introspect.

use std::collections::BTreeMap;

/// Wire names of the declared query parameters.
pub const WKT: &str = "wkt";
pub const USE_LATEST_COLLECTION: &str = "use-latest-collection";
pub const HIERARCHICAL_OUTPUT: &str = "hierarchical-output";
pub const REQUEST_LIMIT: &str = "request-limit";
pub const COLLECTION: &str = "collection";
pub const FLAG_RECENT_UPDATES: &str = "flag-recent-updates";
pub const RECENT_UPDATE_DAYS: &str = "recent-update-days";

/// Semantic type of a declared query parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    String,
    Integer,
    Boolean,
    /// Comma-delimited list of strings on the wire.
    StringList,
}

/// One declared query parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    /// Hyphenated query-string key.
    pub wire_name: &'static str,
    pub kind: FieldKind,
    pub required: bool,
}

impl FieldSpec {
    const fn optional(wire_name: &'static str, kind: FieldKind) -> Self {
        Self {
            wire_name,
            kind,
            required: false,
        }
    }

    const fn required(wire_name: &'static str, kind: FieldKind) -> Self {
        Self {
            wire_name,
            kind,
            required: true,
        }
    }
}

/// The optional capabilities a feature route may enable.
///
/// Hierarchical output is not an independent axis: geometry filtering and
/// multi-collection fan-out both make the `hierarchical-output` flag
/// available.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct CapabilitySet {
    pub limit: bool,
    pub geometry: bool,
    pub collection: bool,
}

impl CapabilitySet {
    pub const fn new(limit: bool, geometry: bool, collection: bool) -> Self {
        Self {
            limit,
            geometry,
            collection,
        }
    }

    /// Whether the `hierarchical-output` flag is recognized.
    pub fn hierarchical(&self) -> bool {
        self.geometry || self.collection
    }

    /// Every combination of the three capability axes.
    pub fn all() -> [CapabilitySet; 8] {
        let mut sets = [CapabilitySet::default(); 8];
        for (index, set) in sets.iter_mut().enumerate() {
            *set = CapabilitySet::new(index & 1 != 0, index & 2 != 0, index & 4 != 0);
        }
        sets
    }
}

/// The query-parameter schema for one endpoint variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapabilitySchema {
    caps: CapabilitySet,
    fields: Vec<FieldSpec>,
}

impl CapabilitySchema {
    /// Compose the schema for a capability combination as the ordered union
    /// of its fragments. A field contributed by more than one fragment is
    /// kept once, with the most restrictive required-ness.
    pub fn compose(caps: CapabilitySet) -> Self {
        let mut fields = Vec::new();
        add(&mut fields, FieldSpec::optional(WKT, FieldKind::String));
        add(
            &mut fields,
            FieldSpec::optional(USE_LATEST_COLLECTION, FieldKind::Boolean),
        );
        if caps.hierarchical() {
            add(
                &mut fields,
                FieldSpec::optional(HIERARCHICAL_OUTPUT, FieldKind::Boolean),
            );
        }
        if caps.limit {
            add(
                &mut fields,
                FieldSpec::optional(REQUEST_LIMIT, FieldKind::Integer),
            );
        }
        if caps.collection {
            add(
                &mut fields,
                FieldSpec::required(COLLECTION, FieldKind::StringList),
            );
        }
        Self { caps, fields }
    }

    /// Schema for the latest-collections endpoint.
    ///
    /// `flag-recent-updates` is declared but unreachable from the wire: the
    /// endpoint's strict parameter pre-check only admits
    /// `recent-update-days`.
    pub fn latest_collections() -> Self {
        Self {
            caps: CapabilitySet::default(),
            fields: vec![
                FieldSpec::optional(FLAG_RECENT_UPDATES, FieldKind::Boolean),
                FieldSpec::optional(RECENT_UPDATE_DAYS, FieldKind::Integer),
            ],
        }
    }

    pub fn capabilities(&self) -> CapabilitySet {
        self.caps
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    /// Look up a declared field by its wire name.
    pub fn field(&self, wire_name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|field| field.wire_name == wire_name)
    }

    /// Whether this schema targets multiple collections named in the query
    /// rather than a single collection named in the path.
    pub fn is_multi_collection(&self) -> bool {
        self.caps.collection
    }

    /// Recognized wire names in declaration order.
    pub fn wire_names(&self) -> Vec<&'static str> {
        self.fields.iter().map(|field| field.wire_name).collect()
    }

    /// The queryable-attribute guidance list: recognized wire names joined
    /// by `", "`, excluding the Limit field (a control parameter, not a
    /// filterable attribute).
    pub fn attribute_list(&self) -> String {
        self.fields
            .iter()
            .filter(|field| field.wire_name != REQUEST_LIMIT)
            .map(|field| field.wire_name)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Union insertion: duplicate fields keep the most restrictive required-ness.
fn add(fields: &mut Vec<FieldSpec>, spec: FieldSpec) {
    if let Some(existing) = fields
        .iter_mut()
        .find(|field| field.wire_name == spec.wire_name)
    {
        existing.required |= spec.required;
    } else {
        fields.push(spec);
    }
}

/// The eight feature endpoint variants: every combination of the optional
/// capabilities over the base schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Endpoint {
    Items,
    ItemsLimit,
    ItemsGeom,
    ItemsCol,
    ItemsLimitGeom,
    ItemsLimitCol,
    ItemsGeomCol,
    ItemsLimitGeomCol,
}

impl Endpoint {
    pub const ALL: [Endpoint; 8] = [
        Endpoint::Items,
        Endpoint::ItemsLimit,
        Endpoint::ItemsGeom,
        Endpoint::ItemsCol,
        Endpoint::ItemsLimitGeom,
        Endpoint::ItemsLimitCol,
        Endpoint::ItemsGeomCol,
        Endpoint::ItemsLimitGeomCol,
    ];

    pub fn capabilities(self) -> CapabilitySet {
        match self {
            Endpoint::Items => CapabilitySet::new(false, false, false),
            Endpoint::ItemsLimit => CapabilitySet::new(true, false, false),
            Endpoint::ItemsGeom => CapabilitySet::new(false, true, false),
            Endpoint::ItemsCol => CapabilitySet::new(false, false, true),
            Endpoint::ItemsLimitGeom => CapabilitySet::new(true, true, false),
            Endpoint::ItemsLimitCol => CapabilitySet::new(true, false, true),
            Endpoint::ItemsGeomCol => CapabilitySet::new(false, true, true),
            Endpoint::ItemsLimitGeomCol => CapabilitySet::new(true, true, true),
        }
    }

    /// Route tail under the `/features/` prefix.
    pub fn route_suffix(self) -> &'static str {
        match self {
            Endpoint::Items => "items",
            Endpoint::ItemsLimit => "items/limit",
            Endpoint::ItemsGeom => "items/geom",
            Endpoint::ItemsCol => "items/col",
            Endpoint::ItemsLimitGeom => "items/limit-geom",
            Endpoint::ItemsLimitCol => "items/limit-col",
            Endpoint::ItemsGeomCol => "items/geom-col",
            Endpoint::ItemsLimitGeomCol => "items/limit-geom-col",
        }
    }

    fn name(self) -> &'static str {
        match self {
            Endpoint::Items => "base",
            Endpoint::ItemsLimit => "limit",
            Endpoint::ItemsGeom => "geom",
            Endpoint::ItemsCol => "col",
            Endpoint::ItemsLimitGeom => "limit-geom",
            Endpoint::ItemsLimitCol => "limit-col",
            Endpoint::ItemsGeomCol => "geom-col",
            Endpoint::ItemsLimitGeomCol => "limit-geom-col",
        }
    }
}

impl std::fmt::Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Pre-built schemas for every endpoint variant, fixed at startup and shared
/// read-only for the life of the process.
#[derive(Debug, Clone)]
pub struct SchemaRegistry {
    features: BTreeMap<Endpoint, CapabilitySchema>,
    latest_collections: CapabilitySchema,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        let features = Endpoint::ALL
            .iter()
            .map(|&endpoint| (endpoint, CapabilitySchema::compose(endpoint.capabilities())))
            .collect();
        Self {
            features,
            latest_collections: CapabilitySchema::latest_collections(),
        }
    }

    pub fn features(&self, endpoint: Endpoint) -> &CapabilitySchema {
        // Endpoint is a closed enum; new() covers every variant.
        &self.features[&endpoint]
    }

    pub fn latest_collections(&self) -> &CapabilitySchema {
        &self.latest_collections
    }
}

impl Default for SchemaRegistry {
    fn default() -> Self {
        Self::new()
    }
}
