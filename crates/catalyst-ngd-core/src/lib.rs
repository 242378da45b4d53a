//! Platform-neutral request pipeline for the Catalyst NGD wrapper.
//!
//! The wrapper fronts the OS NGD Features API with serverless HTTP triggers
//! on more than one hosting platform. This crate holds everything the
//! platforms share:
//!
//! - [`CanonicalRequest`]: the platform-neutral request representation
//! - [`SchemaRegistry`]: pre-built query-parameter schemas for every
//!   endpoint variant, composed from capability fragments
//! - [`validate`]: schema-driven parameter validation with pass-through of
//!   undeclared parameters
//! - [`Pipeline`]: method checking, control/forwarded parameter
//!   partitioning, and dispatch to the bound downstream retrieval functions
//! - [`finalize`]: response post-processing (error-guidance templating,
//!   telemetry detachment, status resolution)
//! - [`ErrorRecord`]: the single error body shape used by every stage
//!
//! Platform binaries convert their trigger event into a
//! [`CanonicalRequest`], run it through a shared [`Pipeline`], and serialise
//! the resulting [`ResponseEnvelope`] into their native response shape. The
//! pipeline itself is synchronous and holds no per-process mutable state;
//! the registry and downstream bindings are built once at startup and
//! injected.

#![deny(warnings)]

mod dispatch;
mod error;
mod request;
mod response;
mod schema;
mod validate;

pub use dispatch::{
    CollectionDirectory, CollectionSelector, DownstreamBindings, FeatureRetriever, Payload,
    Pipeline, RetrievalCall, RetrievalOptions,
};
pub use error::{ErrorRecord, ERROR_SOURCE};
pub use request::{strip_query, CanonicalRequest};
pub use response::{finalize, ResponseEnvelope};
pub use schema::{
    CapabilitySchema, CapabilitySet, Endpoint, FieldKind, FieldSpec, SchemaRegistry, COLLECTION,
    FLAG_RECENT_UPDATES, HIERARCHICAL_OUTPUT, RECENT_UPDATE_DAYS, REQUEST_LIMIT,
    USE_LATEST_COLLECTION, WKT,
};
pub use validate::{validate, ParamValue, ValidatedParams, ValidationFailure};
