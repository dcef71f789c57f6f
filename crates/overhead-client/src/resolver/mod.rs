//! Best-effort enrichment of state vectors.
//!
//! Resolvers never return errors. Remote failures are logged and replaced by
//! fallback strings so the pipeline always produces a complete record.

pub mod metadata;
pub mod route;

pub use metadata::{
    airline_code, resolve_airline, resolve_flight_number, static_aircraft_type, MetadataResolver,
    PRIVATE_AIRLINE, UNKNOWN_FLIGHT_NUMBER, UNKNOWN_TYPE,
};
pub use route::{route_label, Route, RouteResolver, UNKNOWN_FLIGHT};
