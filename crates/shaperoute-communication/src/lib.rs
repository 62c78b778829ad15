//! # Shape Route Communication
//!
//! HTTP clients used by the orchestrator:
//! - the API gateway for the route generation backend
//! - the public geocoder used by the location search
//!
//! Both are exposed behind async traits so the orchestrator can be driven by
//! in-memory implementations in tests.

pub mod api;
pub mod geocoding;

pub use api::{ApiClient, RouteBackend};
pub use geocoding::{Geocoder, NominatimGeocoder, NOMINATIM_SEARCH_URL};
