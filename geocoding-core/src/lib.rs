//! Core library for the reverse-geocoding gateway.
//!
//! This crate defines:
//! - Configuration and environment snapshot handling
//! - Provider adapters (Geoapify, HERE, Nominatim and self-hosted replicas)
//! - Provider registries built from environment variables
//! - Shared domain models (addresses, coordinates, response envelopes)
//!
//! It is used by `geocoding-gateway`, but the [`Gateway`] service can be
//! embedded in any other front end.

pub mod config;
pub mod error;
pub mod http;
pub mod model;
pub mod provider;
pub mod registry;
pub mod service;

pub use config::{Config, Environment};
pub use error::{ErrorKind, GeocodeError};
pub use model::{
    Address, Coordinates, Envelope, GeocodeResponse, GeocoderInfo, GeocodersResponse,
    ReverseGeocodeResponse,
};
pub use provider::{ForwardGeocoder, ProviderId, ReverseGeocoder};
pub use registry::{ForwardRegistry, Registry, ReverseRegistry};
pub use service::Gateway;
