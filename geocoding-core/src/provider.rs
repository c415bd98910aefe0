use async_trait::async_trait;
use std::fmt::Debug;

use crate::{Address, Coordinates, GeocodeError};

pub mod geoapify;
pub mod here;
pub mod nominatim;

pub use geoapify::GeoapifyReverseGeocoder;
pub use here::HereReverseGeocoder;
pub use nominatim::{NominatimGeocoder, NominatimReverseGeocoder};

/// User agent sent to Nominatim replicas when `NOMINATIM_USER_AGENT` is unset.
pub const DEFAULT_USER_AGENT: &str = concat!("geocoding-gateway/", env!("CARGO_PKG_VERSION"));

/// Provider kinds the registry knows how to build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderId {
    Geoapify,
    Here,
    Nominatim,
    NominatimReplica(u32),
}

impl ProviderId {
    /// Uppercase registry key, e.g. `GEOAPIFY` or `NOMINATIM_REPLICA_2`.
    pub fn canonical_name(&self) -> String {
        match self {
            ProviderId::Geoapify => "GEOAPIFY".to_string(),
            ProviderId::Here => "HERE".to_string(),
            ProviderId::Nominatim => "NOMINATIM".to_string(),
            ProviderId::NominatimReplica(n) => format!("NOMINATIM_REPLICA_{n}"),
        }
    }
}

impl std::fmt::Display for ProviderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.canonical_name())
    }
}

/// Anything that talks to a single upstream URL.
pub trait Endpoint: Send + Sync + Debug {
    fn url(&self) -> &str;
}

/// Coordinates → addresses.
#[async_trait]
pub trait ReverseGeocoder: Endpoint {
    async fn reverse_geocode(&self, coordinates: Coordinates) -> Result<Vec<Address>, GeocodeError>;
}

/// Address text → coordinates.
#[async_trait]
pub trait ForwardGeocoder: Endpoint {
    async fn geocode(&self, address: &str) -> Result<Vec<Coordinates>, GeocodeError>;
}

/// First candidate that is present and not blank.
pub(crate) fn first_present<const N: usize>(candidates: [Option<String>; N]) -> Option<String> {
    candidates
        .into_iter()
        .flatten()
        .find(|value| !value.trim().is_empty())
}
