//! Provider registries built from the environment at startup.
//!
//! Reverse providers are scanned in a fixed order:
//!
//! 1. `GEOAPIFY_API_KEY` → `GEOAPIFY`
//! 2. `HERE_API_KEY` → `HERE`
//! 3. `NOMINATIM_USER_AGENT` → `NOMINATIM`
//! 4. `NOMINATIM_REVERSER_REPLICA_URL_<n>` → `NOMINATIM_REPLICA_<n>`, ascending `n`
//!
//! Forward providers follow the same pattern with `NOMINATIM_USER_AGENT` and
//! `NOMINATIM_GEOCODER_REPLICA_URL_<n>`. Unset variables contribute nothing.

use indexmap::IndexMap;
use std::sync::Arc;
use tracing::info;

use crate::{
    GeocodeError, GeocoderInfo,
    config::Environment,
    http::HttpClient,
    provider::{
        DEFAULT_USER_AGENT, Endpoint, ForwardGeocoder, GeoapifyReverseGeocoder,
        HereReverseGeocoder, NominatimGeocoder, NominatimReverseGeocoder, ProviderId,
        ReverseGeocoder,
    },
};

pub const GEOAPIFY_API_KEY: &str = "GEOAPIFY_API_KEY";
pub const HERE_API_KEY: &str = "HERE_API_KEY";
pub const NOMINATIM_USER_AGENT: &str = "NOMINATIM_USER_AGENT";
pub const REVERSE_REPLICA_PREFIX: &str = "NOMINATIM_REVERSER_REPLICA_URL_";
pub const FORWARD_REPLICA_PREFIX: &str = "NOMINATIM_GEOCODER_REPLICA_URL_";

/// Ordered, case-insensitive table of named providers.
#[derive(Debug)]
pub struct Registry<P: ?Sized> {
    entries: IndexMap<String, Arc<P>>,
}

pub type ReverseRegistry = Registry<dyn ReverseGeocoder>;
pub type ForwardRegistry = Registry<dyn ForwardGeocoder>;

impl<P: ?Sized> Default for Registry<P> {
    fn default() -> Self {
        Self { entries: IndexMap::new() }
    }
}

impl<P: Endpoint + ?Sized> Registry<P> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `provider` under the uppercased `name`. Re-registering a name
    /// replaces the client and keeps its original position.
    pub fn register(&mut self, name: &str, provider: Arc<P>) {
        let key = name.trim().to_uppercase();
        info!(provider = %key, url = provider.url(), "registered geocoder");
        self.entries.insert(key, provider);
    }

    pub fn get(&self, name: &str) -> Result<Arc<P>, GeocodeError> {
        self.entries
            .get(&name.trim().to_uppercase())
            .cloned()
            .ok_or_else(|| GeocodeError::UnknownProvider(name.to_string()))
    }

    /// Descriptors in registration order.
    pub fn list(&self) -> Vec<GeocoderInfo> {
        self.entries
            .iter()
            .map(|(name, provider)| GeocoderInfo {
                name: name.clone(),
                url: provider.url().to_string(),
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Build the reverse-geocoding registry from `env`.
pub fn build_reverse_registry(env: &Environment, http: &HttpClient) -> ReverseRegistry {
    let mut registry = ReverseRegistry::new();

    if let Some(key) = env.get(GEOAPIFY_API_KEY) {
        let client = GeoapifyReverseGeocoder::new(key.to_string(), http.clone());
        registry.register(&ProviderId::Geoapify.canonical_name(), Arc::new(client));
    }

    if let Some(key) = env.get(HERE_API_KEY) {
        let client = HereReverseGeocoder::new(key.to_string(), http.clone());
        registry.register(&ProviderId::Here.canonical_name(), Arc::new(client));
    }

    let agent = env.get(NOMINATIM_USER_AGENT);
    if let Some(agent) = agent {
        let client = NominatimReverseGeocoder::new(agent.to_string(), http.clone());
        registry.register(&ProviderId::Nominatim.canonical_name(), Arc::new(client));
    }

    let replica_agent = agent.unwrap_or(DEFAULT_USER_AGENT);
    for (index, url) in env.numbered(REVERSE_REPLICA_PREFIX) {
        let client = NominatimReverseGeocoder::replica(url, replica_agent.to_string(), http.clone());
        registry.register(&ProviderId::NominatimReplica(index).canonical_name(), Arc::new(client));
    }

    registry
}

/// Build the forward-geocoding registry from `env`.
pub fn build_forward_registry(env: &Environment, http: &HttpClient) -> ForwardRegistry {
    let mut registry = ForwardRegistry::new();

    let agent = env.get(NOMINATIM_USER_AGENT);
    if let Some(agent) = agent {
        let client = NominatimGeocoder::new(agent.to_string(), http.clone());
        registry.register(&ProviderId::Nominatim.canonical_name(), Arc::new(client));
    }

    let replica_agent = agent.unwrap_or(DEFAULT_USER_AGENT);
    for (index, url) in env.numbered(FORWARD_REPLICA_PREFIX) {
        let client = NominatimGeocoder::replica(url, replica_agent.to_string(), http.clone());
        registry.register(&ProviderId::NominatimReplica(index).canonical_name(), Arc::new(client));
    }

    registry
}
