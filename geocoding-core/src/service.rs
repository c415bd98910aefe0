use std::sync::Arc;

use anyhow::Result;
use tracing::{info, warn};

use crate::{
    Address, Config, Coordinates, GeocodeError,
    config::Environment,
    http::HttpClient,
    provider::Endpoint,
    registry::{ForwardRegistry, Registry, ReverseRegistry, build_forward_registry, build_reverse_registry},
};

/// Entry point for front ends: owns both registries and resolves which
/// provider handles a request.
#[derive(Debug)]
pub struct Gateway {
    reversers: ReverseRegistry,
    geocoders: ForwardRegistry,
    default_provider: String,
}

impl Gateway {
    pub fn new(reversers: ReverseRegistry, geocoders: ForwardRegistry, default_provider: impl Into<String>) -> Self {
        Self {
            reversers,
            geocoders,
            default_provider: default_provider.into().to_uppercase(),
        }
    }

    /// Build both registries from `env` with one shared outbound client.
    pub fn from_environment(config: &Config, env: &Environment) -> Result<Self> {
        let http = HttpClient::new(config.timeout())?;
        let reversers = build_reverse_registry(env, &http);
        let geocoders = build_forward_registry(env, &http);

        info!(
            reversers = reversers.len(),
            geocoders = geocoders.len(),
            default = %config.default_provider_name(),
            timeout_secs = config.timeout_secs,
            "provider registries built"
        );

        Ok(Self::new(reversers, geocoders, config.default_provider_name()))
    }

    pub fn reversers(&self) -> &ReverseRegistry {
        &self.reversers
    }

    pub fn geocoders(&self) -> &ForwardRegistry {
        &self.geocoders
    }

    pub fn default_provider(&self) -> &str {
        &self.default_provider
    }

    pub async fn reverse_geocode(
        &self,
        latitude: f64,
        longitude: f64,
        platform: Option<&str>,
    ) -> Result<Vec<Address>, GeocodeError> {
        let coordinates = Coordinates::new(latitude, longitude)?;
        let (name, provider) = self.resolve(&self.reversers, platform)?;

        info!(provider = %name, %coordinates, "reverse geocoding");
        let result = provider.reverse_geocode(coordinates).await;
        if let Err(err) = &result {
            warn!(provider = %name, error = %err, "reverse geocoding failed");
        }
        result
    }

    pub async fn geocode(&self, address: &str, platform: Option<&str>) -> Result<Vec<Coordinates>, GeocodeError> {
        let address = address.trim();
        if address.is_empty() {
            return Err(GeocodeError::Validation("address must not be empty".to_string()));
        }
        let (name, provider) = self.resolve(&self.geocoders, platform)?;

        info!(provider = %name, "geocoding");
        let result = provider.geocode(address).await;
        if let Err(err) = &result {
            warn!(provider = %name, error = %err, "geocoding failed");
        }
        result
    }

    /// Explicit platform first, then the default. An empty registry is
    /// reported as such instead of as an unknown default.
    fn resolve<P: Endpoint + ?Sized>(
        &self,
        registry: &Registry<P>,
        platform: Option<&str>,
    ) -> Result<(String, Arc<P>), GeocodeError> {
        let requested = platform.map(str::trim).filter(|p| !p.is_empty());

        let (name, provider) = match requested {
            Some(name) => (name, registry.get(name)?),
            None if registry.is_empty() => return Err(GeocodeError::NoProviders),
            None => {
                let name = self.default_provider.as_str();
                let provider = registry
                    .get(name)
                    .map_err(|_| GeocodeError::DefaultUnavailable(name.to_uppercase()))?;
                (name, provider)
            }
        };

        Ok((name.to_uppercase(), provider))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::{ForwardGeocoder, ReverseGeocoder};
    use async_trait::async_trait;

    #[derive(Debug)]
    struct Fixed(&'static str);

    impl Endpoint for Fixed {
        fn url(&self) -> &str {
            "stub://fixed"
        }
    }

    #[async_trait]
    impl ReverseGeocoder for Fixed {
        async fn reverse_geocode(&self, c: Coordinates) -> Result<Vec<Address>, GeocodeError> {
            Ok(vec![Address {
                formatted_address: Some(format!("{} @ {c}", self.0)),
                ..Default::default()
            }])
        }
    }

    #[async_trait]
    impl ForwardGeocoder for Fixed {
        async fn geocode(&self, _address: &str) -> Result<Vec<Coordinates>, GeocodeError> {
            Ok(vec![Coordinates { latitude: 1.0, longitude: 2.0 }])
        }
    }

    #[derive(Debug)]
    struct Down;

    impl Endpoint for Down {
        fn url(&self) -> &str {
            "stub://down"
        }
    }

    #[async_trait]
    impl ReverseGeocoder for Down {
        async fn reverse_geocode(&self, _c: Coordinates) -> Result<Vec<Address>, GeocodeError> {
            Err(GeocodeError::Timeout)
        }
    }

    fn gateway(default: &str) -> Gateway {
        let mut reversers = ReverseRegistry::new();
        reversers.register("NOMINATIM", Arc::new(Fixed("nominatim")));
        reversers.register("HERE", Arc::new(Fixed("here")));
        reversers.register("BROKEN", Arc::new(Down));

        let mut geocoders = ForwardRegistry::new();
        geocoders.register("NOMINATIM", Arc::new(Fixed("nominatim")));

        Gateway::new(reversers, geocoders, default)
    }

    fn label(addresses: &[Address]) -> &str {
        addresses[0].formatted_address.as_deref().unwrap()
    }

    #[tokio::test]
    async fn explicit_platform_is_case_insensitive() {
        let found = gateway("NOMINATIM").reverse_geocode(1.5, 2.5, Some("here")).await.unwrap();
        assert_eq!(label(&found), "here @ 1.5,2.5");
    }

    #[tokio::test]
    async fn missing_platform_uses_default() {
        let found = gateway("nominatim").reverse_geocode(0.0, 0.0, None).await.unwrap();
        assert_eq!(label(&found), "nominatim @ 0,0");

        let found = gateway("HERE").reverse_geocode(0.0, 0.0, Some("  ")).await.unwrap();
        assert_eq!(label(&found), "here @ 0,0");
    }

    #[tokio::test]
    async fn unregistered_default_is_reported_as_default() {
        let err = gateway("geoapify").reverse_geocode(0.0, 0.0, None).await.unwrap_err();
        assert!(matches!(&err, GeocodeError::DefaultUnavailable(name) if name == "GEOAPIFY"));
        assert_eq!(err.to_string(), "Default geocoder 'GEOAPIFY' is not configured.");
    }

    #[tokio::test]
    async fn empty_registry_without_platform_is_no_providers() {
        let gw = Gateway::new(ReverseRegistry::new(), ForwardRegistry::new(), "NOMINATIM");

        assert!(matches!(gw.reverse_geocode(0.0, 0.0, None).await, Err(GeocodeError::NoProviders)));
        assert!(matches!(
            gw.reverse_geocode(0.0, 0.0, Some("here")).await,
            Err(GeocodeError::UnknownProvider(_))
        ));
    }

    #[tokio::test]
    async fn invalid_coordinates_fail_before_lookup() {
        let err = gateway("NOMINATIM").reverse_geocode(91.0, 0.0, Some("nope")).await.unwrap_err();
        assert!(matches!(err, GeocodeError::Validation(_)));
    }

    #[tokio::test]
    async fn provider_failure_is_returned_not_raised() {
        let gw = gateway("NOMINATIM");
        assert!(matches!(gw.reverse_geocode(0.0, 0.0, Some("broken")).await, Err(GeocodeError::Timeout)));
        // the gateway keeps serving afterwards
        assert!(gw.reverse_geocode(0.0, 0.0, None).await.is_ok());
    }

    #[tokio::test]
    async fn geocode_rejects_blank_address() {
        let err = gateway("NOMINATIM").geocode("   ", None).await.unwrap_err();
        assert!(matches!(err, GeocodeError::Validation(_)));

        let found = gateway("NOMINATIM").geocode("Madrid", None).await.unwrap();
        assert_eq!(found.len(), 1);
    }

    #[test]
    fn from_environment_applies_default_provider() {
        let env = Environment::from_pairs([("HERE_API_KEY", "h")]);
        let config = Config { default_provider: Some("here".into()), ..Config::default() };
        let gw = Gateway::from_environment(&config, &env).unwrap();

        assert_eq!(gw.default_provider(), "HERE");
        assert_eq!(gw.reversers().len(), 1);
        assert!(gw.geocoders().is_empty());
    }
}
