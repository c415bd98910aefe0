use async_trait::async_trait;
use serde::Deserialize;

use crate::{
    Address, Coordinates, GeocodeError,
    http::HttpClient,
    provider::{Endpoint, ReverseGeocoder, first_present},
};

pub const GEOAPIFY_REVERSE_URL: &str = "https://api.geoapify.com/v1/geocode/reverse";

#[derive(Debug, Clone)]
pub struct GeoapifyReverseGeocoder {
    api_key: String,
    url: String,
    http: HttpClient,
}

impl GeoapifyReverseGeocoder {
    pub fn new(api_key: String, http: HttpClient) -> Self {
        Self {
            api_key,
            url: GEOAPIFY_REVERSE_URL.to_string(),
            http,
        }
    }

    /// Point the client at a different endpoint (used by tests).
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }
}

#[derive(Debug, Deserialize)]
struct GeoapifyResponse {
    features: Vec<GeoapifyFeature>,
}

#[derive(Debug, Deserialize)]
struct GeoapifyFeature {
    #[serde(default)]
    properties: GeoapifyProperties,
}

#[derive(Debug, Default, Deserialize)]
struct GeoapifyProperties {
    formatted: Option<String>,
    postcode: Option<String>,
    country: Option<String>,
    state: Option<String>,
    district: Option<String>,
    city: Option<String>,
    town: Option<String>,
    suburb: Option<String>,
    street: Option<String>,
    name: Option<String>,
    housenumber: Option<String>,
}

impl From<GeoapifyProperties> for Address {
    fn from(p: GeoapifyProperties) -> Self {
        Address {
            formatted_address: p.formatted,
            postcode: p.postcode,
            country: p.country,
            state: p.state,
            district: p.district,
            settlement: first_present([p.city, p.town]),
            suburb: p.suburb,
            street: p.street,
            house: first_present([p.name, p.housenumber]),
        }
    }
}

impl Endpoint for GeoapifyReverseGeocoder {
    fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl ReverseGeocoder for GeoapifyReverseGeocoder {
    async fn reverse_geocode(&self, coordinates: Coordinates) -> Result<Vec<Address>, GeocodeError> {
        let query = [
            ("lat", coordinates.latitude.to_string()),
            ("lon", coordinates.longitude.to_string()),
            ("apiKey", self.api_key.clone()),
            ("type", "building".to_string()),
        ];

        let parsed: GeoapifyResponse = self.http.get_json(&self.url, &query, None).await?;
        if parsed.features.is_empty() {
            return Err(GeocodeError::NoResults);
        }

        Ok(parsed
            .features
            .into_iter()
            .map(|feature| Address::from(feature.properties))
            .collect())
    }
}
