use async_trait::async_trait;
use serde::Deserialize;

use crate::{
    Address, Coordinates, GeocodeError,
    http::HttpClient,
    provider::{Endpoint, ReverseGeocoder},
};

pub const HERE_REVERSE_URL: &str = "https://revgeocode.search.hereapi.com/v1/revgeocode";

#[derive(Debug, Clone)]
pub struct HereReverseGeocoder {
    api_key: String,
    url: String,
    http: HttpClient,
}

impl HereReverseGeocoder {
    pub fn new(api_key: String, http: HttpClient) -> Self {
        Self {
            api_key,
            url: HERE_REVERSE_URL.to_string(),
            http,
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }
}

#[derive(Debug, Deserialize)]
struct HereResponse {
    items: Vec<HereItem>,
}

#[derive(Debug, Deserialize)]
struct HereItem {
    #[serde(default)]
    address: HereAddress,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HereAddress {
    label: Option<String>,
    postal_code: Option<String>,
    country_code: Option<String>,
    state: Option<String>,
    district: Option<String>,
    city: Option<String>,
    subdistrict: Option<String>,
    street: Option<String>,
    house_number: Option<String>,
}

impl From<HereAddress> for Address {
    fn from(a: HereAddress) -> Self {
        Address {
            formatted_address: a.label,
            postcode: a.postal_code,
            country: a.country_code,
            state: a.state,
            district: a.district,
            settlement: a.city,
            suburb: a.subdistrict,
            street: a.street,
            house: a.house_number,
        }
    }
}

impl Endpoint for HereReverseGeocoder {
    fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl ReverseGeocoder for HereReverseGeocoder {
    async fn reverse_geocode(&self, coordinates: Coordinates) -> Result<Vec<Address>, GeocodeError> {
        let query = [
            ("at", coordinates.to_string()),
            ("apiKey", self.api_key.clone()),
            ("lang", "en-US".to_string()),
        ];

        let parsed: HereResponse = self.http.get_json(&self.url, &query, None).await?;
        if parsed.items.is_empty() {
            return Err(GeocodeError::NoResults);
        }

        Ok(parsed.items.into_iter().map(|item| Address::from(item.address)).collect())
    }
}
