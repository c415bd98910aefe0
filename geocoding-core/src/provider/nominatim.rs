//! Nominatim clients. The public OpenStreetMap instance and self-hosted
//! replicas speak the same protocol; only the base URL differs.

use async_trait::async_trait;
use serde::Deserialize;

use crate::{
    Address, Coordinates, GeocodeError,
    http::HttpClient,
    provider::{Endpoint, ForwardGeocoder, ReverseGeocoder, first_present},
};

pub const NOMINATIM_REVERSE_URL: &str = "https://nominatim.openstreetmap.org/reverse";
pub const NOMINATIM_SEARCH_URL: &str = "https://nominatim.openstreetmap.org/search";

const SEARCH_LIMIT: &str = "5";

#[derive(Debug, Clone)]
pub struct NominatimReverseGeocoder {
    url: String,
    user_agent: String,
    http: HttpClient,
}

impl NominatimReverseGeocoder {
    /// Client for the public instance.
    pub fn new(user_agent: String, http: HttpClient) -> Self {
        Self::replica(NOMINATIM_REVERSE_URL.to_string(), user_agent, http)
    }

    /// Client for a self-hosted instance at `url`.
    pub fn replica(url: String, user_agent: String, http: HttpClient) -> Self {
        Self { url, user_agent, http }
    }
}

#[derive(Debug, Deserialize)]
struct NominatimReverse {
    display_name: Option<String>,
    address: Option<NominatimAddress>,
}

#[derive(Debug, Default, Deserialize)]
struct NominatimAddress {
    postcode: Option<String>,
    country: Option<String>,
    state: Option<String>,
    plot: Option<String>,
    state_district: Option<String>,
    city: Option<String>,
    town: Option<String>,
    village: Option<String>,
    suburb: Option<String>,
    city_district: Option<String>,
    road: Option<String>,
    house_number: Option<String>,
}

fn to_address(display_name: Option<String>, a: NominatimAddress) -> Address {
    Address {
        formatted_address: display_name,
        postcode: a.postcode,
        country: a.country,
        state: first_present([a.state, a.plot]),
        district: a.state_district,
        settlement: first_present([a.city, a.town, a.village]),
        suburb: first_present([a.suburb, a.city_district]),
        street: a.road,
        house: a.house_number,
    }
}

impl Endpoint for NominatimReverseGeocoder {
    fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl ReverseGeocoder for NominatimReverseGeocoder {
    async fn reverse_geocode(&self, coordinates: Coordinates) -> Result<Vec<Address>, GeocodeError> {
        let query = [
            ("format", "json".to_string()),
            ("lat", coordinates.latitude.to_string()),
            ("lon", coordinates.longitude.to_string()),
            ("accept-language", "en".to_string()),
            ("addressdetails", "1".to_string()),
        ];

        let parsed: NominatimReverse =
            self.http.get_json(&self.url, &query, Some(&self.user_agent)).await?;

        // Nominatim answers `{"error": "Unable to geocode"}` for points with no data.
        let address = parsed.address.ok_or(GeocodeError::NoResults)?;
        let address = to_address(parsed.display_name, address);
        if !address.has_components() {
            return Err(GeocodeError::NoResults);
        }

        Ok(vec![address])
    }
}

#[derive(Debug, Clone)]
pub struct NominatimGeocoder {
    url: String,
    user_agent: String,
    http: HttpClient,
}

impl NominatimGeocoder {
    pub fn new(user_agent: String, http: HttpClient) -> Self {
        Self::replica(NOMINATIM_SEARCH_URL.to_string(), user_agent, http)
    }

    pub fn replica(url: String, user_agent: String, http: HttpClient) -> Self {
        Self { url, user_agent, http }
    }
}

#[derive(Debug, Deserialize)]
struct NominatimPlace {
    lat: String,
    lon: String,
}

impl TryFrom<NominatimPlace> for Coordinates {
    type Error = GeocodeError;

    fn try_from(place: NominatimPlace) -> Result<Self, Self::Error> {
        let parse = |field: &str, raw: &str| {
            raw.trim()
                .parse::<f64>()
                .map_err(|_| GeocodeError::Parse(format!("{field} is not a number: '{raw}'")))
        };

        let latitude = parse("lat", &place.lat)?;
        let longitude = parse("lon", &place.lon)?;

        Coordinates::new(latitude, longitude).map_err(|e| GeocodeError::Parse(e.to_string()))
    }
}

impl Endpoint for NominatimGeocoder {
    fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl ForwardGeocoder for NominatimGeocoder {
    async fn geocode(&self, address: &str) -> Result<Vec<Coordinates>, GeocodeError> {
        let query = [
            ("q", address.to_string()),
            ("format", "json".to_string()),
            ("addressdetails", "1".to_string()),
            ("limit", SEARCH_LIMIT.to_string()),
        ];

        let places: Vec<NominatimPlace> =
            self.http.get_json(&self.url, &query, Some(&self.user_agent)).await?;
        if places.is_empty() {
            return Err(GeocodeError::NoResults);
        }

        places.into_iter().map(Coordinates::try_from).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};
    use serde_json::json;
    use std::time::Duration;

    fn http() -> HttpClient {
        HttpClient::new(Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn reverse_sends_user_agent_and_maps_address() {
        let mut server = Server::new_async().await;
        let body = json!({
            "place_id": 259193717,
            "lat": "40.712776",
            "lon": "-74.005974",
            "display_name": "New York, United States",
            "address": {
                "city": "New York",
                "state": "New York",
                "postcode": "10007",
                "country": "United States",
                "country_code": "us"
            }
        });

        let mock = server
            .mock("GET", "/reverse")
            .match_header("user-agent", "TestApp/1.0")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("format".into(), "json".into()),
                Matcher::UrlEncoded("lat".into(), "40.7128".into()),
                Matcher::UrlEncoded("lon".into(), "-74.006".into()),
                Matcher::UrlEncoded("addressdetails".into(), "1".into()),
            ]))
            .with_status(200)
            .with_body(body.to_string())
            .create_async()
            .await;

        let geocoder =
            NominatimReverseGeocoder::replica(format!("{}/reverse", server.url()), "TestApp/1.0".into(), http());
        let addresses = geocoder
            .reverse_geocode(Coordinates::new(40.7128, -74.006).unwrap())
            .await
            .unwrap();
        mock.assert_async().await;

        assert_eq!(addresses.len(), 1);
        assert_eq!(addresses[0].settlement.as_deref(), Some("New York"));
        assert_eq!(addresses[0].country.as_deref(), Some("United States"));
        assert_eq!(addresses[0].formatted_address.as_deref(), Some("New York, United States"));
    }

    #[tokio::test]
    async fn reverse_without_address_is_no_results() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/reverse")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"{"error":"Unable to geocode"}"#)
            .create_async()
            .await;

        let geocoder =
            NominatimReverseGeocoder::replica(format!("{}/reverse", server.url()), "TestApp/1.0".into(), http());
        let err = geocoder.reverse_geocode(Coordinates::new(0.0, 0.0).unwrap()).await.unwrap_err();
        assert!(matches!(err, GeocodeError::NoResults));
    }

    #[tokio::test]
    async fn reverse_with_empty_address_is_no_results() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/reverse")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"{"display_name":"","address":{}}"#)
            .create_async()
            .await;

        let geocoder =
            NominatimReverseGeocoder::replica(format!("{}/reverse", server.url()), "ua".into(), http());
        let err = geocoder.reverse_geocode(Coordinates::new(0.0, 0.0).unwrap()).await.unwrap_err();
        assert!(matches!(err, GeocodeError::NoResults));
    }

    #[tokio::test]
    async fn reverse_times_out_when_replica_never_answers() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((stream, _)) = listener.accept().await {
                held.push(stream);
            }
        });

        let http = HttpClient::new(Duration::from_millis(300)).unwrap();
        let geocoder = NominatimReverseGeocoder::replica(format!("http://{addr}/reverse"), "ua".into(), http);
        let err = geocoder.reverse_geocode(Coordinates::new(1.0, 1.0).unwrap()).await.unwrap_err();
        assert!(matches!(err, GeocodeError::Timeout), "unexpected error: {err:?}");
    }

    #[tokio::test]
    async fn reverse_falls_back_through_settlement_fields() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/reverse")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(
                json!({
                    "display_name": "Somewhere",
                    "address": { "village": "Hamlet", "city_district": "North", "plot": "Plot 9" }
                })
                .to_string(),
            )
            .create_async()
            .await;

        let geocoder =
            NominatimReverseGeocoder::replica(format!("{}/reverse", server.url()), "ua".into(), http());
        let addresses = geocoder.reverse_geocode(Coordinates::new(1.0, 2.0).unwrap()).await.unwrap();

        assert_eq!(addresses[0].settlement.as_deref(), Some("Hamlet"));
        assert_eq!(addresses[0].suburb.as_deref(), Some("North"));
        assert_eq!(addresses[0].state.as_deref(), Some("Plot 9"));
    }

    #[test]
    fn public_instance_url() {
        let geocoder = NominatimReverseGeocoder::new("ua".into(), http());
        assert_eq!(geocoder.url(), NOMINATIM_REVERSE_URL);
        assert_eq!(NominatimGeocoder::new("ua".into(), http()).url(), NOMINATIM_SEARCH_URL);
    }

    #[tokio::test]
    async fn search_parses_string_coordinates() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/search")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("q".into(), "Puerta del Sol, Madrid".into()),
                Matcher::UrlEncoded("limit".into(), "5".into()),
            ]))
            .with_status(200)
            .with_body(r#"[{"lat":"40.4169","lon":"-3.7035"},{"lat":"40.41","lon":"-3.70"}]"#)
            .create_async()
            .await;

        let geocoder = NominatimGeocoder::replica(format!("{}/search", server.url()), "ua".into(), http());
        let found = geocoder.geocode("Puerta del Sol, Madrid").await.unwrap();
        mock.assert_async().await;

        assert_eq!(found.len(), 2);
        assert_eq!(found[0], Coordinates { latitude: 40.4169, longitude: -3.7035 });
    }

    #[tokio::test]
    async fn search_with_garbage_coordinates_is_parse_error() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/search")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"[{"lat":"north","lon":"-3.7"}]"#)
            .create_async()
            .await;

        let geocoder = NominatimGeocoder::replica(format!("{}/search", server.url()), "ua".into(), http());
        let err = geocoder.geocode("x").await.unwrap_err();
        assert!(matches!(err, GeocodeError::Parse(_)));
    }

    #[tokio::test]
    async fn search_with_no_places_is_no_results() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/search")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body("[]")
            .create_async()
            .await;

        let geocoder = NominatimGeocoder::replica(format!("{}/search", server.url()), "ua".into(), http());
        assert!(matches!(geocoder.geocode("nowhere").await, Err(GeocodeError::NoResults)));
    }
}
