use serde::{Deserialize, Serialize};

use crate::error::GeocodeError;

/// Pattern used to compose an address when the provider gave no label.
///
/// Placeholders: `%h` house, `%r` street, `%t` settlement, `%u` suburb,
/// `%d` district, `%s` state, `%p` postcode, `%c` country.
pub const DEFAULT_ADDRESS_FORMAT: &str = "%h %r, %t, %s, %c";

/// A latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    /// Validated constructor; rejects out-of-range and non-finite values.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, GeocodeError> {
        if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
            return Err(GeocodeError::Validation(format!(
                "latitude must be within [-90, 90], got {latitude}"
            )));
        }
        if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
            return Err(GeocodeError::Validation(format!(
                "longitude must be within [-180, 180], got {longitude}"
            )));
        }

        Ok(Self { latitude, longitude })
    }
}

impl std::fmt::Display for Coordinates {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{},{}", self.latitude, self.longitude)
    }
}

/// Provider-independent address record.
///
/// Every field is always serialized; unknown components are `null`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub formatted_address: Option<String>,
    pub postcode: Option<String>,
    pub country: Option<String>,
    pub state: Option<String>,
    pub district: Option<String>,
    pub settlement: Option<String>,
    pub suburb: Option<String>,
    pub street: Option<String>,
    pub house: Option<String>,
}

impl Address {
    /// True when any component other than `formatted_address` is non-blank.
    pub(crate) fn has_components(&self) -> bool {
        [
            &self.postcode,
            &self.country,
            &self.state,
            &self.district,
            &self.settlement,
            &self.suburb,
            &self.street,
            &self.house,
        ]
        .iter()
        .any(|c| c.as_deref().is_some_and(|v| !v.trim().is_empty()))
    }

    /// Render the address components through `pattern`, dropping empty
    /// comma-separated segments. Returns an empty string when no component
    /// is known.
    pub fn compose(&self, pattern: &str) -> String {
        if !self.has_components() {
            return String::new();
        }

        let substitutions = [
            ("%p", &self.postcode),
            ("%c", &self.country),
            ("%s", &self.state),
            ("%d", &self.district),
            ("%t", &self.settlement),
            ("%u", &self.suburb),
            ("%r", &self.street),
            ("%h", &self.house),
        ];

        let mut rendered = pattern.to_string();
        for (placeholder, value) in substitutions {
            rendered = rendered.replace(placeholder, value.as_deref().unwrap_or(""));
        }

        rendered
            .split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// The provider's label if it supplied one, otherwise a composed one.
    pub fn label(&self) -> String {
        match self.formatted_address.as_deref() {
            Some(label) if !label.trim().is_empty() => label.to_string(),
            _ => self.compose(DEFAULT_ADDRESS_FORMAT),
        }
    }
}

/// Uniform wrapper returned for every geocoding request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub success: bool,
    pub data: Option<Vec<T>>,
    pub error: Option<String>,
}

impl<T> Envelope<T> {
    pub fn ok(data: Vec<T>) -> Self {
        Self { success: true, data: Some(data), error: None }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self { success: false, data: None, error: Some(error.into()) }
    }
}

impl<T> From<Result<Vec<T>, GeocodeError>> for Envelope<T> {
    fn from(result: Result<Vec<T>, GeocodeError>) -> Self {
        match result {
            Ok(data) => Envelope::ok(data),
            Err(err) => Envelope::failure(err.to_string()),
        }
    }
}

pub type ReverseGeocodeResponse = Envelope<Address>;
pub type GeocodeResponse = Envelope<Coordinates>;

/// Registry entry as exposed by the listing endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeocoderInfo {
    pub name: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeocodersResponse {
    pub geocoders: Vec<GeocoderInfo>,
}
