use serde::Deserialize;

use super::{deserialize_opt_id, null_default};

/// One sensor location as returned by `/map/points`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Location {
    #[serde(default, deserialize_with = "deserialize_opt_id")]
    pub device_id: Option<String>,
    #[serde(default, deserialize_with = "deserialize_opt_id")]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub lon: Option<f64>,
    #[serde(default)]
    pub tvoc_ppb: Option<f64>,
    #[serde(default)]
    pub eco2_ppm: Option<f64>,
    #[serde(default)]
    pub temperature: Option<f64>,
    #[serde(default)]
    pub humidity: Option<f64>,
    #[serde(default)]
    pub pressure: Option<f64>,
    #[serde(default)]
    pub score: Option<f64>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub last_update: Option<String>,
}

impl Location {
    /// The identifier used to correlate this location across polls.
    pub fn device_key(&self) -> Option<&str> {
        self.device_id
            .as_deref()
            .filter(|id| !id.is_empty())
            .or_else(|| self.id.as_deref().filter(|id| !id.is_empty()))
    }

    /// Coordinates, when both are present and finite.
    pub fn position(&self) -> Option<(f64, f64)> {
        match (self.lat, self.lon) {
            (Some(lat), Some(lon)) if lat.is_finite() && lon.is_finite() => Some((lat, lon)),
            _ => None,
        }
    }

    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .filter(|name| !name.is_empty())
            .unwrap_or("Unknown Location")
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MapPointsResponse {
    #[serde(default, deserialize_with = "null_default")]
    pub points: Vec<Location>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CitiesResponse {
    #[serde(default, deserialize_with = "null_default")]
    pub cities: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DistrictsResponse {
    #[serde(default, deserialize_with = "null_default")]
    pub districts: Vec<String>,
}
