use serde::Deserialize;

use super::{deserialize_id, null_default};

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Alert {
    #[serde(default)]
    pub ts: Option<String>,
    #[serde(default)]
    pub tvoc_ppb: Option<f64>,
    #[serde(default)]
    pub eco2_ppm: Option<f64>,
    #[serde(default)]
    pub status: Option<String>,
}

/// Response of `/alerts/history`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct AlertHistory {
    #[serde(default, deserialize_with = "deserialize_id")]
    pub device_id: String,
    #[serde(default, deserialize_with = "null_default")]
    pub count: usize,
    #[serde(default, deserialize_with = "null_default")]
    pub items: Vec<Alert>,
}

impl AlertHistory {
    pub fn empty(device_id: &str) -> Self {
        Self {
            device_id: device_id.to_string(),
            count: 0,
            items: Vec::new(),
        }
    }
}

/// Response of `/alerts/latest`. Only `found` is guaranteed.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct LatestAlert {
    #[serde(default, deserialize_with = "null_default")]
    pub found: bool,
    #[serde(default)]
    pub device_id: Option<String>,
    #[serde(default)]
    pub ts: Option<String>,
    #[serde(default)]
    pub score: Option<f64>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub tvoc_ppb: Option<f64>,
    #[serde(default)]
    pub eco2_ppm: Option<f64>,
}
