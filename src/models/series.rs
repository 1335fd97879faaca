use serde::Deserialize;

use super::{deserialize_id, null_default};

/// One row of `/history`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct HistoryItem {
    #[serde(default, alias = "timestamp")]
    pub ts: Option<String>,
    #[serde(default)]
    pub tvoc_ppb: Option<f64>,
    #[serde(default)]
    pub eco2_ppm: Option<f64>,
    #[serde(default)]
    pub temp_c: Option<f64>,
    #[serde(default)]
    pub hum_rh: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct HistoryResponse {
    #[serde(default, deserialize_with = "deserialize_id")]
    pub device_id: String,
    #[serde(default, deserialize_with = "null_default")]
    pub count: usize,
    #[serde(default, deserialize_with = "null_default")]
    pub items: Vec<HistoryItem>,
}
