//! Read-only JSON endpoints of the air-quality backend:
//!
//! | Endpoint               | Query                              | Field used  |
//! |------------------------|------------------------------------|-------------|
//! | `/alerts/latest`       | `device_id`                        | `found`     |
//! | `/alerts/history`      | `device_id`, `hours`, `limit`      | `items`     |
//! | `/locations/cities`    |                                    | `cities`    |
//! | `/locations/districts` | `city`                             | `districts` |
//! | `/map/points`          | `city`, `district` (both optional) | `points`    |
//! | `/history`             | `device_id`, `limit`               | `items`     |
//!
//! Missing collection fields decode as empty, never as errors.

use async_trait::async_trait;
use log::debug;
use serde::de::DeserializeOwned;
use std::time::{Duration, Instant};
use thiserror::Error;

use crate::config::ApiConfig;
use crate::models::alert::{AlertHistory, LatestAlert};
use crate::models::location::{CitiesResponse, DistrictsResponse, Location, MapPointsResponse};
use crate::models::series::{HistoryItem, HistoryResponse};
use crate::models::Filter;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("HTTP {status} for {url}: {message}")]
    Server {
        status: u16,
        url: String,
        message: String,
    },

    #[error("network: {0}")]
    Network(#[from] reqwest::Error),

    #[error("decode: {0}")]
    Decode(String),
}

#[async_trait]
pub trait AirQualityApi: Send + Sync + 'static {
    async fn latest_alert(&self, device_id: &str) -> Result<LatestAlert, ApiError>;

    async fn alert_history(&self, device_id: &str, hours: u32, limit: u32) -> Result<AlertHistory, ApiError>;

    async fn cities(&self) -> Result<Vec<String>, ApiError>;

    async fn districts(&self, city: &str) -> Result<Vec<String>, ApiError>;

    async fn map_points(&self, filter: &Filter) -> Result<Vec<Location>, ApiError>;

    async fn history(&self, device_id: &str, limit: u32) -> Result<Vec<HistoryItem>, ApiError>;
}

pub struct HttpApi {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl HttpApi {
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.key().map(str::to_string),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get<R: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> Result<R, ApiError> {
        let start = Instant::now();
        let url = format!("{}{}", self.base_url, path);

        let mut req = self
            .http
            .get(&url)
            .header(reqwest::header::ACCEPT, "application/json")
            .query(query);
        if let Some(key) = &self.api_key {
            req = req.header("x-api-key", key);
        }

        let resp = req.send().await?;
        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(ApiError::Server {
                status: status.as_u16(),
                url,
                message,
            });
        }

        let body = resp
            .json::<R>()
            .await
            .map_err(|e| ApiError::Decode(format!("{}: {}", path, e)))?;

        debug!("GET {} took: {} ms", path, start.elapsed().as_millis());
        Ok(body)
    }
}

/// Query pairs for `/map/points`; empty filter parts are omitted.
pub(crate) fn map_query(filter: &Filter) -> Vec<(&'static str, String)> {
    let mut query = Vec::new();
    if !filter.city.is_empty() {
        query.push(("city", filter.city.clone()));
    }
    if !filter.district.is_empty() {
        query.push(("district", filter.district.clone()));
    }
    query
}

#[async_trait]
impl AirQualityApi for HttpApi {
    async fn latest_alert(&self, device_id: &str) -> Result<LatestAlert, ApiError> {
        self.get("/alerts/latest", &[("device_id", device_id.to_string())])
            .await
    }

    async fn alert_history(&self, device_id: &str, hours: u32, limit: u32) -> Result<AlertHistory, ApiError> {
        self.get(
            "/alerts/history",
            &[
                ("device_id", device_id.to_string()),
                ("hours", hours.to_string()),
                ("limit", limit.to_string()),
            ],
        )
        .await
    }

    async fn cities(&self) -> Result<Vec<String>, ApiError> {
        let resp: CitiesResponse = self.get("/locations/cities", &[]).await?;
        Ok(resp.cities)
    }

    async fn districts(&self, city: &str) -> Result<Vec<String>, ApiError> {
        let resp: DistrictsResponse = self
            .get("/locations/districts", &[("city", city.to_string())])
            .await?;
        Ok(resp.districts)
    }

    async fn map_points(&self, filter: &Filter) -> Result<Vec<Location>, ApiError> {
        let resp: MapPointsResponse = self.get("/map/points", &map_query(filter)).await?;
        Ok(resp.points)
    }

    async fn history(&self, device_id: &str, limit: u32) -> Result<Vec<HistoryItem>, ApiError> {
        let resp: HistoryResponse = self
            .get(
                "/history",
                &[("device_id", device_id.to_string()), ("limit", limit.to_string())],
            )
            .await?;
        Ok(resp.items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_query_omits_empty_parts() {
        assert!(map_query(&Filter::default()).is_empty());

        let filter = Filter {
            city: "Kayseri".to_string(),
            district: String::new(),
        };
        assert_eq!(map_query(&filter), vec![("city", "Kayseri".to_string())]);

        let filter = Filter {
            city: "Kayseri".to_string(),
            district: "Melikgazi".to_string(),
        };
        assert_eq!(map_query(&filter).len(), 2);
    }

    #[test]
    fn test_blank_api_key_is_not_sent() {
        let mut config = ApiConfig::default();
        config.api_key = "   ".to_string();
        config.base_url = "http://localhost:8000/".to_string();
        let api = HttpApi::new(&config).unwrap();
        assert!(api.api_key.is_none());
        assert_eq!(api.base_url(), "http://localhost:8000");

        config.api_key = " key ".to_string();
        let api = HttpApi::new(&config).unwrap();
        assert_eq!(api.api_key.as_deref(), Some("key"));
    }

    #[tokio::test]
    async fn test_unreachable_server_is_network_error() {
        let mut config = ApiConfig::default();
        config.base_url = "http://127.0.0.1:1".to_string();
        config.timeout_secs = 2;
        let api = HttpApi::new(&config).unwrap();
        let err = api.cities().await.unwrap_err();
        assert!(matches!(err, ApiError::Network(_)));
    }
}
