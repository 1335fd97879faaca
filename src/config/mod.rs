use anyhow::{Context, Result};
use config::{Config, File};
use image::Rgba;
use log::{debug, info, LevelFilter};
use serde::{Deserialize, Deserializer};
use std::fs;
use std::path::Path;

use crate::quality::classifier::Thresholds;

fn deserialize_hex_colour<'de, D>(deserializer: D) -> Result<Rgba<u8>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = String::deserialize(deserializer)?;
    parse_hex_colour(&value).map_err(serde::de::Error::custom)
}

/// Parses `#rrggbb` or `0xrrggbb` into an opaque colour.
pub fn parse_hex_colour(value: &str) -> Result<Rgba<u8>, String> {
    let value = value.trim();
    let digits = value
        .strip_prefix('#')
        .or_else(|| value.strip_prefix("0x"))
        .or_else(|| value.strip_prefix("0X"))
        .ok_or_else(|| format!("colour must start with '#' or '0x': {value}"))?;

    if digits.len() != 6 {
        return Err(format!("colour must have 6 hex digits: {value}"));
    }

    let rgb = u32::from_str_radix(digits, 16).map_err(|e| format!("{value}: {e}"))?;
    Ok(Rgba([(rgb >> 16) as u8, (rgb >> 8) as u8, rgb as u8, 255]))
}

fn colour_to_hex(colour: &Rgba<u8>) -> String {
    let [r, g, b, _] = colour.0;
    format!("{:#08x}", (r as u32) << 16 | (g as u32) << 8 | b as u32)
}

#[derive(Debug, Deserialize, Clone)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_poll_secs")]
    pub poll_secs: u64,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_history_limit")]
    pub history_limit: u32,
    #[serde(default = "default_alert_hours")]
    pub alert_hours: u32,
    #[serde(default = "default_alert_limit")]
    pub alert_limit: u32,
    #[serde(default = "default_alert_every")]
    pub alert_every: u64,
}

fn default_base_url() -> String {
    "http://127.0.0.1:8000".to_string()
}

fn default_poll_secs() -> u64 {
    10
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_history_limit() -> u32 {
    120
}

fn default_alert_hours() -> u32 {
    24
}

fn default_alert_limit() -> u32 {
    5
}

fn default_alert_every() -> u64 {
    3
}

impl ApiConfig {
    /// The configured key, or `None` when it is blank.
    pub fn key(&self) -> Option<&str> {
        let key = self.api_key.trim();
        if key.is_empty() {
            None
        } else {
            Some(key)
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key: String::new(),
            poll_secs: default_poll_secs(),
            timeout_secs: default_timeout_secs(),
            history_limit: default_history_limit(),
            alert_hours: default_alert_hours(),
            alert_limit: default_alert_limit(),
            alert_every: default_alert_every(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ThresholdsConfig {
    #[serde(default = "default_good_ceiling")]
    pub good: f64,
    #[serde(default = "default_moderate_ceiling")]
    pub moderate: f64,
}

fn default_good_ceiling() -> f64 {
    220.0
}

fn default_moderate_ceiling() -> f64 {
    660.0
}

impl Default for ThresholdsConfig {
    fn default() -> Self {
        Self {
            good: default_good_ceiling(),
            moderate: default_moderate_ceiling(),
        }
    }
}

impl From<&ThresholdsConfig> for Thresholds {
    fn from(config: &ThresholdsConfig) -> Self {
        Thresholds {
            good: config.good,
            moderate: config.moderate,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ColoursConfig {
    #[serde(default = "default_good_colour", deserialize_with = "deserialize_hex_colour")]
    pub good: Rgba<u8>,
    #[serde(default = "default_moderate_colour", deserialize_with = "deserialize_hex_colour")]
    pub moderate: Rgba<u8>,
    #[serde(default = "default_poor_colour", deserialize_with = "deserialize_hex_colour")]
    pub poor: Rgba<u8>,
    #[serde(default = "default_no_data_colour", deserialize_with = "deserialize_hex_colour")]
    pub no_data: Rgba<u8>,
}

fn default_good_colour() -> Rgba<u8> {
    Rgba([0, 200, 83, 255])
}

fn default_moderate_colour() -> Rgba<u8> {
    Rgba([255, 193, 7, 255])
}

fn default_poor_colour() -> Rgba<u8> {
    Rgba([244, 67, 54, 255])
}

fn default_no_data_colour() -> Rgba<u8> {
    Rgba([158, 158, 158, 255])
}

impl Default for ColoursConfig {
    fn default() -> Self {
        Self {
            good: default_good_colour(),
            moderate: default_moderate_colour(),
            poor: default_poor_colour(),
            no_data: default_no_data_colour(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct MapConfig {
    #[serde(default = "default_center_lat")]
    pub center_lat: f64,
    #[serde(default = "default_center_lon")]
    pub center_lon: f64,
    #[serde(default = "default_span_deg")]
    pub span_deg: f64,
    #[serde(default = "default_true")]
    pub show_markers: bool,
    #[serde(default = "default_true")]
    pub show_circles: bool,
    #[serde(default)]
    pub show_heatmap: bool,
}

fn default_center_lat() -> f64 {
    38.7205
}

fn default_center_lon() -> f64 {
    35.4826
}

fn default_span_deg() -> f64 {
    0.6
}

fn default_true() -> bool {
    true
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            center_lat: default_center_lat(),
            center_lon: default_center_lon(),
            span_deg: default_span_deg(),
            show_markers: true,
            show_circles: true,
            show_heatmap: false,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct FilterConfig {
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub district: String,
    #[serde(default)]
    pub device: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DashboardConfig {
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
    #[serde(default = "default_file")]
    pub file: String,
    #[serde(default = "default_font")]
    pub font: String,
    #[serde(default = "default_true")]
    pub save_to_file: bool,
}

fn default_width() -> u32 {
    1280
}

fn default_height() -> u32 {
    720
}

fn default_file() -> String {
    "dashboard.png".to_string()
}

fn default_font() -> String {
    "/usr/share/fonts/truetype/dejavu/DejaVuSansMono.ttf".to_string()
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
            file: default_file(),
            font: default_font(),
            save_to_file: true,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct AppConfig {
    #[serde(rename = "API", alias = "api", default)]
    pub api: ApiConfig,
    #[serde(rename = "THRESHOLDS", alias = "thresholds", default)]
    pub thresholds: ThresholdsConfig,
    #[serde(rename = "COLOURS", alias = "colours", default)]
    pub colours: ColoursConfig,
    #[serde(rename = "MAP", alias = "map", default)]
    pub map: MapConfig,
    #[serde(rename = "FILTER", alias = "filter", default)]
    pub filter: FilterConfig,
    #[serde(rename = "DASHBOARD", alias = "dashboard", default)]
    pub dashboard: DashboardConfig,
    #[serde(rename = "LOGGING", alias = "logging", default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    pub fn new() -> Result<Self> {
        Self::from_file("config.ini")
    }

    pub fn get_log_level(&self) -> LevelFilter {
        match self.logging.level.to_lowercase().as_str() {
            "trace" => LevelFilter::Trace,
            "debug" => LevelFilter::Debug,
            "info" => LevelFilter::Info,
            "warn" => LevelFilter::Warn,
            "error" => LevelFilter::Error,
            "off" => LevelFilter::Off,
            _ => LevelFilter::Info, // Default to Info if invalid
        }
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config_path = path.as_ref();
        debug!("Loading configuration from {}", config_path.display());

        let config = Config::builder()
            .add_source(File::with_name(config_path.to_str().unwrap_or("")).format(config::FileFormat::Ini))
            .build()
            .context(format!("Failed to load config from {}", config_path.display()))?;

        let app_config: AppConfig = config.try_deserialize()
            .context("Failed to deserialize config")?;

        Ok(app_config)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let config_path = path.as_ref();

        let mut config_str = String::new();

        config_str.push_str(&format!(
            "[API]\nbase_url = {}\napi_key = {}\npoll_secs = {}\ntimeout_secs = {}\nhistory_limit = {}\nalert_hours = {}\nalert_limit = {}\nalert_every = {}\n\n",
            self.api.base_url,
            self.api.api_key,
            self.api.poll_secs,
            self.api.timeout_secs,
            self.api.history_limit,
            self.api.alert_hours,
            self.api.alert_limit,
            self.api.alert_every
        ));

        config_str.push_str(&format!(
            "[THRESHOLDS]\ngood = {}\nmoderate = {}\n\n",
            self.thresholds.good, self.thresholds.moderate
        ));

        config_str.push_str(&format!(
            "[COLOURS]\ngood = {}\nmoderate = {}\npoor = {}\nno_data = {}\n\n",
            colour_to_hex(&self.colours.good),
            colour_to_hex(&self.colours.moderate),
            colour_to_hex(&self.colours.poor),
            colour_to_hex(&self.colours.no_data)
        ));

        config_str.push_str(&format!(
            "[MAP]\ncenter_lat = {}\ncenter_lon = {}\nspan_deg = {}\nshow_markers = {}\nshow_circles = {}\nshow_heatmap = {}\n\n",
            self.map.center_lat,
            self.map.center_lon,
            self.map.span_deg,
            self.map.show_markers,
            self.map.show_circles,
            self.map.show_heatmap
        ));

        config_str.push_str(&format!(
            "[FILTER]\ncity = {}\ndistrict = {}\ndevice = {}\n\n",
            self.filter.city, self.filter.district, self.filter.device
        ));

        config_str.push_str(&format!(
            "[DASHBOARD]\nwidth = {}\nheight = {}\nfile = {}\nfont = {}\nsave_to_file = {}\n\n",
            self.dashboard.width,
            self.dashboard.height,
            self.dashboard.file,
            self.dashboard.font,
            self.dashboard.save_to_file
        ));

        config_str.push_str(&format!("[LOGGING]\nlevel = {}\n", self.logging.level));

        fs::write(config_path, config_str)
            .context(format!("Failed to save config to {}", config_path.display()))?;

        info!("Configuration saved to {}", config_path.display());
        Ok(())
    }
}
