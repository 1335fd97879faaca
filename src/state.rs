use indexmap::IndexMap;

use crate::chart::ChartSeries;
use crate::config::AppConfig;
use crate::format::{self, Unit};
use crate::models::{AlertHistory, Filter, HistoryItem, LatestAlert, Location};
use crate::quality::{classify, Classification, Thresholds};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layer {
    Markers,
    Circles,
    Heatmap,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layers {
    pub markers: bool,
    pub circles: bool,
    pub heatmap: bool,
}

impl Default for Layers {
    fn default() -> Self {
        Self {
            markers: true,
            circles: true,
            heatmap: false,
        }
    }
}

/// Everything the detail panel shows, already formatted.
#[derive(Debug, Clone, PartialEq)]
pub struct DetailPanel {
    pub device_id: String,
    pub name: String,
    pub classification: Classification,
    pub score: String,
    pub tvoc: String,
    pub eco2: String,
    pub temperature: String,
    pub humidity: String,
    pub pressure: String,
    pub updated: String,
    /// The device was missing from the latest snapshot.
    pub stale: bool,
}

impl DetailPanel {
    pub fn from_location(device_id: &str, location: &Location, thresholds: &Thresholds) -> Self {
        Self {
            device_id: device_id.to_string(),
            name: location.display_name().to_string(),
            classification: classify(location.status.as_deref(), location.tvoc_ppb, thresholds),
            score: format::format_value(location.score, Unit::Score),
            tvoc: format::format_value(location.tvoc_ppb, Unit::Ppb),
            eco2: format::format_value(location.eco2_ppm, Unit::Ppm),
            temperature: format::format_value(location.temperature, Unit::Celsius),
            humidity: format::format_value(location.humidity, Unit::Percent),
            pressure: format::format_value(location.pressure, Unit::Hpa),
            updated: format::format_update_time(location.last_update.as_deref()),
            stale: false,
        }
    }
}

#[derive(Debug, Clone)]
pub enum StateEvent {
    CitiesLoaded(Vec<String>),
    /// Choosing a city resets the district.
    CitySelected(String),
    DistrictsLoaded { city: String, districts: Vec<String> },
    DistrictSelected(String),
    LocationSelected(String),
    Deselected,
    /// A fresh `/map/points` snapshot, with the wall-clock time it arrived.
    SnapshotLoaded { locations: Vec<Location>, at: String },
    /// Per-device results carry the device they were fetched for and are
    /// dropped when the selection has moved on.
    AlertsLoaded { device_id: String, history: AlertHistory },
    LatestAlertLoaded { device_id: String, latest: Option<LatestAlert> },
    ChartLoaded { device_id: String, items: Vec<HistoryItem> },
    LayerToggled { layer: Layer, visible: bool },
}

/// The whole dashboard state. Transitions go through [`AppState::apply`].
#[derive(Debug, Clone)]
pub struct AppState {
    pub thresholds: Thresholds,
    pub filter: Filter,
    pub cities: Vec<String>,
    pub districts: IndexMap<String, Vec<String>>,
    pub locations: Vec<Location>,
    pub selected: Option<String>,
    pub detail: Option<DetailPanel>,
    pub alerts: Option<AlertHistory>,
    pub latest_alert: Option<LatestAlert>,
    pub chart: ChartSeries,
    pub layers: Layers,
    pub last_update: Option<String>,
}

impl AppState {
    pub fn new(thresholds: Thresholds) -> Self {
        Self {
            thresholds,
            filter: Filter::default(),
            cities: Vec::new(),
            districts: IndexMap::new(),
            locations: Vec::new(),
            selected: None,
            detail: None,
            alerts: None,
            latest_alert: None,
            chart: ChartSeries::default(),
            layers: Layers::default(),
            last_update: None,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        let mut state = Self::new(Thresholds::from(&config.thresholds));
        state.filter = Filter {
            city: config.filter.city.clone(),
            district: config.filter.district.clone(),
        };
        state.layers = Layers {
            markers: config.map.show_markers,
            circles: config.map.show_circles,
            heatmap: config.map.show_heatmap,
        };
        if !config.filter.device.is_empty() {
            state.selected = Some(config.filter.device.clone());
        }
        state
    }

    pub fn find_location(&self, device_id: &str) -> Option<&Location> {
        self.locations
            .iter()
            .find(|loc| loc.device_key() == Some(device_id))
    }

    /// True when a device is selected and present in the current snapshot.
    pub fn selection_is_live(&self) -> bool {
        self.detail.as_ref().is_some_and(|d| !d.stale)
            && self.selected.as_deref().is_some_and(|id| self.find_location(id).is_some())
    }

    pub fn is_selected(&self, device_id: &str) -> bool {
        self.selected.as_deref() == Some(device_id)
    }

    pub fn districts_for(&self, city: &str) -> &[String] {
        self.districts.get(city).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn apply(mut self, event: StateEvent) -> Self {
        match event {
            StateEvent::CitiesLoaded(cities) => {
                self.cities = cities;
            }
            StateEvent::CitySelected(city) => {
                self.filter.city = city;
                self.filter.district.clear();
            }
            StateEvent::DistrictsLoaded { city, districts } => {
                self.districts.insert(city, districts);
            }
            StateEvent::DistrictSelected(district) => {
                self.filter.district = district;
            }
            StateEvent::LocationSelected(device_id) => {
                self.detail = self
                    .find_location(&device_id)
                    .map(|loc| DetailPanel::from_location(&device_id, loc, &self.thresholds));
                self.selected = Some(device_id);
                self.alerts = None;
                self.latest_alert = None;
                self.chart = ChartSeries::default();
            }
            StateEvent::Deselected => {
                self.selected = None;
                self.detail = None;
                self.alerts = None;
                self.latest_alert = None;
                self.chart = ChartSeries::default();
            }
            StateEvent::SnapshotLoaded { locations, at } => {
                self.locations = locations;
                self.last_update = Some(at);
                self.reconcile_selection();
            }
            StateEvent::AlertsLoaded { device_id, history } => {
                if self.is_selected(&device_id) {
                    self.alerts = Some(history);
                }
            }
            StateEvent::LatestAlertLoaded { device_id, latest } => {
                if self.is_selected(&device_id) {
                    self.latest_alert = latest;
                }
            }
            StateEvent::ChartLoaded { device_id, items } => {
                if self.is_selected(&device_id) {
                    self.chart = ChartSeries::from_items(&items);
                }
            }
            StateEvent::LayerToggled { layer, visible } => match layer {
                Layer::Markers => self.layers.markers = visible,
                Layer::Circles => self.layers.circles = visible,
                Layer::Heatmap => self.layers.heatmap = visible,
            },
        }
        self
    }

    // A selected device missing from the new snapshot keeps its last detail,
    // flagged stale.
    fn reconcile_selection(&mut self) {
        let Some(device_id) = self.selected.clone() else {
            return;
        };
        match self.find_location(&device_id) {
            Some(location) => {
                self.detail = Some(DetailPanel::from_location(&device_id, location, &self.thresholds));
            }
            None => {
                if let Some(detail) = self.detail.as_mut() {
                    detail.stale = true;
                }
            }
        }
    }
}
