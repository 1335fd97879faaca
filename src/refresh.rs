use log::{debug, error, info, warn};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;

use crate::client::api::AirQualityApi;
use crate::config::ApiConfig;
use crate::models::AlertHistory;
use crate::state::{AppState, StateEvent};

/// What started a refresh cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshTrigger {
    /// Periodic poll. Only these advance the tick counter.
    Timer,
    /// The city/district filter was applied: map data only.
    Filter,
    /// Explicit refresh request: full cycle, alerts included.
    Manual,
    /// A location was just selected: full cycle plus the latest alert.
    Selection,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    Completed { tick: Option<u64> },
    /// A timer tick arrived while another cycle was in flight.
    Skipped,
    /// A user trigger arrived mid-cycle; the running cycle will run it next.
    Queued,
}

impl RefreshTrigger {
    // Coalescing keeps the trigger that does the most work.
    fn rank(self) -> u8 {
        match self {
            RefreshTrigger::Timer => 0,
            RefreshTrigger::Filter => 1,
            RefreshTrigger::Manual => 2,
            RefreshTrigger::Selection => 3,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RefreshSettings {
    pub history_limit: u32,
    pub alert_hours: u32,
    pub alert_limit: u32,
    /// Alert history is re-fetched on every n-th timer tick.
    pub alert_every: u64,
}

impl From<&ApiConfig> for RefreshSettings {
    fn from(config: &ApiConfig) -> Self {
        Self {
            history_limit: config.history_limit,
            alert_hours: config.alert_hours,
            alert_limit: config.alert_limit,
            alert_every: config.alert_every.max(1),
        }
    }
}

struct InFlightGuard<'a>(&'a AtomicBool);

impl<'a> InFlightGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Polls the API and folds the results into the shared [`AppState`].
///
/// At most one cycle runs at a time. Timer ticks arriving meanwhile are
/// dropped; user triggers are coalesced into one pending slot that the running
/// cycle works off before it releases the flag.
/// Every fetch fails on its own: the error is logged and the state keeps (or
/// falls back to) a sensible default.
pub struct RefreshDriver {
    api: Arc<dyn AirQualityApi>,
    state: Arc<Mutex<AppState>>,
    settings: RefreshSettings,
    in_flight: AtomicBool,
    pending: Mutex<Option<RefreshTrigger>>,
    ticks: AtomicU64,
}

impl RefreshDriver {
    pub fn new(api: Arc<dyn AirQualityApi>, state: Arc<Mutex<AppState>>, settings: RefreshSettings) -> Self {
        Self {
            api,
            state,
            settings,
            in_flight: AtomicBool::new(false),
            pending: Mutex::new(None),
            ticks: AtomicU64::new(0),
        }
    }

    pub fn state(&self) -> &Arc<Mutex<AppState>> {
        &self.state
    }

    pub fn ticks(&self) -> u64 {
        self.ticks.load(Ordering::Acquire)
    }

    /// Applies one transition to the shared state.
    pub async fn update(&self, event: StateEvent) {
        let mut state = self.state.lock().await;
        *state = state.clone().apply(event);
    }

    pub async fn load_cities(&self) {
        match self.api.cities().await {
            Ok(cities) => {
                debug!("Cities loaded: {}", cities.len());
                self.update(StateEvent::CitiesLoaded(cities)).await;
            }
            Err(e) => error!("Error loading cities: {}", e),
        }
    }

    pub async fn load_districts(&self, city: &str) {
        match self.api.districts(city).await {
            Ok(districts) => {
                debug!("Districts loaded for {}: {}", city, districts.len());
                self.update(StateEvent::DistrictsLoaded {
                    city: city.to_string(),
                    districts,
                })
                .await;
            }
            Err(e) => error!("Error loading districts for {}: {}", city, e),
        }
    }

    pub async fn refresh(&self, trigger: RefreshTrigger) -> RefreshOutcome {
        let Some(mut guard) = InFlightGuard::acquire(&self.in_flight) else {
            if trigger == RefreshTrigger::Timer {
                warn!("Refresh ({:?}) skipped: previous cycle still running", trigger);
                return RefreshOutcome::Skipped;
            }
            self.queue(trigger).await;
            debug!("Refresh ({:?}) queued behind the running cycle", trigger);
            return RefreshOutcome::Queued;
        };

        let mut outcome = self.run_cycle(trigger).await;
        loop {
            loop {
                let next = self.pending.lock().await.take();
                let Some(next) = next else {
                    break;
                };
                outcome = self.run_cycle(next).await;
            }
            drop(guard);

            // A trigger may have been queued between the last check and the release
            if self.pending.lock().await.is_none() {
                return outcome;
            }
            match InFlightGuard::acquire(&self.in_flight) {
                Some(next) => guard = next,
                None => return outcome,
            }
        }
    }

    async fn queue(&self, trigger: RefreshTrigger) {
        let mut pending = self.pending.lock().await;
        *pending = match *pending {
            Some(queued) if queued.rank() >= trigger.rank() => Some(queued),
            _ => Some(trigger),
        };
    }

    async fn run_cycle(&self, trigger: RefreshTrigger) -> RefreshOutcome {
        let start = Instant::now();
        let tick = match trigger {
            RefreshTrigger::Timer => Some(self.ticks.fetch_add(1, Ordering::AcqRel) + 1),
            _ => None,
        };
        info!("Refresh {:?} #{}", trigger, tick.unwrap_or_default());

        self.refresh_map().await;

        if trigger != RefreshTrigger::Filter {
            self.refresh_selection(trigger, tick).await;
        }

        debug!("Refresh {:?} took: {} ms", trigger, start.elapsed().as_millis());
        RefreshOutcome::Completed { tick }
    }

    async fn refresh_map(&self) {
        let filter = self.state.lock().await.filter.clone();
        match self.api.map_points(&filter).await {
            Ok(locations) => {
                debug!("Map data received: {} points", locations.len());
                let at = chrono::Local::now().format("%I:%M:%S %p").to_string();
                self.update(StateEvent::SnapshotLoaded { locations, at }).await;
            }
            Err(e) => error!("Error loading map data: {}", e),
        }
    }

    async fn refresh_selection(&self, trigger: RefreshTrigger, tick: Option<u64>) {
        let (selected, live) = {
            let state = self.state.lock().await;
            (state.selected.clone(), state.selection_is_live())
        };
        let Some(device_id) = selected else {
            return;
        };
        if !live {
            warn!("Selected device {} is not in the current snapshot", device_id);
        }

        if trigger == RefreshTrigger::Selection {
            let latest = match self.api.latest_alert(&device_id).await {
                Ok(latest) => Some(latest).filter(|l| l.found),
                Err(e) => {
                    error!("Error loading latest alert: {}", e);
                    None
                }
            };
            self.update(StateEvent::LatestAlertLoaded {
                device_id: device_id.clone(),
                latest,
            })
            .await;
        }

        let alerts_due = match trigger {
            RefreshTrigger::Timer => live && tick.unwrap_or_default() % self.settings.alert_every == 0,
            RefreshTrigger::Manual | RefreshTrigger::Selection => true,
            RefreshTrigger::Filter => false,
        };
        if alerts_due {
            let history = self
                .api
                .alert_history(&device_id, self.settings.alert_hours, self.settings.alert_limit)
                .await
                .unwrap_or_else(|e| {
                    error!("Error loading alert history: {}", e);
                    AlertHistory::empty(&device_id)
                });
            self.update(StateEvent::AlertsLoaded {
                device_id: device_id.clone(),
                history,
            })
            .await;
        }

        let chart = self.api.history(&device_id, self.settings.history_limit).await;
        match chart {
            Ok(items) => {
                debug!("Chart data received: {} items", items.len());
                self.update(StateEvent::ChartLoaded { device_id, items }).await;
            }
            Err(e) => error!("Error loading chart data: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::api::ApiError;
    use crate::models::{Filter, HistoryItem, LatestAlert, Location};
    use crate::quality::Thresholds;
    use async_trait::async_trait;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    #[derive(Default)]
    struct Calls {
        map: AtomicUsize,
        alerts: AtomicUsize,
        latest: AtomicUsize,
        history: AtomicUsize,
    }

    #[derive(Default)]
    struct FakeApi {
        points: std::sync::Mutex<Vec<Location>>,
        fail_map: AtomicBool,
        fail_history: AtomicBool,
        delay: Option<Duration>,
        history_delay: Option<Duration>,
        calls: Calls,
        last_filter: std::sync::Mutex<Option<Filter>>,
    }

    fn server_error() -> ApiError {
        ApiError::Server {
            status: 500,
            url: "http://fake".to_string(),
            message: "boom".to_string(),
        }
    }

    #[async_trait]
    impl AirQualityApi for FakeApi {
        async fn latest_alert(&self, device_id: &str) -> Result<LatestAlert, ApiError> {
            self.calls.latest.fetch_add(1, Ordering::SeqCst);
            Ok(LatestAlert {
                found: true,
                device_id: Some(device_id.to_string()),
                status: Some("WARN".to_string()),
                ..Default::default()
            })
        }

        async fn alert_history(&self, device_id: &str, _hours: u32, _limit: u32) -> Result<AlertHistory, ApiError> {
            self.calls.alerts.fetch_add(1, Ordering::SeqCst);
            Ok(AlertHistory {
                device_id: device_id.to_string(),
                count: 1,
                items: vec![Default::default()],
            })
        }

        async fn cities(&self) -> Result<Vec<String>, ApiError> {
            Ok(vec!["Kayseri".to_string()])
        }

        async fn districts(&self, _city: &str) -> Result<Vec<String>, ApiError> {
            Err(server_error())
        }

        async fn map_points(&self, filter: &Filter) -> Result<Vec<Location>, ApiError> {
            self.calls.map.fetch_add(1, Ordering::SeqCst);
            *self.last_filter.lock().unwrap() = Some(filter.clone());
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            if self.fail_map.load(Ordering::SeqCst) {
                return Err(server_error());
            }
            Ok(self.points.lock().unwrap().clone())
        }

        async fn history(&self, device_id: &str, limit: u32) -> Result<Vec<HistoryItem>, ApiError> {
            self.calls.history.fetch_add(1, Ordering::SeqCst);
            if let Some(delay) = self.history_delay {
                tokio::time::sleep(delay).await;
            }
            if self.fail_history.load(Ordering::SeqCst) {
                return Err(server_error());
            }
            // n2 readings are offset so charts of different devices differ
            let base = if device_id == "n2" { 100.0 } else { 0.0 };
            Ok((0..limit.min(3))
                .map(|i| HistoryItem {
                    ts: Some(format!("2025-01-01T00:0{}:00Z", i)),
                    tvoc_ppb: Some(base + i as f64),
                    ..Default::default()
                })
                .collect())
        }
    }

    fn location(id: &str, tvoc: f64) -> Location {
        Location {
            device_id: Some(id.to_string()),
            name: Some(id.to_uppercase()),
            tvoc_ppb: Some(tvoc),
            ..Default::default()
        }
    }

    fn settings() -> RefreshSettings {
        RefreshSettings {
            history_limit: 120,
            alert_hours: 24,
            alert_limit: 5,
            alert_every: 3,
        }
    }

    fn driver(api: Arc<FakeApi>) -> RefreshDriver {
        let state = AppState::new(Thresholds {
            good: 220.0,
            moderate: 660.0,
        });
        RefreshDriver::new(api, Arc::new(Mutex::new(state)), settings())
    }

    #[tokio::test]
    async fn test_timer_tick_without_selection_only_loads_map() {
        let api = Arc::new(FakeApi::default());
        *api.points.lock().unwrap() = vec![location("n1", 10.0), location("n2", 900.0)];
        let driver = driver(api.clone());

        let outcome = driver.refresh(RefreshTrigger::Timer).await;

        assert_eq!(outcome, RefreshOutcome::Completed { tick: Some(1) });
        assert_eq!(api.calls.map.load(Ordering::SeqCst), 1);
        assert_eq!(api.calls.history.load(Ordering::SeqCst), 0);
        let state = driver.state().lock().await;
        assert_eq!(state.locations.len(), 2);
        assert!(state.last_update.is_some());
    }

    #[tokio::test]
    async fn test_alerts_every_third_tick_and_chart_every_tick() {
        let api = Arc::new(FakeApi::default());
        *api.points.lock().unwrap() = vec![location("n1", 10.0)];
        let driver = driver(api.clone());
        driver.update(StateEvent::LocationSelected("n1".into())).await;

        for _ in 0..6 {
            driver.refresh(RefreshTrigger::Timer).await;
        }

        assert_eq!(driver.ticks(), 6);
        assert_eq!(api.calls.alerts.load(Ordering::SeqCst), 2);
        assert_eq!(api.calls.history.load(Ordering::SeqCst), 6);
        assert_eq!(api.calls.latest.load(Ordering::SeqCst), 0);
        let state = driver.state().lock().await;
        assert_eq!(state.chart.len(), 3);
        assert_eq!(state.alerts.as_ref().unwrap().count, 1);
    }

    #[tokio::test]
    async fn test_selection_fetches_everything() {
        let api = Arc::new(FakeApi::default());
        *api.points.lock().unwrap() = vec![location("n1", 10.0)];
        let driver = driver(api.clone());
        driver.update(StateEvent::LocationSelected("n1".into())).await;

        let outcome = driver.refresh(RefreshTrigger::Selection).await;

        assert_eq!(outcome, RefreshOutcome::Completed { tick: None });
        assert_eq!(driver.ticks(), 0);
        assert_eq!(api.calls.latest.load(Ordering::SeqCst), 1);
        assert_eq!(api.calls.alerts.load(Ordering::SeqCst), 1);
        assert_eq!(api.calls.history.load(Ordering::SeqCst), 1);
        let state = driver.state().lock().await;
        assert!(state.latest_alert.as_ref().unwrap().found);
        assert_eq!(state.detail.as_ref().unwrap().name, "N1");
    }

    #[tokio::test]
    async fn test_filter_trigger_passes_filter_and_skips_detail() {
        let api = Arc::new(FakeApi::default());
        let driver = driver(api.clone());
        driver.update(StateEvent::CitySelected("Kayseri".into())).await;
        driver.update(StateEvent::LocationSelected("n1".into())).await;

        driver.refresh(RefreshTrigger::Filter).await;

        let filter = api.last_filter.lock().unwrap().clone().unwrap();
        assert_eq!(filter.city, "Kayseri");
        assert_eq!(api.calls.history.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_map_failure_keeps_previous_snapshot() {
        let api = Arc::new(FakeApi::default());
        *api.points.lock().unwrap() = vec![location("n1", 10.0)];
        let driver = driver(api.clone());
        driver.refresh(RefreshTrigger::Timer).await;

        api.fail_map.store(true, Ordering::SeqCst);
        let outcome = driver.refresh(RefreshTrigger::Timer).await;

        assert_eq!(outcome, RefreshOutcome::Completed { tick: Some(2) });
        assert_eq!(driver.state().lock().await.locations.len(), 1);
    }

    #[tokio::test]
    async fn test_chart_failure_does_not_stop_the_cycle() {
        let api = Arc::new(FakeApi::default());
        *api.points.lock().unwrap() = vec![location("n1", 10.0)];
        let driver = driver(api.clone());
        driver.update(StateEvent::LocationSelected("n1".into())).await;
        driver.refresh(RefreshTrigger::Manual).await;
        assert_eq!(driver.state().lock().await.chart.len(), 3);

        api.fail_history.store(true, Ordering::SeqCst);
        let outcome = driver.refresh(RefreshTrigger::Manual).await;

        assert!(matches!(outcome, RefreshOutcome::Completed { .. }));
        // previous chart stays in place, alerts were still refreshed
        assert_eq!(driver.state().lock().await.chart.len(), 3);
        assert_eq!(api.calls.alerts.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_vanished_device_keeps_stale_detail_and_skips_alerts() {
        let api = Arc::new(FakeApi::default());
        *api.points.lock().unwrap() = vec![location("n1", 10.0)];
        let driver = driver(api.clone());
        driver.refresh(RefreshTrigger::Timer).await;
        driver.update(StateEvent::LocationSelected("n1".into())).await;

        *api.points.lock().unwrap() = vec![location("n2", 10.0)];
        driver.refresh(RefreshTrigger::Timer).await;
        driver.refresh(RefreshTrigger::Timer).await;

        let state = driver.state().lock().await;
        assert!(state.detail.as_ref().unwrap().stale);
        // tick 3 fell due, but the device was not in the snapshot
        assert_eq!(api.calls.alerts.load(Ordering::SeqCst), 0);
        // the chart is still refreshed for the selected device
        assert_eq!(api.calls.history.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_overlapping_refresh_is_skipped() {
        let api = Arc::new(FakeApi {
            delay: Some(Duration::from_millis(300)),
            ..Default::default()
        });
        let driver = Arc::new(driver(api.clone()));

        let first = {
            let driver = driver.clone();
            tokio::spawn(async move { driver.refresh(RefreshTrigger::Timer).await })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;

        let second = driver.refresh(RefreshTrigger::Timer).await;
        assert_eq!(second, RefreshOutcome::Skipped);

        let first = first.await.unwrap();
        assert_eq!(first, RefreshOutcome::Completed { tick: Some(1) });
        assert_eq!(api.calls.map.load(Ordering::SeqCst), 1);

        // the flag is released once the cycle finishes
        let third = driver.refresh(RefreshTrigger::Timer).await;
        assert_eq!(third, RefreshOutcome::Completed { tick: Some(2) });
    }

    #[tokio::test]
    async fn test_selection_during_timer_cycle_is_queued_and_not_mixed() {
        let api = Arc::new(FakeApi {
            history_delay: Some(Duration::from_millis(300)),
            ..Default::default()
        });
        *api.points.lock().unwrap() = vec![location("n1", 10.0), location("n2", 900.0)];
        let driver = Arc::new(driver(api.clone()));
        driver.update(StateEvent::SnapshotLoaded {
            locations: vec![location("n1", 10.0), location("n2", 900.0)],
            at: "10:00:00 AM".to_string(),
        })
        .await;
        driver.update(StateEvent::LocationSelected("n1".into())).await;

        let timer = {
            let driver = driver.clone();
            tokio::spawn(async move { driver.refresh(RefreshTrigger::Timer).await })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;

        // the user switches device while n1's chart is still loading
        driver.update(StateEvent::LocationSelected("n2".into())).await;
        let selection = driver.refresh(RefreshTrigger::Selection).await;
        assert_eq!(selection, RefreshOutcome::Queued);

        // the timer task works off the queued selection before returning
        let outcome = timer.await.unwrap();
        assert_eq!(outcome, RefreshOutcome::Completed { tick: None });
        assert_eq!(driver.ticks(), 1);

        assert_eq!(api.calls.map.load(Ordering::SeqCst), 2);
        assert_eq!(api.calls.latest.load(Ordering::SeqCst), 1);
        assert_eq!(api.calls.alerts.load(Ordering::SeqCst), 1);
        assert_eq!(api.calls.history.load(Ordering::SeqCst), 2);

        let state = driver.state().lock().await;
        assert_eq!(state.selected.as_deref(), Some("n2"));
        assert_eq!(state.detail.as_ref().unwrap().name, "N2");
        assert_eq!(state.chart.tvoc, vec![Some(100.0), Some(101.0), Some(102.0)]);
        assert_eq!(state.alerts.as_ref().unwrap().device_id, "n2");
        assert!(state.latest_alert.is_some());
    }

    #[tokio::test]
    async fn test_deselect_during_cycle_drops_late_chart() {
        let api = Arc::new(FakeApi {
            history_delay: Some(Duration::from_millis(200)),
            ..Default::default()
        });
        *api.points.lock().unwrap() = vec![location("n1", 10.0)];
        let driver = Arc::new(driver(api.clone()));
        driver.update(StateEvent::LocationSelected("n1".into())).await;

        let manual = {
            let driver = driver.clone();
            tokio::spawn(async move { driver.refresh(RefreshTrigger::Manual).await })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;
        driver.update(StateEvent::Deselected).await;
        manual.await.unwrap();

        let state = driver.state().lock().await;
        assert!(state.selected.is_none());
        assert!(state.chart.is_empty());
        assert!(state.alerts.is_none());
    }

    #[tokio::test]
    async fn test_user_triggers_are_coalesced() {
        let api = Arc::new(FakeApi {
            delay: Some(Duration::from_millis(200)),
            ..Default::default()
        });
        let driver = Arc::new(driver(api.clone()));

        let timer = {
            let driver = driver.clone();
            tokio::spawn(async move { driver.refresh(RefreshTrigger::Timer).await })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert_eq!(driver.refresh(RefreshTrigger::Filter).await, RefreshOutcome::Queued);
        assert_eq!(driver.refresh(RefreshTrigger::Manual).await, RefreshOutcome::Queued);
        assert_eq!(driver.refresh(RefreshTrigger::Filter).await, RefreshOutcome::Queued);

        assert_eq!(timer.await.unwrap(), RefreshOutcome::Completed { tick: None });
        // one timer cycle plus a single coalesced user cycle
        assert_eq!(api.calls.map.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_district_failure_is_logged_only() {
        let api = Arc::new(FakeApi::default());
        let driver = driver(api);
        driver.load_cities().await;
        driver.load_districts("Kayseri").await;
        let state = driver.state().lock().await;
        assert_eq!(state.cities, vec!["Kayseri".to_string()]);
        assert!(state.districts_for("Kayseri").is_empty());
    }
}
