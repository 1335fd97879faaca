use crate::format;
use crate::models::HistoryItem;
use crate::quality::{calculate_scale, AxisScale, DEFAULT_PADDING_RATIO};

/// Chart data for one device. All channels are index-aligned with `labels`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChartSeries {
    pub labels: Vec<String>,
    pub tvoc: Vec<Option<f64>>,
    pub eco2: Vec<Option<f64>>,
    pub temperature: Vec<Option<f64>>,
    pub humidity: Vec<Option<f64>>,
    /// Left axis, shared by TVOC and eCO₂.
    pub air_scale: AxisScale,
    /// Right axis, shared by temperature and humidity.
    pub env_scale: AxisScale,
}

impl ChartSeries {
    pub fn from_items(items: &[HistoryItem]) -> Self {
        if items.is_empty() {
            return Self::default();
        }

        let labels = items
            .iter()
            .map(|x| format::format_chart_label(x.ts.as_deref()))
            .collect();
        let tvoc: Vec<_> = items.iter().map(|x| x.tvoc_ppb).collect();
        let eco2: Vec<_> = items.iter().map(|x| x.eco2_ppm).collect();
        let temperature: Vec<_> = items.iter().map(|x| x.temp_c).collect();
        let humidity: Vec<_> = items.iter().map(|x| x.hum_rh).collect();

        let air: Vec<_> = tvoc.iter().chain(eco2.iter()).copied().collect();
        let env: Vec<_> = temperature.iter().chain(humidity.iter()).copied().collect();

        Self {
            labels,
            air_scale: calculate_scale(&air, DEFAULT_PADDING_RATIO),
            env_scale: calculate_scale(&env, DEFAULT_PADDING_RATIO),
            tvoc,
            eco2,
            temperature,
            humidity,
        }
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}
