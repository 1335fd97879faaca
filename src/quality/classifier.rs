use image::Rgba;

use crate::config::ColoursConfig;

/// Air-quality severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Tier {
    NoData,
    Good,
    Moderate,
    Poor,
}

/// What a classification was derived from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Basis {
    Status,
    Reading,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    /// Highest value still classed as good.
    pub good: f64,
    /// Highest value still classed as moderate.
    pub moderate: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub tier: Tier,
    pub basis: Basis,
}

impl Tier {
    /// CSS-style class name, also used for alert rows.
    pub fn class_name(self) -> &'static str {
        match self {
            Tier::NoData => "no-data",
            Tier::Good => "good",
            Tier::Moderate => "moderate",
            Tier::Poor => "poor",
        }
    }
}

impl Classification {
    pub fn label(&self) -> &'static str {
        match (self.basis, self.tier) {
            (_, Tier::NoData) => "NO DATA",
            (Basis::Reading, Tier::Good) => "GOOD",
            (Basis::Reading, Tier::Moderate) => "MODERATE",
            (Basis::Reading, Tier::Poor) => "POOR",
            (Basis::Status, Tier::Good) => "NORMAL",
            (Basis::Status, Tier::Moderate) => "MODERATE",
            (Basis::Status, Tier::Poor) => "HIGH",
        }
    }

    pub fn colour(&self, palette: &ColoursConfig) -> Rgba<u8> {
        match self.tier {
            Tier::NoData => palette.no_data,
            Tier::Good => palette.good,
            Tier::Moderate => palette.moderate,
            Tier::Poor => palette.poor,
        }
    }

    /// Heatmap weight in `[0, 1]`.
    pub fn intensity(&self) -> f32 {
        match self.tier {
            Tier::NoData => 0.1,
            Tier::Good => 0.3,
            Tier::Moderate => 0.6,
            Tier::Poor => 1.0,
        }
    }

    /// Map circle radius in metres.
    pub fn radius_m(&self) -> f64 {
        match self.tier {
            Tier::NoData => 2000.0,
            Tier::Good => 3000.0,
            Tier::Moderate => 4000.0,
            Tier::Poor => 5000.0,
        }
    }
}

pub fn classify_reading(value: Option<f64>, thresholds: &Thresholds) -> Classification {
    let tier = match value {
        None => Tier::NoData,
        Some(v) if v <= thresholds.good => Tier::Good,
        Some(v) if v <= thresholds.moderate => Tier::Moderate,
        Some(_) => Tier::Poor,
    };
    Classification {
        tier,
        basis: Basis::Reading,
    }
}

pub fn classify_status(status: Option<&str>) -> Classification {
    let tier = match status.map(|s| s.trim().to_uppercase()).as_deref() {
        Some("HIGH") => Tier::Poor,
        Some("NORMAL") | Some("OK") => Tier::Good,
        Some("WARN") => Tier::Moderate,
        _ => Tier::NoData,
    };
    Classification {
        tier,
        basis: Basis::Status,
    }
}

/// A backend status, when present, wins over the numeric reading.
pub fn classify(status: Option<&str>, reading: Option<f64>, thresholds: &Thresholds) -> Classification {
    match status {
        Some(status) if !status.is_empty() => classify_status(Some(status)),
        _ => classify_reading(reading, thresholds),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const THRESHOLDS: Thresholds = Thresholds {
        good: 220.0,
        moderate: 660.0,
    };

    #[test]
    fn test_missing_reading_is_no_data() {
        let c = classify_reading(None, &THRESHOLDS);
        assert_eq!(c.tier, Tier::NoData);
        assert_eq!(c.label(), "NO DATA");
        assert_eq!(c.intensity(), 0.1);
        assert_eq!(c.radius_m(), 2000.0);
    }

    #[test]
    fn test_threshold_boundaries_are_inclusive() {
        assert_eq!(classify_reading(Some(0.0), &THRESHOLDS).tier, Tier::Good);
        assert_eq!(classify_reading(Some(220.0), &THRESHOLDS).tier, Tier::Good);
        assert_eq!(classify_reading(Some(220.5), &THRESHOLDS).tier, Tier::Moderate);
        assert_eq!(classify_reading(Some(660.0), &THRESHOLDS).tier, Tier::Moderate);
        assert_eq!(classify_reading(Some(661.0), &THRESHOLDS).tier, Tier::Poor);
    }

    #[test]
    fn test_severity_is_monotonic() {
        let mut previous = Tier::Good;
        for step in 0..200 {
            let tier = classify_reading(Some(step as f64 * 7.5), &THRESHOLDS).tier;
            assert!(tier >= previous, "tier dropped at {}", step);
            assert_ne!(tier, Tier::NoData);
            previous = tier;
        }
        assert_eq!(previous, Tier::Poor);
    }

    #[test]
    fn test_status_mapping_is_case_insensitive() {
        assert_eq!(classify_status(Some("HIGH")).tier, Tier::Poor);
        assert_eq!(classify_status(Some("normal")).tier, Tier::Good);
        assert_eq!(classify_status(Some("Ok")).tier, Tier::Good);
        assert_eq!(classify_status(Some("warn")).tier, Tier::Moderate);
        assert_eq!(classify_status(Some("critical")).tier, Tier::NoData);
        assert_eq!(classify_status(None).tier, Tier::NoData);
    }

    #[test]
    fn test_status_labels() {
        assert_eq!(classify_status(Some("HIGH")).label(), "HIGH");
        assert_eq!(classify_status(Some("OK")).label(), "NORMAL");
        assert_eq!(classify_status(Some("WARN")).label(), "MODERATE");
        assert_eq!(classify_reading(Some(1000.0), &THRESHOLDS).label(), "POOR");
    }

    #[test]
    fn test_status_takes_precedence() {
        let c = classify(Some("NORMAL"), Some(5000.0), &THRESHOLDS);
        assert_eq!(c.tier, Tier::Good);
        assert_eq!(c.basis, Basis::Status);

        let c = classify(None, Some(5000.0), &THRESHOLDS);
        assert_eq!(c.tier, Tier::Poor);
        assert_eq!(c.basis, Basis::Reading);
    }

    #[test]
    fn test_derived_values_follow_tier() {
        let palette = ColoursConfig::default();
        let poor = classify(Some("HIGH"), None, &THRESHOLDS);
        assert_eq!(poor.colour(&palette), palette.poor);
        assert_eq!(poor.intensity(), 1.0);
        assert_eq!(poor.radius_m(), 5000.0);

        let moderate = classify(None, Some(300.0), &THRESHOLDS);
        assert_eq!(moderate.colour(&palette), palette.moderate);
        assert_eq!(moderate.intensity(), 0.6);
        assert_eq!(moderate.radius_m(), 4000.0);
    }

    #[test]
    fn test_classification_is_deterministic() {
        let a = classify(None, Some(400.0), &THRESHOLDS);
        let b = classify(None, Some(400.0), &THRESHOLDS);
        assert_eq!(a, b);
        assert_eq!(a.intensity(), b.intensity());
    }
}
