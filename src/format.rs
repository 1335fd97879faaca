use chrono::{DateTime, Datelike, FixedOffset, Local, NaiveDateTime};

/// Shown wherever an optional value is absent.
pub const MISSING: &str = "-";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unit {
    Score,
    Ppb,
    Ppm,
    Celsius,
    Percent,
    Hpa,
}

/// Formats an optional reading with its unit, or [`MISSING`].
pub fn format_value(value: Option<f64>, unit: Unit) -> String {
    let Some(v) = value else {
        return MISSING.to_string();
    };
    match unit {
        Unit::Score => plain_number(v),
        Unit::Ppb => format!("{} ppb", plain_number(v)),
        Unit::Ppm => format!("{} ppm", plain_number(v)),
        Unit::Celsius => format!("{:.1}°C", v),
        Unit::Percent => format!("{:.1}%", v),
        Unit::Hpa => format!("{:.1} hPa", v),
    }
}

/// Integers print without a fractional part, everything else as-is.
pub fn plain_number(v: f64) -> String {
    if v.fract() == 0.0 && v.abs() < 1e15 {
        format!("{}", v as i64)
    } else {
        format!("{}", v)
    }
}

/// Like [`plain_number`] but with "N/A" for absent values.
pub fn or_na(value: Option<f64>) -> String {
    value.map(plain_number).unwrap_or_else(|| "N/A".to_string())
}

/// Parses the backend's timestamps: RFC 3339, or naive ISO treated as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<FixedOffset>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts);
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc().fixed_offset())
}

/// Detail-panel timestamp: absent, pre-2020 device clocks and garbage all get
/// their own wording.
pub fn format_update_time(raw: Option<&str>) -> String {
    let Some(raw) = raw.filter(|r| !r.is_empty()) else {
        return MISSING.to_string();
    };
    match parse_timestamp(raw) {
        None => "Invalid date".to_string(),
        Some(ts) if ts.year() < 2020 => "Just now".to_string(),
        Some(ts) => ts.with_timezone(&Local).format("%b %-d, %Y, %I:%M %p").to_string(),
    }
}

/// Alert-row timestamp, "N/A" when absent or unparsable.
pub fn format_alert_time(raw: Option<&str>) -> String {
    raw.and_then(parse_timestamp)
        .map(|ts| ts.with_timezone(&Local).format("%m/%d/%Y, %I:%M:%S %p").to_string())
        .unwrap_or_else(|| "N/A".to_string())
}

/// Chart axis label (`HH:MM AM`), empty when unparsable.
pub fn format_chart_label(raw: Option<&str>) -> String {
    raw.and_then(parse_timestamp)
        .map(|ts| ts.with_timezone(&Local).format("%I:%M %p").to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_values_use_sentinel() {
        for unit in [Unit::Score, Unit::Ppb, Unit::Ppm, Unit::Celsius, Unit::Percent, Unit::Hpa] {
            assert_eq!(format_value(None, unit), "-");
        }
    }

    #[test]
    fn test_units() {
        assert_eq!(format_value(Some(120.0), Unit::Ppb), "120 ppb");
        assert_eq!(format_value(Some(412.5), Unit::Ppm), "412.5 ppm");
        assert_eq!(format_value(Some(21.04), Unit::Celsius), "21.0°C");
        assert_eq!(format_value(Some(45.26), Unit::Percent), "45.3%");
        assert_eq!(format_value(Some(1013.26), Unit::Hpa), "1013.3 hPa");
        assert_eq!(format_value(Some(87.0), Unit::Score), "87");
    }

    #[test]
    fn test_or_na() {
        assert_eq!(or_na(None), "N/A");
        assert_eq!(or_na(Some(15.0)), "15");
    }

    #[test]
    fn test_parse_timestamp_variants() {
        assert!(parse_timestamp("2025-03-01T10:00:00Z").is_some());
        assert!(parse_timestamp("2025-03-01T10:00:00.123456").is_some());
        assert!(parse_timestamp("2025-03-01 10:00:00").is_some());
        assert!(parse_timestamp("yesterday").is_none());
    }

    #[test]
    fn test_update_time() {
        assert_eq!(format_update_time(None), "-");
        assert_eq!(format_update_time(Some("")), "-");
        assert_eq!(format_update_time(Some("not a date")), "Invalid date");
        assert_eq!(format_update_time(Some("1970-01-01T00:00:05Z")), "Just now");
        assert!(format_update_time(Some("2025-06-15T12:00:00Z")).contains("2025"));
    }

    #[test]
    fn test_alert_time() {
        assert_eq!(format_alert_time(None), "N/A");
        assert_eq!(format_alert_time(Some("nope")), "N/A");
        assert!(format_alert_time(Some("2025-06-15T12:00:00Z")).contains("2025"));
    }
}
