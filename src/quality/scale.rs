pub const DEFAULT_PADDING_RATIO: f64 = 0.15;

/// Suggested bounds for a chart axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisScale {
    pub min: f64,
    pub max: f64,
}

impl Default for AxisScale {
    fn default() -> Self {
        Self { min: 0.0, max: 1.0 }
    }
}

impl AxisScale {
    pub fn span(&self) -> f64 {
        self.max - self.min
    }
}

pub fn calculate_scale(values: &[Option<f64>], padding_ratio: f64) -> AxisScale {
    let mut present = values.iter().flatten().copied().filter(|v| v.is_finite());

    let Some(first) = present.next() else {
        return AxisScale::default();
    };

    let (min, max) = present.fold((first, first), |(lo, hi), v| (lo.min(v), hi.max(v)));

    if min == max {
        return AxisScale {
            min: min - 1.0,
            max: max + 1.0,
        };
    }

    let padding = (max - min) * padding_ratio;
    AxisScale {
        min: min - padding,
        max: max + padding,
    }
}
