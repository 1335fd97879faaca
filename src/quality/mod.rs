pub mod classifier;
pub mod scale;

pub use classifier::{classify, Classification, Thresholds, Tier};
pub use scale::{calculate_scale, AxisScale, DEFAULT_PADDING_RATIO};
