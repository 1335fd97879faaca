pub mod alert;
pub mod location;
pub mod series;

pub use alert::{Alert, AlertHistory, LatestAlert};
pub use location::Location;
pub use series::HistoryItem;

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Like `#[serde(default)]`, but an explicit `null` also yields the default.
pub(crate) fn null_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Accepts a string or an integer identifier; anything else is treated as absent.
pub(crate) fn deserialize_opt_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

/// A device id echoed back by the backend, empty when absent.
pub(crate) fn deserialize_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(deserialize_opt_id(deserializer)?.unwrap_or_default())
}

/// Active city/district filter. Empty strings mean "all".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filter {
    pub city: String,
    pub district: String,
}
