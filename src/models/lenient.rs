//! Field deserializers for provider payloads.
//!
//! The people-data API is loose about types: arrays arrive as `null`, counts
//! arrive as `120.0` or `"120"`. A payload that fails to decode after a paid
//! call has already run cannot be billed or paged past, so these fields
//! degrade to their default instead of failing the whole response.

use serde::de::IgnoredAny;
use serde::{Deserialize, Deserializer};

/// Treats an explicit `null` the same as a missing key.
pub fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Numeric {
    Int(i64),
    Float(f64),
    Text(String),
    Other(IgnoredAny),
}

impl Numeric {
    fn to_i64(&self) -> Option<i64> {
        match self {
            Self::Int(n) => Some(*n),
            Self::Float(f) => float_to_i64(*f),
            Self::Text(s) => {
                let s = s.trim();
                s.parse::<i64>()
                    .ok()
                    .or_else(|| s.parse::<f64>().ok().and_then(float_to_i64))
            }
            Self::Other(_) => None,
        }
    }
}

#[allow(clippy::cast_possible_truncation)]
fn float_to_i64(value: f64) -> Option<i64> {
    // Beyond 2^53 the float no longer identifies a single integer.
    const EXACT_LIMIT: f64 = 9_007_199_254_740_992.0;
    (value.is_finite() && value.abs() <= EXACT_LIMIT).then(|| value.round() as i64)
}

/// Integer that may be sent as a float, a numeric string or `null`.
///
/// Anything that does not fit `T` becomes `None`.
pub fn lenient_int<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: TryFrom<i64>,
{
    let value = Option::<Numeric>::deserialize(deserializer)?;
    Ok(value
        .as_ref()
        .and_then(Numeric::to_i64)
        .and_then(|n| T::try_from(n).ok()))
}

/// Non-negative count, zero when absent or unreadable.
pub fn lenient_count<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(lenient_int::<D, u64>(deserializer)?.unwrap_or(0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, Deserialize)]
    struct Sample {
        #[serde(default, deserialize_with = "null_as_default")]
        tags: Vec<String>,
        #[serde(default, deserialize_with = "lenient_int")]
        size: Option<i32>,
        #[serde(default, deserialize_with = "lenient_count")]
        total: u64,
    }

    fn decode(value: serde_json::Value) -> Sample {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn null_array_is_empty() {
        let sample = decode(json!({"tags": null}));
        assert!(sample.tags.is_empty());
    }

    #[test]
    fn integers_accept_floats_and_strings() {
        assert_eq!(decode(json!({"size": 120.0})).size, Some(120));
        assert_eq!(decode(json!({"size": " 51 "})).size, Some(51));
        assert_eq!(decode(json!({"size": "12.0"})).size, Some(12));
        assert_eq!(decode(json!({"size": 7})).size, Some(7));
    }

    #[test]
    fn unreadable_integers_become_none() {
        assert_eq!(decode(json!({"size": null})).size, None);
        assert_eq!(decode(json!({"size": "many"})).size, None);
        assert_eq!(decode(json!({"size": true})).size, None);
        assert_eq!(decode(json!({"size": 1e12})).size, None);
    }

    #[test]
    fn counts_default_to_zero() {
        assert_eq!(decode(json!({"total": 75.0})).total, 75);
        assert_eq!(decode(json!({"total": null})).total, 0);
        assert_eq!(decode(json!({"total": -3})).total, 0);
        assert_eq!(decode(json!({})).total, 0);
    }
}
