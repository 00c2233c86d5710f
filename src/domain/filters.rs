//! Canonical form of search filter parameters.
//!
//! Cursor resumption compares the incoming filters against the stored ones
//! structurally. Both sides are reduced to JSON text with recursively sorted
//! object keys, so equality of the text is deep equality of the values and
//! key order in the request body never causes a spurious reset.

use crate::models::SearchParams;
use serde_json::Value;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalFilters(String);

impl CanonicalFilters {
    pub fn from_params(params: &SearchParams) -> serde_json::Result<Self> {
        let value = serde_json::to_value(params)?;
        Ok(Self::from_value(&value))
    }

    #[must_use]
    pub fn from_value(value: &Value) -> Self {
        Self(canonical_json(value))
    }

    /// Wraps text previously produced by this type (as read back from the database).
    #[must_use]
    pub const fn from_stored(text: String) -> Self {
        Self(text)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }

    pub fn to_params(&self) -> serde_json::Result<SearchParams> {
        serde_json::from_str(&self.0)
    }
}

impl fmt::Display for CanonicalFilters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[must_use]
pub fn canonical_json(value: &Value) -> String {
    let mut out = String::new();
    write_canonical(value, &mut out);
    out
}

fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();

            out.push('{');
            for (i, key) in keys.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&Value::String(key.clone()).to_string());
                out.push(':');
                write_canonical(&map[key], out);
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        scalar => out.push_str(&scalar.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn key_order_does_not_matter() {
        let a = json!({"b": 1, "a": {"y": [1, 2], "x": "v"}});
        let b = json!({"a": {"x": "v", "y": [1, 2]}, "b": 1});

        assert_eq!(
            CanonicalFilters::from_value(&a),
            CanonicalFilters::from_value(&b)
        );
        assert_eq!(canonical_json(&a), r#"{"a":{"x":"v","y":[1,2]},"b":1}"#);
    }

    #[test]
    fn array_order_matters() {
        let a = json!({"titles": ["cto", "ceo"]});
        let b = json!({"titles": ["ceo", "cto"]});

        assert_ne!(
            CanonicalFilters::from_value(&a),
            CanonicalFilters::from_value(&b)
        );
    }

    #[test]
    fn added_field_changes_fingerprint() {
        let base = SearchParams {
            person_titles: Some(vec!["Head of Sales".to_string()]),
            ..SearchParams::default()
        };
        let widened = SearchParams {
            q_keywords: Some("saas".to_string()),
            ..base.clone()
        };

        let a = CanonicalFilters::from_params(&base).unwrap();
        let b = CanonicalFilters::from_params(&widened).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn stored_text_round_trips_to_params() {
        let params = SearchParams {
            person_titles: Some(vec!["VP Engineering".to_string()]),
            organization_num_employees_ranges: Some(vec!["51,200".to_string()]),
            ..SearchParams::default()
        };

        let canonical = CanonicalFilters::from_params(&params).unwrap();
        let stored = CanonicalFilters::from_stored(canonical.clone().into_inner());

        assert_eq!(stored.to_params().unwrap(), params);
    }

    #[test]
    fn strings_are_escaped() {
        let v = json!({"q": "quote \" and \\ slash"});
        assert_eq!(canonical_json(&v), r#"{"q":"quote \" and \\ slash"}"#);
    }
}
