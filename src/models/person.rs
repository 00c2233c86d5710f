use super::lenient::{lenient_int, null_as_default};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A person record as returned by the people-data API.
///
/// Only the fields this service reads are typed; everything else the
/// provider sends is kept in `extra` so the raw snapshot stays complete.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Person {
    pub id: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub name: Option<String>,
    pub email: Option<String>,
    pub email_status: Option<String>,
    pub title: Option<String>,
    pub headline: Option<String>,
    pub seniority: Option<String>,
    pub linkedin_url: Option<String>,
    pub twitter_url: Option<String>,
    pub github_url: Option<String>,
    pub facebook_url: Option<String>,
    pub photo_url: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
    pub organization: Option<Organization>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Organization {
    pub id: Option<String>,
    pub name: Option<String>,
    pub website_url: Option<String>,
    pub primary_domain: Option<String>,
    pub industry: Option<String>,
    #[serde(deserialize_with = "lenient_int")]
    pub estimated_num_employees: Option<i64>,
    pub annual_revenue: Option<f64>,
    pub annual_revenue_printed: Option<String>,
    pub total_funding: Option<f64>,
    pub latest_funding_stage: Option<String>,
    #[serde(deserialize_with = "lenient_int")]
    pub founded_year: Option<i32>,
    pub linkedin_url: Option<String>,
    pub twitter_url: Option<String>,
    pub facebook_url: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub technology_names: Vec<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Person {
    /// Only people with a deliverable email address are billable.
    #[must_use]
    pub fn has_email(&self) -> bool {
        self.email.as_deref().is_some_and(|e| !e.trim().is_empty())
    }

    #[must_use]
    pub fn display_name(&self) -> Option<String> {
        if let Some(name) = self.name.as_deref().filter(|n| !n.is_empty()) {
            return Some(name.to_string());
        }
        match (self.first_name.as_deref(), self.last_name.as_deref()) {
            (Some(first), Some(last)) => Some(format!("{first} {last}")),
            (Some(only), None) | (None, Some(only)) => Some(only.to_string()),
            (None, None) => None,
        }
    }

    /// Serialized snapshot for `response_raw` columns.
    ///
    /// `organization` is always present as an object (empty when the provider
    /// sent none) so consumers can read organization sub-fields without checking.
    #[must_use]
    pub fn raw_snapshot(&self) -> Value {
        let mut value = serde_json::to_value(self).unwrap_or_else(|_| Value::Object(Map::new()));
        normalize_organization(&mut value);
        value
    }
}

/// Ensures `value.organization` is an object.
pub fn normalize_organization(value: &mut Value) {
    if let Value::Object(map) = value {
        let needs_default = !matches!(map.get("organization"), Some(Value::Object(_)));
        if needs_default {
            map.insert("organization".to_string(), Value::Object(Map::new()));
        }
    }
}

/// Name + company-domain lookup key used by single and bulk match.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MatchQuery {
    pub first_name: String,
    pub last_name: String,
    pub organization_domain: String,
}

impl MatchQuery {
    #[must_use]
    pub fn new(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        organization_domain: impl Into<String>,
    ) -> Self {
        Self {
            first_name: first_name.into(),
            last_name: last_name.into(),
            organization_domain: organization_domain.into(),
        }
    }
}
