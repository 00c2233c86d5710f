use serde::{Deserialize, Serialize};

/// Filter set forwarded to the people search endpoint.
///
/// Unset fields are omitted on the wire and in the stored cursor, so adding
/// or removing a filter always changes the canonical form. Paging fields are
/// owned by the cursor and rejected here.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct SearchParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub person_titles: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub person_locations: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub person_seniorities: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_email_status: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organization_locations: Option<Vec<String>>,

    /// Employee-count ranges, e.g. `"11,50"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organization_num_employees_ranges: Option<Vec<String>>,

    /// Industry tags.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub q_organization_keyword_tags: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub q_keywords: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub q_organization_domains_list: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currently_using_any_of_technology_uids: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revenue_range: Option<RevenueRange>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organization_ids: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct RevenueRange {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<i64>,
}

impl SearchParams {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_unset_fields_are_omitted() {
        let params = SearchParams {
            person_titles: Some(vec!["CTO".to_string()]),
            ..SearchParams::default()
        };

        let value = serde_json::to_value(&params).unwrap();
        assert_eq!(value, json!({"person_titles": ["CTO"]}));
    }

    #[test]
    fn test_paging_fields_are_rejected() {
        let result: Result<SearchParams, _> =
            serde_json::from_value(json!({"person_titles": ["CTO"], "page": 4}));
        assert!(result.is_err());
    }

    #[test]
    fn test_is_empty() {
        assert!(SearchParams::default().is_empty());

        let params = SearchParams {
            revenue_range: Some(RevenueRange {
                min: Some(1_000_000),
                max: None,
            }),
            ..SearchParams::default()
        };
        assert!(!params.is_empty());
    }
}
