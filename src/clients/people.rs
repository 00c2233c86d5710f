use crate::models::lenient::{lenient_count, null_as_default};
use crate::models::{MatchQuery, Person, SearchParams};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

const API_KEY_HEADER: &str = "X-Api-Key";

#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("people API returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error("people API request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("people API returned an unexpected payload: {0}")]
    UnexpectedPayload(String),
}

/// One page of search results.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SearchPage {
    #[serde(default, deserialize_with = "null_as_default")]
    pub people: Vec<Person>,
    #[serde(default, deserialize_with = "lenient_count")]
    pub total_entries: u64,
}

#[derive(Debug, Deserialize)]
struct PersonEnvelope {
    #[serde(default)]
    person: Option<Person>,
}

#[derive(Debug, Deserialize)]
struct BulkMatchEnvelope {
    #[serde(default, deserialize_with = "null_as_default")]
    matches: Vec<Option<Person>>,
}

#[derive(Serialize)]
struct SearchBody<'a> {
    #[serde(flatten)]
    params: &'a SearchParams,
    page: u32,
    per_page: u32,
}

#[derive(Serialize)]
struct EnrichBody<'a> {
    id: &'a str,
}

#[derive(Serialize)]
struct BulkMatchBody<'a> {
    details: &'a [MatchQuery],
}

/// The third-party people-data API.
///
/// Every method is exactly one HTTP call; nothing here retries.
#[async_trait]
pub trait PeopleApi: Send + Sync {
    async fn search(
        &self,
        api_key: &str,
        params: &SearchParams,
        page: u32,
        per_page: u32,
    ) -> Result<SearchPage, UpstreamError>;

    async fn enrich(&self, api_key: &str, person_id: &str)
    -> Result<Option<Person>, UpstreamError>;

    async fn match_person(
        &self,
        api_key: &str,
        query: &MatchQuery,
    ) -> Result<Option<Person>, UpstreamError>;

    /// Results are positional: `result[i]` answers `queries[i]`.
    async fn bulk_match(
        &self,
        api_key: &str,
        queries: &[MatchQuery],
    ) -> Result<Vec<Option<Person>>, UpstreamError>;
}

#[derive(Clone)]
pub struct PeopleClient {
    client: Client,
    base_url: String,
}

impl PeopleClient {
    #[must_use]
    pub fn with_shared_client(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    async fn post<B, T>(&self, path: &str, api_key: &str, body: &B) -> Result<T, UpstreamError>
    where
        B: Serialize + Sync + ?Sized,
        T: serde::de::DeserializeOwned,
    {
        let url = format!("{}{path}", self.base_url);
        let response = self
            .client
            .post(&url)
            .header(API_KEY_HEADER, api_key)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(UpstreamError::Status {
                status: status.as_u16(),
                message: summarize_body(status, &message),
            });
        }

        Ok(response.json().await?)
    }
}

#[async_trait]
impl PeopleApi for PeopleClient {
    async fn search(
        &self,
        api_key: &str,
        params: &SearchParams,
        page: u32,
        per_page: u32,
    ) -> Result<SearchPage, UpstreamError> {
        debug!(page, per_page, "Searching people");
        let body = SearchBody {
            params,
            page,
            per_page,
        };
        self.post("/v1/mixed_people/search", api_key, &body).await
    }

    async fn enrich(
        &self,
        api_key: &str,
        person_id: &str,
    ) -> Result<Option<Person>, UpstreamError> {
        debug!(person_id, "Enriching person");
        let envelope: PersonEnvelope = self
            .post("/v1/people/match", api_key, &EnrichBody { id: person_id })
            .await?;
        Ok(envelope.person)
    }

    async fn match_person(
        &self,
        api_key: &str,
        query: &MatchQuery,
    ) -> Result<Option<Person>, UpstreamError> {
        debug!(domain = %query.organization_domain, "Matching person");
        let envelope: PersonEnvelope = self.post("/v1/people/match", api_key, query).await?;
        Ok(envelope.person)
    }

    async fn bulk_match(
        &self,
        api_key: &str,
        queries: &[MatchQuery],
    ) -> Result<Vec<Option<Person>>, UpstreamError> {
        debug!(count = queries.len(), "Bulk matching people");
        let envelope: BulkMatchEnvelope = self
            .post(
                "/v1/people/bulk_match",
                api_key,
                &BulkMatchBody { details: queries },
            )
            .await?;

        if envelope.matches.len() != queries.len() {
            return Err(UpstreamError::UnexpectedPayload(format!(
                "bulk match returned {} results for {} queries",
                envelope.matches.len(),
                queries.len()
            )));
        }

        Ok(envelope.matches)
    }
}

/// Trims an upstream error body to something worth logging and returning.
fn summarize_body(status: StatusCode, body: &str) -> String {
    const MAX_LEN: usize = 500;

    let text = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            v.get("error")
                .or_else(|| v.get("message"))
                .and_then(|m| m.as_str().map(str::to_string))
        })
        .unwrap_or_else(|| body.trim().to_string());

    if text.is_empty() {
        return status
            .canonical_reason()
            .unwrap_or("unknown error")
            .to_string();
    }

    if text.len() > MAX_LEN {
        let mut cut = MAX_LEN;
        while !text.is_char_boundary(cut) {
            cut -= 1;
        }
        format!("{}...", &text[..cut])
    } else {
        text
    }
}
