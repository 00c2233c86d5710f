use axum::{extract::FromRequestParts, http::request::Parts};

use super::ApiError;

pub const ORGANIZATION_HEADER: &str = "x-organization-id";

/// Organization the request acts for.
///
/// Authentication happens upstream of this service; the gateway forwards the
/// resolved organization in a header.
#[derive(Debug, Clone)]
pub struct OrganizationId(pub String);

impl<S> FromRequestParts<S> for OrganizationId
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let value = parts
            .headers
            .get(ORGANIZATION_HEADER)
            .and_then(|h| h.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| {
                ApiError::Unauthorized(format!("Missing {ORGANIZATION_HEADER} header"))
            })?;

        tracing::Span::current().record("organization_id", value);
        Ok(Self(value.to_string()))
    }
}
