use crate::domain::{normalize_domain, now_timestamp};
use crate::entities::{enrichments, prelude::*};
use crate::models::{MatchQuery, Person};
use sea_orm::sea_query::{Expr, Func};
use sea_orm::{
    ColumnTrait, DatabaseConnection, DbErr, EntityTrait, IntoActiveModel, QueryFilter, QueryOrder,
};

/// Who a persisted record belongs to.
#[derive(Debug, Clone, Copy)]
pub struct RecordScope<'a> {
    pub organization_id: &'a str,
    pub campaign_id: Option<&'a str>,
    pub app_id: &'a str,
    pub brand_id: &'a str,
    pub search_id: Option<&'a str>,
}

pub struct EnrichmentRepository {
    conn: DatabaseConnection,
}

impl EnrichmentRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn insert_person(
        &self,
        scope: &RecordScope<'_>,
        person: &Person,
    ) -> Result<enrichments::Model, DbErr> {
        let model = build_record(scope, person, now_timestamp());
        Enrichments::insert(model.clone().into_active_model())
            .exec(&self.conn)
            .await?;
        Ok(model)
    }

    pub async fn insert_people(
        &self,
        scope: &RecordScope<'_>,
        people: &[Person],
    ) -> Result<Vec<enrichments::Model>, DbErr> {
        if people.is_empty() {
            return Ok(vec![]);
        }

        let created_at = now_timestamp();
        let models: Vec<enrichments::Model> = people
            .iter()
            .map(|p| build_record(scope, p, created_at.clone()))
            .collect();

        Enrichments::insert_many(models.iter().cloned().map(IntoActiveModel::into_active_model))
            .exec(&self.conn)
            .await?;

        Ok(models)
    }

    /// Links a billing run to a record. A record is only ever linked once.
    pub async fn attach_run(&self, id: &str, run_id: &str) -> Result<bool, DbErr> {
        let result = Enrichments::update_many()
            .col_expr(enrichments::Column::EnrichmentRunId, Expr::value(run_id))
            .filter(enrichments::Column::Id.eq(id))
            .filter(enrichments::Column::EnrichmentRunId.is_null())
            .exec(&self.conn)
            .await?;

        Ok(result.rows_affected > 0)
    }

    pub async fn get(&self, id: &str) -> Result<Option<enrichments::Model>, DbErr> {
        Enrichments::find_by_id(id.to_string()).one(&self.conn).await
    }

    /// Newest record for a provider person id that has an email and was
    /// created after `since`.
    pub async fn find_fresh_by_person_id(
        &self,
        person_id: &str,
        since: &str,
    ) -> Result<Option<enrichments::Model>, DbErr> {
        Enrichments::find()
            .filter(enrichments::Column::ExternalPersonId.eq(person_id))
            .filter(enrichments::Column::Email.is_not_null())
            .filter(enrichments::Column::CreatedAt.gt(since))
            .order_by_desc(enrichments::Column::CreatedAt)
            .one(&self.conn)
            .await
    }

    /// Same as [`Self::find_fresh_by_person_id`], keyed case-insensitively by
    /// first name, last name and organization domain.
    pub async fn find_fresh_by_name_domain(
        &self,
        query: &MatchQuery,
        since: &str,
    ) -> Result<Option<enrichments::Model>, DbErr> {
        let domain = normalize_domain(&query.organization_domain)
            .unwrap_or_else(|| query.organization_domain.trim().to_lowercase());

        Enrichments::find()
            .filter(
                Expr::expr(Func::lower(Expr::col(enrichments::Column::FirstName)))
                    .eq(query.first_name.trim().to_lowercase()),
            )
            .filter(
                Expr::expr(Func::lower(Expr::col(enrichments::Column::LastName)))
                    .eq(query.last_name.trim().to_lowercase()),
            )
            .filter(
                Expr::expr(Func::lower(Expr::col(
                    enrichments::Column::OrganizationDomain,
                )))
                .eq(domain),
            )
            .filter(enrichments::Column::Email.is_not_null())
            .filter(enrichments::Column::CreatedAt.gt(since))
            .order_by_desc(enrichments::Column::CreatedAt)
            .one(&self.conn)
            .await
    }
}

/// Reads the provider payload back out of a stored record.
pub fn person_from_record(record: &enrichments::Model) -> serde_json::Result<Person> {
    serde_json::from_str(&record.response_raw)
}

fn build_record(
    scope: &RecordScope<'_>,
    person: &Person,
    created_at: String,
) -> enrichments::Model {
    let org = person.organization.clone().unwrap_or_default();
    let technologies = if org.technology_names.is_empty() {
        None
    } else {
        serde_json::to_string(&org.technology_names).ok()
    };
    let domain = org
        .primary_domain
        .as_deref()
        .and_then(normalize_domain)
        .or_else(|| org.website_url.as_deref().and_then(normalize_domain));

    enrichments::Model {
        id: uuid::Uuid::new_v4().to_string(),
        organization_id: scope.organization_id.to_string(),
        campaign_id: scope.campaign_id.map(str::to_string),
        search_id: scope.search_id.map(str::to_string),
        app_id: scope.app_id.to_string(),
        brand_id: scope.brand_id.to_string(),
        external_person_id: person.id.clone(),
        first_name: person.first_name.clone(),
        last_name: person.last_name.clone(),
        full_name: person.display_name(),
        email: person.email.clone().filter(|e| !e.trim().is_empty()),
        email_status: person.email_status.clone(),
        title: person.title.clone(),
        headline: person.headline.clone(),
        seniority: person.seniority.clone(),
        linkedin_url: person.linkedin_url.clone(),
        twitter_url: person.twitter_url.clone(),
        github_url: person.github_url.clone(),
        facebook_url: person.facebook_url.clone(),
        city: person.city.clone(),
        state: person.state.clone(),
        country: person.country.clone(),
        organization_name: org.name,
        organization_domain: domain,
        organization_website_url: org.website_url,
        organization_industry: org.industry,
        organization_size: org.estimated_num_employees,
        organization_revenue: org.annual_revenue,
        organization_revenue_printed: org.annual_revenue_printed,
        organization_total_funding: org.total_funding,
        organization_latest_funding_stage: org.latest_funding_stage,
        organization_founded_year: org.founded_year,
        organization_linkedin_url: org.linkedin_url,
        organization_twitter_url: org.twitter_url,
        organization_facebook_url: org.facebook_url,
        organization_city: org.city,
        organization_state: org.state,
        organization_country: org.country,
        organization_technologies: technologies,
        response_raw: person.raw_snapshot().to_string(),
        enrichment_run_id: None,
        created_at,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Organization;

    fn scope() -> RecordScope<'static> {
        RecordScope {
            organization_id: "org_1",
            campaign_id: Some("camp_1"),
            app_id: "app",
            brand_id: "brand",
            search_id: None,
        }
    }

    #[test]
    fn test_build_record_flattens_organization() {
        let person = Person {
            id: Some("p1".to_string()),
            first_name: Some("Ada".to_string()),
            last_name: Some("Lovelace".to_string()),
            email: Some("ada@acme.io".to_string()),
            organization: Some(Organization {
                name: Some("Acme".to_string()),
                primary_domain: Some("acme.io".to_string()),
                estimated_num_employees: Some(120),
                technology_names: vec!["Rust".to_string(), "Postgres".to_string()],
                ..Organization::default()
            }),
            ..Person::default()
        };

        let record = build_record(&scope(), &person, "2026-01-01T00:00:00.000000Z".to_string());

        assert_eq!(record.external_person_id.as_deref(), Some("p1"));
        assert_eq!(record.full_name.as_deref(), Some("Ada Lovelace"));
        assert_eq!(record.organization_domain.as_deref(), Some("acme.io"));
        assert_eq!(record.organization_size, Some(120));
        assert_eq!(
            record.organization_technologies.as_deref(),
            Some(r#"["Rust","Postgres"]"#)
        );
        assert!(record.enrichment_run_id.is_none());

        let stored = person_from_record(&record).unwrap();
        assert_eq!(stored.email.as_deref(), Some("ada@acme.io"));
    }

    #[test]
    fn test_build_record_without_organization() {
        let person = Person {
            id: Some("p2".to_string()),
            ..Person::default()
        };

        let record = build_record(&scope(), &person, "2026-01-01T00:00:00.000000Z".to_string());
        let raw: serde_json::Value = serde_json::from_str(&record.response_raw).unwrap();

        assert!(record.organization_name.is_none());
        assert_eq!(raw["organization"], serde_json::json!({}));
    }

    #[test]
    fn test_blank_email_is_stored_as_null() {
        let person = Person {
            email: Some(String::new()),
            ..Person::default()
        };
        let record = build_record(&scope(), &person, "2026-01-01T00:00:00.000000Z".to_string());
        assert!(record.email.is_none());
    }

    #[test]
    fn test_stored_domain_is_normalized() {
        let from_primary = Person {
            organization: Some(Organization {
                primary_domain: Some("www.Acme.io".to_string()),
                ..Organization::default()
            }),
            ..Person::default()
        };
        let from_website = Person {
            organization: Some(Organization {
                website_url: Some("https://www.acme.io/about".to_string()),
                ..Organization::default()
            }),
            ..Person::default()
        };

        let at = "2026-01-01T00:00:00.000000Z";
        let a = build_record(&scope(), &from_primary, at.to_string());
        let b = build_record(&scope(), &from_website, at.to_string());

        assert_eq!(a.organization_domain.as_deref(), Some("acme.io"));
        assert_eq!(b.organization_domain, a.organization_domain);
    }
}
