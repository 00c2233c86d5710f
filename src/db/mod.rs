use crate::domain::{CampaignKey, CanonicalFilters};
use crate::entities::{enrichments, search_cursors, searches};
use crate::models::{MatchQuery, Person};
use anyhow::Result;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbErr, Statement};
use std::path::Path;
use std::time::Duration;
use tracing::info;

pub mod migrator;
pub mod repositories;

pub use repositories::cursor::NewCursor;
pub use repositories::enrichment::{RecordScope, person_from_record};
pub use repositories::search::NewSearch;

#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        let in_memory = db_url.contains(":memory:");

        if !in_memory {
            let path_str = db_url
                .trim_start_matches("sqlite://")
                .trim_start_matches("sqlite:");
            let path_str = path_str.split('?').next().unwrap_or(path_str);
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)?;
            }
        }

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .sqlx_logging(false);

        // Every pooled connection to `:memory:` is a separate database.
        let (max_connections, min_connections) = if in_memory {
            (1, 1)
        } else {
            opt.idle_timeout(Duration::from_secs(300))
                .max_lifetime(Duration::from_secs(600));
            (max_connections, min_connections)
        };
        opt.max_connections(max_connections)
            .min_connections(min_connections);

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    pub async fn ping(&self) -> Result<()> {
        let backend = self.conn.get_database_backend();
        self.conn
            .query_one(Statement::from_string(backend, "SELECT 1".to_string()))
            .await?;
        Ok(())
    }

    fn cursor_repo(&self) -> repositories::cursor::CursorRepository {
        repositories::cursor::CursorRepository::new(self.conn.clone())
    }

    fn enrichment_repo(&self) -> repositories::enrichment::EnrichmentRepository {
        repositories::enrichment::EnrichmentRepository::new(self.conn.clone())
    }

    fn search_repo(&self) -> repositories::search::SearchRepository {
        repositories::search::SearchRepository::new(self.conn.clone())
    }

    // Search cursors

    pub async fn find_cursor(
        &self,
        key: &CampaignKey,
    ) -> Result<Option<search_cursors::Model>, DbErr> {
        self.cursor_repo().find(key).await
    }

    pub async fn create_cursor(
        &self,
        new: NewCursor<'_>,
    ) -> Result<search_cursors::Model, DbErr> {
        self.cursor_repo().create(new).await
    }

    pub async fn reset_cursor(
        &self,
        cursor: &search_cursors::Model,
        filters: &CanonicalFilters,
    ) -> Result<Option<search_cursors::Model>, DbErr> {
        self.cursor_repo().reset(cursor, filters).await
    }

    pub async fn advance_cursor(
        &self,
        cursor: &search_cursors::Model,
        next_page: i32,
        total_entries: i64,
        exhausted: bool,
    ) -> Result<bool, DbErr> {
        self.cursor_repo()
            .advance(cursor, next_page, total_entries, exhausted)
            .await
    }

    // Enrichment records

    pub async fn insert_enrichment(
        &self,
        scope: &RecordScope<'_>,
        person: &Person,
    ) -> Result<enrichments::Model, DbErr> {
        self.enrichment_repo().insert_person(scope, person).await
    }

    pub async fn insert_enrichments(
        &self,
        scope: &RecordScope<'_>,
        people: &[Person],
    ) -> Result<Vec<enrichments::Model>, DbErr> {
        self.enrichment_repo().insert_people(scope, people).await
    }

    pub async fn attach_enrichment_run(&self, id: &str, run_id: &str) -> Result<bool, DbErr> {
        self.enrichment_repo().attach_run(id, run_id).await
    }

    pub async fn get_enrichment(&self, id: &str) -> Result<Option<enrichments::Model>, DbErr> {
        self.enrichment_repo().get(id).await
    }

    pub async fn find_fresh_enrichment_by_person(
        &self,
        person_id: &str,
        since: &str,
    ) -> Result<Option<enrichments::Model>, DbErr> {
        self.enrichment_repo()
            .find_fresh_by_person_id(person_id, since)
            .await
    }

    pub async fn find_fresh_enrichment_by_match(
        &self,
        query: &MatchQuery,
        since: &str,
    ) -> Result<Option<enrichments::Model>, DbErr> {
        self.enrichment_repo()
            .find_fresh_by_name_domain(query, since)
            .await
    }

    // Search audit

    pub async fn record_search(&self, new: NewSearch<'_>) -> Result<searches::Model, DbErr> {
        self.search_repo().record(new).await
    }
}
