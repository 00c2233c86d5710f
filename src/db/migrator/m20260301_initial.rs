use crate::entities::prelude::*;
use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::Schema;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let backend = manager.get_database_backend();
        let schema = Schema::new(backend);

        manager
            .create_table(
                schema
                    .create_table_from_entity(SearchCursors)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(Enrichments)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(Searches)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_search_cursors_org_campaign")
                    .table(SearchCursorsIden::Table)
                    .col(SearchCursorsIden::OrganizationId)
                    .col(SearchCursorsIden::CampaignId)
                    .unique()
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_enrichments_external_person_id")
                    .table(EnrichmentsIden::Table)
                    .col(EnrichmentsIden::ExternalPersonId)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_enrichments_created_at")
                    .table(EnrichmentsIden::Table)
                    .col(EnrichmentsIden::CreatedAt)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_searches_org_campaign")
                    .table(SearchesIden::Table)
                    .col(SearchesIden::OrganizationId)
                    .col(SearchesIden::CampaignId)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Searches).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Enrichments).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(SearchCursors).to_owned())
            .await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum SearchCursorsIden {
    #[sea_orm(iden = "search_cursors")]
    Table,
    OrganizationId,
    CampaignId,
}

#[derive(DeriveIden)]
enum EnrichmentsIden {
    #[sea_orm(iden = "enrichments")]
    Table,
    ExternalPersonId,
    CreatedAt,
}

#[derive(DeriveIden)]
enum SearchesIden {
    #[sea_orm(iden = "searches")]
    Table,
    OrganizationId,
    CampaignId,
}
