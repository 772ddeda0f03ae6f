//! Migration: Create generated_sites table.
//!
//! Stores saved AI-generated websites (code, optional screenshot, canvas state).

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(GeneratedSites::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(GeneratedSites::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(GeneratedSites::Name)
                            .string_len(200)
                            .not_null()
                            .default("Untitled Site"),
                    )
                    .col(ColumnDef::new(GeneratedSites::SiteType).string_len(100).not_null())
                    .col(ColumnDef::new(GeneratedSites::Html).text().not_null())
                    .col(ColumnDef::new(GeneratedSites::Css).text().not_null().default(""))
                    .col(ColumnDef::new(GeneratedSites::Js).text().not_null().default(""))
                    .col(ColumnDef::new(GeneratedSites::Screenshot).text())
                    .col(ColumnDef::new(GeneratedSites::CanvasState).json())
                    .col(
                        ColumnDef::new(GeneratedSites::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(GeneratedSites::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // Gallery listing is always newest-updated first
        manager
            .create_index(
                Index::create()
                    .name("idx_generated_sites_updated_at")
                    .table(GeneratedSites::Table)
                    .col(GeneratedSites::UpdatedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(
                Table::drop()
                    .table(GeneratedSites::Table)
                    .if_exists()
                    .to_owned(),
            )
            .await
    }
}

#[derive(DeriveIden)]
enum GeneratedSites {
    Table,
    Id,
    Name,
    SiteType,
    Html,
    Css,
    Js,
    Screenshot,
    CanvasState,
    CreatedAt,
    UpdatedAt,
}
