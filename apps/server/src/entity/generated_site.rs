//! GeneratedSite entity for SeaORM.
//!
//! One row per explicit save of a generated website. Rows are never updated in place.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "generated_sites")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    pub site_type: String,
    #[sea_orm(column_type = "Text")]
    pub html: String,
    #[sea_orm(column_type = "Text")]
    pub css: String,
    #[sea_orm(column_type = "Text")]
    pub js: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub screenshot: Option<String>,
    pub canvas_state: Option<Json>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
