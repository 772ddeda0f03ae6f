//! Database queries for generated sites.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveModelTrait, EntityTrait, QueryOrder, Set};
use uuid::Uuid;

use crate::entity::generated_site::{self as site, ActiveModel, Entity as GeneratedSite};
use crate::error::{AppError, AppResult};
use crate::models::NewSite;

use super::DbPool;

impl DbPool {
    /// Insert a validated site. Every save creates a new row.
    pub async fn insert_site(&self, new_site: NewSite, now: DateTime<Utc>) -> AppResult<site::Model> {
        let model = ActiveModel {
            id: Set(Uuid::now_v7()),
            name: Set(new_site.name),
            site_type: Set(new_site.site_type),
            html: Set(new_site.code.html),
            css: Set(new_site.code.css),
            js: Set(new_site.code.js),
            screenshot: Set(new_site.screenshot),
            canvas_state: Set(new_site.canvas_state),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let result = model
            .insert(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to insert site: {}", e)))?;

        Ok(result)
    }

    /// List every saved site, most recently updated first.
    pub async fn list_sites(&self) -> AppResult<Vec<site::Model>> {
        let sites = GeneratedSite::find()
            .order_by_desc(site::Column::UpdatedAt)
            .order_by_desc(site::Column::Id)
            .all(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to list sites: {}", e)))?;

        Ok(sites)
    }
}
