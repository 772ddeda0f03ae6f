//! Generated site models and DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use utoipa::ToSchema;
use uuid::Uuid;

/// Default artifact name when the client does not provide one.
pub const DEFAULT_SITE_NAME: &str = "Untitled Site";

/// Upper bound on artifact names.
pub const MAX_SITE_NAME_LEN: usize = 200;

/// The html/css/js bundle produced by the generator and stored with an artifact.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
pub struct SiteCode {
    #[serde(default)]
    pub html: String,
    #[serde(default)]
    pub css: String,
    #[serde(default)]
    pub js: String,
}

/// Request body for `POST /api/generate`.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct GenerateRequest {
    /// Sketch as a data URL (`data:image/png;base64,...`).
    pub image: Option<String>,
    /// Site category, e.g. "Landing Page".
    #[serde(rename = "type")]
    pub site_type: Option<String>,
    /// Optional free-form instructions from the user.
    pub prompt: Option<String>,
}

/// Request body for `POST /api/save`.
///
/// Deserialized loosely and then checked by [`SaveSiteRequest::validate`], so
/// that every rejection is reported the same way.
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SaveSiteRequest {
    pub name: Option<String>,
    #[serde(rename = "type", default)]
    pub site_type: String,
    #[serde(default)]
    pub code: SiteCode,
    pub screenshot: Option<String>,
    #[schema(value_type = Option<Object>)]
    pub canvas_state: Option<JsonValue>,
}

/// A save payload that passed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct NewSite {
    pub name: String,
    pub site_type: String,
    pub code: SiteCode,
    pub screenshot: Option<String>,
    pub canvas_state: Option<JsonValue>,
}

/// Reasons a save payload is rejected before it reaches the database.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum SiteValidationError {
    #[error("Malformed site payload: {0}")]
    Malformed(String),

    #[error("Site type is required")]
    MissingType,

    #[error("code.html is required")]
    MissingHtml,

    #[error("Site name must be at most {MAX_SITE_NAME_LEN} characters")]
    NameTooLong,
}

impl SaveSiteRequest {
    /// Parse a raw request body.
    ///
    /// The body and its `code` member must be JSON objects; derived impls
    /// would otherwise accept arrays in their place.
    pub fn from_slice(body: &[u8]) -> Result<Self, SiteValidationError> {
        let malformed = |e: serde_json::Error| SiteValidationError::Malformed(e.to_string());

        let value: JsonValue = serde_json::from_slice(body).map_err(malformed)?;
        let Some(fields) = value.as_object() else {
            return Err(SiteValidationError::Malformed(
                "site payload must be a JSON object".to_string(),
            ));
        };
        if fields.get("code").is_some_and(|code| !code.is_object()) {
            return Err(SiteValidationError::Malformed(
                "code must be a JSON object".to_string(),
            ));
        }

        serde_json::from_value(value).map_err(malformed)
    }

    /// Check required fields and apply defaults.
    pub fn validate(self) -> Result<NewSite, SiteValidationError> {
        let site_type = self.site_type.trim().to_string();
        if site_type.is_empty() {
            return Err(SiteValidationError::MissingType);
        }

        if self.code.html.trim().is_empty() {
            return Err(SiteValidationError::MissingHtml);
        }

        let name = match self.name.map(|n| n.trim().to_string()) {
            Some(n) if !n.is_empty() => n,
            _ => DEFAULT_SITE_NAME.to_string(),
        };
        if name.chars().count() > MAX_SITE_NAME_LEN {
            return Err(SiteValidationError::NameTooLong);
        }

        Ok(NewSite {
            name,
            site_type,
            code: self.code,
            screenshot: self.screenshot.filter(|s| !s.is_empty()),
            canvas_state: self.canvas_state.filter(|v| !v.is_null()),
        })
    }
}

/// A persisted artifact as returned by `GET /api/save`.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedSite {
    pub id: Uuid,
    pub name: String,
    #[serde(rename = "type")]
    pub site_type: String,
    pub code: SiteCode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub screenshot: Option<String>,
    #[schema(value_type = Option<Object>)]
    pub canvas_state: Option<JsonValue>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<crate::entity::generated_site::Model> for GeneratedSite {
    fn from(m: crate::entity::generated_site::Model) -> Self {
        Self {
            id: m.id,
            name: m.name,
            site_type: m.site_type,
            code: SiteCode {
                html: m.html,
                css: m.css,
                js: m.js,
            },
            screenshot: m.screenshot,
            canvas_state: m.canvas_state,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

/// Successful save response.
#[derive(Debug, Serialize, ToSchema)]
pub struct SaveSiteResponse {
    pub success: bool,
    pub id: Uuid,
}

/// Failed save response.
#[derive(Debug, Serialize, ToSchema)]
pub struct SaveSiteFailure {
    pub success: bool,
    pub error: String,
}
