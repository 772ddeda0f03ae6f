//! Database operations for users.

use chrono::{DateTime, Utc};
use sea_orm::*;
use uuid::Uuid;

use crate::entity::user::{self as user_entity, ActiveModel, Column, Entity as UserEntity};
use crate::error::{AppError, AppResult};
use crate::models::user::{OAUTH_PASSWORD_MARKER, User};

/// Find a user by (case-insensitive) email.
pub async fn find_by_email(db: &DatabaseConnection, email: &str) -> AppResult<Option<User>> {
    let result = UserEntity::find()
        .filter(Column::Email.eq(normalize_email(email)))
        .one(db)
        .await?;

    Ok(result.map(model_to_user))
}

/// Find a user by ID.
pub async fn find_by_id(db: &DatabaseConnection, id: Uuid) -> AppResult<Option<User>> {
    let result = UserEntity::find_by_id(id).one(db).await?;
    Ok(result.map(model_to_user))
}

/// Create an unverified local account.
///
/// Returns `AppError::Conflict` if the email is already registered.
pub async fn create_local(
    db: &DatabaseConnection,
    name: &str,
    email: &str,
    password_hash: &str,
) -> AppResult<User> {
    let now = Utc::now();

    let model = ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(name.to_string()),
        email: Set(normalize_email(email)),
        password: Set(password_hash.to_string()),
        avatar: Set(None),
        is_email_verified: Set(false),
        verification_token: Set(None),
        verification_token_expiry: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
    };

    match model.insert(db).await {
        Ok(inserted) => Ok(model_to_user(inserted)),
        Err(e) if is_unique_violation(&e) => Err(AppError::Conflict(
            "An account with this email already exists".to_string(),
        )),
        Err(e) => Err(e.into()),
    }
}

/// Store a fresh verification token and expiry on a user.
pub async fn set_verification_token(
    db: &DatabaseConnection,
    user_id: Uuid,
    token: &str,
    expires_at: DateTime<Utc>,
) -> AppResult<()> {
    let existing = UserEntity::find_by_id(user_id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {}", user_id)))?;

    let mut active: ActiveModel = existing.into();
    active.verification_token = Set(Some(token.to_string()));
    active.verification_token_expiry = Set(Some(expires_at));
    active.updated_at = Set(Utc::now());
    active.update(db).await?;

    Ok(())
}

/// Find the user holding `token` whose expiry is strictly after `now`.
pub async fn find_by_valid_token(
    db: &DatabaseConnection,
    token: &str,
    now: DateTime<Utc>,
) -> AppResult<Option<User>> {
    let result = UserEntity::find()
        .filter(Column::VerificationToken.eq(token))
        .filter(Column::VerificationTokenExpiry.gt(now))
        .one(db)
        .await?;

    Ok(result.map(model_to_user))
}

/// Mark a user verified and clear both token fields.
pub async fn mark_verified(db: &DatabaseConnection, user_id: Uuid) -> AppResult<User> {
    let existing = UserEntity::find_by_id(user_id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {}", user_id)))?;

    let mut active: ActiveModel = existing.into();
    active.is_email_verified = Set(true);
    active.verification_token = Set(None);
    active.verification_token_expiry = Set(None);
    active.updated_at = Set(Utc::now());
    let updated = active.update(db).await?;

    Ok(model_to_user(updated))
}

/// Result of reconciling a GitHub identity with the local user table.
#[derive(Debug)]
pub struct GitHubUpsert {
    pub user: User,
    pub created: bool,
}

/// Find or create a user by email on GitHub login.
///
/// New users get the OAuth password marker and are verified up front. For an
/// existing user only the avatar is refreshed, and only when it changed.
pub async fn upsert_from_github(
    db: &DatabaseConnection,
    email: &str,
    display_name: &str,
    avatar_url: Option<&str>,
) -> AppResult<GitHubUpsert> {
    let email = normalize_email(email);

    let existing = UserEntity::find()
        .filter(Column::Email.eq(email.as_str()))
        .one(db)
        .await?;

    if let Some(m) = existing {
        return refresh_avatar(db, m, avatar_url).await;
    }

    let now = Utc::now();
    let model = ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(display_name.to_string()),
        email: Set(email.clone()),
        password: Set(OAUTH_PASSWORD_MARKER.to_string()),
        avatar: Set(avatar_url.map(|s| s.to_string())),
        is_email_verified: Set(true),
        verification_token: Set(None),
        verification_token_expiry: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
    };

    match model.insert(db).await {
        Ok(inserted) => Ok(GitHubUpsert {
            user: model_to_user(inserted),
            created: true,
        }),
        // A concurrent callback for the same identity won the insert
        Err(e) if is_unique_violation(&e) => {
            let m = UserEntity::find()
                .filter(Column::Email.eq(email.as_str()))
                .one(db)
                .await?
                .ok_or_else(|| {
                    AppError::Database("User vanished after unique violation".to_string())
                })?;
            refresh_avatar(db, m, avatar_url).await
        }
        Err(e) => Err(e.into()),
    }
}

async fn refresh_avatar(
    db: &DatabaseConnection,
    m: user_entity::Model,
    avatar_url: Option<&str>,
) -> AppResult<GitHubUpsert> {
    if m.avatar.as_deref() == avatar_url {
        return Ok(GitHubUpsert {
            user: model_to_user(m),
            created: false,
        });
    }

    let mut active: ActiveModel = m.into();
    active.avatar = Set(avatar_url.map(|s| s.to_string()));
    active.updated_at = Set(Utc::now());
    let updated = active.update(db).await?;

    Ok(GitHubUpsert {
        user: model_to_user(updated),
        created: false,
    })
}

/// Count all user rows.
pub async fn count(db: &DatabaseConnection) -> AppResult<u64> {
    Ok(UserEntity::find().count(db).await?)
}

/// Emails are stored and compared lower-cased.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}

fn model_to_user(m: user_entity::Model) -> User {
    User {
        id: m.id,
        name: m.name,
        email: m.email,
        password: m.password,
        avatar: m.avatar,
        is_email_verified: m.is_email_verified,
        verification_token: m.verification_token,
        verification_token_expiry: m.verification_token_expiry,
        created_at: m.created_at,
        updated_at: m.updated_at,
    }
}
