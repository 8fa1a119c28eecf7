//! Users, password verification and cookie sessions.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, PaginatorTrait,
    QueryFilter, Set,
};
use serde::Deserialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::alarms::access::Actor;
use crate::alarms::types::Role;
use crate::config::BootstrapAdmin;
use crate::entities::{session, user};
use crate::error::{AlarmError, Result};

const MIN_PASSWORD_LEN: usize = 8;

#[derive(Debug, Clone, Deserialize)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password: String,
    pub role: Option<Role>,
}

pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AlarmError::Internal(format!("failed to hash password: {e}")))
}

fn verify_password(password: &str, stored: &str) -> Result<bool> {
    let parsed = PasswordHash::new(stored)
        .map_err(|e| AlarmError::Internal(format!("invalid password hash in DB: {e}")))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

pub async fn create_user(db: &DatabaseConnection, new_user: NewUser) -> Result<user::Model> {
    let username = new_user.username.trim();
    if username.is_empty() {
        return Err(AlarmError::validation("username must not be empty"));
    }
    if new_user.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AlarmError::validation(format!(
            "password must have at least {MIN_PASSWORD_LEN} characters"
        )));
    }

    let taken = user::Entity::find()
        .filter(user::Column::Username.eq(username))
        .count(db)
        .await?;
    if taken > 0 {
        return Err(AlarmError::validation("username already exists"));
    }

    let password_hash = hash_password(&new_user.password)?;
    let created = user::ActiveModel {
        username: Set(username.to_string()),
        email: Set(new_user.email.trim().to_string()),
        password_hash: Set(password_hash),
        role: Set(new_user.role),
        is_active: Set(true),
        created_at: Set(Utc::now().naive_utc()),
        ..Default::default()
    }
    .insert(db)
    .await?;

    info!(user_id = created.id, role = ?created.role, "Created user {}", created.username);
    Ok(created)
}

/// Checks credentials. Unknown users, wrong passwords and inactive accounts
/// are indistinguishable to the caller.
pub async fn authenticate(
    db: &DatabaseConnection,
    username: &str,
    password: &str,
) -> Result<user::Model> {
    let Some(found) = user::Entity::find()
        .filter(user::Column::Username.eq(username.trim()))
        .one(db)
        .await?
    else {
        return Err(AlarmError::Unauthorized);
    };

    if !found.is_active || !verify_password(password, &found.password_hash)? {
        warn!(username, "Rejected login");
        return Err(AlarmError::Unauthorized);
    }
    Ok(found)
}

pub async fn open_session(
    db: &DatabaseConnection,
    account: &user::Model,
    ttl: chrono::Duration,
) -> Result<session::Model> {
    let now = Utc::now().naive_utc();
    Ok(session::ActiveModel {
        token: Set(Uuid::new_v4()),
        user_id: Set(account.id),
        csrf_token: Set(Uuid::new_v4()),
        created_at: Set(now),
        expires_at: Set(now + ttl),
    }
    .insert(db)
    .await?)
}

/// Looks up a live session and its active user. Expired sessions are removed.
pub async fn resolve_session(
    db: &DatabaseConnection,
    token: Uuid,
) -> Result<(session::Model, user::Model)> {
    let Some(found) = session::Entity::find_by_id(token).one(db).await? else {
        return Err(AlarmError::Unauthorized);
    };

    if found.expires_at <= Utc::now().naive_utc() {
        found.delete(db).await?;
        return Err(AlarmError::Unauthorized);
    }

    match user::Entity::find_by_id(found.user_id).one(db).await? {
        Some(account) if account.is_active => Ok((found, account)),
        _ => Err(AlarmError::Unauthorized),
    }
}

pub async fn close_session(db: &DatabaseConnection, token: Uuid) -> Result<()> {
    session::Entity::delete_by_id(token).exec(db).await?;
    Ok(())
}

/// Users without a role can sign in but cannot act.
pub fn actor_for(account: &user::Model) -> Result<Actor> {
    let role = account
        .role
        .ok_or_else(|| AlarmError::Forbidden(format!("user {} has no role", account.username)))?;
    Ok(Actor {
        user_id: account.id,
        username: account.username.clone(),
        role,
    })
}

/// Creates the configured administrator when no user exists yet.
pub async fn ensure_bootstrap_admin(
    db: &DatabaseConnection,
    admin: &BootstrapAdmin,
) -> Result<Option<user::Model>> {
    if user::Entity::find().count(db).await? > 0 {
        return Ok(None);
    }

    let created = create_user(
        db,
        NewUser {
            username: admin.username.clone(),
            email: admin.email.clone(),
            password: admin.password.clone(),
            role: Some(Role::BuildingAdmin),
        },
    )
    .await?;
    info!(user_id = created.id, "Bootstrapped administrator account");
    Ok(Some(created))
}
