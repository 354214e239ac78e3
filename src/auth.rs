//! Minimal session login so that the request layer can hand an authenticated
//! user id to the transaction service.
use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
};
use axum::{Json, extract::State, http::StatusCode};
use password_hash::rand_core::OsRng;
use tower_sessions::Session;
use uuid::Uuid;

use crate::constants::*;
use crate::error::{Error, Result};
use crate::models::{LoginPayload, PublicUser, RegisterPayload, User};
use crate::{AppState, Db};

pub fn validate_username(username: &str) -> Result<()> {
    let length = username.trim().chars().count();
    if !(MIN_USERNAME_LENGTH..=MAX_USERNAME_LENGTH).contains(&length) {
        return Err(Error::validation(format!(
            "Username must be between {MIN_USERNAME_LENGTH} and {MAX_USERNAME_LENGTH} characters"
        )));
    }
    Ok(())
}

pub fn validate_password(password: &str) -> Result<()> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(Error::validation(format!(
            "Password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    Ok(())
}

pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| Error::persistence("failed to hash password", e))
}

fn verify_password(password: &str, password_hash: &str) -> bool {
    PasswordHash::new(password_hash)
        .map(|parsed| {
            Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok()
        })
        .unwrap_or(false)
}

/// Looks up an active (not deleted) user by name.
pub async fn get_user_by_username(db: &Db, username: &str) -> Result<Option<User>> {
    let conn = db.read().await;
    let mut rows = conn
        .query(
            "SELECT id, name, password_hash FROM users WHERE name = ? AND is_deleted = 0",
            [username],
        )
        .await
        .map_err(|e| Error::persistence("failed to query user", e))?;

    match rows.next().await? {
        Some(row) => Ok(Some(User {
            id: row.get(0)?,
            username: row.get(1)?,
            password_hash: row.get(2)?,
        })),
        None => Ok(None),
    }
}

async fn is_active_user(db: &Db, user_id: &str) -> Result<bool> {
    let conn = db.read().await;
    let mut rows = conn
        .query(
            "SELECT 1 FROM users WHERE id = ? AND is_deleted = 0",
            [user_id],
        )
        .await
        .map_err(|e| Error::persistence("failed to query user", e))?;

    Ok(rows.next().await?.is_some())
}

pub async fn create_user(db: &Db, username: &str, password: &str) -> Result<PublicUser> {
    validate_username(username)?;
    validate_password(password)?;
    let username = username.trim();

    let password_hash = hash_password(password)?;
    let user_id = Uuid::new_v4().to_string();

    let conn = db.write().await;
    let mut existing = conn
        .query("SELECT 1 FROM users WHERE name = ?", [username])
        .await
        .map_err(|e| Error::persistence("failed to check username", e))?;
    if existing.next().await?.is_some() {
        return Err(Error::Conflict("Username already exists".to_string()));
    }

    conn.execute(
        "INSERT INTO users (id, name, password_hash, is_deleted) VALUES (?, ?, ?, 0)",
        (user_id.as_str(), username, password_hash.as_str()),
    )
    .await
    .map_err(|e| Error::persistence("user creation failed", e))?;

    tracing::info!("registered user {username}");
    Ok(PublicUser {
        id: user_id,
        username: username.to_string(),
    })
}

/// The user stored in the session, provided the account still exists.
pub async fn get_current_user(db: &Db, session: &Session) -> Result<PublicUser> {
    let user: PublicUser = session
        .get(SESSION_USER_KEY)
        .await
        .map_err(|e| Error::persistence(ERR_INVALID_SESSION, e))?
        .ok_or(Error::Unauthorized)?;

    if !is_active_user(db, &user.id).await? {
        return Err(Error::Unauthorized);
    }
    Ok(user)
}

pub async fn register(
    State(app_state): State<AppState>,
    Json(payload): Json<RegisterPayload>,
) -> std::result::Result<(StatusCode, Json<PublicUser>), (StatusCode, String)> {
    let user = create_user(&app_state.db, &payload.username, &payload.password).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn login(
    State(app_state): State<AppState>,
    session: Session,
    Json(payload): Json<LoginPayload>,
) -> std::result::Result<(StatusCode, Json<PublicUser>), (StatusCode, String)> {
    let invalid = || {
        (
            StatusCode::UNAUTHORIZED,
            "Invalid username or password".to_string(),
        )
    };

    let user = get_user_by_username(&app_state.db, payload.username.trim())
        .await?
        .ok_or_else(invalid)?;

    if !verify_password(&payload.password, &user.password_hash) {
        tracing::warn!("failed login for {}", user.username);
        return Err(invalid());
    }

    let public = PublicUser {
        id: user.id,
        username: user.username,
    };

    session.cycle_id().await.map_err(|e| {
        (StatusCode::INTERNAL_SERVER_ERROR, format!("{ERR_INVALID_SESSION}: {e}"))
    })?;
    session
        .insert(SESSION_USER_KEY, &public)
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, format!("{ERR_INVALID_SESSION}: {e}")))?;

    Ok((StatusCode::OK, Json(public)))
}

pub async fn logout(session: Session) -> std::result::Result<StatusCode, (StatusCode, String)> {
    session.flush().await.map_err(|e| {
        (StatusCode::INTERNAL_SERVER_ERROR, format!("{ERR_INVALID_SESSION}: {e}"))
    })?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn me(
    State(app_state): State<AppState>,
    session: Session,
) -> std::result::Result<(StatusCode, Json<PublicUser>), (StatusCode, String)> {
    let user = get_current_user(&app_state.db, &session).await?;
    Ok((StatusCode::OK, Json(user)))
}

/// Soft-deletes the account. Its transactions stay in storage.
pub async fn delete_account(
    State(app_state): State<AppState>,
    session: Session,
) -> std::result::Result<StatusCode, (StatusCode, String)> {
    let user = get_current_user(&app_state.db, &session).await?;

    {
        let conn = app_state.db.write().await;
        conn.execute(
            "UPDATE users SET is_deleted = 1 WHERE id = ? AND is_deleted = 0",
            [user.id.as_str()],
        )
        .await
        .map_err(|e| Error::persistence("failed to delete account", e))?;
    }

    session.flush().await.map_err(|e| {
        (StatusCode::INTERNAL_SERVER_ERROR, format!("{ERR_INVALID_SESSION}: {e}"))
    })?;

    tracing::info!("user {} deleted their account", user.username);
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_hash_verifies() {
        let hash = hash_password("correct horse").unwrap();
        assert!(verify_password("correct horse", &hash));
        assert!(!verify_password("wrong horse", &hash));
        assert!(!verify_password("correct horse", "not a hash"));
    }

    #[test]
    fn username_length_is_bounded() {
        assert!(validate_username("bob").is_err());
        assert!(validate_username("alice").is_ok());
        assert!(validate_username(&"a".repeat(MAX_USERNAME_LENGTH + 1)).is_err());
    }
}
