use sqlx::SqlitePool;
use thiserror::Error;

use crate::auth::{hash_password, verify_password};
use crate::models::User;

#[derive(Debug, Error)]
pub enum UserError {
    #[error("A user with that {0} already exists.")]
    Taken(&'static str),
    #[error(transparent)]
    PasswordHash(#[from] argon2::password_hash::Error),
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub password: String,
    pub is_staff: bool,
}

#[derive(Debug)]
pub enum LoginOutcome {
    Success(User),
    UnknownEmail,
    WrongPassword,
}

/// Hash the password and store the account. Username and email are unique.
pub async fn create(db: &SqlitePool, new: NewUser) -> Result<User, UserError> {
    let mut user = User::new(new.username, new.email, new.first_name, new.last_name);
    user.is_staff = new.is_staff;

    ensure_unique(db, &user.username, &user.email, None).await?;

    let password_hash = hash_password(&new.password)?;

    sqlx::query(
        r#"
        INSERT INTO users (id, username, email, first_name, last_name, password_hash, is_staff, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&user.id)
    .bind(&user.username)
    .bind(&user.email)
    .bind(&user.first_name)
    .bind(&user.last_name)
    .bind(&password_hash)
    .bind(user.is_staff)
    .bind(&user.created_at)
    .bind(&user.updated_at)
    .execute(db)
    .await?;

    tracing::info!(user_id = %user.id, username = %user.username, is_staff = user.is_staff, "user created");
    Ok(user)
}

pub async fn ensure_unique(
    db: &SqlitePool,
    username: &str,
    email: &str,
    except_id: Option<&str>,
) -> Result<(), UserError> {
    let except_id = except_id.unwrap_or("");

    let (by_name,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users WHERE username = ? AND id != ?")
        .bind(username)
        .bind(except_id)
        .fetch_one(db)
        .await?;
    if by_name > 0 {
        return Err(UserError::Taken("username"));
    }

    let (by_email,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users WHERE email = ? AND id != ?")
        .bind(email.trim().to_lowercase())
        .bind(except_id)
        .fetch_one(db)
        .await?;
    if by_email > 0 {
        return Err(UserError::Taken("email"));
    }

    Ok(())
}

/// Check an email + password pair, telling apart unknown accounts and bad passwords.
pub async fn authenticate(db: &SqlitePool, email: &str, password: &str) -> Result<LoginOutcome, sqlx::Error> {
    let row: Option<(String,)> = sqlx::query_as("SELECT password_hash FROM users WHERE email = ?")
        .bind(email.trim().to_lowercase())
        .fetch_optional(db)
        .await?;

    let Some((password_hash,)) = row else {
        return Ok(LoginOutcome::UnknownEmail);
    };

    if !verify_password(password, &password_hash) {
        return Ok(LoginOutcome::WrongPassword);
    }

    let user: User = sqlx::query_as("SELECT * FROM users WHERE email = ?")
        .bind(email.trim().to_lowercase())
        .fetch_one(db)
        .await?;
    Ok(LoginOutcome::Success(user))
}

pub async fn find(db: &SqlitePool, id: &str) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM users WHERE id = ?")
        .bind(id)
        .fetch_optional(db)
        .await
}

pub async fn list(db: &SqlitePool) -> Result<Vec<User>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM users ORDER BY created_at")
        .fetch_all(db)
        .await
}

/// Overwrite profile fields; a `Some` password is re-hashed.
pub async fn update(db: &SqlitePool, user: &User, password: Option<&str>) -> Result<(), UserError> {
    ensure_unique(db, &user.username, &user.email, Some(&user.id)).await?;

    let now = chrono::Utc::now().to_rfc3339();
    sqlx::query(
        r#"
        UPDATE users SET username = ?, email = ?, first_name = ?, last_name = ?, is_staff = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&user.username)
    .bind(user.email.trim().to_lowercase())
    .bind(&user.first_name)
    .bind(&user.last_name)
    .bind(user.is_staff)
    .bind(&now)
    .bind(&user.id)
    .execute(db)
    .await?;

    if let Some(password) = password {
        let password_hash = hash_password(password)?;
        sqlx::query("UPDATE users SET password_hash = ? WHERE id = ?")
            .bind(&password_hash)
            .bind(&user.id)
            .execute(db)
            .await?;
    }

    Ok(())
}

pub async fn delete(db: &SqlitePool, id: &str) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM users WHERE id = ?")
        .bind(id)
        .execute(db)
        .await?;
    tracing::info!(user_id = %id, "user deleted");
    Ok(())
}
