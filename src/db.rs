use std::{fs, path::Path};

use chrono::Utc;
use sqlx::SqlitePool;

use crate::{auth::new_id, error::AppError, models::UserRow};

pub async fn run_migrations(pool: &SqlitePool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}

pub fn ensure_sqlite_dir(db_url: &str) -> std::io::Result<()> {
    let path = db_url
        .strip_prefix("sqlite://")
        .or_else(|| db_url.strip_prefix("sqlite:"));

    let Some(path) = path else {
        return Ok(());
    };

    let path = path.split('?').next().unwrap_or(path);
    if path == ":memory:" || path.is_empty() {
        return Ok(());
    }

    let path = path.strip_prefix("file:").unwrap_or(path);
    if let Some(parent) = Path::new(path).parent() {
        fs::create_dir_all(parent)?;
    }
    Ok(())
}

pub async fn find_user(pool: &SqlitePool, username: &str) -> Result<Option<UserRow>, sqlx::Error> {
    sqlx::query_as::<_, UserRow>(
        r#"SELECT id, username, password_hash, created_at
           FROM users
           WHERE username = ?
           LIMIT 1"#,
    )
    .bind(username)
    .fetch_optional(pool)
    .await
}

/// Stores a new user. Usernames are unique; a clash comes back as
/// [`AppError::DuplicateCredential`].
pub async fn save_user(
    pool: &SqlitePool,
    username: &str,
    password_hash: &str,
) -> Result<UserRow, AppError> {
    if find_user(pool, username).await?.is_some() {
        return Err(AppError::DuplicateCredential);
    }

    let user = UserRow {
        id: new_id(),
        username: username.to_string(),
        password_hash: password_hash.to_string(),
        created_at: Utc::now().to_rfc3339(),
    };

    let inserted = sqlx::query(
        r#"INSERT INTO users (id, username, password_hash, created_at)
           VALUES (?, ?, ?, ?)"#,
    )
    .bind(&user.id)
    .bind(&user.username)
    .bind(&user.password_hash)
    .bind(&user.created_at)
    .execute(pool)
    .await;

    match inserted {
        Ok(_) => Ok(user),
        Err(sqlx::Error::Database(err)) if err.is_unique_violation() => {
            Err(AppError::DuplicateCredential)
        }
        Err(err) => Err(err.into()),
    }
}

#[cfg(test)]
pub(crate) async fn test_pool() -> SqlitePool {
    let pool = sqlx::sqlite::SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("in-memory sqlite");
    run_migrations(&pool).await.expect("migrations");
    pool
}
