use actix_web::{
    body::BoxBody,
    dev::{ServiceRequest, ServiceResponse},
    http::header,
    middleware::Next,
    web, Error, HttpMessage, HttpResponse,
};
use argon2::{
    password_hash::{self, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand_core::OsRng;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::{
    db::{find_user, save_user},
    error::AppError,
    models::UserRow,
    session::session_id,
    state::AppState,
};

const MIN_PASSWORD_LEN: usize = 6;

/// The logged-in session behind a wizard request.
#[derive(Clone, Debug)]
pub struct CurrentSession {
    pub id: String,
    pub username: String,
}

pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

pub fn hash_password(password: &str) -> Result<String, password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default().hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

fn verify_password(password: &str, password_hash: &str) -> bool {
    match PasswordHash::new(password_hash) {
        Ok(hash) => Argon2::default()
            .verify_password(password.as_bytes(), &hash)
            .is_ok(),
        Err(_) => false,
    }
}

/// Form checks for account creation, in the order the user sees them.
pub fn validate_registration(
    username: &str,
    password: &str,
    confirm_password: &str,
) -> Result<(), &'static str> {
    if username.is_empty() || password.is_empty() || confirm_password.is_empty() {
        return Err("All fields are required");
    }
    if password != confirm_password {
        return Err("Passwords do not match");
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err("Password must be at least 6 characters long");
    }
    Ok(())
}

pub fn validate_login(username: &str, password: &str) -> Result<(), &'static str> {
    if username.is_empty() || password.is_empty() {
        return Err("Please enter both username and password");
    }
    Ok(())
}

pub async fn register(pool: &SqlitePool, username: &str, password: &str) -> Result<UserRow, AppError> {
    let password_hash = hash_password(password)?;
    let user = save_user(pool, username, &password_hash).await?;
    log::info!("Created account for {username}");
    Ok(user)
}

pub async fn authenticate(pool: &SqlitePool, username: &str, password: &str) -> Result<UserRow, AppError> {
    let user = find_user(pool, username)
        .await?
        .ok_or(AppError::InvalidCredential)?;
    if !verify_password(password, &user.password_hash) {
        return Err(AppError::InvalidCredential);
    }
    log::info!("{username} logged in");
    Ok(user)
}

/// Lets a request into the booking wizard only when its session cookie names
/// a logged-in session; everyone else is sent to the login page.
pub async fn require_login<B>(
    req: ServiceRequest,
    next: Next<B>,
) -> Result<ServiceResponse<BoxBody>, Error>
where
    B: actix_web::body::MessageBody + 'static,
{
    let current = req.app_data::<web::Data<AppState>>().and_then(|state| {
        let id = session_id(req.request())?;
        let username = state.sessions.user(&id)?;
        Some(CurrentSession { id, username })
    });

    let Some(current) = current else {
        let response = HttpResponse::SeeOther()
            .insert_header((header::LOCATION, "/login"))
            .insert_header((header::CACHE_CONTROL, "no-store"))
            .finish();
        return Ok(req.into_response(response));
    };

    req.extensions_mut().insert(current);
    let res = next.call(req).await?;
    Ok(res.map_into_boxed_body())
}
