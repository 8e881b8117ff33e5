use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("password hashing failed: {0}")]
    PasswordHash(argon2::password_hash::Error),
    #[error("template render error: {0}")]
    Template(#[from] askama::Error),
    #[error("Username already exists")]
    DuplicateCredential,
    #[error("Invalid username or password")]
    InvalidCredential,
}

impl From<argon2::password_hash::Error> for AppError {
    fn from(err: argon2::password_hash::Error) -> Self {
        Self::PasswordHash(err)
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::DuplicateCredential => StatusCode::CONFLICT,
            Self::InvalidCredential => StatusCode::UNAUTHORIZED,
            Self::Database(_) | Self::PasswordHash(_) | Self::Template(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            log::error!("Request failed: {self}");
            HttpResponse::build(status).finish()
        } else {
            HttpResponse::build(status).body(self.to_string())
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;
