use actix_web::{http::header, web, HttpRequest, HttpResponse};
use askama::Template;
use serde::Deserialize;

use crate::{
    auth::{authenticate, register, validate_login, validate_registration},
    error::{AppError, AppResult},
    session::{clear_session_cookie, session_cookie, session_id},
    state::AppState,
    templates::render,
};

#[derive(Template)]
#[template(path = "home.html")]
struct HomeTemplate {
    logged_in: bool,
}

#[derive(Template)]
#[template(path = "about.html")]
struct AboutTemplate {
    logged_in: bool,
}

#[derive(Template)]
#[template(path = "login.html")]
struct LoginTemplate {
    username: String,
    error: String,
}

#[derive(Template)]
#[template(path = "create_account.html")]
struct CreateAccountTemplate {
    username: String,
    error: String,
}

#[derive(Deserialize)]
struct LoginForm {
    #[serde(default)]
    username: String,
    #[serde(default)]
    password: String,
}

#[derive(Deserialize)]
struct CreateAccountForm {
    #[serde(default)]
    username: String,
    #[serde(default)]
    password: String,
    #[serde(default)]
    confirm_password: String,
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/").route(web::get().to(root)))
        .service(web::resource("/home").route(web::get().to(home)))
        .service(web::resource("/aboutus").route(web::get().to(about)))
        .service(
            web::resource("/login")
                .route(web::get().to(show_login))
                .route(web::post().to(submit_login)),
        )
        .service(
            web::resource("/createaccount")
                .route(web::get().to(show_create_account))
                .route(web::post().to(submit_create_account)),
        )
        .service(web::resource("/logout").route(web::get().to(logout)))
        .service(web::resource("/health").route(web::get().to(health)));
}

pub async fn fallback() -> HttpResponse {
    redirect("/home")
}

fn redirect(location: &str) -> HttpResponse {
    HttpResponse::SeeOther()
        .append_header((header::LOCATION, location))
        .finish()
}

fn is_logged_in(state: &AppState, req: &HttpRequest) -> bool {
    session_id(req)
        .and_then(|id| state.sessions.user(&id))
        .is_some()
}

async fn health() -> HttpResponse {
    HttpResponse::Ok().body("ok")
}

async fn root() -> HttpResponse {
    redirect("/home")
}

async fn home(state: web::Data<AppState>, req: HttpRequest) -> AppResult<HttpResponse> {
    render(HomeTemplate {
        logged_in: is_logged_in(&state, &req),
    })
}

async fn about(state: web::Data<AppState>, req: HttpRequest) -> AppResult<HttpResponse> {
    render(AboutTemplate {
        logged_in: is_logged_in(&state, &req),
    })
}

async fn show_login() -> AppResult<HttpResponse> {
    render(LoginTemplate {
        username: String::new(),
        error: String::new(),
    })
}

async fn submit_login(
    state: web::Data<AppState>,
    req: HttpRequest,
    form: web::Form<LoginForm>,
) -> AppResult<HttpResponse> {
    let form = form.into_inner();
    let username = form.username.trim().to_string();

    if let Err(message) = validate_login(&username, &form.password) {
        return render(LoginTemplate {
            username,
            error: message.to_string(),
        });
    }

    match authenticate(&state.db, &username, &form.password).await {
        Ok(user) => Ok(signed_in(&state, &req, &user.username)),
        Err(err @ AppError::InvalidCredential) => render(LoginTemplate {
            username,
            error: err.to_string(),
        }),
        Err(err) => Err(err),
    }
}

async fn show_create_account() -> AppResult<HttpResponse> {
    render(CreateAccountTemplate {
        username: String::new(),
        error: String::new(),
    })
}

async fn submit_create_account(
    state: web::Data<AppState>,
    req: HttpRequest,
    form: web::Form<CreateAccountForm>,
) -> AppResult<HttpResponse> {
    let form = form.into_inner();
    let username = form.username.trim().to_string();

    if let Err(message) = validate_registration(&username, &form.password, &form.confirm_password) {
        return render(CreateAccountTemplate {
            username,
            error: message.to_string(),
        });
    }

    match register(&state.db, &username, &form.password).await {
        Ok(user) => Ok(signed_in(&state, &req, &user.username)),
        Err(err @ AppError::DuplicateCredential) => render(CreateAccountTemplate {
            username,
            error: err.to_string(),
        }),
        Err(err) => Err(err),
    }
}

fn signed_in(state: &AppState, req: &HttpRequest, username: &str) -> HttpResponse {
    let existing = session_id(req);
    let id = state.sessions.sign_in(existing.as_deref(), username);
    HttpResponse::SeeOther()
        .append_header((header::LOCATION, "/barberselection"))
        .cookie(session_cookie(req, &id))
        .insert_header((header::CACHE_CONTROL, "no-store"))
        .finish()
}

async fn logout(state: web::Data<AppState>, req: HttpRequest) -> HttpResponse {
    if let Some(id) = session_id(&req) {
        state.sessions.sign_out(&id);
    }
    HttpResponse::SeeOther()
        .append_header((header::LOCATION, "/home"))
        .cookie(clear_session_cookie(&req))
        .insert_header((header::CACHE_CONTROL, "no-store"))
        .finish()
}
