mod auth;
mod availability;
mod booking;
mod config;
mod db;
mod error;
mod filters;
mod models;
mod progress;
mod routes;
mod session;
mod slots;
mod state;
mod templates;

use actix_files::Files;
use actix_web::{middleware, web, App, HttpServer};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::str::FromStr;

use crate::{config::AppConfig, session::SessionStore, state::AppState};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    if let Err(err) = run().await {
        eprintln!("Startup error: {err}");
        std::process::exit(1);
    }
    Ok(())
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .init();

    let config = AppConfig::from_env();
    db::ensure_sqlite_dir(&config.database_url)?;

    let connect_options = SqliteConnectOptions::from_str(&config.database_url)?
        .create_if_missing(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(connect_options)
        .await?;

    db::run_migrations(&pool).await?;

    let address = format!("0.0.0.0:{}", config.port);
    let static_dir = config.static_dir.clone();
    let state = AppState {
        db: pool,
        sessions: SessionStore::new(config.session_idle),
        config,
    };

    log::info!("Starting Bad Guy Barbers on http://{address}");

    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(state.clone()))
            .wrap(middleware::Logger::default())
            .service(Files::new("/static", static_dir.clone()).prefer_utf8(true))
            .configure(routes::public::configure)
            .configure(routes::booking::configure)
            .default_service(web::to(routes::public::fallback))
    })
    .bind(address)?
    .run()
    .await?;

    Ok(())
}
