use std::{env, str::FromStr, time::Duration};

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database_url: String,
    pub port: u16,
    pub static_dir: String,
    /// Pause between picking a barber and landing on the services step.
    pub selection_delay: Duration,
    /// Simulated booking submission.
    pub submit_delay: Duration,
    /// How long an untouched session is kept before it is discarded.
    pub session_idle: Duration,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            database_url: lookup("DATABASE_URL")
                .unwrap_or_else(|| "sqlite://./data/badguy.db".to_string()),
            port: parse_or(&lookup, "PORT", 8080),
            static_dir: lookup("STATIC_DIR").unwrap_or_else(|| "./static".to_string()),
            selection_delay: Duration::from_millis(parse_or(&lookup, "SELECTION_DELAY_MS", 500)),
            submit_delay: Duration::from_millis(parse_or(&lookup, "SUBMIT_DELAY_MS", 1000)),
            session_idle: Duration::from_secs(60 * parse_or(&lookup, "SESSION_IDLE_MINS", 120)),
        }
    }
}

fn parse_or<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T {
    match lookup(key) {
        None => default,
        Some(value) => value.trim().parse().unwrap_or_else(|_| {
            log::warn!("Ignoring invalid {key}={value:?}, using default.");
            default
        }),
    }
}
