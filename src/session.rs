use std::{
    sync::Arc,
    time::{Duration as StdDuration, Instant},
};

use actix_web::cookie::{time::Duration, Cookie, SameSite};
use actix_web::HttpRequest;
use dashmap::{mapref::one::RefMut, DashMap};

use crate::{auth::new_id, booking::BookingSession, models::Appointment};

pub const SESSION_COOKIE: &str = "bgb_session";
pub const DEFAULT_IDLE_TIMEOUT: StdDuration = StdDuration::from_secs(2 * 60 * 60);

/// Everything the server remembers about one browser.
#[derive(Debug)]
pub struct SessionData {
    pub user: Option<String>,
    pub booking: BookingSession,
    /// Appointments confirmed in this session, oldest first.
    pub appointments: Vec<Appointment>,
    last_seen: Instant,
}

impl SessionData {
    fn signed_in(username: &str) -> Self {
        Self {
            user: Some(username.to_string()),
            booking: BookingSession::default(),
            appointments: Vec::new(),
            last_seen: Instant::now(),
        }
    }
}

/// Sessions idle for longer than the timeout are forgotten, along with any
/// half-finished wizard they hold.
#[derive(Clone)]
pub struct SessionStore {
    sessions: Arc<DashMap<String, SessionData>>,
    idle_timeout: StdDuration,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new(DEFAULT_IDLE_TIMEOUT)
    }
}

impl SessionStore {
    pub fn new(idle_timeout: StdDuration) -> Self {
        Self {
            sessions: Arc::new(DashMap::new()),
            idle_timeout,
        }
    }

    /// Logs `username` in, reusing the caller's session when it still exists.
    /// Stale sessions are swept first.
    pub fn sign_in(&self, existing: Option<&str>, username: &str) -> String {
        self.evict_idle();
        if let Some(id) = existing {
            if let Some(mut session) = self.live(id) {
                session.user = Some(username.to_string());
                return id.to_string();
            }
        }
        let id = new_id();
        self.sessions
            .insert(id.clone(), SessionData::signed_in(username));
        id
    }

    pub fn evict_idle(&self) {
        let before = self.sessions.len();
        self.sessions
            .retain(|_, session| session.last_seen.elapsed() < self.idle_timeout);
        let evicted = before.saturating_sub(self.sessions.len());
        if evicted > 0 {
            log::debug!("Evicted {evicted} idle session(s)");
        }
    }

    pub fn sign_out(&self, id: &str) {
        self.sessions.remove(id);
    }

    pub fn user(&self, id: &str) -> Option<String> {
        self.live(id).and_then(|session| session.user.clone())
    }

    /// Runs `f` against the session. The entry is locked only for the
    /// duration of the call, so `f` must not await.
    pub fn with<R>(&self, id: &str, f: impl FnOnce(&mut SessionData) -> R) -> Option<R> {
        self.live(id).map(|mut session| f(&mut session))
    }

    // Marks the session as seen, or drops it if it has gone idle.
    fn live(&self, id: &str) -> Option<RefMut<'_, String, SessionData>> {
        let mut session = self.sessions.get_mut(id)?;
        if session.last_seen.elapsed() >= self.idle_timeout {
            drop(session);
            self.sessions
                .remove_if(id, |_, session| session.last_seen.elapsed() >= self.idle_timeout);
            return None;
        }
        session.last_seen = Instant::now();
        Some(session)
    }
}

pub fn session_id(req: &HttpRequest) -> Option<String> {
    req.cookie(SESSION_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .filter(|value| !value.is_empty())
}

pub fn session_cookie(req: &HttpRequest, id: &str) -> Cookie<'static> {
    let mut builder = Cookie::build(SESSION_COOKIE, id.to_string())
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax);
    if req.connection_info().scheme() == "https" {
        builder = builder.secure(true);
    }
    builder.finish()
}

pub fn clear_session_cookie(req: &HttpRequest) -> Cookie<'static> {
    let mut builder = Cookie::build(SESSION_COOKIE, "")
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .max_age(Duration::seconds(0));
    if req.connection_info().scheme() == "https" {
        builder = builder.secure(true);
    }
    builder.finish()
}
