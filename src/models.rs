use chrono::{NaiveDate, NaiveDateTime};

use crate::availability::availability_label;

pub const SLOT_MINUTES: u32 = 30;
pub const BARBER_PLACEHOLDER_IMAGE: &str = "/static/img/barber-silhouette.svg";

#[allow(dead_code)]
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserRow {
    pub id: String,
    pub username: String,
    pub password_hash: String,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BarberRef {
    pub name: String,
    pub availability: String,
    pub image: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Service {
    pub name: String,
    pub duration: String,
    pub price: u32,
}

impl Service {
    fn new(name: &str, duration: &str, price: u32) -> Self {
        Self {
            name: name.to_string(),
            duration: duration.to_string(),
            price,
        }
    }
}

/// A bookable 30-minute interval. `id` is the slot's position within the day,
/// so the same id always maps to the same time of day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeSlot {
    pub id: u32,
    pub time: String,
    pub available: bool,
    pub duration_minutes: u32,
}

/// A confirmed booking. `total` is captured at submission and never recomputed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Appointment {
    pub barber: BarberRef,
    pub services: Vec<Service>,
    pub date: NaiveDate,
    pub time: String,
    pub total: u32,
}

impl Appointment {
    /// "Friday, October 16 at 9:00 AM"
    pub fn when_label(&self) -> String {
        format!("{} at {}", self.date.format("%A, %B %-d"), self.time)
    }
}

const ROSTER: [&str; 3] = ["David J.", "Sam L.", "Tony F."];

/// The shop's barbers. Each one's next opening is staggered by one more day
/// than the barber before.
pub fn barber_roster(now: NaiveDateTime) -> Vec<BarberRef> {
    ROSTER
        .iter()
        .zip(0_i64..)
        .map(|(name, offset)| BarberRef {
            name: (*name).to_string(),
            availability: availability_label(now, offset),
            image: BARBER_PLACEHOLDER_IMAGE,
        })
        .collect()
}

pub fn service_catalog() -> Vec<Service> {
    vec![
        Service::new("Haircut", "45 mins", 35),
        Service::new("Haircut & Beard Groom", "1 hr", 45),
        Service::new("Kids cut 12 & under", "30 min", 30),
        Service::new("Razor Fade", "45 mins", 40),
        Service::new("Beard Groom/Line Up", "30 mins", 25),
        Service::new("Senior", "30 mins", 25),
    ]
}
