use std::time::Duration;

use actix_web::{http::header, middleware::from_fn, rt, web, HttpResponse};
use askama::Template;
use chrono::{Local, NaiveDate, NaiveDateTime};
use serde::Deserialize;
use tokio::time;

use crate::{
    auth::{require_login, CurrentSession},
    booking::{BookingEffect, BookingMessage, BookingSession, BookingStep},
    error::AppResult,
    filters,
    models::{barber_roster, service_catalog, Appointment, Service, BARBER_PLACEHOLDER_IMAGE},
    progress::{breadcrumbs, Crumb},
    session::SessionStore,
    state::AppState,
    templates::render,
};

#[derive(Clone, Debug)]
struct BarberCard {
    name: String,
    availability: String,
    image: &'static str,
    selected: bool,
}

#[derive(Clone, Debug)]
struct ServiceOption {
    name: String,
    duration: String,
    price: u32,
    selected: bool,
}

#[derive(Clone, Debug)]
struct SlotView {
    id: u32,
    time: String,
    available: bool,
    selected: bool,
}

#[derive(Clone, Debug)]
struct AppointmentView {
    barber_name: String,
    barber_image: &'static str,
    when: String,
    total: u32,
}

#[derive(Template)]
#[template(path = "barber_selection.html")]
struct BarberSelectionTemplate {
    crumbs: Vec<Crumb>,
    barbers: Vec<BarberCard>,
}

#[derive(Template)]
#[template(path = "barber_services.html")]
struct BarberServicesTemplate {
    crumbs: Vec<Crumb>,
    barber_name: String,
    barber_image: &'static str,
    primary: Option<Service>,
    options: Vec<ServiceOption>,
    chosen: Vec<Service>,
    total: u32,
    can_continue: bool,
}

#[derive(Template)]
#[template(path = "choose_time.html")]
struct ChooseTimeTemplate {
    crumbs: Vec<Crumb>,
    confirmed: bool,
    barber_name: String,
    barber_image: &'static str,
    services: Vec<Service>,
    total: u32,
    date_value: String,
    slots: Vec<SlotView>,
    summary: String,
    can_submit: bool,
    submitting: bool,
    appointments: Vec<AppointmentView>,
}

#[derive(Deserialize)]
struct BarberForm {
    barber: String,
}

#[derive(Deserialize)]
struct ServiceForm {
    service: String,
}

#[derive(Deserialize)]
struct DateForm {
    date: NaiveDate,
}

#[derive(Deserialize)]
struct SlotForm {
    slot: u32,
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/barberselection")
            .wrap(from_fn(require_login))
            .route(web::get().to(show_barbers))
            .route(web::post().to(choose_barber)),
    )
    .service(
        web::resource("/barberservices")
            .wrap(from_fn(require_login))
            .route(web::get().to(show_services))
            .route(web::post().to(toggle_service)),
    )
    .service(
        web::resource("/barberservices/continue")
            .wrap(from_fn(require_login))
            .route(web::post().to(choose_time)),
    )
    .service(
        web::resource("/time")
            .wrap(from_fn(require_login))
            .route(web::get().to(show_time)),
    )
    .service(
        web::resource("/time/date")
            .wrap(from_fn(require_login))
            .route(web::post().to(pick_date)),
    )
    .service(
        web::resource("/time/slot")
            .wrap(from_fn(require_login))
            .route(web::post().to(pick_slot)),
    )
    .service(
        web::resource("/time/confirm")
            .wrap(from_fn(require_login))
            .route(web::post().to(confirm_booking)),
    )
    .service(
        web::resource("/time/home")
            .wrap(from_fn(require_login))
            .route(web::post().to(start_over)),
    );
}

fn now() -> NaiveDateTime {
    Local::now().naive_local()
}

fn redirect(location: &str) -> HttpResponse {
    HttpResponse::SeeOther()
        .append_header((header::LOCATION, location))
        .finish()
}

/// Applies `message` to the caller's wizard. A refused message bounces the
/// browser back to whichever step the wizard is on.
fn dispatch(
    state: &AppState,
    current: &CurrentSession,
    message: BookingMessage,
) -> Result<BookingEffect, HttpResponse> {
    let outcome = state.sessions.with(&current.id, |session| {
        let result = session.booking.apply(message);
        (result, session.booking.step())
    });
    match outcome {
        None => Err(redirect("/login")),
        Some((Ok(effect), _)) => Ok(effect),
        Some((Err(err), step)) => {
            log::debug!("Ignoring wizard action from {}: {err}", current.username);
            Err(redirect(step.path()))
        }
    }
}

/// Moves the wizard onto the page being requested, or says where to go instead.
fn enter(
    state: &AppState,
    current: &CurrentSession,
    target: BookingStep,
) -> Result<(BookingSession, Vec<Appointment>), HttpResponse> {
    let entered = state.sessions.with(&current.id, |session| {
        if session.booking.step().path() != target.path() {
            if let Err(err) = session.booking.apply(BookingMessage::JumpTo(target)) {
                log::debug!("{} cannot open {target:?}: {err}", current.username);
                return Err(session.booking.step());
            }
        }
        Ok((session.booking.clone(), session.appointments.clone()))
    });
    match entered {
        None => Err(redirect("/login")),
        Some(Ok(snapshot)) => Ok(snapshot),
        Some(Err(step)) => Err(redirect(step.path())),
    }
}

async fn show_barbers(
    state: web::Data<AppState>,
    current: web::ReqData<CurrentSession>,
) -> AppResult<HttpResponse> {
    let (booking, _) = match enter(&state, &current, BookingStep::SelectingBarber) {
        Ok(snapshot) => snapshot,
        Err(response) => return Ok(response),
    };

    let chosen = booking.selection().barber.as_ref().map(|b| b.name.as_str());
    let barbers = barber_roster(now())
        .into_iter()
        .map(|barber| BarberCard {
            selected: chosen == Some(barber.name.as_str()),
            name: barber.name,
            availability: barber.availability,
            image: barber.image,
        })
        .collect();

    render(BarberSelectionTemplate {
        crumbs: breadcrumbs(&booking),
        barbers,
    })
}

async fn choose_barber(
    state: web::Data<AppState>,
    current: web::ReqData<CurrentSession>,
    form: web::Form<BarberForm>,
) -> AppResult<HttpResponse> {
    let Some(barber) = barber_roster(now())
        .into_iter()
        .find(|barber| barber.name == form.barber)
    else {
        return Ok(redirect(BookingStep::SelectingBarber.path()));
    };
    let name = barber.name.clone();

    if let Err(response) = dispatch(&state, &current, BookingMessage::ChooseBarber(barber)) {
        return Ok(response);
    }
    log::info!("{} picked {name}", current.username);

    time::sleep(state.config.selection_delay).await;
    Ok(redirect(BookingStep::SelectingServices.path()))
}

async fn show_services(
    state: web::Data<AppState>,
    current: web::ReqData<CurrentSession>,
) -> AppResult<HttpResponse> {
    let (booking, _) = match enter(&state, &current, BookingStep::SelectingServices) {
        Ok(snapshot) => snapshot,
        Err(response) => return Ok(response),
    };
    let selection = booking.selection();
    let primary = selection.primary.clone();

    let options = service_catalog()
        .into_iter()
        .filter(|service| primary.as_ref().map_or(true, |p| p.name != service.name))
        .map(|service| ServiceOption {
            selected: selection.services.iter().any(|s| s.name == service.name),
            name: service.name,
            duration: service.duration,
            price: service.price,
        })
        .collect();

    let (barber_name, barber_image) = selection
        .barber
        .as_ref()
        .map(|b| (b.name.clone(), b.image))
        .unwrap_or((String::new(), BARBER_PLACEHOLDER_IMAGE));

    render(BarberServicesTemplate {
        crumbs: breadcrumbs(&booking),
        barber_name,
        barber_image,
        primary,
        options,
        chosen: selection.services.clone(),
        total: selection.total(),
        can_continue: selection.has_services(),
    })
}

async fn toggle_service(
    state: web::Data<AppState>,
    current: web::ReqData<CurrentSession>,
    form: web::Form<ServiceForm>,
) -> AppResult<HttpResponse> {
    let Some(service) = service_catalog()
        .into_iter()
        .find(|service| service.name == form.service)
    else {
        return Ok(redirect(BookingStep::SelectingServices.path()));
    };

    Ok(match dispatch(&state, &current, BookingMessage::ToggleService(service)) {
        Ok(_) => redirect(BookingStep::SelectingServices.path()),
        Err(response) => response,
    })
}

async fn choose_time(
    state: web::Data<AppState>,
    current: web::ReqData<CurrentSession>,
) -> AppResult<HttpResponse> {
    Ok(match dispatch(&state, &current, BookingMessage::ChooseTime) {
        Ok(_) => redirect(BookingStep::SelectingTime.path()),
        Err(response) => response,
    })
}

async fn show_time(
    state: web::Data<AppState>,
    current: web::ReqData<CurrentSession>,
) -> AppResult<HttpResponse> {
    let (booking, appointments) = match enter(&state, &current, BookingStep::SelectingTime) {
        Ok(snapshot) => snapshot,
        Err(response) => return Ok(response),
    };
    let selection = booking.selection();
    let held = selection.slot.as_ref().map(|slot| slot.id);

    let slots = booking
        .time_slots()
        .into_iter()
        .map(|slot| SlotView {
            selected: held == Some(slot.id),
            id: slot.id,
            time: slot.time,
            available: slot.available,
        })
        .collect();

    let summary = match (selection.date, selection.slot.as_ref()) {
        (Some(date), Some(slot)) => format!("{} at {}", date.format("%A, %B %-d"), slot.time),
        _ => String::new(),
    };

    let (barber_name, barber_image) = selection
        .barber
        .as_ref()
        .map(|b| (b.name.clone(), b.image))
        .unwrap_or((String::new(), BARBER_PLACEHOLDER_IMAGE));

    let appointments = appointments
        .iter()
        .map(|appointment| AppointmentView {
            barber_name: appointment.barber.name.clone(),
            barber_image: appointment.barber.image,
            when: appointment.when_label(),
            total: appointment.total,
        })
        .collect();

    render(ChooseTimeTemplate {
        crumbs: breadcrumbs(&booking),
        confirmed: booking.step() == BookingStep::Confirmed,
        barber_name,
        barber_image,
        services: selection.services.clone(),
        total: selection.total(),
        date_value: selection
            .date
            .map(|date| date.format("%Y-%m-%d").to_string())
            .unwrap_or_default(),
        slots,
        summary,
        can_submit: booking.can_submit(),
        submitting: booking.is_submitting(),
        appointments,
    })
}

async fn pick_date(
    state: web::Data<AppState>,
    current: web::ReqData<CurrentSession>,
    form: web::Form<DateForm>,
) -> AppResult<HttpResponse> {
    Ok(match dispatch(&state, &current, BookingMessage::PickDate(form.date)) {
        Ok(_) => redirect(BookingStep::SelectingTime.path()),
        Err(response) => response,
    })
}

async fn pick_slot(
    state: web::Data<AppState>,
    current: web::ReqData<CurrentSession>,
    form: web::Form<SlotForm>,
) -> AppResult<HttpResponse> {
    Ok(match dispatch(&state, &current, BookingMessage::PickSlot(form.slot)) {
        Ok(_) => redirect(BookingStep::SelectingTime.path()),
        Err(response) => response,
    })
}

async fn confirm_booking(
    state: web::Data<AppState>,
    current: web::ReqData<CurrentSession>,
) -> AppResult<HttpResponse> {
    if let Err(response) = dispatch(&state, &current, BookingMessage::Submit) {
        return Ok(response);
    }

    // Detached so a dropped request cannot leave the session stuck submitting.
    let submission = rt::spawn(complete_submission(
        state.sessions.clone(),
        current.id.clone(),
        current.username.clone(),
        state.config.submit_delay,
    ));

    match submission.await {
        Ok(true) => Ok(redirect(BookingStep::Confirmed.path())),
        Ok(false) => Ok(redirect("/login")),
        Err(err) => {
            log::error!("Booking task for {} failed: {err}", current.username);
            Ok(redirect(BookingStep::Confirmed.path()))
        }
    }
}

/// Finishes a pending submission after the simulated delay. Returns `false`
/// when the session vanished in the meantime.
async fn complete_submission(
    sessions: SessionStore,
    id: String,
    username: String,
    delay: Duration,
) -> bool {
    time::sleep(delay).await;

    let completed = sessions.with(&id, |session| {
        let outcome = session.booking.apply(BookingMessage::SubmissionComplete);
        if let Ok(BookingEffect::Booked(appointment)) = &outcome {
            session.appointments.push(appointment.clone());
        }
        outcome
    });

    match completed {
        None => return false,
        Some(Ok(BookingEffect::Booked(appointment))) => log::info!(
            "{username} booked {} on {} (${})",
            appointment.barber.name,
            appointment.when_label(),
            appointment.total
        ),
        Some(Ok(_)) => {}
        Some(Err(err)) => log::warn!("Booking for {username} did not complete: {err}"),
    }
    true
}

async fn start_over(
    state: web::Data<AppState>,
    current: web::ReqData<CurrentSession>,
) -> AppResult<HttpResponse> {
    Ok(match dispatch(&state, &current, BookingMessage::StartOver) {
        Ok(_) => redirect("/home"),
        Err(response) => response,
    })
}
