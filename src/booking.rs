use chrono::NaiveDate;
use thiserror::Error;

use crate::{
    models::{Appointment, BarberRef, Service, TimeSlot},
    slots::generate_time_slots,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum BookingStep {
    #[default]
    SelectingBarber,
    SelectingServices,
    SelectingTime,
    Confirmed,
}

impl BookingStep {
    pub fn path(self) -> &'static str {
        match self {
            Self::SelectingBarber => "/barberselection",
            Self::SelectingServices => "/barberservices",
            Self::SelectingTime | Self::Confirmed => "/time",
        }
    }
}

/// What the customer has picked so far in the current wizard run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookingSelection {
    pub barber: Option<BarberRef>,
    pub primary: Option<Service>,
    pub services: Vec<Service>,
    pub date: Option<NaiveDate>,
    pub slot: Option<TimeSlot>,
}

impl BookingSelection {
    fn for_barber(barber: BarberRef) -> Self {
        Self {
            barber: Some(barber),
            ..Self::default()
        }
    }

    pub fn total(&self) -> u32 {
        self.services.iter().map(|service| service.price).sum()
    }

    pub fn has_services(&self) -> bool {
        !self.services.is_empty()
    }

    /// Whether every prerequisite for entering `step` has been captured.
    pub fn satisfies(&self, step: BookingStep) -> bool {
        match step {
            BookingStep::SelectingBarber => true,
            BookingStep::SelectingServices => self.barber.is_some(),
            BookingStep::SelectingTime => self.barber.is_some() && self.has_services(),
            BookingStep::Confirmed => {
                self.satisfies(BookingStep::SelectingTime)
                    && self.date.is_some()
                    && self.slot.is_some()
            }
        }
    }

    fn toggle_service(&mut self, service: Service) {
        match &self.primary {
            None => {
                self.services = vec![service.clone()];
                self.primary = Some(service);
            }
            Some(primary) if primary.name == service.name => {
                self.primary = None;
                self.services.clear();
            }
            Some(_) => {
                if let Some(index) = self.services.iter().position(|s| s.name == service.name) {
                    self.services.remove(index);
                } else {
                    self.services.push(service);
                }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BookingMessage {
    ChooseBarber(BarberRef),
    ToggleService(Service),
    ChooseTime,
    PickDate(NaiveDate),
    PickSlot(u32),
    Submit,
    SubmissionComplete,
    JumpTo(BookingStep),
    StartOver,
}

impl BookingMessage {
    fn name(&self) -> &'static str {
        match self {
            Self::ChooseBarber(_) => "choose barber",
            Self::ToggleService(_) => "toggle service",
            Self::ChooseTime => "choose a time",
            Self::PickDate(_) => "pick date",
            Self::PickSlot(_) => "pick slot",
            Self::Submit => "confirm booking",
            Self::SubmissionComplete => "complete submission",
            Self::JumpTo(_) => "jump",
            Self::StartOver => "start over",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BookingEffect {
    Updated,
    Submitting,
    Booked(Appointment),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BookingError {
    #[error("cannot reach {0:?} before completing the earlier steps")]
    IncompleteSelection(BookingStep),
    #[error("a booking is already being submitted")]
    SubmissionPending,
    #[error("{action} is not allowed while {step:?}")]
    InvalidTransition {
        step: BookingStep,
        action: &'static str,
    },
    #[error("slot {0} is not available")]
    UnavailableSlot(u32),
}

/// One customer's walk through the wizard. Every change goes through
/// [`BookingSession::apply`], and a rejected message leaves the session
/// untouched.
#[derive(Debug, Clone, Default)]
pub struct BookingSession {
    step: BookingStep,
    selection: BookingSelection,
    submitting: bool,
}

impl BookingSession {
    pub fn step(&self) -> BookingStep {
        self.step
    }

    pub fn selection(&self) -> &BookingSelection {
        &self.selection
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    pub fn can_submit(&self) -> bool {
        self.step == BookingStep::SelectingTime
            && !self.submitting
            && self.selection.satisfies(BookingStep::Confirmed)
    }

    /// Slots for the chosen barber on the chosen date, regenerated on every call.
    pub fn time_slots(&self) -> Vec<TimeSlot> {
        let name = self
            .selection
            .barber
            .as_ref()
            .map(|barber| barber.name.as_str())
            .unwrap_or_default();
        generate_time_slots(name, self.selection.date)
    }

    pub fn apply(&mut self, message: BookingMessage) -> Result<BookingEffect, BookingError> {
        if self.submitting && message != BookingMessage::SubmissionComplete {
            return Err(BookingError::SubmissionPending);
        }

        match message {
            BookingMessage::ChooseBarber(barber) => {
                self.expect_step(BookingStep::SelectingBarber, "choose barber")?;
                self.selection = BookingSelection::for_barber(barber);
                self.step = BookingStep::SelectingServices;
            }
            BookingMessage::ToggleService(service) => {
                self.expect_step(BookingStep::SelectingServices, "toggle service")?;
                self.selection.toggle_service(service);
            }
            BookingMessage::ChooseTime => {
                self.expect_step(BookingStep::SelectingServices, "choose a time")?;
                if !self.selection.satisfies(BookingStep::SelectingTime) {
                    return Err(BookingError::IncompleteSelection(BookingStep::SelectingTime));
                }
                self.selection.date = None;
                self.selection.slot = None;
                self.step = BookingStep::SelectingTime;
            }
            BookingMessage::PickDate(date) => {
                self.expect_step(BookingStep::SelectingTime, "pick date")?;
                self.selection.date = Some(date);
                self.refresh_selected_slot();
            }
            BookingMessage::PickSlot(id) => {
                self.expect_step(BookingStep::SelectingTime, "pick slot")?;
                let slot = self
                    .time_slots()
                    .into_iter()
                    .find(|slot| slot.id == id && slot.available)
                    .ok_or(BookingError::UnavailableSlot(id))?;
                self.selection.slot = Some(slot);
            }
            BookingMessage::Submit => {
                self.expect_step(BookingStep::SelectingTime, "confirm booking")?;
                if !self.selection.satisfies(BookingStep::Confirmed) {
                    return Err(BookingError::IncompleteSelection(BookingStep::Confirmed));
                }
                self.submitting = true;
                return Ok(BookingEffect::Submitting);
            }
            BookingMessage::SubmissionComplete => {
                if !self.submitting {
                    return Err(self.invalid(&message));
                }
                self.submitting = false;
                let appointment = self
                    .appointment()
                    .ok_or(BookingError::IncompleteSelection(BookingStep::Confirmed))?;
                self.step = BookingStep::Confirmed;
                return Ok(BookingEffect::Booked(appointment));
            }
            BookingMessage::JumpTo(target) => {
                if self.step == BookingStep::Confirmed || target == BookingStep::Confirmed {
                    return Err(self.invalid(&message));
                }
                if !self.selection.satisfies(target) {
                    return Err(BookingError::IncompleteSelection(target));
                }
                self.step = target;
            }
            BookingMessage::StartOver => {
                *self = Self::default();
            }
        }
        Ok(BookingEffect::Updated)
    }

    fn expect_step(&self, step: BookingStep, action: &'static str) -> Result<(), BookingError> {
        if self.step == step {
            Ok(())
        } else {
            Err(BookingError::InvalidTransition {
                step: self.step,
                action,
            })
        }
    }

    fn invalid(&self, message: &BookingMessage) -> BookingError {
        BookingError::InvalidTransition {
            step: self.step,
            action: message.name(),
        }
    }

    // A new date can make the held slot unavailable.
    fn refresh_selected_slot(&mut self) {
        let Some(held) = self.selection.slot.as_ref().map(|slot| slot.id) else {
            return;
        };
        self.selection.slot = self
            .time_slots()
            .into_iter()
            .find(|slot| slot.id == held && slot.available);
    }

    fn appointment(&self) -> Option<Appointment> {
        let selection = &self.selection;
        Some(Appointment {
            barber: selection.barber.clone()?,
            services: selection.services.clone(),
            date: selection.date?,
            time: selection.slot.as_ref()?.time.clone(),
            total: selection.total(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{service_catalog, BARBER_PLACEHOLDER_IMAGE};

    fn barber(name: &str) -> BarberRef {
        BarberRef {
            name: name.to_string(),
            availability: "Available Mon, Oct 19 at 9:00 AM".to_string(),
            image: BARBER_PLACEHOLDER_IMAGE,
        }
    }

    fn service(name: &str) -> Service {
        service_catalog()
            .into_iter()
            .find(|s| s.name == name)
            .unwrap()
    }

    fn friday() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 16).unwrap()
    }

    fn at_time_step() -> BookingSession {
        let mut session = BookingSession::default();
        session.apply(BookingMessage::ChooseBarber(barber("Tony F."))).unwrap();
        session.apply(BookingMessage::ToggleService(service("Haircut"))).unwrap();
        session.apply(BookingMessage::ToggleService(service("Razor Fade"))).unwrap();
        session.apply(BookingMessage::ChooseTime).unwrap();
        session
    }

    fn names(session: &BookingSession) -> Vec<&str> {
        session
            .selection()
            .services
            .iter()
            .map(|s| s.name.as_str())
            .collect()
    }

    #[test]
    fn walks_through_to_a_confirmed_appointment() {
        let mut session = at_time_step();
        session.apply(BookingMessage::PickDate(friday())).unwrap();
        session.apply(BookingMessage::PickSlot(1)).unwrap();
        assert!(session.can_submit());

        assert_eq!(session.apply(BookingMessage::Submit), Ok(BookingEffect::Submitting));
        assert!(session.is_submitting());

        let Ok(BookingEffect::Booked(appointment)) =
            session.apply(BookingMessage::SubmissionComplete)
        else {
            panic!("expected a booked appointment");
        };
        assert_eq!(session.step(), BookingStep::Confirmed);
        assert!(!session.is_submitting());
        assert_eq!(appointment.barber.name, "Tony F.");
        assert_eq!(appointment.time, "9:00 AM");
        assert_eq!(appointment.date, friday());
        assert_eq!(appointment.total, 75);
    }

    #[test]
    fn choosing_primary_twice_clears_everything() {
        let mut session = BookingSession::default();
        session.apply(BookingMessage::ChooseBarber(barber("Sam L."))).unwrap();
        session.apply(BookingMessage::ToggleService(service("Haircut"))).unwrap();
        session.apply(BookingMessage::ToggleService(service("Senior"))).unwrap();
        session.apply(BookingMessage::ToggleService(service("Haircut"))).unwrap();
        assert!(session.selection().services.is_empty());
        assert!(session.selection().primary.is_none());
    }

    #[test]
    fn non_primary_toggle_is_reversible() {
        let mut session = BookingSession::default();
        session.apply(BookingMessage::ChooseBarber(barber("Sam L."))).unwrap();
        session.apply(BookingMessage::ToggleService(service("Haircut"))).unwrap();
        session.apply(BookingMessage::ToggleService(service("Senior"))).unwrap();
        let before = session.selection().clone();

        session.apply(BookingMessage::ToggleService(service("Razor Fade"))).unwrap();
        assert_eq!(names(&session), ["Haircut", "Senior", "Razor Fade"]);
        session.apply(BookingMessage::ToggleService(service("Razor Fade"))).unwrap();
        assert_eq!(session.selection(), &before);
    }

    #[test]
    fn choose_time_requires_a_service() {
        let mut session = BookingSession::default();
        session.apply(BookingMessage::ChooseBarber(barber("Sam L."))).unwrap();
        assert_eq!(
            session.apply(BookingMessage::ChooseTime),
            Err(BookingError::IncompleteSelection(BookingStep::SelectingTime))
        );
        assert_eq!(session.step(), BookingStep::SelectingServices);
    }

    #[test]
    fn submit_requires_date_and_slot() {
        let mut session = at_time_step();
        assert!(!session.can_submit());
        assert_eq!(
            session.apply(BookingMessage::Submit),
            Err(BookingError::IncompleteSelection(BookingStep::Confirmed))
        );
        session.apply(BookingMessage::PickDate(friday())).unwrap();
        assert!(session.apply(BookingMessage::Submit).is_err());
        assert!(!session.is_submitting());
    }

    #[test]
    fn resubmission_is_refused_while_pending() {
        let mut session = at_time_step();
        session.apply(BookingMessage::PickDate(friday())).unwrap();
        session.apply(BookingMessage::PickSlot(1)).unwrap();
        session.apply(BookingMessage::Submit).unwrap();

        assert_eq!(session.apply(BookingMessage::Submit), Err(BookingError::SubmissionPending));
        assert_eq!(
            session.apply(BookingMessage::PickSlot(3)),
            Err(BookingError::SubmissionPending)
        );
        assert_eq!(session.apply(BookingMessage::StartOver), Err(BookingError::SubmissionPending));
        assert!(session.apply(BookingMessage::SubmissionComplete).is_ok());
        assert!(session.apply(BookingMessage::SubmissionComplete).is_err());
    }

    #[test]
    fn unavailable_slots_cannot_be_picked() {
        let mut session = at_time_step();
        // Tony F. is always busy in slot 2
        assert_eq!(
            session.apply(BookingMessage::PickSlot(2)),
            Err(BookingError::UnavailableSlot(2))
        );
        assert_eq!(
            session.apply(BookingMessage::PickSlot(18)),
            Err(BookingError::UnavailableSlot(18))
        );
        assert!(session.selection().slot.is_none());
    }

    #[test]
    fn peak_date_drops_a_held_slot_that_became_busy() {
        let mut session = at_time_step();
        let monday = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();
        session.apply(BookingMessage::PickDate(monday)).unwrap();
        session.apply(BookingMessage::PickSlot(9)).unwrap();
        assert_eq!(session.selection().slot.as_ref().map(|s| s.id), Some(9));

        // Tony F.'s slot 9 is taken on Fridays
        session.apply(BookingMessage::PickDate(friday())).unwrap();
        assert!(session.selection().slot.is_none());
    }

    #[test]
    fn total_is_fixed_at_submission() {
        let mut catalog = service_catalog();
        let mut session = BookingSession::default();
        session.apply(BookingMessage::ChooseBarber(barber("David J."))).unwrap();
        session.apply(BookingMessage::ToggleService(catalog[0].clone())).unwrap();
        session.apply(BookingMessage::ToggleService(catalog[4].clone())).unwrap();
        session.apply(BookingMessage::ChooseTime).unwrap();
        session.apply(BookingMessage::PickDate(friday())).unwrap();
        session.apply(BookingMessage::PickSlot(1)).unwrap();
        session.apply(BookingMessage::Submit).unwrap();
        let Ok(BookingEffect::Booked(appointment)) =
            session.apply(BookingMessage::SubmissionComplete)
        else {
            panic!("expected a booked appointment");
        };

        for service in &mut catalog {
            service.price *= 2;
        }
        assert_eq!(appointment.total, 60);
        assert_eq!(session.selection().total(), 60);
    }

    #[test]
    fn jumps_only_backwards_or_to_completed_steps() {
        let mut session = BookingSession::default();
        assert_eq!(
            session.apply(BookingMessage::JumpTo(BookingStep::SelectingServices)),
            Err(BookingError::IncompleteSelection(BookingStep::SelectingServices))
        );

        let mut session = at_time_step();
        session
            .apply(BookingMessage::JumpTo(BookingStep::SelectingServices))
            .unwrap();
        assert_eq!(names(&session), ["Haircut", "Razor Fade"]);
        session
            .apply(BookingMessage::JumpTo(BookingStep::SelectingTime))
            .unwrap();
        assert!(session
            .apply(BookingMessage::JumpTo(BookingStep::Confirmed))
            .is_err());
    }

    #[test]
    fn choosing_a_barber_again_resets_downstream_choices() {
        let mut session = at_time_step();
        session
            .apply(BookingMessage::JumpTo(BookingStep::SelectingBarber))
            .unwrap();
        session.apply(BookingMessage::ChooseBarber(barber("Sam L."))).unwrap();
        assert_eq!(session.step(), BookingStep::SelectingServices);
        assert!(session.selection().services.is_empty());
    }

    #[test]
    fn confirmed_session_is_frozen_until_start_over() {
        let mut session = at_time_step();
        session.apply(BookingMessage::PickDate(friday())).unwrap();
        session.apply(BookingMessage::PickSlot(1)).unwrap();
        session.apply(BookingMessage::Submit).unwrap();
        session.apply(BookingMessage::SubmissionComplete).unwrap();

        assert!(session
            .apply(BookingMessage::JumpTo(BookingStep::SelectingBarber))
            .is_err());
        assert!(session.apply(BookingMessage::PickSlot(3)).is_err());

        session.apply(BookingMessage::StartOver).unwrap();
        assert_eq!(session.step(), BookingStep::SelectingBarber);
        assert_eq!(session.selection(), &BookingSelection::default());
    }

    #[test]
    fn actions_outside_their_step_are_rejected() {
        let mut session = BookingSession::default();
        assert_eq!(
            session.apply(BookingMessage::ToggleService(service("Haircut"))),
            Err(BookingError::InvalidTransition {
                step: BookingStep::SelectingBarber,
                action: "toggle service",
            })
        );
        assert!(session.apply(BookingMessage::PickDate(friday())).is_err());
    }
}
