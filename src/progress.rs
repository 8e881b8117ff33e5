use crate::booking::{BookingSession, BookingStep};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Crumb {
    pub label: &'static str,
    pub path: &'static str,
    pub active: bool,
    pub clickable: bool,
}

const CRUMBS: [(&str, BookingStep); 4] = [
    ("Professional", BookingStep::SelectingBarber),
    ("Service", BookingStep::SelectingServices),
    ("Time", BookingStep::SelectingTime),
    ("Done", BookingStep::Confirmed),
];

/// Read-only progress view. Nothing is clickable once the booking is confirmed.
pub fn breadcrumbs(session: &BookingSession) -> Vec<Crumb> {
    let current = session.step();
    let frozen = current == BookingStep::Confirmed || session.is_submitting();
    CRUMBS
        .iter()
        .map(|&(label, step)| Crumb {
            label,
            path: step.path(),
            active: step == current,
            clickable: !frozen
                && step != BookingStep::Confirmed
                && session.selection().satisfies(step),
        })
        .collect()
}
