use crate::{
    backend::AppointmentBackend,
    types::{Appointment, TimeSlot},
};
use chrono::{Datelike, Days, NaiveDate, Weekday};
use std::{collections::HashSet, sync::Arc, time};
use tokio::time::sleep;
use tracing::debug;

pub const DAILY_TIME_LABELS: [&str; 8] = [
    "9:00 AM", "10:00 AM", "11:00 AM", "12:00 PM", "2:00 PM", "3:00 PM", "4:00 PM", "5:00 PM",
];
pub const BOOKING_HORIZON_DAYS: i64 = 60;
pub const CLOSED_DAY: Weekday = Weekday::Sun;
pub const DEFAULT_SLOT_LATENCY: time::Duration = time::Duration::from_millis(500);

/// Opening rules of the practice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookingRules {
    pub daily_labels: Vec<String>,
    pub horizon_days: i64,
    pub closed_day: Weekday,
}

impl Default for BookingRules {
    fn default() -> Self {
        Self {
            daily_labels: DAILY_TIME_LABELS.iter().map(|label| label.to_string()).collect(),
            horizon_days: BOOKING_HORIZON_DAYS,
            closed_day: CLOSED_DAY,
        }
    }
}

impl BookingRules {
    /// Open day between today and the end of the booking horizon, ignoring bookings.
    pub fn is_within_window(&self, date: NaiveDate, today: NaiveDate) -> bool {
        let Ok(horizon_days) = u64::try_from(self.horizon_days) else {
            return false;
        };
        // A horizon past the calendar's end leaves the window open-ended.
        let within_horizon = today
            .checked_add_days(Days::new(horizon_days))
            .map_or(true, |last_day| date <= last_day);

        date >= today && within_horizon && date.weekday() != self.closed_day
    }

    pub fn is_date_available(
        &self,
        date: NaiveDate,
        today: NaiveDate,
        appointments: &[Appointment],
    ) -> bool {
        if !self.is_within_window(date, today) {
            return false;
        }

        let booked = booked_labels(date, appointments);
        !self
            .daily_labels
            .iter()
            .all(|label| booked.contains(label.as_str()))
    }

    /// Daily labels in canonical order, each marked by whether it is still free on `date`.
    pub fn time_slots(&self, date: NaiveDate, appointments: &[Appointment]) -> Vec<TimeSlot> {
        let booked = booked_labels(date, appointments);
        self.daily_labels
            .iter()
            .map(|label| TimeSlot {
                time: label.clone(),
                available: !booked.contains(label.as_str()),
            })
            .collect()
    }

    pub fn is_known_label(&self, label: &str) -> bool {
        self.daily_labels.iter().any(|known| known == label)
    }

    /// Position of `label` in the daily order, unknown labels sort last.
    pub fn label_position(&self, label: &str) -> usize {
        self.daily_labels
            .iter()
            .position(|known| known == label)
            .unwrap_or(self.daily_labels.len())
    }
}

fn booked_labels(date: NaiveDate, appointments: &[Appointment]) -> HashSet<&str> {
    appointments
        .iter()
        .filter(|appointment| appointment.date == date)
        .map(|appointment| appointment.time.as_str())
        .collect()
}

/// Availability lookup with the latency of a remote scheduling service.
#[derive(Debug, Clone)]
pub struct SlotScheduler<T: AppointmentBackend> {
    backend: T,
    rules: Arc<BookingRules>,
    latency: time::Duration,
}

impl<T: AppointmentBackend> SlotScheduler<T> {
    pub fn new(backend: T, rules: Arc<BookingRules>, latency: time::Duration) -> Self {
        Self {
            backend,
            rules,
            latency,
        }
    }

    pub async fn time_slots(&self, date: NaiveDate) -> Vec<TimeSlot> {
        sleep(self.latency).await;
        let slots = self.rules.time_slots(date, &self.backend.appointments());
        debug!(%date, free = slots.iter().filter(|slot| slot.available).count(), "Computed time slots");
        slots
    }
}
