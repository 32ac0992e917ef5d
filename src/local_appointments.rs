use crate::{
    availability::BookingRules,
    backend::{AppointmentBackend, DoubleBookingPolicy},
    error::BookingError,
    types::{Appointment, NewAppointment},
};
use chrono::{Duration, Local};
use std::sync::{Arc, Mutex};
use tokio::sync::watch::{self, Sender};
use tokio_stream::wrappers::WatchStream;
use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct LocalAppointments {
    appointments: Arc<Mutex<Vec<Appointment>>>,
    sender: Sender<Vec<Appointment>>,
    policy: DoubleBookingPolicy,
    rules: Arc<BookingRules>,
}

impl Default for LocalAppointments {
    fn default() -> Self {
        Self::new(DoubleBookingPolicy::default(), Arc::new(BookingRules::default()))
    }
}

impl LocalAppointments {
    pub fn new(policy: DoubleBookingPolicy, rules: Arc<BookingRules>) -> Self {
        let (sender, _) = watch::channel(vec![]);
        Self {
            appointments: Arc::new(Mutex::default()),
            sender,
            policy,
            rules,
        }
    }

    /// Seeds a handful of mock bookings over the next days.
    pub fn insert_example_appointments(&self) {
        let today = Local::now().date_naive();
        let examples = [
            (1, "9:00 AM", "manual-therapy", "Emma Clarke"),
            (1, "3:00 PM", "sports-injury-rehabilitation", "Liam Patel"),
            (2, "11:00 AM", "post-surgical-rehabilitation", "Sofia Romero"),
            (4, "10:00 AM", "dry-needling", "Noah Becker"),
        ];

        for (offset, time, service_id, client_name) in examples {
            let appointment = NewAppointment {
                date: today + Duration::days(offset),
                time: time.into(),
                service_id: service_id.into(),
                client_name: client_name.into(),
                email: format!(
                    "{}@example.com",
                    client_name.to_lowercase().replace(' ', ".")
                ),
                phone: "+44 20 7946 0000".into(),
                notes: None,
            };
            if let Err(err) = self.add_appointment(appointment) {
                warn!(%err, "Failed to insert example appointment");
            }
        }
    }

    fn sorted(&self, appointments: &[Appointment]) -> Vec<Appointment> {
        let mut appointments = appointments.to_vec();
        appointments.sort_by_key(|appointment| {
            (appointment.date, self.rules.label_position(&appointment.time))
        });
        appointments
    }
}

impl AppointmentBackend for LocalAppointments {
    fn appointment_stream(&self) -> WatchStream<Vec<Appointment>> {
        WatchStream::new(self.sender.subscribe())
    }

    fn appointments(&self) -> Vec<Appointment> {
        self.sorted(&self.appointments.lock().unwrap())
    }

    fn add_appointment(&self, appointment: NewAppointment) -> Result<Appointment, BookingError> {
        let appointment = {
            let mut appointments = self.appointments.lock().unwrap();
            let collides = appointments
                .iter()
                .any(|existing| existing.date == appointment.date && existing.time == appointment.time);

            if collides {
                match self.policy {
                    DoubleBookingPolicy::Reject => {
                        let err = BookingError::SlotTaken {
                            date: appointment.date,
                            time: appointment.time,
                        };
                        warn!(%err, "Rejected colliding appointment");
                        return Err(err);
                    }
                    DoubleBookingPolicy::Allow => {
                        warn!(date = %appointment.date, time = %appointment.time, "Storing colliding appointment");
                    }
                }
            }

            let appointment = appointment.into_appointment();
            appointments.push(appointment.clone());
            // Published under the lock so the last list sent is the newest one.
            // `send_replace` stores it even while nobody is subscribed.
            self.sender.send_replace(self.sorted(&appointments));
            appointment
        };

        info!(id = %appointment.id, date = %appointment.date, time = %appointment.time, "Appointment added");
        Ok(appointment)
    }
}
