use crate::{
    error::BookingError,
    types::{Appointment, NewAppointment},
};
use clap::ValueEnum;
use tokio_stream::wrappers::WatchStream;

/// What to do when a new appointment collides with an existing one on date and time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum DoubleBookingPolicy {
    /// Store both appointments.
    #[default]
    Allow,
    /// Refuse the second appointment with `BookingError::SlotTaken`.
    Reject,
}

pub trait AppointmentBackend: Clone + Send + Sync + 'static {
    /// Yields the full appointment list on subscription and after every change.
    fn appointment_stream(&self) -> WatchStream<Vec<Appointment>>;
    fn appointments(&self) -> Vec<Appointment>;
    fn add_appointment(&self, appointment: NewAppointment) -> Result<Appointment, BookingError>;
}
