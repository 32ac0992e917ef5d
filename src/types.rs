use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Appointment {
    pub id: Uuid,
    pub date: NaiveDate,
    pub time: String,
    pub service_id: String,
    pub client_name: String,
    pub email: String,
    pub phone: String,
    pub notes: Option<String>,
}

/// Appointment data as submitted by the booking form, before an id is assigned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewAppointment {
    pub date: NaiveDate,
    pub time: String,
    pub service_id: String,
    pub client_name: String,
    pub email: String,
    pub phone: String,
    pub notes: Option<String>,
}

impl NewAppointment {
    /// Assigns a time-ordered id.
    pub fn into_appointment(self) -> Appointment {
        Appointment {
            id: Uuid::now_v7(),
            date: self.date,
            time: self.time,
            service_id: self.service_id,
            client_name: self.client_name,
            email: self.email,
            phone: self.phone,
            notes: self.notes,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSlot {
    pub time: String,
    pub available: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Service {
    pub slug: String,
    pub title: String,
    pub description: String,
    pub benefits: Vec<String>,
    pub process_steps: Vec<String>,
}

/// Snapshot published by the booking manager after every change.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingState {
    pub selected_date: Option<NaiveDate>,
    pub selected_time: Option<String>,
    pub selected_service: Option<Service>,
    pub available_slots: Vec<TimeSlot>,
    pub loading: bool,
}
