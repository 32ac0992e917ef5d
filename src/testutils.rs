use crate::{
    backend::AppointmentBackend,
    error::BookingError,
    types::{Appointment, NewAppointment},
};
use chrono::NaiveDate;
use futures::StreamExt;
use std::{
    sync::{
        atomic::{AtomicBool, AtomicU64, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};
use tokio::{sync::watch, time::timeout};
use tokio_stream::wrappers::WatchStream;

pub struct MockAppointmentBackendInner {
    pub success: AtomicBool,
    pub calls_to_appointment_stream: AtomicU64,
    pub calls_to_appointments: AtomicU64,
    pub calls_to_add_appointment: AtomicU64,
    pub appointments: Mutex<Vec<Appointment>>,
    sender: watch::Sender<Vec<Appointment>>,
}

#[derive(Clone)]
pub struct MockAppointmentBackend(pub Arc<MockAppointmentBackendInner>);

impl MockAppointmentBackendInner {
    fn new() -> Self {
        let (sender, _) = watch::channel(vec![]);
        Self {
            success: AtomicBool::new(true),
            calls_to_appointment_stream: AtomicU64::default(),
            calls_to_appointments: AtomicU64::default(),
            calls_to_add_appointment: AtomicU64::default(),
            appointments: Mutex::default(),
            sender,
        }
    }
}

impl MockAppointmentBackend {
    pub fn new() -> Self {
        Self(Arc::new(MockAppointmentBackendInner::new()))
    }

    /// Replaces the stored appointments and notifies subscribers.
    pub fn set_appointments(&self, appointments: Vec<Appointment>) {
        *self.0.appointments.lock().unwrap() = appointments.clone();
        self.0.sender.send_replace(appointments);
    }
}

impl AppointmentBackend for MockAppointmentBackend {
    fn appointment_stream(&self) -> WatchStream<Vec<Appointment>> {
        self.0
            .calls_to_appointment_stream
            .fetch_add(1, Ordering::SeqCst);
        WatchStream::new(self.0.sender.subscribe())
    }

    fn appointments(&self) -> Vec<Appointment> {
        self.0.calls_to_appointments.fetch_add(1, Ordering::SeqCst);
        self.0.appointments.lock().unwrap().clone()
    }

    fn add_appointment(&self, appointment: NewAppointment) -> Result<Appointment, BookingError> {
        self.0.calls_to_add_appointment.fetch_add(1, Ordering::SeqCst);
        match self.0.success.load(Ordering::SeqCst) {
            true => Ok(appointment.into_appointment()),
            false => Err(BookingError::SlotTaken {
                date: appointment.date,
                time: appointment.time,
            }),
        }
    }
}

pub fn new_appointment(date: NaiveDate, time: &str) -> NewAppointment {
    NewAppointment {
        date,
        time: time.into(),
        service_id: "manual-therapy".into(),
        client_name: "Stefan".into(),
        email: "stefan@example.com".into(),
        phone: "+43 660 1234567".into(),
        notes: Some("Lower back pain".into()),
    }
}

pub fn example_appointment(date: NaiveDate, time: &str) -> Appointment {
    new_appointment(date, time).into_appointment()
}

pub async fn read_from_appointment_stream(
    stream: &mut WatchStream<Vec<Appointment>>,
) -> Vec<Appointment> {
    timeout(Duration::from_secs(1), stream.next())
        .await
        .expect("No appointments received in time")
        .expect("Appointment stream closed")
}
