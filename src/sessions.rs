//! One booking manager per visitor.
//!
//! The selection is a visitor's transient state, so each session id gets its
//! own `BookingManager`. Sessions idle for longer than the configured timeout
//! are dropped on the next access, which stops their manager task.

use crate::{
    availability::BookingRules,
    backend::AppointmentBackend,
    booking_manager::{BookingHandle, BookingManager},
};
use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
    time::{Duration, Instant},
};
use tracing::{debug, info};
use uuid::Uuid;

pub const SESSION_HEADER: &str = "x-booking-session";

struct Session<T: AppointmentBackend> {
    handle: BookingHandle<T>,
    last_used: Instant,
}

#[derive(Clone)]
pub struct BookingSessions<T: AppointmentBackend> {
    backend: T,
    rules: Arc<BookingRules>,
    latency: Duration,
    idle_timeout: Duration,
    sessions: Arc<Mutex<HashMap<Uuid, Session<T>>>>,
}

impl<T: AppointmentBackend> BookingSessions<T> {
    pub fn new(
        backend: T,
        rules: Arc<BookingRules>,
        latency: Duration,
        idle_timeout: Duration,
    ) -> Self {
        Self {
            backend,
            rules,
            latency,
            idle_timeout,
            sessions: Arc::default(),
        }
    }

    /// Returns the manager of session `id`, or starts a new session if `id`
    /// is missing, unknown or expired.
    pub fn session(&self, id: Option<Uuid>) -> (Uuid, BookingHandle<T>) {
        let now = Instant::now();
        let mut sessions = self.sessions.lock().unwrap();

        let before = sessions.len();
        sessions.retain(|_, session| now.duration_since(session.last_used) < self.idle_timeout);
        if sessions.len() < before {
            debug!(expired = before - sessions.len(), "Dropped idle booking sessions");
        }

        if let Some(id) = id {
            if let Some(session) = sessions.get_mut(&id) {
                session.last_used = now;
                return (id, session.handle.clone());
            }
        }

        let id = Uuid::new_v4();
        let handle = BookingManager::spawn(self.backend.clone(), self.rules.clone(), self.latency);
        sessions.insert(
            id,
            Session {
                handle: handle.clone(),
                last_used: now,
            },
        );
        info!(%id, active = sessions.len(), "Started booking session");
        (id, handle)
    }

    pub fn len(&self) -> usize {
        self.sessions.lock().unwrap().len()
    }
}
