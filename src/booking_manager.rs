//! Single-writer owner of the booking selection and the derived time slots.
//!
//! All mutations travel as commands to one task. Slot lookups run in their
//! own task and carry the generation they were requested under; results from
//! an older generation are dropped.

use crate::{
    availability::{BookingRules, SlotScheduler},
    backend::AppointmentBackend,
    error::BookingError,
    types::{Appointment, BookingState, NewAppointment, Service, TimeSlot},
};
use chrono::{Local, NaiveDate};
use futures::StreamExt;
use std::{sync::Arc, time::Duration};
use tokio::{
    sync::{mpsc, oneshot, watch},
    task::JoinHandle,
};
use tokio_stream::wrappers::WatchStream;
use tracing::{debug, info};

enum Command {
    SelectDate {
        date: NaiveDate,
        reply: oneshot::Sender<()>,
    },
    SelectTime {
        time: String,
        reply: oneshot::Sender<()>,
    },
    SelectService {
        service: Service,
        reply: oneshot::Sender<()>,
    },
    AddAppointment {
        appointment: NewAppointment,
        reply: oneshot::Sender<Result<Appointment, BookingError>>,
    },
}

#[derive(Debug)]
struct SlotsComputed {
    generation: u64,
    slots: Vec<TimeSlot>,
}

pub struct BookingManager<T: AppointmentBackend> {
    backend: T,
    scheduler: SlotScheduler<T>,
    state: watch::Sender<BookingState>,
    generation: u64,
    in_flight: Option<JoinHandle<()>>,
    computed: mpsc::UnboundedSender<SlotsComputed>,
}

impl<T: AppointmentBackend> BookingManager<T> {
    /// Starts the manager task and returns a handle to it.
    pub fn spawn(backend: T, rules: Arc<BookingRules>, latency: Duration) -> BookingHandle<T> {
        let (command_sender, command_receiver) = mpsc::unbounded_channel();
        let (computed_sender, computed_receiver) = mpsc::unbounded_channel();
        let (state_sender, state_receiver) = watch::channel(BookingState::default());

        let manager = Self {
            backend: backend.clone(),
            scheduler: SlotScheduler::new(backend.clone(), rules.clone(), latency),
            state: state_sender,
            generation: 0,
            in_flight: None,
            computed: computed_sender,
        };
        tokio::spawn(manager.run(command_receiver, computed_receiver));

        BookingHandle {
            commands: command_sender,
            state: state_receiver,
            backend,
            rules,
        }
    }

    async fn run(
        mut self,
        mut commands: mpsc::UnboundedReceiver<Command>,
        mut computed: mpsc::UnboundedReceiver<SlotsComputed>,
    ) {
        let mut appointment_stream = self.backend.appointment_stream();
        info!("Booking manager started");

        loop {
            tokio::select! {
                command = commands.recv() => match command {
                    Some(command) => self.handle_command(command),
                    None => break,
                },
                Some(result) = computed.recv() => self.apply_slots(result),
                Some(_) = appointment_stream.next() => self.appointments_changed(),
            }
        }

        if let Some(task) = self.in_flight.take() {
            task.abort();
        }
        info!("Booking manager stopped");
    }

    fn handle_command(&mut self, command: Command) {
        match command {
            Command::SelectDate { date, reply } => {
                debug!(%date, "Date selected");
                self.state.send_modify(|state| {
                    state.selected_date = Some(date);
                    state.selected_time = None;
                });
                self.recompute_slots(date);
                let _ = reply.send(());
            }
            Command::SelectTime { time, reply } => {
                debug!(%time, "Time selected");
                self.state
                    .send_modify(|state| state.selected_time = Some(time));
                let _ = reply.send(());
            }
            Command::SelectService { service, reply } => {
                debug!(slug = %service.slug, "Service selected");
                self.state
                    .send_modify(|state| state.selected_service = Some(service));
                let _ = reply.send(());
            }
            Command::AddAppointment { appointment, reply } => {
                // The backend publishes the new list, which triggers the recomputation.
                let _ = reply.send(self.backend.add_appointment(appointment));
            }
        }
    }

    fn appointments_changed(&mut self) {
        let selected_date = self.state.borrow().selected_date;
        if let Some(date) = selected_date {
            self.recompute_slots(date);
        }
    }

    fn recompute_slots(&mut self, date: NaiveDate) {
        self.generation += 1;
        if let Some(task) = self.in_flight.take() {
            task.abort();
        }
        self.state.send_modify(|state| state.loading = true);

        let generation = self.generation;
        let scheduler = self.scheduler.clone();
        let computed = self.computed.clone();
        self.in_flight = Some(tokio::spawn(async move {
            let slots = scheduler.time_slots(date).await;
            let _ = computed.send(SlotsComputed { generation, slots });
        }));
    }

    fn apply_slots(&mut self, result: SlotsComputed) {
        if result.generation != self.generation {
            debug!(
                stale = result.generation,
                current = self.generation,
                "Discarding superseded slot computation"
            );
            return;
        }

        self.in_flight = None;
        self.state.send_modify(|state| {
            state.available_slots = result.slots;
            state.loading = false;
        });
    }
}

/// Cloneable access to a running `BookingManager`.
#[derive(Clone)]
pub struct BookingHandle<T: AppointmentBackend> {
    commands: mpsc::UnboundedSender<Command>,
    state: watch::Receiver<BookingState>,
    backend: T,
    rules: Arc<BookingRules>,
}

impl<T: AppointmentBackend> BookingHandle<T> {
    async fn request<R>(&self, command: impl FnOnce(oneshot::Sender<R>) -> Command) -> Result<R, BookingError> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(command(reply))
            .map_err(|_| BookingError::ManagerStopped)?;
        response.await.map_err(|_| BookingError::ManagerStopped)
    }

    /// Selects `date` and clears the selected time.
    pub async fn select_date(&self, date: NaiveDate) -> Result<(), BookingError> {
        self.request(|reply| Command::SelectDate { date, reply })
            .await
    }

    pub async fn select_time(&self, time: impl Into<String>) -> Result<(), BookingError> {
        let time = time.into();
        self.request(|reply| Command::SelectTime { time, reply })
            .await
    }

    pub async fn select_service(&self, service: Service) -> Result<(), BookingError> {
        self.request(|reply| Command::SelectService { service, reply })
            .await
    }

    pub async fn add_appointment(
        &self,
        appointment: NewAppointment,
    ) -> Result<Appointment, BookingError> {
        self.request(|reply| Command::AddAppointment { appointment, reply })
            .await?
    }

    pub fn is_date_available(&self, date: NaiveDate) -> bool {
        self.rules.is_date_available(
            date,
            Local::now().date_naive(),
            &self.backend.appointments(),
        )
    }

    pub fn appointments(&self) -> Vec<Appointment> {
        self.backend.appointments()
    }

    pub fn rules(&self) -> &BookingRules {
        &self.rules
    }

    pub fn state(&self) -> BookingState {
        self.state.borrow().clone()
    }

    pub fn state_stream(&self) -> WatchStream<BookingState> {
        WatchStream::new(self.state.clone())
    }

    /// Waits until no slot computation is pending.
    pub async fn settled_state(&self) -> Result<BookingState, BookingError> {
        let mut state = self.state.clone();
        let settled = state
            .wait_for(|state| !state.loading)
            .await
            .map_err(|_| BookingError::ManagerStopped)?;
        Ok(settled.clone())
    }

    pub fn selected_date(&self) -> Option<NaiveDate> {
        self.state.borrow().selected_date
    }

    pub fn selected_time(&self) -> Option<String> {
        self.state.borrow().selected_time.clone()
    }

    pub fn selected_service(&self) -> Option<Service> {
        self.state.borrow().selected_service.clone()
    }

    pub fn available_slots(&self) -> Vec<TimeSlot> {
        self.state.borrow().available_slots.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.state.borrow().loading
    }
}
