use crate::{
    availability::{BookingRules, BOOKING_HORIZON_DAYS, DEFAULT_SLOT_LATENCY},
    backend::DoubleBookingPolicy,
    configuration::Configuration,
};
use chrono::Weekday;
use clap::Parser;
use std::{path::PathBuf, time::Duration};
use tracing::debug;

const MAX_HORIZON_DAYS: i64 = 3650;

#[derive(Debug, Clone, Parser)]
#[command(version, about = "Appointment booking service for a physiotherapy practice")]
pub struct ConfigurationHandler {
    /// Title shown on the booking page
    #[arg(long, env = "WEBSITE_TITLE", default_value = "Physiotherapy Booking")]
    website_title: String,

    /// Password expected in the `x-admin-password` header
    #[arg(long, env = "ADMIN_PASSWORD")]
    password: String,

    /// Booking page served under /frontend
    #[arg(long, env = "FRONTEND_PATH", default_value = "frontend/index.html")]
    frontend_path: PathBuf,

    #[arg(long, env = "BOOKING_PORT", default_value = "3000")]
    port: String,

    /// Delay of a slot lookup in milliseconds
    #[arg(long, env = "SLOT_LATENCY_MS", default_value_t = DEFAULT_SLOT_LATENCY.as_millis() as u64)]
    slot_latency_ms: u64,

    /// How many days ahead appointments can be booked
    #[arg(
        long,
        env = "HORIZON_DAYS",
        default_value_t = BOOKING_HORIZON_DAYS,
        value_parser = clap::value_parser!(i64).range(0..=MAX_HORIZON_DAYS)
    )]
    horizon_days: i64,

    /// Weekday on which the practice is closed
    #[arg(long, env = "CLOSED_DAY", default_value = "sun")]
    closed_day: Weekday,

    /// Whether two appointments may share date and time
    #[arg(long, env = "DOUBLE_BOOKING", value_enum, default_value_t = DoubleBookingPolicy::Allow)]
    double_booking: DoubleBookingPolicy,

    /// Start without the example appointments
    #[arg(long, env = "WITHOUT_EXAMPLES")]
    without_examples: bool,

    /// Seconds after which an unused booking session is dropped
    #[arg(long, env = "SESSION_IDLE_SECS", default_value_t = 1800)]
    session_idle_secs: u64,
}

impl ConfigurationHandler {
    /// Reads `.env` (if present), the environment and the command line.
    pub fn parse_arguments() -> Self {
        if let Err(err) = dotenvy::dotenv() {
            debug!(?err, "No .env file loaded");
        }
        Self::parse()
    }
}

impl Configuration for ConfigurationHandler {
    fn website_title(&self) -> String {
        self.website_title.clone()
    }

    fn password(&self) -> String {
        self.password.clone()
    }

    fn frontend_path(&self) -> PathBuf {
        self.frontend_path.clone()
    }

    fn port(&self) -> String {
        self.port.clone()
    }

    fn slot_latency(&self) -> Duration {
        Duration::from_millis(self.slot_latency_ms)
    }

    fn booking_rules(&self) -> BookingRules {
        BookingRules {
            horizon_days: self.horizon_days,
            closed_day: self.closed_day,
            ..BookingRules::default()
        }
    }

    fn double_booking_policy(&self) -> DoubleBookingPolicy {
        self.double_booking
    }

    fn insert_examples(&self) -> bool {
        !self.without_examples
    }

    fn session_idle_timeout(&self) -> Duration {
        Duration::from_secs(self.session_idle_secs)
    }
}
