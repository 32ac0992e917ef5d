use crate::{availability::BookingRules, backend::DoubleBookingPolicy};
use std::{path::PathBuf, time::Duration};

pub trait Configuration: Clone + Send + Sync + 'static {
    fn website_title(&self) -> String;
    fn password(&self) -> String;
    fn frontend_path(&self) -> PathBuf;
    fn port(&self) -> String;
    fn slot_latency(&self) -> Duration;
    fn booking_rules(&self) -> BookingRules;
    fn double_booking_policy(&self) -> DoubleBookingPolicy;
    fn insert_examples(&self) -> bool;
    fn session_idle_timeout(&self) -> Duration;
}
