use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::NaiveDate;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BookingError {
    #[error("Timeslot {time} on {date} is already booked")]
    SlotTaken { date: NaiveDate, time: String },

    #[error("Unknown service: {0}")]
    UnknownService(String),

    #[error("Unknown time label: {0}")]
    UnknownTimeLabel(String),

    #[error("Invalid booking request: {0}")]
    InvalidRequest(String),

    #[error("Booking manager is no longer running")]
    ManagerStopped,
}

impl From<validator::ValidationErrors> for BookingError {
    fn from(errors: validator::ValidationErrors) -> Self {
        BookingError::InvalidRequest(errors.to_string())
    }
}

impl IntoResponse for BookingError {
    fn into_response(self) -> Response {
        let status = match self {
            BookingError::SlotTaken { .. } => StatusCode::CONFLICT,
            BookingError::UnknownService(_) => StatusCode::NOT_FOUND,
            BookingError::UnknownTimeLabel(_) | BookingError::InvalidRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            BookingError::ManagerStopped => StatusCode::INTERNAL_SERVER_ERROR,
        };

        (status, self.to_string()).into_response()
    }
}
