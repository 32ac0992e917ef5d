use crate::{
    availability::BookingRules,
    backend::AppointmentBackend,
    booking_manager::BookingHandle,
    catalog::{redirect_target, ServiceCatalog},
    configuration::Configuration,
    error::BookingError,
    sessions::{BookingSessions, SESSION_HEADER},
    types::{Appointment, BookingState, NewAppointment, Service},
};
use axum::{
    extract::{Path, Request, State},
    http::{HeaderMap, StatusCode},
    middleware::{self, Next},
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{Local, NaiveDate};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::fs;
use tower_http::cors::{Any, CorsLayer};
use tracing::{debug, error, info, warn};
use uuid::Uuid;
use validator::Validate;

lazy_static! {
    static ref PHONE_REGEX: Regex = Regex::new(r"^\+?[0-9][0-9 ()\-]{5,19}$").unwrap();
}

#[derive(Clone)]
pub struct AppState<T: AppointmentBackend, C: Configuration> {
    sessions: BookingSessions<T>,
    backend: T,
    rules: Arc<BookingRules>,
    configuration: C,
    catalog: Arc<ServiceCatalog>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
struct BookingRequest {
    date: NaiveDate,
    time: String,
    service_id: String,
    #[validate(length(min = 1, max = 100))]
    client_name: String,
    #[validate(email)]
    email: String,
    #[validate(regex(path = *PHONE_REGEX))]
    phone: String,
    #[validate(length(max = 1000))]
    notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct SelectDateRequest {
    date: NaiveDate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct SelectTimeRequest {
    time: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct SelectServiceRequest {
    slug: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct DateAvailability {
    date: NaiveDate,
    available: bool,
}

/// Response carrying the booking session id the client has to send back.
type WithSession<R> = ([(&'static str, String); 1], R);

pub fn create_app<T: AppointmentBackend, C: Configuration>(backend: T, configuration: C) -> Router {
    let rules = Arc::new(configuration.booking_rules());
    let sessions = BookingSessions::new(
        backend.clone(),
        rules.clone(),
        configuration.slot_latency(),
        configuration.session_idle_timeout(),
    );
    let state = AppState {
        sessions,
        backend,
        rules,
        configuration,
        catalog: Arc::new(ServiceCatalog::default()),
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let public = Router::new()
        .route("/frontend", get(get_frontend::<T, C>))
        .route("/services", get(get_services::<T, C>))
        .route("/services/:slug", get(get_service::<T, C>))
        .route("/availability/:date", get(get_date_availability::<T, C>))
        .route("/booking", get(get_booking_state::<T, C>))
        .route("/booking/slots", get(get_settled_booking_state::<T, C>))
        .route("/booking/date", post(select_date::<T, C>))
        .route("/booking/time", post(select_time::<T, C>))
        .route("/booking/service", post(select_service::<T, C>))
        .route("/appointments", post(create_appointment::<T, C>));

    let admin = Router::new()
        .route("/admin/appointments", get(get_appointments::<T, C>))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            admin_auth::<T, C>,
        ));

    Router::new()
        .merge(public)
        .merge(admin)
        .with_state(state)
        .layer(middleware::from_fn(redirect_legacy_slugs))
        .layer(cors)
}

async fn admin_auth<T: AppointmentBackend, C: Configuration>(
    State(state): State<AppState<T, C>>,
    request: Request,
    next: Next,
) -> Result<Response, (StatusCode, String)> {
    if let Some(auth_header) = request.headers().get("x-admin-password") {
        if auth_header.to_str().unwrap_or("") != state.configuration.password() {
            warn!("Rejected admin request with wrong password");
            return Err((StatusCode::UNAUTHORIZED, "Unauthorized".to_string()));
        }
    } else {
        return Err((StatusCode::UNAUTHORIZED, "Missing credentials".to_string()));
    }
    Ok(next.run(request).await)
}

async fn redirect_legacy_slugs(request: Request, next: Next) -> Response {
    if let Some(target) = request
        .uri()
        .path()
        .strip_prefix("/services/")
        .and_then(redirect_target)
    {
        debug!(from = %request.uri(), to = target, "Redirecting retired service slug");
        return Redirect::permanent(&format!("/services/{target}")).into_response();
    }
    next.run(request).await
}

async fn get_frontend<T: AppointmentBackend, C: Configuration>(
    State(state): State<AppState<T, C>>,
) -> Result<Html<String>, (StatusCode, String)> {
    let path = state.configuration.frontend_path();

    match fs::read_to_string(&path).await {
        Ok(contents) => Ok(Html(contents.replace(
            "{{website_title}}",
            &state.configuration.website_title(),
        ))),
        Err(err) => {
            error!(?err, path = %path.display(), "Failed to read frontend file");
            let error_message = format!("Failed to read frontend file: {}", err);
            Err((StatusCode::INTERNAL_SERVER_ERROR, error_message))
        }
    }
}

async fn get_services<T: AppointmentBackend, C: Configuration>(
    State(state): State<AppState<T, C>>,
) -> Json<Vec<Service>> {
    Json(state.catalog.services().to_vec())
}

async fn get_service<T: AppointmentBackend, C: Configuration>(
    State(state): State<AppState<T, C>>,
    Path(slug): Path<String>,
) -> Result<Json<Service>, BookingError> {
    state
        .catalog
        .get(&slug)
        .cloned()
        .map(Json)
        .ok_or(BookingError::UnknownService(slug))
}

async fn get_date_availability<T: AppointmentBackend, C: Configuration>(
    State(state): State<AppState<T, C>>,
    Path(date): Path<NaiveDate>,
) -> Json<DateAvailability> {
    Json(DateAvailability {
        date,
        available: state.rules.is_date_available(
            date,
            Local::now().date_naive(),
            &state.backend.appointments(),
        ),
    })
}

fn session<T: AppointmentBackend, C: Configuration>(
    state: &AppState<T, C>,
    headers: &HeaderMap,
) -> (Uuid, BookingHandle<T>) {
    let id = headers
        .get(SESSION_HEADER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| Uuid::parse_str(value).ok());
    state.sessions.session(id)
}

fn with_session<R>(id: Uuid, response: R) -> WithSession<R> {
    ([(SESSION_HEADER, id.to_string())], response)
}

async fn get_booking_state<T: AppointmentBackend, C: Configuration>(
    State(state): State<AppState<T, C>>,
    headers: HeaderMap,
) -> WithSession<Json<BookingState>> {
    let (id, booking) = session(&state, &headers);
    with_session(id, Json(booking.state()))
}

async fn get_settled_booking_state<T: AppointmentBackend, C: Configuration>(
    State(state): State<AppState<T, C>>,
    headers: HeaderMap,
) -> Result<WithSession<Json<BookingState>>, BookingError> {
    let (id, booking) = session(&state, &headers);
    Ok(with_session(id, Json(booking.settled_state().await?)))
}

async fn select_date<T: AppointmentBackend, C: Configuration>(
    State(state): State<AppState<T, C>>,
    headers: HeaderMap,
    Json(request): Json<SelectDateRequest>,
) -> Result<WithSession<Json<BookingState>>, BookingError> {
    let (id, booking) = session(&state, &headers);
    booking.select_date(request.date).await?;
    Ok(with_session(id, Json(booking.state())))
}

async fn select_time<T: AppointmentBackend, C: Configuration>(
    State(state): State<AppState<T, C>>,
    headers: HeaderMap,
    Json(request): Json<SelectTimeRequest>,
) -> Result<WithSession<Json<BookingState>>, BookingError> {
    if !state.rules.is_known_label(&request.time) {
        return Err(BookingError::UnknownTimeLabel(request.time));
    }
    let (id, booking) = session(&state, &headers);
    booking.select_time(request.time).await?;
    Ok(with_session(id, Json(booking.state())))
}

async fn select_service<T: AppointmentBackend, C: Configuration>(
    State(state): State<AppState<T, C>>,
    headers: HeaderMap,
    Json(request): Json<SelectServiceRequest>,
) -> Result<WithSession<Json<BookingState>>, BookingError> {
    let service = state
        .catalog
        .resolve(&request.slug)
        .cloned()
        .ok_or(BookingError::UnknownService(request.slug))?;
    let (id, booking) = session(&state, &headers);
    booking.select_service(service).await?;
    Ok(with_session(id, Json(booking.state())))
}

async fn create_appointment<T: AppointmentBackend, C: Configuration>(
    State(state): State<AppState<T, C>>,
    headers: HeaderMap,
    Json(request): Json<BookingRequest>,
) -> Result<WithSession<Json<Appointment>>, BookingError> {
    request.validate()?;

    if !state.rules.is_known_label(&request.time) {
        return Err(BookingError::UnknownTimeLabel(request.time));
    }
    if !state
        .rules
        .is_within_window(request.date, Local::now().date_naive())
    {
        return Err(BookingError::InvalidRequest(format!(
            "{} can't be booked",
            request.date
        )));
    }
    let service_id = state
        .catalog
        .resolve(&request.service_id)
        .map(|service| service.slug.clone())
        .ok_or(BookingError::UnknownService(request.service_id))?;

    let (id, booking) = session(&state, &headers);
    let appointment = booking
        .add_appointment(NewAppointment {
            date: request.date,
            time: request.time,
            service_id,
            client_name: request.client_name,
            email: request.email,
            phone: request.phone,
            notes: request.notes,
        })
        .await?;

    info!(id = %appointment.id, session = %id, "Booking request accepted");
    Ok(with_session(id, Json(appointment)))
}

async fn get_appointments<T: AppointmentBackend, C: Configuration>(
    State(state): State<AppState<T, C>>,
) -> Json<Vec<Appointment>> {
    Json(state.backend.appointments())
}
