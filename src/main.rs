use crate::{
    configuration::Configuration, configuration_handler::ConfigurationHandler, http::create_app,
    local_appointments::LocalAppointments,
};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

mod availability;
mod backend;
mod booking_manager;
mod catalog;
mod configuration;
mod configuration_handler;
mod error;
mod http;
mod local_appointments;
mod sessions;
#[cfg(test)]
mod testutils;
mod types;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    println!("##################");
    println!("# Physio Booking #");
    println!("##################");

    let configuration = ConfigurationHandler::parse_arguments();

    let address = format!("0.0.0.0:{}", configuration.port());
    let listener = match tokio::net::TcpListener::bind(&address).await {
        Ok(listener) => listener,
        Err(err) => {
            error!(?err, "Failed to bind {address}");
            std::process::exit(1);
        }
    };
    println!("Accessible at:\n{}", address);

    let backend = LocalAppointments::new(
        configuration.double_booking_policy(),
        Arc::new(configuration.booking_rules()),
    );
    if configuration.insert_examples() {
        backend.insert_example_appointments();
        info!("Inserted example appointments");
    }

    let app = create_app(backend, configuration);

    if let Err(err) = axum::serve(listener, app).await {
        error!(?err, "Server stopped");
    }
}
