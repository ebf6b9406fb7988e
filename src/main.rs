use std::sync::Arc;
use std::time::Duration;

use crate::{
    configuration::Configuration, configuration_handler::ConfigurationHandler, http::create_app,
    local_bookings::LocalBookings, notifier::notifier_from_configuration, session::SessionStore,
    store::JsonStore,
};
use tokio::time::sleep;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod availability;
mod backend;
mod configuration;
mod configuration_handler;
mod error;
mod http;
mod local_bookings;
mod notifier;
mod session;
mod store;
#[cfg(test)]
mod testutils;
mod types;
mod validation;

const SESSION_CLEANUP_INTERVAL: Duration = Duration::from_secs(3600);

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    println!("###############");
    println!("# Booking API #");
    println!("###############");

    let configuration = ConfigurationHandler::parse_arguments();
    if configuration.admin_password_hash().is_empty() {
        warn!("ADMIN_PASSWORD_HASH is not set. Admin login is disabled.");
    }

    let store = JsonStore::new(configuration.data_file());
    let bookings = LocalBookings::new(store);
    let sessions = Arc::new(SessionStore::new(configuration.session_ttl_hours()));
    let notifier = notifier_from_configuration(&configuration);

    let cleanup_sessions = Arc::clone(&sessions);
    tokio::spawn(async move {
        loop {
            sleep(SESSION_CLEANUP_INTERVAL).await;
            let removed = cleanup_sessions.cleanup_expired();
            if removed > 0 {
                info!("Removed {removed} expired admin sessions");
            }
        }
    });

    let address = format!("0.0.0.0:{}", configuration.port());
    println!("Accessible at:\n{address}");
    let listener = tokio::net::TcpListener::bind(address).await.unwrap();

    let app = create_app(bookings, configuration, sessions, notifier);
    axum::serve(listener, app).await.unwrap();
}
