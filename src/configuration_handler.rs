use crate::configuration::Configuration;
use clap::Parser;
use std::env;
use std::path::PathBuf;

/// Command line arguments. Every value can also come from the
/// environment (`PORT`, `DATA_FILE`, `ADMIN_PASSWORD_HASH`,
/// `TELEGRAM_BOT_TOKEN`, `TELEGRAM_CHAT_ID`, `SESSION_TTL_HOURS`);
/// an argument wins over its environment counterpart.
#[derive(Parser, Clone, Debug)]
#[command(name = "booking-api", about = "Appointment booking backend")]
pub struct ConfigurationHandler {
    /// Port the HTTP server listens on
    #[arg(long)]
    port: Option<String>,

    /// Path of the JSON data file
    #[arg(long)]
    data_file: Option<PathBuf>,

    /// SHA-256 hex digest of the admin password
    #[arg(long)]
    admin_password_hash: Option<String>,

    /// Admin session lifetime in hours
    #[arg(long)]
    session_ttl_hours: Option<i64>,
}

impl ConfigurationHandler {
    pub fn parse_arguments() -> Self {
        Self::parse()
    }
}

fn env_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|value| !value.is_empty())
}

impl Configuration for ConfigurationHandler {
    fn port(&self) -> String {
        self.port
            .clone()
            .or_else(|| env_var("PORT"))
            .unwrap_or_else(|| "3000".to_string())
    }

    fn data_file(&self) -> PathBuf {
        self.data_file
            .clone()
            .or_else(|| env_var("DATA_FILE").map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from("data/bookings.json"))
    }

    fn admin_password_hash(&self) -> String {
        self.admin_password_hash
            .clone()
            .or_else(|| env_var("ADMIN_PASSWORD_HASH"))
            .unwrap_or_default()
    }

    fn telegram_bot_token(&self) -> Option<String> {
        env_var("TELEGRAM_BOT_TOKEN")
    }

    fn telegram_chat_id(&self) -> Option<String> {
        env_var("TELEGRAM_CHAT_ID")
    }

    fn session_ttl_hours(&self) -> i64 {
        self.session_ttl_hours
            .or_else(|| env_var("SESSION_TTL_HOURS").and_then(|value| value.parse().ok()))
            .unwrap_or(24)
    }
}
