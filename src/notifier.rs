use crate::availability::local_offset;
use crate::configuration::Configuration;
use crate::types::Booking;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

const TELEGRAM_API: &str = "https://api.telegram.org";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Outbound notification channel for freshly created bookings.
/// Delivery is fire-and-forget; a failure never affects the booking.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn booking_created(&self, booking: Booking) -> Result<(), String>;
}

/// Posts a formatted message to a Telegram chat via the Bot API.
pub struct TelegramNotifier {
    client: reqwest::Client,
    bot_token: String,
    chat_id: String,
}

impl TelegramNotifier {
    pub fn new(bot_token: String, chat_id: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("failed to build the Telegram HTTP client");
        Self {
            client,
            bot_token,
            chat_id,
        }
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn booking_created(&self, booking: Booking) -> Result<(), String> {
        let message = format_message(&booking);
        let url = format!("{TELEGRAM_API}/bot{}/sendMessage", self.bot_token);
        let params = [
            ("chat_id", self.chat_id.as_str()),
            ("text", message.as_str()),
            ("parse_mode", "HTML"),
        ];

        let response = self
            .client
            .post(&url)
            .form(&params)
            .send()
            .await
            .map_err(|err| format!("telegram request failed: {err}"))?;

        if !response.status().is_success() {
            return Err(format!("telegram responded with {}", response.status()));
        }
        Ok(())
    }
}

/// Used when no Telegram credentials are configured.
#[derive(Debug, Clone, Default)]
pub struct NoopNotifier;

#[async_trait]
impl Notifier for NoopNotifier {
    async fn booking_created(&self, _booking: Booking) -> Result<(), String> {
        Ok(())
    }
}

pub fn notifier_from_configuration<C: Configuration>(configuration: &C) -> Arc<dyn Notifier> {
    match (
        configuration.telegram_bot_token(),
        configuration.telegram_chat_id(),
    ) {
        (Some(bot_token), Some(chat_id)) => {
            info!("Telegram notifications enabled");
            Arc::new(TelegramNotifier::new(bot_token, chat_id))
        }
        _ => {
            warn!("Telegram credentials missing. Booking notifications are disabled.");
            Arc::new(NoopNotifier)
        }
    }
}

/// HTML layout understood by Telegram's `parse_mode=HTML`. Only the
/// free-text note is escaped; the other fields are validated to a safe
/// alphabet before they get here.
fn format_message(booking: &Booking) -> String {
    let mut message = String::from("🆕 <b>New booking request</b>\n\n");
    message.push_str(&format!(
        "📅 <b>Date:</b> {}\n",
        booking.date.format("%d.%m.%Y")
    ));
    message.push_str(&format!("🕐 <b>Time:</b> {}\n", booking.time));
    message.push_str(&format!("👤 <b>Name:</b> {}\n", booking.name));
    message.push_str(&format!("📱 <b>Phone:</b> {}\n", booking.phone));
    message.push_str(&format!("📧 <b>Email:</b> {}\n", booking.email));
    if !booking.problem.is_empty() {
        message.push_str(&format!(
            "📝 <b>Note:</b> {}\n",
            escape_html(&booking.problem)
        ));
    }

    let created = booking.created_at.with_timezone(&local_offset());
    message.push_str(&format!(
        "\n⏰ <b>Created:</b> {}",
        created.format("%d.%m.%Y %H:%M")
    ));
    message
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
