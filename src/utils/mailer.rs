use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;

use crate::config::Config;
use crate::models::{booking::Booking, event::Event, user::User};

/// Sends the post-payment confirmation. Callers treat failures as non-fatal.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn booking_confirmed(&self, user: &User, booking: &Booking, event: &Event) -> Result<()>;
}

/// Used when no mail provider is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopNotifier;

#[async_trait]
impl Notifier for NoopNotifier {
    async fn booking_confirmed(&self, user: &User, booking: &Booking, _event: &Event) -> Result<()> {
        tracing::debug!(
            booking_id = ?booking.id,
            to = %user.email,
            "mail disabled, skipping booking confirmation"
        );
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct ResendMailer {
    http: Client,
    api_key: String,
    from_email: String,
}

impl ResendMailer {
    pub fn new(api_key: &str, from_email: &str) -> Self {
        ResendMailer {
            http: Client::new(),
            api_key: api_key.to_string(),
            from_email: from_email.to_string(),
        }
    }

    /// `None` unless both the API key and the sender address are set.
    pub fn from_config(config: &Config) -> Option<Self> {
        match (&config.resend_api_key, &config.resend_from_email) {
            (Some(key), Some(from)) => Some(Self::new(key, from)),
            _ => None,
        }
    }
}

fn confirmation_body(user: &User, booking: &Booking, event: &Event) -> String {
    format!(
        "Hello {},\n\nYour booking for {} is confirmed.\n\nCategory: {}\nQuantity: {}\nAmount paid: {} {}\nTicket code: {}\n\nShow this code at the entrance.",
        user.name,
        event.title,
        booking.ticket_category,
        booking.quantity,
        format_minor_units(booking.amount),
        booking.currency,
        booking.redemption_token.as_deref().unwrap_or("-"),
    )
}

/// HTML part: the text body plus the ticket's QR image when one is stored.
fn confirmation_html(user: &User, booking: &Booking, event: &Event) -> String {
    let text = confirmation_body(user, booking, event).replace('\n', "<br>");
    match booking.qr_code.as_deref() {
        Some(qr) => format!(r#"<p>{text}</p><p><img src="{qr}" alt="Ticket QR code" width="240" height="240"></p>"#),
        None => format!("<p>{text}</p>"),
    }
}

fn format_minor_units(amount: i64) -> String {
    let sign = if amount < 0 { "-" } else { "" };
    let abs = amount.unsigned_abs();
    format!("{sign}{}.{:02}", abs / 100, abs % 100)
}

#[async_trait]
impl Notifier for ResendMailer {
    async fn booking_confirmed(&self, user: &User, booking: &Booking, event: &Event) -> Result<()> {
        let resend_payload = json!({
            "from": self.from_email,
            "to": [user.email.clone()],
            "subject": format!("Your tickets for {}", event.title),
            "text": confirmation_body(user, booking, event),
            "html": confirmation_html(user, booking, event)
        });

        let response = self
            .http
            .post("https://api.resend.com/emails")
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&resend_payload)
            .send()
            .await?;

        if response.status().is_success() {
            Ok(())
        } else {
            let err_text = response.text().await.unwrap_or_else(|_| "Unknown error".to_string());
            Err(anyhow::anyhow!("Resend API error: {err_text}"))
        }
    }
}
