use std::env;

use anyhow::{Context, Result};

pub const DEFAULT_CURRENCY: &str = "INR";
pub const DEFAULT_RAZORPAY_API_BASE: &str = "https://api.razorpay.com/v1";

#[derive(Debug, Clone)]
pub struct Config {
    pub mongodb_uri: String,
    pub jwt_secret: String,
    pub admin_email: Option<String>,
    pub admin_password: Option<String>,
    pub razorpay_key_id: String,
    pub razorpay_key_secret: String,
    pub razorpay_webhook_secret: Option<String>,
    pub razorpay_api_base: String,
    pub payment_currency: String,
    pub resend_api_key: Option<String>,
    pub resend_from_email: Option<String>,
    pub log_filter: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Config {
            mongodb_uri: required("MONGODB_URI")?,
            jwt_secret: required("JWT_SECRET")?,
            admin_email: optional("ADMIN_EMAIL"),
            admin_password: optional("ADMIN_PASSWORD"),
            razorpay_key_id: required("RAZORPAY_KEY_ID")?,
            razorpay_key_secret: required("RAZORPAY_KEY_SECRET")?,
            razorpay_webhook_secret: optional("RAZORPAY_WEBHOOK_SECRET"),
            razorpay_api_base: optional("RAZORPAY_API_BASE")
                .unwrap_or_else(|| DEFAULT_RAZORPAY_API_BASE.to_string()),
            payment_currency: optional("PAYMENT_CURRENCY").unwrap_or_else(|| DEFAULT_CURRENCY.to_string()),
            resend_api_key: optional("RESEND_API_KEY"),
            resend_from_email: optional("RESEND_FROM_EMAIL"),
            log_filter: optional("LOG_FILTER").unwrap_or_else(|| "info".to_string()),
        })
    }

    /// Last path segment of the connection string, ignoring any query string.
    pub fn database_name(&self) -> &str {
        let without_query = self.mongodb_uri.split('?').next().unwrap_or_default();
        match without_query.rsplit_once('/') {
            Some((head, name)) if !name.is_empty() && !head.ends_with('/') => name,
            _ => "ticketing_db",
        }
    }
}

fn required(name: &str) -> Result<String> {
    env::var(name).with_context(|| format!("{name} must be set"))
}

fn optional(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}
