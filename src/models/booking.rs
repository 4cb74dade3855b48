use serde::{Deserialize, Serialize};
use mongodb::bson::oid::ObjectId;
use chrono::{DateTime, Utc};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub user_id: ObjectId,
    pub event_id: ObjectId,
    pub ticket_category: String,
    pub quantity: i64,
    /// `unit_price * quantity` at reservation time, in minor currency units.
    pub amount: i64,
    pub currency: String,
    pub payment_status: PaymentStatus,
    pub provider_order_id: String,
    #[serde(default)]
    pub provider_payment_id: Option<String>,
    #[serde(default)]
    pub redemption_token: Option<String>,
    /// The redemption token rendered as a QR image data URL. Set with the token.
    #[serde(default)]
    pub qr_code: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub paid_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Failed,
}

impl PaymentStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, PaymentStatus::Pending)
    }

    /// Only `pending -> paid` and `pending -> failed` exist.
    pub fn can_transition_to(self, next: PaymentStatus) -> bool {
        matches!(
            (self, next),
            (PaymentStatus::Pending, PaymentStatus::Paid) | (PaymentStatus::Pending, PaymentStatus::Failed)
        )
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentStatus::Pending => write!(f, "pending"),
            PaymentStatus::Paid => write!(f, "paid"),
            PaymentStatus::Failed => write!(f, "failed"),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ReservePayload {
    pub event_id: String,
    pub ticket_category: String,
    pub quantity: i64,
}

/// Fields the client relays back from the payment provider's checkout.
#[derive(Debug, Deserialize)]
pub struct ConfirmPayload {
    pub order_id: String,
    pub payment_id: String,
    pub signature: String,
}
