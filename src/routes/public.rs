use rocket::{get, post, routes, State, http::Status};
use rocket::request::{FromRequest, Outcome, Request};
use rocket::serde::json::Json;
use mongodb::bson::oid::ObjectId;
use serde_json::Value;

use crate::booking::BookingService;
use crate::config::Config;
use crate::error::BookingError;
use crate::models::booking::{ConfirmPayload, ReservePayload};
use crate::routes::{respond, ApiResult};
use crate::utils::auth::AuthUser;
use crate::utils::razorpay::WebhookEvent;
use crate::utils::signature;

#[get("/events")]
pub async fn get_events(service: &State<BookingService>) -> ApiResult {
    let events = service.events().list_events().await?;
    Ok(respond(Status::Ok, "Events fetched", events))
}

#[get("/events/<id>")]
pub async fn get_event(service: &State<BookingService>, id: &str) -> ApiResult {
    let object_id = ObjectId::parse_str(id).map_err(|_| BookingError::InvalidInput("invalid event id".into()))?;
    let event = service
        .events()
        .find_event(object_id)
        .await?
        .ok_or(BookingError::EventNotFound)?;
    Ok(respond(Status::Ok, "Event fetched", event))
}

#[post("/bookings", data = "<payload>")]
pub async fn reserve(
    service: &State<BookingService>,
    user: AuthUser,
    payload: Json<ReservePayload>,
) -> ApiResult {
    let reservation = service.reserve(user.user_id, &payload).await?;
    Ok(respond(Status::Created, "Booking initiated", reservation))
}

#[post("/bookings/verify", data = "<payload>")]
pub async fn confirm(service: &State<BookingService>, payload: Json<ConfirmPayload>) -> ApiResult {
    let booking = service.confirm(&payload).await?;
    Ok(respond(Status::Ok, "Payment verified and booking confirmed", booking))
}

/// Value of the `X-Razorpay-Signature` header, if present.
pub struct WebhookSignature(Option<String>);

#[rocket::async_trait]
impl<'r> FromRequest<'r> for WebhookSignature {
    type Error = ();

    async fn from_request(request: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        let sig = request.headers().get_one("X-Razorpay-Signature").map(str::to_string);
        Outcome::Success(WebhookSignature(sig))
    }
}

#[post("/bookings/webhook", data = "<body>")]
pub async fn payment_webhook(
    service: &State<BookingService>,
    config: &State<Config>,
    webhook_sig: WebhookSignature,
    body: String,
) -> ApiResult {
    let secret = config
        .razorpay_webhook_secret
        .as_deref()
        .ok_or(BookingError::SignatureMismatch)?;
    let sig = webhook_sig.0.ok_or(BookingError::SignatureMismatch)?;
    if !signature::verify_webhook(body.as_bytes(), &sig, secret) {
        tracing::warn!("webhook signature mismatch");
        return Err(BookingError::SignatureMismatch);
    }

    let event: WebhookEvent = serde_json::from_str(&body)
        .map_err(|_| BookingError::InvalidInput("malformed webhook payload".into()))?;
    tracing::info!(event = %event.event, "payment webhook received");

    match event.event.as_str() {
        "payment.captured" | "order.paid" => {
            let (order_id, payment_id) = event
                .payment_ref()
                .ok_or_else(|| BookingError::InvalidInput("webhook has no payment".into()))?;
            // A capture the booking can no longer take is acknowledged so the
            // provider stops redelivering; the service logs it for a refund.
            match service.confirm_verified(order_id, payment_id).await {
                Ok(booking) => Ok(respond(Status::Ok, "Webhook processed", booking)),
                Err(BookingError::AlreadyFinalized(status)) => {
                    Ok(respond(Status::Ok, &format!("Booking already {status}"), Value::Null))
                }
                Err(e) => Err(e),
            }
        }
        "payment.failed" => {
            let (order_id, payment_id) = event
                .payment_ref()
                .ok_or_else(|| BookingError::InvalidInput("webhook has no payment".into()))?;
            let booking = service.record_failed_attempt(order_id, payment_id).await?;
            Ok(respond(Status::Ok, "Payment attempt failed", booking))
        }
        other => {
            tracing::debug!(event = other, "webhook event ignored");
            Ok(respond(Status::Ok, "Event ignored", Value::Null))
        }
    }
}

#[get("/bookings/scan/<token>")]
pub async fn scan(service: &State<BookingService>, token: &str) -> ApiResult {
    let ticket = service.redeem(token).await?;
    Ok(respond(Status::Ok, "QR verified", ticket))
}

pub fn routes() -> Vec<rocket::Route> {
    routes![get_events, get_event, reserve, confirm, payment_webhook, scan]
}
