use rocket::serde::Deserialize;
use serde_json::json;

use rocket::{get, post, routes, State, http::Status};
use rocket::serde::json::Json;
use mongodb::bson::oid::ObjectId;

use crate::booking::BookingService;
use crate::config::Config;
use crate::error::BookingError;
use crate::inventory;
use crate::models::event::CreateEventPayload;
use crate::routes::{respond, ApiResult};
use crate::utils::auth::{create_jwt, verify_password, AdminUser};

#[derive(Deserialize)]
pub struct LoginPayload {
    pub email: String,
    pub password: String,
}

#[post("/login", data = "<payload>")]
pub async fn login(
    service: &State<BookingService>,
    config: &State<Config>,
    payload: Json<LoginPayload>,
) -> ApiResult {
    let user = service
        .users()
        .find_user_by_email(&payload.email)
        .await?
        .filter(|u| verify_password(&payload.password, &u.password_hash))
        .ok_or(BookingError::InvalidCredentials)?;
    let user_id = user.id.ok_or(BookingError::InvalidCredentials)?;

    let token = create_jwt(&user_id, user.role, &config.jwt_secret)?;
    Ok(respond(Status::Ok, "Logged in", json!({ "token": token, "role": user.role })))
}

// --- Event Management ---
#[get("/events")]
pub async fn admin_get_events(service: &State<BookingService>, _admin: AdminUser) -> ApiResult {
    let events = service.events().list_events().await?;
    Ok(respond(Status::Ok, "Events fetched", events))
}

#[post("/events", data = "<payload>")]
pub async fn create_event(
    service: &State<BookingService>,
    admin: AdminUser,
    payload: Json<CreateEventPayload>,
) -> ApiResult {
    let event = payload.into_inner().into_event()?;
    let event = service.events().insert_event(event).await?;
    tracing::info!(event_id = ?event.id, admin = %admin.0.user_id, "event created");
    Ok(respond(Status::Created, "Event created successfully", event))
}

#[get("/events/<id>/sales")]
pub async fn event_sales(service: &State<BookingService>, _admin: AdminUser, id: &str) -> ApiResult {
    let object_id = ObjectId::parse_str(id).map_err(|_| BookingError::InvalidInput("invalid event id".into()))?;
    let event = service
        .events()
        .find_event(object_id)
        .await?
        .ok_or(BookingError::EventNotFound)?;
    Ok(respond(
        Status::Ok,
        "Sales fetched",
        json!({ "event_id": object_id.to_hex(), "categories": inventory::sales_report(&event) }),
    ))
}

// --- Booking Management ---
#[get("/bookings")]
pub async fn get_bookings(service: &State<BookingService>, _admin: AdminUser) -> ApiResult {
    let bookings = service.bookings().list_bookings().await?;
    Ok(respond(Status::Ok, "Bookings fetched", bookings))
}

/// Closes a booking whose payment will not complete.
#[post("/bookings/<order_id>/fail")]
pub async fn fail_booking(service: &State<BookingService>, admin: AdminUser, order_id: &str) -> ApiResult {
    let booking = service.fail(order_id).await?;
    tracing::info!(order_id, admin = %admin.0.user_id, "booking closed as failed");
    Ok(respond(Status::Ok, "Booking marked as failed", booking))
}

pub fn routes() -> Vec<rocket::Route> {
    routes![login, admin_get_events, create_event, event_sales, get_bookings, fail_booking]
}
