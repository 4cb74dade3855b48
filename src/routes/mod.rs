use rocket::http::Status;
use rocket::response::status::Custom;
use rocket::serde::json::Json;
use serde::Serialize;
use serde_json::{json, Value};

use crate::error::BookingError;

pub mod admin;
pub mod public;

pub type ApiResponse = Custom<Json<Value>>;
pub type ApiResult = Result<ApiResponse, BookingError>;

/// Wraps `data` in the `{error, message, data}` envelope every endpoint replies with.
pub fn respond<T: Serialize>(status: Status, message: &str, data: T) -> ApiResponse {
    Custom(
        status,
        Json(json!({
            "error": false,
            "message": message,
            "data": data
        })),
    )
}
