use rocket::fairing::{Fairing, Info, Kind};
use rocket::http::{Header, Status};
use rocket::response::status::Custom;
use rocket::serde::json::Json;
use rocket::{catch, catchers, Build, Request, Response, Rocket};
use serde_json::{json, Value};

use crate::booking::BookingService;
use crate::config::Config;
use crate::routes::{admin, public};

pub struct Cors;

#[rocket::async_trait]
impl Fairing for Cors {
    fn info(&self) -> Info {
        Info {
            name: "Add CORS headers to responses",
            kind: Kind::Response,
        }
    }

    async fn on_response<'r>(&self, _request: &'r Request<'_>, response: &mut Response<'r>) {
        response.set_header(Header::new("Access-Control-Allow-Origin", "*"));
        response.set_header(Header::new("Access-Control-Allow-Methods", "POST, GET, PATCH, OPTIONS, PUT, DELETE"));
        response.set_header(Header::new("Access-Control-Allow-Headers", "*"));
        response.set_header(Header::new("Access-Control-Allow-Credentials", "true"));
    }
}

/// Replies for failures raised before a handler runs (guards, body parsing,
/// unknown routes), in the same envelope handlers use.
#[catch(default)]
fn json_catcher(status: Status, request: &Request<'_>) -> Custom<Json<Value>> {
    // A body that parses as JSON but not as the payload type is a bad request.
    let status = if status == Status::UnprocessableEntity { Status::BadRequest } else { status };
    let message = match status.code {
        400 => "Invalid request body",
        401 => "Authentication required",
        403 => "Admin access required",
        404 => "Resource not found",
        500 => "Something went wrong",
        _ => status.reason().unwrap_or("Request failed"),
    };
    tracing::debug!(status = status.code, uri = %request.uri(), "request caught");

    Custom(
        status,
        Json(json!({
            "error": true,
            "message": message,
            "data": null
        })),
    )
}

pub fn build_rocket(config: Config, service: BookingService) -> Rocket<Build> {
    rocket::build()
        .manage(config)
        .manage(service)
        .attach(Cors)
        .mount("/api", public::routes())
        .mount("/api/admin", admin::routes())
        .register("/", catchers![json_catcher])
}
