pub mod booking;
pub mod config;
pub mod db;
pub mod error;
pub mod inventory;
pub mod models;
pub mod redemption;
pub mod routes;
pub mod server;
pub mod store;
pub mod telemetry;
pub mod utils;

pub use booking::{BookingService, Reservation};
pub use error::{BookingError, ErrorKind};
