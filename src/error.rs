use rocket::http::Status;
use rocket::response::{self, status::Custom, Responder};
use rocket::serde::json::Json;
use rocket::Request;
use serde_json::json;
use thiserror::Error;

use crate::models::booking::PaymentStatus;

/// Coarse classification used to pick a response status and log level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Conflict,
    ValidationFailed,
    Unauthorized,
    UpstreamFailure,
    Internal,
}

#[derive(Debug, Error)]
pub enum BookingError {
    #[error("Event not found")]
    EventNotFound,

    #[error("Booking not found")]
    BookingNotFound,

    #[error("Invalid ticket category: {0}")]
    InvalidCategory(String),

    #[error("Not enough tickets available for {category} (requested {requested})")]
    InsufficientStock { category: String, requested: i64 },

    #[error("Booking is already {0}")]
    AlreadyFinalized(PaymentStatus),

    #[error("Quantity must be a positive integer, got {0}")]
    InvalidQuantity(i64),

    #[error("Invalid request: {0}")]
    InvalidInput(String),

    #[error("Payment verification failed")]
    SignatureMismatch,

    #[error("Invalid or unpaid QR code")]
    InvalidTicket,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Payment provider error: {0}")]
    PaymentProvider(String),

    #[error("Database error: {0}")]
    Database(#[from] mongodb::error::Error),

    #[error("Token error: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),

    #[error("Encoding error: {0}")]
    Encoding(#[from] mongodb::bson::ser::Error),

    #[error("QR rendering failed: {0}")]
    QrCode(String),
}

impl BookingError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            BookingError::EventNotFound
            | BookingError::BookingNotFound
            | BookingError::InvalidCategory(_)
            | BookingError::InvalidTicket => ErrorKind::NotFound,
            BookingError::InsufficientStock { .. } | BookingError::AlreadyFinalized(_) => ErrorKind::Conflict,
            BookingError::InvalidQuantity(_)
            | BookingError::InvalidInput(_)
            | BookingError::SignatureMismatch => ErrorKind::ValidationFailed,
            BookingError::InvalidCredentials => ErrorKind::Unauthorized,
            BookingError::PaymentProvider(_) => ErrorKind::UpstreamFailure,
            BookingError::Database(_)
            | BookingError::Token(_)
            | BookingError::Encoding(_)
            | BookingError::QrCode(_) => ErrorKind::Internal,
        }
    }

    pub fn status(&self) -> Status {
        // An unknown category is a malformed request, not a missing resource.
        if matches!(self, BookingError::InvalidCategory(_)) {
            return Status::BadRequest;
        }
        match self.kind() {
            ErrorKind::NotFound => Status::NotFound,
            ErrorKind::Conflict => Status::Conflict,
            ErrorKind::ValidationFailed => Status::BadRequest,
            ErrorKind::Unauthorized => Status::Unauthorized,
            ErrorKind::UpstreamFailure => Status::BadGateway,
            ErrorKind::Internal => Status::InternalServerError,
        }
    }
}

impl<'r> Responder<'r, 'static> for BookingError {
    fn respond_to(self, request: &'r Request<'_>) -> response::Result<'static> {
        let status = self.status();
        let message = match self.kind() {
            ErrorKind::Internal => {
                tracing::error!(error = %self, uri = %request.uri(), "request failed");
                "Something went wrong".to_string()
            }
            ErrorKind::UpstreamFailure => {
                tracing::error!(error = %self, uri = %request.uri(), "upstream call failed");
                self.to_string()
            }
            _ => {
                tracing::debug!(error = %self, status = status.code, "request rejected");
                self.to_string()
            }
        };

        Custom(
            status,
            Json(json!({
                "error": true,
                "message": message,
                "data": null
            })),
        )
        .respond_to(request)
    }
}
