//! Persistence ports for the booking core.
//!
//! Every mutation that can race is expressed as a single conditional
//! operation so the backing store, not the caller, decides the winner.

use async_trait::async_trait;
use mongodb::bson::oid::ObjectId;

use crate::error::BookingError;
use crate::models::{booking::Booking, event::Event, user::User};

/// What a booking gains when it moves to paid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaidTicket {
    pub payment_id: String,
    pub redemption_token: String,
    pub qr_code: String,
}

pub mod memory;
pub mod mongo;

pub use memory::MemoryStore;
pub use mongo::MongoStore;

#[async_trait]
pub trait EventStore: Send + Sync {
    /// Persists `event` and returns it with its id assigned.
    async fn insert_event(&self, event: Event) -> Result<Event, BookingError>;

    async fn find_event(&self, id: ObjectId) -> Result<Option<Event>, BookingError>;

    async fn list_events(&self) -> Result<Vec<Event>, BookingError>;

    /// `remaining_quantity -= quantity` for the named category, applied only
    /// when `remaining_quantity >= quantity`. Returns whether it was applied.
    async fn decrement_remaining(
        &self,
        event_id: ObjectId,
        category: &str,
        quantity: i64,
    ) -> Result<bool, BookingError>;

    /// Gives back stock taken by a `decrement_remaining` whose booking
    /// transition did not go through.
    async fn restore_remaining(
        &self,
        event_id: ObjectId,
        category: &str,
        quantity: i64,
    ) -> Result<(), BookingError>;
}

#[async_trait]
pub trait BookingStore: Send + Sync {
    async fn insert_booking(&self, booking: Booking) -> Result<Booking, BookingError>;

    async fn find_by_order_id(&self, order_id: &str) -> Result<Option<Booking>, BookingError>;

    /// A paid booking matching all three references, if any.
    async fn find_paid(
        &self,
        booking_id: ObjectId,
        event_id: ObjectId,
        user_id: ObjectId,
    ) -> Result<Option<Booking>, BookingError>;

    /// pending -> paid. `None` when the booking is missing or no longer pending.
    async fn mark_paid(&self, booking_id: ObjectId, ticket: &PaidTicket) -> Result<Option<Booking>, BookingError>;

    /// pending -> failed. `None` when the booking is missing or no longer pending.
    async fn mark_failed(&self, order_id: &str) -> Result<Option<Booking>, BookingError>;

    /// Newest reservation first.
    async fn list_bookings(&self) -> Result<Vec<Booking>, BookingError>;
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn insert_user(&self, user: User) -> Result<User, BookingError>;

    async fn find_user(&self, id: ObjectId) -> Result<Option<User>, BookingError>;

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, BookingError>;

    async fn has_admin(&self) -> Result<bool, BookingError>;
}
