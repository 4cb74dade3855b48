use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use mongodb::bson::{doc, oid::ObjectId, to_document};
use mongodb::options::{FindOneAndUpdateOptions, FindOptions, ReturnDocument};
use mongodb::{Collection, Database};
use serde::Serialize;

use crate::error::BookingError;
use crate::models::{
    booking::{Booking, PaymentStatus},
    event::Event,
    user::{Role, User},
};
use crate::store::{BookingStore, EventStore, PaidTicket, UserStore};

#[derive(Debug, Clone)]
pub struct MongoStore {
    events: Collection<Event>,
    bookings: Collection<Booking>,
    users: Collection<User>,
}

impl MongoStore {
    pub fn new(db: &Database) -> Self {
        MongoStore {
            events: db.collection("events"),
            bookings: db.collection("bookings"),
            users: db.collection("users"),
        }
    }
}

// Ids are generated at reservation time and lead with a timestamp.
fn newest_first() -> FindOptions {
    FindOptions::builder().sort(doc! { "_id": -1 }).build()
}

/// `$set` body for pending -> paid, encoded through the same serde path as
/// [`Booking`] so `paid_at` is stored like every other timestamp.
#[derive(Serialize)]
struct PaidFields<'a> {
    payment_status: PaymentStatus,
    provider_payment_id: &'a str,
    redemption_token: &'a str,
    qr_code: &'a str,
    paid_at: DateTime<Utc>,
}

#[async_trait]
impl EventStore for MongoStore {
    async fn insert_event(&self, mut event: Event) -> Result<Event, BookingError> {
        let result = self.events.insert_one(&event, None).await?;
        event.id = result.inserted_id.as_object_id();
        Ok(event)
    }

    async fn find_event(&self, id: ObjectId) -> Result<Option<Event>, BookingError> {
        Ok(self.events.find_one(doc! { "_id": id }, None).await?)
    }

    async fn list_events(&self) -> Result<Vec<Event>, BookingError> {
        let cursor = self.events.find(doc! {}, None).await?;
        Ok(cursor.try_collect().await?)
    }

    async fn decrement_remaining(
        &self,
        event_id: ObjectId,
        category: &str,
        quantity: i64,
    ) -> Result<bool, BookingError> {
        // $elemMatch pins the positional operator to the category that
        // still has enough stock; the server applies filter and $inc atomically.
        let filter = doc! {
            "_id": event_id,
            "ticket_categories": {
                "$elemMatch": {
                    "name": category,
                    "remaining_quantity": { "$gte": quantity }
                }
            }
        };
        let update = doc! { "$inc": { "ticket_categories.$.remaining_quantity": -quantity } };

        let result = self.events.update_one(filter, update, None).await?;
        Ok(result.modified_count == 1)
    }

    async fn restore_remaining(
        &self,
        event_id: ObjectId,
        category: &str,
        quantity: i64,
    ) -> Result<(), BookingError> {
        let filter = doc! { "_id": event_id, "ticket_categories.name": category };
        let update = doc! { "$inc": { "ticket_categories.$.remaining_quantity": quantity } };
        self.events.update_one(filter, update, None).await?;
        Ok(())
    }
}

#[async_trait]
impl BookingStore for MongoStore {
    async fn insert_booking(&self, mut booking: Booking) -> Result<Booking, BookingError> {
        let result = self.bookings.insert_one(&booking, None).await?;
        if booking.id.is_none() {
            booking.id = result.inserted_id.as_object_id();
        }
        Ok(booking)
    }

    async fn find_by_order_id(&self, order_id: &str) -> Result<Option<Booking>, BookingError> {
        Ok(self.bookings.find_one(doc! { "provider_order_id": order_id }, None).await?)
    }

    async fn find_paid(
        &self,
        booking_id: ObjectId,
        event_id: ObjectId,
        user_id: ObjectId,
    ) -> Result<Option<Booking>, BookingError> {
        let filter = doc! {
            "_id": booking_id,
            "event_id": event_id,
            "user_id": user_id,
            "payment_status": PaymentStatus::Paid.to_string(),
        };
        Ok(self.bookings.find_one(filter, None).await?)
    }

    async fn mark_paid(&self, booking_id: ObjectId, ticket: &PaidTicket) -> Result<Option<Booking>, BookingError> {
        let filter = doc! {
            "_id": booking_id,
            "payment_status": PaymentStatus::Pending.to_string(),
        };
        let fields = to_document(&PaidFields {
            payment_status: PaymentStatus::Paid,
            provider_payment_id: &ticket.payment_id,
            redemption_token: &ticket.redemption_token,
            qr_code: &ticket.qr_code,
            paid_at: Utc::now(),
        })?;
        let update = doc! { "$set": fields };
        let options = FindOneAndUpdateOptions::builder()
            .return_document(ReturnDocument::After)
            .build();

        Ok(self.bookings.find_one_and_update(filter, update, options).await?)
    }

    async fn mark_failed(&self, order_id: &str) -> Result<Option<Booking>, BookingError> {
        let filter = doc! {
            "provider_order_id": order_id,
            "payment_status": PaymentStatus::Pending.to_string(),
        };
        let update = doc! { "$set": { "payment_status": PaymentStatus::Failed.to_string() } };
        let options = FindOneAndUpdateOptions::builder()
            .return_document(ReturnDocument::After)
            .build();

        Ok(self.bookings.find_one_and_update(filter, update, options).await?)
    }

    async fn list_bookings(&self) -> Result<Vec<Booking>, BookingError> {
        let cursor = self.bookings.find(doc! {}, newest_first()).await?;
        Ok(cursor.try_collect().await?)
    }
}

#[async_trait]
impl UserStore for MongoStore {
    async fn insert_user(&self, mut user: User) -> Result<User, BookingError> {
        let result = self.users.insert_one(&user, None).await?;
        user.id = result.inserted_id.as_object_id();
        Ok(user)
    }

    async fn find_user(&self, id: ObjectId) -> Result<Option<User>, BookingError> {
        Ok(self.users.find_one(doc! { "_id": id }, None).await?)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, BookingError> {
        Ok(self.users.find_one(doc! { "email": email }, None).await?)
    }

    async fn has_admin(&self) -> Result<bool, BookingError> {
        let count = self
            .users
            .count_documents(doc! { "role": Role::Admin.to_string() }, None)
            .await?;
        Ok(count > 0)
    }
}
