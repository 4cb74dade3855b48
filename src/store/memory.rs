//! In-process store with the same conditional-update semantics as
//! [`MongoStore`](super::MongoStore). Backs the test suites and local demos.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use mongodb::bson::oid::ObjectId;
use tokio::sync::Mutex;

use crate::error::BookingError;
use crate::models::{
    booking::{Booking, PaymentStatus},
    event::Event,
    user::{Role, User},
};
use crate::store::{BookingStore, EventStore, PaidTicket, UserStore};

#[derive(Debug, Default)]
struct Collections {
    events: HashMap<ObjectId, Event>,
    bookings: Vec<Booking>,
    users: HashMap<ObjectId, User>,
}

#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    inner: Arc<Mutex<Collections>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every booking ever written, oldest first.
    pub async fn bookings(&self) -> Vec<Booking> {
        self.inner.lock().await.bookings.clone()
    }
}

#[async_trait]
impl EventStore for MemoryStore {
    async fn insert_event(&self, mut event: Event) -> Result<Event, BookingError> {
        let id = *event.id.get_or_insert_with(ObjectId::new);
        self.inner.lock().await.events.insert(id, event.clone());
        Ok(event)
    }

    async fn find_event(&self, id: ObjectId) -> Result<Option<Event>, BookingError> {
        Ok(self.inner.lock().await.events.get(&id).cloned())
    }

    async fn list_events(&self) -> Result<Vec<Event>, BookingError> {
        let mut events: Vec<Event> = self.inner.lock().await.events.values().cloned().collect();
        events.sort_by_key(|e| e.created_at);
        Ok(events)
    }

    async fn decrement_remaining(
        &self,
        event_id: ObjectId,
        category: &str,
        quantity: i64,
    ) -> Result<bool, BookingError> {
        let mut state = self.inner.lock().await;
        let slot = state
            .events
            .get_mut(&event_id)
            .and_then(|e| e.ticket_categories.iter_mut().find(|c| c.name == category));

        match slot {
            Some(cat) if cat.remaining_quantity >= quantity => {
                cat.remaining_quantity -= quantity;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn restore_remaining(
        &self,
        event_id: ObjectId,
        category: &str,
        quantity: i64,
    ) -> Result<(), BookingError> {
        let mut state = self.inner.lock().await;
        if let Some(cat) = state
            .events
            .get_mut(&event_id)
            .and_then(|e| e.ticket_categories.iter_mut().find(|c| c.name == category))
        {
            cat.remaining_quantity += quantity;
        }
        Ok(())
    }
}

#[async_trait]
impl BookingStore for MemoryStore {
    async fn insert_booking(&self, mut booking: Booking) -> Result<Booking, BookingError> {
        booking.id.get_or_insert_with(ObjectId::new);
        self.inner.lock().await.bookings.push(booking.clone());
        Ok(booking)
    }

    async fn find_by_order_id(&self, order_id: &str) -> Result<Option<Booking>, BookingError> {
        let state = self.inner.lock().await;
        Ok(state.bookings.iter().find(|b| b.provider_order_id == order_id).cloned())
    }

    async fn find_paid(
        &self,
        booking_id: ObjectId,
        event_id: ObjectId,
        user_id: ObjectId,
    ) -> Result<Option<Booking>, BookingError> {
        let state = self.inner.lock().await;
        Ok(state
            .bookings
            .iter()
            .find(|b| {
                b.id == Some(booking_id)
                    && b.event_id == event_id
                    && b.user_id == user_id
                    && b.payment_status == PaymentStatus::Paid
            })
            .cloned())
    }

    async fn mark_paid(&self, booking_id: ObjectId, ticket: &PaidTicket) -> Result<Option<Booking>, BookingError> {
        let mut state = self.inner.lock().await;
        let booking = state
            .bookings
            .iter_mut()
            .find(|b| b.id == Some(booking_id) && b.payment_status == PaymentStatus::Pending);

        Ok(booking.map(|b| {
            b.payment_status = PaymentStatus::Paid;
            b.provider_payment_id = Some(ticket.payment_id.clone());
            b.redemption_token = Some(ticket.redemption_token.clone());
            b.qr_code = Some(ticket.qr_code.clone());
            b.paid_at = Some(Utc::now());
            b.clone()
        }))
    }

    async fn mark_failed(&self, order_id: &str) -> Result<Option<Booking>, BookingError> {
        let mut state = self.inner.lock().await;
        let booking = state
            .bookings
            .iter_mut()
            .find(|b| b.provider_order_id == order_id && b.payment_status == PaymentStatus::Pending);

        Ok(booking.map(|b| {
            b.payment_status = PaymentStatus::Failed;
            b.clone()
        }))
    }

    async fn list_bookings(&self) -> Result<Vec<Booking>, BookingError> {
        let mut bookings = self.inner.lock().await.bookings.clone();
        bookings.reverse();
        Ok(bookings)
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn insert_user(&self, mut user: User) -> Result<User, BookingError> {
        let id = *user.id.get_or_insert_with(ObjectId::new);
        self.inner.lock().await.users.insert(id, user.clone());
        Ok(user)
    }

    async fn find_user(&self, id: ObjectId) -> Result<Option<User>, BookingError> {
        Ok(self.inner.lock().await.users.get(&id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, BookingError> {
        let state = self.inner.lock().await;
        Ok(state.users.values().find(|u| u.email == email).cloned())
    }

    async fn has_admin(&self) -> Result<bool, BookingError> {
        let state = self.inner.lock().await;
        Ok(state.users.values().any(|u| u.role == Role::Admin))
    }
}
