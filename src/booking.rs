//! Booking lifecycle: `pending` on reservation, then exactly one of
//! `paid` (verified payment, stock taken) or `failed` (closed by an admin).
//!
//! A failed payment attempt does not end the booking: the provider lets the
//! buyer retry on the same order, so the booking stays pending until a
//! capture arrives or it is closed.

use std::sync::Arc;

use chrono::Utc;
use mongodb::bson::oid::ObjectId;
use serde::Serialize;
use uuid::Uuid;

use crate::error::BookingError;
use crate::inventory;
use crate::models::booking::{Booking, ConfirmPayload, PaymentStatus, ReservePayload};
use crate::models::event::EventSummary;
use crate::models::user::UserSummary;
use crate::redemption::{RedeemedTicket, RedemptionToken};
use crate::store::{BookingStore, EventStore, PaidTicket, UserStore};
use crate::utils::mailer::Notifier;
use crate::utils::razorpay::{PaymentProvider, ProviderOrder};
use crate::utils::signature;

/// Result of a reservation: the pending booking and the order the client pays.
#[derive(Debug, Clone, Serialize)]
pub struct Reservation {
    pub booking: Booking,
    pub provider_order: ProviderOrder,
}

#[derive(Clone)]
pub struct BookingService {
    events: Arc<dyn EventStore>,
    bookings: Arc<dyn BookingStore>,
    users: Arc<dyn UserStore>,
    payments: Arc<dyn PaymentProvider>,
    notifier: Arc<dyn Notifier>,
    payment_secret: String,
    currency: String,
}

impl BookingService {
    /// `store` backs events, bookings and users; `payment_secret` is the key
    /// the provider signs checkout callbacks with.
    pub fn new<S>(
        store: Arc<S>,
        payments: Arc<dyn PaymentProvider>,
        notifier: Arc<dyn Notifier>,
        payment_secret: &str,
        currency: &str,
    ) -> Self
    where
        S: EventStore + BookingStore + UserStore + 'static,
    {
        BookingService {
            events: store.clone(),
            bookings: store.clone(),
            users: store,
            payments,
            notifier,
            payment_secret: payment_secret.to_string(),
            currency: currency.to_string(),
        }
    }

    pub fn events(&self) -> &dyn EventStore {
        self.events.as_ref()
    }

    pub fn bookings(&self) -> &dyn BookingStore {
        self.bookings.as_ref()
    }

    pub fn users(&self) -> &dyn UserStore {
        self.users.as_ref()
    }

    /// Creates a pending booking after checking, but not holding, stock.
    ///
    /// Two reservations may both pass the check for the last units; the
    /// loser is caught when it confirms.
    pub async fn reserve(&self, user_id: ObjectId, payload: &ReservePayload) -> Result<Reservation, BookingError> {
        if payload.quantity <= 0 {
            return Err(BookingError::InvalidQuantity(payload.quantity));
        }
        let event_id = ObjectId::parse_str(&payload.event_id)
            .map_err(|_| BookingError::InvalidInput("invalid event id".into()))?;
        let event = self
            .events
            .find_event(event_id)
            .await?
            .ok_or(BookingError::EventNotFound)?;

        let category = inventory::check_availability(&event, &payload.ticket_category, payload.quantity)?;
        let amount = category
            .unit_price
            .checked_mul(payload.quantity)
            .ok_or(BookingError::InvalidQuantity(payload.quantity))?;

        let receipt = format!("receipt_{}", Uuid::new_v4().simple());
        let provider_order = self
            .payments
            .create_order(amount, &self.currency, &receipt)
            .await
            .map_err(|e| {
                tracing::error!(%event_id, error = %e, "payment order creation failed");
                BookingError::PaymentProvider(e.to_string())
            })?;

        let booking = Booking {
            id: Some(ObjectId::new()),
            user_id,
            event_id,
            ticket_category: category.name.clone(),
            quantity: payload.quantity,
            amount,
            currency: self.currency.clone(),
            payment_status: PaymentStatus::Pending,
            provider_order_id: provider_order.id.clone(),
            provider_payment_id: None,
            redemption_token: None,
            qr_code: None,
            created_at: Utc::now(),
            paid_at: None,
        };
        let booking = self.bookings.insert_booking(booking).await?;

        tracing::info!(
            booking_id = ?booking.id,
            order_id = %booking.provider_order_id,
            %event_id,
            category = %booking.ticket_category,
            quantity = booking.quantity,
            amount,
            "booking reserved"
        );

        Ok(Reservation { booking, provider_order })
    }

    /// Checkout callback: verifies the provider signature, then confirms.
    /// On a signature mismatch the booking stays pending.
    pub async fn confirm(&self, payload: &ConfirmPayload) -> Result<Booking, BookingError> {
        if !signature::verify(&payload.order_id, &payload.payment_id, &payload.signature, &self.payment_secret) {
            tracing::warn!(order_id = %payload.order_id, "payment signature mismatch");
            return Err(BookingError::SignatureMismatch);
        }
        self.confirm_verified(&payload.order_id, &payload.payment_id).await
    }

    /// pending -> paid for a payment whose authenticity is already established.
    ///
    /// Stock is taken first with a conditional decrement, then the booking is
    /// flipped with a conditional update. If the flip loses to a concurrent
    /// confirmation the stock is handed back, so a paid booking always has
    /// its units and no units leak.
    ///
    /// Confirming an already paid booking with the payment that paid it
    /// returns the booking unchanged; the checkout callback and the webhook
    /// both deliver the same capture.
    pub async fn confirm_verified(&self, order_id: &str, payment_id: &str) -> Result<Booking, BookingError> {
        let booking = self
            .bookings
            .find_by_order_id(order_id)
            .await?
            .ok_or(BookingError::BookingNotFound)?;
        if booking.payment_status.is_terminal() {
            return Self::settled(booking, order_id, payment_id);
        }
        let booking_id = booking.id.ok_or(BookingError::BookingNotFound)?;
        let token = RedemptionToken::new(booking_id, booking.event_id, booking.user_id);
        let ticket = PaidTicket {
            payment_id: payment_id.to_string(),
            redemption_token: token.to_string(),
            qr_code: token.qr_data_url().map_err(|e| BookingError::QrCode(e.to_string()))?,
        };

        if let Err(e) = inventory::decrement(
            self.events.as_ref(),
            booking.event_id,
            &booking.ticket_category,
            booking.quantity,
        )
        .await
        {
            // Paid at the provider but unfulfillable; left pending for manual refund.
            tracing::warn!(
                %booking_id,
                order_id,
                payment_id,
                category = %booking.ticket_category,
                quantity = booking.quantity,
                error = %e,
                "stock exhausted at confirmation"
            );
            return Err(e);
        }

        let paid = match self.bookings.mark_paid(booking_id, &ticket).await {
            Ok(Some(paid)) => paid,
            Ok(None) => {
                self.restore_stock(&booking).await;
                let current = self
                    .bookings
                    .find_by_order_id(order_id)
                    .await?
                    .ok_or(BookingError::BookingNotFound)?;
                return Self::settled(current, order_id, payment_id);
            }
            Err(e) => {
                self.restore_stock(&booking).await;
                return Err(e);
            }
        };

        tracing::info!(
            %booking_id,
            order_id,
            payment_id,
            event_id = %paid.event_id,
            category = %paid.ticket_category,
            quantity = paid.quantity,
            "booking confirmed"
        );

        self.notify_confirmed(paid.clone());
        Ok(paid)
    }

    /// Outcome of a capture that reached a booking already out of `pending`.
    fn settled(booking: Booking, order_id: &str, payment_id: &str) -> Result<Booking, BookingError> {
        match booking.payment_status {
            PaymentStatus::Paid if booking.provider_payment_id.as_deref() == Some(payment_id) => {
                tracing::debug!(booking_id = ?booking.id, order_id, payment_id, "confirmation replayed");
                Ok(booking)
            }
            PaymentStatus::Paid => {
                tracing::warn!(
                    booking_id = ?booking.id,
                    order_id,
                    payment_id,
                    paid_with = ?booking.provider_payment_id,
                    "second payment captured for paid booking, refund required"
                );
                Err(BookingError::AlreadyFinalized(PaymentStatus::Paid))
            }
            PaymentStatus::Failed => {
                tracing::warn!(
                    booking_id = ?booking.id,
                    order_id,
                    payment_id,
                    "payment captured for failed booking, refund required"
                );
                Err(BookingError::AlreadyFinalized(PaymentStatus::Failed))
            }
            // The conditional update refused yet the booking reads back pending.
            PaymentStatus::Pending => Err(BookingError::AlreadyFinalized(PaymentStatus::Pending)),
        }
    }

    /// A payment attempt on `order_id` failed at the provider. The booking
    /// stays pending so the buyer can retry on the same order.
    pub async fn record_failed_attempt(&self, order_id: &str, payment_id: &str) -> Result<Booking, BookingError> {
        let booking = self
            .bookings
            .find_by_order_id(order_id)
            .await?
            .ok_or(BookingError::BookingNotFound)?;
        tracing::info!(
            booking_id = ?booking.id,
            order_id,
            payment_id,
            status = %booking.payment_status,
            "payment attempt failed"
        );
        Ok(booking)
    }

    /// pending -> failed. Closes a booking whose payment will not complete.
    pub async fn fail(&self, order_id: &str) -> Result<Booking, BookingError> {
        match self.bookings.mark_failed(order_id).await? {
            Some(failed) => {
                tracing::info!(booking_id = ?failed.id, order_id, "booking payment failed");
                Ok(failed)
            }
            None => match self.bookings.find_by_order_id(order_id).await? {
                Some(existing) => Err(BookingError::AlreadyFinalized(existing.payment_status)),
                None => Err(BookingError::BookingNotFound),
            },
        }
    }

    /// Gate check. Read-only; any mismatch reads as "not found".
    pub async fn redeem(&self, raw_token: &str) -> Result<RedeemedTicket, BookingError> {
        let token: RedemptionToken = match raw_token.parse() {
            Ok(token) => token,
            Err(_) => {
                tracing::info!("redemption rejected: malformed code");
                return Err(BookingError::InvalidTicket);
            }
        };

        let booking = match self
            .bookings
            .find_paid(token.booking_id, token.event_id, token.user_id)
            .await?
        {
            Some(booking) => booking,
            None => {
                tracing::info!(booking_id = %token.booking_id, "redemption rejected");
                return Err(BookingError::InvalidTicket);
            }
        };

        let event = self.events.find_event(booking.event_id).await?;
        let user = self.users.find_user(booking.user_id).await?;
        tracing::info!(booking_id = %token.booking_id, event_id = %token.event_id, "redemption accepted");

        Ok(RedeemedTicket {
            event: event.as_ref().map(EventSummary::from),
            user: user.as_ref().map(UserSummary::from),
            booking,
        })
    }

    async fn restore_stock(&self, booking: &Booking) {
        if let Err(e) = self
            .events
            .restore_remaining(booking.event_id, &booking.ticket_category, booking.quantity)
            .await
        {
            tracing::error!(
                booking_id = ?booking.id,
                event_id = %booking.event_id,
                category = %booking.ticket_category,
                quantity = booking.quantity,
                error = %e,
                "failed to restore stock after lost confirmation"
            );
        } else {
            tracing::warn!(booking_id = ?booking.id, "confirmation lost a race, stock restored");
        }
    }

    fn notify_confirmed(&self, booking: Booking) {
        let events = Arc::clone(&self.events);
        let users = Arc::clone(&self.users);
        let notifier = Arc::clone(&self.notifier);

        tokio::spawn(async move {
            let result = async {
                let user = users
                    .find_user(booking.user_id)
                    .await?
                    .ok_or_else(|| anyhow::anyhow!("user {} not found", booking.user_id))?;
                let event = events
                    .find_event(booking.event_id)
                    .await?
                    .ok_or_else(|| anyhow::anyhow!("event {} not found", booking.event_id))?;
                notifier.booking_confirmed(&user, &booking, &event).await
            }
            .await;

            if let Err(e) = result {
                tracing::warn!(booking_id = ?booking.id, error = %e, "booking confirmation notice not sent");
            }
        });
    }
}
