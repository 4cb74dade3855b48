#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use mongodb::bson::oid::ObjectId;

use event_booking::models::{
    booking::{Booking, ConfirmPayload, ReservePayload},
    event::{Event, TicketCategory},
    user::{Role, User},
};
use event_booking::store::{EventStore, MemoryStore, UserStore};
use event_booking::utils::mailer::Notifier;
use event_booking::utils::razorpay::{PaymentProvider, ProviderOrder};
use event_booking::utils::signature;
use event_booking::BookingService;

pub const KEY_SECRET: &str = "rzp_test_key_secret";
pub const CURRENCY: &str = "INR";

/// Hands out sequential order ids; can be switched into a failing mode.
#[derive(Default)]
pub struct FakeProvider {
    next: AtomicUsize,
    failing: AtomicBool,
}

impl FakeProvider {
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn orders_created(&self) -> usize {
        self.next.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PaymentProvider for FakeProvider {
    async fn create_order(&self, amount: i64, currency: &str, receipt: &str) -> anyhow::Result<ProviderOrder> {
        if self.failing.load(Ordering::SeqCst) {
            anyhow::bail!("provider unavailable");
        }
        let n = self.next.fetch_add(1, Ordering::SeqCst);
        Ok(ProviderOrder {
            id: format!("order_test_{n}"),
            amount,
            currency: currency.to_string(),
            receipt: Some(receipt.to_string()),
            status: "created".to_string(),
        })
    }
}

/// Counts deliveries; optionally fails every one.
#[derive(Default)]
pub struct RecordingNotifier {
    pub sent: AtomicUsize,
    pub fail: AtomicBool,
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn booking_confirmed(&self, _user: &User, _booking: &Booking, _event: &Event) -> anyhow::Result<()> {
        if self.fail.load(Ordering::SeqCst) {
            anyhow::bail!("smtp down");
        }
        self.sent.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

pub struct Harness {
    pub store: Arc<MemoryStore>,
    pub provider: Arc<FakeProvider>,
    pub notifier: Arc<RecordingNotifier>,
    pub service: BookingService,
}

impl Harness {
    pub fn new() -> Self {
        let store = Arc::new(MemoryStore::new());
        let provider = Arc::new(FakeProvider::default());
        let notifier = Arc::new(RecordingNotifier::default());
        let service = BookingService::new(
            store.clone(),
            provider.clone(),
            notifier.clone(),
            KEY_SECRET,
            CURRENCY,
        );
        Harness { store, provider, notifier, service }
    }

    pub async fn event(&self, categories: &[(&str, i64, i64)]) -> ObjectId {
        let event = Event {
            id: None,
            title: "Sunburn Arena".to_string(),
            description: String::new(),
            date: Utc::now(),
            location: "Mumbai".to_string(),
            ticket_categories: categories
                .iter()
                .map(|(name, price, total)| TicketCategory {
                    name: name.to_string(),
                    unit_price: *price,
                    total_quantity: *total,
                    remaining_quantity: *total,
                })
                .collect(),
            created_at: Utc::now(),
        };
        self.store.insert_event(event).await.unwrap().id.unwrap()
    }

    pub async fn user(&self, name: &str, role: Role) -> ObjectId {
        let user = User {
            id: None,
            name: name.to_string(),
            email: format!("{}@example.com", name.to_lowercase()),
            password_hash: String::new(),
            role,
            created_at: Utc::now(),
        };
        self.store.insert_user(user).await.unwrap().id.unwrap()
    }

    pub async fn remaining(&self, event_id: ObjectId, category: &str) -> i64 {
        let event = self.store.find_event(event_id).await.unwrap().unwrap();
        event.category(category).unwrap().remaining_quantity
    }
}

pub fn reserve_payload(event_id: ObjectId, category: &str, quantity: i64) -> ReservePayload {
    ReservePayload {
        event_id: event_id.to_hex(),
        ticket_category: category.to_string(),
        quantity,
    }
}

/// A checkout callback signed the way the provider signs it.
pub fn signed_confirmation(order_id: &str, payment_id: &str) -> ConfirmPayload {
    ConfirmPayload {
        order_id: order_id.to_string(),
        payment_id: payment_id.to_string(),
        signature: signature::payment_signature(order_id, payment_id, KEY_SECRET).unwrap(),
    }
}
