use serde::{Deserialize, Serialize};
use mongodb::bson::oid::ObjectId;
use chrono::{DateTime, Utc};

use crate::error::BookingError;

/// A priced tier of tickets with its own stock counter.
///
/// Amounts are in minor currency units (paise for INR).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TicketCategory {
    pub name: String,
    pub unit_price: i64,
    pub total_quantity: i64,
    pub remaining_quantity: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub title: String,
    pub description: String,
    pub date: DateTime<Utc>,
    pub location: String,
    pub ticket_categories: Vec<TicketCategory>,
    #[serde(default = "chrono::Utc::now")]
    pub created_at: DateTime<Utc>,
}

impl Event {
    pub fn category(&self, name: &str) -> Option<&TicketCategory> {
        self.ticket_categories.iter().find(|c| c.name == name)
    }
}

/// Public-facing slice of an event shown at the venue gate.
#[derive(Debug, Clone, Serialize)]
pub struct EventSummary {
    pub id: Option<ObjectId>,
    pub title: String,
    pub date: DateTime<Utc>,
    pub location: String,
}

impl From<&Event> for EventSummary {
    fn from(event: &Event) -> Self {
        EventSummary {
            id: event.id,
            title: event.title.clone(),
            date: event.date,
            location: event.location.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct NewTicketCategory {
    pub name: String,
    pub unit_price: i64,
    pub total_quantity: i64,
}

/// Administrator input for a new event. Only these fields are accepted;
/// stock counters are always derived from `total_quantity`.
#[derive(Debug, Deserialize)]
pub struct CreateEventPayload {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub date: DateTime<Utc>,
    pub location: String,
    pub ticket_categories: Vec<NewTicketCategory>,
}

impl CreateEventPayload {
    pub fn into_event(self) -> Result<Event, BookingError> {
        if self.title.trim().is_empty() {
            return Err(BookingError::InvalidInput("event title must not be empty".into()));
        }
        if self.ticket_categories.is_empty() {
            return Err(BookingError::InvalidInput("event needs at least one ticket category".into()));
        }

        let mut categories: Vec<TicketCategory> = Vec::with_capacity(self.ticket_categories.len());
        for cat in self.ticket_categories {
            let name = cat.name.trim().to_string();
            if name.is_empty() {
                return Err(BookingError::InvalidInput("ticket category name must not be empty".into()));
            }
            if categories.iter().any(|c| c.name == name) {
                return Err(BookingError::InvalidInput(format!("duplicate ticket category {name}")));
            }
            if cat.unit_price < 0 || cat.total_quantity < 0 {
                return Err(BookingError::InvalidInput(format!(
                    "ticket category {name} has a negative price or quantity"
                )));
            }
            categories.push(TicketCategory {
                name,
                unit_price: cat.unit_price,
                total_quantity: cat.total_quantity,
                remaining_quantity: cat.total_quantity,
            });
        }

        Ok(Event {
            id: None,
            title: self.title,
            description: self.description,
            date: self.date,
            location: self.location,
            ticket_categories: categories,
            created_at: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(categories: Vec<NewTicketCategory>) -> CreateEventPayload {
        CreateEventPayload {
            title: "Jakarta Music Fest".to_string(),
            description: String::new(),
            date: Utc::now(),
            location: "Jakarta Convention Center".to_string(),
            ticket_categories: categories,
        }
    }

    fn category(name: &str, total: i64) -> NewTicketCategory {
        NewTicketCategory { name: name.to_string(), unit_price: 100, total_quantity: total }
    }

    #[test]
    fn remaining_starts_at_total() {
        let event = payload(vec![category("GA", 2), category("VIP", 5)]).into_event().unwrap();
        for cat in &event.ticket_categories {
            assert_eq!(cat.remaining_quantity, cat.total_quantity);
        }
        assert_eq!(event.category("VIP").map(|c| c.total_quantity), Some(5));
    }

    #[test]
    fn duplicate_category_names_are_rejected() {
        let err = payload(vec![category("GA", 2), category(" GA ", 1)]).into_event().unwrap_err();
        assert!(matches!(err, BookingError::InvalidInput(_)));
    }

    #[test]
    fn negative_quantity_is_rejected() {
        let err = payload(vec![category("GA", -1)]).into_event().unwrap_err();
        assert!(matches!(err, BookingError::InvalidInput(_)));
    }
}
