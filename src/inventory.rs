//! Per-category stock checks and mutations.

use mongodb::bson::oid::ObjectId;
use serde::Serialize;

use crate::error::BookingError;
use crate::models::event::{Event, TicketCategory};
use crate::store::EventStore;

/// Read-only check used at reservation time. Does not hold stock.
pub fn check_availability<'a>(
    event: &'a Event,
    category: &str,
    quantity: i64,
) -> Result<&'a TicketCategory, BookingError> {
    if quantity <= 0 {
        return Err(BookingError::InvalidQuantity(quantity));
    }
    let cat = event
        .category(category)
        .ok_or_else(|| BookingError::InvalidCategory(category.to_string()))?;
    if cat.remaining_quantity < quantity {
        return Err(BookingError::InsufficientStock {
            category: category.to_string(),
            requested: quantity,
        });
    }
    Ok(cat)
}

/// Takes `quantity` units out of the category, or reports a conflict.
/// Never clamps: either the full quantity is taken or nothing is.
pub async fn decrement(
    store: &dyn EventStore,
    event_id: ObjectId,
    category: &str,
    quantity: i64,
) -> Result<(), BookingError> {
    if quantity <= 0 {
        return Err(BookingError::InvalidQuantity(quantity));
    }
    if store.decrement_remaining(event_id, category, quantity).await? {
        Ok(())
    } else {
        Err(BookingError::InsufficientStock {
            category: category.to_string(),
            requested: quantity,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategorySales {
    pub name: String,
    pub unit_price: i64,
    pub total: i64,
    pub remaining: i64,
    pub sold: i64,
}

pub fn sales_report(event: &Event) -> Vec<CategorySales> {
    event
        .ticket_categories
        .iter()
        .map(|c| CategorySales {
            name: c.name.clone(),
            unit_price: c.unit_price,
            total: c.total_quantity,
            remaining: c.remaining_quantity,
            sold: c.total_quantity - c.remaining_quantity,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use chrono::Utc;

    fn event() -> Event {
        Event {
            id: None,
            title: "Jakarta Music Fest".to_string(),
            description: String::new(),
            date: Utc::now(),
            location: "Jakarta Convention Center".to_string(),
            ticket_categories: vec![
                TicketCategory { name: "GA".into(), unit_price: 100, total_quantity: 2, remaining_quantity: 2 },
                TicketCategory { name: "VIP".into(), unit_price: 500, total_quantity: 1, remaining_quantity: 0 },
            ],
            created_at: Utc::now(),
        }
    }

    #[test]
    fn availability_outcomes() {
        let event = event();
        assert_eq!(check_availability(&event, "GA", 2).unwrap().unit_price, 100);
        assert!(matches!(
            check_availability(&event, "GA", 3),
            Err(BookingError::InsufficientStock { requested: 3, .. })
        ));
        assert!(matches!(
            check_availability(&event, "VIP", 1),
            Err(BookingError::InsufficientStock { .. })
        ));
        assert!(matches!(
            check_availability(&event, "Balcony", 1),
            Err(BookingError::InvalidCategory(_))
        ));
        assert!(matches!(check_availability(&event, "GA", 0), Err(BookingError::InvalidQuantity(0))));
    }

    #[test]
    fn report_counts_sold_units() {
        let report = sales_report(&event());
        assert_eq!(report[0].sold, 0);
        assert_eq!(report[1].sold, 1);
    }

    #[tokio::test]
    async fn decrement_reports_conflict_instead_of_clamping() {
        let store = MemoryStore::new();
        let id = store.insert_event(event()).await.unwrap().id.unwrap();

        decrement(&store, id, "GA", 1).await.unwrap();
        let err = decrement(&store, id, "GA", 2).await.unwrap_err();
        assert!(matches!(err, BookingError::InsufficientStock { .. }));

        let after = store.find_event(id).await.unwrap().unwrap();
        assert_eq!(after.category("GA").unwrap().remaining_quantity, 1);
    }
}
