use anyhow::Context;
use chrono::Utc;
use dotenvy::dotenv;

use event_booking::{
    config::Config,
    db::{ensure_indexes, init_db},
    models::{
        event::{CreateEventPayload, NewTicketCategory},
        user::{Role, User},
    },
    store::{EventStore, MongoStore, UserStore},
    telemetry::init_tracing,
    utils::auth::hash_password,
};

fn category(name: &str, unit_price: i64, total_quantity: i64) -> NewTicketCategory {
    NewTicketCategory {
        name: name.to_string(),
        unit_price,
        total_quantity,
    }
}

fn sample_events() -> Vec<CreateEventPayload> {
    vec![
        CreateEventPayload {
            title: "Jakarta Music Fest".to_string(),
            description: "A night of stellar music performances.".to_string(),
            date: Utc::now() + chrono::Duration::days(30),
            location: "Jakarta Convention Center".to_string(),
            ticket_categories: vec![category("GA", 150_000, 400), category("VIP", 450_000, 100)],
        },
        CreateEventPayload {
            title: "Comedy Night".to_string(),
            description: "Get ready to laugh out loud with top comedians.".to_string(),
            date: Utc::now() + chrono::Duration::days(15),
            location: "Isola Bar, Jakarta".to_string(),
            ticket_categories: vec![category("Standing", 75_000, 200)],
        },
    ]
}

/// Adds the sample events only to an empty collection; bookings reference
/// events by id, so existing ones are never replaced. Returns how many were added.
async fn seed_events(store: &dyn EventStore) -> anyhow::Result<usize> {
    if !store.list_events().await?.is_empty() {
        return Ok(0);
    }
    let mut added = 0;
    for payload in sample_events() {
        let event = store.insert_event(payload.into_event()?).await?;
        tracing::info!(event_id = ?event.id, title = %event.title, "sample event added");
        added += 1;
    }
    Ok(added)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    let config = Config::from_env()?;
    init_tracing(&config.log_filter);

    let db = init_db(&config, "event_booking_seed").await?;
    ensure_indexes(&db).await?;
    let store = MongoStore::new(&db);

    // Seed Admin
    if store.has_admin().await? {
        tracing::info!("admin user already exists, skipping creation");
    } else {
        let email = config.admin_email.clone().context("ADMIN_EMAIL must be set to seed an admin")?;
        let password = config
            .admin_password
            .clone()
            .context("ADMIN_PASSWORD must be set to seed an admin")?;
        let admin = User {
            id: None,
            name: "Administrator".to_string(),
            email: email.clone(),
            password_hash: hash_password(&password)?,
            role: Role::Admin,
            created_at: Utc::now(),
        };
        store.insert_user(admin).await?;
        tracing::info!(%email, "admin user created");
    }

    // Seed Events
    let added = seed_events(&store).await?;
    if added == 0 {
        tracing::info!("events already present, skipping sample events");
    }

    tracing::info!("seeding complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use event_booking::store::MemoryStore;

    #[tokio::test]
    async fn sample_events_are_added_once_and_existing_events_stay() {
        let store = MemoryStore::new();
        let existing = store
            .insert_event(sample_events().remove(1).into_event().unwrap())
            .await
            .unwrap();

        assert_eq!(seed_events(&store).await.unwrap(), 0);
        let events = store.list_events().await.unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].id, existing.id);

        let empty = MemoryStore::new();
        assert_eq!(seed_events(&empty).await.unwrap(), 2);
        assert_eq!(seed_events(&empty).await.unwrap(), 0);
        assert_eq!(empty.list_events().await.unwrap().len(), 2);
    }
}
