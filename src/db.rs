use mongodb::bson::{doc, Document};
use mongodb::options::{ClientOptions, IndexOptions};
use mongodb::{Client, Database, IndexModel};

use crate::config::Config;

pub async fn init_db(config: &Config, app_name: &str) -> mongodb::error::Result<Database> {
    let mut client_options = ClientOptions::parse(&config.mongodb_uri).await?;
    client_options.app_name = Some(app_name.to_string());

    let client = Client::with_options(client_options)?;
    Ok(client.database(config.database_name()))
}

/// Order ids are the confirmation lookup key, so they must be unique.
pub async fn ensure_indexes(db: &Database) -> mongodb::error::Result<()> {
    let bookings = db.collection::<Document>("bookings");
    bookings
        .create_index(
            IndexModel::builder()
                .keys(doc! { "provider_order_id": 1 })
                .options(IndexOptions::builder().unique(true).build())
                .build(),
            None,
        )
        .await?;
    bookings
        .create_index(IndexModel::builder().keys(doc! { "event_id": 1 }).build(), None)
        .await?;

    let users = db.collection::<Document>("users");
    users
        .create_index(
            IndexModel::builder()
                .keys(doc! { "email": 1 })
                .options(IndexOptions::builder().unique(true).build())
                .build(),
            None,
        )
        .await?;
    Ok(())
}
