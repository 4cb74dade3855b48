use std::sync::Arc;

use anyhow::Context;
use dotenvy::dotenv;

use event_booking::{
    config::Config,
    db::{ensure_indexes, init_db},
    server::build_rocket,
    store::MongoStore,
    telemetry::init_tracing,
    utils::{
        mailer::{NoopNotifier, Notifier, ResendMailer},
        razorpay::{PaymentProvider, RazorpayClient},
    },
    BookingService,
};

#[rocket::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    let config = Config::from_env()?;
    init_tracing(&config.log_filter);

    let db = init_db(&config, "event_booking").await.context("connecting to MongoDB")?;
    ensure_indexes(&db).await.context("creating indexes")?;

    let payments: Arc<dyn PaymentProvider> = Arc::new(RazorpayClient::from_config(&config));
    let notifier: Arc<dyn Notifier> = match ResendMailer::from_config(&config) {
        Some(mailer) => Arc::new(mailer),
        None => {
            tracing::warn!("RESEND_API_KEY/RESEND_FROM_EMAIL not set, confirmation emails disabled");
            Arc::new(NoopNotifier)
        }
    };
    if config.razorpay_webhook_secret.is_none() {
        tracing::warn!("RAZORPAY_WEBHOOK_SECRET not set, webhook deliveries will be rejected");
    }

    let service = BookingService::new(
        Arc::new(MongoStore::new(&db)),
        payments,
        notifier,
        &config.razorpay_key_secret,
        &config.payment_currency,
    );

    tracing::info!(database = config.database_name(), "starting booking service");
    build_rocket(config, service)
        .launch()
        .await
        .map_err(|e| anyhow::anyhow!("server failed: {e}"))?;
    Ok(())
}
