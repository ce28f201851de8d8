// ufo_storefront/src/main.rs

use actix_web::{web as actix_data, App, HttpServer};
use anyhow::Context;
use std::sync::Arc;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::EnvFilter;

use ufo_storefront::clock::{Clock, SystemClock};
use ufo_storefront::config::AppConfig;
use ufo_storefront::db::seed::seed_promo_codes;
use ufo_storefront::db::{MemoryStore, OrderStore, PgStore, PromoCodeStore};
use ufo_storefront::pipelines::Sagas;
use ufo_storefront::services::gopay::GoPayClient;
use ufo_storefront::services::notifier::{HttpNotifier, LogNotifier, Notifier};
use ufo_storefront::services::packeta::PacketaClient;
use ufo_storefront::state::AppState;
use ufo_storefront::web::{configure_app_routes, json_config};

fn init_tracing(json: bool) {
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
  let builder = tracing_subscriber::fmt()
    .with_env_filter(filter) // RUST_LOG overrides the default level
    .with_span_events(FmtSpan::CLOSE);
  if json {
    builder.json().init();
  } else {
    builder.init();
  }
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
  let app_config = Arc::new(AppConfig::from_env().context("loading configuration")?);
  init_tracing(app_config.log_json);

  tracing::info!("Starting UFO storefront server...");

  let clock: Arc<dyn Clock> = Arc::new(SystemClock);

  let (orders, promo_codes): (Arc<dyn OrderStore>, Arc<dyn PromoCodeStore>) = match &app_config.database_url {
    Some(url) => {
      let store = PgStore::connect(url, app_config.database_max_connections)
        .await
        .context("connecting to the database")?;
      sqlx::migrate!("./migrations")
        .run(store.pool())
        .await
        .context("running database migrations")?;
      tracing::info!("Connected to the database and applied migrations.");
      let store = Arc::new(store);
      let orders: Arc<dyn OrderStore> = store.clone();
      let promo_codes: Arc<dyn PromoCodeStore> = store;
      (orders, promo_codes)
    }
    None => {
      tracing::warn!("DATABASE_URL is not set; orders are kept in memory and lost on restart.");
      let store = Arc::new(MemoryStore::new());
      let orders: Arc<dyn OrderStore> = store.clone();
      let promo_codes: Arc<dyn PromoCodeStore> = store;
      (orders, promo_codes)
    }
  };

  if app_config.seed_db {
    let seeded = seed_promo_codes(promo_codes.as_ref(), clock.now())
      .await
      .context("seeding promo codes")?;
    tracing::info!(seeded, "Database seeding finished.");
  }

  let carrier = PacketaClient::new(&app_config.packeta, app_config.http_timeout).context("building carrier client")?;
  if app_config.packeta.api_password.is_none() {
    tracing::warn!("PACKETA_API_PASSWORD is not set; shipment booking will fail and be recorded on each order.");
  }
  let gateway = GoPayClient::new(&app_config.gopay, app_config.http_timeout).context("building payment gateway client")?;
  if !gateway.is_configured() {
    tracing::warn!("GoPay credentials are incomplete; payment initiation will report a configuration error.");
  }
  let notifier: Arc<dyn Notifier> = match &app_config.email.api_url {
    Some(url) => Arc::new(
      HttpNotifier::new(url.clone(), app_config.email.sender.clone(), app_config.http_timeout)
        .context("building email client")?,
    ),
    None => {
      tracing::warn!("EMAIL_API_URL is not set; confirmations are only logged.");
      Arc::new(LogNotifier::new(app_config.email.sender.clone()))
    }
  };

  let app_state = AppState {
    config: app_config.clone(),
    orders,
    promo_codes,
    carrier: Arc::new(carrier),
    gateway: Arc::new(gateway),
    notifier,
    clock,
  };
  let sagas = actix_data::Data::new(Sagas::new());
  let state_data = actix_data::Data::new(app_state);

  let server_address = format!("{}:{}", app_config.server_host, app_config.server_port);
  tracing::info!("Binding server to {}...", server_address);

  HttpServer::new(move || {
    App::new()
      .app_data(state_data.clone())
      .app_data(sagas.clone())
      .app_data(json_config())
      .wrap(tracing_actix_web::TracingLogger::default())
      .configure(configure_app_routes)
  })
  .bind(&server_address)
  .with_context(|| format!("binding {}", server_address))?
  .run()
  .await
  .context("running HTTP server")?;

  Ok(())
}
