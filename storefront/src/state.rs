// ufo_storefront/src/state.rs

use crate::clock::Clock;
use crate::config::AppConfig;
use crate::db::{OrderStore, PromoCodeStore};
use crate::services::gopay::PaymentGateway;
use crate::services::notifier::Notifier;
use crate::services::packeta::ShipmentCarrier;
use std::sync::Arc;

/// Shared, explicitly constructed dependencies. Cloned into every saga context.
#[derive(Clone)]
pub struct AppState {
  pub config: Arc<AppConfig>,
  pub orders: Arc<dyn OrderStore>,
  pub promo_codes: Arc<dyn PromoCodeStore>,
  pub carrier: Arc<dyn ShipmentCarrier>,
  pub gateway: Arc<dyn PaymentGateway>,
  pub notifier: Arc<dyn Notifier>,
  pub clock: Arc<dyn Clock>,
}
