// ufo_storefront/src/pipelines/mod.rs

//! The storefront's sagas. Each is built once at startup and run per request
//! against a fresh context.

pub mod contexts;
pub mod order_pipeline;
pub mod payment_pipeline;
pub mod webhook_pipeline;

pub use order_pipeline::{CreatedOrder, OrderOrchestrator};
pub use payment_pipeline::{InitiatedPayment, PaymentInitiator};
pub use webhook_pipeline::{NotificationOutcome, PaymentNotifications};

#[derive(Default)]
pub struct Sagas {
  pub orders: OrderOrchestrator,
  pub payments: PaymentInitiator,
  pub notifications: PaymentNotifications,
}

impl Sagas {
  pub fn new() -> Self {
    tracing::info!("Building storefront sagas...");
    let sagas = Self::default();
    tracing::info!("Storefront sagas ready.");
    sagas
  }
}
