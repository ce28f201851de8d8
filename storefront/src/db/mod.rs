// ufo_storefront/src/db/mod.rs

//! Persistence contracts for orders and promo codes.
//!
//! The order-creation saga needs three things from a store: an insert that
//! enforces order-number uniqueness, a count of orders by number prefix and
//! creation window, and conditional updates. Both implementations (Postgres and
//! in-memory) provide exactly that.

pub mod memory;
pub mod postgres;
pub mod seed;

use crate::models::{NewOrder, Order, OrderStatus, PaymentStatus, PromoCode, ShipmentState};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[derive(Debug, Error)]
pub enum StoreError {
  #[error("Unique constraint violated: {constraint}")]
  DuplicateKey { constraint: String },

  #[error("Record not found: {0}")]
  NotFound(String),

  #[error("Promo code {code} has no uses left")]
  PromoCodeUnavailable { code: String },

  #[error("Order status cannot move from {from} to {to}")]
  IllegalTransition { from: OrderStatus, to: OrderStatus },

  #[error("Stored record is inconsistent: {0}")]
  Corrupt(String),

  #[error("Database error: {0}")]
  Backend(#[source] sqlx::Error),
}

#[async_trait]
pub trait OrderStore: Send + Sync {
  /// Orders whose number starts with `prefix` and that were created in `[from, until)`.
  async fn count_orders_with_prefix(
    &self,
    prefix: &str,
    from: DateTime<Utc>,
    until: DateTime<Utc>,
  ) -> Result<u64, StoreError>;

  /// Writes the order atomically. A taken order number yields `StoreError::DuplicateKey`.
  ///
  /// When the order references a promo code, one use of it is consumed in the
  /// same write: the order is stored only if the code is still below its cap
  /// (`StoreError::PromoCodeUnavailable` otherwise), and a rejected insert
  /// consumes nothing.
  async fn insert_order(&self, order: &NewOrder) -> Result<(), StoreError>;

  async fn find_by_number(&self, order_number: &str) -> Result<Option<Order>, StoreError>;

  async fn find_by_payment_id(&self, payment_id: &str) -> Result<Option<Order>, StoreError>;

  async fn record_shipment(&self, order_id: Uuid, shipment: &ShipmentState) -> Result<(), StoreError>;

  async fn attach_payment_id(&self, order_number: &str, payment_id: &str) -> Result<(), StoreError>;

  /// Sets the payment status. Returns `false` when it already had that value.
  async fn set_payment_status(&self, order_id: Uuid, status: PaymentStatus) -> Result<bool, StoreError>;

  /// Moves the order from `from` to `to` only if it is still in `from`.
  /// Pairs the status machine does not allow fail with `StoreError::IllegalTransition`.
  async fn transition_status(&self, order_id: Uuid, from: OrderStatus, to: OrderStatus) -> Result<bool, StoreError>;
}

#[async_trait]
pub trait PromoCodeStore: Send + Sync {
  /// Looks up an already-uppercased code.
  async fn find_by_code(&self, code: &str) -> Result<Option<PromoCode>, StoreError>;

  /// Increments `current_uses` by one if the code is still below its cap.
  /// Returns `false` when the cap was reached in the meantime. Orders redeem
  /// their code through `OrderStore::insert_order` instead.
  async fn consume_use(&self, promo_id: Uuid) -> Result<bool, StoreError>;

  async fn upsert_promo_code(&self, promo: &PromoCode) -> Result<(), StoreError>;
}
