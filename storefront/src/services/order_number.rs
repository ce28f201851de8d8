// ufo_storefront/src/services/order_number.rs

//! Year-scoped sequential order numbers: `<PREFIX><YY><NNN>`, e.g. `UFO25001`.
//!
//! The sequence is three digits, so a prefix holds at most 999 orders per year;
//! the 1000th allocation fails instead of producing a longer number.
//!
//! Allocation is count-then-format and not atomic. Two concurrent checkouts can
//! compute the same number; the store's unique constraint rejects the second
//! insert and the order saga allocates again.

use crate::clock::Clock;
use crate::db::{OrderStore, StoreError};
use chrono::{DateTime, Datelike, NaiveDate, Utc};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, instrument};

#[derive(Debug, Error)]
pub enum AllocationError {
  #[error("Counting orders for prefix {prefix} failed: {source}")]
  Store {
    prefix: String,
    #[source]
    source: StoreError,
  },

  #[error("Year {0} is outside the supported calendar range")]
  Calendar(i32),

  #[error("All {max} order numbers for prefix {prefix} are used")]
  Exhausted { prefix: String, max: u64 },
}

/// Largest sequence that still fits the three-digit suffix.
pub const MAX_ORDERS_PER_YEAR: u64 = 999;

pub struct OrderNumberAllocator {
  store: Arc<dyn OrderStore>,
  clock: Arc<dyn Clock>,
  tag: String,
}

impl OrderNumberAllocator {
  pub fn new(store: Arc<dyn OrderStore>, clock: Arc<dyn Clock>, tag: impl Into<String>) -> Self {
    Self {
      store,
      clock,
      tag: tag.into(),
    }
  }

  /// Tag plus the two-digit year of `now`.
  pub fn prefix_for(&self, now: DateTime<Utc>) -> String {
    format!("{}{:02}", self.tag, now.year().rem_euclid(100))
  }

  pub async fn allocate(&self) -> Result<String, AllocationError> {
    self.allocate_at(self.clock.now()).await
  }

  #[instrument(name = "order_number::allocate", skip(self), fields(tag = %self.tag))]
  pub async fn allocate_at(&self, now: DateTime<Utc>) -> Result<String, AllocationError> {
    let prefix = self.prefix_for(now);
    let (from, until) = year_bounds(now.year())?;
    let existing = self
      .store
      .count_orders_with_prefix(&prefix, from, until)
      .await
      .map_err(|source| AllocationError::Store {
        prefix: prefix.clone(),
        source,
      })?;
    if existing >= MAX_ORDERS_PER_YEAR {
      error!(%prefix, existing, "Order number sequence for this year is exhausted.");
      return Err(AllocationError::Exhausted {
        prefix,
        max: MAX_ORDERS_PER_YEAR,
      });
    }
    let order_number = format!("{}{:03}", prefix, existing + 1);
    debug!(%order_number, existing, "Order number allocated.");
    Ok(order_number)
  }
}

fn year_start(year: i32) -> Option<DateTime<Utc>> {
  NaiveDate::from_ymd_opt(year, 1, 1)
    .and_then(|d| d.and_hms_opt(0, 0, 0))
    .map(|naive| naive.and_utc())
}

/// `[Jan 1 of year, Jan 1 of year + 1)` in UTC.
fn year_bounds(year: i32) -> Result<(DateTime<Utc>, DateTime<Utc>), AllocationError> {
  match (year_start(year), year_start(year + 1)) {
    (Some(from), Some(until)) => Ok((from, until)),
    _ => Err(AllocationError::Calendar(year)),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::clock::FixedClock;
  use crate::db::MemoryStore;
  use crate::models::{CustomerContact, NewOrder, ShipmentState, ShippingMethod};
  use chrono::TimeZone;
  use rust_decimal::Decimal;
  use std::collections::HashSet;
  use uuid::Uuid;

  fn order(number: &str, created_at: DateTime<Utc>) -> NewOrder {
    NewOrder {
      id: Uuid::new_v4(),
      order_number: number.to_string(),
      customer: CustomerContact {
        name: "Eva".to_string(),
        email: "eva@example.cz".to_string(),
        phone: "777000111".to_string(),
      },
      items: Vec::new(),
      total_price: Decimal::ONE,
      discount_amount: Decimal::ZERO,
      promo_code: None,
      shipping_method: ShippingMethod::PersonalPickup,
      shipping_price: Decimal::ZERO,
      pickup_point: None,
      shipment: ShipmentState::NotRequested,
      security_token_hash: String::new(),
      created_at,
    }
  }

  fn allocator(store: Arc<MemoryStore>, now: DateTime<Utc>) -> OrderNumberAllocator {
    OrderNumberAllocator::new(store, Arc::new(FixedClock(now)), "UFO")
  }

  #[tokio::test]
  async fn first_order_of_year() {
    let now = Utc.with_ymd_and_hms(2025, 2, 14, 10, 0, 0).unwrap();
    let number = allocator(Arc::new(MemoryStore::new()), now).allocate().await.unwrap();
    assert_eq!(number, "UFO25001");
  }

  #[tokio::test]
  async fn sequential_allocations_are_unique() {
    let store = Arc::new(MemoryStore::new());
    let now = Utc.with_ymd_and_hms(2025, 5, 1, 8, 0, 0).unwrap();
    let alloc = allocator(store.clone(), now);
    let mut seen = HashSet::new();
    for _ in 0..25 {
      let number = alloc.allocate().await.unwrap();
      store.insert_order(&order(&number, now)).await.unwrap();
      assert!(seen.insert(number));
    }
    assert!(seen.contains("UFO25025"));
  }

  #[tokio::test]
  async fn previous_year_does_not_count() {
    let store = Arc::new(MemoryStore::new());
    let last_year = Utc.with_ymd_and_hms(2024, 12, 31, 23, 59, 0).unwrap();
    store.insert_order(&order("UFO24001", last_year)).await.unwrap();
    store.insert_order(&order("UFO24002", last_year)).await.unwrap();

    let new_year = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 1).unwrap();
    assert_eq!(allocator(store, new_year).allocate().await.unwrap(), "UFO25001");
  }

  #[tokio::test]
  async fn concurrent_allocation_collides_and_store_rejects() {
    let store = Arc::new(MemoryStore::new());
    let now = Utc.with_ymd_and_hms(2025, 7, 1, 0, 0, 0).unwrap();
    let alloc = allocator(store.clone(), now);
    let (a, b) = tokio::join!(alloc.allocate(), alloc.allocate());
    let (a, b) = (a.unwrap(), b.unwrap());
    assert_eq!(a, b);

    store.insert_order(&order(&a, now)).await.unwrap();
    assert!(matches!(
      store.insert_order(&order(&b, now)).await,
      Err(StoreError::DuplicateKey { .. })
    ));
    assert_eq!(alloc.allocate().await.unwrap(), "UFO25002");
  }

  #[tokio::test]
  async fn sequence_stops_at_three_digits() {
    let store = Arc::new(MemoryStore::new());
    let now = Utc.with_ymd_and_hms(2025, 12, 1, 0, 0, 0).unwrap();
    for n in 1..MAX_ORDERS_PER_YEAR {
      store.insert_order(&order(&format!("UFO25{:03}", n), now)).await.unwrap();
    }
    let alloc = allocator(store.clone(), now);
    let last = alloc.allocate().await.unwrap();
    assert_eq!(last, "UFO25999");

    store.insert_order(&order(&last, now)).await.unwrap();
    assert!(matches!(
      alloc.allocate().await,
      Err(AllocationError::Exhausted { max: 999, .. })
    ));
  }

  #[test]
  fn number_matches_expected_shape() {
    let now = Utc.with_ymd_and_hms(2031, 1, 1, 0, 0, 0).unwrap();
    let alloc = allocator(Arc::new(MemoryStore::new()), now);
    assert_eq!(alloc.prefix_for(now), "UFO31");
  }
}
