// ufo_storefront/src/db/seed.rs

//! Demo promo codes for local runs (`SEED_DB=true`).

use crate::db::{PromoCodeStore, StoreError};
use crate::models::{DiscountType, PromoCode};
use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use tracing::info;
use uuid::Uuid;

fn demo_codes(now: DateTime<Utc>) -> Vec<PromoCode> {
  let valid_until = now + Duration::days(365);
  vec![
    PromoCode {
      id: Uuid::new_v4(),
      code: "SAVE10".to_string(),
      discount_type: DiscountType::Percentage,
      discount_value: Decimal::from(10),
      min_order_amount: None,
      max_uses: None,
      current_uses: 0,
      valid_from: now,
      valid_until,
      is_active: true,
    },
    PromoCode {
      id: Uuid::new_v4(),
      code: "WELCOME100".to_string(),
      discount_type: DiscountType::Fixed,
      discount_value: Decimal::from(100),
      min_order_amount: Some(Decimal::from(500)),
      max_uses: Some(100),
      current_uses: 0,
      valid_from: now,
      valid_until,
      is_active: true,
    },
  ]
}

/// Upserts the demo codes. Existing codes keep their usage counters.
pub async fn seed_promo_codes(store: &dyn PromoCodeStore, now: DateTime<Utc>) -> Result<usize, StoreError> {
  let codes = demo_codes(now);
  for promo in &codes {
    store.upsert_promo_code(promo).await?;
    info!(code = %promo.code, "Seeded promo code.");
  }
  Ok(codes.len())
}
