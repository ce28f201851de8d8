// ufo_storefront/src/services/promo.rs

use crate::clock::Clock;
use crate::db::{PromoCodeStore, StoreError};
use crate::models::PromoCode;
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{info, instrument, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedPromo {
  pub code: String,
  pub discount: Decimal,
}

pub struct PromoCodeEngine {
  store: Arc<dyn PromoCodeStore>,
  clock: Arc<dyn Clock>,
}

impl PromoCodeEngine {
  pub fn new(store: Arc<dyn PromoCodeStore>, clock: Arc<dyn Clock>) -> Self {
    Self { store, clock }
  }

  /// Discount for `code` on `subtotal`, or zero. Never fails: a lookup error
  /// is logged and treated as "no discount".
  pub async fn apply(&self, code: &str, subtotal: Decimal) -> Decimal {
    match self.try_apply(code, subtotal).await {
      Ok(Some(applied)) => applied.discount,
      Ok(None) => Decimal::ZERO,
      Err(e) => {
        warn!(error = %e, "Promo code lookup failed, continuing without discount.");
        Decimal::ZERO
      }
    }
  }

  /// Like `apply`, but surfaces store errors and the normalized code.
  ///
  /// A use is consumed only when the code applies. The consume is a single
  /// conditional increment, so two requests racing for the last use cannot
  /// both get the discount.
  #[instrument(name = "promo::apply", skip(self), fields(subtotal = %subtotal))]
  pub async fn try_apply(&self, code: &str, subtotal: Decimal) -> Result<Option<AppliedPromo>, StoreError> {
    let Some((promo, applied)) = self.eligible(code, subtotal).await? else {
      return Ok(None);
    };
    if !self.store.consume_use(promo.id).await? {
      info!(code = %applied.code, "Promo code reached its usage cap concurrently.");
      return Ok(None);
    }
    info!(code = %applied.code, discount = %applied.discount, "Promo code applied.");
    Ok(Some(applied))
  }

  /// The discount `code` would give on `subtotal`, without consuming a use.
  /// Checkout redeems the use together with the order insert.
  #[instrument(name = "promo::quote", skip(self), fields(subtotal = %subtotal))]
  pub async fn quote(&self, code: &str, subtotal: Decimal) -> Result<Option<AppliedPromo>, StoreError> {
    Ok(self.eligible(code, subtotal).await?.map(|(_, applied)| applied))
  }

  async fn eligible(&self, code: &str, subtotal: Decimal) -> Result<Option<(PromoCode, AppliedPromo)>, StoreError> {
    let normalized = PromoCode::normalize_code(code);
    if normalized.is_empty() {
      return Ok(None);
    }
    let Some(promo) = self.store.find_by_code(&normalized).await? else {
      info!(code = %normalized, "Promo code not found.");
      return Ok(None);
    };
    if let Err(rejection) = promo.check_eligibility(subtotal, self.clock.now()) {
      info!(code = %normalized, reason = %rejection, "Promo code not applicable.");
      return Ok(None);
    }
    let applied = AppliedPromo {
      code: normalized,
      discount: promo.discount_for(subtotal),
    };
    Ok(Some((promo, applied)))
  }
}
