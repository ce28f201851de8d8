// ufo_storefront/src/models/promo_code.rs

use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscountType {
  Percentage,
  Fixed,
}

impl DiscountType {
  pub fn as_str(&self) -> &'static str {
    match self {
      DiscountType::Percentage => "PERCENTAGE",
      DiscountType::Fixed => "FIXED",
    }
  }
}

impl FromStr for DiscountType {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "PERCENTAGE" => Ok(DiscountType::Percentage),
      "FIXED" => Ok(DiscountType::Fixed),
      other => Err(format!("unknown discount type '{}'", other)),
    }
  }
}

#[derive(Debug, Clone)]
pub struct PromoCode {
  pub id: Uuid,
  /// Always stored uppercase.
  pub code: String,
  pub discount_type: DiscountType,
  pub discount_value: Decimal,
  pub min_order_amount: Option<Decimal>,
  pub max_uses: Option<i32>,
  pub current_uses: i32,
  pub valid_from: DateTime<Utc>,
  pub valid_until: DateTime<Utc>,
  pub is_active: bool,
}

/// Why a code did not apply. Only ever logged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromoRejection {
  Inactive,
  NotYetValid,
  Expired,
  UsageCapReached,
  BelowMinimum { minimum: Decimal },
}

impl fmt::Display for PromoRejection {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      PromoRejection::Inactive => write!(f, "code is inactive"),
      PromoRejection::NotYetValid => write!(f, "code is not valid yet"),
      PromoRejection::Expired => write!(f, "code has expired"),
      PromoRejection::UsageCapReached => write!(f, "code reached its usage cap"),
      PromoRejection::BelowMinimum { minimum } => write!(f, "subtotal is below the minimum of {}", minimum),
    }
  }
}

impl PromoCode {
  pub fn normalize_code(raw: &str) -> String {
    raw.trim().to_uppercase()
  }

  /// Eligibility of the code for `subtotal` at `now`. The window is inclusive on both ends.
  pub fn check_eligibility(&self, subtotal: Decimal, now: DateTime<Utc>) -> Result<(), PromoRejection> {
    if !self.is_active {
      return Err(PromoRejection::Inactive);
    }
    if now < self.valid_from {
      return Err(PromoRejection::NotYetValid);
    }
    if now > self.valid_until {
      return Err(PromoRejection::Expired);
    }
    if let Some(max_uses) = self.max_uses {
      if self.current_uses >= max_uses {
        return Err(PromoRejection::UsageCapReached);
      }
    }
    if let Some(minimum) = self.min_order_amount {
      if subtotal < minimum {
        return Err(PromoRejection::BelowMinimum { minimum });
      }
    }
    Ok(())
  }

  /// Percentage discounts round half away from zero to whole currency units.
  /// Fixed discounts are the flat value and are not capped by the subtotal.
  pub fn discount_for(&self, subtotal: Decimal) -> Decimal {
    match self.discount_type {
      DiscountType::Percentage => (subtotal * self.discount_value / Decimal::ONE_HUNDRED)
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero),
      DiscountType::Fixed => self.discount_value,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use chrono::TimeZone;

  fn promo(discount_type: DiscountType, value: i64) -> PromoCode {
    PromoCode {
      id: Uuid::new_v4(),
      code: "SAVE10".to_string(),
      discount_type,
      discount_value: Decimal::from(value),
      min_order_amount: None,
      max_uses: None,
      current_uses: 0,
      valid_from: Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(),
      valid_until: Utc.with_ymd_and_hms(2025, 12, 31, 23, 59, 59).unwrap(),
      is_active: true,
    }
  }

  #[test]
  fn percentage_rounds_to_whole_units() {
    let code = promo(DiscountType::Percentage, 15);
    // 15% of 333 = 49.95
    assert_eq!(code.discount_for(Decimal::from(333)), Decimal::from(50));
    assert_eq!(code.discount_for(Decimal::from(1000)), Decimal::from(150));
  }

  #[test]
  fn fixed_may_exceed_subtotal() {
    let code = promo(DiscountType::Fixed, 200);
    assert_eq!(code.discount_for(Decimal::from(150)), Decimal::from(200));
  }

  #[test]
  fn window_is_inclusive() {
    let code = promo(DiscountType::Fixed, 50);
    assert!(code.check_eligibility(Decimal::from(100), code.valid_from).is_ok());
    assert!(code.check_eligibility(Decimal::from(100), code.valid_until).is_ok());
    let after = code.valid_until + chrono::Duration::seconds(1);
    assert_eq!(
      code.check_eligibility(Decimal::from(100), after),
      Err(PromoRejection::Expired)
    );
  }

  #[test]
  fn cap_and_minimum_are_checked() {
    let now = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
    let mut code = promo(DiscountType::Percentage, 10);
    code.max_uses = Some(3);
    code.current_uses = 3;
    assert_eq!(
      code.check_eligibility(Decimal::from(1000), now),
      Err(PromoRejection::UsageCapReached)
    );

    code.current_uses = 0;
    code.min_order_amount = Some(Decimal::from(500));
    assert!(matches!(
      code.check_eligibility(Decimal::from(499), now),
      Err(PromoRejection::BelowMinimum { .. })
    ));
    assert!(code.check_eligibility(Decimal::from(500), now).is_ok());
  }

  #[test]
  fn normalizes_to_uppercase() {
    assert_eq!(PromoCode::normalize_code("  save10 "), "SAVE10");
  }
}
