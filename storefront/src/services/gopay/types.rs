// ufo_storefront/src/services/gopay/types.rs

use crate::models::{CustomerContact, PaymentStatus};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenScope {
  PaymentCreate,
  PaymentAll,
}

impl TokenScope {
  pub fn as_str(&self) -> &'static str {
    match self {
      TokenScope::PaymentCreate => "payment-create",
      TokenScope::PaymentAll => "payment-all",
    }
  }
}

#[derive(Debug, Clone)]
pub struct AccessToken {
  pub value: SecretString,
  pub expires_in: Option<u64>,
}

/// Payment to create, in major currency units.
#[derive(Debug, Clone)]
pub struct PaymentRequest {
  pub order_number: String,
  pub amount: Decimal,
  pub currency: String,
  pub customer: CustomerContact,
  pub items: Vec<PaymentItem>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentItem {
  pub name: String,
  /// Total for the line, major units.
  pub amount: Decimal,
  pub count: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedPayment {
  pub payment_id: String,
  pub gateway_url: String,
  pub state: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayPaymentState {
  Created,
  PaymentMethodChosen,
  Authorized,
  Paid,
  Canceled,
  Timeouted,
  Refunded,
  PartiallyRefunded,
  Other(String),
}

impl GatewayPaymentState {
  pub fn parse(raw: &str) -> Self {
    match raw {
      "CREATED" => GatewayPaymentState::Created,
      "PAYMENT_METHOD_CHOSEN" => GatewayPaymentState::PaymentMethodChosen,
      "AUTHORIZED" => GatewayPaymentState::Authorized,
      "PAID" => GatewayPaymentState::Paid,
      "CANCELED" => GatewayPaymentState::Canceled,
      "TIMEOUTED" => GatewayPaymentState::Timeouted,
      "REFUNDED" => GatewayPaymentState::Refunded,
      "PARTIALLY_REFUNDED" => GatewayPaymentState::PartiallyRefunded,
      other => GatewayPaymentState::Other(other.to_string()),
    }
  }

  /// The order's payment status for this gateway state; `None` while the payment is still open.
  pub fn payment_status(&self) -> Option<PaymentStatus> {
    match self {
      GatewayPaymentState::Paid => Some(PaymentStatus::Paid),
      GatewayPaymentState::Canceled | GatewayPaymentState::Timeouted => Some(PaymentStatus::Failed),
      GatewayPaymentState::Refunded | GatewayPaymentState::PartiallyRefunded => Some(PaymentStatus::Refunded),
      _ => None,
    }
  }
}

/// Major units to minor units (× 100), rounded half away from zero. `None` for
/// negative or out-of-range amounts.
pub fn to_minor_units(amount: Decimal) -> Option<i64> {
  if amount.is_sign_negative() && !amount.is_zero() {
    return None;
  }
  (amount * Decimal::ONE_HUNDRED)
    .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
    .to_i64()
}

// --- Wire format ---

#[derive(Debug, Deserialize)]
pub(crate) struct TokenResponse {
  pub access_token: Option<String>,
  pub expires_in: Option<u64>,
}

#[derive(Debug, Serialize)]
pub(crate) struct PaymentBody<'a> {
  pub payer: Payer<'a>,
  pub target: Target,
  pub amount: i64,
  pub currency: &'a str,
  pub order_number: &'a str,
  pub order_description: String,
  pub items: Vec<Item<'a>>,
  pub callback: Callback<'a>,
  pub lang: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct Payer<'a> {
  pub contact: Contact<'a>,
}

#[derive(Debug, Serialize)]
pub(crate) struct Contact<'a> {
  pub first_name: &'a str,
  pub last_name: &'a str,
  pub email: &'a str,
  pub phone_number: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct Target {
  #[serde(rename = "type")]
  pub kind: &'static str,
  pub goid: i64,
}

#[derive(Debug, Serialize)]
pub(crate) struct Item<'a> {
  #[serde(rename = "type")]
  pub kind: &'static str,
  pub name: &'a str,
  pub amount: i64,
  pub count: u32,
}

#[derive(Debug, Serialize)]
pub(crate) struct Callback<'a> {
  pub return_url: &'a str,
  pub notification_url: &'a str,
}

/// Gateway ids are JSON numbers; accept strings as well.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum GatewayId {
  Number(u64),
  Text(String),
}

impl GatewayId {
  pub fn into_string(self) -> String {
    match self {
      GatewayId::Number(n) => n.to_string(),
      GatewayId::Text(s) => s,
    }
  }
}

#[derive(Debug, Deserialize)]
pub(crate) struct PaymentResponse {
  pub id: Option<GatewayId>,
  pub gw_url: Option<String>,
  pub state: Option<String>,
}
