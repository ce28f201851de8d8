// ufo_storefront/src/models/payment.rs

use crate::errors::AppError;
use crate::models::checkout::{invalid, non_blank, CustomerRequest};
use crate::models::Order;
use crate::services::gopay::{PaymentItem, PaymentRequest};
use rust_decimal::Decimal;
use serde::Deserialize;

/// Payment-initiation request. Amounts are in major currency units.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PaymentInitiationRequest {
  pub order_number: Option<String>,
  pub amount: Option<f64>,
  pub customer: CustomerRequest,
  pub items: Vec<PaymentItemRequest>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PaymentItemRequest {
  pub name: Option<String>,
  /// Unit price.
  pub price: Option<f64>,
  pub quantity: Option<f64>,
}

fn positive_decimal(value: Option<f64>) -> Option<Decimal> {
  value
    .filter(|v| v.is_finite() && *v > 0.0)
    .and_then(|v| Decimal::try_from(v).ok())
    .map(|d| d.round_dp(2))
}

impl PaymentInitiationRequest {
  /// With no items, the whole amount is sent as a single line named after the order.
  pub fn validate(&self, currency: &str) -> Result<PaymentRequest, AppError> {
    let order_number = non_blank(&self.order_number).ok_or_else(|| invalid("Order number is required."))?;
    let amount = positive_decimal(self.amount).ok_or_else(|| invalid("Amount must be a positive number."))?;
    let customer = self.customer.validate()?;

    let mut items = Vec::with_capacity(self.items.len().max(1));
    for (idx, item) in self.items.iter().enumerate() {
      let position = idx + 1;
      let name = non_blank(&item.name).ok_or_else(|| invalid(format!("Item {} is missing a name.", position)))?;
      let unit_price = item
        .price
        .filter(|p| p.is_finite() && *p >= 0.0)
        .and_then(|p| Decimal::try_from(p).ok())
        .ok_or_else(|| invalid(format!("Item {} has an invalid price.", position)))?;
      let count = item
        .quantity
        .filter(|q| q.is_finite() && q.fract() == 0.0 && *q >= 1.0 && *q <= u32::MAX as f64)
        .ok_or_else(|| invalid(format!("Item {} has an invalid quantity.", position)))? as u32;
      items.push(PaymentItem {
        name: name.to_string(),
        amount: (unit_price * Decimal::from(count)).round_dp(2),
        count,
      });
    }
    if items.is_empty() {
      items.push(single_order_line(order_number, amount));
    }

    Ok(PaymentRequest {
      order_number: order_number.to_string(),
      amount,
      currency: currency.to_string(),
      customer,
      items,
    })
  }
}

fn single_order_line(order_number: &str, amount: Decimal) -> PaymentItem {
  PaymentItem {
    name: format!("Order {}", order_number),
    amount,
    count: 1,
  }
}

/// Line items for charging a stored order, summing to its total. Goods and
/// shipping are listed separately when they add up to the total; a discounted
/// order goes out as one line.
pub fn order_payment_items(order: &Order) -> Vec<PaymentItem> {
  let mut items: Vec<PaymentItem> = order
    .items
    .iter()
    .map(|item| PaymentItem {
      name: item.name.clone(),
      amount: item.line_total().round_dp(2),
      count: item.quantity,
    })
    .collect();
  if order.shipping_price > Decimal::ZERO {
    items.push(PaymentItem {
      name: "Shipping".to_string(),
      amount: order.shipping_price,
      count: 1,
    });
  }
  let listed: Decimal = items.iter().map(|i| i.amount).sum();
  if items.is_empty() || listed != order.total_price {
    return vec![single_order_line(&order.order_number, order.total_price)];
  }
  items
}
