// ufo_storefront/src/web/dto.rs

//! Response bodies and query strings. Request bodies live in `models`, next to
//! their validation.

use crate::models::{Order, ShipmentState};
use crate::pipelines::{CreatedOrder, InitiatedPayment};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedOrderResponse {
  pub order_number: String,
  pub order_id: Uuid,
  pub security_token: String,
}

impl From<CreatedOrder> for CreatedOrderResponse {
  fn from(created: CreatedOrder) -> Self {
    Self {
      order_number: created.order_number,
      order_id: created.order_id,
      security_token: created.security_token,
    }
  }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShipmentView {
  pub state: &'static str,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub tracking_number: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub error: Option<String>,
}

impl From<&ShipmentState> for ShipmentView {
  fn from(shipment: &ShipmentState) -> Self {
    Self {
      state: shipment.label(),
      tracking_number: shipment.tracking_number().map(str::to_string),
      error: match shipment {
        ShipmentState::Failed { reason } => Some(reason.clone()),
        _ => None,
      },
    }
  }
}

/// What a customer holding the security token may see.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderStatusResponse {
  pub order_number: String,
  pub status: &'static str,
  pub payment_status: &'static str,
  pub total_price: Decimal,
  pub shipping_method: &'static str,
  pub shipment: ShipmentView,
  pub created_at: DateTime<Utc>,
}

impl From<&Order> for OrderStatusResponse {
  fn from(order: &Order) -> Self {
    Self {
      order_number: order.order_number.clone(),
      status: order.status.as_str(),
      payment_status: order.payment_status.as_str(),
      total_price: order.total_price,
      shipping_method: order.shipping_method.as_str(),
      shipment: ShipmentView::from(&order.shipment),
      created_at: order.created_at,
    }
  }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentInitiatedResponse {
  pub payment_id: String,
  pub gateway_url: String,
}

impl From<InitiatedPayment> for PaymentInitiatedResponse {
  fn from(payment: InitiatedPayment) -> Self {
    Self {
      payment_id: payment.payment_id,
      gateway_url: payment.gateway_url,
    }
  }
}

#[derive(Debug, Deserialize)]
pub struct TokenQuery {
  pub token: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct NotificationQuery {
  pub id: Option<String>,
}
