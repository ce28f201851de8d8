// ufo_storefront/src/models/order.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
  Pending,
  Paid,
  Processing,
  Shipped,
  Completed,
  Cancelled,
}

impl OrderStatus {
  pub fn as_str(&self) -> &'static str {
    match self {
      OrderStatus::Pending => "PENDING",
      OrderStatus::Paid => "PAID",
      OrderStatus::Processing => "PROCESSING",
      OrderStatus::Shipped => "SHIPPED",
      OrderStatus::Completed => "COMPLETED",
      OrderStatus::Cancelled => "CANCELLED",
    }
  }

  pub fn is_terminal(&self) -> bool {
    matches!(self, OrderStatus::Completed | OrderStatus::Cancelled)
  }

  /// The lifecycle is linear, PENDING → PAID → PROCESSING → SHIPPED → COMPLETED,
  /// and any non-terminal status may be cancelled.
  pub fn can_transition_to(&self, next: OrderStatus) -> bool {
    use OrderStatus::*;
    match (self, next) {
      (current, Cancelled) => !current.is_terminal(),
      (Pending, Paid) | (Paid, Processing) | (Processing, Shipped) | (Shipped, Completed) => true,
      _ => false,
    }
  }
}

impl fmt::Display for OrderStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for OrderStatus {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "PENDING" => Ok(OrderStatus::Pending),
      "PAID" => Ok(OrderStatus::Paid),
      "PROCESSING" => Ok(OrderStatus::Processing),
      "SHIPPED" => Ok(OrderStatus::Shipped),
      "COMPLETED" => Ok(OrderStatus::Completed),
      "CANCELLED" => Ok(OrderStatus::Cancelled),
      other => Err(format!("unknown order status '{}'", other)),
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
  Pending,
  Paid,
  Failed,
  Refunded,
}

impl PaymentStatus {
  pub fn as_str(&self) -> &'static str {
    match self {
      PaymentStatus::Pending => "PENDING",
      PaymentStatus::Paid => "PAID",
      PaymentStatus::Failed => "FAILED",
      PaymentStatus::Refunded => "REFUNDED",
    }
  }
}

impl fmt::Display for PaymentStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for PaymentStatus {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "PENDING" => Ok(PaymentStatus::Pending),
      "PAID" => Ok(PaymentStatus::Paid),
      "FAILED" => Ok(PaymentStatus::Failed),
      "REFUNDED" => Ok(PaymentStatus::Refunded),
      other => Err(format!("unknown payment status '{}'", other)),
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShippingMethod {
  /// Delivery to a carrier pickup point; needs a selected point and a packet booking.
  PickupPoint,
  /// Collected in person at the shop.
  PersonalPickup,
}

impl ShippingMethod {
  pub fn as_str(&self) -> &'static str {
    match self {
      ShippingMethod::PickupPoint => "pickup_point",
      ShippingMethod::PersonalPickup => "personal_pickup",
    }
  }

  pub fn requires_pickup_point(&self) -> bool {
    matches!(self, ShippingMethod::PickupPoint)
  }

  pub fn requires_carrier_booking(&self) -> bool {
    matches!(self, ShippingMethod::PickupPoint)
  }
}

impl FromStr for ShippingMethod {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "pickup_point" => Ok(ShippingMethod::PickupPoint),
      "personal_pickup" => Ok(ShippingMethod::PersonalPickup),
      other => Err(format!("unknown shipping method '{}'", other)),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerContact {
  pub name: String,
  pub email: String,
  pub phone: String,
}

impl CustomerContact {
  /// Splits the full name for APIs that want first and last name separately.
  pub fn split_name(&self) -> (&str, &str) {
    let trimmed = self.name.trim();
    match trimmed.rsplit_once(' ') {
      Some((first, last)) => (first.trim(), last.trim()),
      None => (trimmed, ""),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PickupPoint {
  pub id: String,
  pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
  pub product_id: String,
  pub name: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub size: Option<String>,
  pub quantity: u32,
  pub unit_price: Decimal,
}

impl LineItem {
  pub fn line_total(&self) -> Decimal {
    self.unit_price * Decimal::from(self.quantity)
  }
}

/// Carrier-side parcel for an order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShipmentState {
  /// The shipping method needs no carrier booking.
  NotRequested,
  /// Booking is required but has not completed.
  Pending,
  Booked { packet_id: String, barcode: String },
  /// Booking failed; `reason` is the customer-safe message.
  Failed { reason: String },
}

impl ShipmentState {
  pub fn initial_for(method: ShippingMethod) -> Self {
    if method.requires_carrier_booking() {
      ShipmentState::Pending
    } else {
      ShipmentState::NotRequested
    }
  }

  pub fn label(&self) -> &'static str {
    match self {
      ShipmentState::NotRequested => "NOT_REQUESTED",
      ShipmentState::Pending => "PENDING",
      ShipmentState::Booked { .. } => "BOOKED",
      ShipmentState::Failed { .. } => "FAILED",
    }
  }

  pub fn tracking_number(&self) -> Option<&str> {
    match self {
      ShipmentState::Booked { barcode, .. } => Some(barcode),
      _ => None,
    }
  }

  /// Rebuilds the state from its column representation, rejecting combinations
  /// the sum type cannot express (e.g. a barcode without a packet id).
  pub fn from_columns(
    label: &str,
    packet_id: Option<String>,
    tracking_number: Option<String>,
    carrier_error: Option<String>,
  ) -> Result<Self, String> {
    match (label, packet_id, tracking_number, carrier_error) {
      ("NOT_REQUESTED", None, None, None) => Ok(ShipmentState::NotRequested),
      ("PENDING", None, None, None) => Ok(ShipmentState::Pending),
      ("BOOKED", Some(packet_id), Some(barcode), None) => Ok(ShipmentState::Booked { packet_id, barcode }),
      ("FAILED", None, None, Some(reason)) => Ok(ShipmentState::Failed { reason }),
      (label, packet_id, tracking, error) => Err(format!(
        "inconsistent shipment columns: state={} packet_id={:?} tracking={:?} error={:?}",
        label, packet_id, tracking, error
      )),
    }
  }

  /// `(state, packet_id, tracking_number, carrier_error)` for storage.
  pub fn to_columns(&self) -> (&'static str, Option<&str>, Option<&str>, Option<&str>) {
    match self {
      ShipmentState::Booked { packet_id, barcode } => (self.label(), Some(packet_id), Some(barcode), None),
      ShipmentState::Failed { reason } => (self.label(), None, None, Some(reason)),
      _ => (self.label(), None, None, None),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentLink {
  NotStarted,
  Created { payment_id: String },
}

impl PaymentLink {
  pub fn from_column(payment_id: Option<String>) -> Self {
    match payment_id {
      Some(payment_id) => PaymentLink::Created { payment_id },
      None => PaymentLink::NotStarted,
    }
  }

  pub fn payment_id(&self) -> Option<&str> {
    match self {
      PaymentLink::Created { payment_id } => Some(payment_id),
      PaymentLink::NotStarted => None,
    }
  }
}

/// An order as written once by the order-creation saga.
#[derive(Debug, Clone)]
pub struct NewOrder {
  pub id: Uuid,
  pub order_number: String,
  pub customer: CustomerContact,
  pub items: Vec<LineItem>,
  pub total_price: Decimal,
  pub discount_amount: Decimal,
  pub promo_code: Option<String>,
  pub shipping_method: ShippingMethod,
  pub shipping_price: Decimal,
  pub pickup_point: Option<PickupPoint>,
  pub shipment: ShipmentState,
  pub security_token_hash: String,
  pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct Order {
  pub id: Uuid,
  pub order_number: String,
  pub customer: CustomerContact,
  pub items: Vec<LineItem>,
  pub total_price: Decimal,
  pub discount_amount: Decimal,
  pub promo_code: Option<String>,
  pub shipping_method: ShippingMethod,
  pub shipping_price: Decimal,
  pub pickup_point: Option<PickupPoint>,
  pub status: OrderStatus,
  pub payment_status: PaymentStatus,
  pub payment: PaymentLink,
  pub shipment: ShipmentState,
  pub security_token_hash: String,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

impl From<NewOrder> for Order {
  fn from(new: NewOrder) -> Self {
    Order {
      id: new.id,
      order_number: new.order_number,
      customer: new.customer,
      items: new.items,
      total_price: new.total_price,
      discount_amount: new.discount_amount,
      promo_code: new.promo_code,
      shipping_method: new.shipping_method,
      shipping_price: new.shipping_price,
      pickup_point: new.pickup_point,
      status: OrderStatus::Pending,
      payment_status: PaymentStatus::Pending,
      payment: PaymentLink::NotStarted,
      shipment: new.shipment,
      security_token_hash: new.security_token_hash,
      created_at: new.created_at,
      updated_at: new.created_at,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn status_follows_linear_path() {
    assert!(OrderStatus::Pending.can_transition_to(OrderStatus::Paid));
    assert!(OrderStatus::Paid.can_transition_to(OrderStatus::Processing));
    assert!(OrderStatus::Processing.can_transition_to(OrderStatus::Shipped));
    assert!(OrderStatus::Shipped.can_transition_to(OrderStatus::Completed));
    assert!(!OrderStatus::Pending.can_transition_to(OrderStatus::Shipped));
    assert!(!OrderStatus::Paid.can_transition_to(OrderStatus::Pending));
  }

  #[test]
  fn cancel_only_from_non_terminal() {
    assert!(OrderStatus::Shipped.can_transition_to(OrderStatus::Cancelled));
    assert!(!OrderStatus::Completed.can_transition_to(OrderStatus::Cancelled));
    assert!(!OrderStatus::Cancelled.can_transition_to(OrderStatus::Cancelled));
  }

  #[test]
  fn status_strings_parse_back() {
    for status in [OrderStatus::Pending, OrderStatus::Shipped, OrderStatus::Cancelled] {
      assert_eq!(status.as_str().parse::<OrderStatus>(), Ok(status));
    }
    assert!("SHIPPING".parse::<OrderStatus>().is_err());
  }

  #[test]
  fn shipment_columns_reject_barcode_without_packet() {
    let result = ShipmentState::from_columns("BOOKED", None, Some("Z123".to_string()), None);
    assert!(result.is_err());
  }

  #[test]
  fn booked_shipment_columns() {
    let booked = ShipmentState::Booked {
      packet_id: "1234567890".to_string(),
      barcode: "Z1234567890".to_string(),
    };
    assert_eq!(booked.to_columns(), ("BOOKED", Some("1234567890"), Some("Z1234567890"), None));
    assert_eq!(booked.tracking_number(), Some("Z1234567890"));
  }

  #[test]
  fn only_pickup_point_needs_a_booking() {
    assert_eq!(ShipmentState::initial_for(ShippingMethod::PickupPoint), ShipmentState::Pending);
    assert_eq!(
      ShipmentState::initial_for(ShippingMethod::PersonalPickup),
      ShipmentState::NotRequested
    );
  }

  #[test]
  fn customer_name_split() {
    let contact = CustomerContact {
      name: "Jana Nováková".to_string(),
      email: "jana@example.cz".to_string(),
      phone: "+420777123456".to_string(),
    };
    assert_eq!(contact.split_name(), ("Jana", "Nováková"));
  }
}
