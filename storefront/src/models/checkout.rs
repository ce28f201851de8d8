// ufo_storefront/src/models/checkout.rs

//! The order-creation request as submitted by the storefront, and its
//! validated form.

use crate::errors::AppError;
use crate::models::order::{CustomerContact, LineItem, PickupPoint, ShippingMethod};
use rust_decimal::Decimal;
use serde::Deserialize;

const MIN_NAME_CHARS: usize = 2;
const MIN_PHONE_CHARS: usize = 9;
const MAX_ITEM_QUANTITY: f64 = 10_000.0;

/// Raw request body. Every field is optional so that a missing field is
/// reported as a specific validation message rather than a parse failure.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CheckoutRequest {
  pub items: Vec<CartItemRequest>,
  pub customer: CustomerRequest,
  pub shipping_method: Option<String>,
  pub pickup_point: Option<PickupPointRequest>,
  pub promo_code: Option<String>,
  pub total_price: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CartItemRequest {
  pub product_id: Option<String>,
  pub name: Option<String>,
  pub size: Option<String>,
  pub price: Option<f64>,
  pub quantity: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CustomerRequest {
  pub name: Option<String>,
  pub email: Option<String>,
  pub phone: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PickupPointRequest {
  pub id: Option<String>,
  pub name: Option<String>,
}

/// A request that passed validation.
#[derive(Debug, Clone)]
pub struct CheckoutInput {
  pub customer: CustomerContact,
  pub items: Vec<LineItem>,
  pub shipping_method: ShippingMethod,
  pub pickup_point: Option<PickupPoint>,
  /// Uppercased; `None` when absent or blank.
  pub promo_code: Option<String>,
  pub client_total: Decimal,
}

impl CheckoutInput {
  pub fn subtotal(&self) -> Decimal {
    self.items.iter().map(LineItem::line_total).sum()
  }
}

pub(crate) fn non_blank(value: &Option<String>) -> Option<&str> {
  value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

pub(crate) fn invalid(message: impl Into<String>) -> AppError {
  AppError::Validation(message.into())
}

impl CheckoutRequest {
  /// Checks the request and converts it into domain types. Runs before any
  /// side effect of order creation.
  pub fn validate(&self) -> Result<CheckoutInput, AppError> {
    if self.items.is_empty() {
      return Err(invalid("Cart is empty."));
    }
    let items = self
      .items
      .iter()
      .enumerate()
      .map(|(idx, item)| item.validate(idx + 1))
      .collect::<Result<Vec<_>, _>>()?;

    let customer = self.customer.validate()?;

    let shipping_method = non_blank(&self.shipping_method)
      .ok_or_else(|| invalid("Please choose a shipping method."))?
      .parse::<ShippingMethod>()
      .map_err(|_| invalid("Unknown shipping method."))?;

    let pickup_point = match (&self.pickup_point, shipping_method.requires_pickup_point()) {
      (_, false) => None,
      (Some(point), true) => {
        let id = non_blank(&point.id).ok_or_else(|| invalid("Please select a pickup point."))?;
        Some(PickupPoint {
          id: id.to_string(),
          name: non_blank(&point.name).unwrap_or(id).to_string(),
        })
      }
      (None, true) => return Err(invalid("Please select a pickup point.")),
    };

    let client_total = match self.total_price {
      Some(total) if total.is_finite() && total > 0.0 => {
        Decimal::try_from(total).map_err(|_| invalid("Total price must be a positive number."))?
      }
      _ => return Err(invalid("Total price must be a positive number.")),
    };

    Ok(CheckoutInput {
      customer,
      items,
      shipping_method,
      pickup_point,
      promo_code: non_blank(&self.promo_code).map(str::to_uppercase),
      client_total,
    })
  }
}

impl CartItemRequest {
  fn validate(&self, position: usize) -> Result<LineItem, AppError> {
    let product_id =
      non_blank(&self.product_id).ok_or_else(|| invalid(format!("Item {} is missing a product id.", position)))?;
    let name = non_blank(&self.name).ok_or_else(|| invalid(format!("Item {} is missing a name.", position)))?;

    let unit_price = self
      .price
      .filter(|p| p.is_finite() && *p >= 0.0)
      .and_then(|p| Decimal::try_from(p).ok())
      .ok_or_else(|| invalid(format!("Item {} has an invalid price.", position)))?;

    let quantity = self
      .quantity
      .filter(|q| q.is_finite() && q.fract() == 0.0 && *q >= 1.0 && *q <= MAX_ITEM_QUANTITY)
      .ok_or_else(|| invalid(format!("Item {} has an invalid quantity.", position)))?;

    Ok(LineItem {
      product_id: product_id.to_string(),
      name: name.to_string(),
      size: non_blank(&self.size).map(str::to_string),
      quantity: quantity as u32,
      unit_price: unit_price.round_dp(2),
    })
  }
}

impl CustomerRequest {
  pub(crate) fn validate(&self) -> Result<CustomerContact, AppError> {
    let email = non_blank(&self.email)
      .filter(|e| e.contains('@'))
      .ok_or_else(|| invalid("A valid email address is required."))?;
    let name = non_blank(&self.name)
      .filter(|n| n.chars().count() >= MIN_NAME_CHARS)
      .ok_or_else(|| invalid(format!("Name must be at least {} characters long.", MIN_NAME_CHARS)))?;
    let phone = non_blank(&self.phone)
      .filter(|p| p.chars().count() >= MIN_PHONE_CHARS)
      .ok_or_else(|| invalid(format!("Phone number must be at least {} characters long.", MIN_PHONE_CHARS)))?;

    Ok(CustomerContact {
      name: name.to_string(),
      email: email.to_string(),
      phone: phone.to_string(),
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  fn request(body: serde_json::Value) -> CheckoutRequest {
    serde_json::from_value(body).unwrap()
  }

  fn valid_body() -> serde_json::Value {
    json!({
      "items": [{ "productId": "p1", "name": "Tee", "size": "M", "price": 500, "quantity": 2 }],
      "customer": { "name": "Jan Novák", "email": "jan@example.cz", "phone": "+420777123456" },
      "shippingMethod": "pickup_point",
      "pickupPoint": { "id": "4321", "name": "Praha 1, Národní" },
      "promoCode": " save10 ",
      "totalPrice": 1079
    })
  }

  fn validation_message(body: serde_json::Value) -> String {
    match request(body).validate() {
      Err(AppError::Validation(message)) => message,
      other => panic!("expected validation error, got {:?}", other),
    }
  }

  #[test]
  fn accepts_valid_request() {
    let input = request(valid_body()).validate().unwrap();
    assert_eq!(input.subtotal(), Decimal::from(1000));
    assert_eq!(input.promo_code.as_deref(), Some("SAVE10"));
    assert_eq!(input.shipping_method, ShippingMethod::PickupPoint);
    assert_eq!(input.pickup_point.unwrap().id, "4321");
    assert_eq!(input.client_total, Decimal::from(1079));
  }

  #[test]
  fn rejects_empty_cart() {
    let mut body = valid_body();
    body["items"] = json!([]);
    assert_eq!(validation_message(body), "Cart is empty.");
  }

  #[test]
  fn rejects_email_without_at_sign() {
    let mut body = valid_body();
    body["customer"]["email"] = json!("not-an-email");
    assert!(validation_message(body).contains("email"));
  }

  #[test]
  fn rejects_short_name_and_phone() {
    let mut body = valid_body();
    body["customer"]["name"] = json!("J");
    assert!(validation_message(body).contains("Name"));

    let mut body = valid_body();
    body["customer"]["phone"] = json!("12345678");
    assert!(validation_message(body).contains("Phone"));
  }

  #[test]
  fn pickup_point_required_only_for_carrier_delivery() {
    let mut body = valid_body();
    body["pickupPoint"] = json!(null);
    assert_eq!(validation_message(body), "Please select a pickup point.");

    let mut body = valid_body();
    body["pickupPoint"] = json!(null);
    body["shippingMethod"] = json!("personal_pickup");
    let input = request(body).validate().unwrap();
    assert!(input.pickup_point.is_none());
  }

  #[test]
  fn rejects_item_without_numeric_fields() {
    let mut body = valid_body();
    body["items"][0]["price"] = json!(null);
    assert_eq!(validation_message(body), "Item 1 has an invalid price.");

    let mut body = valid_body();
    body["items"][0]["quantity"] = json!(1.5);
    assert_eq!(validation_message(body), "Item 1 has an invalid quantity.");

    let mut body = valid_body();
    body["items"][0]["productId"] = json!("  ");
    assert_eq!(validation_message(body), "Item 1 is missing a product id.");
  }

  #[test]
  fn rejects_non_positive_total() {
    let mut body = valid_body();
    body["totalPrice"] = json!(0);
    assert!(validation_message(body).contains("Total price"));

    let mut body = valid_body();
    body["totalPrice"] = json!(null);
    assert!(validation_message(body).contains("Total price"));
  }

  #[test]
  fn rejects_unknown_shipping_method() {
    let mut body = valid_body();
    body["shippingMethod"] = json!("drone");
    assert_eq!(validation_message(body), "Unknown shipping method.");
  }
}
