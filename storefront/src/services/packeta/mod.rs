// ufo_storefront/src/services/packeta/mod.rs

//! Packeta (Zásilkovna) carrier adapter.
//!
//! Every call is a synchronous XML POST to the REST endpoint with the API
//! password embedded in the body. The adapter keeps no state and never
//! retries; callers decide what a failure means for them.

mod error;
mod wire;

pub use error::{classify_fault, ShipmentApiError, ShipmentErrorKind};
pub use wire::PacketAttributes;

use crate::config::PacketaConfig;
use crate::models::NewOrder;
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use rust_decimal::Decimal;
use secrecy::{ExposeSecret, SecretString};
use std::time::Duration;
use tracing::{info, instrument};
use wire::XmlNode;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PacketBooking {
  pub id: String,
  pub barcode: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PacketStatus {
  pub code: String,
  pub code_text: String,
  pub status_text: String,
}

#[async_trait]
pub trait ShipmentCarrier: Send + Sync {
  async fn create_packet(&self, attributes: &PacketAttributes) -> Result<PacketBooking, ShipmentApiError>;

  async fn packet_status(&self, packet_id: &str) -> Result<PacketStatus, ShipmentApiError>;

  /// Status text of the most recent tracking record, `None` when there is no record yet.
  async fn packet_tracking(&self, packet_id: &str) -> Result<Option<String>, ShipmentApiError>;

  /// `Ok(false)` when the carrier reports the attributes as invalid.
  async fn packet_attributes_valid(&self, attributes: &PacketAttributes) -> Result<bool, ShipmentApiError>;
}

impl PacketAttributes {
  /// Attributes for booking `order` to its pickup point. `None` when the order has no pickup point.
  pub fn for_order(order: &NewOrder, config: &PacketaConfig, currency: &str) -> Option<Self> {
    let pickup_point = order.pickup_point.as_ref()?;
    let (name, surname) = order.customer.split_name();
    Some(PacketAttributes {
      number: order.order_number.clone(),
      name: name.to_string(),
      surname: surname.to_string(),
      email: order.customer.email.clone(),
      phone: order.customer.phone.clone(),
      address_id: pickup_point.id.clone(),
      value: decimal_text(order.total_price),
      currency: currency.to_string(),
      weight: decimal_text(config.default_weight_kg),
      eshop: Some(config.eshop.clone()).filter(|e| !e.is_empty()),
    })
  }
}

fn decimal_text(value: Decimal) -> String {
  value.normalize().to_string()
}

pub struct PacketaClient {
  client: reqwest::Client,
  api_url: String,
  api_password: Option<SecretString>,
}

impl PacketaClient {
  pub fn new(config: &PacketaConfig, timeout: Duration) -> Result<Self, reqwest::Error> {
    let client = reqwest::Client::builder().timeout(timeout).build()?;
    Ok(Self {
      client,
      api_url: config.api_url.clone(),
      api_password: config.api_password.clone(),
    })
  }

  fn api_password(&self) -> Result<&str, ShipmentApiError> {
    self
      .api_password
      .as_ref()
      .map(|p| p.expose_secret())
      .ok_or_else(|| ShipmentApiError::new(ShipmentErrorKind::IncorrectApiPassword, "PACKETA_API_PASSWORD is not configured"))
  }

  async fn call(&self, method: &str, body: String) -> Result<XmlNode, ShipmentApiError> {
    let response = self
      .client
      .post(&self.api_url)
      .header(CONTENT_TYPE, "text/xml; charset=utf-8")
      .body(body)
      .send()
      .await
      .map_err(|e| ShipmentApiError::from_transport(method, &e))?;
    let http_status = response.status();
    let text = response
      .text()
      .await
      .map_err(|e| ShipmentApiError::from_transport(method, &e))?;
    wire::decode_response(method, &text).map_err(|mut err| {
      if !http_status.is_success() {
        err.technical_message = format!("{} (HTTP {})", err.technical_message, http_status);
      }
      err
    })
  }

  fn required_text(result: &XmlNode, method: &str, field: &str) -> Result<String, ShipmentApiError> {
    result.child_text(field).map(str::to_string).ok_or_else(|| {
      ShipmentApiError::new(
        ShipmentErrorKind::UnknownError,
        format!("{} response is missing <{}>", method, field),
      )
    })
  }
}

fn packet_status_from(result: &XmlNode) -> Result<PacketStatus, ShipmentApiError> {
  Ok(PacketStatus {
    code: PacketaClient::required_text(result, "packetStatus", "statusCode")?,
    code_text: result.child_text("codeText").unwrap_or_default().to_string(),
    status_text: result.child_text("statusText").unwrap_or_default().to_string(),
  })
}

/// Records come oldest first; the last one is the current state.
fn latest_tracking(result: &XmlNode) -> Option<String> {
  result
    .children_named("record")
    .last()
    .and_then(|record| record.child_text("statusText"))
    .map(str::to_string)
}

#[async_trait]
impl ShipmentCarrier for PacketaClient {
  #[instrument(name = "packeta::create_packet", skip(self, attributes), fields(order_number = %attributes.number), err(Display))]
  async fn create_packet(&self, attributes: &PacketAttributes) -> Result<PacketBooking, ShipmentApiError> {
    const METHOD: &str = "createPacket";
    let body = wire::encode_attributes_call(METHOD, self.api_password()?, attributes)?;
    let result = self.call(METHOD, body).await?;
    let booking = PacketBooking {
      id: Self::required_text(&result, METHOD, "id")?,
      barcode: Self::required_text(&result, METHOD, "barcode")?,
    };
    info!(packet_id = %booking.id, barcode = %booking.barcode, "Packet created.");
    Ok(booking)
  }

  #[instrument(name = "packeta::packet_status", skip(self), err(Display))]
  async fn packet_status(&self, packet_id: &str) -> Result<PacketStatus, ShipmentApiError> {
    const METHOD: &str = "packetStatus";
    let body = wire::encode_packet_id_call(METHOD, self.api_password()?, packet_id)?;
    let result = self.call(METHOD, body).await?;
    packet_status_from(&result)
  }

  #[instrument(name = "packeta::packet_tracking", skip(self), err(Display))]
  async fn packet_tracking(&self, packet_id: &str) -> Result<Option<String>, ShipmentApiError> {
    const METHOD: &str = "packetTracking";
    let body = wire::encode_packet_id_call(METHOD, self.api_password()?, packet_id)?;
    let result = self.call(METHOD, body).await?;
    Ok(latest_tracking(&result))
  }

  #[instrument(name = "packeta::packet_attributes_valid", skip(self, attributes), err(Display))]
  async fn packet_attributes_valid(&self, attributes: &PacketAttributes) -> Result<bool, ShipmentApiError> {
    const METHOD: &str = "packetAttributesValid";
    let body = wire::encode_attributes_call(METHOD, self.api_password()?, attributes)?;
    match self.call(METHOD, body).await {
      Ok(_) => Ok(true),
      Err(err) if err.kind == ShipmentErrorKind::InvalidAttributes => {
        info!(reason = %err.technical_message, "Packet attributes rejected.");
        Ok(false)
      }
      Err(err) => Err(err),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::models::{CustomerContact, PickupPoint, ShipmentState, ShippingMethod};
  use chrono::Utc;
  use uuid::Uuid;

  fn config(password: Option<&str>) -> PacketaConfig {
    PacketaConfig {
      api_url: "http://127.0.0.1:9/api/rest".to_string(),
      api_password: password.map(|p| SecretString::from(p.to_string())),
      eshop: "ufo-shop".to_string(),
      default_weight_kg: Decimal::new(15, 1),
    }
  }

  fn order() -> NewOrder {
    NewOrder {
      id: Uuid::new_v4(),
      order_number: "UFO25001".to_string(),
      customer: CustomerContact {
        name: "Jan Novák".to_string(),
        email: "jan@example.cz".to_string(),
        phone: "+420777123456".to_string(),
      },
      items: Vec::new(),
      total_price: Decimal::new(107900, 2),
      discount_amount: Decimal::ZERO,
      promo_code: None,
      shipping_method: ShippingMethod::PickupPoint,
      shipping_price: Decimal::from(79),
      pickup_point: Some(PickupPoint {
        id: "4321".to_string(),
        name: "Praha 1".to_string(),
      }),
      shipment: ShipmentState::Pending,
      security_token_hash: String::new(),
      created_at: Utc::now(),
    }
  }

  #[test]
  fn attributes_from_order() {
    let attrs = PacketAttributes::for_order(&order(), &config(None), "CZK").unwrap();
    assert_eq!(attrs.name, "Jan");
    assert_eq!(attrs.surname, "Novák");
    assert_eq!(attrs.address_id, "4321");
    assert_eq!(attrs.value, "1079");
    assert_eq!(attrs.weight, "1.5");
  }

  #[test]
  fn no_attributes_without_pickup_point() {
    let mut order = order();
    order.pickup_point = None;
    assert!(PacketAttributes::for_order(&order, &config(None), "CZK").is_none());
  }

  #[test]
  fn packet_status_reads_code_and_texts() {
    let body = "<response><status>ok</status><result><dateTime>2025-03-01T10:15:00</dateTime>\
      <statusCode>2</statusCode><codeText>arrived</codeText>\
      <statusText>Packet is waiting at the pickup point.</statusText></result></response>";
    let result = wire::decode_response("packetStatus", body).unwrap();
    let status = packet_status_from(&result).unwrap();
    assert_eq!(status.code, "2");
    assert_eq!(status.code_text, "arrived");
    assert_eq!(status.status_text, "Packet is waiting at the pickup point.");
  }

  #[test]
  fn packet_status_without_code_is_unknown_error() {
    let body = "<response><status>ok</status><result><codeText>arrived</codeText></result></response>";
    let result = wire::decode_response("packetStatus", body).unwrap();
    let err = packet_status_from(&result).unwrap_err();
    assert_eq!(err.kind, ShipmentErrorKind::UnknownError);
    assert!(err.technical_message.contains("statusCode"));
  }

  #[test]
  fn tracking_takes_the_last_record() {
    let body = "<response><status>ok</status><result>\
      <record><dateTime>2025-03-01T08:00:00</dateTime><statusCode>1</statusCode><statusText>Received data.</statusText></record>\
      <record><dateTime>2025-03-01T10:15:00</dateTime><statusCode>2</statusCode><statusText>Arrived.</statusText></record>\
      </result></response>";
    let result = wire::decode_response("packetTracking", body).unwrap();
    assert_eq!(latest_tracking(&result), Some("Arrived.".to_string()));
  }

  #[test]
  fn tracking_without_records_is_none() {
    let result = wire::decode_response("packetTracking", "<response><status>ok</status><result/></response>").unwrap();
    assert_eq!(latest_tracking(&result), None);
  }

  #[tokio::test]
  async fn missing_password_fails_before_any_request() {
    let client = PacketaClient::new(&config(None), Duration::from_secs(1)).unwrap();
    let attrs = PacketAttributes::for_order(&order(), &config(None), "CZK").unwrap();
    let err = client.create_packet(&attrs).await.unwrap_err();
    assert_eq!(err.kind, ShipmentErrorKind::IncorrectApiPassword);
  }

  #[tokio::test]
  async fn unreachable_endpoint_is_connection_error() {
    // Port 9 (discard) is closed on loopback, so the connect is refused.
    let client = PacketaClient::new(&config(Some("secret")), Duration::from_secs(2)).unwrap();
    let err = client.packet_status("1234567890").await.unwrap_err();
    assert_eq!(err.kind, ShipmentErrorKind::ConnectionError);
  }
}
