// ufo_storefront/src/services/packeta/error.rs

use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShipmentErrorKind {
  /// Credential misconfiguration. Actionable by the operator, not the customer.
  IncorrectApiPassword,
  /// The carrier rejected the request body.
  InvalidAttributes,
  /// Network, DNS or timeout failure.
  ConnectionError,
  UnknownError,
}

impl ShipmentErrorKind {
  pub fn as_str(&self) -> &'static str {
    match self {
      ShipmentErrorKind::IncorrectApiPassword => "INCORRECT_API_PASSWORD",
      ShipmentErrorKind::InvalidAttributes => "INVALID_ATTRIBUTES",
      ShipmentErrorKind::ConnectionError => "CONNECTION_ERROR",
      ShipmentErrorKind::UnknownError => "UNKNOWN_ERROR",
    }
  }
}

impl fmt::Display for ShipmentErrorKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// Carrier failure. `technical_message` is for logs only; customers see `user_message()`.
#[derive(Debug, Clone, Error)]
#[error("{kind}: {technical_message}")]
pub struct ShipmentApiError {
  pub kind: ShipmentErrorKind,
  pub technical_message: String,
}

impl ShipmentApiError {
  pub fn new(kind: ShipmentErrorKind, technical_message: impl Into<String>) -> Self {
    Self {
      kind,
      technical_message: technical_message.into(),
    }
  }

  pub fn from_fault(message: &str, detail: &str) -> Self {
    let technical_message = if detail.is_empty() {
      message.to_string()
    } else {
      format!("{} ({})", message, detail)
    };
    Self::new(classify_fault(message, detail), technical_message)
  }

  pub fn from_transport(method: &str, err: &reqwest::Error) -> Self {
    let kind = if err.is_timeout() || err.is_connect() || err.is_request() {
      ShipmentErrorKind::ConnectionError
    } else {
      ShipmentErrorKind::UnknownError
    };
    Self::new(kind, format!("{} transport failure: {}", method, err))
  }

  pub fn user_message(&self) -> &'static str {
    match self.kind {
      ShipmentErrorKind::IncorrectApiPassword => {
        "The shipment could not be booked automatically. Our team will book it for you."
      }
      ShipmentErrorKind::InvalidAttributes => {
        "The carrier rejected the shipment details. Please check the selected pickup point."
      }
      ShipmentErrorKind::ConnectionError => "The carrier is currently unreachable. The shipment will be booked later.",
      ShipmentErrorKind::UnknownError => "The shipment could not be booked. We will contact you.",
    }
  }
}

const PASSWORD_MARKERS: &[&str] = &["incorrectapipassword", "api password", "apipassword"];
const ATTRIBUTE_MARKERS: &[&str] = &["packetattributesfault", "attribute", "invalid", "argumentsfault"];
const CONNECTION_MARKERS: &[&str] = &[
  "timeout",
  "timed out",
  "connection",
  "network",
  "dns",
  "econnrefused",
  "econnreset",
  "enotfound",
  "unreachable",
];

/// Maps a carrier fault message and its detail text to an error kind.
///
/// Substring matching over the lowercased text; first matching group wins, in
/// the order password, attributes, connection.
pub fn classify_fault(message: &str, detail: &str) -> ShipmentErrorKind {
  let haystack = format!("{} {}", message, detail).to_lowercase();
  let contains_any = |markers: &[&str]| markers.iter().any(|m| haystack.contains(m));

  if contains_any(PASSWORD_MARKERS) {
    ShipmentErrorKind::IncorrectApiPassword
  } else if contains_any(ATTRIBUTE_MARKERS) {
    ShipmentErrorKind::InvalidAttributes
  } else if contains_any(CONNECTION_MARKERS) {
    ShipmentErrorKind::ConnectionError
  } else {
    ShipmentErrorKind::UnknownError
  }
}
