// ufo_storefront/src/services/gopay/error.rs

use std::fmt;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatewayStep {
  Token,
  CreatePayment,
  PaymentStatus,
}

impl fmt::Display for GatewayStep {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(match self {
      GatewayStep::Token => "token request",
      GatewayStep::CreatePayment => "payment creation",
      GatewayStep::PaymentStatus => "payment status lookup",
    })
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatewayErrorKind {
  /// Credentials are missing or unusable. Not retryable.
  Configuration,
  /// Network failure or timeout.
  Connection,
  /// The gateway answered with a non-success status.
  HttpStatus(u16),
  /// The gateway answered 2xx but a required field was missing or unreadable.
  MalformedResponse,
  /// The request could not be built, e.g. a negative amount.
  InvalidRequest,
}

impl fmt::Display for GatewayErrorKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      GatewayErrorKind::Configuration => f.write_str("configuration"),
      GatewayErrorKind::Connection => f.write_str("connection"),
      GatewayErrorKind::HttpStatus(code) => write!(f, "http status {}", code),
      GatewayErrorKind::MalformedResponse => f.write_str("malformed response"),
      GatewayErrorKind::InvalidRequest => f.write_str("invalid request"),
    }
  }
}

/// Payment gateway failure. Each instance gets an `error_id`; the HTTP error
/// response logs it once with the technical `detail` and hands only the id
/// and a safe message to the customer.
#[derive(Debug, Clone, Error)]
#[error("{step} failed ({kind}): {detail} [errorId {error_id}]")]
pub struct GatewayError {
  pub step: GatewayStep,
  pub kind: GatewayErrorKind,
  pub error_id: String,
  pub detail: String,
}

impl GatewayError {
  pub fn new(step: GatewayStep, kind: GatewayErrorKind, detail: impl Into<String>) -> Self {
    Self {
      step,
      kind,
      error_id: Uuid::new_v4().to_string(),
      detail: detail.into(),
    }
  }

  pub fn from_transport(step: GatewayStep, err: &reqwest::Error) -> Self {
    let kind = if err.is_builder() {
      GatewayErrorKind::InvalidRequest
    } else {
      GatewayErrorKind::Connection
    };
    Self::new(step, kind, err.to_string())
  }

  pub fn is_configuration(&self) -> bool {
    self.kind == GatewayErrorKind::Configuration
  }

  pub fn user_message(&self) -> &'static str {
    match (self.kind, self.step) {
      (GatewayErrorKind::Configuration, _) => {
        "Online payment is not available at the moment. Please contact us to complete your order."
      }
      (GatewayErrorKind::Connection, _) => "The payment gateway is not reachable. Please try again in a moment.",
      (GatewayErrorKind::InvalidRequest, _) => "The payment could not be prepared for this order.",
      (_, GatewayStep::Token) => "The payment could not be started. Please try again.",
      (_, GatewayStep::CreatePayment) => "The payment could not be created. Please try again.",
      (_, GatewayStep::PaymentStatus) => "The payment status could not be verified.",
    }
  }
}
