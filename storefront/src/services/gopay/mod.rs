// ufo_storefront/src/services/gopay/mod.rs

//! GoPay payment gateway adapter.
//!
//! Two sequential calls create a payment: an OAuth2 client-credentials token
//! (`POST /oauth2/token`, form body, Basic auth) and the payment itself
//! (`POST /payments/payment`, JSON, Bearer auth). The response carries the
//! gateway payment id and the hosted payment page URL.

mod error;
mod types;

pub use error::{GatewayError, GatewayErrorKind, GatewayStep};
pub use types::{
  to_minor_units, AccessToken, CreatedPayment, GatewayPaymentState, PaymentItem, PaymentRequest, TokenScope,
};

use crate::config::GoPayConfig;
use async_trait::async_trait;
use reqwest::header::ACCEPT;
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{info, instrument};
use types::{Callback, Contact, GatewayId, Item, Payer, PaymentBody, PaymentResponse, Target, TokenResponse};

#[async_trait]
pub trait PaymentGateway: Send + Sync {
  async fn acquire_token(&self, scope: TokenScope) -> Result<AccessToken, GatewayError>;

  async fn create_payment(&self, token: &AccessToken, request: &PaymentRequest) -> Result<CreatedPayment, GatewayError>;

  async fn payment_state(&self, token: &AccessToken, payment_id: &str) -> Result<GatewayPaymentState, GatewayError>;
}

struct Credentials {
  goid: i64,
  client_id: String,
  client_secret: SecretString,
}

pub struct GoPayClient {
  client: reqwest::Client,
  base_url: String,
  /// `Err` holds the reason the credentials are unusable.
  credentials: Result<Credentials, String>,
  lang: String,
  return_url: String,
  notification_url: String,
}

fn credentials_from(config: &GoPayConfig) -> Result<Credentials, String> {
  let mut missing = Vec::new();
  if config.goid.is_none() {
    missing.push("GOPAY_GOID");
  }
  if config.client_id.is_none() {
    missing.push("GOPAY_CLIENT_ID");
  }
  if config.client_secret.is_none() {
    missing.push("GOPAY_CLIENT_SECRET");
  }
  match (&config.goid, &config.client_id, &config.client_secret) {
    (Some(goid), Some(client_id), Some(client_secret)) => {
      let goid = goid
        .trim()
        .parse::<i64>()
        .map_err(|_| format!("GOPAY_GOID '{}' is not numeric", goid))?;
      Ok(Credentials {
        goid,
        client_id: client_id.clone(),
        client_secret: client_secret.clone(),
      })
    }
    _ => Err(format!("missing configuration: {}", missing.join(", "))),
  }
}

impl GoPayClient {
  pub fn new(config: &GoPayConfig, timeout: Duration) -> Result<Self, reqwest::Error> {
    let client = reqwest::Client::builder().timeout(timeout).build()?;
    Ok(Self {
      client,
      base_url: config.base_url.trim_end_matches('/').to_string(),
      credentials: credentials_from(config),
      lang: config.lang.clone(),
      return_url: config.return_url.clone(),
      notification_url: config.notification_url.clone(),
    })
  }

  pub fn is_configured(&self) -> bool {
    self.credentials.is_ok()
  }

  fn credentials(&self, step: GatewayStep) -> Result<&Credentials, GatewayError> {
    self
      .credentials
      .as_ref()
      .map_err(|reason| GatewayError::new(step, GatewayErrorKind::Configuration, reason.clone()))
  }

  async fn read_json<T: DeserializeOwned>(step: GatewayStep, response: reqwest::Response) -> Result<T, GatewayError> {
    let status = response.status();
    let body = response
      .text()
      .await
      .map_err(|e| GatewayError::from_transport(step, &e))?;
    if !status.is_success() {
      return Err(GatewayError::new(
        step,
        GatewayErrorKind::HttpStatus(status.as_u16()),
        body,
      ));
    }
    serde_json::from_str(&body).map_err(|e| {
      GatewayError::new(
        step,
        GatewayErrorKind::MalformedResponse,
        format!("{}: {}", e, body),
      )
    })
  }

  fn build_body<'a>(&'a self, goid: i64, request: &'a PaymentRequest) -> Result<PaymentBody<'a>, GatewayError> {
    let invalid_amount = |what: String| GatewayError::new(GatewayStep::CreatePayment, GatewayErrorKind::InvalidRequest, what);
    let amount =
      to_minor_units(request.amount).ok_or_else(|| invalid_amount(format!("amount {} is not payable", request.amount)))?;
    let items = request
      .items
      .iter()
      .map(|item| {
        to_minor_units(item.amount)
          .map(|amount| Item {
            kind: "ITEM",
            name: &item.name,
            amount,
            count: item.count,
          })
          .ok_or_else(|| invalid_amount(format!("item '{}' amount {} is not payable", item.name, item.amount)))
      })
      .collect::<Result<Vec<_>, _>>()?;
    let (first_name, last_name) = request.customer.split_name();

    Ok(PaymentBody {
      payer: Payer {
        contact: Contact {
          first_name,
          last_name,
          email: &request.customer.email,
          phone_number: &request.customer.phone,
        },
      },
      target: Target { kind: "ACCOUNT", goid },
      amount,
      currency: &request.currency,
      order_number: &request.order_number,
      order_description: format!("Order {}", request.order_number),
      items,
      callback: Callback {
        return_url: &self.return_url,
        notification_url: &self.notification_url,
      },
      lang: &self.lang,
    })
  }
}

#[async_trait]
impl PaymentGateway for GoPayClient {
  #[instrument(name = "gopay::acquire_token", skip(self), fields(scope = scope.as_str()))]
  async fn acquire_token(&self, scope: TokenScope) -> Result<AccessToken, GatewayError> {
    const STEP: GatewayStep = GatewayStep::Token;
    let credentials = self.credentials(STEP)?;
    let response = self
      .client
      .post(format!("{}/oauth2/token", self.base_url))
      .basic_auth(&credentials.client_id, Some(credentials.client_secret.expose_secret()))
      .header(ACCEPT, "application/json")
      .form(&[("grant_type", "client_credentials"), ("scope", scope.as_str())])
      .send()
      .await
      .map_err(|e| GatewayError::from_transport(STEP, &e))?;
    let token: TokenResponse = Self::read_json(STEP, response).await?;
    let value = token
      .access_token
      .filter(|t| !t.is_empty())
      .ok_or_else(|| GatewayError::new(STEP, GatewayErrorKind::MalformedResponse, "response has no access_token"))?;
    info!("Gateway access token acquired.");
    Ok(AccessToken {
      value: SecretString::from(value),
      expires_in: token.expires_in,
    })
  }

  #[instrument(name = "gopay::create_payment", skip(self, token, request), fields(order_number = %request.order_number))]
  async fn create_payment(&self, token: &AccessToken, request: &PaymentRequest) -> Result<CreatedPayment, GatewayError> {
    const STEP: GatewayStep = GatewayStep::CreatePayment;
    let credentials = self.credentials(STEP)?;
    let body = self.build_body(credentials.goid, request)?;
    let response = self
      .client
      .post(format!("{}/payments/payment", self.base_url))
      .bearer_auth(token.value.expose_secret())
      .header(ACCEPT, "application/json")
      .json(&body)
      .send()
      .await
      .map_err(|e| GatewayError::from_transport(STEP, &e))?;
    let created: PaymentResponse = Self::read_json(STEP, response).await?;
    let payment_id = created
      .id
      .map(GatewayId::into_string)
      .ok_or_else(|| GatewayError::new(STEP, GatewayErrorKind::MalformedResponse, "response has no id"))?;
    let gateway_url = created
      .gw_url
      .filter(|u| !u.is_empty())
      .ok_or_else(|| GatewayError::new(STEP, GatewayErrorKind::MalformedResponse, "response has no gw_url"))?;
    info!(%payment_id, "Gateway payment created.");
    Ok(CreatedPayment {
      payment_id,
      gateway_url,
      state: created.state.unwrap_or_default(),
    })
  }

  #[instrument(name = "gopay::payment_state", skip(self, token))]
  async fn payment_state(&self, token: &AccessToken, payment_id: &str) -> Result<GatewayPaymentState, GatewayError> {
    const STEP: GatewayStep = GatewayStep::PaymentStatus;
    self.credentials(STEP)?;
    let response = self
      .client
      .get(format!("{}/payments/payment/{}", self.base_url, payment_id))
      .bearer_auth(token.value.expose_secret())
      .header(ACCEPT, "application/json")
      .send()
      .await
      .map_err(|e| GatewayError::from_transport(STEP, &e))?;
    let status: PaymentResponse = Self::read_json(STEP, response).await?;
    let state = status
      .state
      .ok_or_else(|| GatewayError::new(STEP, GatewayErrorKind::MalformedResponse, "response has no state"))?;
    Ok(GatewayPaymentState::parse(&state))
  }
}
