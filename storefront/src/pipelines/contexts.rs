// ufo_storefront/src/pipelines/contexts.rs

//! Data carried through each saga. Handlers receive these wrapped in
//! `checkout_saga::SagaContext`.

use crate::models::{
  CheckoutInput, CheckoutRequest, NewOrder, Order, PaymentInitiationRequest, PaymentStatus, ShipmentState,
};
use crate::services::gopay::{AccessToken, CreatedPayment, GatewayPaymentState, PaymentRequest};
use crate::state::AppState;
use rust_decimal::Decimal;

// --- Order creation ---

pub struct OrderCtxData {
  pub app_state: AppState,
  pub request: CheckoutRequest,
  pub input: Option<CheckoutInput>,
  pub subtotal: Decimal,
  pub discount: Decimal,
  /// Normalized code, set when it is eligible. Its use is redeemed by the order insert.
  pub applied_promo_code: Option<String>,
  pub shipping_price: Decimal,
  pub total: Decimal,
  pub order: Option<NewOrder>,
  /// Plain token; only its hash is on the order.
  pub security_token: Option<String>,
  pub shipment: ShipmentState,
  pub confirmation_sent: bool,
}

impl OrderCtxData {
  pub fn new(app_state: AppState, request: CheckoutRequest) -> Self {
    Self {
      app_state,
      request,
      input: None,
      subtotal: Decimal::ZERO,
      discount: Decimal::ZERO,
      applied_promo_code: None,
      shipping_price: Decimal::ZERO,
      total: Decimal::ZERO,
      order: None,
      security_token: None,
      shipment: ShipmentState::NotRequested,
      confirmation_sent: false,
    }
  }
}

// --- Payment initiation ---

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentPhase {
  NotStarted,
  TokenAcquired,
  PaymentCreated,
}

pub struct PaymentCtxData {
  pub app_state: AppState,
  pub body: PaymentInitiationRequest,
  pub request: Option<PaymentRequest>,
  pub phase: PaymentPhase,
  pub token: Option<AccessToken>,
  pub payment: Option<CreatedPayment>,
  pub linked_to_order: bool,
}

impl PaymentCtxData {
  pub fn new(app_state: AppState, body: PaymentInitiationRequest) -> Self {
    Self {
      app_state,
      body,
      request: None,
      phase: PaymentPhase::NotStarted,
      token: None,
      payment: None,
      linked_to_order: false,
    }
  }
}

// --- Payment notification ---

pub struct NotificationCtxData {
  pub app_state: AppState,
  pub payment_id: String,
  pub order: Option<Order>,
  pub token: Option<AccessToken>,
  pub gateway_state: Option<GatewayPaymentState>,
  /// Status written to the order, if the notification changed anything.
  pub applied_status: Option<PaymentStatus>,
}

impl NotificationCtxData {
  pub fn new(app_state: AppState, payment_id: String) -> Self {
    Self {
      app_state,
      payment_id,
      order: None,
      token: None,
      gateway_state: None,
      applied_status: None,
    }
  }
}
