// ufo_storefront/src/pipelines/payment_pipeline.rs

//! Payment initiation: token, then payment, then a best-effort link from the
//! order to the gateway payment id. A lost link is a reconciliation problem;
//! the customer still gets the redirect.

use crate::errors::AppError;
use crate::models::{order_payment_items, PaymentInitiationRequest};
use crate::pipelines::contexts::{PaymentCtxData, PaymentPhase};
use crate::services::gopay::TokenScope;
use crate::state::AppState;
use checkout_saga::{Saga, SagaContext, StepControl, StepPolicy};
use tracing::{info, instrument, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InitiatedPayment {
  pub payment_id: String,
  pub gateway_url: String,
  pub linked_to_order: bool,
}

pub struct PaymentInitiator {
  saga: Saga<PaymentCtxData, AppError>,
}

impl Default for PaymentInitiator {
  fn default() -> Self {
    Self::new()
  }
}

impl PaymentInitiator {
  pub fn new() -> Self {
    Self { saga: build_saga() }
  }

  #[instrument(name = "payments::initiate", skip(self, state, request), fields(correlation_id = %correlation_id))]
  pub async fn initiate(
    &self,
    state: &AppState,
    request: PaymentInitiationRequest,
    correlation_id: &str,
  ) -> Result<InitiatedPayment, AppError> {
    let ctx = SagaContext::with_correlation_id(PaymentCtxData::new(state.clone(), request), correlation_id);
    self.saga.run(ctx.clone()).await?;

    let guard = ctx.read();
    match (guard.phase, &guard.payment) {
      (PaymentPhase::PaymentCreated, Some(payment)) => Ok(InitiatedPayment {
        payment_id: payment.payment_id.clone(),
        gateway_url: payment.gateway_url.clone(),
        linked_to_order: guard.linked_to_order,
      }),
      (phase, _) => Err(AppError::Internal(format!(
        "payment saga ended in phase {:?} without a payment",
        phase
      ))),
    }
  }
}

fn build_saga() -> Saga<PaymentCtxData, AppError> {
  let mut saga = Saga::<PaymentCtxData, AppError>::new(&[
    ("validate_request", StepPolicy::Required, None),
    ("resolve_order_amount", StepPolicy::BestEffort, None),
    ("acquire_token", StepPolicy::Required, None),
    ("create_payment", StepPolicy::Required, None),
    ("link_payment_to_order", StepPolicy::BestEffort, None),
  ]);

  saga.on_step("validate_request", |ctx: SagaContext<PaymentCtxData>| async move {
    let request = {
      let guard = ctx.read();
      guard.body.validate(&guard.app_state.config.shop.currency)?
    };
    ctx.write().request = Some(request);
    Ok::<_, AppError>(StepControl::Continue)
  });

  // A stored order is charged for what it stores: its total and its lines.
  saga.on_step("resolve_order_amount", |ctx: SagaContext<PaymentCtxData>| async move {
    let (state, order_number, submitted) = {
      let guard = ctx.read();
      let request = guard
        .request
        .as_ref()
        .ok_or_else(|| AppError::Internal("payment request not validated".to_string()))?;
      (guard.app_state.clone(), request.order_number.clone(), request.amount)
    };

    let Some(order) = state.orders.find_by_number(&order_number).await? else {
      warn!(%order_number, "Payment requested for an order that is not stored; using the submitted amount.");
      return Ok::<_, AppError>(StepControl::Continue);
    };
    if let Some(existing) = order.payment.payment_id() {
      warn!(%order_number, existing_payment_id = existing, "Order already has a gateway payment; creating another.");
    }
    if order.total_price != submitted {
      warn!(
        %order_number,
        %submitted,
        stored = %order.total_price,
        "Submitted amount differs from the stored order total; charging the stored total."
      );
    }
    let items = order_payment_items(&order);
    if let Some(request) = ctx.write().request.as_mut() {
      request.amount = order.total_price;
      request.items = items;
    }
    Ok::<_, AppError>(StepControl::Continue)
  });

  saga.on_step("acquire_token", |ctx: SagaContext<PaymentCtxData>| async move {
    let state = ctx.read().app_state.clone();
    let token = state.gateway.acquire_token(TokenScope::PaymentCreate).await?;
    let mut guard = ctx.write();
    guard.token = Some(token);
    guard.phase = PaymentPhase::TokenAcquired;
    Ok::<_, AppError>(StepControl::Continue)
  });

  saga.on_step("create_payment", |ctx: SagaContext<PaymentCtxData>| async move {
    let (state, token, request) = {
      let guard = ctx.read();
      match (&guard.token, &guard.request) {
        (Some(token), Some(request)) => (guard.app_state.clone(), token.clone(), request.clone()),
        _ => return Err(AppError::Internal("payment created before token and request".to_string())),
      }
    };
    let payment = state.gateway.create_payment(&token, &request).await?;
    info!(
      correlation_id = %ctx.correlation_id(),
      order_number = %request.order_number,
      payment_id = %payment.payment_id,
      amount = %request.amount,
      "Gateway payment created."
    );
    let mut guard = ctx.write();
    guard.payment = Some(payment);
    guard.phase = PaymentPhase::PaymentCreated;
    Ok::<_, AppError>(StepControl::Continue)
  });

  saga.on_step("link_payment_to_order", |ctx: SagaContext<PaymentCtxData>| async move {
    let (state, order_number, payment_id) = {
      let guard = ctx.read();
      match (&guard.request, &guard.payment) {
        (Some(request), Some(payment)) => (
          guard.app_state.clone(),
          request.order_number.clone(),
          payment.payment_id.clone(),
        ),
        _ => return Err(AppError::Internal("no payment to link".to_string())),
      }
    };
    state.orders.attach_payment_id(&order_number, &payment_id).await?;
    ctx.write().linked_to_order = true;
    Ok::<_, AppError>(StepControl::Continue)
  });

  saga
}
