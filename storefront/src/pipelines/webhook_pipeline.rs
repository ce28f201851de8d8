// ufo_storefront/src/pipelines/webhook_pipeline.rs

//! Gateway payment notifications. The gateway only sends the payment id, so
//! the state is always fetched back from the gateway before the order is
//! touched.

use crate::errors::AppError;
use crate::models::{OrderStatus, PaymentStatus};
use crate::pipelines::contexts::NotificationCtxData;
use crate::services::gopay::{GatewayPaymentState, TokenScope};
use crate::state::AppState;
use checkout_saga::{Saga, SagaContext, StepControl, StepPolicy};
use tracing::{info, instrument};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationOutcome {
  /// `None` when no stored order carries the payment id.
  pub order_number: Option<String>,
  pub gateway_state: Option<GatewayPaymentState>,
  pub applied_status: Option<PaymentStatus>,
}

pub struct PaymentNotifications {
  saga: Saga<NotificationCtxData, AppError>,
}

impl Default for PaymentNotifications {
  fn default() -> Self {
    Self::new()
  }
}

impl PaymentNotifications {
  pub fn new() -> Self {
    Self { saga: build_saga() }
  }

  #[instrument(name = "payments::notification", skip(self, state), fields(correlation_id = %correlation_id))]
  pub async fn handle(
    &self,
    state: &AppState,
    payment_id: &str,
    correlation_id: &str,
  ) -> Result<NotificationOutcome, AppError> {
    let payment_id = payment_id.trim();
    if payment_id.is_empty() {
      return Err(AppError::Validation("Payment id is required.".to_string()));
    }
    let ctx = SagaContext::with_correlation_id(
      NotificationCtxData::new(state.clone(), payment_id.to_string()),
      correlation_id,
    );
    self.saga.run(ctx.clone()).await?;

    let guard = ctx.read();
    Ok(NotificationOutcome {
      order_number: guard.order.as_ref().map(|o| o.order_number.clone()),
      gateway_state: guard.gateway_state.clone(),
      applied_status: guard.applied_status,
    })
  }
}

fn build_saga() -> Saga<NotificationCtxData, AppError> {
  let mut saga = Saga::<NotificationCtxData, AppError>::new(&[
    ("load_order", StepPolicy::Required, None),
    ("acquire_token", StepPolicy::Required, None),
    ("fetch_payment_state", StepPolicy::Required, None),
    ("apply_payment_status", StepPolicy::Required, None),
  ]);

  // Unknown ids are acknowledged so the gateway stops re-sending them.
  saga.on_step("load_order", |ctx: SagaContext<NotificationCtxData>| async move {
    let (state, payment_id) = {
      let guard = ctx.read();
      (guard.app_state.clone(), guard.payment_id.clone())
    };
    match state.orders.find_by_payment_id(&payment_id).await? {
      Some(order) => {
        ctx.write().order = Some(order);
        Ok::<_, AppError>(StepControl::Continue)
      }
      None => {
        info!(correlation_id = %ctx.correlation_id(), %payment_id, "Notification for an unknown payment id, ignoring.");
        Ok(StepControl::Halt)
      }
    }
  });

  saga.on_step("acquire_token", |ctx: SagaContext<NotificationCtxData>| async move {
    let state = ctx.read().app_state.clone();
    let token = state.gateway.acquire_token(TokenScope::PaymentAll).await?;
    ctx.write().token = Some(token);
    Ok::<_, AppError>(StepControl::Continue)
  });

  saga.on_step("fetch_payment_state", |ctx: SagaContext<NotificationCtxData>| async move {
    let (state, token, payment_id) = {
      let guard = ctx.read();
      let token = guard
        .token
        .clone()
        .ok_or_else(|| AppError::Internal("no gateway token".to_string()))?;
      (guard.app_state.clone(), token, guard.payment_id.clone())
    };
    let gateway_state = state.gateway.payment_state(&token, &payment_id).await?;
    ctx.write().gateway_state = Some(gateway_state);
    Ok::<_, AppError>(StepControl::Continue)
  });

  saga.on_step("apply_payment_status", |ctx: SagaContext<NotificationCtxData>| async move {
    let (state, order_id, order_number, gateway_state) = {
      let guard = ctx.read();
      match (&guard.order, &guard.gateway_state) {
        (Some(order), Some(gateway_state)) => (
          guard.app_state.clone(),
          order.id,
          order.order_number.clone(),
          gateway_state.clone(),
        ),
        _ => return Err(AppError::Internal("order or gateway state missing".to_string())),
      }
    };

    let Some(status) = gateway_state.payment_status() else {
      info!(%order_number, state = ?gateway_state, "Payment still open, nothing to record.");
      return Ok(StepControl::Continue);
    };
    let changed = state.orders.set_payment_status(order_id, status).await?;
    if status == PaymentStatus::Paid {
      let moved = state
        .orders
        .transition_status(order_id, OrderStatus::Pending, OrderStatus::Paid)
        .await?;
      info!(%order_number, order_status_moved = moved, "Order marked as paid.");
    }
    info!(%order_number, payment_status = %status, changed, "Payment status recorded.");
    ctx.write().applied_status = Some(status);
    Ok::<_, AppError>(StepControl::Continue)
  });

  saga
}
